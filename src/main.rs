use dioxus::prelude::*;

mod visual_editor;

use visual_editor::VisualEditor;

fn main() {
    if let Err(err) = dioxus::logger::init(tracing::Level::INFO) {
        eprintln!("logger already installed: {}", err);
    }
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        style { {EDITOR_CSS} }
        VisualEditor {}
    }
}

const EDITOR_CSS: &str = r#"
.builder-element { position: relative; margin-bottom: 8px; border: 1px dashed transparent; }
.builder-element:hover { border-color: #93c5fd; }
.builder-element.selected { border-color: #2563eb; border-style: solid; }
.delete-element, .delete-nested-element { position: absolute; top: 2px; right: 2px; display: none; border: none; background: #ef4444; color: white; border-radius: 50%; width: 20px; height: 20px; cursor: pointer; line-height: 20px; }
.builder-element:hover > .delete-element, .nested-element:hover > .delete-nested-element { display: block; }
.variable-editable:focus { outline: 2px solid #bfdbfe; }
.drop-zone-column:hover { border-color: #60a5fa; }
"#;
