use dioxus::prelude::*;
use page_builder::element::PaletteGroup;
use page_builder::render::KeyOutcome;
use page_builder::upload::failure_message;
use page_builder::web::{self, CanvasHit, WebSurface, CANVAS_ID};
use page_builder::{BuilderConfig, BuilderResult, Document, ElementType, RenderEngine, StructuralKey, VariableCatalog};
use tracing::{info, warn};

use super::properties_panel::PropertiesPanel;

#[derive(Clone, Debug, PartialEq)]
pub enum EditorMode {
    Editor,
    Preview,
    Saved,
}

#[derive(Clone, Debug)]
pub struct EditorState {
    pub mode: EditorMode,
    pub title: String,
    pub search: String,
    pub preview_html: String,
    pub saved_json: String,
    pub dragging: Option<ElementType>,
    pub gesture: u64,
    pub editing: Option<StructuralKey>,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            mode: EditorMode::Editor,
            title: "Untitled Page".to_string(),
            search: String::new(),
            preview_html: String::new(),
            saved_json: String::new(),
            dragging: None,
            gesture: 0,
            editing: None,
        }
    }
}

pub type Engine = RenderEngine<WebSurface>;

pub static EDITOR_STATE: GlobalSignal<EditorState> = Signal::global(EditorState::default);
pub static ENGINE: GlobalSignal<Option<Engine>> = Signal::global(|| None);

#[component]
pub fn VisualEditor() -> Element {
    let state = EDITOR_STATE.read();
    let canvas_display = if state.mode == EditorMode::Editor { "block" } else { "none" };

    rsx! {
        div {
            class: "visual-editor",
            style: "display: flex; height: 100vh; font-family: system-ui;",

            Palette {}

            div {
                class: "canvas-wrapper",
                style: "flex: 1; display: flex; flex-direction: column; background: #f3f4f6; overflow: hidden;",

                Toolbar {}

                div {
                    style: "flex: 1; overflow-y: auto; padding: 24px; position: relative; display: {canvas_display};",
                    Canvas {}
                    AutocompleteList {}
                }

                match state.mode {
                    EditorMode::Preview => rsx! {
                        iframe {
                            class: "preview-frame",
                            style: "flex: 1; border: none; background: white;",
                            srcdoc: "{state.preview_html}",
                        }
                    },
                    EditorMode::Saved => rsx! {
                        pre {
                            class: "saved-json",
                            style: "flex: 1; margin: 0; padding: 16px; overflow: auto; background: #111827; color: #e5e7eb; font-size: 12px;",
                            "{state.saved_json}"
                        }
                    },
                    EditorMode::Editor => rsx! {},
                }
            }

            if state.mode == EditorMode::Editor {
                div {
                    class: "properties",
                    style: "width: 300px; border-left: 1px solid #e5e7eb; overflow-y: auto; background: white;",
                    PropertiesPanel {}
                }
            }
        }
    }
}

#[component]
fn Palette() -> Element {
    let state = EDITOR_STATE.read();
    let search = state.search.clone();

    rsx! {
        div {
            class: "toolbox",
            style: "width: 240px; padding: 16px; border-right: 1px solid #e5e7eb; overflow-y: auto; background: white;",
            h2 { style: "margin: 0 0 16px 0; font-size: 18px;", "Components" }

            input {
                r#type: "text",
                class: "component-search",
                placeholder: "Search components...",
                value: "{search}",
                style: "width: 100%; margin-bottom: 16px; padding: 6px 8px;",
                oninput: move |e| EDITOR_STATE.write().search = e.value(),
            }

            for group in PaletteGroup::ALL {
                {
                    let kinds: Vec<ElementType> = ElementType::ALL
                        .into_iter()
                        .filter(|kind| kind.palette_group() == group && kind.matches_search(&search))
                        .collect();
                    rsx! {
                        if !kinds.is_empty() {
                            div { class: "component-group", style: "margin-bottom: 16px;",
                                h3 { style: "margin: 0 0 8px 0; font-size: 13px; color: #6b7280; text-transform: uppercase;", "{group.title()}" }
                                for kind in kinds {
                                    div {
                                        class: "component-item",
                                        draggable: "true",
                                        "data-type": "{kind}",
                                        style: "padding: 8px 12px; margin-bottom: 6px; border: 1px solid #d1d5db; border-radius: 4px; cursor: grab; background: #f9fafb; font-size: 14px;",
                                        ondragstart: move |_| start_dragging(kind),
                                        ondragend: move |_| EDITOR_STATE.write().dragging = None,
                                        ondoubleclick: move |_| add_element(kind),
                                        "{kind.label()}"
                                    }
                                }
                            }
                        }
                    }
                }
            }

            VariableList {}

            p { style: "font-size: 12px; color: #666; line-height: 1.4;",
                "Drag components onto the canvas"
                br {}
                "Double-click to append"
                br {}
                "Type (( in text to insert a variable"
            }
        }
    }
}

#[component]
fn VariableList() -> Element {
    let engine = ENGINE.read();
    let Some(engine) = engine.as_ref() else {
        return rsx! {};
    };
    let catalog = engine.catalog();

    rsx! {
        div { class: "variable-list", style: "margin-bottom: 16px;",
            h3 { style: "margin: 0 0 8px 0; font-size: 13px; color: #6b7280; text-transform: uppercase;", "Variables" }
            for category in catalog.categories().iter() {
                div { style: "margin-bottom: 8px;",
                    div { style: "font-size: 12px; font-weight: 600;", "{category.label}" }
                    for variable in catalog.all_variables().iter().filter(|v| v.category == category.key) {
                        {
                            let path = variable.path.clone();
                            rsx! {
                                div {
                                    class: "variable-item",
                                    title: "{variable.description}",
                                    style: "font-size: 12px; padding: 2px 6px; cursor: pointer; color: #2563eb;",
                                    onmousedown: move |e| {
                                        e.prevent_default();
                                        insert_variable(&path);
                                    },
                                    "{variable.display_name}"
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn Toolbar() -> Element {
    let state = EDITOR_STATE.read();
    let editing = state.mode == EditorMode::Editor;

    rsx! {
        div {
            class: "toolbar",
            style: "display: flex; gap: 8px; align-items: center; padding: 12px 24px; background: white; border-bottom: 1px solid #e5e7eb;",

            input {
                r#type: "text",
                value: "{state.title}",
                style: "flex: 1; padding: 6px 8px; font-size: 16px;",
                oninput: move |e| set_title(e.value()),
            }

            if editing {
                button { onclick: move |_| show_preview(), "Preview" }
                button { onclick: move |_| save(), "Save" }
                button { onclick: move |_| load_starter_invoice(), "Load starter invoice" }
            } else {
                button { onclick: move |_| set_mode(EditorMode::Editor), "Back to editor" }
            }
        }
    }
}

#[component]
fn Canvas() -> Element {
    rsx! {
        div {
            id: CANVAS_ID,
            class: "canvas builder-canvas",
            style: "min-height: 600px; max-width: 900px; margin: 0 auto; padding: 24px; background: white; box-shadow: 0 2px 8px rgba(0,0,0,0.1);",
            onmounted: move |_| attach_engine(),
            onclick: move |e| {
                let point = e.client_coordinates();
                click_canvas(point.x, point.y);
            },
            ondragover: move |e| e.prevent_default(),
            ondrop: move |e| {
                e.prevent_default();
                let point = e.client_coordinates();
                drop_on_canvas(point.x, point.y);
            },
            onfocusin: move |_| start_editing(),
            onfocusout: move |_| stop_editing(),
            oninput: move |_| editable_input(),
            onkeydown: move |e| {
                if editable_key(&e.key().to_string()) {
                    e.prevent_default();
                }
            },
        }
    }
}

#[component]
fn AutocompleteList() -> Element {
    let engine = ENGINE.read();
    let Some(engine) = engine.as_ref() else {
        return rsx! {};
    };
    let autocomplete = engine.autocomplete();
    if !autocomplete.is_open() {
        return rsx! {};
    }
    let highlighted = autocomplete.highlighted();

    rsx! {
        div {
            class: "variable-autocomplete",
            style: "position: fixed; right: 340px; top: 80px; width: 280px; max-height: 300px; overflow-y: auto; background: white; border: 1px solid #d1d5db; border-radius: 4px; box-shadow: 0 4px 12px rgba(0,0,0,0.15); z-index: 50;",
            for (i, suggestion) in autocomplete.matches().iter().cloned().enumerate() {
                {
                    let path = suggestion.path.clone();
                    let active = i == highlighted;
                    rsx! {
                        div {
                            class: if active { "autocomplete-item highlighted" } else { "autocomplete-item" },
                            style: if active { "padding: 6px 10px; background: #dbeafe; cursor: pointer;" } else { "padding: 6px 10px; cursor: pointer;" },
                            onmousedown: move |e| {
                                e.prevent_default();
                                accept_suggestion(&path);
                            },
                            div { style: "font-size: 13px; font-weight: 600;", "{suggestion.display_name}" }
                            div { style: "font-size: 11px; color: #6b7280;", "(({suggestion.path})) · {suggestion.category_label}" }
                        }
                    }
                }
            }
        }
    }
}

fn with_engine<T>(f: impl FnOnce(&mut Engine) -> BuilderResult<T>) -> Option<T> {
    let mut engine = ENGINE.write();
    let engine = engine.as_mut()?;
    match f(engine) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(error = %err, "editor action failed");
            None
        }
    }
}

fn attach_engine() {
    if ENGINE.peek().is_some() {
        return;
    }
    let built = BuilderConfig::embedded().and_then(|config| {
        let catalog = VariableCatalog::from_config(&config.catalog);
        let document = Document::new(EDITOR_STATE.peek().title.clone());
        let mut engine = RenderEngine::new(document, catalog, config.editor, WebSurface::attach()?);
        engine.mount()?;
        Ok(engine)
    });
    match built {
        Ok(engine) => {
            info!("editor attached");
            *ENGINE.write() = Some(engine);
        }
        Err(err) => warn!(error = %err, "editor failed to start"),
    }
}

fn start_dragging(kind: ElementType) {
    let mut state = EDITOR_STATE.write();
    state.dragging = Some(kind);
    state.gesture += 1;
}

fn add_element(kind: ElementType) {
    with_engine(|engine| engine.add_element(kind, None));
}

fn drop_on_canvas(x: f64, y: f64) {
    let (kind, gesture) = {
        let mut state = EDITOR_STATE.write();
        (state.dragging.take(), state.gesture)
    };
    let Some(kind) = kind else {
        return;
    };
    with_engine(|engine| engine.handle_drop(gesture, x, y, kind));
}

fn click_canvas(x: f64, y: f64) {
    with_engine(|engine| {
        let hit = engine.surface().hit_at(x, y);
        let id = match hit {
            CanvasHit::Delete(key) | CanvasHit::Element(key) => {
                engine.document().get(key).map(|element| element.id)
            }
            CanvasHit::Empty => None,
        };
        match (hit, id) {
            (CanvasHit::Delete(_), Some(id)) => {
                engine.delete_element(id)?;
            }
            _ => engine.select(id),
        }
        Ok(())
    });
}

fn start_editing() {
    let key = ENGINE
        .peek()
        .as_ref()
        .and_then(|engine| engine.surface().focused_editable());
    EDITOR_STATE.write().editing = key;
}

fn stop_editing() {
    let Some(key) = EDITOR_STATE.write().editing.take() else {
        return;
    };
    with_engine(|engine| {
        engine.commit_editable(key);
        Ok(())
    });
}

fn editable_input() {
    let Some(key) = EDITOR_STATE.peek().editing else {
        return;
    };
    with_engine(|engine| {
        let caret = engine.surface().caret_offset(key).unwrap_or(0);
        engine.autocomplete_input(key, caret);
        Ok(())
    });
}

/// Returns true when the key was consumed by the suggestion list.
fn editable_key(key_name: &str) -> bool {
    let Some(key) = EDITOR_STATE.peek().editing else {
        return false;
    };
    let open = ENGINE
        .peek()
        .as_ref()
        .is_some_and(|engine| engine.autocomplete().is_open());
    if !open {
        return false;
    }
    with_engine(|engine| {
        let caret = engine.surface().caret_offset(key).unwrap_or(0);
        engine.autocomplete_key(key_name, caret)
    })
    .is_some_and(|outcome| outcome != KeyOutcome::Ignored)
}

fn accept_suggestion(path: &str) {
    let Some(key) = EDITOR_STATE.peek().editing else {
        return;
    };
    with_engine(|engine| {
        let caret = engine.surface().caret_offset(key).unwrap_or(0);
        engine.accept_suggestion(path, caret)
    });
}

fn insert_variable(path: &str) {
    EDITOR_STATE.write().editing = None;
    with_engine(|engine| engine.insert_variable(path));
}

fn set_title(title: String) {
    EDITOR_STATE.write().title = title.clone();
    with_engine(|engine| {
        engine.set_title(title);
        Ok(())
    });
}

fn show_preview() {
    if let Some(html) = with_engine(|engine| engine.preview_html()) {
        let mut state = EDITOR_STATE.write();
        state.preview_html = html;
        state.mode = EditorMode::Preview;
    }
}

fn save() {
    if let Some(json) = with_engine(|engine| engine.persist()) {
        let mut state = EDITOR_STATE.write();
        state.saved_json = json;
        state.mode = EditorMode::Saved;
    }
}

fn load_starter_invoice() {
    EDITOR_STATE.write().editing = None;
    let title = with_engine(|engine| {
        engine.load_starter_invoice()?;
        Ok(engine.document().title().to_string())
    });
    if let Some(title) = title {
        EDITOR_STATE.write().title = title;
    }
}

fn set_mode(mode: EditorMode) {
    EDITOR_STATE.write().mode = mode;
}

/// Reports an upload failure the way the page does.
pub fn report_upload_failure(err: &page_builder::BuilderError) {
    web::alert(&failure_message(err));
}
