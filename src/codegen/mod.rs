//! Output generation from the element tree.
//!
//! Preview output is plain HTML with variables resolved against mock data.
//! Publish output is template source: variables become `{{ $a->b }}`
//! interpolations and conditionals/loops become `@if`/`@foreach` blocks.

pub mod invoice;
mod page;
mod tokens;

use serde_json::Value;

pub use page::{preview_page, publish_page};
pub use tokens::{escape_html, escape_multiline, resolve_tokens, translate_tokens};

use crate::element::{
    ButtonContent, ConditionalContent, Element, ElementContent, ImageContent, LayoutContent,
    LoopContent, VariableRef, PLACEHOLDER_IMAGE,
};
use crate::styles::StyleMap;
use crate::variables::{interpolate, path_to_template_expr, stringify, walk, VariableCatalog};

/// Shown for a variable element with no path selected.
pub const UNSET_VARIABLE: &str = "{{ variable }}";

const DEFAULT_GAP: &str = "20px";
const BUTTON_BODY_KEYS: [&str; 5] = ["background-color", "color", "padding", "border", "border-radius"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Preview,
    Publish,
}

/// Loop items bound while previewing `loop` blocks, innermost last.
#[derive(Debug, Clone, Default)]
struct Scope<'v> {
    bindings: Vec<(&'v str, &'v Value)>,
}

impl<'v> Scope<'v> {
    fn with(&self, name: &'v str, value: &'v Value) -> Scope<'v> {
        let mut bindings = self.bindings.clone();
        bindings.push((name, value));
        Scope { bindings }
    }

    /// Resolves `item.field` style paths against the bound items.
    fn lookup(&self, path: &str) -> Option<&'v Value> {
        let (root, rest) = match path.split_once('.') {
            Some((root, rest)) => (root, Some(rest)),
            None => (path, None),
        };
        let (_, value) = self.bindings.iter().rev().find(|(name, _)| *name == root)?;
        match rest {
            Some(rest) => walk(value, rest),
            None => Some(*value),
        }
    }
}

pub struct Generator<'a> {
    catalog: &'a VariableCatalog,
}

impl<'a> Generator<'a> {
    pub fn new(catalog: &'a VariableCatalog) -> Self {
        Self { catalog }
    }

    pub fn generate(&self, elements: &[Element], mode: Mode) -> String {
        match mode {
            Mode::Preview => self.preview(elements),
            Mode::Publish => self.publish(elements),
        }
    }

    pub fn preview(&self, elements: &[Element]) -> String {
        let scope = Scope::default();
        elements
            .iter()
            .map(|element| self.preview_element(element, &scope))
            .collect()
    }

    pub fn publish(&self, elements: &[Element]) -> String {
        elements.iter().map(|e| self.publish_element(e)).collect()
    }

    pub fn element(&self, element: &Element, mode: Mode) -> String {
        match mode {
            Mode::Preview => self.preview_element(element, &Scope::default()),
            Mode::Publish => self.publish_element(element),
        }
    }

    fn publish_element(&self, element: &Element) -> String {
        let style = style_attr(&element.styles);
        match &element.content {
            ElementContent::Text(text) => format!("<p{}>{}</p>", style, translate_tokens(text)),
            ElementContent::Heading(text) => {
                format!("<h2{}>{}</h2>", style, translate_tokens(text))
            }
            ElementContent::Image(ImageContent { src, alt }) => format!(
                r#"<img src="{}" alt="{}"{}>"#,
                translate_tokens(src),
                escape_html(alt),
                style
            ),
            ElementContent::Button(button) => format!(
                r#"<a href="{}"{}><button>{}</button></a>"#,
                translate_tokens(button_link(button)),
                style,
                translate_tokens(button_text(button))
            ),
            ElementContent::Layout(layout) => {
                self.layout(layout, &element.styles, |e| self.publish_element(e))
            }
            ElementContent::Variable(VariableRef { path, .. }) => {
                interpolate(path).unwrap_or_else(|_| UNSET_VARIABLE.to_string())
            }
            ElementContent::Conditional(cond) => self.publish_conditional(cond),
            ElementContent::Loop(block) => self.publish_loop(block),
            content => invoice::fragments(content)
                .map(|frags| invoice::publish(&frags))
                .unwrap_or_default(),
        }
    }

    fn publish_conditional(&self, cond: &ConditionalContent) -> String {
        let Ok(expr) = path_to_template_expr(&cond.condition) else {
            return String::new();
        };
        let mut out = format!("@if({})\n", expr);
        out.push_str(&self.publish(&cond.true_content));
        if cond.show_else {
            out.push_str("@else\n");
            out.push_str(&self.publish(&cond.false_content));
        }
        out.push_str("@endif\n");
        out
    }

    fn publish_loop(&self, block: &LoopContent) -> String {
        let Ok(expr) = path_to_template_expr(&block.loop_variable) else {
            return String::new();
        };
        let mut out = format!("@foreach({} as ${})\n", expr, item_name(block));
        out.push_str(&self.publish(&block.content));
        out.push_str("@endforeach\n");
        out
    }

    fn preview_element(&self, element: &Element, scope: &Scope<'_>) -> String {
        let style = style_attr(&element.styles);
        match &element.content {
            ElementContent::Text(text) => {
                format!("<p{}>{}</p>", style, self.preview_text(text, scope))
            }
            ElementContent::Heading(text) => {
                format!("<h2{}>{}</h2>", style, self.preview_text(text, scope))
            }
            ElementContent::Image(ImageContent { src, alt }) => {
                let src = if src.is_empty() { PLACEHOLDER_IMAGE } else { src };
                format!(
                    r#"<img src="{}" alt="{}"{}>"#,
                    escape_html(src),
                    escape_html(alt),
                    style
                )
            }
            ElementContent::Button(button) => format!(
                r#"<a href="{}"><button style="{}">{}</button></a>"#,
                escape_html(button_link(button)),
                escape_html(&button_preview_styles(&element.styles).to_css()),
                self.preview_text(button_text(button), scope)
            ),
            ElementContent::Layout(layout) => {
                self.layout(layout, &element.styles, |e| self.preview_element(e, scope))
            }
            ElementContent::Variable(VariableRef { path, .. }) => {
                if path.is_empty() {
                    return UNSET_VARIABLE.to_string();
                }
                match self.resolve(path, scope) {
                    Some(value) => escape_html(&value),
                    None => interpolate(path).unwrap_or_else(|_| UNSET_VARIABLE.to_string()),
                }
            }
            ElementContent::Conditional(cond) => {
                if cond.condition.is_empty() {
                    return String::new();
                }
                let holds = invoice::is_truthy(self.lookup(&cond.condition, scope));
                let branch = match (holds, cond.show_else) {
                    (true, _) => &cond.true_content,
                    (false, true) => &cond.false_content,
                    (false, false) => return String::new(),
                };
                branch
                    .iter()
                    .map(|e| self.preview_element(e, scope))
                    .collect()
            }
            ElementContent::Loop(block) => {
                if block.loop_variable.is_empty() {
                    return String::new();
                }
                let name = item_name(block);
                let mut out = String::new();
                for item in invoice::iterate(self.lookup(&block.loop_variable, scope)) {
                    let inner = scope.with(name, item);
                    for e in &block.content {
                        out.push_str(&self.preview_element(e, &inner));
                    }
                }
                out
            }
            content => invoice::fragments(content)
                .map(|frags| invoice::preview(&frags, self.catalog.mock_data()))
                .unwrap_or_default(),
        }
    }

    fn preview_text(&self, text: &str, scope: &Scope<'_>) -> String {
        escape_multiline(&resolve_tokens(text, |path| self.resolve(path, scope)))
    }

    /// Loop items first, then the catalog with its type formatting.
    fn resolve(&self, path: &str, scope: &Scope<'_>) -> Option<String> {
        match scope.lookup(path) {
            Some(value) => Some(stringify(value)),
            None => self.catalog.resolve_preview(path),
        }
    }

    fn lookup<'v>(&'v self, path: &str, scope: &Scope<'v>) -> Option<&'v Value> {
        scope
            .lookup(path)
            .or_else(|| self.catalog.lookup_mock(path))
    }

    fn layout<F>(&self, layout: &LayoutContent, styles: &StyleMap, mut child: F) -> String
    where
        F: FnMut(&Element) -> String,
    {
        let mut style = format!(
            "display: grid; grid-template-columns: repeat({}, 1fr); gap: {};",
            layout.columns.max(1),
            styles.value_or("gap", DEFAULT_GAP)
        );
        let rest = styles.without(&["gap", "grid-template-columns"]).to_css();
        if !rest.is_empty() {
            style.push(' ');
            style.push_str(&rest);
        }
        let mut out = format!(
            r#"<div class="layout-container" style="{}">"#,
            escape_html(&style)
        );
        for bucket in &layout.column_elements {
            out.push_str(r#"<div class="layout-column">"#);
            for element in bucket {
                out.push_str(&child(element));
            }
            out.push_str("</div>");
        }
        out.push_str("</div>");
        out
    }
}

/// ` style="..."` when any style survives filtering.
pub fn style_attr(styles: &StyleMap) -> String {
    let css = styles.to_css();
    if css.is_empty() {
        String::new()
    } else {
        format!(r#" style="{}""#, escape_html(&css))
    }
}

/// Styles carried by the `<button>` itself in preview output.
pub fn button_preview_styles(styles: &StyleMap) -> StyleMap {
    let mut out = styles.pick(&BUTTON_BODY_KEYS);
    out.set("width", styles.value_or("width", "150px"));
    out.set("height", styles.value_or("height", "40px"));
    if let Some(align) = styles.value("text-align") {
        out.set("text-align", align);
    }
    out
}

fn button_text(button: &ButtonContent) -> &str {
    if button.text.is_empty() {
        "Button"
    } else {
        &button.text
    }
}

fn button_link(button: &ButtonContent) -> &str {
    if button.link.is_empty() {
        "#"
    } else {
        &button.link
    }
}

fn item_name(block: &LoopContent) -> &str {
    if block.item_variable.is_empty() {
        "item"
    } else {
        &block.item_variable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuilderConfig;
    use crate::element::{ElementId, ElementType};
    use pretty_assertions::assert_eq;

    fn catalog() -> VariableCatalog {
        VariableCatalog::from_config(&BuilderConfig::embedded().unwrap().catalog)
    }

    fn bare(content: ElementContent) -> Element {
        Element {
            id: ElementId(1),
            content,
            styles: StyleMap::new(),
        }
    }

    #[test]
    fn test_publish_text_translates_tokens() {
        let catalog = catalog();
        let text = bare(ElementContent::Text("Total: ((invoice.total)) <net>".to_string()));
        assert_eq!(
            Generator::new(&catalog).element(&text, Mode::Publish),
            "<p>Total: {{ $invoice->total }} &lt;net&gt;</p>"
        );
    }

    #[test]
    fn test_preview_text_resolves_and_breaks_lines() {
        let catalog = catalog();
        let text = bare(ElementContent::Text("Total ((invoice.total))\n((nope.path))".to_string()));
        assert_eq!(
            Generator::new(&catalog).element(&text, Mode::Preview),
            "<p>Total $1625.00<br>((nope.path))</p>"
        );
    }

    #[test]
    fn test_variable_placeholder_when_unset() {
        let catalog = catalog();
        let generator = Generator::new(&catalog);
        let unset = bare(ElementContent::Variable(VariableRef::default()));
        assert_eq!(generator.element(&unset, Mode::Publish), "{{ variable }}");
        assert_eq!(generator.element(&unset, Mode::Preview), "{{ variable }}");

        let set = bare(ElementContent::Variable(VariableRef {
            path: "client.name".to_string(),
            display_name: "Client Name".to_string(),
        }));
        assert_eq!(generator.element(&set, Mode::Publish), "{{ $client->name }}");
        assert_eq!(generator.element(&set, Mode::Preview), "ABC Company");
    }

    #[test]
    fn test_conditional_blocks() {
        let catalog = catalog();
        let generator = Generator::new(&catalog);
        let cond = bare(ElementContent::Conditional(ConditionalContent {
            condition: "client.tax".to_string(),
            true_content: vec![Element {
                id: ElementId(2),
                content: ElementContent::Text("Tax ((client.tax))".to_string()),
                styles: StyleMap::new(),
            }],
            false_content: vec![Element {
                id: ElementId(3),
                content: ElementContent::Text("No tax".to_string()),
                styles: StyleMap::new(),
            }],
            show_else: true,
        }));
        assert_eq!(
            generator.element(&cond, Mode::Publish),
            "@if($client->tax)\n<p>Tax {{ $client->tax }}</p>@else\n<p>No tax</p>@endif\n"
        );
        assert_eq!(
            generator.element(&cond, Mode::Preview),
            "<p>Tax TAX-123456789</p>"
        );
    }

    #[test]
    fn test_loop_binds_item_in_preview() {
        let catalog = catalog();
        let generator = Generator::new(&catalog);
        let block = bare(ElementContent::Loop(LoopContent {
            loop_variable: "invoice.other_expenses".to_string(),
            item_variable: "fee".to_string(),
            content: vec![Element {
                id: ElementId(2),
                content: ElementContent::Text("((fee.label))".to_string()),
                styles: StyleMap::new(),
            }],
        }));
        assert_eq!(
            generator.element(&block, Mode::Publish),
            "@foreach($invoice->other_expenses as $fee)\n<p>{{ $fee->label }}</p>@endforeach\n"
        );
        assert_eq!(
            generator.element(&block, Mode::Preview),
            "<p>Setup Fee</p><p>Processing Fee</p>"
        );
    }

    #[test]
    fn test_layout_merges_grid_style() {
        let catalog = catalog();
        let mut layout = Element::new(ElementId(1), ElementType::Layout);
        layout.styles = StyleMap::from_iter([
            ("grid-template-columns", "repeat(2, 1fr)"),
            ("gap", "8px"),
            ("padding", "4px"),
        ]);
        if let Some(content) = layout.as_layout_mut() {
            content.column_elements[1].push(Element {
                id: ElementId(2),
                content: ElementContent::Heading("Hi".to_string()),
                styles: StyleMap::new(),
            });
        }
        assert_eq!(
            Generator::new(&catalog).element(&layout, Mode::Publish),
            r#"<div class="layout-container" style="display: grid; grid-template-columns: repeat(2, 1fr); gap: 8px; padding: 4px"><div class="layout-column"></div><div class="layout-column"><h2>Hi</h2></div></div>"#
        );
    }

    #[test]
    fn test_button_outputs() {
        let catalog = catalog();
        let generator = Generator::new(&catalog);
        let mut button = Element::new(ElementId(1), ElementType::Button);
        button.styles = StyleMap::from_iter([("color", "#fff"), ("margin", "0")]);
        assert_eq!(
            generator.element(&button, Mode::Publish),
            r##"<a href="#" style="color: #fff; margin: 0"><button>Button</button></a>"##
        );
        assert_eq!(
            generator.element(&button, Mode::Preview),
            r##"<a href="#"><button style="color: #fff; width: 150px; height: 40px">Button</button></a>"##
        );
    }

    #[test]
    fn test_image_preview_falls_back_to_placeholder() {
        let catalog = catalog();
        let image = bare(ElementContent::Image(ImageContent {
            src: String::new(),
            alt: "A \"quote\"".to_string(),
        }));
        let generator = Generator::new(&catalog);
        assert_eq!(
            generator.element(&image, Mode::Preview),
            r#"<img src="https://via.placeholder.com/400x200" alt="A &quot;quote&quot;">"#
        );
        assert_eq!(
            generator.element(&image, Mode::Publish),
            r#"<img src="" alt="A &quot;quote&quot;">"#
        );
    }
}
