//! Editor-side visual description of one element.
//!
//! A view is plain data: the surface decides how to realise it. Building a
//! view never touches the document, so the same view can be mounted, diffed
//! against the previous one, or printed as markup.

use crate::codegen::{escape_html, UNSET_VARIABLE};
use crate::element::{
    ConditionalContent, Element, ElementContent, ElementId, ElementType, InvoiceHeader,
    InvoiceInfoTable, InvoiceItemsTable, InvoiceTotals, ItemColumn, LayoutContent, LoopContent,
    VariableRef, PLACEHOLDER_IMAGE,
};
use crate::render::editable::text_to_markup;
use crate::render::StructuralKey;
use crate::styles::StyleMap;
use crate::variables::{interpolate, VariableCatalog};

const DEFAULT_BUTTON_WIDTH: &str = "150px";
const DEFAULT_BUTTON_HEIGHT: &str = "40px";
const DEFAULT_BUTTON_PADDING: &str = "0.5rem 1.5rem";
const DEFAULT_GAP: &str = "20px";

/// Keys that never reach the container of a button.
const BUTTON_BODY_ONLY: [&str; 6] = [
    "width",
    "height",
    "background-color",
    "color",
    "image-width",
    "image-height",
];

const COLUMN_STYLE: &str =
    "min-height: 50px; padding: 5px; background: #ffffff; border: 2px dashed #d1d5db; border-radius: 4px;";
const COLUMN_CONTENT_STYLE: &str = "min-height: 30px; position: relative; padding: 5px;";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnView {
    pub layout: usize,
    pub column: usize,
    pub elements: Vec<ElementView>,
}

impl ColumnView {
    pub fn label(&self) -> String {
        format!("Column {}", self.column + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyContent {
    Markup(String),
    Columns(Vec<ColumnView>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyView {
    pub tag: &'static str,
    pub class: &'static str,
    pub style: String,
    pub attrs: Vec<(&'static str, String)>,
    pub editable: bool,
    pub content: BodyContent,
}

impl BodyView {
    fn markup(tag: &'static str, class: &'static str, markup: String) -> Self {
        Self {
            tag,
            class,
            style: String::new(),
            attrs: Vec::new(),
            editable: false,
            content: BodyContent::Markup(markup),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Inner markup for non-layout bodies.
    pub fn inner_markup(&self) -> Option<&str> {
        match &self.content {
            BodyContent::Markup(markup) => Some(markup),
            BodyContent::Columns(_) => None,
        }
    }
}

/// One rendered node: an outer container carrying the element's own styles
/// and a body that shows its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementView {
    pub key: StructuralKey,
    pub id: ElementId,
    pub kind: ElementType,
    pub container_class: &'static str,
    pub container_style: String,
    pub body: BodyView,
}

impl ElementView {
    pub fn build(element: &Element, key: StructuralKey, catalog: &VariableCatalog) -> Self {
        let nested = key.is_nested();
        let container_class = match (nested, element.kind()) {
            (false, _) => "builder-element",
            (true, ElementType::Button) => "nested-element builder-element nested-button-container",
            (true, _) => "nested-element builder-element",
        };
        Self {
            key,
            id: element.id,
            kind: element.kind(),
            container_class,
            container_style: container_style(element, nested),
            body: body(element, key, catalog),
        }
    }

    /// Views of nested elements, in column order.
    pub fn children(&self) -> impl Iterator<Item = &ElementView> {
        let columns: &[ColumnView] = match &self.body.content {
            BodyContent::Columns(columns) => columns,
            BodyContent::Markup(_) => &[],
        };
        columns.iter().flat_map(|c| c.elements.iter())
    }

    /// Full container markup, nested views included.
    pub fn to_html(&self) -> String {
        let delete_class = if self.key.is_nested() {
            "delete-nested-element"
        } else {
            "delete-element"
        };
        let mut out = format!(
            r#"<div class="{}" data-pb-id="{}" data-pb-key="{}" data-type="{}""#,
            self.container_class, self.id, self.key, self.kind
        );
        push_style(&mut out, &self.container_style);
        out.push('>');
        out.push_str(&self.body_html());
        out.push_str(&format!(
            r#"<button class="{}" data-pb-delete="{}" title="Delete">&times;</button></div>"#,
            delete_class, self.id
        ));
        out
    }

    pub fn body_html(&self) -> String {
        let body = &self.body;
        let mut out = format!(r#"<{} class="{}" data-pb-body="{}""#, body.tag, body.class, self.key);
        push_style(&mut out, &body.style);
        for (name, value) in &body.attrs {
            out.push_str(&format!(r#" {}="{}""#, name, escape_html(value)));
        }
        if body.editable {
            out.push_str(r#" contenteditable="true""#);
        }
        out.push('>');
        if body.tag == "img" {
            return out;
        }
        match &body.content {
            BodyContent::Markup(markup) => out.push_str(markup),
            BodyContent::Columns(columns) => {
                for column in columns {
                    out.push_str(&column_html(column));
                }
            }
        }
        out.push_str(&format!("</{}>", body.tag));
        out
    }
}

fn push_style(out: &mut String, style: &str) {
    if !style.is_empty() {
        out.push_str(&format!(r#" style="{}""#, escape_html(style)));
    }
}

fn column_html(column: &ColumnView) -> String {
    let mut out = format!(
        r#"<div class="layout-column drop-zone-column" data-layout-index="{l}" data-column-index="{c}" style="{s}"><div class="column-header text-xs text-gray-500 mb-1">{label}</div><div class="column-content drop-zone" data-layout-index="{l}" data-column-index="{c}" style="{cs}">"#,
        l = column.layout,
        c = column.column,
        s = COLUMN_STYLE,
        label = column.label(),
        cs = COLUMN_CONTENT_STYLE,
    );
    for element in &column.elements {
        out.push_str(&element.to_html());
    }
    out.push_str("</div></div>");
    out
}

fn button_size(styles: &StyleMap) -> (&str, &str) {
    (
        styles.value_or("width", DEFAULT_BUTTON_WIDTH),
        styles.value_or("height", DEFAULT_BUTTON_HEIGHT),
    )
}

/// Style of the outer node. Buttons size their container from the button's
/// own dimensions.
pub fn container_style(element: &Element, nested: bool) -> String {
    let styles = &element.styles;
    if element.kind() != ElementType::Button {
        return styles.without(&["image-width", "image-height"]).to_css();
    }
    let (width, height) = button_size(styles);
    let pad = if nested { 16 } else { 24 };
    let mut out = format!(
        "width: calc({w} + {p}px); min-width: calc({w} + {p}px); height: calc({h} + {p}px); min-height: calc({h} + {p}px);",
        w = width,
        h = height,
        p = pad
    );
    if !nested {
        out.push_str(" display: flex; align-items: center; justify-content: center;");
    }
    let rest = styles.without(&BUTTON_BODY_ONLY).to_css();
    if !rest.is_empty() {
        out.push(' ');
        out.push_str(&rest);
    }
    out
}

/// Style of the inner node that shows the content.
pub fn body_style(element: &Element) -> String {
    let styles = &element.styles;
    match &element.content {
        ElementContent::Text(_) | ElementContent::Heading(_) => styles
            .pick(&["font-size", "font-weight", "color", "text-align", "background-color"])
            .to_css(),
        ElementContent::Image(_) => {
            let mut out = StyleMap::new();
            if let Some(width) = styles.value("image-width") {
                out.set("width", width);
            }
            if let Some(height) = styles.value("image-height") {
                out.set("height", height);
            }
            for key in ["border", "border-radius", "object-fit"] {
                if let Some(value) = styles.value(key) {
                    out.set(key, value);
                }
            }
            out.to_css()
        }
        ElementContent::Button(_) => {
            let (width, height) = button_size(styles);
            let mut out = styles.pick(&["background-color", "color"]);
            out.set("padding", styles.value_or("padding", DEFAULT_BUTTON_PADDING));
            for key in ["border", "border-radius", "font-size", "font-weight"] {
                if let Some(value) = styles.value(key) {
                    out.set(key, value);
                }
            }
            out.set("width", width);
            out.set("height", height);
            out.set("flex-shrink", "0");
            out.set("flex-grow", "0");
            out.set("box-sizing", "border-box");
            out.set("transition", "none");
            out.set("contain", "layout style paint");
            out.set("margin", "0");
            out.to_css()
        }
        ElementContent::Layout(layout) => format!(
            "display: grid; grid-template-columns: repeat({}, 1fr); gap: {}; padding: 10px; min-height: 100px;",
            layout.columns.max(1),
            styles.value_or("gap", DEFAULT_GAP)
        ),
        _ => String::new(),
    }
}

fn body(element: &Element, key: StructuralKey, catalog: &VariableCatalog) -> BodyView {
    let mut body = match &element.content {
        ElementContent::Text(text) => BodyView {
            editable: true,
            ..BodyView::markup(
                "p",
                "text-gray-700 variable-editable whitespace-pre-wrap",
                text_to_markup(text),
            )
        },
        ElementContent::Heading(text) => BodyView {
            editable: true,
            ..BodyView::markup(
                "h2",
                "text-2xl font-bold text-gray-900 variable-editable whitespace-pre-wrap",
                text_to_markup(text),
            )
        },
        ElementContent::Image(image) => {
            let src = if image.src.is_empty() {
                PLACEHOLDER_IMAGE
            } else {
                &image.src
            };
            BodyView {
                attrs: vec![("src", src.to_string()), ("alt", image.alt.clone())],
                ..BodyView::markup("img", "", String::new())
            }
        }
        ElementContent::Button(button) => {
            let text = if button.text.is_empty() {
                "Button"
            } else {
                &button.text
            };
            BodyView::markup("button", "rounded-md resizable-button", escape_html(text))
        }
        ElementContent::Layout(layout) => BodyView {
            content: BodyContent::Columns(columns(layout, key.root(), catalog)),
            ..BodyView::markup("div", "layout-container", String::new())
        },
        ElementContent::Variable(var) => BodyView::markup(
            "span",
            "variable-display inline-block bg-blue-100 border border-blue-300 px-2 py-1 rounded text-sm align-middle",
            variable_markup(var, catalog),
        ),
        ElementContent::Conditional(cond) => BodyView::markup(
            "div",
            "conditional-block border-2 border-purple-300 bg-purple-50 p-3 rounded",
            conditional_markup(cond, catalog),
        ),
        ElementContent::Loop(block) => BodyView::markup(
            "div",
            "loop-block border-2 border-green-300 bg-green-50 p-3 rounded",
            loop_markup(block, catalog),
        ),
        ElementContent::InvoiceHeader(header) => BodyView::markup(
            "div",
            "invoice-header border-b-2 border-black pb-2 mb-4",
            header_markup(header),
        ),
        ElementContent::InvoiceInfoTable(table) => BodyView::markup(
            "table",
            "w-full mb-4 border-collapse",
            info_table_markup(table),
        ),
        ElementContent::InvoiceItemsTable(table) => BodyView::markup(
            "table",
            "w-full border-collapse",
            items_table_markup(table),
        ),
        ElementContent::InvoiceTotals(totals) => BodyView::markup(
            "table",
            "w-full border-collapse mt-4",
            totals_markup(totals),
        ),
        ElementContent::InvoicePaymentInfo(_) => {
            BodyView::markup("div", "payment-info mt-4", payment_markup())
        }
    };
    body.style = body_style(element);
    body
}

fn columns(layout: &LayoutContent, index: usize, catalog: &VariableCatalog) -> Vec<ColumnView> {
    (0..layout.columns.max(1))
        .map(|column| ColumnView {
            layout: index,
            column,
            elements: layout
                .column_elements
                .get(column)
                .map(|bucket| {
                    bucket
                        .iter()
                        .enumerate()
                        .map(|(i, e)| ElementView::build(e, StructuralKey::nested(index, column, i), catalog))
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect()
}

/// Display name from the catalog, falling back to the raw path.
fn display_name<'a>(path: &'a str, catalog: &'a VariableCatalog) -> &'a str {
    catalog
        .by_path(path)
        .map_or(path, |v| v.display_name.as_str())
}

fn variable_markup(var: &VariableRef, catalog: &VariableCatalog) -> String {
    let name = match catalog.by_path(&var.path) {
        Some(variable) => variable.display_name.as_str(),
        None if !var.display_name.is_empty() => var.display_name.as_str(),
        None => "Variable (Not Selected)",
    };
    let expr = interpolate(&var.path).unwrap_or_else(|_| UNSET_VARIABLE.to_string());
    format!(
        r#"<span class="font-medium text-blue-900">{}</span><span class="text-xs text-blue-600 ml-1 font-mono">{}</span>"#,
        escape_html(name),
        escape_html(&expr)
    )
}

fn conditional_markup(cond: &ConditionalContent, catalog: &VariableCatalog) -> String {
    let path = if cond.condition.is_empty() {
        "variable"
    } else {
        &cond.condition
    };
    let mut out = format!(
        r#"<div class="conditional-header flex items-center mb-2"><span class="bg-purple-600 text-white px-2 py-1 rounded text-xs mr-2">IF</span><span class="text-sm font-semibold">{} exists</span></div><div class="conditional-true-content min-h-20 p-2 bg-white border border-purple-200 rounded mb-2"><p class="text-xs text-gray-500 mb-1">Show if true:</p><div class="conditional-content-area" data-type="true-content"></div></div>"#,
        escape_html(display_name(path, catalog))
    );
    if cond.show_else {
        out.push_str(r#"<div class="conditional-false-content min-h-20 p-2 bg-white border border-purple-200 rounded"><p class="text-xs text-gray-500 mb-1">Show if false:</p><div class="conditional-content-area" data-type="false-content"></div></div>"#);
    }
    out
}

fn loop_markup(block: &LoopContent, catalog: &VariableCatalog) -> String {
    let path = if block.loop_variable.is_empty() {
        "array"
    } else {
        &block.loop_variable
    };
    let item = if block.item_variable.is_empty() {
        "item"
    } else {
        &block.item_variable
    };
    format!(
        r#"<div class="loop-header flex items-center mb-2"><span class="bg-green-600 text-white px-2 py-1 rounded text-xs mr-2">LOOP</span><span class="text-sm font-semibold">{} (as {})</span></div><div class="loop-content min-h-20 p-2 bg-white border border-green-200 rounded"><p class="text-xs text-gray-500 mb-1">Repeat for each item:</p><div class="loop-content-area" data-type="loop-content"></div></div>"#,
        escape_html(display_name(path, catalog)),
        escape_html(item)
    )
}

fn header_markup(header: &InvoiceHeader) -> String {
    let title = if header.title.is_empty() {
        "Invoice"
    } else {
        &header.title
    };
    let mut out = format!(
        r#"<div class="invoice-title text-2xl font-bold uppercase">{}</div>"#,
        escape_html(title)
    );
    if header.show_user_info {
        out.push_str(r#"<div class="user-info mt-2"><strong>[User Name]</strong><br>[User Address]</div>"#);
    }
    out
}

fn info_table_markup(table: &InvoiceInfoTable) -> String {
    let mut out = String::from("<tr>");
    if table.show_client_info {
        out.push_str(r#"<td class="border p-2"><div class="font-bold text-red-800">Invoice To:</div><div class="font-bold">[Client Name]</div><div>[Client Address]</div>[Client Tax]</td>"#);
    } else {
        out.push_str("<td></td>");
    }
    if table.show_invoice_details {
        out.push_str(r#"<td class="border p-2 text-right"><div><strong>Invoice #:</strong> [Invoice Number]</div><div><strong>Date:</strong> [Invoice Date]</div><div><strong>Due:</strong> [Due Date]</div></td>"#);
    } else {
        out.push_str("<td></td>");
    }
    out.push_str("</tr>");
    out
}

fn items_table_markup(table: &InvoiceItemsTable) -> String {
    let mut head = String::new();
    let mut row = String::new();
    for column in &table.columns {
        match column {
            ItemColumn::Description => {
                head.push_str(r#"<th class="border p-2 bg-gray-200">Description</th>"#);
                row.push_str(r#"<td class="border p-2">[Item Label]</td>"#);
            }
            ItemColumn::Amount => {
                head.push_str(r#"<th class="border p-2 bg-gray-200 text-right">Amount</th>"#);
                row.push_str(r#"<td class="border p-2 text-right">$[Item Amount]</td>"#);
            }
        }
    }
    format!(
        r#"<thead><tr>{}</tr></thead><tbody><tr class="loop-row" data-loop="{}">{}</tr></tbody>"#,
        head,
        escape_html(&table.loop_variable),
        row
    )
}

fn totals_markup(totals: &InvoiceTotals) -> String {
    let mut out = String::from("<tbody>");
    if totals.show_subtotal {
        out.push_str(r#"<tr><td class="border p-2 font-bold">Sub-Total:</td><td class="border p-2 text-right">$[Invoice Total]</td></tr>"#);
    }
    if totals.show_total {
        out.push_str(r#"<tr><td class="border p-2 font-bold">Total USD:</td><td class="border p-2 text-right font-bold">$[Invoice Total]</td></tr>"#);
    }
    out.push_str("</tbody>");
    out
}

fn payment_markup() -> String {
    let rows = [
        ("Bank Country", "[Bank Country]"),
        ("Bank", "[Bank Name]"),
        ("SWIFT/BIC Code", "[SWIFT Code]"),
        ("Account Number", "[Account Number]"),
        ("Account Name", "[User Name]"),
        ("Address", "[User Address]"),
        ("Phone", "[User Phone]"),
    ];
    let mut out = String::from(
        r#"<div class="font-bold mb-2">Payment Options:</div><div class="conditional-wrapper" data-condition="bankInfo"><table class="w-full border-collapse mt-2">"#,
    );
    for (label, placeholder) in rows {
        out.push_str(&format!(
            r#"<tr><td class="border p-2"><b>{}:</b></td><td class="border p-2">{}</td></tr>"#,
            label, placeholder
        ));
    }
    out.push_str(r#"</table><div class="conditional-else" style="display: none;"><p><em>No bank information assigned to this client.</em></p></div></div>"#);
    out
}
