//! Property panel: which fields an element exposes and how an edited value
//! is written back into the element.

use tracing::debug;

use crate::element::{Element, ElementContent, ElementType, ItemColumn, PLACEHOLDER_IMAGE};
use crate::render::StructuralKey;
use crate::variables::VariableCatalog;

/// Property key prefix used by the items-table column toggles.
pub const COLUMN_TOGGLE_PREFIX: &str = "column:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    Text { placeholder: &'static str },
    Color,
    Select { options: Vec<SelectOption> },
    Checkbox,
    ColumnToggle(ItemColumn),
    /// Image drop area, with the current image when it is not the placeholder.
    Upload { preview: Option<String> },
    Hint(Vec<String>),
}

impl Control {
    /// Text and color inputs commit after the input goes quiet or loses
    /// focus. Everything else commits on change.
    pub fn is_debounced(&self) -> bool {
        matches!(self, Control::Text { .. } | Control::Color)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub property: String,
    pub label: String,
    pub control: Control,
    /// Current value as shown in the input. Checkboxes use `true`/`false`.
    pub value: String,
}

/// Location banner shown above the fields of a nested element. 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NestedHeader {
    pub layout: usize,
    pub column: usize,
    pub element: usize,
}

impl NestedHeader {
    pub const TITLE: &'static str = "Editing Nested Element";

    pub fn location(&self) -> String {
        format!(
            "Layout: {}, Column: {}, Element: {}",
            self.layout, self.column, self.element
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelSchema {
    pub title: String,
    pub nested: Option<NestedHeader>,
    pub fields: Vec<Field>,
}

struct Builder<'a> {
    element: &'a Element,
    fields: Vec<Field>,
}

impl<'a> Builder<'a> {
    fn push(&mut self, property: &str, label: &str, control: Control, value: String) {
        self.fields.push(Field {
            property: property.to_string(),
            label: label.to_string(),
            control,
            value,
        });
    }

    fn style(&self, key: &str, fallback: &str) -> String {
        self.element.styles.value_or(key, fallback).to_string()
    }

    fn text_style(&mut self, property: &str, label: &str, placeholder: &'static str, fallback: &str) {
        let value = self.style(property, fallback);
        self.push(property, label, Control::Text { placeholder }, value);
    }

    fn color_style(&mut self, property: &str, label: &str, fallback: &str) {
        let value = self.style(property, fallback);
        self.push(property, label, Control::Color, value);
    }

    fn text(&mut self, property: &str, label: &str, placeholder: &'static str, value: &str) {
        self.push(property, label, Control::Text { placeholder }, value.to_string());
    }

    fn checkbox(&mut self, property: &str, label: &str, checked: bool) {
        self.push(property, label, Control::Checkbox, checked.to_string());
    }

    fn variable_select(&mut self, property: &str, label: &str, placeholder: &str, options: Vec<SelectOption>, value: &str) {
        let mut all = vec![SelectOption::new("", placeholder)];
        all.extend(options);
        self.push(property, label, Control::Select { options: all }, value.to_string());
    }
}

fn or_default<'s>(value: &'s str, fallback: &'s str) -> &'s str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

/// Builds the property panel for the element at `key`.
pub fn panel_for(
    element: &Element,
    key: StructuralKey,
    catalog: &VariableCatalog,
    hint_limit: usize,
) -> PanelSchema {
    let nested = match key {
        StructuralKey::Nested {
            layout,
            column,
            element,
        } => Some(NestedHeader {
            layout: layout + 1,
            column: column + 1,
            element: element + 1,
        }),
        StructuralKey::TopLevel(_) => None,
    };
    let mut b = Builder {
        element,
        fields: Vec::new(),
    };
    let kind = element.kind();

    b.text_style("margin", "Margin", "e.g., 10px 20px", "");
    b.text_style("padding", "Padding", "e.g., 10px 20px", "");
    b.text_style("border", "Border", "e.g., 1px solid #000", "");
    b.text_style("border-radius", "Border Radius", "e.g., 8px", "");
    let align = b.style("text-align", "");
    b.push(
        "text-align",
        "Text Align",
        Control::Select {
            options: vec![
                SelectOption::new("left", "Left"),
                SelectOption::new("center", "Center"),
                SelectOption::new("right", "Right"),
                SelectOption::new("justify", "Justify"),
            ],
        },
        align,
    );
    if kind != ElementType::Button {
        b.text_style("width", "Width", "e.g., 100%, 500px", "");
    }

    match &element.content {
        ElementContent::Text(_) | ElementContent::Heading(_) => {
            b.text_style("font-size", "Font Size", "e.g., 16px, 1.5rem", "");
            let weight = b.style("font-weight", "");
            b.push(
                "font-weight",
                "Font Weight",
                Control::Select {
                    options: vec![
                        SelectOption::new("normal", "Normal"),
                        SelectOption::new("bold", "Bold"),
                        SelectOption::new("300", "Light"),
                        SelectOption::new("600", "Semi-bold"),
                    ],
                },
                weight,
            );
            b.color_style("color", "Text Color", "#000000");
            b.color_style("background-color", "Background Color", "#ffffff");
            b.push(
                "",
                "Variable Hint",
                Control::Hint(catalog.hint(hint_limit)),
                String::new(),
            );
        }
        ElementContent::Image(image) => {
            let preview = (!image.src.is_empty() && image.src != PLACEHOLDER_IMAGE)
                .then(|| image.src.clone());
            b.push("", "Image Upload", Control::Upload { preview }, String::new());
            b.text("alt", "Image Alt Text", "Alt text", &image.alt);
            b.text("src", "Image URL", "Image URL", &image.src);
            b.text_style("image-width", "Width", "e.g., 100%, 500px", "");
            b.text_style("image-height", "Height", "e.g., auto, 300px", "");
        }
        ElementContent::Button(button) => {
            b.text("button-text", "Button Text", "", or_default(&button.text, "Button"));
            let link_placeholder = if nested.is_some() { "URL" } else { "" };
            b.text("button-link", "Button Link", link_placeholder, or_default(&button.link, "#"));
            b.text_style("width", "Width", "e.g., 150px, 100%", "150px");
            b.text_style("height", "Height", "e.g., 40px, auto", "40px");
            let background = if nested.is_some() { "#3b82f6" } else { "#2563eb" };
            b.color_style("background-color", "Background Color", background);
            b.color_style("color", "Text Color", "#ffffff");
            if nested.is_some() {
                b.text_style("padding", "Padding", "e.g., 10px 20px", "");
                b.text_style("border-radius", "Border Radius", "e.g., 4px", "");
            }
        }
        // Columns never hold these kinds, so they only get a top-level panel.
        _ if nested.is_some() => {}
        ElementContent::Layout(layout) => {
            let options = (1..=4)
                .map(|n| {
                    let label = if n > 1 {
                        format!("{} Columns", n)
                    } else {
                        "1 Column".to_string()
                    };
                    SelectOption::new(n.to_string(), label)
                })
                .collect();
            b.push(
                "columns",
                "Number of Columns",
                Control::Select { options },
                layout.columns.to_string(),
            );
            b.text_style("gap", "Gap Between Columns", "e.g., 20px, 1rem", "20px");
            b.color_style("background-color", "Background Color", "#f9fafb");
        }
        ElementContent::Variable(_) => {}
        ElementContent::Conditional(cond) => {
            let options = catalog
                .all_variables()
                .iter()
                .map(|v| SelectOption::new(v.path.clone(), v.display_name.clone()))
                .collect();
            b.variable_select(
                "condition",
                "Condition Variable",
                "-- Select Variable --",
                options,
                &cond.condition,
            );
            b.checkbox("showElse", "Show else content", cond.show_else);
        }
        ElementContent::Loop(block) => {
            b.variable_select(
                "loopVariable",
                "Loop Variable (Array)",
                "-- Select Array Variable --",
                array_options(catalog),
                &block.loop_variable,
            );
            b.text(
                "itemVariable",
                "Item Variable Name",
                "e.g., expense, item",
                or_default(&block.item_variable, "item"),
            );
        }
        ElementContent::InvoiceHeader(header) => {
            b.text("title", "Invoice Title", "", or_default(&header.title, "Invoice"));
            b.checkbox("showUserInfo", "Show User Information", header.show_user_info);
        }
        ElementContent::InvoiceInfoTable(table) => {
            b.checkbox("showClientInfo", "Show Client Information", table.show_client_info);
            b.checkbox("showInvoiceDetails", "Show Invoice Details", table.show_invoice_details);
        }
        ElementContent::InvoiceItemsTable(table) => {
            b.variable_select(
                "loopVariable",
                "Loop Variable",
                "-- Select Array Variable --",
                array_options(catalog),
                &table.loop_variable,
            );
            for column in ItemColumn::ALL {
                b.push(
                    &format!("{}{}", COLUMN_TOGGLE_PREFIX, column.as_str()),
                    column.label(),
                    Control::ColumnToggle(column),
                    table.shows(column).to_string(),
                );
            }
        }
        ElementContent::InvoiceTotals(totals) => {
            b.checkbox("showSubtotal", "Show Sub-Total", totals.show_subtotal);
            b.checkbox("showTotal", "Show Total", totals.show_total);
        }
        ElementContent::InvoicePaymentInfo(_) => {}
    }

    PanelSchema {
        title: kind.label().to_string(),
        nested,
        fields: b.fields,
    }
}

fn array_options(catalog: &VariableCatalog) -> Vec<SelectOption> {
    catalog
        .array_variables()
        .map(|v| SelectOption::new(v.path.clone(), v.display_name.clone()))
        .collect()
}

/// What an applied property change touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The layout must be resized to this many columns by the document.
    Resize(usize),
    Content,
    Style,
    /// The property does not apply to this element.
    Ignored,
}

fn parse_flag(value: &str) -> bool {
    matches!(value, "true" | "checked" | "on")
}

/// Writes one edited property into `element`.
pub fn apply(element: &mut Element, property: &str, value: &str) -> Applied {
    let applied = route(element, property, value);
    debug!(id = %element.id, property, ?applied, "property applied");
    applied
}

fn route(element: &mut Element, property: &str, value: &str) -> Applied {
    if let Some(name) = property.strip_prefix(COLUMN_TOGGLE_PREFIX) {
        let column = ItemColumn::ALL.into_iter().find(|c| c.as_str() == name);
        return match (&mut element.content, column) {
            (ElementContent::InvoiceItemsTable(table), Some(column)) => {
                table.toggle(column, parse_flag(value));
                Applied::Content
            }
            _ => Applied::Ignored,
        };
    }

    let content = &mut element.content;
    match property {
        "columns" => match (content, value.trim().parse::<usize>()) {
            (ElementContent::Layout(_), Ok(columns)) if columns > 0 => Applied::Resize(columns),
            _ => Applied::Ignored,
        },
        "src" | "alt" => match content {
            ElementContent::Image(image) => {
                let slot = if property == "src" {
                    &mut image.src
                } else {
                    &mut image.alt
                };
                *slot = value.to_string();
                Applied::Content
            }
            _ => Applied::Ignored,
        },
        "button-text" | "button-link" => match content {
            ElementContent::Button(button) => {
                let slot = if property == "button-text" {
                    &mut button.text
                } else {
                    &mut button.link
                };
                *slot = value.to_string();
                Applied::Content
            }
            _ => Applied::Ignored,
        },
        "condition" | "loopVariable" | "itemVariable" | "title" => {
            let slot = match (property, content) {
                ("condition", ElementContent::Conditional(cond)) => &mut cond.condition,
                ("loopVariable", ElementContent::Loop(block)) => &mut block.loop_variable,
                ("loopVariable", ElementContent::InvoiceItemsTable(table)) => {
                    &mut table.loop_variable
                }
                ("itemVariable", ElementContent::Loop(block)) => &mut block.item_variable,
                ("title", ElementContent::InvoiceHeader(header)) => &mut header.title,
                _ => return Applied::Ignored,
            };
            *slot = value.to_string();
            Applied::Content
        }
        "showElse" | "showUserInfo" | "showClientInfo" | "showInvoiceDetails" | "showSubtotal"
        | "showTotal" => {
            let slot = match (property, content) {
                ("showElse", ElementContent::Conditional(cond)) => &mut cond.show_else,
                ("showUserInfo", ElementContent::InvoiceHeader(header)) => {
                    &mut header.show_user_info
                }
                ("showClientInfo", ElementContent::InvoiceInfoTable(table)) => {
                    &mut table.show_client_info
                }
                ("showInvoiceDetails", ElementContent::InvoiceInfoTable(table)) => {
                    &mut table.show_invoice_details
                }
                ("showSubtotal", ElementContent::InvoiceTotals(totals)) => {
                    &mut totals.show_subtotal
                }
                ("showTotal", ElementContent::InvoiceTotals(totals)) => &mut totals.show_total,
                _ => return Applied::Ignored,
            };
            *slot = parse_flag(value);
            Applied::Content
        }
        "" => Applied::Ignored,
        _ => {
            element.styles.set(property, value);
            Applied::Style
        }
    }
}
