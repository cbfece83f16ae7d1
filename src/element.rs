use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

use crate::error::BuilderError;
use crate::styles::{defaults_for, StyleMap};
use crate::variables::stringify;

pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/400x200";
pub const DEFAULT_ITEMS_LOOP: &str = "invoice.other_expenses";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementType {
    Text,
    Heading,
    Image,
    Button,
    Layout,
    Variable,
    Conditional,
    Loop,
    InvoiceHeader,
    InvoiceInfoTable,
    InvoiceItemsTable,
    InvoiceTotals,
    InvoicePaymentInfo,
}

/// Palette section a component is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteGroup {
    Basic,
    Invoice,
    Advanced,
}

impl PaletteGroup {
    pub const ALL: [PaletteGroup; 3] = [PaletteGroup::Basic, PaletteGroup::Invoice, PaletteGroup::Advanced];

    pub fn title(self) -> &'static str {
        match self {
            PaletteGroup::Basic => "Basic",
            PaletteGroup::Invoice => "Invoice",
            PaletteGroup::Advanced => "Advanced",
        }
    }
}

impl ElementType {
    pub const ALL: [ElementType; 13] = [
        ElementType::Text,
        ElementType::Heading,
        ElementType::Image,
        ElementType::Button,
        ElementType::Layout,
        ElementType::Variable,
        ElementType::Conditional,
        ElementType::Loop,
        ElementType::InvoiceHeader,
        ElementType::InvoiceInfoTable,
        ElementType::InvoiceItemsTable,
        ElementType::InvoiceTotals,
        ElementType::InvoicePaymentInfo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ElementType::Text => "text",
            ElementType::Heading => "heading",
            ElementType::Image => "image",
            ElementType::Button => "button",
            ElementType::Layout => "layout",
            ElementType::Variable => "variable",
            ElementType::Conditional => "conditional",
            ElementType::Loop => "loop",
            ElementType::InvoiceHeader => "invoice-header",
            ElementType::InvoiceInfoTable => "invoice-info-table",
            ElementType::InvoiceItemsTable => "invoice-items-table",
            ElementType::InvoiceTotals => "invoice-totals",
            ElementType::InvoicePaymentInfo => "invoice-payment-info",
        }
    }

    /// Name shown in the palette and panel headers.
    pub fn label(self) -> &'static str {
        match self {
            ElementType::Text => "Text",
            ElementType::Heading => "Heading",
            ElementType::Image => "Image",
            ElementType::Button => "Button",
            ElementType::Layout => "Layout",
            ElementType::Variable => "Variable",
            ElementType::Conditional => "If/Else Block",
            ElementType::Loop => "Loop Block",
            ElementType::InvoiceHeader => "Invoice Header",
            ElementType::InvoiceInfoTable => "Invoice Info Table",
            ElementType::InvoiceItemsTable => "Invoice Items Table",
            ElementType::InvoiceTotals => "Invoice Totals",
            ElementType::InvoicePaymentInfo => "Payment Info",
        }
    }

    pub fn palette_group(self) -> PaletteGroup {
        match self {
            ElementType::Text
            | ElementType::Heading
            | ElementType::Image
            | ElementType::Button
            | ElementType::Layout => PaletteGroup::Basic,
            ElementType::Conditional | ElementType::Loop => PaletteGroup::Advanced,
            _ => PaletteGroup::Invoice,
        }
    }

    /// Text and heading bodies are edited in place on the canvas.
    pub fn is_inline_editable(self) -> bool {
        matches!(self, ElementType::Text | ElementType::Heading)
    }

    /// Palette search: matches the label or the type name, ignoring case.
    /// An empty query matches everything.
    pub fn matches_search(self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.label().to_lowercase().contains(&query)
            || self.as_str().contains(&query)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementType {
    type Err = BuilderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| BuilderError::UnknownElementType(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageContent {
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ButtonContent {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutContent {
    #[serde(default = "default_columns")]
    pub columns: usize,
    #[serde(default, deserialize_with = "lenient_columns")]
    pub column_elements: Vec<Vec<Element>>,
}

impl LayoutContent {
    pub fn with_columns(columns: usize) -> Self {
        Self {
            columns,
            column_elements: (0..columns).map(|_| Vec::new()).collect(),
        }
    }

    /// Pads or truncates the buckets so there is one per column.
    pub fn ensure_columns(&mut self) {
        self.columns = self.columns.max(1);
        self.column_elements.resize_with(self.columns, Vec::new);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableRef {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalContent {
    #[serde(default)]
    pub condition: String,
    #[serde(default, deserialize_with = "lenient_elements")]
    pub true_content: Vec<Element>,
    #[serde(default, deserialize_with = "lenient_elements")]
    pub false_content: Vec<Element>,
    #[serde(default)]
    pub show_else: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopContent {
    #[serde(default)]
    pub loop_variable: String,
    #[serde(default = "default_item_variable")]
    pub item_variable: String,
    #[serde(default, deserialize_with = "lenient_elements")]
    pub content: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceHeader {
    #[serde(default = "default_invoice_title")]
    pub title: String,
    #[serde(default)]
    pub show_user_info: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceInfoTable {
    #[serde(default)]
    pub show_client_info: bool,
    #[serde(default)]
    pub show_invoice_details: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemColumn {
    Description,
    Amount,
}

impl ItemColumn {
    pub const ALL: [ItemColumn; 2] = [ItemColumn::Description, ItemColumn::Amount];

    pub fn as_str(self) -> &'static str {
        match self {
            ItemColumn::Description => "description",
            ItemColumn::Amount => "amount",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ItemColumn::Description => "Description",
            ItemColumn::Amount => "Amount",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItemsTable {
    #[serde(default = "default_item_columns", deserialize_with = "lenient_item_columns")]
    pub columns: Vec<ItemColumn>,
    #[serde(default = "default_items_loop")]
    pub loop_variable: String,
}

impl InvoiceItemsTable {
    pub fn shows(&self, column: ItemColumn) -> bool {
        self.columns.contains(&column)
    }

    /// Adds or removes a column, keeping description before amount.
    pub fn toggle(&mut self, column: ItemColumn, visible: bool) {
        self.columns.retain(|c| *c != column);
        if visible {
            self.columns.push(column);
        }
        self.columns
            .sort_by_key(|c| ItemColumn::ALL.iter().position(|x| x == c));
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTotals {
    #[serde(default)]
    pub show_subtotal: bool,
    #[serde(default)]
    pub show_total: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePaymentInfo {
    #[serde(default)]
    pub wrapped_in_conditional: bool,
}

fn default_columns() -> usize {
    2
}

fn default_item_variable() -> String {
    "item".to_string()
}

fn default_invoice_title() -> String {
    "Invoice".to_string()
}

fn default_item_columns() -> Vec<ItemColumn> {
    ItemColumn::ALL.to_vec()
}

fn default_items_loop() -> String {
    DEFAULT_ITEMS_LOOP.to_string()
}

/// Variant payload of an element. Serializes as the bare payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ElementContent {
    Text(String),
    Heading(String),
    Image(ImageContent),
    Button(ButtonContent),
    Layout(LayoutContent),
    Variable(VariableRef),
    Conditional(ConditionalContent),
    Loop(LoopContent),
    InvoiceHeader(InvoiceHeader),
    InvoiceInfoTable(InvoiceInfoTable),
    InvoiceItemsTable(InvoiceItemsTable),
    InvoiceTotals(InvoiceTotals),
    InvoicePaymentInfo(InvoicePaymentInfo),
}

impl ElementContent {
    /// Fresh default payload. Every container is newly allocated.
    pub fn default_for(kind: ElementType) -> Self {
        match kind {
            ElementType::Text => ElementContent::Text("Text content".to_string()),
            ElementType::Heading => ElementContent::Heading("Heading".to_string()),
            ElementType::Image => ElementContent::Image(ImageContent {
                src: PLACEHOLDER_IMAGE.to_string(),
                alt: "Image".to_string(),
            }),
            ElementType::Button => ElementContent::Button(ButtonContent {
                text: "Button".to_string(),
                link: "#".to_string(),
            }),
            ElementType::Layout => ElementContent::Layout(LayoutContent::with_columns(2)),
            ElementType::Variable => ElementContent::Variable(VariableRef::default()),
            ElementType::Conditional => ElementContent::Conditional(ConditionalContent::default()),
            ElementType::Loop => ElementContent::Loop(LoopContent {
                loop_variable: String::new(),
                item_variable: default_item_variable(),
                content: Vec::new(),
            }),
            ElementType::InvoiceHeader => ElementContent::InvoiceHeader(InvoiceHeader {
                title: default_invoice_title(),
                show_user_info: true,
            }),
            ElementType::InvoiceInfoTable => ElementContent::InvoiceInfoTable(InvoiceInfoTable {
                show_client_info: true,
                show_invoice_details: true,
            }),
            ElementType::InvoiceItemsTable => ElementContent::InvoiceItemsTable(InvoiceItemsTable {
                columns: default_item_columns(),
                loop_variable: default_items_loop(),
            }),
            ElementType::InvoiceTotals => ElementContent::InvoiceTotals(InvoiceTotals {
                show_subtotal: true,
                show_total: true,
            }),
            ElementType::InvoicePaymentInfo => {
                ElementContent::InvoicePaymentInfo(InvoicePaymentInfo {
                    wrapped_in_conditional: true,
                })
            }
        }
    }

    pub fn kind(&self) -> ElementType {
        match self {
            ElementContent::Text(_) => ElementType::Text,
            ElementContent::Heading(_) => ElementType::Heading,
            ElementContent::Image(_) => ElementType::Image,
            ElementContent::Button(_) => ElementType::Button,
            ElementContent::Layout(_) => ElementType::Layout,
            ElementContent::Variable(_) => ElementType::Variable,
            ElementContent::Conditional(_) => ElementType::Conditional,
            ElementContent::Loop(_) => ElementType::Loop,
            ElementContent::InvoiceHeader(_) => ElementType::InvoiceHeader,
            ElementContent::InvoiceInfoTable(_) => ElementType::InvoiceInfoTable,
            ElementContent::InvoiceItemsTable(_) => ElementType::InvoiceItemsTable,
            ElementContent::InvoiceTotals(_) => ElementType::InvoiceTotals,
            ElementContent::InvoicePaymentInfo(_) => ElementType::InvoicePaymentInfo,
        }
    }

    fn from_value(kind: ElementType, value: Value) -> Result<Self, BuilderError> {
        let content = match kind {
            ElementType::Text => ElementContent::Text(stringify(&value)),
            ElementType::Heading => ElementContent::Heading(stringify(&value)),
            ElementType::Image => ElementContent::Image(payload(value)?),
            ElementType::Button => ElementContent::Button(payload(value)?),
            ElementType::Layout => {
                let mut layout: LayoutContent = payload(value)?;
                layout.ensure_columns();
                ElementContent::Layout(layout)
            }
            ElementType::Variable => ElementContent::Variable(payload(value)?),
            ElementType::Conditional => ElementContent::Conditional(payload(value)?),
            ElementType::Loop => ElementContent::Loop(payload(value)?),
            ElementType::InvoiceHeader => ElementContent::InvoiceHeader(payload(value)?),
            ElementType::InvoiceInfoTable => ElementContent::InvoiceInfoTable(payload(value)?),
            ElementType::InvoiceItemsTable => ElementContent::InvoiceItemsTable(payload(value)?),
            ElementType::InvoiceTotals => ElementContent::InvoiceTotals(payload(value)?),
            ElementType::InvoicePaymentInfo => {
                ElementContent::InvoicePaymentInfo(payload(value)?)
            }
        };
        Ok(content)
    }
}

/// Structured payloads treat a missing or null `content` as an empty object.
fn payload<T: for<'de> Deserialize<'de>>(value: Value) -> Result<T, BuilderError> {
    let value = match value {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    Ok(serde_json::from_value(value)?)
}

/// One document node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawElement")]
pub struct Element {
    pub id: ElementId,
    pub content: ElementContent,
    pub styles: StyleMap,
}

impl Element {
    /// Creates an element with the type's default content and styles.
    pub fn new(id: ElementId, kind: ElementType) -> Self {
        Self {
            id,
            content: ElementContent::default_for(kind),
            styles: defaults_for(kind),
        }
    }

    pub fn kind(&self) -> ElementType {
        self.content.kind()
    }

    /// Body text of text and heading elements.
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            ElementContent::Text(text) | ElementContent::Heading(text) => Some(text),
            _ => None,
        }
    }

    /// Replaces the body text. Returns false for other element types.
    pub fn set_text(&mut self, value: impl Into<String>) -> bool {
        match &mut self.content {
            ElementContent::Text(text) | ElementContent::Heading(text) => {
                *text = value.into();
                true
            }
            _ => false,
        }
    }

    pub fn as_layout(&self) -> Option<&LayoutContent> {
        match &self.content {
            ElementContent::Layout(layout) => Some(layout),
            _ => None,
        }
    }

    pub fn as_layout_mut(&mut self) -> Option<&mut LayoutContent> {
        match &mut self.content {
            ElementContent::Layout(layout) => Some(layout),
            _ => None,
        }
    }
}

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Element", 4)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("type", self.kind().as_str())?;
        state.serialize_field("content", &self.content)?;
        state.serialize_field("styles", &self.styles)?;
        state.end()
    }
}

#[derive(Deserialize)]
struct RawElement {
    id: ElementId,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Value,
    #[serde(default)]
    styles: Option<StyleMap>,
}

impl TryFrom<RawElement> for Element {
    type Error = BuilderError;

    fn try_from(raw: RawElement) -> Result<Self, Self::Error> {
        let kind: ElementType = raw.kind.parse()?;
        Ok(Element {
            id: raw.id,
            content: ElementContent::from_value(kind, raw.content)?,
            styles: raw.styles.unwrap_or_else(|| defaults_for(kind)),
        })
    }
}

/// Parses a list of elements, skipping entries that fail to parse.
pub fn parse_elements(values: Vec<Value>) -> Vec<Element> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Element>(value) {
            Ok(element) => Some(element),
            Err(err) => {
                warn!(error = %err, "dropping unreadable element");
                None
            }
        })
        .collect()
}

pub(crate) fn lenient_elements<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Element>, D::Error> {
    let values = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(parse_elements(values))
}

fn lenient_columns<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<Vec<Element>>, D::Error> {
    let buckets = Option::<Vec<Vec<Value>>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(buckets
        .into_iter()
        .map(|bucket| {
            parse_elements(bucket)
                .into_iter()
                .filter(|element| {
                    let nested_layout = element.kind() == ElementType::Layout;
                    if nested_layout {
                        warn!(id = %element.id, "discarding layout found inside a column");
                    }
                    !nested_layout
                })
                .collect()
        })
        .collect())
}

fn lenient_item_columns<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<ItemColumn>, D::Error> {
    let names = Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(ItemColumn::ALL
        .into_iter()
        .filter(|column| names.iter().any(|n| n == column.as_str()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_type_names_round_trip() {
        for kind in ElementType::ALL {
            assert_eq!(kind.as_str().parse::<ElementType>().unwrap(), kind);
        }
        assert_eq!(
            "carousel".parse::<ElementType>(),
            Err(BuilderError::UnknownElementType("carousel".to_string()))
        );
    }

    #[test]
    fn test_palette_search() {
        let hits: Vec<ElementType> = ElementType::ALL
            .into_iter()
            .filter(|kind| kind.matches_search("Invoice"))
            .collect();
        assert_eq!(hits.len(), 5);
        assert!(ElementType::Conditional.matches_search("else"));
        assert!(ElementType::InvoicePaymentInfo.matches_search("payment-info"));
        assert!(ElementType::Image.matches_search("  "));
        assert!(!ElementType::Image.matches_search("table"));
    }

    #[test]
    fn test_factories_return_fresh_containers() {
        let mut first = Element::new(ElementId(1), ElementType::Layout);
        let second = Element::new(ElementId(2), ElementType::Layout);
        if let Some(layout) = first.as_layout_mut() {
            layout.column_elements[0].push(Element::new(ElementId(3), ElementType::Text));
        }
        assert_eq!(second.as_layout().unwrap().column_elements, vec![vec![], vec![]]);
        assert_eq!(first.as_layout().unwrap().column_elements[0].len(), 1);
    }

    #[test]
    fn test_default_payloads() {
        let header = Element::new(ElementId(1), ElementType::InvoiceHeader);
        assert_eq!(
            serde_json::to_value(&header).unwrap()["content"],
            json!({"title": "Invoice", "showUserInfo": true})
        );
        let items = Element::new(ElementId(2), ElementType::InvoiceItemsTable);
        assert_eq!(
            serde_json::to_value(&items).unwrap()["content"],
            json!({"columns": ["description", "amount"], "loopVariable": "invoice.other_expenses"})
        );
        let text = Element::new(ElementId(3), ElementType::Text);
        assert_eq!(text.text(), Some("Text content"));
    }

    #[test]
    fn test_element_json_shape() {
        let element = Element::new(ElementId(42), ElementType::Loop);
        let value = serde_json::to_value(&element).unwrap();
        assert_eq!(value["id"], json!(42));
        assert_eq!(value["type"], json!("loop"));
        assert_eq!(
            value["content"],
            json!({"loopVariable": "", "itemVariable": "item", "content": []})
        );
        let back: Element = serde_json::from_value(value).unwrap();
        assert_eq!(back, element);
    }

    #[test]
    fn test_missing_fields_follow_server_defaults() {
        let element: Element = serde_json::from_value(json!({
            "id": 7,
            "type": "invoice-header",
            "content": {}
        }))
        .unwrap();
        match element.content {
            ElementContent::InvoiceHeader(header) => {
                assert_eq!(header.title, "Invoice");
                assert!(!header.show_user_info);
            }
            other => panic!("unexpected content {:?}", other),
        }
        assert_eq!(element.styles, defaults_for(ElementType::InvoiceHeader));
    }

    #[test]
    fn test_legacy_layout_gets_column_buckets() {
        let element: Element = serde_json::from_value(json!({
            "id": 1,
            "type": "layout",
            "content": {"columns": 3}
        }))
        .unwrap();
        assert_eq!(element.as_layout().unwrap().column_elements.len(), 3);
    }

    #[test]
    fn test_nested_layouts_and_unknown_types_are_dropped() {
        let element: Element = serde_json::from_value(json!({
            "id": 1,
            "type": "layout",
            "content": {
                "columns": 1,
                "columnElements": [[
                    {"id": 2, "type": "layout", "content": {}},
                    {"id": 3, "type": "marquee", "content": ""},
                    {"id": 4, "type": "text", "content": "kept"}
                ]]
            }
        }))
        .unwrap();
        let bucket = &element.as_layout().unwrap().column_elements[0];
        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket[0].text(), Some("kept"));
    }

    #[test]
    fn test_item_column_toggle_keeps_order() {
        let mut table = InvoiceItemsTable {
            columns: vec![ItemColumn::Amount],
            loop_variable: DEFAULT_ITEMS_LOOP.to_string(),
        };
        table.toggle(ItemColumn::Description, true);
        assert_eq!(table.columns, vec![ItemColumn::Description, ItemColumn::Amount]);
        table.toggle(ItemColumn::Amount, false);
        assert_eq!(table.columns, vec![ItemColumn::Description]);
        assert!(!table.shows(ItemColumn::Amount));
    }
}
