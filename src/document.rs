use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::codegen::Generator;
use crate::element::{
    Element, ElementContent, ElementId, ElementType, InvoiceHeader, InvoiceInfoTable,
    InvoiceItemsTable, InvoicePaymentInfo, InvoiceTotals, ItemColumn, LayoutContent,
    DEFAULT_ITEMS_LOOP,
};
use crate::error::{BuilderError, BuilderResult};
use crate::render::StructuralKey;
use crate::styles::StyleMap;
use crate::variables::VariableCatalog;

/// Wire shape of a saved page: the element tree plus its publish output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "crate::element::lenient_elements")]
    pub content: Vec<Element>,
    #[serde(default)]
    pub html: String,
}

/// The ordered element tree being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    title: String,
    elements: Vec<Element>,
    next_id: u64,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id_seed(title, 1)
    }

    /// Empty document whose ids start at `seed`. The shell seeds with the clock.
    pub fn with_id_seed(title: impl Into<String>, seed: u64) -> Self {
        Self {
            title: title.into(),
            elements: Vec::new(),
            next_id: seed.max(1),
        }
    }

    /// Hydrates a tree. New ids never collide with ids already present.
    pub fn from_elements(title: impl Into<String>, elements: Vec<Element>, seed: u64) -> Self {
        let next_id = max_id(&elements).map_or(seed, |max| seed.max(max + 1));
        info!(count = elements.len(), "document loaded");
        Self {
            title: title.into(),
            elements,
            next_id: next_id.max(1),
        }
    }

    pub fn from_persisted(persisted: PersistedDocument, seed: u64) -> Self {
        Self::from_elements(persisted.title, persisted.content, seed)
    }

    pub fn from_json(source: &str, seed: u64) -> BuilderResult<Self> {
        let persisted: PersistedDocument = serde_json::from_str(source)?;
        Ok(Self::from_persisted(persisted, seed))
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn next_id(&mut self) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        id
    }

    /// New element of `kind` with fresh default content and styles.
    pub fn create_element(&mut self, kind: ElementType) -> Element {
        let id = self.next_id();
        Element::new(id, kind)
    }

    /// Inserts at `index`, appending when the index is past the end.
    /// Returns the index the element landed at.
    pub fn insert(&mut self, index: usize, element: Element) -> usize {
        let index = index.min(self.elements.len());
        debug!(id = %element.id, kind = %element.kind(), index, "insert element");
        self.elements.insert(index, element);
        index
    }

    pub fn push(&mut self, element: Element) -> usize {
        self.insert(self.elements.len(), element)
    }

    /// Removes the element at `index`. Out-of-range indices are ignored.
    pub fn remove(&mut self, index: usize) -> Option<Element> {
        if index >= self.elements.len() {
            return None;
        }
        let removed = self.elements.remove(index);
        debug!(id = %removed.id, index, "remove element");
        Some(removed)
    }

    pub fn get(&self, key: StructuralKey) -> Option<&Element> {
        match key {
            StructuralKey::TopLevel(index) => self.elements.get(index),
            StructuralKey::Nested {
                layout,
                column,
                element,
            } => self
                .elements
                .get(layout)?
                .as_layout()?
                .column_elements
                .get(column)?
                .get(element),
        }
    }

    pub fn get_mut(&mut self, key: StructuralKey) -> Option<&mut Element> {
        match key {
            StructuralKey::TopLevel(index) => self.elements.get_mut(index),
            StructuralKey::Nested {
                layout,
                column,
                element,
            } => self
                .elements
                .get_mut(layout)?
                .as_layout_mut()?
                .column_elements
                .get_mut(column)?
                .get_mut(element),
        }
    }

    /// Current structural key of the element with `id`.
    pub fn locate(&self, id: ElementId) -> Option<StructuralKey> {
        for (index, element) in self.elements.iter().enumerate() {
            if element.id == id {
                return Some(StructuralKey::TopLevel(index));
            }
            let Some(layout) = element.as_layout() else {
                continue;
            };
            for (column, bucket) in layout.column_elements.iter().enumerate() {
                if let Some(position) = bucket.iter().position(|e| e.id == id) {
                    return Some(StructuralKey::nested(index, column, position));
                }
            }
        }
        None
    }

    pub fn layout(&self, index: usize) -> Option<&LayoutContent> {
        self.elements.get(index)?.as_layout()
    }

    /// Resizes a layout's columns. Trailing buckets are dropped with their
    /// elements; new buckets start empty.
    pub fn set_column_count(&mut self, layout_index: usize, columns: usize) -> BuilderResult<()> {
        if columns == 0 {
            return Err(BuilderError::InvalidColumnCount(columns));
        }
        let Some(element) = self.elements.get_mut(layout_index) else {
            return Ok(());
        };
        let Some(layout) = element.as_layout_mut() else {
            return Err(BuilderError::NotALayout(layout_index));
        };
        layout.columns = columns;
        layout.column_elements.resize_with(columns, Vec::new);
        element
            .styles
            .set("grid-template-columns", format!("repeat({}, 1fr)", columns));
        debug!(layout_index, columns, "set column count");
        Ok(())
    }

    /// Appends a new element of `kind` to a layout column.
    ///
    /// Returns the new element's key, or `None` when the layout or column
    /// does not exist.
    pub fn add_to_column(
        &mut self,
        layout_index: usize,
        column: usize,
        kind: ElementType,
    ) -> BuilderResult<Option<StructuralKey>> {
        if kind == ElementType::Layout {
            return Err(BuilderError::NestedLayout);
        }
        match self.elements.get(layout_index) {
            None => return Ok(None),
            Some(element) if element.as_layout().is_none() => {
                return Err(BuilderError::NotALayout(layout_index))
            }
            Some(_) => {}
        }
        let new_element = self.create_element(kind);
        let Some(layout) = self
            .elements
            .get_mut(layout_index)
            .and_then(Element::as_layout_mut)
        else {
            return Ok(None);
        };
        layout.ensure_columns();
        let Some(bucket) = layout.column_elements.get_mut(column) else {
            return Ok(None);
        };
        debug!(id = %new_element.id, layout_index, column, "add element to column");
        bucket.push(new_element);
        Ok(Some(StructuralKey::nested(
            layout_index,
            column,
            bucket.len() - 1,
        )))
    }

    pub fn remove_from_column(
        &mut self,
        layout_index: usize,
        column: usize,
        element_index: usize,
    ) -> Option<Element> {
        let bucket = self
            .elements
            .get_mut(layout_index)?
            .as_layout_mut()?
            .column_elements
            .get_mut(column)?;
        if element_index >= bucket.len() {
            return None;
        }
        let removed = bucket.remove(element_index);
        debug!(id = %removed.id, layout_index, column, element_index, "remove nested element");
        Some(removed)
    }

    /// Replaces the whole tree, as done when loading a template.
    pub fn replace_all(&mut self, elements: Vec<Element>) {
        if let Some(max) = max_id(&elements) {
            self.next_id = self.next_id.max(max + 1);
        }
        self.elements = elements;
    }

    pub fn to_persisted(&self, catalog: &VariableCatalog) -> PersistedDocument {
        PersistedDocument {
            title: self.title.clone(),
            content: self.elements.clone(),
            html: Generator::new(catalog).publish(&self.elements),
        }
    }

    pub fn to_json(&self, catalog: &VariableCatalog) -> BuilderResult<String> {
        let json = serde_json::to_string(&self.to_persisted(catalog))?;
        info!(title = %self.title, count = self.elements.len(), "document saved");
        Ok(json)
    }

    /// The five-block invoice template.
    pub fn starter_invoice(seed: u64) -> Self {
        let mut document = Self::with_id_seed("Default Invoice Template", seed);
        let blocks = starter_blocks();
        for (content, styles) in blocks {
            let id = document.next_id();
            document.push(Element {
                id,
                content,
                styles,
            });
        }
        info!("starter invoice template loaded");
        document
    }
}

fn starter_blocks() -> Vec<(ElementContent, StyleMap)> {
    vec![
        (
            ElementContent::InvoiceHeader(InvoiceHeader {
                title: "Invoice".to_string(),
                show_user_info: true,
            }),
            StyleMap::from_iter([
                ("margin-bottom", "20px"),
                ("padding-bottom", "10px"),
                ("border-bottom", "3px solid #000"),
            ]),
        ),
        (
            ElementContent::InvoiceInfoTable(InvoiceInfoTable {
                show_client_info: true,
                show_invoice_details: true,
            }),
            StyleMap::from_iter([("margin-bottom", "20px")]),
        ),
        (
            ElementContent::InvoiceItemsTable(InvoiceItemsTable {
                columns: ItemColumn::ALL.to_vec(),
                loop_variable: DEFAULT_ITEMS_LOOP.to_string(),
            }),
            StyleMap::new(),
        ),
        (
            ElementContent::InvoiceTotals(InvoiceTotals {
                show_subtotal: true,
                show_total: true,
            }),
            StyleMap::new(),
        ),
        (
            ElementContent::InvoicePaymentInfo(InvoicePaymentInfo {
                wrapped_in_conditional: true,
            }),
            StyleMap::from_iter([("margin-top", "20px")]),
        ),
    ]
}

fn max_id(elements: &[Element]) -> Option<u64> {
    elements
        .iter()
        .map(|element| {
            let nested = match &element.content {
                ElementContent::Layout(layout) => layout
                    .column_elements
                    .iter()
                    .filter_map(|bucket| max_id(bucket))
                    .max(),
                ElementContent::Conditional(cond) => {
                    max_id(&cond.true_content).max(max_id(&cond.false_content))
                }
                ElementContent::Loop(block) => max_id(&block.content),
                _ => None,
            };
            nested.map_or(element.id.0, |n| n.max(element.id.0))
        })
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn document_with(kinds: &[ElementType]) -> Document {
        let mut document = Document::new("Test");
        for kind in kinds {
            let element = document.create_element(*kind);
            document.push(element);
        }
        document
    }

    #[test]
    fn test_insert_clamps_to_append() {
        let mut document = document_with(&[ElementType::Text]);
        let heading = document.create_element(ElementType::Heading);
        assert_eq!(document.insert(99, heading), 1);
        let image = document.create_element(ElementType::Image);
        assert_eq!(document.insert(0, image), 0);
        let kinds: Vec<ElementType> = document.elements().iter().map(Element::kind).collect();
        assert_eq!(
            kinds,
            vec![ElementType::Image, ElementType::Text, ElementType::Heading]
        );
    }

    #[test]
    fn test_remove_out_of_range_is_noop() {
        let mut document = document_with(&[ElementType::Text]);
        assert!(document.remove(3).is_none());
        assert!(document.remove(0).is_some());
        assert!(document.remove(0).is_none());
        assert!(document.is_empty());
    }

    #[test]
    fn test_set_column_count_updates_grid_style() {
        let mut document = document_with(&[ElementType::Layout]);
        document.set_column_count(0, 3).unwrap();
        let layout = document.layout(0).unwrap();
        assert_eq!(layout.columns, 3);
        assert_eq!(layout.column_elements.len(), 3);
        assert_eq!(
            document.elements()[0].styles.get("grid-template-columns"),
            Some("repeat(3, 1fr)")
        );
    }

    #[test]
    fn test_set_column_count_errors() {
        let mut document = document_with(&[ElementType::Text, ElementType::Layout]);
        assert_eq!(
            document.set_column_count(1, 0),
            Err(BuilderError::InvalidColumnCount(0))
        );
        assert_eq!(
            document.set_column_count(0, 2),
            Err(BuilderError::NotALayout(0))
        );
        assert_eq!(document.set_column_count(7, 2), Ok(()));
    }

    #[test]
    fn test_add_to_column_rejects_layouts() {
        let mut document = document_with(&[ElementType::Layout]);
        assert_eq!(
            document.add_to_column(0, 0, ElementType::Layout),
            Err(BuilderError::NestedLayout)
        );
        let key = document
            .add_to_column(0, 1, ElementType::Button)
            .unwrap()
            .unwrap();
        assert_eq!(key, StructuralKey::nested(0, 1, 0));
        assert_eq!(document.get(key).map(Element::kind), Some(ElementType::Button));
        assert_eq!(document.add_to_column(0, 5, ElementType::Text), Ok(None));
    }

    #[test]
    fn test_locate_follows_renumbering() {
        let mut document = document_with(&[ElementType::Text, ElementType::Layout]);
        let key = document
            .add_to_column(1, 0, ElementType::Heading)
            .unwrap()
            .unwrap();
        let id = document.get(key).unwrap().id;
        document.remove(0);
        assert_eq!(document.locate(id), Some(StructuralKey::nested(0, 0, 0)));
        document.remove_from_column(0, 0, 0);
        assert_eq!(document.locate(id), None);
    }

    #[test]
    fn test_hydrated_ids_do_not_collide() {
        let document = Document::from_json(
            &json!({
                "title": "Saved",
                "content": [
                    {"id": 10, "type": "text", "content": "a"},
                    {"id": 20, "type": "layout", "content": {
                        "columns": 1,
                        "columnElements": [[{"id": 55, "type": "text", "content": "b"}]]
                    }},
                    {"id": 30, "type": "unknown-widget", "content": {}}
                ],
                "html": ""
            })
            .to_string(),
            1,
        )
        .unwrap();
        assert_eq!(document.len(), 2);
        let mut document = document;
        assert_eq!(document.next_id(), ElementId(56));
    }

    #[test]
    fn test_starter_invoice_shape() {
        let document = Document::starter_invoice(100);
        let kinds: Vec<ElementType> = document.elements().iter().map(Element::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ElementType::InvoiceHeader,
                ElementType::InvoiceInfoTable,
                ElementType::InvoiceItemsTable,
                ElementType::InvoiceTotals,
                ElementType::InvoicePaymentInfo,
            ]
        );
        assert_eq!(document.elements()[0].id, ElementId(100));
        assert_eq!(
            document.elements()[0].styles.to_css(),
            "margin-bottom: 20px; padding-bottom: 10px; border-bottom: 3px solid #000"
        );
        assert!(document.elements()[2].styles.is_empty());
    }
}
