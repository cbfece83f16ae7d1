use std::collections::BTreeMap;

use crate::error::BuilderResult;
use crate::render::drop::Rect;
use crate::render::view::ElementView;
use crate::render::StructuralKey;

/// A minimal change to an already mounted node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch {
    ContainerStyle(String),
    BodyStyle(String),
    BodyMarkup(String),
    Attr(&'static str, String),
}

/// Area of the canvas whose bounds can be measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Element(StructuralKey),
    Layout(usize),
    Column { layout: usize, column: usize },
}

/// Rendering backend driven by the engine.
///
/// Nodes are addressed by structural key only. A mounted top-level view
/// brings its nested views with it.
pub trait Surface {
    /// Mounts `view`, replacing any node already at its key and placing it
    /// among its siblings by key order.
    fn mount(&mut self, view: &ElementView) -> BuilderResult<()>;

    /// Removes the node at `key` and anything nested in it.
    fn unmount(&mut self, key: StructuralKey);

    fn clear(&mut self);

    fn patch(&mut self, key: StructuralKey, patch: Patch) -> BuilderResult<()>;

    /// Current markup of an editable body, including uncommitted typing.
    fn editable_markup(&self, key: StructuralKey) -> Option<String>;

    fn bounds(&self, region: Region) -> Option<Rect>;

    fn set_selected(&mut self, key: Option<StructuralKey>);

    /// Places the caret `offset` characters into an editable body.
    fn set_caret(&mut self, key: StructuralKey, offset: usize);
}

/// One node held by [`MemorySurface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryNode {
    pub view: ElementView,
    /// Editable markup as last typed or rendered.
    pub markup: String,
}

/// In-memory surface that records what the engine asks of it.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    nodes: BTreeMap<StructuralKey, MemoryNode>,
    bounds: Vec<(Region, Rect)>,
    selected: Option<StructuralKey>,
    caret: Option<(StructuralKey, usize)>,
    mounts: Vec<StructuralKey>,
    patches: Vec<(StructuralKey, Patch)>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, key: StructuralKey) -> Option<&MemoryNode> {
        self.nodes.get(&key)
    }

    /// Keys of mounted nodes in document order.
    pub fn keys(&self) -> Vec<StructuralKey> {
        let mut keys: Vec<StructuralKey> = self.nodes.keys().copied().collect();
        keys.sort_by_key(|key| match *key {
            StructuralKey::TopLevel(index) => (index, 0, 0, 0),
            StructuralKey::Nested {
                layout,
                column,
                element,
            } => (layout, 1, column, element),
        });
        keys
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn selected(&self) -> Option<StructuralKey> {
        self.selected
    }

    pub fn caret(&self) -> Option<(StructuralKey, usize)> {
        self.caret
    }

    /// Keys passed to `mount`, in call order.
    pub fn mounts(&self) -> &[StructuralKey] {
        &self.mounts
    }

    pub fn patches(&self) -> &[(StructuralKey, Patch)] {
        &self.patches
    }

    pub fn reset_log(&mut self) {
        self.mounts.clear();
        self.patches.clear();
    }

    /// Simulates typing: replaces an editable node's live markup.
    pub fn type_into(&mut self, key: StructuralKey, markup: &str) -> bool {
        match self.nodes.get_mut(&key) {
            Some(node) if node.view.body.editable => {
                node.markup = markup.to_string();
                true
            }
            _ => false,
        }
    }

    pub fn set_bounds(&mut self, region: Region, rect: Rect) {
        self.bounds.retain(|(r, _)| *r != region);
        self.bounds.push((region, rect));
    }

    fn insert(&mut self, view: &ElementView) {
        let markup = view.body.inner_markup().unwrap_or_default().to_string();
        self.nodes.insert(
            view.key,
            MemoryNode {
                view: view.clone(),
                markup,
            },
        );
        for child in view.children() {
            self.insert(child);
        }
    }
}

impl Surface for MemorySurface {
    fn mount(&mut self, view: &ElementView) -> BuilderResult<()> {
        self.unmount(view.key);
        self.mounts.push(view.key);
        self.insert(view);
        Ok(())
    }

    fn unmount(&mut self, key: StructuralKey) {
        self.nodes.remove(&key);
        if let StructuralKey::TopLevel(index) = key {
            self.nodes
                .retain(|k, _| !(k.is_nested() && k.root() == index));
        }
        if self.selected == Some(key) {
            self.selected = None;
        }
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.selected = None;
        self.caret = None;
    }

    fn patch(&mut self, key: StructuralKey, patch: Patch) -> BuilderResult<()> {
        if let Some(node) = self.nodes.get_mut(&key) {
            match &patch {
                Patch::ContainerStyle(style) => node.view.container_style = style.clone(),
                Patch::BodyStyle(style) => node.view.body.style = style.clone(),
                Patch::BodyMarkup(markup) => node.markup = markup.clone(),
                Patch::Attr(name, value) => {
                    match node.view.body.attrs.iter_mut().find(|(n, _)| n == name) {
                        Some(slot) => slot.1 = value.clone(),
                        None => node.view.body.attrs.push((*name, value.clone())),
                    }
                }
            }
        }
        self.patches.push((key, patch));
        Ok(())
    }

    fn editable_markup(&self, key: StructuralKey) -> Option<String> {
        self.nodes
            .get(&key)
            .filter(|node| node.view.body.editable)
            .map(|node| node.markup.clone())
    }

    fn bounds(&self, region: Region) -> Option<Rect> {
        self.bounds
            .iter()
            .find(|(r, _)| *r == region)
            .map(|(_, rect)| *rect)
    }

    fn set_selected(&mut self, key: Option<StructuralKey>) {
        self.selected = key;
    }

    fn set_caret(&mut self, key: StructuralKey, offset: usize) {
        self.caret = Some((key, offset));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuilderConfig;
    use crate::element::{Element, ElementId, ElementType};
    use crate::variables::VariableCatalog;
    use pretty_assertions::assert_eq;

    fn layout_view() -> ElementView {
        let catalog = VariableCatalog::from_config(&BuilderConfig::embedded().unwrap().catalog);
        let mut layout = Element::new(ElementId(1), ElementType::Layout);
        layout.as_layout_mut().unwrap().column_elements[0]
            .push(Element::new(ElementId(2), ElementType::Text));
        ElementView::build(&layout, StructuralKey::TopLevel(0), &catalog)
    }

    #[test]
    fn test_mount_flattens_nested_views() {
        let mut surface = MemorySurface::new();
        surface.mount(&layout_view()).unwrap();
        assert_eq!(
            surface.keys(),
            vec![StructuralKey::TopLevel(0), StructuralKey::nested(0, 0, 0)]
        );
        assert_eq!(
            surface.editable_markup(StructuralKey::nested(0, 0, 0)),
            Some("Text content".to_string())
        );
        assert_eq!(surface.editable_markup(StructuralKey::TopLevel(0)), None);

        surface.unmount(StructuralKey::TopLevel(0));
        assert!(surface.is_empty());
    }

    #[test]
    fn test_typing_only_reaches_editables() {
        let mut surface = MemorySurface::new();
        surface.mount(&layout_view()).unwrap();
        assert!(surface.type_into(StructuralKey::nested(0, 0, 0), "typed"));
        assert!(!surface.type_into(StructuralKey::TopLevel(0), "typed"));
        assert_eq!(
            surface.editable_markup(StructuralKey::nested(0, 0, 0)),
            Some("typed".to_string())
        );
    }
}
