use tracing::{debug, warn};

use crate::codegen::{preview_page, publish_page, Generator};
use crate::config::EditorOptions;
use crate::document::Document;
use crate::element::{ElementContent, ElementId, ElementType};
use crate::error::BuilderResult;
use crate::properties::{self, Applied, PanelSchema};
use crate::render::autocomplete::{accept, AutocompleteKey, AutocompleteState, KeyOutcome};
use crate::render::debounce::PendingEdits;
use crate::render::drop::{route_drop, DropGeometry, DropTarget, GestureGuard, GestureId};
use crate::render::editable::{normalize_editable_markup, text_to_markup};
use crate::render::surface::{Patch, Region, Surface};
use crate::render::view::{BodyContent, ElementView};
use crate::render::StructuralKey;
use crate::upload::{UploadResponse, UploadTicket};
use crate::variables::VariableCatalog;

/// Which editables to commit before a structural change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlushScope {
    All,
    Layout(usize),
}

/// Owns one editing session: the document, its rendered surface and the
/// transient UI state around them.
pub struct RenderEngine<S: Surface> {
    document: Document,
    catalog: VariableCatalog,
    options: EditorOptions,
    surface: S,
    selected: Option<ElementId>,
    guard: GestureGuard,
    pending: PendingEdits,
    autocomplete: AutocompleteState,
    autocomplete_target: Option<ElementId>,
}

impl<S: Surface> RenderEngine<S> {
    pub fn new(document: Document, catalog: VariableCatalog, options: EditorOptions, surface: S) -> Self {
        let pending = PendingEdits::new(options.debounce_ms);
        Self {
            document,
            catalog,
            options,
            surface,
            selected: None,
            guard: GestureGuard::default(),
            pending,
            autocomplete: AutocompleteState::default(),
            autocomplete_target: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn catalog(&self) -> &VariableCatalog {
        &self.catalog
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    pub fn selected_key(&self) -> Option<StructuralKey> {
        self.document.locate(self.selected?)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.document.set_title(title);
    }

    pub fn autocomplete(&self) -> &AutocompleteState {
        &self.autocomplete
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.next_deadline()
    }

    /// Mounts every element of a freshly loaded document.
    pub fn mount(&mut self) -> BuilderResult<()> {
        self.surface.clear();
        self.mount_all()
    }

    fn mount_all(&mut self) -> BuilderResult<()> {
        for index in 0..self.document.len() {
            self.render_element(StructuralKey::TopLevel(index))?;
        }
        self.sync_selection();
        Ok(())
    }

    fn view(&self, key: StructuralKey) -> Option<ElementView> {
        let element = self.document.get(key)?;
        Some(ElementView::build(element, key, &self.catalog))
    }

    /// Rebuilds the node at `key` from the model, replacing the old node.
    pub fn render_element(&mut self, key: StructuralKey) -> BuilderResult<()> {
        let Some(view) = self.view(key) else {
            return Ok(());
        };
        self.surface.mount(&view)?;
        if self.selected == Some(view.id) {
            self.surface.set_selected(Some(key));
        }
        Ok(())
    }

    /// Applies style and content deltas to the existing node. Buttons size
    /// their container from their own styles, so they are rebuilt instead.
    pub fn update_element_in_dom(&mut self, key: StructuralKey) -> BuilderResult<()> {
        let Some(view) = self.view(key) else {
            return Ok(());
        };
        if view.kind == ElementType::Button {
            return self.render_element(key);
        }
        self.surface
            .patch(key, Patch::ContainerStyle(view.container_style.clone()))?;
        self.surface
            .patch(key, Patch::BodyStyle(view.body.style.clone()))?;
        match (&view.kind, &view.body.content) {
            (ElementType::Image, _) => {
                for (name, value) in &view.body.attrs {
                    self.surface.patch(key, Patch::Attr(*name, value.clone()))?;
                }
            }
            (_, BodyContent::Markup(markup)) => {
                self.surface.patch(key, Patch::BodyMarkup(markup.clone()))?;
            }
            (_, BodyContent::Columns(_)) => {}
        }
        Ok(())
    }

    /// Commits in-progress edits, then tears down and rebuilds every node.
    pub fn re_render_all(&mut self) -> BuilderResult<()> {
        self.flush_editables(FlushScope::All);
        self.rebuild_all()
    }

    /// Rebuilds every node without reading the surface. Callers that have
    /// already shifted indices in the model must use this, since the old
    /// nodes are still keyed by the previous positions.
    fn rebuild_all(&mut self) -> BuilderResult<()> {
        self.surface.clear();
        self.mount_all()
    }

    fn re_render_layout(&mut self, layout: usize) -> BuilderResult<()> {
        self.render_element(StructuralKey::TopLevel(layout))?;
        self.sync_selection();
        Ok(())
    }

    fn sync_selection(&mut self) {
        if self.selected.is_some() && self.selected_key().is_none() {
            self.selected = None;
        }
        let key = self.selected_key();
        self.surface.set_selected(key);
    }

    /// Writes live editable markup back into the model.
    fn flush_editables(&mut self, scope: FlushScope) -> usize {
        let keys = self.editable_keys(scope);
        keys.into_iter()
            .filter(|key| self.commit_editable(*key))
            .count()
    }

    fn editable_keys(&self, scope: FlushScope) -> Vec<StructuralKey> {
        let mut keys = Vec::new();
        for (index, element) in self.document.elements().iter().enumerate() {
            if let FlushScope::Layout(layout) = scope {
                if layout != index {
                    continue;
                }
            }
            if element.kind().is_inline_editable() {
                keys.push(StructuralKey::TopLevel(index));
            }
            let Some(layout) = element.as_layout() else {
                continue;
            };
            for (column, bucket) in layout.column_elements.iter().enumerate() {
                for (position, nested) in bucket.iter().enumerate() {
                    if nested.kind().is_inline_editable() {
                        keys.push(StructuralKey::nested(index, column, position));
                    }
                }
            }
        }
        keys
    }

    /// Normalizes the editable at `key` into its element's text, as on
    /// focus loss. Returns whether the model changed.
    pub fn commit_editable(&mut self, key: StructuralKey) -> bool {
        let Some(markup) = self.surface.editable_markup(key) else {
            return false;
        };
        let Some(element) = self.document.get_mut(key) else {
            return false;
        };
        let Some(current) = element.text() else {
            return false;
        };
        if markup == text_to_markup(current) {
            return false;
        }
        let text = normalize_editable_markup(&markup);
        if text == current {
            return false;
        }
        debug!(id = %element.id, %key, "commit editable");
        element.set_text(text)
    }

    pub fn select(&mut self, id: Option<ElementId>) {
        self.selected = id.filter(|id| self.document.locate(*id).is_some());
        self.autocomplete.close();
        let key = self.selected_key();
        self.surface.set_selected(key);
    }

    pub fn property_panel(&self) -> Option<PanelSchema> {
        let key = self.selected_key()?;
        let element = self.document.get(key)?;
        Some(properties::panel_for(
            element,
            key,
            &self.catalog,
            self.options.hint_limit,
        ))
    }

    /// Inserts a new element at the top level and selects it. `None`
    /// appends.
    pub fn add_element(&mut self, kind: ElementType, index: Option<usize>) -> BuilderResult<ElementId> {
        self.flush_editables(FlushScope::All);
        let element = self.document.create_element(kind);
        let id = element.id;
        match index {
            Some(index) if index < self.document.len() => {
                self.document.insert(index, element);
                self.selected = Some(id);
                self.rebuild_all()?;
            }
            _ => {
                let index = self.document.push(element);
                self.selected = Some(id);
                self.render_element(StructuralKey::TopLevel(index))?;
                self.sync_selection();
            }
        }
        Ok(id)
    }

    /// Deletes an element wherever it lives. Unknown ids are ignored.
    pub fn delete_element(&mut self, id: ElementId) -> BuilderResult<bool> {
        match self.document.locate(id) {
            Some(StructuralKey::TopLevel(index)) => {
                self.flush_editables(FlushScope::All);
                if self.document.remove(index).is_none() {
                    return Ok(false);
                }
                self.forget(id);
                self.rebuild_all()?;
                Ok(true)
            }
            Some(StructuralKey::Nested {
                layout,
                column,
                element,
            }) => self.delete_nested(layout, column, element),
            None => Ok(false),
        }
    }

    fn forget(&mut self, id: ElementId) {
        if self.selected == Some(id) {
            self.selected = None;
        }
        if self.autocomplete_target == Some(id) {
            self.autocomplete.close();
            self.autocomplete_target = None;
        }
    }

    pub fn add_to_column(
        &mut self,
        layout: usize,
        column: usize,
        kind: ElementType,
    ) -> BuilderResult<Option<ElementId>> {
        self.flush_editables(FlushScope::Layout(layout));
        let Some(key) = self.document.add_to_column(layout, column, kind)? else {
            return Ok(None);
        };
        let id = self.document.get(key).map(|e| e.id);
        self.re_render_layout(layout)?;
        Ok(id)
    }

    pub fn delete_nested(&mut self, layout: usize, column: usize, element: usize) -> BuilderResult<bool> {
        self.flush_editables(FlushScope::Layout(layout));
        let Some(removed) = self.document.remove_from_column(layout, column, element) else {
            return Ok(false);
        };
        self.forget(removed.id);
        self.re_render_layout(layout)?;
        Ok(true)
    }

    pub fn set_column_count(&mut self, layout: usize, columns: usize) -> BuilderResult<()> {
        self.flush_editables(FlushScope::Layout(layout));
        self.document.set_column_count(layout, columns)?;
        self.re_render_layout(layout)
    }

    fn measure(&self) -> DropGeometry {
        let mut geometry = DropGeometry::default();
        for (index, element) in self.document.elements().iter().enumerate() {
            let rect = self
                .surface
                .bounds(Region::Element(StructuralKey::TopLevel(index)))
                .unwrap_or_default();
            geometry.elements.push(rect);
            let Some(layout) = element.as_layout() else {
                continue;
            };
            let layout_rect = self.surface.bounds(Region::Layout(index)).unwrap_or(rect);
            geometry.layouts.push((index, layout_rect));
            for column in 0..layout.columns {
                if let Some(col_rect) = self.surface.bounds(Region::Column {
                    layout: index,
                    column,
                }) {
                    geometry.columns.push((index, column, col_rect));
                }
            }
        }
        geometry
    }

    /// Handles one physical drop of a palette item at viewport point
    /// (`x`, `y`). Repeated deliveries of the same gesture are ignored.
    pub fn handle_drop(
        &mut self,
        gesture: GestureId,
        x: f64,
        y: f64,
        kind: ElementType,
    ) -> BuilderResult<Option<ElementId>> {
        if !self.guard.begin(gesture) {
            return Ok(None);
        }
        let result = self.route(x, y, kind);
        self.guard.finish();
        result
    }

    fn route(&mut self, x: f64, y: f64, kind: ElementType) -> BuilderResult<Option<ElementId>> {
        match route_drop(x, y, &self.measure()) {
            DropTarget::Column { layout, column } => self.add_to_column(layout, column, kind),
            DropTarget::TopLevel(index) => self.add_element(kind, Some(index)).map(Some),
            DropTarget::Ignore => {
                debug!(x, y, "drop inside layout chrome ignored");
                Ok(None)
            }
        }
    }

    /// Applies a property change right away.
    pub fn apply_property(&mut self, id: ElementId, property: &str, value: &str) -> BuilderResult<()> {
        let Some(key) = self.document.locate(id) else {
            debug!(%id, property, "property change for missing element");
            return Ok(());
        };
        let Some(element) = self.document.get_mut(key) else {
            return Ok(());
        };
        match properties::apply(element, property, value) {
            Applied::Resize(columns) => self.set_column_count(key.root(), columns),
            Applied::Content | Applied::Style => self.update_element_in_dom(key),
            Applied::Ignored => Ok(()),
        }
    }

    /// Queues a debounced property change.
    pub fn queue_property(&mut self, id: ElementId, property: &str, value: String, now_ms: u64) {
        self.pending.schedule(id, property, value, now_ms);
    }

    /// Applies queued changes whose quiet period has passed.
    pub fn poll_pending(&mut self, now_ms: u64) -> BuilderResult<usize> {
        let due = self.pending.due(now_ms);
        let count = due.len();
        for edit in due {
            self.apply_property(edit.id, &edit.property, &edit.value)?;
        }
        Ok(count)
    }

    /// Applies one queued change immediately, as on focus loss.
    pub fn flush_pending(&mut self, id: ElementId, property: &str) -> BuilderResult<bool> {
        match self.pending.take(id, property) {
            Some(edit) => {
                self.apply_property(edit.id, &edit.property, &edit.value)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn flush_all_pending(&mut self) -> BuilderResult<()> {
        for edit in self.pending.drain_all() {
            self.apply_property(edit.id, &edit.property, &edit.value)?;
        }
        Ok(())
    }

    /// Re-evaluates the suggestion list after typing in an editable.
    /// `caret` counts characters of the normalized text.
    pub fn autocomplete_input(&mut self, key: StructuralKey, caret: usize) -> &AutocompleteState {
        let id = self.document.get(key).map(|e| e.id);
        match (id, self.surface.editable_markup(key)) {
            (Some(id), Some(markup)) => {
                let text = normalize_editable_markup(&markup);
                self.autocomplete.update(
                    &text,
                    caret,
                    &self.catalog,
                    self.options.autocomplete_limit,
                );
                self.autocomplete_target = Some(id);
            }
            _ => {
                self.autocomplete.close();
                self.autocomplete_target = None;
            }
        }
        &self.autocomplete
    }

    /// Routes a key press to the open suggestion list.
    pub fn autocomplete_key(&mut self, key_name: &str, caret: usize) -> BuilderResult<KeyOutcome> {
        let Some(key) = AutocompleteKey::from_key_name(key_name) else {
            return Ok(KeyOutcome::Ignored);
        };
        let outcome = self.autocomplete.handle_key(key);
        if let KeyOutcome::Accepted(suggestion) = &outcome {
            self.accept_suggestion(&suggestion.path, caret)?;
        }
        Ok(outcome)
    }

    /// Replaces the partial `((` token before the caret with `((path))` and
    /// moves the caret after it.
    pub fn accept_suggestion(&mut self, path: &str, caret: usize) -> BuilderResult<bool> {
        self.autocomplete.close();
        let Some(id) = self.autocomplete_target.take() else {
            return Ok(false);
        };
        let Some(key) = self.document.locate(id) else {
            return Ok(false);
        };
        let Some(markup) = self.surface.editable_markup(key) else {
            return Ok(false);
        };
        let text = normalize_editable_markup(&markup);
        let Some(done) = accept(&text, caret, path) else {
            return Ok(false);
        };
        if let Some(element) = self.document.get_mut(key) {
            element.set_text(done.text.clone());
        }
        self.surface
            .patch(key, Patch::BodyMarkup(text_to_markup(&done.text)))?;
        self.surface.set_caret(key, done.caret);
        Ok(true)
    }

    /// Applies a catalog variable to the selected element. Text and headings
    /// get the token appended; variable elements take the path.
    pub fn insert_variable(&mut self, path: &str) -> BuilderResult<bool> {
        let Some(variable) = self.catalog.by_path(path).cloned() else {
            return Ok(false);
        };
        let Some(key) = self.selected_key() else {
            return Ok(false);
        };
        self.commit_editable(key);
        let Some(element) = self.document.get_mut(key) else {
            return Ok(false);
        };
        match &mut element.content {
            ElementContent::Text(text) | ElementContent::Heading(text) => {
                text.push_str(&format!(" (({}))", variable.path));
            }
            ElementContent::Variable(var) => {
                var.path = variable.path;
                var.display_name = variable.display_name;
            }
            _ => return Ok(false),
        }
        self.update_element_in_dom(key)?;
        Ok(true)
    }

    /// Starts an upload for an image element.
    pub fn begin_upload(&self, id: ElementId) -> Option<UploadTicket> {
        let key = self.document.locate(id)?;
        match self.document.get(key)?.kind() {
            ElementType::Image => Some(UploadTicket { id }),
            _ => None,
        }
    }

    /// Completes an upload. Failures leave the model untouched and are
    /// returned for the caller to report.
    pub fn finish_upload(
        &mut self,
        ticket: UploadTicket,
        response: BuilderResult<UploadResponse>,
    ) -> BuilderResult<bool> {
        let url = match response.and_then(UploadResponse::into_url) {
            Ok(url) => url,
            Err(err) => {
                warn!(id = %ticket.id, error = %err, "image upload failed");
                return Err(err);
            }
        };
        if self.document.locate(ticket.id).is_none() {
            warn!(id = %ticket.id, "upload finished for a removed element");
            return Ok(false);
        }
        self.apply_property(ticket.id, "src", &url)?;
        Ok(true)
    }

    /// Commits everything typed or queued so far.
    fn settle(&mut self) -> BuilderResult<()> {
        self.flush_editables(FlushScope::All);
        self.flush_all_pending()
    }

    /// Replaces the document with the starter invoice template.
    pub fn load_starter_invoice(&mut self) -> BuilderResult<()> {
        let seed = self.document.next_id().0;
        self.load(Document::starter_invoice(seed))
    }

    /// Swaps in another document. Nothing from the old surface is kept.
    pub fn load(&mut self, document: Document) -> BuilderResult<()> {
        self.pending.drain_all();
        self.autocomplete.close();
        self.autocomplete_target = None;
        self.selected = None;
        self.document = document;
        self.mount()
    }

    pub fn preview_html(&mut self) -> BuilderResult<String> {
        self.settle()?;
        Ok(preview_page(
            &Generator::new(&self.catalog).preview(self.document.elements()),
        ))
    }

    pub fn publish_html(&mut self) -> BuilderResult<String> {
        self.settle()?;
        Ok(publish_page(
            &Generator::new(&self.catalog).publish(self.document.elements()),
        ))
    }

    /// Persisted-document JSON for saving.
    pub fn persist(&mut self) -> BuilderResult<String> {
        self.settle()?;
        self.document.to_json(&self.catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuilderConfig;
    use crate::error::BuilderError;
    use crate::render::drop::Rect;
    use crate::render::surface::MemorySurface;
    use pretty_assertions::assert_eq;

    fn engine() -> RenderEngine<MemorySurface> {
        let config = BuilderConfig::embedded().unwrap();
        RenderEngine::new(
            Document::new("Test"),
            VariableCatalog::from_config(&config.catalog),
            config.editor,
            MemorySurface::new(),
        )
    }

    fn text_of(engine: &RenderEngine<MemorySurface>, key: StructuralKey) -> String {
        engine.document().get(key).and_then(|e| e.text()).unwrap().to_string()
    }

    #[test]
    fn test_add_element_renders_and_selects() {
        let mut engine = engine();
        let first = engine.add_element(ElementType::Text, None).unwrap();
        let second = engine.add_element(ElementType::Heading, Some(0)).unwrap();
        assert_eq!(engine.document().len(), 2);
        assert_eq!(engine.document().elements()[0].id, second);
        assert_eq!(engine.document().elements()[1].id, first);
        assert_eq!(engine.selected(), Some(second));
        assert_eq!(engine.surface().selected(), Some(StructuralKey::TopLevel(0)));
        assert_eq!(
            engine
                .surface()
                .node(StructuralKey::TopLevel(1))
                .map(|n| n.view.id),
            Some(first)
        );
    }

    #[test]
    fn test_structural_change_keeps_uncommitted_typing() {
        let mut engine = engine();
        engine.add_element(ElementType::Text, None).unwrap();
        engine
            .surface_mut()
            .type_into(StructuralKey::TopLevel(0), "typed<br>lines");
        engine.add_element(ElementType::Heading, Some(0)).unwrap();
        assert_eq!(text_of(&engine, StructuralKey::TopLevel(1)), "typed\nlines");
    }

    #[test]
    fn test_nested_typing_survives_column_changes() {
        let mut engine = engine();
        engine.add_element(ElementType::Layout, None).unwrap();
        engine.add_to_column(0, 1, ElementType::Text).unwrap();
        let nested = StructuralKey::nested(0, 1, 0);
        engine.surface_mut().type_into(nested, "kept");
        engine.add_to_column(0, 1, ElementType::Button).unwrap();
        assert_eq!(text_of(&engine, nested), "kept");
        assert!(engine
            .surface()
            .node(StructuralKey::nested(0, 1, 1))
            .is_some());
    }

    #[test]
    fn test_delete_clears_selection() {
        let mut engine = engine();
        let id = engine.add_element(ElementType::Image, None).unwrap();
        assert!(engine.delete_element(id).unwrap());
        assert_eq!(engine.selected(), None);
        assert!(engine.surface().is_empty());
        assert!(!engine.delete_element(id).unwrap());
    }

    #[test]
    fn test_button_update_rebuilds_container() {
        let mut engine = engine();
        let id = engine.add_element(ElementType::Button, None).unwrap();
        engine.surface_mut().reset_log();
        engine.apply_property(id, "width", "220px").unwrap();
        assert_eq!(engine.surface().mounts(), &[StructuralKey::TopLevel(0)]);
        let node = engine.surface().node(StructuralKey::TopLevel(0)).unwrap();
        assert!(node.view.container_style.starts_with("width: calc(220px + 24px)"));
    }

    #[test]
    fn test_style_update_patches_in_place() {
        let mut engine = engine();
        let id = engine.add_element(ElementType::Heading, None).unwrap();
        engine.surface_mut().reset_log();
        engine.apply_property(id, "color", "#ff0000").unwrap();
        assert!(engine.surface().mounts().is_empty());
        let node = engine.surface().node(StructuralKey::TopLevel(0)).unwrap();
        assert!(node.view.body.style.contains("color: #ff0000"));
    }

    #[test]
    fn test_debounced_edits_follow_the_element() {
        let mut engine = engine();
        let target = engine.add_element(ElementType::Text, None).unwrap();
        engine.queue_property(target, "margin", "7px".to_string(), 0);
        engine.add_element(ElementType::Heading, Some(0)).unwrap();
        assert_eq!(engine.poll_pending(100).unwrap(), 0);
        assert_eq!(engine.poll_pending(500).unwrap(), 1);
        let moved = engine.document().get(StructuralKey::TopLevel(1)).unwrap();
        assert_eq!(moved.id, target);
        assert_eq!(moved.styles.get("margin"), Some("7px"));
    }

    #[test]
    fn test_drop_into_column_only() {
        let mut engine = engine();
        engine.add_element(ElementType::Layout, None).unwrap();
        let surface = engine.surface_mut();
        surface.set_bounds(
            Region::Element(StructuralKey::TopLevel(0)),
            Rect::new(0.0, 0.0, 400.0, 200.0),
        );
        surface.set_bounds(Region::Layout(0), Rect::new(0.0, 0.0, 400.0, 200.0));
        surface.set_bounds(
            Region::Column {
                layout: 0,
                column: 0,
            },
            Rect::new(10.0, 20.0, 180.0, 170.0),
        );
        surface.set_bounds(
            Region::Column {
                layout: 0,
                column: 1,
            },
            Rect::new(210.0, 20.0, 180.0, 170.0),
        );

        let id = engine.handle_drop(1, 250.0, 50.0, ElementType::Text).unwrap();
        assert!(id.is_some());
        assert_eq!(engine.handle_drop(1, 250.0, 50.0, ElementType::Text).unwrap(), None);
        assert_eq!(engine.document().len(), 1);
        assert_eq!(engine.document().layout(0).unwrap().column_elements[1].len(), 1);

        assert_eq!(engine.handle_drop(2, 200.0, 5.0, ElementType::Text).unwrap(), None);
        assert_eq!(engine.document().len(), 1);

        engine.handle_drop(3, 200.0, 300.0, ElementType::Heading).unwrap();
        assert_eq!(engine.document().len(), 2);
        assert_eq!(engine.document().elements()[1].kind(), ElementType::Heading);
    }

    #[test]
    fn test_autocomplete_accept_rewrites_text() {
        let mut engine = engine();
        engine.add_element(ElementType::Text, None).unwrap();
        let key = StructuralKey::TopLevel(0);
        engine.surface_mut().type_into(key, "Total: ((inv");
        let state = engine.autocomplete_input(key, 12);
        assert!(state.is_open());
        assert_eq!(state.matches()[0].path, "invoice.invoice_no");
        engine.autocomplete_key("ArrowDown", 12).unwrap();
        let outcome = engine.autocomplete_key("Enter", 12).unwrap();
        assert!(matches!(outcome, KeyOutcome::Accepted(_)));
        assert_eq!(text_of(&engine, key), "Total: ((invoice.invoice_date))");
        assert_eq!(engine.surface().caret(), Some((key, 31)));
    }

    #[test]
    fn test_insert_variable() {
        let mut engine = engine();
        engine.add_element(ElementType::Heading, None).unwrap();
        assert!(engine.insert_variable("client.name").unwrap());
        assert_eq!(
            text_of(&engine, StructuralKey::TopLevel(0)),
            "Heading ((client.name))"
        );
        assert!(!engine.insert_variable("not.there").unwrap());

        engine.add_element(ElementType::Variable, None).unwrap();
        assert!(engine.insert_variable("invoice.total").unwrap());
        match &engine.document().elements()[1].content {
            ElementContent::Variable(var) => {
                assert_eq!(var.path, "invoice.total");
                assert_eq!(var.display_name, "Invoice Total");
            }
            other => panic!("unexpected {:?}", other),
        }

        engine.add_element(ElementType::Image, None).unwrap();
        assert!(!engine.insert_variable("invoice.total").unwrap());
    }

    #[test]
    fn test_upload_outcomes() {
        let mut engine = engine();
        let id = engine.add_element(ElementType::Image, None).unwrap();
        let ticket = engine.begin_upload(id).unwrap();

        let failed = engine.finish_upload(ticket, Err(BuilderError::Upload("too big".to_string())));
        assert!(failed.is_err());

        let ok = UploadResponse {
            success: true,
            url: "https://cdn.test/a.png".to_string(),
            ..Default::default()
        };
        assert!(engine.finish_upload(ticket, Ok(ok.clone())).unwrap());
        let node = engine.surface().node(StructuralKey::TopLevel(0)).unwrap();
        assert_eq!(node.view.body.attr("src"), Some("https://cdn.test/a.png"));

        engine.delete_element(id).unwrap();
        assert!(!engine.finish_upload(ticket, Ok(ok)).unwrap());
    }

    #[test]
    fn test_column_resize_through_property() {
        let mut engine = engine();
        let id = engine.add_element(ElementType::Layout, None).unwrap();
        engine.apply_property(id, "columns", "3").unwrap();
        let layout = engine.document().layout(0).unwrap();
        assert_eq!(layout.column_elements.len(), 3);
        assert_eq!(engine.selected(), Some(id));
    }

    #[test]
    fn test_starter_invoice_replaces_surface() {
        let mut engine = engine();
        engine.add_element(ElementType::Text, None).unwrap();
        engine
            .surface_mut()
            .type_into(StructuralKey::TopLevel(0), "stale");
        engine.load_starter_invoice().unwrap();
        assert_eq!(engine.document().len(), 5);
        assert_eq!(engine.selected(), None);
        assert_eq!(engine.surface().len(), 5);
        assert!(engine.persist().unwrap().contains("\"invoice-header\""));
    }
}
