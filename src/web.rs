//! Browser backend: a [`Surface`] over the live DOM, plus the fetch and
//! timer plumbing the editor shell needs.

use js_sys::Promise;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Element, FormData, Headers, HtmlInputElement, Node, Request, RequestInit, Response};

use crate::config::EditorOptions;
use crate::error::{BuilderError, BuilderResult};
use crate::render::{ElementView, Patch, Rect, Region, StructuralKey, Surface};
use crate::upload::{UploadResponse, UPLOAD_FIELD};

/// Id of the canvas node the surface renders into.
pub const CANVAS_ID: &str = "pb-canvas";

const SELECTED_CLASS: &str = "selected";
const TEXT_NODE: u16 = 3;

fn dom_err(value: JsValue) -> BuilderError {
    BuilderError::Dom(
        value
            .as_string()
            .unwrap_or_else(|| format!("{:?}", value)),
    )
}

fn window() -> BuilderResult<web_sys::Window> {
    web_sys::window().ok_or_else(|| BuilderError::Dom("no window".to_string()))
}

fn document() -> BuilderResult<web_sys::Document> {
    window()?
        .document()
        .ok_or_else(|| BuilderError::Dom("no document".to_string()))
}

/// Milliseconds since the epoch, for debounce bookkeeping.
pub fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

/// Resolves after `ms` milliseconds.
pub async fn sleep(ms: u64) {
    let promise = Promise::new(&mut |resolve, _| {
        if let Ok(window) = window() {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                &resolve,
                ms.min(i32::MAX as u64) as i32,
            );
        }
    });
    let _ = JsFuture::from(promise).await;
}

pub fn alert(message: &str) {
    if let Ok(window) = window() {
        let _ = window.alert_with_message(message);
    }
}

/// Parses the `data-pb-key` form of a structural key.
pub fn parse_key(raw: &str) -> Option<StructuralKey> {
    let parts: Vec<usize> = raw
        .split('-')
        .map(|part| part.parse().ok())
        .collect::<Option<_>>()?;
    match parts.as_slice() {
        [index] => Some(StructuralKey::TopLevel(*index)),
        [layout, column, element] => Some(StructuralKey::nested(*layout, *column, *element)),
        _ => None,
    }
}

/// What a point on the canvas refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasHit {
    Delete(StructuralKey),
    Element(StructuralKey),
    Empty,
}

/// Surface bound to the canvas element in the current document.
#[derive(Debug, Clone)]
pub struct WebSurface {
    root: Element,
}

impl WebSurface {
    /// Binds to the canvas node. The node must already be in the page.
    pub fn attach() -> BuilderResult<Self> {
        let root = document()?
            .get_element_by_id(CANVAS_ID)
            .ok_or_else(|| BuilderError::Dom(format!("#{} not found", CANVAS_ID)))?;
        Ok(Self { root })
    }

    fn find(&self, selector: &str) -> Option<Element> {
        self.root.query_selector(selector).ok().flatten()
    }

    fn node(&self, key: StructuralKey) -> Option<Element> {
        self.find(&format!(r#"[data-pb-key="{}"]"#, key))
    }

    fn body(&self, key: StructuralKey) -> Option<Element> {
        self.find(&format!(r#"[data-pb-body="{}"]"#, key))
    }

    fn column(&self, layout: usize, column: usize) -> Option<Element> {
        self.find(&format!(
            r#".layout-column[data-layout-index="{}"][data-column-index="{}"]"#,
            layout, column
        ))
    }

    fn column_content(&self, layout: usize, column: usize) -> Option<Element> {
        self.find(&format!(
            r#".column-content[data-layout-index="{}"][data-column-index="{}"]"#,
            layout, column
        ))
    }

    /// First mounted sibling that must come after `key`.
    fn successor(&self, parent: &Element, key: StructuralKey) -> Option<Element> {
        let siblings = parent.query_selector_all(":scope > [data-pb-key]").ok()?;
        (0..siblings.length())
            .filter_map(|i| siblings.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .find(|el| {
                el.get_attribute("data-pb-key")
                    .and_then(|raw| parse_key(&raw))
                    .is_some_and(|other| other.position() > key.position())
            })
    }

    /// Resolves a click target to the element or delete button under it.
    pub fn hit(&self, target: &Element) -> CanvasHit {
        if let Ok(Some(button)) = target.closest("[data-pb-delete]") {
            if let Some(key) = button
                .closest("[data-pb-key]")
                .ok()
                .flatten()
                .and_then(|node| node.get_attribute("data-pb-key"))
                .and_then(|raw| parse_key(&raw))
            {
                return CanvasHit::Delete(key);
            }
        }
        target
            .closest("[data-pb-key]")
            .ok()
            .flatten()
            .and_then(|node| node.get_attribute("data-pb-key"))
            .and_then(|raw| parse_key(&raw))
            .map_or(CanvasHit::Empty, CanvasHit::Element)
    }

    /// Element at a viewport point.
    pub fn hit_at(&self, x: f64, y: f64) -> CanvasHit {
        match document().ok().and_then(|doc| doc.element_from_point(x as f32, y as f32)) {
            Some(target) if self.root.contains(Some(target.as_ref())) => self.hit(&target),
            _ => CanvasHit::Empty,
        }
    }

    /// Editable body that currently has focus.
    pub fn focused_editable(&self) -> Option<StructuralKey> {
        let active = document().ok()?.active_element()?;
        if !self.root.contains(Some(active.as_ref())) {
            return None;
        }
        active
            .closest("[data-pb-body]")
            .ok()
            .flatten()
            .and_then(|body| body.get_attribute("data-pb-body"))
            .and_then(|raw| parse_key(&raw))
    }

    /// Caret position inside an editable body, in characters of the
    /// normalized text. Line breaks count once.
    pub fn caret_offset(&self, key: StructuralKey) -> Option<usize> {
        let body = self.body(key)?;
        let selection = window().ok()?.get_selection().ok()??;
        if selection.range_count() == 0 {
            return None;
        }
        let range = selection.get_range_at(0).ok()?;
        let container = range.end_container().ok()?;
        let offset = range.end_offset().ok()? as usize;

        let mut count = 0;
        let children = body.child_nodes();
        for i in 0..children.length() {
            let Some(child) = children.item(i) else {
                continue;
            };
            if container.is_same_node(Some(body.as_ref())) && i as usize == offset {
                return Some(count);
            }
            if container.is_same_node(Some(&child)) || child.contains(Some(&container)) {
                let text = container.text_content().unwrap_or_default();
                return Some(count + utf16_to_chars(&text, offset));
            }
            count += node_len(&child);
        }
        Some(count)
    }
}

fn node_len(node: &Node) -> usize {
    match node.node_type() {
        TEXT_NODE => node.text_content().unwrap_or_default().chars().count(),
        _ if node.node_name().eq_ignore_ascii_case("br") => 1,
        _ => node.text_content().unwrap_or_default().chars().count() + 1,
    }
}

fn utf16_to_chars(text: &str, units: usize) -> usize {
    let mut seen = 0;
    text.chars()
        .take_while(|c| {
            seen += c.len_utf16();
            seen <= units
        })
        .count()
}

fn chars_to_utf16(text: &str, chars: usize) -> u32 {
    text.chars().take(chars).map(char::len_utf16).sum::<usize>() as u32
}

fn set_style(el: &Element, style: &str) -> BuilderResult<()> {
    if style.is_empty() {
        el.remove_attribute("style").map_err(dom_err)
    } else {
        el.set_attribute("style", style).map_err(dom_err)
    }
}

impl Surface for WebSurface {
    fn mount(&mut self, view: &ElementView) -> BuilderResult<()> {
        let html = view.to_html();
        if let Some(existing) = self.node(view.key) {
            existing.set_outer_html(&html);
            return Ok(());
        }
        let parent = match view.key.parent() {
            None => self.root.clone(),
            Some((layout, column)) => self.column_content(layout, column).ok_or_else(|| {
                BuilderError::Dom(format!("column {}-{} not mounted", layout, column))
            })?,
        };
        let inserted = match self.successor(&parent, view.key) {
            Some(next) => next.insert_adjacent_html("beforebegin", &html),
            None => parent.insert_adjacent_html("beforeend", &html),
        };
        inserted.map_err(dom_err)
    }

    fn unmount(&mut self, key: StructuralKey) {
        if let Some(node) = self.node(key) {
            node.remove();
        }
    }

    fn clear(&mut self) {
        self.root.set_inner_html("");
    }

    fn patch(&mut self, key: StructuralKey, patch: Patch) -> BuilderResult<()> {
        let target = match patch {
            Patch::ContainerStyle(_) => self.node(key),
            _ => self.body(key),
        };
        let Some(el) = target else {
            return Ok(());
        };
        match patch {
            Patch::ContainerStyle(style) | Patch::BodyStyle(style) => set_style(&el, &style),
            Patch::BodyMarkup(markup) => {
                el.set_inner_html(&markup);
                Ok(())
            }
            Patch::Attr(name, value) => el.set_attribute(name, &value).map_err(dom_err),
        }
    }

    fn editable_markup(&self, key: StructuralKey) -> Option<String> {
        self.body(key)
            .filter(|body| body.has_attribute("contenteditable"))
            .map(|body| body.inner_html())
    }

    fn bounds(&self, region: Region) -> Option<Rect> {
        let el = match region {
            Region::Element(key) => self.node(key),
            Region::Layout(index) => self.body(StructuralKey::TopLevel(index)),
            Region::Column { layout, column } => self.column(layout, column),
        }?;
        let rect = el.get_bounding_client_rect();
        Some(Rect::new(rect.left(), rect.top(), rect.width(), rect.height()))
    }

    fn set_selected(&mut self, key: Option<StructuralKey>) {
        if let Ok(previous) = self.root.query_selector_all(&format!(".{}", SELECTED_CLASS)) {
            for i in 0..previous.length() {
                if let Some(el) = previous.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                    let _ = el.class_list().remove_1(SELECTED_CLASS);
                }
            }
        }
        if let Some(el) = key.and_then(|key| self.node(key)) {
            let _ = el.class_list().add_1(SELECTED_CLASS);
        }
    }

    fn set_caret(&mut self, key: StructuralKey, offset: usize) {
        let Some(body) = self.body(key) else {
            return;
        };
        let Ok(doc) = document() else {
            return;
        };
        let Ok(range) = doc.create_range() else {
            return;
        };

        let mut remaining = offset;
        let children = body.child_nodes();
        let mut placed = false;
        for i in 0..children.length() {
            let Some(child) = children.item(i) else {
                continue;
            };
            let len = node_len(&child);
            if remaining <= len && child.node_type() == TEXT_NODE {
                let text = child.text_content().unwrap_or_default();
                placed = range
                    .set_start(&child, chars_to_utf16(&text, remaining))
                    .is_ok();
                break;
            }
            if remaining < len {
                placed = range.set_start_after(&child).is_ok();
                break;
            }
            remaining -= len;
        }
        if !placed && range.select_node_contents(&body).is_err() {
            return;
        }
        range.collapse_with_to_start(placed);

        if let Ok(Some(selection)) = window().and_then(|w| w.get_selection().map_err(dom_err)) {
            let _ = selection.remove_all_ranges();
            let _ = selection.add_range(&range);
        }
        if let Some(body) = body.dyn_ref::<web_sys::HtmlElement>() {
            let _ = body.focus();
        }
    }
}

/// The file picked in a file input, if any.
pub fn picked_file(input_id: &str) -> Option<web_sys::File> {
    document()
        .ok()?
        .get_element_by_id(input_id)?
        .dyn_into::<HtmlInputElement>()
        .ok()?
        .files()?
        .get(0)
}

/// Posts one image to the configured endpoint.
pub async fn upload_image(options: &EditorOptions, file: web_sys::File) -> BuilderResult<UploadResponse> {
    let form = FormData::new().map_err(dom_err)?;
    form.append_with_blob(UPLOAD_FIELD, &file).map_err(dom_err)?;

    let init = RequestInit::new();
    init.set_method("POST");
    init.set_body(&form);
    if let Some(token) = &options.csrf_token {
        let headers = Headers::new().map_err(dom_err)?;
        headers.set("X-CSRF-TOKEN", token).map_err(dom_err)?;
        headers.set("Accept", "application/json").map_err(dom_err)?;
        init.set_headers(&headers);
    }

    let request = Request::new_with_str_and_init(&options.upload_url, &init).map_err(dom_err)?;
    let response: Response = JsFuture::from(window()?.fetch_with_request(&request))
        .await
        .map_err(dom_err)?
        .dyn_into()
        .map_err(dom_err)?;
    let body = JsFuture::from(response.text().map_err(dom_err)?)
        .await
        .map_err(dom_err)?
        .as_string()
        .unwrap_or_default();
    UploadResponse::from_json(&body)
}
