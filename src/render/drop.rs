use tracing::debug;

/// Viewport rectangle as reported by the surface.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn mid_y(&self) -> f64 {
        self.top + self.height / 2.0
    }

    /// Edges count as inside.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right() && y >= self.top && y <= self.bottom()
    }
}

/// Measured layout of the canvas at drop time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DropGeometry {
    /// Top-level element boxes in document order.
    pub elements: Vec<Rect>,
    /// Layout boxes keyed by top-level index.
    pub layouts: Vec<(usize, Rect)>,
    /// Column drop zones as (layout index, column index, box).
    pub columns: Vec<(usize, usize, Rect)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    Column { layout: usize, column: usize },
    TopLevel(usize),
    /// Over a layout but outside its columns.
    Ignore,
}

/// Insertion index for a pointer at `y`: before the first sibling whose
/// vertical midpoint is below the pointer, otherwise at the end.
pub fn insert_index(y: f64, siblings: &[Rect]) -> usize {
    siblings
        .iter()
        .position(|rect| y < rect.mid_y())
        .unwrap_or(siblings.len())
}

/// Picks the single receiver of a drop. Columns win over the top-level zone;
/// a point inside a layout but outside its columns is ignored.
pub fn route_drop(x: f64, y: f64, geometry: &DropGeometry) -> DropTarget {
    if let Some((layout, column, _)) = geometry
        .columns
        .iter()
        .find(|(_, _, rect)| rect.contains(x, y))
    {
        return DropTarget::Column {
            layout: *layout,
            column: *column,
        };
    }
    if geometry.layouts.iter().any(|(_, rect)| rect.contains(x, y)) {
        return DropTarget::Ignore;
    }
    DropTarget::TopLevel(insert_index(y, &geometry.elements))
}

/// Gesture id supplied by the event source. Every listener that sees the
/// same physical drop reports the same id.
pub type GestureId = u64;

/// Re-entrancy guard for drop gestures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GestureGuard {
    processing: bool,
    last: Option<GestureId>,
}

impl GestureGuard {
    /// Claims the gesture. Returns false for a duplicate delivery.
    pub fn begin(&mut self, gesture: GestureId) -> bool {
        if self.processing || self.last == Some(gesture) {
            debug!(gesture, "duplicate drop suppressed");
            return false;
        }
        self.processing = true;
        self.last = Some(gesture);
        true
    }

    pub fn finish(&mut self) {
        self.processing = false;
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }
}
