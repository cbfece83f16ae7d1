//! Live canvas: keeps a rendered surface in step with the document while
//! the user edits.

mod autocomplete;
mod debounce;
mod drop;
pub mod editable;
mod engine;
mod key;
mod surface;
mod view;

pub use autocomplete::{
    accept, trigger_query, AutocompleteKey, AutocompleteState, Completion, KeyOutcome, Suggestion,
};
pub use debounce::{PendingEdit, PendingEdits};
pub use drop::{insert_index, route_drop, DropGeometry, DropTarget, GestureGuard, GestureId, Rect};
pub use engine::RenderEngine;
pub use key::StructuralKey;
pub use surface::{MemoryNode, MemorySurface, Patch, Region, Surface};
pub use view::{body_style, container_style, BodyContent, BodyView, ColumnView, ElementView};
