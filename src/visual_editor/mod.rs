mod component;
mod properties_panel;

pub use component::VisualEditor;
