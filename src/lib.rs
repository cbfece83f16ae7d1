//! # Page Builder
//!
//! Engine behind a drag-and-drop template builder for invoice-style pages.
//!
//! ## Features
//! - Typed element tree with one level of layout nesting
//! - Live render/sync engine over an abstract [`render::Surface`]
//! - Preview generation against mock data
//! - Publish generation to Blade-style template source
//! - Property panel schema per element type
//!
//! ## Example
//! ```ignore
//! use page_builder::{BuilderConfig, Document, ElementType, Generator, VariableCatalog};
//!
//! let config = BuilderConfig::embedded()?;
//! let catalog = VariableCatalog::from_config(&config.catalog);
//!
//! let mut doc = Document::new("Invoice");
//! let heading = doc.create_element(ElementType::Heading);
//! doc.insert(0, heading);
//!
//! let html = Generator::new(&catalog).publish(doc.elements());
//! ```

pub mod codegen;
pub mod config;
pub mod document;
pub mod element;
pub mod error;
pub mod properties;
pub mod render;
pub mod styles;
pub mod upload;
pub mod variables;
#[cfg(feature = "web")]
pub mod web;

// --- Core types ---
pub use codegen::{Generator, Mode};
pub use config::{BuilderConfig, CatalogConfig, EditorOptions};
pub use document::{Document, PersistedDocument};
pub use element::{Element, ElementContent, ElementId, ElementType};
pub use error::{BuilderError, BuilderResult};
pub use render::{RenderEngine, StructuralKey, Surface};
pub use styles::StyleMap;
pub use variables::{Variable, VariableCatalog, VariableKind};
