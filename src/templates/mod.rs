//! Templates Module
//!
//! Named Python source templates stored in a directory, with a metadata
//! side-table and `${key}` placeholder rendering.

pub mod metadata;
mod name;
pub mod render;
pub mod samples;
mod starters;
mod store;

// Re-export public types
pub use metadata::{TemplateMetadata, METADATA_FILE_NAME};
pub use name::{normalize_name, random_name, stem, TEMPLATE_EXTENSION};
pub use render::{placeholders, RenderError, Variables, MAX_EXPANDED_LEN, MAX_PASSES};
pub use samples::{sample_variables, SampleContext};
pub use starters::{Starter, STARTERS};
pub use store::TemplateStore;
