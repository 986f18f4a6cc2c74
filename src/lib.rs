//! pynew - Python file templates with a persistent TTL cache
//!
//! Provides a directory-backed template store with recursive `${key}`
//! rendering, a JSON key/value cache with TTL expiration and oldest-first
//! eviction, and a JSON settings registry.

pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod persist;
pub mod scaffold;
pub mod settings;
pub mod templates;

pub use app::App;
pub use cache::FileCache;
pub use config::Config;
pub use error::{Result, StoreError};
pub use settings::Settings;
pub use templates::{TemplateMetadata, TemplateStore, Variables};
