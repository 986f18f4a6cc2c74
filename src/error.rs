//! Error types for the template store, cache and settings registry
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Store Error Enum ==
/// Unified error type for every persisted component.
///
/// Corrupted documents on disk are never reported through this type; they are
/// normalized to an empty structure when read.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Target name is already taken (create, save without overwrite, rename)
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Source template of a rename does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Name was rejected by normalization
    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    /// Underlying read, write or replace failed
    #[error("Storage I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be encoded to or decoded from JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the store components.
pub type Result<T> = std::result::Result<T, StoreError>;
