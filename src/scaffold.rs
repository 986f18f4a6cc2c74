//! New-file scaffolding.
//!
//! Writes rendered template output into a target directory, either under an
//! explicit file name or under the first free numbered name.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Result, StoreError};
use crate::persist;
use crate::templates::{normalize_name, TEMPLATE_EXTENSION};

/// Prefix of numbered file names
pub const DEFAULT_PREFIX: &str = "NewPythonFile";

/// First `<prefix><i>.py` in `dir` that does not exist yet, counting from 1.
pub fn next_available_path(dir: &Path, prefix: &str) -> PathBuf {
    (1u64..)
        .map(|i| dir.join(format!("{}{}{}", prefix, i, TEMPLATE_EXTENSION)))
        .find(|path| !path.exists())
        .unwrap_or_else(|| dir.join(format!("{}{}", prefix, TEMPLATE_EXTENSION)))
}

/// Write `content` into `dir` and return the created path.
///
/// With `file_name` the name is normalized like a template name and an
/// existing file is only replaced when `overwrite` is set. Without it a
/// numbered name is chosen.
pub fn write_new_file(
    dir: &Path,
    file_name: Option<&str>,
    content: &str,
    overwrite: bool,
) -> Result<PathBuf> {
    let path = match file_name {
        Some(name) => {
            let name = normalize_name(name)?;
            let path = dir.join(&name);
            if path.exists() && !overwrite {
                return Err(StoreError::AlreadyExists(path.display().to_string()));
            }
            path
        }
        None => next_available_path(dir, DEFAULT_PREFIX),
    };

    persist::atomic_write(&path, content.as_bytes())?;
    info!("Created {}", path.display());
    Ok(path)
}
