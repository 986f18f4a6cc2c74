//! Template name handling.
//!
//! User-supplied names are reduced to their final path component and given
//! the `.py` extension. Names that could escape the template directory or
//! are unusable as Windows file names are rejected.

use uuid::Uuid;

use crate::error::{Result, StoreError};

/// Extension carried by every template file
pub const TEMPLATE_EXTENSION: &str = ".py";

const RESERVED_CHARS: [char; 7] = ['<', '>', ':', '"', '|', '?', '*'];

/// Normalize a template or file name.
///
/// Keeps only the text after the last `/` or `\` and appends `.py` when it
/// is missing.
pub fn normalize_name(name: &str) -> Result<String> {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default().trim();

    if base.is_empty() || base == "." || base == ".." || base == TEMPLATE_EXTENSION {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    if base
        .chars()
        .any(|c| c.is_control() || RESERVED_CHARS.contains(&c))
    {
        return Err(StoreError::InvalidName(name.to_string()));
    }

    if base.ends_with(TEMPLATE_EXTENSION) {
        Ok(base.to_string())
    } else {
        Ok(format!("{}{}", base, TEMPLATE_EXTENSION))
    }
}

/// Name without the `.py` extension.
pub fn stem(name: &str) -> &str {
    name.strip_suffix(TEMPLATE_EXTENSION).unwrap_or(name)
}

/// Short unique file name such as `template_1a2b3c4d.py`.
pub fn random_name(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}_{}{}", prefix, &id[..8], TEMPLATE_EXTENSION)
}
