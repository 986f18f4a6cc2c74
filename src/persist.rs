//! Persistence helpers shared by the cache, template store and settings.
//! Handles atomic file replacement and lenient JSON object documents.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::Result;

/// Outcome of parsing a persisted JSON object document.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectDocument {
    /// File absent or blank.
    Missing,
    /// Well-formed JSON object.
    Parsed(Map<String, Value>),
    /// Content was unusable and is treated as an empty object.
    Reset(String),
}

impl ObjectDocument {
    /// Collapse into a map, empty unless the document parsed.
    pub fn into_map(self) -> Map<String, Value> {
        match self {
            ObjectDocument::Parsed(map) => map,
            ObjectDocument::Missing | ObjectDocument::Reset(_) => Map::new(),
        }
    }
}

/// Parse raw document text. Never fails: bad input yields `Reset`.
pub fn parse_object(raw: &str) -> ObjectDocument {
    if raw.trim().is_empty() {
        return ObjectDocument::Missing;
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => ObjectDocument::Parsed(map),
        Ok(Value::Null) => ObjectDocument::Missing,
        Ok(other) => {
            ObjectDocument::Reset(format!("expected a JSON object, found {}", kind(&other)))
        }
        Err(e) => ObjectDocument::Reset(e.to_string()),
    }
}

/// Read a JSON object document, resetting to empty on any problem.
pub fn read_object_or_default(path: &Path) -> Map<String, Value> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Map::new(),
        Err(e) => {
            warn!("Cannot read {}, treating as empty: {}", path.display(), e);
            return Map::new();
        }
    };

    match parse_object(&raw) {
        ObjectDocument::Reset(reason) => {
            warn!("Corrupted document {}, resetting: {}", path.display(), reason);
            Map::new()
        }
        doc => doc.into_map(),
    }
}

/// Replace `path` with `contents` via a temp file in the same directory.
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut file = NamedTempFile::new_in(parent)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;

    debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

/// Serialize `value` as pretty JSON and write it atomically.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    atomic_write(path, json.as_bytes())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
