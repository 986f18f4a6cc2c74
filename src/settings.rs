//! Settings Registry
//!
//! JSON-object key/value document holding application settings such as the
//! author name and the last used template. Every read goes to disk and every
//! write replaces the whole document atomically.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::persist;

/// Author name used when auto-filling variables
pub const KEY_AUTHOR: &str = "author";
/// Template selected last
pub const KEY_LAST_TEMPLATE: &str = "last_template";
/// Target directory used last
pub const KEY_LAST_TARGET: &str = "last_target";
/// Path of the file created last
pub const KEY_LAST_CREATED: &str = "last_created";

/// File name of the settings document
pub const SETTINGS_FILE_NAME: &str = "settings.json";

// == Settings ==
/// Handle to a settings document.
#[derive(Debug, Clone)]
pub struct Settings {
    path: PathBuf,
}

impl Settings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whole document; empty if missing or unreadable.
    pub fn load(&self) -> Map<String, Value> {
        persist::read_object_or_default(&self.path)
    }

    /// Replaces the whole document.
    pub fn save(&self, data: &Map<String, Value>) -> Result<()> {
        persist::write_json(&self.path, data)
    }

    /// Merges `updates` into the stored document and returns the result.
    pub fn update(&self, updates: Map<String, Value>) -> Result<Map<String, Value>> {
        let mut data = self.load();
        data.extend(updates);
        self.save(&data)?;
        Ok(data)
    }

    /// Typed value for `key`; `None` if absent or null.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.load().remove(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    /// Typed value for `key`, or `default` when absent or of another type.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).ok().flatten().unwrap_or(default)
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let mut data = self.load();
        data.insert(key.to_string(), serde_json::to_value(value)?);
        self.save(&data)
    }

    /// Removes `key`. Returns whether it was present.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let mut data = self.load();
        if data.remove(key).is_none() {
            return Ok(false);
        }
        self.save(&data)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn new_settings(temp_dir: &TempDir) -> Settings {
        Settings::new(temp_dir.path().join(SETTINGS_FILE_NAME))
    }

    #[test]
    fn test_set_get_delete() {
        let temp_dir = TempDir::new().unwrap();
        let settings = new_settings(&temp_dir);

        settings.set(KEY_AUTHOR, "Ada").unwrap();
        assert_eq!(settings.get::<String>(KEY_AUTHOR).unwrap().as_deref(), Some("Ada"));

        assert!(settings.delete(KEY_AUTHOR).unwrap());
        assert!(!settings.delete(KEY_AUTHOR).unwrap());
        assert!(settings.get::<String>(KEY_AUTHOR).unwrap().is_none());
    }

    #[test]
    fn test_get_or_default() {
        let temp_dir = TempDir::new().unwrap();
        let settings = new_settings(&temp_dir);

        assert_eq!(settings.get_or(KEY_AUTHOR, "Your Name".to_string()), "Your Name");

        settings.set(KEY_AUTHOR, &42).unwrap();
        assert_eq!(settings.get_or(KEY_AUTHOR, "Your Name".to_string()), "Your Name");
    }

    #[test]
    fn test_update_merges() {
        let temp_dir = TempDir::new().unwrap();
        let settings = new_settings(&temp_dir);

        settings.set("keep", &1).unwrap();
        let mut updates = Map::new();
        updates.insert(KEY_LAST_TARGET.to_string(), json!("/tmp/project"));
        updates.insert("keep".to_string(), json!(2));

        let merged = settings.update(updates).unwrap();
        assert_eq!(merged["keep"], json!(2));
        assert_eq!(settings.load()[KEY_LAST_TARGET], json!("/tmp/project"));
    }

    #[test]
    fn test_corrupt_document_reads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let settings = new_settings(&temp_dir);
        fs::write(settings.path(), "not json").unwrap();

        assert!(settings.load().is_empty());
        settings.set(KEY_LAST_TEMPLATE, "starter.py").unwrap();
        assert_eq!(settings.load().len(), 1);
    }
}
