//! Template Store Module
//!
//! Directory-backed collection of named templates plus the metadata
//! side-table. Reads are lenient (a missing template reads as empty) while
//! name collisions on create and rename are reported.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::persist;
use crate::templates::metadata::{self, MetadataTable, METADATA_FILE_NAME};
use crate::templates::render::{self, Variables};
use crate::templates::{normalize_name, TemplateMetadata, STARTERS, TEMPLATE_EXTENSION};

// == Template Store ==
/// Owns one template directory and its `templates.json` side-table.
///
/// Mutating operations take `&mut self`; callers serialize access through
/// ownership.
#[derive(Debug)]
pub struct TemplateStore {
    dir: PathBuf,
    metadata_path: PathBuf,
    metadata: MetadataTable,
}

impl TemplateStore {
    // == Open ==
    /// Opens (creating if needed) a template directory.
    ///
    /// Loads the metadata side-table, resetting it when corrupt, and seeds
    /// the built-in starters when no template exists yet.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let metadata_path = dir.join(METADATA_FILE_NAME);
        let metadata = metadata::load_table(&metadata_path);

        let mut store = Self {
            dir,
            metadata_path,
            metadata,
        };
        store.seed_starters()?;

        debug!(
            "Opened template store at {} ({} metadata records)",
            store.dir.display(),
            store.metadata.len()
        );
        Ok(store)
    }

    fn seed_starters(&mut self) -> Result<()> {
        if !self.list()?.is_empty() {
            return Ok(());
        }

        for starter in STARTERS {
            self.save(starter.name, starter.content, Some(starter.metadata()), true)?;
        }
        info!(
            "Seeded {} starter templates into {}",
            STARTERS.len(),
            self.dir.display()
        );
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<(String, PathBuf)> {
        let name = normalize_name(name)?;
        let path = self.dir.join(&name);
        Ok((name, path))
    }

    fn save_metadata(&self) -> Result<()> {
        metadata::save_table(&self.metadata_path, &self.metadata)
    }

    // == List ==
    /// Names of all template files, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name.ends_with(TEMPLATE_EXTENSION) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Whether a content file exists for `name`.
    pub fn exists(&self, name: &str) -> Result<bool> {
        let (_, path) = self.path_for(name)?;
        Ok(path.is_file())
    }

    // == Create ==
    /// Writes a new template. Fails with `AlreadyExists` if the name is taken.
    ///
    /// Returns the normalized name.
    pub fn create(
        &mut self,
        name: &str,
        content: &str,
        metadata: Option<TemplateMetadata>,
    ) -> Result<String> {
        let (name, path) = self.path_for(name)?;
        if path.exists() {
            return Err(StoreError::AlreadyExists(name));
        }

        persist::atomic_write(&path, content.as_bytes())?;
        self.metadata.insert(name.clone(), metadata.unwrap_or_default());
        self.save_metadata()?;

        info!("Created template {}", name);
        Ok(name)
    }

    // == Save ==
    /// Writes template content, replacing an existing file when `overwrite`.
    ///
    /// Provided metadata replaces the stored record; otherwise the existing
    /// record (or an empty one) is kept.
    pub fn save(
        &mut self,
        name: &str,
        content: &str,
        metadata: Option<TemplateMetadata>,
        overwrite: bool,
    ) -> Result<String> {
        let (name, path) = self.path_for(name)?;
        if path.exists() && !overwrite {
            return Err(StoreError::AlreadyExists(name));
        }

        persist::atomic_write(&path, content.as_bytes())?;
        match metadata {
            Some(metadata) => {
                self.metadata.insert(name.clone(), metadata);
            }
            None => {
                self.metadata.entry(name.clone()).or_default();
            }
        }
        self.save_metadata()?;

        debug!("Saved template {}", name);
        Ok(name)
    }

    // == Load ==
    /// Template content, empty when the template does not exist.
    pub fn load(&self, name: &str) -> Result<String> {
        let (_, path) = self.path_for(name)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Template content together with its metadata.
    pub fn load_with_metadata(&self, name: &str) -> Result<(String, TemplateMetadata)> {
        let content = self.load(name)?;
        let metadata = self.metadata(name)?;
        Ok((content, metadata))
    }

    // == Metadata ==
    /// Stored metadata, empty when unknown.
    pub fn metadata(&self, name: &str) -> Result<TemplateMetadata> {
        let name = normalize_name(name)?;
        Ok(self.metadata.get(&name).cloned().unwrap_or_default())
    }

    // == Delete ==
    /// Removes the content file and metadata record.
    ///
    /// Returns whether a content file existed.
    pub fn delete(&mut self, name: &str) -> Result<bool> {
        let (name, path) = self.path_for(name)?;

        let removed = match fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };

        if self.metadata.remove(&name).is_some() {
            self.save_metadata()?;
        }

        if removed {
            info!("Deleted template {}", name);
        }
        Ok(removed)
    }

    // == Rename ==
    /// Renames a template and moves its metadata record.
    ///
    /// Fails with `NotFound` if `old` is missing and `AlreadyExists` if `new`
    /// is taken. Returns the new normalized name.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<String> {
        let (old_name, old_path) = self.path_for(old)?;
        let (new_name, new_path) = self.path_for(new)?;

        if !old_path.exists() {
            return Err(StoreError::NotFound(old_name));
        }
        if new_path.exists() {
            return Err(StoreError::AlreadyExists(new_name));
        }

        fs::rename(&old_path, &new_path)?;
        if let Some(metadata) = self.metadata.remove(&old_name) {
            self.metadata.insert(new_name.clone(), metadata);
            self.save_metadata()?;
        }

        info!("Renamed template {} to {}", old_name, new_name);
        Ok(new_name)
    }

    // == Render ==
    /// Renders a template with `variables`; a missing template renders as "".
    pub fn render(&self, name: &str, variables: &Variables) -> Result<String> {
        let content = self.load(name)?;
        if content.is_empty() {
            return Ok(String::new());
        }
        Ok(render::render(&content, variables))
    }
}
