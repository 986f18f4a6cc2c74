//! Application composition.
//!
//! Owns the cache and settings handles built from `Config` and implements
//! the workflows shared by front ends: resolving the author, assembling
//! render variables and writing a new file from a template.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use chrono::Local;
use serde_json::{Map, Value};
use tracing::debug;

use crate::cache::FileCache;
use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::scaffold;
use crate::settings::{self, Settings};
use crate::templates::samples::{sample_variables, SampleContext, DEFAULT_AUTHOR};
use crate::templates::{normalize_name, TemplateStore, Variables};

/// Cache key of the memoized `git config user.name` lookup
pub const GIT_AUTHOR_CACHE_KEY: &str = "git.user.name";

/// How long the git author lookup stays cached
pub const GIT_AUTHOR_TTL: Duration = Duration::from_secs(24 * 60 * 60);

// == App ==
/// Top-level handles shared by every command.
#[derive(Debug)]
pub struct App {
    pub config: Config,
    pub cache: FileCache,
    pub settings: Settings,
}

impl App {
    /// Creates the cache and settings handles from configuration.
    ///
    /// Nothing is read from disk until first use.
    pub fn from_config(config: Config) -> Self {
        let cache = FileCache::new(&config.cache_path, config.max_entries);
        let settings = Settings::new(&config.settings_path);
        Self {
            config,
            cache,
            settings,
        }
    }

    /// Opens the configured template directory.
    pub fn open_templates(&self) -> Result<TemplateStore> {
        TemplateStore::open(&self.config.templates_dir)
    }

    /// Template used most recently, if any.
    pub fn last_template(&self) -> Option<String> {
        self.settings
            .get::<String>(settings::KEY_LAST_TEMPLATE)
            .ok()
            .flatten()
    }

    // == Author ==
    /// Author for generated files: the `author` setting, else the git user
    /// name (memoized in the cache for a day), else a placeholder.
    pub fn author(&self) -> Result<String> {
        let configured = self
            .settings
            .get::<String>(settings::KEY_AUTHOR)
            .ok()
            .flatten()
            .filter(|a| !a.trim().is_empty());
        if let Some(author) = configured {
            return Ok(author);
        }

        let from_git: String =
            self.cache
                .get_or_compute(GIT_AUTHOR_CACHE_KEY, git_user_name, Some(GIT_AUTHOR_TTL))?;
        if from_git.is_empty() {
            Ok(DEFAULT_AUTHOR.to_string())
        } else {
            Ok(from_git)
        }
    }

    // == Variables ==
    /// Render variables for `template`.
    ///
    /// With `auto_fill` the declared variables get sample values first;
    /// `explicit` pairs always win.
    pub fn variables_for(
        &self,
        store: &TemplateStore,
        template: &str,
        explicit: &[(String, String)],
        auto_fill: bool,
        target_dir: &Path,
    ) -> Result<Variables> {
        let mut variables = Variables::new();

        if auto_fill {
            let metadata = store.metadata(template)?;
            let project_name = target_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let context = SampleContext::new(project_name, self.author()?, Local::now().date_naive());
            variables = sample_variables(&metadata, &context);
        }

        for (key, value) in explicit {
            variables.insert(key.clone(), Value::String(value.clone()));
        }
        Ok(variables)
    }

    // == Create File ==
    /// Renders `template` into a new file under `target_dir`.
    ///
    /// Records the template, target and created path in settings.
    pub fn create_file(
        &self,
        store: &TemplateStore,
        template: &str,
        target_dir: &Path,
        file_name: Option<&str>,
        variables: &Variables,
        overwrite: bool,
    ) -> Result<PathBuf> {
        let template = normalize_name(template)?;
        if !store.exists(&template)? {
            return Err(StoreError::NotFound(template));
        }

        let rendered = store.render(&template, variables)?;
        let path = scaffold::write_new_file(target_dir, file_name, &rendered, overwrite)?;

        let mut updates = Map::new();
        updates.insert(settings::KEY_LAST_TEMPLATE.to_string(), Value::String(template));
        updates.insert(
            settings::KEY_LAST_TARGET.to_string(),
            Value::String(target_dir.display().to_string()),
        );
        updates.insert(
            settings::KEY_LAST_CREATED.to_string(),
            Value::String(path.display().to_string()),
        );
        self.settings.update(updates)?;

        Ok(path)
    }
}

/// `git config user.name`, empty when git is unavailable or unset.
fn git_user_name() -> String {
    let output = Command::new("git").args(["config", "user.name"]).output();
    match output {
        Ok(output) if output.status.success() => {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        }
        Ok(_) => String::new(),
        Err(e) => {
            debug!("git not available: {}", e);
            String::new()
        }
    }
}
