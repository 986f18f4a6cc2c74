//! Configuration Module
//!
//! Resolves file locations and limits from environment variables, falling
//! back to per-user platform directories.

use std::env;
use std::path::PathBuf;

use directories::ProjectDirs;

use crate::cache::{CACHE_FILE_NAME, DEFAULT_MAX_ENTRIES};
use crate::settings::SETTINGS_FILE_NAME;

/// Application configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Location of the cache document
    pub cache_path: PathBuf,
    /// Maximum number of cache entries, 0 = unlimited
    pub max_entries: usize,
    /// Directory holding the templates
    pub templates_dir: PathBuf,
    /// Location of the settings document
    pub settings_path: PathBuf,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PYNEW_CACHE_FILE` - Cache document (default: `<cache dir>/cache.json`)
    /// - `PYNEW_MAX_ENTRIES` - Maximum cache entries (default: 500)
    /// - `PYNEW_TEMPLATES_DIR` - Template directory (default: `<data dir>/templates`)
    /// - `PYNEW_SETTINGS_FILE` - Settings document (default: `<config dir>/settings.json`)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_path: env_path("PYNEW_CACHE_FILE").unwrap_or(defaults.cache_path),
            max_entries: env::var("PYNEW_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_entries),
            templates_dir: env_path("PYNEW_TEMPLATES_DIR").unwrap_or(defaults.templates_dir),
            settings_path: env_path("PYNEW_SETTINGS_FILE").unwrap_or(defaults.settings_path),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let (cache_dir, data_dir, config_dir) = match ProjectDirs::from("", "", "pynew") {
            Some(dirs) => (
                dirs.cache_dir().to_path_buf(),
                dirs.data_dir().to_path_buf(),
                dirs.config_dir().to_path_buf(),
            ),
            None => {
                let base = PathBuf::from(".pynew");
                (base.clone(), base.clone(), base)
            }
        };

        Self {
            cache_path: cache_dir.join(CACHE_FILE_NAME),
            max_entries: DEFAULT_MAX_ENTRIES,
            templates_dir: data_dir.join("templates"),
            settings_path: config_dir.join(SETTINGS_FILE_NAME),
        }
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_entries, 500);
        assert!(config.cache_path.ends_with("cache.json"));
        assert!(config.templates_dir.ends_with("templates"));
        assert!(config.settings_path.ends_with("settings.json"));
    }

    #[test]
    fn test_config_from_env_overrides() {
        // Environment mutation stays inside this one test
        env::remove_var("PYNEW_CACHE_FILE");
        env::remove_var("PYNEW_MAX_ENTRIES");
        env::remove_var("PYNEW_TEMPLATES_DIR");
        env::remove_var("PYNEW_SETTINGS_FILE");
        assert_eq!(Config::from_env(), Config::default());

        env::set_var("PYNEW_CACHE_FILE", "/tmp/pynew-test/c.json");
        env::set_var("PYNEW_MAX_ENTRIES", "3");
        env::set_var("PYNEW_TEMPLATES_DIR", "/tmp/pynew-test/tpl");
        env::set_var("PYNEW_SETTINGS_FILE", "");

        let config = Config::from_env();
        assert_eq!(config.cache_path, PathBuf::from("/tmp/pynew-test/c.json"));
        assert_eq!(config.max_entries, 3);
        assert_eq!(config.templates_dir, PathBuf::from("/tmp/pynew-test/tpl"));
        assert_eq!(config.settings_path, Config::default().settings_path);

        env::remove_var("PYNEW_CACHE_FILE");
        env::remove_var("PYNEW_MAX_ENTRIES");
        env::remove_var("PYNEW_TEMPLATES_DIR");
        env::remove_var("PYNEW_SETTINGS_FILE");
    }
}
