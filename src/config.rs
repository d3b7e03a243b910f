//! Configuration management for taskdeck.
//!
//! This module handles the `config.yaml` file in the data directory, which
//! picks the storage backend and tunes the asset cache.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file name inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Origin the cache worker serves when none is configured.
pub const DEFAULT_ORIGIN: &str = "https://taskdeck.local";

/// Which key-value backend holds the document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// `SQLite` database, falling back to files if it cannot be written.
    #[default]
    Sqlite,
    /// Plain JSON files.
    File,
    /// Nothing persisted.
    Memory,
}

impl std::fmt::Display for StorageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Sqlite => "sqlite",
            Self::File => "file",
            Self::Memory => "memory",
        })
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Storage backend.
    #[serde(default)]
    pub storage: StorageKind,

    /// Asset cache generation; bumping it purges older caches on activation.
    #[serde(default = "default_cache_version")]
    pub cache_version: u32,

    /// Origin whose assets are cached.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Directory of static assets served for `origin`.
    /// None means `<data_dir>/assets`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_dir: Option<PathBuf>,

    /// Directory of HTML template overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_dir: Option<PathBuf>,

    /// Append every bus event to `events.jsonl`.
    #[serde(default)]
    pub event_log: bool,
}

const fn default_cache_version() -> u32 {
    1
}

fn default_origin() -> String {
    DEFAULT_ORIGIN.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageKind::default(),
            cache_version: default_cache_version(),
            origin: default_origin(),
            asset_dir: None,
            theme_dir: None,
            event_log: false,
        }
    }
}

impl AppConfig {
    /// Load config from a data directory, returning None if not found.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file exists but cannot be parsed.
    pub fn load_from(data_dir: &Path) -> Result<Option<Self>> {
        let config_path = Self::config_path(data_dir);
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)?;
        if content.trim().is_empty() {
            return Ok(Some(Self::default()));
        }
        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| Error::Config { path: config_path.clone(), message: e.to_string() })?;
        if config.cache_version == 0 {
            return Err(Error::Config {
                path: config_path,
                message: "cache_version must be at least 1".to_string(),
            });
        }
        Ok(Some(config))
    }

    /// Save config to a data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, data_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(data_dir)?;
        let content = serde_yaml::to_string(self)?;
        std::fs::write(Self::config_path(data_dir), content)?;
        Ok(())
    }

    /// Load the config, writing the defaults first if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if config cannot be loaded or saved.
    pub fn ensure(data_dir: &Path) -> Result<Self> {
        if let Some(config) = Self::load_from(data_dir)? {
            return Ok(config);
        }
        let config = Self::default();
        config.save_to(data_dir)?;
        tracing::info!(dir = %data_dir.display(), "wrote default config");
        Ok(config)
    }

    /// Get the config file path for a data directory.
    pub fn config_path(data_dir: &Path) -> PathBuf {
        data_dir.join(CONFIG_FILE_NAME)
    }

    /// The asset directory, resolved against the data directory.
    pub fn asset_dir_in(&self, data_dir: &Path) -> PathBuf {
        self.asset_dir.clone().unwrap_or_else(|| data_dir.join("assets"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_config() {
        let dir = TempDir::new().unwrap();
        assert!(AppConfig::load_from(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig {
            storage: StorageKind::File,
            cache_version: 4,
            theme_dir: Some(PathBuf::from("/themes/dark")),
            event_log: true,
            ..AppConfig::default()
        };
        config.save_to(dir.path()).unwrap();

        assert_eq!(AppConfig::load_from(dir.path()).unwrap(), Some(config));
    }

    #[test]
    fn test_partial_config_gets_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "storage: memory\n").unwrap();

        let config = AppConfig::load_from(dir.path()).unwrap().unwrap();
        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(config.cache_version, 1);
        assert_eq!(config.origin, DEFAULT_ORIGIN);
        assert!(!config.event_log);
    }

    #[test]
    fn test_empty_file_is_default() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "\n").unwrap();
        assert_eq!(AppConfig::load_from(dir.path()).unwrap(), Some(AppConfig::default()));
    }

    #[test]
    fn test_invalid_config_names_the_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "storage: floppy\n").unwrap();

        let err = AppConfig::load_from(dir.path()).unwrap_err();
        assert!(matches!(&err, Error::Config { path, .. } if path.ends_with(CONFIG_FILE_NAME)));
    }

    #[test]
    fn test_zero_cache_version_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "cache_version: 0\n").unwrap();
        assert!(matches!(AppConfig::load_from(dir.path()), Err(Error::Config { .. })));
    }

    #[test]
    fn test_ensure_creates_then_loads() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("nested");

        let first = AppConfig::ensure(&data).unwrap();
        assert!(AppConfig::config_path(&data).exists());

        let mut changed = first;
        changed.cache_version = 9;
        changed.save_to(&data).unwrap();
        assert_eq!(AppConfig::ensure(&data).unwrap().cache_version, 9);
    }

    #[test]
    fn test_asset_dir_default() {
        let config = AppConfig::default();
        assert_eq!(config.asset_dir_in(Path::new("/d")), PathBuf::from("/d/assets"));
    }
}
