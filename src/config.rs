//! User configuration
//!
//! Stored as TOML in the user's config directory:
//! - Linux: ~/.config/shutterframe/config.toml
//! - macOS: ~/Library/Application Support/shutterframe/config.toml
//! - Windows: %APPDATA%\shutterframe\config.toml
//!
//! A missing file means defaults; unknown keys are rejected.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::{GalleryError, GalleryResult};

/// Directory name used under the platform config/data dirs
const APP_DIR: &str = "shutterframe";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Where the media index database lives
    pub database_path: PathBuf,
    /// Days a trashed item is kept before purge
    pub trash_retention_days: u32,
    /// Default tracing filter when RUST_LOG is not set
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_data_dir().join("shutterframe.db"),
            trash_retention_days: 30,
            log_filter: "warn".to_string(),
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// Load the config at `path`, falling back to defaults if it does not exist
    pub fn load(path: &Path) -> GalleryResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;
        debug!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> GalleryResult<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml(&self) -> GalleryResult<String> {
        toml::to_string_pretty(self).map_err(|e| GalleryError::Config(e.to_string()))
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.trash_retention_days, 30);
        assert_eq!(config.log_filter, "warn");
        assert!(config.database_path.ends_with("shutterframe/shutterframe.db"));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = Config::from_toml("trash_retention_days = 7\n").unwrap();
        assert_eq!(config.trash_retention_days, 7);
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = Config::from_toml("retention = 7\n").unwrap_err();
        assert!(matches!(err, GalleryError::Config(_)));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load(Path::new("/nonexistent/shutterframe/config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }
}
