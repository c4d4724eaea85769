//! Configuration management for imgsort.
//!
//! Configuration is loaded from `config.toml` in the platform config directory
//! with sensible defaults. Legacy `.json` config files are accepted too; keys
//! starting with `_` are treated as comments and dropped.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for imgsort.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input and destination roots
    pub paths: PathsConfig,

    /// Classifier thresholds and switches
    pub classification: ClassificationConfig,

    /// Destination layout
    pub layout: LayoutConfig,

    /// Worker pool and batching
    pub processing: ProcessingConfig,

    /// Transfer retries
    pub pipeline: PipelineConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_str(&content)?
        } else {
            toml::from_str(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON config, dropping top-level `_comment` style keys.
    fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let mut value: serde_json::Value = serde_json::from_str(content)?;
        if let Some(map) = value.as_object_mut() {
            map.retain(|key, _| !key.starts_with('_'));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.imgsort.imgsort/config.toml
    /// - Linux: ~/.config/imgsort/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\imgsort\config\config.toml
    ///
    /// Falls back to ~/.imgsort/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "imgsort", "imgsort")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".imgsort").join("config.toml")
            })
    }

    /// Resolved input root (with ~ expansion).
    pub fn input_dir(&self) -> PathBuf {
        expand(&self.paths.input_dir)
    }

    /// Resolved destination root (with ~ expansion).
    pub fn destination_dir(&self) -> PathBuf {
        expand(&self.paths.destination_dir)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&path_str).into_owned())
}
