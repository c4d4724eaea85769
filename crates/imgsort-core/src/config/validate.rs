//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.max_workers == 0 {
            return Err(ConfigError::ValidationError(
                "processing.max_workers must be > 0".into(),
            ));
        }
        if self.processing.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "processing.batch_size must be > 0".into(),
            ));
        }
        if self.processing.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "processing.supported_formats must not be empty".into(),
            ));
        }
        let classification = &self.classification;
        if classification.large_pixel_threshold == 0 {
            return Err(ConfigError::ValidationError(
                "classification.large_pixel_threshold must be > 0".into(),
            ));
        }
        if classification.xl_pixel_threshold < classification.large_pixel_threshold {
            return Err(ConfigError::ValidationError(
                "classification.xl_pixel_threshold must be >= large_pixel_threshold".into(),
            ));
        }
        for (key, label) in self.layout.folder_names.entries() {
            let label = label.trim();
            if label.is_empty() || label == "." || label == ".." || label.contains(['/', '\\']) {
                return Err(ConfigError::ValidationError(format!(
                    "layout.folder_names.{key} must be a single non-empty path segment"
                )));
            }
        }
        if self.paths.destination_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "paths.destination_dir must not be empty".into(),
            ));
        }
        Ok(())
    }
}
