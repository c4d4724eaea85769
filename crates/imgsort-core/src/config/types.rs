//! Sub-configuration structs and their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::{Category, Shape};

/// Input and destination roots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory tree to sort
    pub input_dir: PathBuf,

    /// Root of the sorted output tree
    pub destination_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/Images"),
            destination_dir: PathBuf::from("Sorted Images"),
        }
    }
}

/// Which dimension the `large` and `xlarge` thresholds are compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SizeRule {
    /// The longer side must reach the threshold
    #[default]
    MaxDimension,
    /// Both sides must reach the threshold
    BothDimensions,
}

/// Thresholds and switches for the classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Pixel size at which an image stops being `Small` and can be `Large`
    pub large_pixel_threshold: u32,

    /// Pixel size at which an image becomes `XLarge`
    pub xl_pixel_threshold: u32,

    /// Minimum DPI for the best-quality override
    pub dpi_threshold: u32,

    /// Minimum modification year for the best-quality override
    pub min_year: i32,

    /// Add a landscape/portrait/square folder below the category
    pub sort_by_shape: bool,

    /// Enable the best-quality override (DPI + recency)
    pub quality_sort: bool,

    /// Dimension comparison rule for the upper size tiers
    pub size_rule: SizeRule,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            large_pixel_threshold: 1000,
            xl_pixel_threshold: 2000,
            dpi_threshold: 300,
            min_year: 2016,
            sort_by_shape: true,
            quality_sort: true,
            size_rule: SizeRule::MaxDimension,
        }
    }
}

/// Folder labels used in the destination tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FolderNames {
    pub small: String,
    pub standard: String,
    pub large: String,
    pub xlarge: String,
    pub best_quality: String,
    pub errors: String,
    pub landscape: String,
    pub portrait: String,
    pub square: String,
}

impl Default for FolderNames {
    fn default() -> Self {
        Self {
            small: "Small".to_string(),
            standard: "Standard".to_string(),
            large: "Large".to_string(),
            xlarge: "XLarge".to_string(),
            best_quality: "Best Quality".to_string(),
            errors: "Errors".to_string(),
            landscape: "Landscape".to_string(),
            portrait: "Portrait".to_string(),
            square: "Square".to_string(),
        }
    }
}

impl FolderNames {
    /// Folder label for a category.
    pub fn category(&self, category: Category) -> &str {
        match category {
            Category::Small => &self.small,
            Category::Standard => &self.standard,
            Category::Large => &self.large,
            Category::XLarge => &self.xlarge,
            Category::BestQuality => &self.best_quality,
            Category::Error => &self.errors,
        }
    }

    /// Folder label for a shape sub-category.
    pub fn shape(&self, shape: Shape) -> &str {
        match shape {
            Shape::Landscape => &self.landscape,
            Shape::Portrait => &self.portrait,
            Shape::Square => &self.square,
        }
    }

    /// All labels with their config keys, for validation.
    pub(crate) fn entries(&self) -> [(&'static str, &str); 9] {
        [
            ("small", &self.small),
            ("standard", &self.standard),
            ("large", &self.large),
            ("xlarge", &self.xlarge),
            ("best_quality", &self.best_quality),
            ("errors", &self.errors),
            ("landscape", &self.landscape),
            ("portrait", &self.portrait),
            ("square", &self.square),
        ]
    }
}

/// Destination layout settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Mirror the source's relative directory below the category folder
    pub keep_directory_structure: bool,

    /// Folder labels
    pub folder_names: FolderNames,
}

/// How files are transferred into the destination tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    /// Rename when possible, otherwise copy, verify and remove the source
    #[default]
    Move,
    /// Copy and verify, leaving the source in place
    Copy,
}

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of concurrent workers (hard ceiling)
    pub max_workers: usize,

    /// Files per dispatch batch
    pub batch_size: usize,

    /// Supported input extensions
    pub supported_formats: Vec<String>,

    /// Move or copy
    pub transfer_mode: TransferMode,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            batch_size: 100,
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "heic".to_string(),
                "webp".to_string(),
            ],
            transfer_mode: TransferMode::Move,
        }
    }
}

/// Retry settings for transient transfer failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Extra attempts after the first failed transfer
    pub retry_attempts: u32,

    /// Base delay between attempts in milliseconds (doubles each retry)
    pub retry_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 4,
            retry_delay_ms: 1000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
