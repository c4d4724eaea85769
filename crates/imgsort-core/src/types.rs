//! Core data types for the imgsort pipeline.
//!
//! These types describe one file's journey through the pipeline (`WorkItem`)
//! and the aggregate outcome of a run (`RunReport`).

use chrono::{DateTime, Datelike, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Header-level metadata read from an image file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// Image width in pixels
    pub width_px: u32,

    /// Image height in pixels
    pub height_px: u32,

    /// Embedded resolution, if the container carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dpi: Option<u32>,

    /// Filesystem last-modification time
    pub modified_at: DateTime<Local>,
}

impl ImageMetadata {
    /// Calendar year of the last modification.
    pub fn modified_year(&self) -> i32 {
        self.modified_at.year()
    }

    pub fn max_dim(&self) -> u32 {
        self.width_px.max(self.height_px)
    }

    pub fn min_dim(&self) -> u32 {
        self.width_px.min(self.height_px)
    }
}

/// Destination category chosen by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Small,
    Standard,
    Large,
    #[serde(rename = "xlarge")]
    XLarge,
    BestQuality,
    Error,
}

impl Category {
    /// Every category, in report order.
    pub const ALL: [Category; 6] = [
        Category::Small,
        Category::Standard,
        Category::Large,
        Category::XLarge,
        Category::BestQuality,
        Category::Error,
    ];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Small => "small",
            Category::Standard => "standard",
            Category::Large => "large",
            Category::XLarge => "xlarge",
            Category::BestQuality => "best_quality",
            Category::Error => "error",
        };
        f.write_str(name)
    }
}

/// Aspect-ratio sub-category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Landscape,
    Portrait,
    Square,
}

impl Shape {
    /// Shape of a `width` x `height` image.
    pub fn of(width: u32, height: u32) -> Self {
        match width.cmp(&height) {
            std::cmp::Ordering::Greater => Shape::Landscape,
            std::cmp::Ordering::Less => Shape::Portrait,
            std::cmp::Ordering::Equal => Shape::Square,
        }
    }
}

/// Classifier output: a category and an optional shape label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<Shape>,
}

impl Classification {
    /// The classification given to files that could not be probed.
    pub const ERROR: Classification = Classification {
        category: Category::Error,
        shape: None,
    };

    pub fn new(category: Category, shape: Option<Shape>) -> Self {
        Self { category, shape }
    }
}

/// One source file and everything learned about it during a run.
///
/// Owned by one worker at a time while a pass runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    /// Position in enumeration order
    pub index: usize,

    /// Absolute path of the source file
    pub source_path: PathBuf,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ImageMetadata>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,

    /// Where the file ended up (or was meant to end up)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_path: Option<PathBuf>,

    /// Failure reason, if any stage failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkItem {
    pub fn new(index: usize, source_path: PathBuf) -> Self {
        Self {
            index,
            source_path,
            metadata: None,
            classification: None,
            destination_path: None,
            error: None,
        }
    }

    /// Whether the item was classified and relocated without any failure.
    pub fn succeeded(&self) -> bool {
        self.error.is_none() && self.destination_path.is_some()
    }

    /// Category the item was filed under, `Error` when anything failed.
    pub fn category(&self) -> Category {
        if self.error.is_some() {
            return Category::Error;
        }
        self.classification
            .map(|c| c.category)
            .unwrap_or(Category::Error)
    }

    /// Mark the item as failed, keeping the first reason recorded.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(reason.into());
        }
    }
}

/// Lifecycle of one scheduler run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Enumerating,
    Dispatching,
    Draining,
    Completed,
    Cancelled,
}

/// A file that failed, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Aggregate outcome of a run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunReport {
    /// Files enumerated at the start of the run
    pub total: usize,

    /// Files classified and relocated into their category
    pub succeeded: usize,

    /// Files with any failure (they are also listed in `errors`)
    pub failed: usize,

    /// Files never dispatched because the run was cancelled
    pub not_processed: usize,

    /// Processed files per destination category
    pub per_category: BTreeMap<Category, usize>,

    /// Every failure with its reason, sorted by path
    pub errors: Vec<FileFailure>,

    /// Final run state
    pub state: RunState,

    /// Wall-clock duration of the run
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

impl RunReport {
    /// Whether the run completed and every file succeeded.
    pub fn is_clean(&self) -> bool {
        self.state == RunState::Completed && self.errors.is_empty()
    }

    /// Files that went through the pipeline (successful or not).
    pub fn processed(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Throughput in files per second.
    pub fn files_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.processed() as f64 / secs
        } else {
            0.0
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs.max(0.0)))
    }
}
