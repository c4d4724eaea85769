//! Classification of probed metadata into a destination category.
//!
//! Size tier first, quality override second, shape orthogonal. Pure: no I/O,
//! same answer for the same inputs.

use crate::config::{ClassificationConfig, SizeRule};
use crate::types::{Category, Classification, ImageMetadata, Shape};

/// Maps image metadata to a `Classification` using configured thresholds.
#[derive(Debug, Clone)]
pub struct Classifier {
    config: ClassificationConfig,
}

impl Classifier {
    pub fn new(config: ClassificationConfig) -> Self {
        Self { config }
    }

    /// Classify a probed file.
    ///
    /// `None` means the probe failed upstream; such files, and files with a
    /// zero dimension, are always `Error` and carry no shape.
    pub fn classify(&self, metadata: Option<&ImageMetadata>) -> Classification {
        let Some(meta) = metadata else {
            return Classification::ERROR;
        };
        if meta.width_px == 0 || meta.height_px == 0 {
            return Classification::ERROR;
        }

        let tier = self.size_tier(meta);
        let category = if tier == Category::XLarge && self.meets_quality_gate(meta) {
            Category::BestQuality
        } else {
            tier
        };

        let shape = self
            .config
            .sort_by_shape
            .then(|| Shape::of(meta.width_px, meta.height_px));

        Classification::new(category, shape)
    }

    /// Size tier, first match wins; thresholds are inclusive lower bounds.
    fn size_tier(&self, meta: &ImageMetadata) -> Category {
        let large = self.config.large_pixel_threshold;
        let xl = self.config.xl_pixel_threshold;

        if meta.width_px < large && meta.height_px < large {
            return Category::Small;
        }

        let measured = match self.config.size_rule {
            SizeRule::MaxDimension => meta.max_dim(),
            SizeRule::BothDimensions => meta.min_dim(),
        };

        if measured >= xl {
            Category::XLarge
        } else if measured >= large {
            Category::Large
        } else {
            Category::Standard
        }
    }

    /// DPI and recency gate for the best-quality override.
    ///
    /// Unknown DPI never passes.
    fn meets_quality_gate(&self, meta: &ImageMetadata) -> bool {
        self.config.quality_sort
            && meta.dpi.is_some_and(|dpi| dpi >= self.config.dpi_threshold)
            && meta.modified_year() >= self.config.min_year
    }
}
