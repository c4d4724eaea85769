//! imgsort core - classify images by their metadata and file them away.
//!
//! Every image under an input root is probed for its pixel dimensions, DPI
//! and modification time, classified into a size tier (or the best-quality
//! override), and moved or copied into a matching folder of the destination
//! tree.
//!
//! # Architecture
//!
//! ```text
//! Discover → Probe → Classify → Plan → Relocate → Aggregate → RunReport
//! ```
//!
//! Files run through the stages on a bounded pool of workers. A failing file
//! never stops the batch; it is filed under the errors folder when possible
//! and always listed in the report.
//!
//! # Usage
//!
//! ```rust,ignore
//! use imgsort_core::{CancelSignal, Config, ImageSorter};
//!
//! #[tokio::main]
//! async fn main() -> imgsort_core::Result<()> {
//!     let sorter = ImageSorter::new(Config::load()?)?;
//!     let report = sorter.run(CancelSignal::new()).await?;
//!     println!("{} sorted, {} failed", report.succeeded, report.failed);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, ProbeError, RelocateError, Result, SortError};
pub use output::{OutputFormat, OutputWriter};
pub use pipeline::{BatchScheduler, CancelSignal, DiscoveredFile, ItemHandler, SortHandler};
pub use types::{
    Category, Classification, ImageMetadata, RunReport, RunState, Shape, WorkItem,
};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pipeline::FileDiscovery;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Roots resolved and files discovered, ready to be sorted.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    /// Canonical input root
    pub input_root: PathBuf,
    /// Canonical destination root (created if missing)
    pub destination_root: PathBuf,
    /// Files to sort, in enumeration order
    pub files: Vec<DiscoveredFile>,
}

/// Image sorter - the main entry point.
pub struct ImageSorter {
    config: Arc<Config>,
}

impl ImageSorter {
    /// Create a sorter. Fails if the configuration is invalid.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        tracing::debug!("Initializing imgsort v{}", VERSION);
        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve both roots and discover the files to sort.
    ///
    /// Nothing under the input root is touched; the destination root is
    /// created if it does not exist yet.
    pub fn prepare(&self) -> Result<PreparedRun> {
        let input_root = resolve_input_root(&self.config.input_dir())?;
        let destination_root = prepare_destination_root(&self.config.destination_dir())?;

        if destination_root == input_root {
            return Err(SortError::DestinationRoot {
                path: destination_root,
                message: "destination must differ from the input root".to_string(),
            });
        }

        let files = FileDiscovery::new(&self.config.processing)
            .discover(&input_root, Some(&destination_root));
        tracing::info!(
            "Found {} image(s) in {:?} ({} bytes)",
            files.len(),
            input_root,
            FileDiscovery::total_size(&files)
        );

        Ok(PreparedRun {
            input_root,
            destination_root,
            files,
        })
    }

    /// Sort a prepared run, calling `on_item` as each file finishes.
    pub async fn execute<F>(&self, prepared: PreparedRun, cancel: CancelSignal, on_item: F) -> RunReport
    where
        F: Fn(&WorkItem) + Send + Sync + 'static,
    {
        let handler = Arc::new(SortHandler::new(
            &self.config,
            prepared.input_root,
            prepared.destination_root,
        ));
        let files = prepared.files.into_iter().map(|f| f.path).collect();

        BatchScheduler::from_config(&self.config)
            .run(files, handler, cancel, on_item)
            .await
    }

    /// Prepare and sort in one step.
    pub async fn run(&self, cancel: CancelSignal) -> Result<RunReport> {
        self.run_with_progress(cancel, |_| {}).await
    }

    /// Prepare and sort in one step, reporting each finished file.
    pub async fn run_with_progress<F>(&self, cancel: CancelSignal, on_item: F) -> Result<RunReport>
    where
        F: Fn(&WorkItem) + Send + Sync + 'static,
    {
        let prepared = self.prepare()?;
        Ok(self.execute(prepared, cancel, on_item).await)
    }
}

fn resolve_input_root(path: &Path) -> Result<PathBuf> {
    let resolved = std::fs::canonicalize(path).map_err(|e| SortError::InputRoot {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    if !resolved.is_dir() {
        return Err(SortError::InputRoot {
            path: path.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }
    Ok(resolved)
}

fn prepare_destination_root(path: &Path) -> Result<PathBuf> {
    let to_error = |e: std::io::Error| SortError::DestinationRoot {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    std::fs::create_dir_all(path).map_err(to_error)?;
    let resolved = std::fs::canonicalize(path).map_err(to_error)?;
    if !resolved.is_dir() {
        return Err(SortError::DestinationRoot {
            path: path.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(input: &Path, destination: &Path) -> Config {
        let mut config = Config::default();
        config.paths.input_dir = input.to_path_buf();
        config.paths.destination_dir = destination.to_path_buf();
        config
    }

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = Config::default();
        config.processing.max_workers = 0;
        assert!(matches!(
            ImageSorter::new(config),
            Err(SortError::Config(ConfigError::ValidationError(_)))
        ));
    }

    #[test]
    fn test_prepare_missing_input_root() {
        let dir = tempfile::tempdir().unwrap();
        let sorter =
            ImageSorter::new(config_for(&dir.path().join("nope"), &dir.path().join("out"))).unwrap();
        assert!(matches!(sorter.prepare(), Err(SortError::InputRoot { .. })));
        // Nothing was created for a run that never started
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_prepare_creates_destination() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("in")).unwrap();
        let sorter =
            ImageSorter::new(config_for(&dir.path().join("in"), &dir.path().join("out/sorted")))
                .unwrap();

        let prepared = sorter.prepare().unwrap();
        assert!(prepared.destination_root.is_dir());
        assert!(prepared.files.is_empty());
    }

    #[test]
    fn test_prepare_destination_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("in")).unwrap();
        std::fs::write(dir.path().join("out"), b"file").unwrap();
        let sorter =
            ImageSorter::new(config_for(&dir.path().join("in"), &dir.path().join("out"))).unwrap();
        assert!(matches!(
            sorter.prepare(),
            Err(SortError::DestinationRoot { .. })
        ));
    }

    #[test]
    fn test_prepare_rejects_same_roots() {
        let dir = tempfile::tempdir().unwrap();
        let sorter = ImageSorter::new(config_for(dir.path(), dir.path())).unwrap();
        assert!(matches!(
            sorter.prepare(),
            Err(SortError::DestinationRoot { .. })
        ));
    }

    #[tokio::test]
    async fn test_run_empty_input() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("in")).unwrap();
        let sorter =
            ImageSorter::new(config_for(&dir.path().join("in"), &dir.path().join("out"))).unwrap();

        let report = sorter.run(CancelSignal::new()).await.unwrap();
        assert_eq!(report.total, 0);
        assert!(report.is_clean());
    }
}
