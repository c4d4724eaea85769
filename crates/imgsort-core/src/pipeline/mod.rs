//! Classification and relocation pipeline components.
//!
//! This module contains all the stages of the sorting pipeline:
//! - **discovery**: Find image files under the input root
//! - **probe**: Read dimensions, DPI and modification time
//! - **classify**: Map metadata to a category and shape
//! - **plan**: Compute a collision-free destination path
//! - **relocate**: Move or copy a file with verification
//! - **scheduler**: Run files through the stages on a bounded worker pool
//! - **aggregate**: Fold per-file outcomes into a report
//! - **channel**: Bounded work queue for backpressure

pub mod aggregate;
pub mod cancel;
pub mod channel;
pub mod classify;
pub mod discovery;
pub mod ledger;
pub mod plan;
pub mod probe;
pub mod relocate;
pub mod retry;
pub mod scheduler;

// Re-exports for convenient access
pub use aggregate::ResultAggregator;
pub use cancel::CancelSignal;
pub use classify::Classifier;
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use ledger::DestinationLedger;
pub use plan::PathPlanner;
pub use probe::MetadataProbe;
pub use relocate::Relocator;
pub use scheduler::{BatchScheduler, ItemHandler, SortHandler, SortStages};
