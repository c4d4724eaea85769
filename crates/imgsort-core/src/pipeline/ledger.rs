//! Shared registry of destination paths claimed during a run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::types::Classification;

use super::plan::PathPlanner;

/// Destinations reserved by workers, so two files never plan the same path.
///
/// Planning and reservation happen under one lock: a path is free when no
/// other file has reserved it and nothing exists there on disk.
#[derive(Debug, Default)]
pub struct DestinationLedger {
    reserved: Mutex<HashSet<PathBuf>>,
}

impl DestinationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan a destination for `source` and reserve it.
    pub fn reserve(
        &self,
        planner: &PathPlanner,
        source: &Path,
        classification: &Classification,
    ) -> PathBuf {
        let mut reserved = self.reserved.lock().unwrap_or_else(PoisonError::into_inner);
        let destination = planner.plan(source, classification, |path| {
            reserved.contains(path) || path.exists()
        });
        reserved.insert(destination.clone());
        destination
    }
}
