//! Thread-safe accumulation of per-file outcomes into a `RunReport`.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::types::{Category, FileFailure, RunReport, RunState, WorkItem};

#[derive(Debug, Default)]
struct Tally {
    succeeded: usize,
    failed: usize,
    per_category: BTreeMap<Category, usize>,
    errors: Vec<FileFailure>,
}

/// Collects outcomes from all workers.
///
/// `record` may be called concurrently; `snapshot` is taken once every worker
/// has been joined.
#[derive(Debug)]
pub struct ResultAggregator {
    total: usize,
    tally: Mutex<Tally>,
}

impl ResultAggregator {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            tally: Mutex::new(Tally::default()),
        }
    }

    /// Fold one finished item into the tally.
    pub fn record(&self, item: &WorkItem) {
        let mut tally = self.tally.lock().unwrap_or_else(PoisonError::into_inner);

        *tally.per_category.entry(item.category()).or_insert(0) += 1;
        if item.succeeded() {
            tally.succeeded += 1;
        } else {
            tally.failed += 1;
            tally.errors.push(FileFailure {
                path: item.source_path.clone(),
                reason: item
                    .error
                    .clone()
                    .unwrap_or_else(|| "not relocated".to_string()),
            });
        }
    }

    /// Immutable report of everything recorded.
    pub fn snapshot(&self, state: RunState, elapsed: Duration) -> RunReport {
        let tally = self.tally.lock().unwrap_or_else(PoisonError::into_inner);
        let processed = tally.succeeded + tally.failed;

        let mut errors = tally.errors.clone();
        errors.sort_by(|a, b| a.path.cmp(&b.path));

        RunReport {
            total: self.total,
            succeeded: tally.succeeded,
            failed: tally.failed,
            not_processed: self.total.saturating_sub(processed),
            per_category: tally.per_category.clone(),
            errors,
            state,
            elapsed,
        }
    }
}
