//! Batch scheduling: a bounded worker pool pulling files from one queue.
//!
//! A run makes two passes over the same pool shape. The inspect pass reads
//! each file's header and classifies it; nothing on disk changes. Destinations
//! are then assigned in enumeration order, so collision suffixes depend only on
//! the input tree. The relocate pass moves each file to its assigned path.
//! In both passes the dispatcher feeds items batch by batch into a bounded
//! queue that at most `max_workers` tasks pull from. Cancellation is only
//! observed between files.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::RelocateError;
use crate::types::{Category, Classification, RunReport, RunState, WorkItem};

use super::aggregate::ResultAggregator;
use super::cancel::CancelSignal;
use super::channel::work_queue;
use super::classify::Classifier;
use super::ledger::DestinationLedger;
use super::plan::PathPlanner;
use super::probe::MetadataProbe;
use super::relocate::Relocator;

/// Per-file work executed by the scheduler.
#[async_trait]
pub trait ItemHandler: Send + Sync {
    /// Fill in metadata and classification. Must not touch the destination.
    async fn inspect(&self, item: WorkItem) -> WorkItem {
        item
    }

    /// Choose a destination for every inspected item.
    ///
    /// Called once per run from a blocking thread, with `items` in
    /// enumeration order.
    fn assign(&self, _items: &mut [WorkItem]) {}

    /// Move one item to its destination and hand it back with its outcome
    /// filled in.
    async fn relocate(&self, item: WorkItem) -> WorkItem;
}

/// Probe → classify → plan → relocate, split at the points the scheduler
/// needs.
pub struct SortStages {
    classifier: Classifier,
    planner: PathPlanner,
    relocator: Relocator,
    ledger: DestinationLedger,
}

impl SortStages {
    pub fn new(classifier: Classifier, planner: PathPlanner, relocator: Relocator) -> Self {
        Self {
            classifier,
            planner,
            relocator,
            ledger: DestinationLedger::new(),
        }
    }

    /// Read the header and classify. Blocking I/O, read-only.
    pub fn inspect(&self, mut item: WorkItem) -> WorkItem {
        match MetadataProbe::probe(&item.source_path) {
            Ok(metadata) => item.metadata = Some(metadata),
            Err(e) => {
                tracing::warn!("{e}");
                item.fail(e.to_string());
            }
        }
        item.classification = Some(self.classifier.classify(item.metadata.as_ref()));
        item
    }

    /// Plan and reserve a destination for each item, in slice order.
    pub fn assign(&self, items: &mut [WorkItem]) {
        for item in items.iter_mut() {
            let classification = *item.classification.get_or_insert(Classification::ERROR);
            let destination = self
                .ledger
                .reserve(&self.planner, &item.source_path, &classification);
            item.destination_path = Some(destination);
        }
    }

    /// Move the file to its assigned destination. Blocking I/O.
    pub fn relocate(&self, mut item: WorkItem) -> WorkItem {
        let source = item.source_path.clone();
        let classification = item.classification.unwrap_or(Classification::ERROR);
        let Some(destination) = item.destination_path.clone() else {
            item.fail("no destination assigned");
            return item;
        };

        match self.relocator.relocate(&source, &destination) {
            Ok(()) => {
                tracing::debug!(
                    "{:?} -> {} ({:?})",
                    source,
                    classification.category,
                    destination
                );
            }
            Err(e) => {
                tracing::error!("Failed: {:?} - {}", source, e);
                item.fail(e.to_string());
                if classification.category != Category::Error
                    && !matches!(e, RelocateError::SourceVanished(_))
                {
                    self.relocate_to_errors(&mut item);
                }
            }
        }

        item
    }

    /// Second chance for a file that could not reach its category folder.
    fn relocate_to_errors(&self, item: &mut WorkItem) {
        let source = item.source_path.clone();
        let fallback = self
            .ledger
            .reserve(&self.planner, &source, &Classification::ERROR);
        match self.relocator.relocate(&source, &fallback) {
            Ok(()) => {
                tracing::warn!("Moved {:?} to the errors folder instead", source);
                item.destination_path = Some(fallback);
            }
            Err(e) => tracing::error!("Could not move {:?} to the errors folder: {}", source, e),
        }
    }
}

/// Production handler: runs `SortStages` on the blocking thread pool.
pub struct SortHandler {
    stages: Arc<SortStages>,
}

impl SortHandler {
    /// Build every stage from the run configuration and resolved roots.
    pub fn new(config: &Config, input_root: PathBuf, destination_root: PathBuf) -> Self {
        let stages = SortStages::new(
            Classifier::new(config.classification.clone()),
            PathPlanner::new(input_root, destination_root, &config.layout),
            Relocator::new(&config.processing, &config.pipeline),
        );
        Self {
            stages: Arc::new(stages),
        }
    }

    async fn on_blocking_pool<F>(&self, item: WorkItem, stage: F) -> WorkItem
    where
        F: FnOnce(&SortStages, WorkItem) -> WorkItem + Send + 'static,
    {
        let index = item.index;
        let source = item.source_path.clone();
        let stages = self.stages.clone();

        match tokio::task::spawn_blocking(move || stage(&stages, item)).await {
            Ok(item) => item,
            Err(e) => {
                tracing::error!("Worker panicked on {:?}: {}", source, e);
                let mut item = WorkItem::new(index, source);
                item.fail(format!("worker panicked: {e}"));
                item
            }
        }
    }
}

#[async_trait]
impl ItemHandler for SortHandler {
    async fn inspect(&self, item: WorkItem) -> WorkItem {
        self.on_blocking_pool(item, |stages, item| stages.inspect(item))
            .await
    }

    fn assign(&self, items: &mut [WorkItem]) {
        self.stages.assign(items);
    }

    async fn relocate(&self, item: WorkItem) -> WorkItem {
        self.on_blocking_pool(item, |stages, item| stages.relocate(item))
            .await
    }
}

/// Split items into consecutive batches of at most `batch_size`.
pub fn partition(items: Vec<WorkItem>, batch_size: usize) -> Vec<Vec<WorkItem>> {
    let batch_size = batch_size.max(1);
    let mut batches = Vec::with_capacity(items.len().div_ceil(batch_size));
    let mut current = Vec::with_capacity(batch_size);
    for item in items {
        current.push(item);
        if current.len() == batch_size {
            batches.push(std::mem::replace(
                &mut current,
                Vec::with_capacity(batch_size),
            ));
        }
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

#[derive(Debug, Clone, Copy)]
enum Pass {
    Inspect,
    Relocate,
}

/// Runs a file list through a handler with bounded concurrency.
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    max_workers: usize,
    batch_size: usize,
}

impl BatchScheduler {
    pub fn new(max_workers: usize, batch_size: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            batch_size: batch_size.max(1),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.processing.max_workers, config.processing.batch_size)
    }

    /// Process every file and return the final report.
    ///
    /// `on_item` is called once per relocated item, from worker tasks.
    pub async fn run<F>(
        &self,
        files: Vec<PathBuf>,
        handler: Arc<dyn ItemHandler>,
        cancel: CancelSignal,
        on_item: F,
    ) -> RunReport
    where
        F: Fn(&WorkItem) + Send + Sync + 'static,
    {
        let start = Instant::now();
        let mut state = RunState::Idle;

        transition(&mut state, RunState::Enumerating);
        let items: Vec<WorkItem> = files
            .into_iter()
            .enumerate()
            .map(|(index, path)| WorkItem::new(index, path))
            .collect();
        let total = items.len();
        let aggregator = Arc::new(ResultAggregator::new(total));

        transition(&mut state, RunState::Dispatching);
        tracing::info!(
            "Sorting {} file(s) in batches of {} with {} worker(s)",
            total,
            self.batch_size,
            self.max_workers.min(total)
        );

        let inspected = Arc::new(Mutex::new(Vec::with_capacity(total)));
        let collect = {
            let inspected = inspected.clone();
            move |item: WorkItem| {
                inspected
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(item);
            }
        };
        let workers = self
            .dispatch(Pass::Inspect, items, &handler, &cancel, Arc::new(collect))
            .await;
        join(workers).await;

        let mut workers = Vec::new();
        if !cancel.is_cancelled() {
            let mut items =
                std::mem::take(&mut *inspected.lock().unwrap_or_else(PoisonError::into_inner));
            items.sort_by_key(|item| item.index);

            let assigner = handler.clone();
            let assigned = tokio::task::spawn_blocking(move || {
                assigner.assign(&mut items);
                items
            })
            .await;

            match assigned {
                Ok(items) => {
                    let record = {
                        let aggregator = aggregator.clone();
                        move |item: WorkItem| {
                            aggregator.record(&item);
                            on_item(&item);
                        }
                    };
                    workers = self
                        .dispatch(Pass::Relocate, items, &handler, &cancel, Arc::new(record))
                        .await;
                }
                Err(e) => tracing::error!("Destination planning failed: {e}"),
            }
        }

        transition(&mut state, RunState::Draining);
        join(workers).await;

        let final_state = if cancel.is_cancelled() {
            RunState::Cancelled
        } else {
            RunState::Completed
        };
        transition(&mut state, final_state);

        let report = aggregator.snapshot(state, start.elapsed());
        tracing::info!(
            "Run {:?}: {} succeeded, {} failed, {} not processed in {:.2}s",
            report.state,
            report.succeeded,
            report.failed,
            report.not_processed,
            report.elapsed.as_secs_f64()
        );
        report
    }

    /// Spawn the pool for one pass and feed it every item.
    ///
    /// Returns once the last item is queued or the run is cancelled; the
    /// caller joins the returned workers.
    async fn dispatch<D>(
        &self,
        pass: Pass,
        items: Vec<WorkItem>,
        handler: &Arc<dyn ItemHandler>,
        cancel: &CancelSignal,
        on_done: Arc<D>,
    ) -> Vec<JoinHandle<()>>
    where
        D: Fn(WorkItem) + Send + Sync + 'static,
    {
        let worker_count = self.max_workers.min(items.len());
        let batches = partition(items, self.batch_size);
        let batch_count = batches.len();

        let (tx, rx) = work_queue::<WorkItem>(worker_count);
        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let rx = rx.clone();
            let handler = handler.clone();
            let cancel = cancel.clone();
            let on_done = on_done.clone();

            workers.push(tokio::spawn(async move {
                let mut handled = 0usize;
                while !cancel.is_cancelled() {
                    let Some(item) = rx.recv().await else {
                        break;
                    };
                    if cancel.is_cancelled() {
                        // Claimed after cancellation: leave it unprocessed
                        break;
                    }
                    let done = match pass {
                        Pass::Inspect => handler.inspect(item).await,
                        Pass::Relocate => handler.relocate(item).await,
                    };
                    on_done(done);
                    handled += 1;
                }
                tracing::trace!("{pass:?} worker {worker_id} stopped after {handled} file(s)");
            }));
        }
        // Only workers hold the receiver; if they all stop, sends fail
        drop(rx);

        'dispatch: for (batch_no, batch) in batches.into_iter().enumerate() {
            tracing::debug!(
                "{:?}: dispatching batch {}/{} ({} file(s))",
                pass,
                batch_no + 1,
                batch_count,
                batch.len()
            );
            for item in batch {
                if cancel.is_cancelled() {
                    break 'dispatch;
                }
                if tx.send(item).await.is_err() {
                    break 'dispatch;
                }
            }
        }
        workers
    }
}

async fn join(workers: Vec<JoinHandle<()>>) {
    for worker in workers {
        if let Err(e) = worker.await {
            tracing::error!("Worker task failed: {e}");
        }
    }
}

fn transition(state: &mut RunState, next: RunState) {
    tracing::debug!("Scheduler state {:?} -> {:?}", state, next);
    *state = next;
}
