//! Bounded work queue shared by a pool of workers.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Create a bounded work queue.
///
/// When the buffer is full, the sender waits, so the dispatcher never runs
/// further ahead of the workers than `capacity` items.
pub fn work_queue<T>(capacity: usize) -> (mpsc::Sender<T>, SharedReceiver<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (tx, SharedReceiver::new(rx))
}

/// Receiving end of a work queue that many workers pull from.
///
/// Each item is delivered to exactly one worker.
pub struct SharedReceiver<T> {
    inner: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for SharedReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> SharedReceiver<T> {
    fn new(rx: mpsc::Receiver<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(rx)),
        }
    }

    /// Pull the next item, or `None` once the sender is gone and the queue
    /// is drained.
    pub async fn recv(&self) -> Option<T> {
        self.inner.lock().await.recv().await
    }
}
