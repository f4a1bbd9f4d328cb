//! Bounded worker pool.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

use super::types::{ItemFailure, ItemOutcome, ItemResult, JobError, WorkItem};

/// Runs a batch of work items with at most `concurrency` jobs active at once.
///
/// A fixed set of workers pulls items from a shared queue and reports each
/// result to a collector. Failed or panicking jobs are reported as failures
/// and never cancel their siblings. Dropping the `run` future aborts the
/// workers.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    concurrency: usize,
}

impl Dispatcher {
    /// `concurrency == 0` means one worker per item.
    pub fn new(concurrency: usize) -> Self {
        Self { concurrency }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn worker_count(&self, items: usize) -> usize {
        if self.concurrency == 0 {
            items
        } else {
            self.concurrency.min(items)
        }
    }

    /// Runs every item and returns one result per item, in completion order.
    pub async fn run(&self, items: Vec<WorkItem>) -> Vec<ItemResult> {
        let total = items.len();
        if total == 0 {
            return Vec::new();
        }

        let workers = self.worker_count(total);
        let started = Instant::now();
        tracing::info!(items = total, workers, "Dispatching work items");

        let (queue_tx, queue_rx) = mpsc::unbounded_channel::<WorkItem>();
        for item in items {
            // The receiver is alive until the workers are spawned below.
            let _ = queue_tx.send(item);
        }
        drop(queue_tx);

        let queue = Arc::new(Mutex::new(queue_rx));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<ItemResult>();
        let mut pool = JoinSet::new();

        for worker_id in 0..workers {
            let queue = Arc::clone(&queue);
            let result_tx = result_tx.clone();
            pool.spawn(async move {
                loop {
                    let next = queue.lock().await.recv().await;
                    let Some(item) = next else {
                        break;
                    };
                    tracing::debug!(worker_id, key = %item.key(), "Job started");
                    let result = execute(item).await;
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        let mut results = Vec::with_capacity(total);
        while let Some(result) = result_rx.recv().await {
            results.push(result);
        }

        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Dispatcher worker terminated abnormally: {}", e);
            }
        }

        let failed = results.iter().filter(|r| r.is_err()).count();
        tracing::info!(
            items = total,
            succeeded = total - failed,
            failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Dispatch finished"
        );

        results
    }
}

async fn execute(item: WorkItem) -> ItemResult {
    let (key, job) = item.into_parts();
    let started = Instant::now();

    let outcome = AssertUnwindSafe(async move { job().await })
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(())) => {
            tracing::debug!(key = %key, "Job succeeded");
            Ok(ItemOutcome {
                key,
                elapsed: started.elapsed(),
            })
        }
        Ok(Err(error)) => {
            tracing::warn!(key = %key, "Job failed: {}", error);
            Err(ItemFailure { key, error })
        }
        Err(panic) => {
            let error = JobError::Panicked(panic_message(panic.as_ref()));
            tracing::error!(key = %key, "Job panicked: {}", error);
            Err(ItemFailure { key, error })
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
