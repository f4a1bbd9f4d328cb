//! Generic stage driver.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use super::traits::Stage;
use super::types::{Batch, StageError, StageReport};
use crate::dispatcher::{Dispatcher, JobError, WorkItem};
use crate::ledger::{ItemKey, LedgerError, StatusLedger};

/// Drives one stage: enumerate, skip finished items, checkpoint the rest as
/// pending, dispatch, then close the ledger.
pub struct StageRunner<S: Stage> {
    stage: Arc<S>,
    ledger: Arc<StatusLedger>,
    dispatcher: Dispatcher,
}

impl<S: Stage> StageRunner<S> {
    pub fn new(stage: S, ledger: Arc<StatusLedger>) -> Self {
        let dispatcher = Dispatcher::new(stage.concurrency());
        Self {
            stage: Arc::new(stage),
            ledger,
            dispatcher,
        }
    }

    /// Overrides the dispatcher, e.g. to change the concurrency bound.
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn stage(&self) -> &S {
        &self.stage
    }

    /// Whether `key` is already complete for this stage.
    pub fn skip(&self, key: &ItemKey) -> Result<bool, LedgerError> {
        self.ledger.is_complete(key, self.stage.name())
    }

    /// Builds the work item for a batch. On success the job marks every
    /// member complete.
    pub fn build_job(&self, batch: Batch<S::Input>) -> WorkItem {
        let stage = Arc::clone(&self.stage);
        let ledger = Arc::clone(&self.ledger);
        let key = batch.key.clone();

        WorkItem::new(key, move || async move {
            let work = stage.execute(&batch);
            match stage.timeout() {
                Some(limit) => tokio::time::timeout(limit, work)
                    .await
                    .map_err(|_| JobError::Timeout { timeout: limit })??,
                None => work.await?,
            }

            for key in batch.keys() {
                ledger.log(key, stage.name(), true)?;
            }
            Ok::<(), JobError>(())
        })
    }

    /// Runs the stage to completion. The ledger is closed on every path.
    pub async fn run(self) -> Result<StageReport, StageError> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Runs the stage until it completes or `shutdown` resolves. On shutdown
    /// the in-flight work is dropped, the ledger is closed and the run returns
    /// [`StageError::Interrupted`]; unfinished items stay pending.
    pub async fn run_until<F>(self, shutdown: F) -> Result<StageReport, StageError>
    where
        F: Future<Output = ()>,
    {
        let result = {
            let dispatch = self.dispatch_pending();
            tokio::pin!(dispatch);
            tokio::select! {
                result = &mut dispatch => result,
                _ = shutdown => {
                    tracing::warn!(stage = self.stage.name(), "Stage run interrupted");
                    Err(StageError::Interrupted)
                }
            }
        };
        let closed = self.ledger.close();

        match (result, closed) {
            (Ok(report), Ok(())) => Ok(report),
            (Ok(_), Err(e)) => Err(e.into()),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                tracing::error!(stage = self.stage.name(), "Failed to close ledger: {}", close_err);
                Err(e)
            }
        }
    }

    async fn dispatch_pending(&self) -> Result<StageReport, StageError> {
        let name = self.stage.name().to_string();
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        tracing::info!(stage = %name, %run_id, "Stage run started");

        let candidates = self.stage.enumerate().await?;
        let enumerated = candidates.len();

        let mut pending = Vec::with_capacity(enumerated);
        for candidate in candidates {
            if self.skip(&candidate.key)? {
                tracing::debug!(stage = %name, key = %candidate.key, "Already complete, skipping");
            } else {
                pending.push(candidate);
            }
        }
        let skipped = enumerated - pending.len();

        for candidate in &pending {
            self.ledger.log(&candidate.key, &name, false)?;
        }

        let items: Vec<WorkItem> = self
            .stage
            .plan(pending)
            .into_iter()
            .map(|batch| self.build_job(batch))
            .collect();
        let dispatched = items.len();
        tracing::info!(stage = %name, enumerated, skipped, dispatched, "Dispatching stage");

        let results = self.dispatcher.run(items).await;

        let mut succeeded = 0;
        let mut failures = Vec::new();
        let mut ledger_error = None;
        for result in results {
            match result {
                Ok(_) => succeeded += 1,
                Err(failure) => {
                    tracing::warn!(stage = %name, key = %failure.key, "Item failed: {}", failure.error);
                    match failure.error {
                        JobError::Ledger(e) => {
                            ledger_error.get_or_insert(e);
                        }
                        _ => failures.push(failure),
                    }
                }
            }
        }

        // A lost complete write is fatal to the run, not to the item.
        if let Some(e) = ledger_error {
            tracing::error!(stage = %name, %run_id, "Ledger failed during dispatch: {}", e);
            return Err(StageError::Ledger(e));
        }

        let report = StageReport {
            stage: name,
            run_id,
            enumerated,
            skipped,
            dispatched,
            succeeded,
            failures,
            elapsed: started.elapsed(),
        };

        tracing::info!(
            stage = %report.stage,
            %run_id,
            succeeded = report.succeeded,
            failed = report.failed(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Stage run finished"
        );

        Ok(report)
    }
}
