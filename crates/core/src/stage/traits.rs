//! Trait definitions for pipeline stages.

use async_trait::async_trait;
use std::time::Duration;

use super::types::{Batch, Candidate, StageError};
use crate::dispatcher::JobError;

/// One phase of the pipeline.
///
/// A stage knows how to discover its items and how to process a batch of
/// them. Skipping finished items, ledger checkpoints and dispatch are handled
/// by [`super::StageRunner`].
#[async_trait]
pub trait Stage: Send + Sync + 'static {
    /// Per-item data the stage needs to process a candidate.
    type Input: Send + Sync + 'static;

    /// Ledger namespace for this stage.
    fn name(&self) -> &str;

    /// Maximum parallel work items (0 = unbounded).
    fn concurrency(&self) -> usize;

    /// Optional bound on a single work item.
    fn timeout(&self) -> Option<Duration> {
        None
    }

    /// Discovers candidate items. Must be deterministic for the same external state.
    async fn enumerate(&self) -> Result<Vec<Candidate<Self::Input>>, StageError>;

    /// Groups the candidates left after skipping into dispatchable batches.
    fn plan(&self, candidates: Vec<Candidate<Self::Input>>) -> Vec<Batch<Self::Input>> {
        candidates.into_iter().map(Batch::single).collect()
    }

    /// Runs the external collaborator for one batch.
    async fn execute(&self, batch: &Batch<Self::Input>) -> Result<(), JobError>;
}
