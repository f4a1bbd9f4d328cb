//! Bounded-concurrency task dispatcher.
//!
//! The dispatcher runs a collection of [`WorkItem`]s on a fixed pool of
//! workers and collects one result per item. It keeps no state between runs.

mod pool;
mod types;

pub use pool::Dispatcher;
pub use types::{ItemFailure, ItemOutcome, ItemResult, JobError, JobFuture, WorkItem};
