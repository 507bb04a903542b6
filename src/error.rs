use std::{any::Any, collections::TryReserveError};
use thiserror::Error;

/// Error kind for every fallible adventure operation.
///
/// Operations either complete with their documented guarantee or fail as a
/// whole; there is no partial-success mode.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AdventureError {
    /// A parallel strategy was requested with zero workers.
    #[error("worker count must be positive")]
    InvalidWorkerCount,
    /// The knapsack table size does not fit in `usize`.
    #[error("knapsack table of {rows} x {columns} cells is too large")]
    TableTooLarge {
        /// Number of table rows (eggs + 1).
        rows: usize,
        /// Number of table columns (capacity + 1).
        columns: usize,
    },
    /// The knapsack table could not be allocated.
    #[error("failed to allocate knapsack table")]
    TableAllocation(#[from] TryReserveError),
    /// The best packing weighs more than `u64::MAX`, or would push the bag's
    /// total weight past it.
    #[error("packed weight exceeds u64::MAX")]
    WeightOverflow,
    /// The worker pool could not be started.
    #[error("failed to start worker pool")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),
    /// A task submitted to the worker pool panicked.
    #[error("task panicked: {message}")]
    TaskPanicked {
        /// Panic payload, if it was a string.
        message: String,
    },
    /// A phase was abandoned because another participant failed.
    #[error("phase aborted after another task failed")]
    PhaseAborted,
    /// A task was dropped by the pool before producing a result.
    #[error("task was dropped before producing a result")]
    TaskLost,
}

impl AdventureError {
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => payload
                .downcast_ref::<&'static str>()
                .map_or_else(|| "<non-string panic payload>".to_owned(), |s| (*s).to_owned()),
        };
        Self::TaskPanicked { message }
    }

    /// Whether this error is only a consequence of a failure reported elsewhere.
    pub(crate) fn is_secondary(&self) -> bool {
        matches!(self, Self::PhaseAborted | Self::TaskLost)
    }
}
