use crate::error::AdventureError;
use core::{num::NonZeroUsize, panic::AssertUnwindSafe};
use crossbeam_channel::{Receiver, bounded};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::panic;
use tracing::{debug, error};

/// Fixed set of worker threads executing submitted units of work.
///
/// Accepts any number of submissions, from any thread including its own
/// workers. Panics inside submitted work never reach the pool threads: they
/// are captured and reported through the task's handle (or logged, for
/// detached work).
#[derive(Debug)]
pub struct WorkerPool {
    pool: ThreadPool,
    workers: NonZeroUsize,
}

/// Eventual result of a unit of work submitted with `WorkerPool::submit`.
#[must_use = "dropping a handle detaches the task"]
#[derive(Debug)]
pub struct TaskHandle<T> {
    outcome: Receiver<Result<T, AdventureError>>,
}

impl WorkerPool {
    /// Start `workers` threads.
    ///
    /// # Errors
    /// If the underlying threads cannot be spawned.
    pub fn new(workers: NonZeroUsize) -> Result<Self, AdventureError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.get())
            .thread_name(|idx| format!("adventure-worker-{idx}"))
            .build()?;
        debug!(workers = workers.get(), "worker pool started");
        Ok(Self { pool, workers })
    }

    /// Number of worker threads.
    #[must_use]
    pub const fn workers(&self) -> NonZeroUsize {
        self.workers
    }

    /// Queue `work` and return a handle to its result.
    pub fn submit<T, F>(&self, work: F) -> TaskHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = bounded(1);
        self.pool.spawn(move || {
            // `work` and everything it captured are dropped before the result is
            // published.
            let outcome = panic::catch_unwind(AssertUnwindSafe(work))
                .map_err(AdventureError::from_panic);
            // The handle may have been dropped; the result is simply discarded.
            let _ = tx.send(outcome);
        });
        TaskHandle { outcome: rx }
    }

    /// Queue `work` without a handle. Completion must be tracked by the work
    /// itself.
    pub fn spawn<F>(&self, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.pool.spawn(move || {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(work)) {
                error!(error = %AdventureError::from_panic(payload), "detached task panicked");
            }
        });
    }
}

impl<T> TaskHandle<T> {
    /// Block until the task has finished and return its result.
    ///
    /// # Errors
    /// `AdventureError::TaskPanicked` if the work panicked.
    pub fn join(self) -> Result<T, AdventureError> {
        self.outcome.recv().map_err(|_| AdventureError::TaskLost)?
    }
}

/// Join every handle, even after a failure, and return all results in order.
///
/// # Errors
/// The first primary failure among the tasks. A task that was only aborted as
/// a consequence of another task's failure is reported only if no primary
/// failure exists.
pub fn join_all<T>(
    handles: impl IntoIterator<Item = TaskHandle<T>>,
) -> Result<Vec<T>, AdventureError> {
    primary_outcome(handles.into_iter().map(TaskHandle::join))
}

/// `join_all` for fallible work: an error returned by the work counts like a
/// panic of the task.
///
/// # Errors
/// See `join_all`.
pub fn try_join_all<T>(
    handles: impl IntoIterator<Item = TaskHandle<Result<T, AdventureError>>>,
) -> Result<Vec<T>, AdventureError> {
    primary_outcome(handles.into_iter().map(|handle| handle.join().and_then(|res| res)))
}

/// Drain every outcome and keep the first primary failure.
fn primary_outcome<T>(
    outcomes: impl Iterator<Item = Result<T, AdventureError>>,
) -> Result<Vec<T>, AdventureError> {
    let mut results = Vec::with_capacity(outcomes.size_hint().0);
    let mut failure: Option<AdventureError> = None;
    for outcome in outcomes {
        match outcome {
            Ok(value) => results.push(value),
            Err(err) => {
                let keep_first = failure
                    .as_ref()
                    .is_some_and(|first| !first.is_secondary() || err.is_secondary());
                if !keep_first {
                    failure = Some(err);
                }
            }
        }
    }
    match failure {
        Some(err) => Err(err),
        None => Ok(results),
    }
}
