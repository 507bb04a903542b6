use crate::{
    error::AdventureError,
    sync::{Arc, AtomicBool, AtomicIsize, Condvar, LockResultExt, Mutex, MutexGuard, Ordering, fence},
};
use core::panic::AssertUnwindSafe;
use std::panic;
use tracing::debug;

/// Value of the pending counter once the last task completed.
const DRAINED: isize = -1;

/// Completion tracker for a dynamically growing tree of tasks.
///
/// The pending counter starts at 1 for the root task. Every task that spawns a
/// child registers it (increment) before handing it off, and every task,
/// including the root, completes exactly once (decrement). Because a child is
/// registered while its parent is still pending, the counter can only reach
/// zero once the whole tree is done. The task that observes zero moves the
/// counter to `DRAINED` under the lock and wakes the waiter; that transition
/// happens exactly once.
///
/// Registration and completion are tied to `GroupTicket`s, so the protocol
/// cannot be unbalanced by callers.
#[derive(Debug)]
pub struct TaskGroup {
    pending: AtomicIsize,
    cancelled: AtomicBool,
    /// First failure reported by a task. Also the lock the waiter sleeps on.
    failure: Mutex<Option<AdventureError>>,
    drained: Condvar,
}

/// Proof that one task of a `TaskGroup` is pending.
///
/// Dropping the ticket completes the task. A ticket dropped during unwinding
/// also cancels the group.
#[must_use]
#[derive(Debug)]
pub struct GroupTicket {
    group: Arc<TaskGroup>,
}

impl TaskGroup {
    /// Create a group together with the ticket of its root task.
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (Arc<Self>, GroupTicket) {
        let group = Arc::new(Self {
            pending: AtomicIsize::new(1),
            cancelled: AtomicBool::new(false),
            failure: Mutex::new(None),
            drained: Condvar::new(),
        });
        let root = GroupTicket {
            group: Arc::clone(&group),
        };
        (group, root)
    }

    /// Block until every task of the group has completed.
    ///
    /// # Errors
    /// - The first failure reported by a task, if any.
    /// - `AdventureError::PhaseAborted` if the group was cancelled without a
    ///   reported failure.
    ///
    /// The recorded failure is handed out once; later calls on a failed group
    /// still fail, with `AdventureError::PhaseAborted`.
    pub fn wait(&self) -> Result<(), AdventureError> {
        let mut failure = self.lock();
        while self.pending.load(Ordering::Acquire) != DRAINED {
            failure = self.drained.wait(failure).recover();
        }
        match failure.take() {
            Some(err) => Err(err),
            None if self.is_cancelled() => Err(AdventureError::PhaseAborted),
            None => Ok(()),
        }
    }

    /// Whether every task has completed.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.pending.load(Ordering::Acquire) == DRAINED
    }

    /// Ask pending tasks to skip their work. Tasks already running finish.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether the group was cancelled or one of its tasks failed.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Record a task failure and cancel the group. Only the first failure is
    /// kept.
    pub fn fail(&self, err: AdventureError) {
        {
            let mut failure = self.lock();
            if failure.is_none() {
                debug!(error = %err, "task group failed");
                *failure = Some(err);
            }
        }
        self.cancel();
    }

    fn complete_one(&self) {
        if self.pending.fetch_sub(1, Ordering::Release) != 1 {
            return;
        }
        // Synchronize with every other task's completion before the waiter
        // observes the group as drained.
        fence(Ordering::Acquire);
        let _failure = self.lock();
        let previous = self.pending.fetch_sub(1, Ordering::AcqRel);
        assert_eq!(previous, 0, "TaskGroup::complete_one: [1]");
        self.drained.notify_all();
    }

    fn lock(&self) -> MutexGuard<'_, Option<AdventureError>> {
        self.failure.lock().recover()
    }
}

impl GroupTicket {
    /// Register a child task. Must be called before the child is handed off.
    pub fn fork(&self) -> GroupTicket {
        let previous = self.group.pending.fetch_add(1, Ordering::Relaxed);
        assert!(previous > 0, "GroupTicket::fork: [1]");
        GroupTicket {
            group: Arc::clone(&self.group),
        }
    }

    /// The group this ticket belongs to.
    #[must_use]
    pub fn group(&self) -> &TaskGroup {
        &self.group
    }

    /// Run the task's body and complete it.
    ///
    /// The body is skipped if the group is already cancelled. A panic in the
    /// body is caught and reported as the group's failure.
    pub fn run(self, work: impl FnOnce(&GroupTicket)) {
        if self.group.is_cancelled() {
            return;
        }
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| work(&self))) {
            self.group.fail(AdventureError::from_panic(payload));
        }
    }
}

impl Drop for GroupTicket {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.group.cancel();
        }
        self.group.complete_one();
    }
}
