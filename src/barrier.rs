use crate::{
    error::AdventureError,
    sync::{Condvar, LockResultExt, Mutex, MutexGuard},
};
use core::num::NonZeroUsize;
use tracing::{trace, warn};

/// A barrier that resets itself after every phase.
///
/// Each of the `participants` calls `wait` once per phase. The last arrival
/// advances the generation and releases everybody; the arrival counter is
/// refilled in the same critical section, so an early arrival of phase `N + 1`
/// can never be mistaken for a late arrival of phase `N`. Waiters wake on the
/// generation changing, not on the counter.
///
/// A participant that cannot finish its phase poisons the barrier instead of
/// arriving, which releases every waiter of the current and all later phases
/// with `AdventureError::PhaseAborted`.
#[derive(Debug)]
pub struct ReusableBarrier {
    participants: usize,
    state: Mutex<BarrierState>,
    released: Condvar,
}

#[derive(Debug)]
struct BarrierState {
    /// Participants of the current phase that have not arrived yet.
    /// Always in `1..=participants` outside the critical section.
    remaining: usize,
    generation: u64,
    poisoned: bool,
}

/// Outcome of a successful `ReusableBarrier::wait`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BarrierWaitResult {
    leader: bool,
    generation: u64,
}

impl BarrierWaitResult {
    /// Whether this participant's arrival released the phase. Exactly one
    /// participant per phase is the leader.
    #[must_use]
    pub const fn is_leader(&self) -> bool {
        self.leader
    }

    /// Generation of the phase that was completed.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

impl ReusableBarrier {
    /// Create a barrier for `participants` parties.
    #[must_use]
    pub fn new(participants: NonZeroUsize) -> Self {
        Self {
            participants: participants.get(),
            state: Mutex::new(BarrierState {
                remaining: participants.get(),
                generation: 0,
                poisoned: false,
            }),
            released: Condvar::new(),
        }
    }

    /// Number of parties per phase.
    #[must_use]
    pub const fn participants(&self) -> usize {
        self.participants
    }

    /// Number of phases completed so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Whether the barrier was poisoned.
    #[must_use]
    pub fn is_poisoned(&self) -> bool {
        self.lock().poisoned
    }

    /// Arrive at the barrier and block until every participant of the current
    /// phase has arrived.
    ///
    /// # Errors
    /// `AdventureError::PhaseAborted` if the barrier is poisoned before the
    /// current phase completes.
    pub fn wait(&self) -> Result<BarrierWaitResult, AdventureError> {
        let mut state = self.lock();
        if state.poisoned {
            return Err(AdventureError::PhaseAborted);
        }
        let generation = state.generation;
        state.remaining = state
            .remaining
            .checked_sub(1)
            .expect("ReusableBarrier::wait: [1]");
        if state.remaining == 0 {
            state.generation = generation.wrapping_add(1);
            state.remaining = self.participants;
            drop(state);
            trace!(generation, "barrier phase released");
            self.released.notify_all();
            return Ok(BarrierWaitResult {
                leader: true,
                generation,
            });
        }
        while state.generation == generation && !state.poisoned {
            state = self.released.wait(state).recover();
        }
        if state.generation == generation {
            // Poisoned before our phase was released.
            return Err(AdventureError::PhaseAborted);
        }
        Ok(BarrierWaitResult {
            leader: false,
            generation,
        })
    }

    /// Release every current and future waiter with an error.
    pub fn poison(&self) {
        let mut state = self.lock();
        if !state.poisoned {
            state.poisoned = true;
            warn!(generation = state.generation, "barrier poisoned");
        }
        drop(state);
        self.released.notify_all();
    }

    /// Guard that poisons the barrier if dropped while the thread unwinds.
    ///
    /// Participants hold it across their phases so a panic in one of them
    /// cannot leave the others blocked forever.
    pub fn poison_on_unwind(&self) -> PoisonOnUnwind<'_> {
        PoisonOnUnwind { barrier: self }
    }

    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().recover()
    }
}

/// See `ReusableBarrier::poison_on_unwind`.
#[must_use]
#[derive(Debug)]
pub struct PoisonOnUnwind<'a> {
    barrier: &'a ReusableBarrier,
}

impl Drop for PoisonOnUnwind<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.barrier.poison();
        }
    }
}
