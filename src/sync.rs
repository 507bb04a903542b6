#[cfg(feature = "loom")]
mod imp {
    pub(crate) use loom::sync::{
        Arc, Condvar, Mutex, MutexGuard,
        atomic::{AtomicBool, AtomicIsize, Ordering, fence},
    };
}

#[cfg(not(feature = "loom"))]
mod imp {
    pub(crate) use core::sync::atomic::{AtomicBool, AtomicIsize, Ordering, fence};
    pub(crate) use std::sync::{Arc, Condvar, Mutex, MutexGuard};
}

pub(crate) use imp::*;
use std::sync::{LockResult, PoisonError};

/// Lock recovery shared by the coordination primitives.
///
/// None of the guarded sections can leave their state half-updated, so a
/// poisoned lock is taken over as is. Task failures are reported through
/// `AdventureError` instead.
pub(crate) trait LockResultExt<G> {
    fn recover(self) -> G;
}

impl<G> LockResultExt<G> for LockResult<G> {
    #[inline]
    fn recover(self) -> G {
        self.unwrap_or_else(PoisonError::into_inner)
    }
}
