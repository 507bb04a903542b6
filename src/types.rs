use core::{cell::UnsafeCell, marker::PhantomData, ops::Range};
use derive_more::{Deref, DerefMut, Display, From, Into};

/// An egg to be packed: occupies `size` units of capacity and contributes
/// `weight` to the collected total.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Egg {
    size: usize,
    weight: u64,
}

impl Egg {
    /// Create an egg of the given size and weight.
    #[must_use]
    pub const fn new(size: usize, weight: u64) -> Self {
        Self { size, weight }
    }

    /// Capacity units the egg occupies.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Weight the egg contributes when packed.
    #[must_use]
    pub const fn weight(&self) -> u64 {
        self.weight
    }
}

/// A bag of fixed capacity collecting eggs.
///
/// The summed size of the packed eggs never exceeds the capacity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BottomlessBag {
    capacity: usize,
    load: usize,
    weight: u64,
    eggs: Vec<Egg>,
}

impl BottomlessBag {
    /// Create an empty bag.
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            load: 0,
            weight: 0,
            eggs: Vec::new(),
        }
    }

    /// Total capacity of the bag.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Summed size of the packed eggs.
    #[must_use]
    pub const fn load(&self) -> usize {
        self.load
    }

    /// Capacity still available for packing.
    #[must_use]
    pub const fn remaining_capacity(&self) -> usize {
        self.capacity - self.load
    }

    /// Summed weight of the packed eggs. Never wraps: `add_egg` refuses eggs
    /// that would carry it past `u64::MAX`.
    #[must_use]
    pub const fn total_weight(&self) -> u64 {
        self.weight
    }

    /// Packed eggs in the order they were added.
    #[must_use]
    pub fn eggs(&self) -> &[Egg] {
        &self.eggs
    }

    /// Put an egg into the bag.
    ///
    /// # Panics
    /// - If the egg does not fit into the remaining capacity.
    /// - If the total weight would exceed `u64::MAX`.
    pub fn add_egg(&mut self, egg: Egg) {
        assert!(
            egg.size <= self.remaining_capacity(),
            "BottomlessBag::add_egg: egg of size {} exceeds remaining capacity {}",
            egg.size,
            self.remaining_capacity()
        );
        self.weight = self
            .weight
            .checked_add(egg.weight)
            .expect("BottomlessBag::add_egg: total weight exceeds u64::MAX");
        self.load += egg.size;
        self.eggs.push(egg);
    }
}

/// A grain of sand, ordered by its coarseness.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, From, Into, Display,
)]
pub struct GrainOfSand(u64);

/// A crystal, ordered by its shininess. The default crystal is the dullest.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, From, Into, Display,
)]
pub struct Crystal(u64);

/// A minimal `UnsafeCell` wrapper that is `Sync` when `T: Sync`.
///
/// Used for the knapsack table, where correctness is ensured by scheduling:
/// every cell has one writer, and readers of a row are separated from its
/// writers by a barrier phase.
#[derive(Debug, Deref, DerefMut)]
#[repr(transparent)]
pub(crate) struct SyncUnsafeCell<T>(UnsafeCell<T>);

// SAFETY: every cell has a single writer per row, and a row's readers are
// separated from its writers by a barrier phase.
unsafe impl<T: Sync> Sync for SyncUnsafeCell<T> {}

impl<T> SyncUnsafeCell<T> {
    pub(crate) const fn new(val: T) -> Self {
        Self(UnsafeCell::new(val))
    }
}

/// Lifetime-erased view of a slice handed to pool tasks.
///
/// Pool tasks must be `'static`, so borrowed input travels as a raw pointer.
/// Whoever creates the view must keep the borrow alive until every task holding
/// it has finished.
pub(crate) struct SharedSlice<T> {
    ptr: *mut T,
    len: usize,
    _marker: PhantomData<T>,
}

// SAFETY: the view only hands out disjoint `&mut` sub-slices (which move `T`
// across threads, hence `T: Send`) and `&` sub-slices that require `T: Sync`.
unsafe impl<T: Send> Send for SharedSlice<T> {}
unsafe impl<T: Send> Sync for SharedSlice<T> {}

impl<T> Clone for SharedSlice<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SharedSlice<T> {}

impl<T> SharedSlice<T> {
    pub(crate) fn new(slice: &mut [T]) -> Self {
        Self {
            ptr: slice.as_mut_ptr(),
            len: slice.len(),
            _marker: PhantomData,
        }
    }

    /// Read-only view. Only `slice` may be called on it.
    pub(crate) fn from_ref(slice: &[T]) -> Self {
        Self {
            ptr: slice.as_ptr().cast_mut(),
            len: slice.len(),
            _marker: PhantomData,
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    /// # Safety
    ///
    /// - The slice this view was created from with `new` is still borrowed by
    ///   the creator for at least `'a`.
    /// - No other access to any element of `range` happens during `'a`.
    pub(crate) unsafe fn slice_mut<'a>(self, range: Range<usize>) -> &'a mut [T] {
        assert!(
            range.start <= range.end && range.end <= self.len,
            "SharedSlice::slice_mut: [1]"
        );
        // SAFETY: `range` is in bounds of the viewed slice; exclusivity is
        // guaranteed by the caller.
        unsafe { core::slice::from_raw_parts_mut(self.ptr.add(range.start), range.len()) }
    }

    /// # Safety
    ///
    /// - The slice this view was created from is still borrowed by the creator
    ///   for at least `'a`.
    /// - Nobody mutates any element of `range` during `'a`.
    pub(crate) unsafe fn slice<'a>(self, range: Range<usize>) -> &'a [T]
    where
        T: Sync,
    {
        assert!(
            range.start <= range.end && range.end <= self.len,
            "SharedSlice::slice: [1]"
        );
        // SAFETY: `range` is in bounds of the viewed slice; absence of
        // writers is guaranteed by the caller.
        unsafe { core::slice::from_raw_parts(self.ptr.add(range.start), range.len()) }
    }
}
