use core::{mem, ops::Range};
use rand::{Rng, SeedableRng, rngs::SmallRng};

/// Source of random pivot positions.
#[derive(Debug, Clone)]
pub(crate) struct PivotRng(SmallRng);

impl PivotRng {
    pub(crate) fn new(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }

    /// Source for the task sorting `range` during the invocation seeded with
    /// `seed`. Independent of scheduling, so parallel sorts are reproducible.
    pub(crate) fn for_range(seed: u64, range: &Range<usize>) -> Self {
        let start = range.start as u64;
        let len = range.len() as u64;
        Self::new(
            seed ^ start.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ len.wrapping_mul(0xC2B2_AE3D_27D4_EB4F),
        )
    }

    fn pick(&mut self, len: usize) -> usize {
        self.0.gen_range(0..len)
    }
}

/// Lomuto partition of a non-empty slice around a uniformly random pivot.
///
/// Returns the pivot's final position: everything before it is less than the
/// pivot, everything after it is not.
pub(crate) fn partition<T: Ord>(grains: &mut [T], rng: &mut PivotRng) -> usize {
    assert!(!grains.is_empty(), "partition: [1]");
    let last = grains.len() - 1;
    grains.swap(last, rng.pick(grains.len()));
    let mut store = 0;
    for idx in 0..last {
        if grains[idx] < grains[last] {
            grains.swap(idx, store);
            store += 1;
        }
    }
    grains.swap(store, last);
    store
}

/// Randomized in-place quicksort.
///
/// Recurses into the smaller side and loops on the larger one, so the stack
/// depth stays logarithmic even when partitions degenerate.
pub(crate) fn quicksort<T: Ord>(grains: &mut [T], rng: &mut PivotRng) {
    let mut grains = grains;
    while grains.len() > 1 {
        let pivot = partition(grains, rng);
        let (lower, upper) = mem::take(&mut grains).split_at_mut(pivot);
        let upper = &mut upper[1..];
        if lower.len() < upper.len() {
            quicksort(lower, rng);
            grains = upper;
        } else {
            quicksort(upper, rng);
            grains = lower;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_splits_around_pivot() {
        let mut rng = PivotRng::new(3);
        for _ in 0..100 {
            let mut grains = [5, 3, 8, 1, 9, 2, 7, 7, 0];
            let pivot = partition(&mut grains, &mut rng);
            let value = grains[pivot];
            assert!(grains[..pivot].iter().all(|g| *g < value));
            assert!(grains[pivot + 1..].iter().all(|g| *g >= value));
        }
    }

    #[test]
    fn sorts_small_examples() {
        let mut rng = PivotRng::new(11);
        let mut grains = [5, 3, 8, 1, 9, 2];
        quicksort(&mut grains, &mut rng);
        assert_eq!(grains, [1, 2, 3, 5, 8, 9]);

        let mut empty: [u8; 0] = [];
        quicksort(&mut empty, &mut rng);

        let mut single = [4];
        quicksort(&mut single, &mut rng);
        assert_eq!(single, [4]);
    }

    #[test]
    fn survives_many_equal_elements() {
        let mut rng = PivotRng::new(0);
        let mut grains = vec![7u8; 5_000];
        grains.push(1);
        quicksort(&mut grains, &mut rng);
        assert_eq!(grains[0], 1);
        assert!(grains[1..].iter().all(|&g| g == 7));
    }

    #[test]
    fn same_seed_same_pivots() {
        let range = 10..50;
        let mut a = PivotRng::for_range(42, &range);
        let mut b = PivotRng::for_range(42, &range);
        for _ in 0..32 {
            assert_eq!(a.pick(40), b.pick(40));
        }
    }
}
