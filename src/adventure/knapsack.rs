use crate::{
    error::AdventureError,
    types::{BottomlessBag, Egg, SyncUnsafeCell},
};
use core::ops::Range;

/// Row-major `rows x columns` knapsack table. Cell `(p, a)` holds the best
/// weight reachable with the first `p` eggs and capacity `a`; row 0 is all
/// zeros.
///
/// Cells are individually `Sync` so that column segments of one row can be
/// filled by different workers. Exclusive ownership (`&mut self`) gives safe
/// access; shared access goes through `relax_segment`.
#[derive(Debug)]
pub(crate) struct DpTable {
    cells: Box<[SyncUnsafeCell<u64>]>,
    rows: usize,
    columns: usize,
}

impl DpTable {
    /// Allocate a zeroed table for `eggs` eggs and the given capacity.
    pub(crate) fn try_new(eggs: usize, capacity: usize) -> Result<Self, AdventureError> {
        let rows = eggs.saturating_add(1);
        let columns = capacity.saturating_add(1);
        let too_large = || AdventureError::TableTooLarge { rows, columns };
        if eggs == usize::MAX || capacity == usize::MAX {
            return Err(too_large());
        }
        let len = rows.checked_mul(columns).ok_or_else(too_large)?;
        let mut cells = Vec::new();
        cells.try_reserve_exact(len)?;
        cells.resize_with(len, || SyncUnsafeCell::new(0));
        Ok(Self {
            cells: cells.into_boxed_slice(),
            rows,
            columns,
        })
    }

    pub(crate) const fn columns(&self) -> usize {
        self.columns
    }

    /// Fill row `row` from row `row - 1`.
    ///
    /// # Errors
    /// `AdventureError::WeightOverflow`, see `relax_segment`.
    pub(crate) fn relax_row(&mut self, row: usize, egg: Egg) -> Result<(), AdventureError> {
        let columns = 0..self.columns;
        // SAFETY: `&mut self` rules out any concurrent access.
        unsafe { self.relax_segment(row, egg, columns) }
    }

    /// Fill the `columns` segment of row `row` from row `row - 1`:
    /// a cell keeps the value above it unless taking `egg` into the remaining
    /// capacity is better.
    ///
    /// Every candidate is the weight of a subset that fits, so a candidate
    /// above `u64::MAX` means the optimum is not representable.
    ///
    /// # Errors
    /// `AdventureError::WeightOverflow` on the first such candidate. The rest
    /// of the segment is left unfilled.
    ///
    /// # Safety
    ///
    /// - Row `row - 1` is completely written, and nobody writes it during the
    ///   call.
    /// - Nobody else accesses the `columns` segment of row `row` during the
    ///   call.
    pub(crate) unsafe fn relax_segment(
        &self,
        row: usize,
        egg: Egg,
        columns: Range<usize>,
    ) -> Result<(), AdventureError> {
        assert!(
            (1..self.rows).contains(&row) && columns.end <= self.columns,
            "DpTable::relax_segment: [1]"
        );
        let width = self.columns;
        let prev = &self.cells[(row - 1) * width..row * width];
        let next = &self.cells[row * width..(row + 1) * width];
        for capacity in columns {
            // SAFETY: reads only touch the finished previous row; the write
            // targets a cell owned by the caller.
            unsafe {
                let skip = *prev[capacity].get();
                let best = match capacity.checked_sub(egg.size()) {
                    Some(rest) => {
                        let take = egg
                            .weight()
                            .checked_add(*prev[rest].get())
                            .ok_or(AdventureError::WeightOverflow)?;
                        skip.max(take)
                    }
                    None => skip,
                };
                *next[capacity].get() = best;
            }
        }
        Ok(())
    }

    fn value(&mut self, row: usize, capacity: usize) -> u64 {
        *self.cells[row * self.columns + capacity].get_mut()
    }

    /// Walk back from the bottom-right cell and pick the eggs of one optimal
    /// subset, last egg first.
    pub(crate) fn traceback(&mut self, eggs: &[Egg]) -> PackingPlan {
        assert_eq!(eggs.len() + 1, self.rows, "DpTable::traceback: [1]");
        let mut capacity = self.columns - 1;
        let best = self.value(eggs.len(), capacity);
        let mut remaining = best;
        let mut chosen = vec![];
        for row in (1..self.rows).rev() {
            if remaining == 0 {
                break;
            }
            if remaining != self.value(row - 1, capacity) {
                let egg = eggs[row - 1];
                chosen.push(row - 1);
                // `remaining` was `egg.weight()` plus a cell of the row above.
                remaining -= egg.weight();
                capacity -= egg.size();
            }
        }
        PackingPlan { best, chosen }
    }
}

/// The outcome of a knapsack run, applied to the bag only once complete.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct PackingPlan {
    best: u64,
    /// Indices into the egg sequence, in packing order.
    chosen: Vec<usize>,
}

impl PackingPlan {
    /// Put the chosen eggs into `bag` and return their weight.
    ///
    /// # Errors
    /// `AdventureError::WeightOverflow` if the bag's total weight would exceed
    /// `u64::MAX`. The bag is left untouched.
    pub(crate) fn apply(self, eggs: &[Egg], bag: &mut BottomlessBag) -> Result<u64, AdventureError> {
        if bag.total_weight().checked_add(self.best).is_none() {
            return Err(AdventureError::WeightOverflow);
        }
        for idx in self.chosen {
            bag.add_egg(eggs[idx]);
        }
        Ok(self.best)
    }
}

/// Single-threaded bottom-up knapsack.
pub(crate) fn plan_sequential(
    eggs: &[Egg],
    capacity: usize,
) -> Result<PackingPlan, AdventureError> {
    if eggs.is_empty() {
        return Ok(PackingPlan::default());
    }
    let mut table = DpTable::try_new(eggs.len(), capacity)?;
    for (row, &egg) in (1..).zip(eggs) {
        table.relax_row(row, egg)?;
    }
    Ok(table.traceback(eggs))
}
