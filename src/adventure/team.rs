use crate::{
    adventure::{
        Adventure,
        knapsack::{DpTable, PackingPlan},
        lonesome::shiniest,
        quicksort::{PivotRng, partition, quicksort},
    },
    barrier::ReusableBarrier,
    config::AdventureConfig,
    error::AdventureError,
    group::{GroupTicket, TaskGroup},
    pool::{WorkerPool, join_all, try_join_all},
    sync::{LockResultExt, Mutex},
    types::{BottomlessBag, Egg, SharedSlice},
    utils::RangeSegments,
};
use core::{num::NonZeroUsize, ops::Range};
use derive_more::Debug;
use std::sync::Arc;
use tracing::{debug, trace};

/// Adventure run by a fixed pool of workers.
///
/// Coordination state (barrier, task group) is created per call, so one
/// adventure may serve concurrent calls.
#[must_use]
#[derive(Debug)]
pub struct TeamAdventure {
    config: AdventureConfig,
    pool: Arc<WorkerPool>,
    /// Knapsack workers block on their barrier and need the whole pool at
    /// once; two knapsack runs sharing the pool could starve each other.
    #[debug(skip)]
    knapsack_gate: Mutex<()>,
}

impl TeamAdventure {
    /// Adventure with `workers` threads and the default configuration.
    ///
    /// # Errors
    /// - `AdventureError::InvalidWorkerCount` if `workers` is zero.
    /// - `AdventureError::PoolBuild` if the threads cannot be started.
    pub fn new(workers: usize) -> Result<Self, AdventureError> {
        Self::with_config(workers, AdventureConfig::default())
    }

    /// Adventure with `workers` threads and a custom configuration.
    ///
    /// # Errors
    /// See `TeamAdventure::new`.
    pub fn with_config(workers: usize, config: AdventureConfig) -> Result<Self, AdventureError> {
        let workers = NonZeroUsize::new(workers).ok_or(AdventureError::InvalidWorkerCount)?;
        Ok(Self {
            config,
            pool: Arc::new(WorkerPool::new(workers)?),
            knapsack_gate: Mutex::new(()),
        })
    }

    /// Number of pool threads.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.pool.workers().get()
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &AdventureConfig {
        &self.config
    }

    /// Fill the table with one worker per column segment, row by row, and
    /// trace the optimal subset back once every row is done.
    fn plan_parallel(
        &self,
        eggs: Vec<Egg>,
        capacity: usize,
    ) -> Result<(PackingPlan, Arc<[Egg]>), AdventureError> {
        let eggs: Arc<[Egg]> = eggs.into();
        if eggs.is_empty() {
            return Ok((PackingPlan::default(), eggs));
        }
        let table = Arc::new(DpTable::try_new(eggs.len(), capacity)?);
        let segments: Vec<_> = (0..table.columns())
            .segments(self.pool.workers(), self.config.granularity())
            .collect();
        let participants =
            NonZeroUsize::new(segments.len()).expect("TeamAdventure::plan_parallel: [1]");
        let barrier = Arc::new(ReusableBarrier::new(participants));
        debug!(
            eggs = eggs.len(),
            capacity,
            segments = segments.len(),
            "packing eggs as a team"
        );

        let _gate = self.knapsack_gate.lock().recover();
        let handles: Vec<_> = segments
            .into_iter()
            .map(|segment| {
                let eggs = Arc::clone(&eggs);
                let table = Arc::clone(&table);
                let barrier = Arc::clone(&barrier);
                self.pool
                    .submit(move || fill_segment(&eggs, &table, &barrier, segment))
            })
            .collect();
        try_join_all(handles)?;

        // Every worker has finished and released its clone.
        let mut table = Arc::into_inner(table).expect("TeamAdventure::plan_parallel: [2]");
        Ok((table.traceback(&eggs), eggs))
    }
}

/// Body of one knapsack worker: its column segment of every row, with a
/// barrier phase between consecutive rows.
fn fill_segment(
    eggs: &[Egg],
    table: &DpTable,
    barrier: &ReusableBarrier,
    segment: Range<usize>,
) -> Result<(), AdventureError> {
    let _poison = barrier.poison_on_unwind();
    for (row, &egg) in (1..).zip(eggs) {
        // SAFETY:
        // - Row `row - 1` was completed by all participants before the previous
        //   barrier phase released us (row 0 is never written).
        // - Segments are disjoint, so this worker is the only one touching its
        //   cells of row `row`; nobody reads row `row` before the next phase.
        unsafe { table.relax_segment(row, egg, segment.clone()) }
            .inspect_err(|_| barrier.poison())?;
        barrier.wait()?;
    }
    trace!(?segment, "segment filled");
    Ok(())
}

/// One quicksort task: partitions its range, sorts small sides in place and
/// hands big sides to the pool as new tasks of the same group.
struct SortTask<G> {
    pool: Arc<WorkerPool>,
    grains: SharedSlice<G>,
    range: Range<usize>,
    seed: u64,
    granularity: usize,
}

impl<G: Ord + Send + 'static> SortTask<G> {
    fn submit(self, ticket: GroupTicket) {
        let pool = Arc::clone(&self.pool);
        pool.spawn(move || ticket.run(|ticket| self.run(ticket)));
    }

    fn run(self, ticket: &GroupTicket) {
        // SAFETY: the caller of `arrange_sand` keeps the slice borrowed until
        // the group drains, and ranges of pending tasks are pairwise disjoint:
        // a task only hands off sub-ranges of its own range, excluding the
        // pivot, and never touches them afterwards.
        let grains = unsafe { self.grains.slice_mut(self.range.clone()) };
        let mut rng = PivotRng::for_range(self.seed, &self.range);
        let pivot = partition(grains, &mut rng);
        let (lower, upper) = grains.split_at_mut(pivot);
        let upper = &mut upper[1..];
        let start = self.range.start;
        let sides = [
            (start..start + pivot, lower),
            (start + pivot + 1..self.range.end, upper),
        ];
        for (range, side) in sides {
            if range.len() > self.granularity {
                let child = SortTask {
                    pool: Arc::clone(&self.pool),
                    grains: self.grains,
                    range,
                    seed: self.seed,
                    granularity: self.granularity,
                };
                child.submit(ticket.fork());
            } else {
                quicksort(side, &mut rng);
            }
        }
    }
}

/// Chunk of crystals scanned by one task.
fn shiniest_in_chunk<C>(crystals: SharedSlice<C>, chunk: Range<usize>) -> C
where
    C: Ord + Default + Clone + Sync,
{
    // SAFETY: `select_best_crystal` keeps the slice borrowed, without writers,
    // until every chunk task has been joined.
    shiniest(unsafe { crystals.slice(chunk) })
}

impl Adventure for TeamAdventure {
    fn pack_eggs(&self, eggs: Vec<Egg>, bag: &mut BottomlessBag) -> Result<u64, AdventureError> {
        let (plan, eggs) = self.plan_parallel(eggs, bag.remaining_capacity())?;
        plan.apply(&eggs, bag)
    }

    fn arrange_sand<G>(&self, grains: &mut [G]) -> Result<(), AdventureError>
    where
        G: Ord + Send + 'static,
    {
        if grains.len() <= 1 {
            return Ok(());
        }
        let seed = self.config.invocation_seed();
        let shared = SharedSlice::new(grains);
        debug!(grains = shared.len(), seed, "arranging sand as a team");
        let (group, root) = TaskGroup::new();
        SortTask {
            pool: Arc::clone(&self.pool),
            grains: shared,
            range: 0..shared.len(),
            seed,
            granularity: self.config.granularity().get(),
        }
        .submit(root);
        group.wait()
    }

    fn select_best_crystal<C>(&self, crystals: &[C]) -> Result<C, AdventureError>
    where
        C: Ord + Default + Clone + Send + Sync + 'static,
    {
        let shared = SharedSlice::from_ref(crystals);
        let handles: Vec<_> = (0..crystals.len())
            .segments(self.pool.workers(), self.config.granularity())
            .map(|chunk| self.pool.submit(move || shiniest_in_chunk(shared, chunk)))
            .collect();
        debug!(crystals = crystals.len(), chunks = handles.len(), "selecting crystal as a team");
        let candidates = join_all(handles)?;
        Ok(shiniest(&candidates))
    }
}
