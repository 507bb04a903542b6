use core::num::NonZeroUsize;
use derive_more::Display;

/// Minimum number of columns or elements worth a task of its own. Smaller
/// pieces of work run in place on the current worker.
pub const DEFAULT_GRANULARITY: NonZeroUsize = NonZeroUsize::new(8).unwrap();

/// Tunables shared by both strategies.
#[must_use]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AdventureConfig {
    granularity: NonZeroUsize,
    seed: Option<u64>,
}

impl Default for AdventureConfig {
    fn default() -> Self {
        Self {
            granularity: DEFAULT_GRANULARITY,
            seed: None,
        }
    }
}

impl AdventureConfig {
    /// Set the granularity threshold used for knapsack segments, crystal
    /// chunks, and the parallel/sequential crossover of the sort.
    pub const fn with_granularity(mut self, granularity: NonZeroUsize) -> Self {
        self.granularity = granularity;
        self
    }

    /// Pin the pivot random source, making sorts reproducible.
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Granularity threshold.
    #[must_use]
    pub const fn granularity(&self) -> NonZeroUsize {
        self.granularity
    }

    /// Pinned pivot seed, if any.
    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Seed for one sort invocation: the pinned one, or a fresh one.
    pub(crate) fn invocation_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }
}

/// Which strategy to run an adventure with.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
pub enum Strategy {
    /// Single-threaded.
    #[display("lonesome")]
    Lonesome,
    /// Fixed pool of `workers` threads.
    #[display("team({workers})")]
    Team {
        /// Number of pool threads, strictly positive.
        workers: usize,
    },
}
