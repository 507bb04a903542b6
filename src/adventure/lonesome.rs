use crate::{
    adventure::{
        Adventure,
        knapsack::plan_sequential,
        quicksort::{PivotRng, quicksort},
    },
    config::AdventureConfig,
    error::AdventureError,
    types::{BottomlessBag, Egg},
};
use tracing::debug;

/// Single-threaded adventure. Also the reference the team strategy is
/// checked against.
#[must_use]
#[derive(Debug, Copy, Clone, Default)]
pub struct LonesomeAdventure {
    config: AdventureConfig,
}

impl LonesomeAdventure {
    /// Adventure with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adventure with a custom configuration.
    pub const fn with_config(config: AdventureConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub const fn config(&self) -> &AdventureConfig {
        &self.config
    }
}

/// Greatest crystal of the sequence, `C::default()` for an empty one.
pub(super) fn shiniest<'a, C>(crystals: impl IntoIterator<Item = &'a C>) -> C
where
    C: Ord + Default + Clone + 'a,
{
    let mut best = C::default();
    for crystal in crystals {
        if best < *crystal {
            best = crystal.clone();
        }
    }
    best
}

impl Adventure for LonesomeAdventure {
    fn pack_eggs(&self, eggs: Vec<Egg>, bag: &mut BottomlessBag) -> Result<u64, AdventureError> {
        let capacity = bag.remaining_capacity();
        debug!(eggs = eggs.len(), capacity, "packing eggs alone");
        let plan = plan_sequential(&eggs, capacity)?;
        plan.apply(&eggs, bag)
    }

    fn arrange_sand<G>(&self, grains: &mut [G]) -> Result<(), AdventureError>
    where
        G: Ord + Send + 'static,
    {
        let mut rng = PivotRng::new(self.config.invocation_seed());
        quicksort(grains, &mut rng);
        Ok(())
    }

    fn select_best_crystal<C>(&self, crystals: &[C]) -> Result<C, AdventureError>
    where
        C: Ord + Default + Clone + Send + Sync + 'static,
    {
        Ok(shiniest(crystals))
    }
}
