mod knapsack;
mod lonesome;
mod quicksort;
mod team;

pub use crate::adventure::{lonesome::LonesomeAdventure, team::TeamAdventure};
use crate::{
    config::{AdventureConfig, Strategy},
    error::AdventureError,
    types::{BottomlessBag, Egg},
};

/// The three tasks of an adventure.
///
/// Both strategies compute identical results; they differ only in how the work
/// is executed. Every operation either completes with its guarantee or fails
/// as a whole, leaving no partial result behind (a failed sort may leave the
/// elements permuted, never added or lost).
pub trait Adventure {
    /// Pack a weight-maximal subset of `eggs` that fits into the bag's remaining
    /// capacity, and return the packed weight.
    ///
    /// Eggs are added to the bag only after the whole computation succeeded,
    /// in decreasing order of their index in `eggs`.
    ///
    /// # Errors
    /// - `AdventureError::TableTooLarge` / `AdventureError::TableAllocation` if
    ///   the table for `eggs.len() x capacity` cannot be allocated.
    /// - `AdventureError::WeightOverflow` if the best packing, or the bag's
    ///   total weight after packing it, exceeds `u64::MAX`. The bag is left
    ///   untouched.
    /// - Worker failures of a parallel strategy.
    fn pack_eggs(&self, eggs: Vec<Egg>, bag: &mut BottomlessBag) -> Result<u64, AdventureError>;

    /// Sort `grains` ascending, in place. Equal grains may be reordered.
    ///
    /// # Errors
    /// Worker failures of a parallel strategy.
    fn arrange_sand<G>(&self, grains: &mut [G]) -> Result<(), AdventureError>
    where
        G: Ord + Send + 'static;

    /// Return the greatest crystal, or `C::default()` if there is none.
    ///
    /// `C::default()` must be the least value of `C`; it seeds the search.
    ///
    /// # Errors
    /// Worker failures of a parallel strategy.
    fn select_best_crystal<C>(&self, crystals: &[C]) -> Result<C, AdventureError>
    where
        C: Ord + Default + Clone + Send + Sync + 'static;
}

/// Either strategy, selected at runtime.
#[derive(Debug)]
pub enum AnyAdventure {
    /// Single-threaded strategy.
    Lonesome(LonesomeAdventure),
    /// Worker-pool strategy.
    Team(TeamAdventure),
}

impl AnyAdventure {
    /// Build the requested strategy.
    ///
    /// # Errors
    /// See `TeamAdventure::with_config`.
    pub fn new(strategy: Strategy, config: AdventureConfig) -> Result<Self, AdventureError> {
        Ok(match strategy {
            Strategy::Lonesome => Self::Lonesome(LonesomeAdventure::with_config(config)),
            Strategy::Team { workers } => Self::Team(TeamAdventure::with_config(workers, config)?),
        })
    }

    /// The strategy this adventure runs with.
    #[must_use]
    pub fn strategy(&self) -> Strategy {
        match self {
            Self::Lonesome(_) => Strategy::Lonesome,
            Self::Team(team) => Strategy::Team {
                workers: team.workers(),
            },
        }
    }
}

impl Adventure for AnyAdventure {
    fn pack_eggs(&self, eggs: Vec<Egg>, bag: &mut BottomlessBag) -> Result<u64, AdventureError> {
        match self {
            Self::Lonesome(adventure) => adventure.pack_eggs(eggs, bag),
            Self::Team(adventure) => adventure.pack_eggs(eggs, bag),
        }
    }

    fn arrange_sand<G>(&self, grains: &mut [G]) -> Result<(), AdventureError>
    where
        G: Ord + Send + 'static,
    {
        match self {
            Self::Lonesome(adventure) => adventure.arrange_sand(grains),
            Self::Team(adventure) => adventure.arrange_sand(grains),
        }
    }

    fn select_best_crystal<C>(&self, crystals: &[C]) -> Result<C, AdventureError>
    where
        C: Ord + Default + Clone + Send + Sync + 'static,
    {
        match self {
            Self::Lonesome(adventure) => adventure.select_best_crystal(crystals),
            Self::Team(adventure) => adventure.select_best_crystal(crystals),
        }
    }
}
