//! Sequential and parallel strategies for three classic tasks of an adventure.
//!
//! - Packing eggs into a bag of bounded capacity with maximum total weight
//!   (0/1 knapsack).
//! - Arranging grains of sand by a total order (randomized quicksort).
//! - Selecting the shiniest crystal (linear reduction).
//!
//! Both strategies implement the `Adventure` trait and compute identical
//! results; only the execution differs:
//! - `LonesomeAdventure` runs everything on the calling thread.
//! - `TeamAdventure` runs on a fixed `WorkerPool`. The knapsack table is filled
//!   by one worker per column segment, with a `ReusableBarrier` phase between
//!   consecutive rows. The sort fans out recursively, and completion of the
//!   dynamically growing task tree is detected by a `TaskGroup`. Crystals are
//!   scanned in independent chunks.
//!
//! Failures are never partial: a panicking worker fails the whole call, and
//! every waiter (barrier participants, task-group waiter) is released instead
//! of blocking forever.
//!
//! Key modules:
//! - `adventure`: the `Adventure` trait and both strategies.
//! - `barrier`, `group`, `pool`: the coordination primitives the team is built
//!   on. The first two are model-checked with `loom` under the `loom` feature.
//! - `config`: tunables (granularity threshold, pivot seed) and strategy
//!   selection.
//! - `types`: eggs, bags, grains and crystals.

/// The `Adventure` trait and its sequential and parallel strategies.
pub mod adventure;
/// Self-resetting barrier separating the phases of a fixed set of workers.
pub mod barrier;
/// Tunables shared by both strategies.
pub mod config;
/// Error type of every fallible operation.
pub mod error;
/// Completion tracking for recursively spawned tasks.
pub mod group;
/// Fixed-size worker pool with result handles.
pub mod pool;
mod sync;
/// Value types operated upon.
///
/// Only `Egg` and `BottomlessBag` are required by the strategies; any `Ord`
/// type can be sorted, and any `Ord + Default` type can be selected from.
pub mod types;
mod utils;

pub use crate::{
    adventure::{Adventure, AnyAdventure, LonesomeAdventure, TeamAdventure},
    config::{AdventureConfig, Strategy},
    error::AdventureError,
    types::{BottomlessBag, Crystal, Egg, GrainOfSand},
};
