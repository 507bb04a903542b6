#![allow(missing_docs)]
#![cfg(not(feature = "loom"))]

use adventure::{
    Adventure, AdventureConfig, AnyAdventure, BottomlessBag, Crystal, Egg, GrainOfSand,
    LonesomeAdventure, TeamAdventure,
};
use core::num::NonZeroUsize;
use proptest::prelude::*;
use std::sync::OnceLock;

fn lonesome() -> LonesomeAdventure {
    LonesomeAdventure::with_config(AdventureConfig::default().with_seed(7))
}

/// One pool for the whole file; building a pool per proptest case is slow.
fn team() -> &'static TeamAdventure {
    static TEAM: OnceLock<TeamAdventure> = OnceLock::new();
    TEAM.get_or_init(|| {
        let config = AdventureConfig::default()
            .with_seed(7)
            .with_granularity(NonZeroUsize::new(2).unwrap());
        TeamAdventure::with_config(3, config).unwrap()
    })
}

fn both() -> [AnyAdventure; 2] {
    let config = AdventureConfig::default().with_seed(7);
    [
        AnyAdventure::new(adventure::Strategy::Lonesome, config).unwrap(),
        AnyAdventure::new(adventure::Strategy::Team { workers: 4 }, config).unwrap(),
    ]
}

fn brute_force(eggs: &[Egg], capacity: usize) -> u64 {
    (0u32..1 << eggs.len())
        .filter_map(|mask| {
            let chosen = eggs
                .iter()
                .enumerate()
                .filter(|(idx, _)| mask & (1 << idx) != 0)
                .map(|(_, egg)| egg);
            let (size, weight) = chosen.fold((0, 0), |(size, weight), egg| {
                (size + egg.size(), weight + egg.weight())
            });
            (size <= capacity).then_some(weight)
        })
        .max()
        .unwrap_or(0)
}

fn assert_bag_consistent(bag: &BottomlessBag, packed: u64) {
    assert!(bag.load() <= bag.capacity());
    assert_eq!(bag.load(), bag.eggs().iter().map(Egg::size).sum::<usize>());
    assert_eq!(bag.total_weight(), packed);
}

#[test]
fn classic_instance_packs_seven() {
    let eggs = vec![Egg::new(2, 3), Egg::new(3, 4), Egg::new(4, 5), Egg::new(5, 6)];
    for adventure in both() {
        let mut bag = BottomlessBag::new(5);
        assert_eq!(adventure.pack_eggs(eggs.clone(), &mut bag).unwrap(), 7);
        let mut sizes: Vec<_> = bag.eggs().iter().map(Egg::size).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, [2, 3], "{}", adventure.strategy());
    }
}

#[test]
fn no_eggs_leave_the_bag_untouched() {
    for adventure in both() {
        let mut bag = BottomlessBag::new(10);
        assert_eq!(adventure.pack_eggs(Vec::new(), &mut bag).unwrap(), 0);
        assert_eq!(bag, BottomlessBag::new(10));
    }
}

#[test]
fn small_sequence_is_sorted() {
    for adventure in both() {
        let mut grains: Vec<GrainOfSand> = [5, 3, 8, 1, 9, 2].into_iter().map(Into::into).collect();
        adventure.arrange_sand(&mut grains).unwrap();
        let grains: Vec<u64> = grains.into_iter().map(Into::into).collect();
        assert_eq!(grains, [1, 2, 3, 5, 8, 9], "{}", adventure.strategy());
    }
}

#[test]
fn no_crystals_yield_the_default() {
    for adventure in both() {
        assert_eq!(
            adventure.select_best_crystal::<Crystal>(&[]).unwrap(),
            Crystal::default()
        );
    }
}

#[test]
fn single_worker_team_matches_lonesome() {
    let config = AdventureConfig::default().with_seed(3);
    let alone = LonesomeAdventure::with_config(config);
    let team = TeamAdventure::with_config(1, config).unwrap();

    let eggs: Vec<Egg> = (0..25u64)
        .map(|i| Egg::new((i as usize * 5) % 11 + 1, (i * 29) % 17 + 1))
        .collect();
    let (mut bag_alone, mut bag_team) = (BottomlessBag::new(40), BottomlessBag::new(40));
    assert_eq!(
        alone.pack_eggs(eggs.clone(), &mut bag_alone).unwrap(),
        team.pack_eggs(eggs, &mut bag_team).unwrap()
    );
    assert_eq!(bag_alone, bag_team);

    let grains: Vec<i64> = (0..3_000).map(|i| (i * 7_919) % 1_013 - 500).collect();
    let (mut sorted_alone, mut sorted_team) = (grains.clone(), grains);
    alone.arrange_sand(&mut sorted_alone).unwrap();
    team.arrange_sand(&mut sorted_team).unwrap();
    assert_eq!(sorted_alone, sorted_team);

    let crystals: Vec<Crystal> = (0..500u64).map(|i| Crystal::from((i * 131) % 499)).collect();
    assert_eq!(
        alone.select_best_crystal(&crystals).unwrap(),
        team.select_best_crystal(&crystals).unwrap()
    );
}

#[test]
fn tracing_output_does_not_disturb_results() {
    let _guard = tracing::subscriber::set_default(
        tracing_subscriber::fmt()
            .with_env_filter("adventure=trace")
            .with_test_writer()
            .finish(),
    );
    let mut bag = BottomlessBag::new(11);
    let eggs = vec![Egg::new(5, 10), Egg::new(4, 40), Egg::new(6, 30), Egg::new(3, 50)];
    assert_eq!(team().pack_eggs(eggs, &mut bag).unwrap(), 90);
}

fn eggs_strategy(max_len: usize) -> impl Strategy<Value = Vec<Egg>> {
    prop::collection::vec((0usize..12, 0u64..50), 0..=max_len)
        .prop_map(|eggs| eggs.into_iter().map(|(size, weight)| Egg::new(size, weight)).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn packing_is_optimal(eggs in eggs_strategy(12), capacity in 0usize..40) {
        let expected = brute_force(&eggs, capacity);

        let mut alone = BottomlessBag::new(capacity);
        let packed = lonesome().pack_eggs(eggs.clone(), &mut alone).unwrap();
        prop_assert_eq!(packed, expected);
        assert_bag_consistent(&alone, packed);

        let mut together = BottomlessBag::new(capacity);
        let packed = team().pack_eggs(eggs, &mut together).unwrap();
        prop_assert_eq!(packed, expected);
        assert_bag_consistent(&together, packed);
    }

    #[test]
    fn team_packs_like_lonesome(eggs in eggs_strategy(60), capacity in 0usize..200) {
        let mut alone = BottomlessBag::new(capacity);
        let mut together = BottomlessBag::new(capacity);
        prop_assert_eq!(
            lonesome().pack_eggs(eggs.clone(), &mut alone).unwrap(),
            team().pack_eggs(eggs, &mut together).unwrap()
        );
    }

    #[test]
    fn sorting_permutes_into_order(grains in prop::collection::vec(any::<i16>(), 0..600)) {
        let mut expected = grains.clone();
        expected.sort();

        let mut alone = grains.clone();
        lonesome().arrange_sand(&mut alone).unwrap();
        prop_assert_eq!(&alone, &expected);

        let mut together = grains;
        team().arrange_sand(&mut together).unwrap();
        prop_assert_eq!(&together, &expected);

        team().arrange_sand(&mut together).unwrap();
        prop_assert_eq!(&together, &expected);
    }

    #[test]
    fn best_crystal_dominates(crystals in prop::collection::vec(any::<u32>(), 1..400)) {
        for best in [
            lonesome().select_best_crystal(&crystals).unwrap(),
            team().select_best_crystal(&crystals).unwrap(),
        ] {
            prop_assert!(crystals.iter().all(|crystal| *crystal <= best));
            prop_assert!(crystals.contains(&best));
        }
    }
}
