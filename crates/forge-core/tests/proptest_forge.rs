//! Property-based tests for forge structure rules, scheduling and
//! persistence.
//!
//! Uses proptest to generate stacked structures, container contents and
//! location sets, then verify the invariants the engine relies on.

use forge_core::forge::Forge;
use forge_core::id::{Face, Location};
use forge_core::locator::{find_container, is_valid_structure};
use forge_core::material::Material;
use forge_core::persist::{ActiveStore, MemoryStore};
use forge_core::policy::{Durations, Policy};
use forge_core::registry::ActiveRegistry;
use forge_core::scheduler::TickScheduler;
use forge_core::test_utils::*;
use forge_core::world::{FUEL_SLOT, InventoryAccess};
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

const BASE_Y: i32 = 60;

/// A column of `depth + 1` processors on lava. Returns the top processor.
fn build_column(world: &mut MockWorld, x: i32, depth: i32) -> Location {
    world.set_block(loc(x, BASE_Y, 0), Material::StationaryLava);
    for dy in 0..=depth {
        world.set_processor(loc(x, BASE_Y + 1 + dy, 0), Face::North);
    }
    loc(x, BASE_Y + 1 + depth, 0)
}

fn arb_face() -> impl Strategy<Value = Face> {
    prop_oneof![
        Just(Face::North),
        Just(Face::East),
        Just(Face::South),
        Just(Face::West),
    ]
}

fn arb_fuel() -> impl Strategy<Value = Material> {
    prop_oneof![
        Just(Material::Coal),
        Just(Material::Charcoal),
        Just(Material::Log),
        Just(Material::Planks),
        Just(Material::BlazeRod),
    ]
}

fn arb_location() -> impl Strategy<Value = Location> {
    (
        prop_oneof![Just("world"), Just("world_nether"), Just("the_end")],
        -30_000_000..30_000_000i32,
        -64..320i32,
        -30_000_000..30_000_000i32,
    )
        .prop_map(|(w, x, y, z)| Location::new(w, x, y, z))
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// No limit at or below zero makes anything a forge.
    #[test]
    fn non_positive_limit_never_valid(depth in 0..6i32, limit in -10..=0i32) {
        let mut world = MockWorld::new();
        build_column(&mut world, 0, depth);
        for y in BASE_Y..=BASE_Y + 1 + depth {
            prop_assert!(!is_valid_structure(&world, &loc(0, y, 0), limit));
        }
    }

    /// A processor `depth` levels above the bottom of a column is valid
    /// exactly when the limit covers `depth + 1` processors.
    #[test]
    fn column_validity_tracks_limit(depth in 0..8i32, limit in 1..12i32) {
        let mut world = MockWorld::new();
        let top = build_column(&mut world, 0, depth);
        prop_assert_eq!(is_valid_structure(&world, &top, limit), limit >= depth + 1);
    }

    /// Descending through stacked forges costs no horizontal budget.
    #[test]
    fn descent_is_free(depth in 0..5i32, budget in -1..3i32, dir in arb_face()) {
        let mut world = MockWorld::new();
        let top = build_column(&mut world, 0, depth);
        let bottom = loc(0, BASE_Y + 1, 0);
        world.place_chest(bottom.relative(dir));

        let flat = find_container(&world, &bottom, dir, budget, depth + 1);
        let stacked = find_container(&world, &top, dir, budget, depth + 1);
        prop_assert_eq!(flat.is_some(), budget >= 1);
        prop_assert_eq!(stacked, flat);
    }

    /// Stepping sideways into a neighbouring forge costs one unit each.
    #[test]
    fn sideways_chain_costs_budget(hops in 0..4i32, budget in 0..5i32) {
        let mut world = MockWorld::new();
        for x in 0..=hops {
            build_column(&mut world, x, 0);
        }
        world.place_chest(loc(hops + 1, BASE_Y + 1, 0));

        let found = find_container(&world, &loc(0, BASE_Y + 1, 0), Face::East, budget, 3);
        prop_assert_eq!(found.is_some(), budget >= hops + 1);
    }

    /// Jittered periods stay inside `[task_period, task_period + max_jitter)`.
    #[test]
    fn jitter_within_bounds(seed in any::<u64>(), samples in 1..50usize) {
        let durations = Durations::default();
        prop_assert!(durations.task_period + durations.max_jitter < durations.burn_duration);

        let mut registry = ActiveRegistry::new(seed);
        for _ in 0..samples {
            let period = registry.jittered_period(&durations);
            prop_assert!(period >= durations.task_period);
            prop_assert!(period < durations.task_period + durations.max_jitter);
        }
    }

    /// Any run of activate/deactivate calls leaves one task per active
    /// forge and none for inactive ones.
    #[test]
    fn activation_is_idempotent(ops in proptest::collection::vec((0..4i32, any::<bool>()), 1..40)) {
        let mut registry = ActiveRegistry::new(3);
        let mut scheduler = TickScheduler::new();
        let durations = Durations::default();

        for (x, on) in ops {
            let forge = Forge::new(loc(x, 64, 0));
            if on {
                registry.activate(&forge, &durations, &mut scheduler);
                registry.activate(&forge, &durations, &mut scheduler);
            } else {
                registry.deactivate(&forge, &mut scheduler);
            }
            prop_assert_eq!(scheduler.recurring_count(), registry.len());
        }
        for x in 0..4 {
            let forge = Forge::new(loc(x, 64, 0));
            if let Some(entry) = registry.get(forge.location()) {
                prop_assert!(scheduler.is_scheduled(entry.task));
                let task = entry.task;
                registry.deactivate(&forge, &mut scheduler);
                prop_assert!(!scheduler.is_scheduled(task));
            }
        }
        prop_assert_eq!(scheduler.recurring_count(), 0);
    }

    /// Unloading fuel never destroys items, however full the input is.
    #[test]
    fn unload_conserves_fuel(
        fuel in arb_fuel(),
        quantity in 1..=64u32,
        prefill in 0..=CHEST_SLOTS,
    ) {
        let mut world = MockWorld::new();
        let at = build_forge(&mut world, loc(0, 64, 0), Face::North);
        let input = loc(1, 64, 0);
        world.place_chest(input.clone());
        for _ in 0..prefill {
            world.add_item(&input, stack(Material::Cobblestone, MAX_STACK));
        }
        world.set_slot(&at, FUEL_SLOT, Some(stack(fuel, quantity)));
        let before = world.total(fuel);

        let policy = Policy { require_fuel: true, ..Policy::default() };
        Forge::new(at.clone()).unload_fuel(&mut world, &policy);

        prop_assert_eq!(world.slot(&at, FUEL_SLOT), None);
        prop_assert_eq!(world.total(fuel), before);
    }

    /// Saving then restoring reproduces the same locations in order.
    #[test]
    fn save_restore_round_trip(locations in proptest::collection::vec(arb_location(), 0..32)) {
        let mut store = MemoryStore::new();
        prop_assert_eq!(store.save(&locations).unwrap(), locations.len());
        let outcome = store.load();
        prop_assert!(outcome.error.is_none());
        prop_assert_eq!(outcome.locations, locations);
    }
}
