//! Shared test helpers for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`. [`MockWorld`]
//! is a sparse in-memory world that implements every host contract.

use crate::engine::ForgeEngine;
use crate::fixed::Ticks;
use crate::id::{Face, Location};
use crate::material::{ItemStack, Material};
use crate::persist::MemoryStore;
use crate::policy::Policy;
use crate::scheduler::TickScheduler;
use crate::world::{BlockQuery, IgnitionControl, InventoryAccess};
use std::collections::HashMap;

/// Slots in a chest.
pub const CHEST_SLOTS: usize = 27;
/// Slots in a furnace.
pub const FURNACE_SLOTS: usize = 3;
/// Largest stack a single slot holds.
pub const MAX_STACK: u32 = 64;

/// World name used by [`loc`].
pub const TEST_WORLD: &str = "world";

// ===========================================================================
// Constructors
// ===========================================================================

pub fn loc(x: i32, y: i32, z: i32) -> Location {
    Location::new(TEST_WORLD, x, y, z)
}

pub fn stack(material: Material, quantity: u32) -> ItemStack {
    ItemStack::new(material, quantity)
}

/// Place lava under `at` and a furnace facing `facing` on top of it.
pub fn build_forge(world: &mut MockWorld, at: Location, facing: Face) -> Location {
    world.set_block(at.below(), Material::StationaryLava);
    world.set_processor(at.clone(), facing);
    at
}

/// An engine with a tick scheduler and in-memory store, already enabled
/// against an empty store.
pub fn enabled_engine(policy: Policy) -> ForgeEngine<TickScheduler, MemoryStore> {
    let mut engine = ForgeEngine::new(policy, TickScheduler::new(), MemoryStore::new(), 7)
        .expect("test policy should validate");
    engine.enable().expect("fresh engine should enable");
    engine
}

// ===========================================================================
// MockWorld
// ===========================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FurnaceState {
    pub burning: bool,
    pub burn_time: Ticks,
    pub cook_time: Ticks,
}

/// Sparse block map with chest and furnace inventories.
#[derive(Debug, Default, Clone)]
pub struct MockWorld {
    blocks: HashMap<Location, Material>,
    facings: HashMap<Location, Face>,
    inventories: HashMap<Location, Vec<Option<ItemStack>>>,
    furnaces: HashMap<Location, FurnaceState>,
    dropped: Vec<(Location, ItemStack)>,
}

impl MockWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a plain block, removing any inventory previously there.
    pub fn set_block(&mut self, at: Location, material: Material) {
        self.inventories.remove(&at);
        self.facings.remove(&at);
        self.furnaces.remove(&at);
        if material == Material::Air {
            self.blocks.remove(&at);
        } else {
            self.blocks.insert(at, material);
        }
    }

    /// Place an unlit furnace with an empty three-slot inventory.
    pub fn set_processor(&mut self, at: Location, facing: Face) {
        self.set_block(at.clone(), Material::Furnace);
        self.facings.insert(at.clone(), facing);
        self.inventories.insert(at.clone(), vec![None; FURNACE_SLOTS]);
        self.furnaces.insert(at, FurnaceState::default());
    }

    pub fn place_chest(&mut self, at: Location) {
        self.set_block(at.clone(), Material::Chest);
        self.inventories.insert(at, vec![None; CHEST_SLOTS]);
    }

    /// Fill every empty slot of a chest with full stacks of `material`.
    pub fn fill_chest(&mut self, at: &Location, material: Material) {
        if let Some(slots) = self.inventories.get_mut(at) {
            for slot in slots.iter_mut().filter(|s| s.is_none()) {
                *slot = Some(ItemStack::new(material, MAX_STACK));
            }
        }
    }

    /// Total quantity of `material` in one inventory.
    pub fn count(&self, at: &Location, material: Material) -> u32 {
        self.inventories
            .get(at)
            .map(|slots| {
                slots
                    .iter()
                    .flatten()
                    .filter(|s| s.material == material)
                    .map(|s| s.quantity)
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Total quantity of `material` anywhere: inventories plus drops.
    pub fn total(&self, material: Material) -> u32 {
        let held: u32 = self.inventories.keys().map(|at| self.count(at, material)).sum();
        let dropped: u32 = self
            .dropped
            .iter()
            .filter(|(_, s)| s.material == material)
            .map(|(_, s)| s.quantity)
            .sum();
        held + dropped
    }

    pub fn dropped(&self) -> &[(Location, ItemStack)] {
        &self.dropped
    }

    pub fn furnace(&self, at: &Location) -> Option<FurnaceState> {
        self.furnaces.get(at).copied()
    }
}

impl BlockQuery for MockWorld {
    fn material_at(&self, at: &Location) -> Material {
        self.blocks.get(at).copied().unwrap_or(Material::Air)
    }

    fn facing(&self, at: &Location) -> Option<Face> {
        self.facings.get(at).copied()
    }
}

impl InventoryAccess for MockWorld {
    fn slot(&self, at: &Location, index: usize) -> Option<ItemStack> {
        self.inventories.get(at)?.get(index)?.clone()
    }

    fn set_slot(&mut self, at: &Location, index: usize, stack: Option<ItemStack>) {
        if let Some(slot) = self.inventories.get_mut(at).and_then(|s| s.get_mut(index)) {
            *slot = stack.filter(|s| !s.is_empty());
        }
    }

    fn add_item(&mut self, at: &Location, stack: ItemStack) -> Option<ItemStack> {
        let Some(slots) = self.inventories.get_mut(at) else {
            return Some(stack);
        };
        let mut left = stack.quantity;

        // Top up matching stacks first, then fill empty slots.
        for existing in slots.iter_mut().flatten() {
            if left == 0 {
                break;
            }
            if existing.material == stack.material && existing.quantity < MAX_STACK {
                let moved = left.min(MAX_STACK - existing.quantity);
                existing.quantity += moved;
                left -= moved;
            }
        }
        for slot in slots.iter_mut().filter(|s| s.is_none()) {
            if left == 0 {
                break;
            }
            let moved = left.min(MAX_STACK);
            *slot = Some(stack.with_quantity(moved));
            left -= moved;
        }

        (left > 0).then(|| stack.with_quantity(left))
    }

    fn contents(&self, at: &Location) -> Vec<Option<ItemStack>> {
        self.inventories.get(at).cloned().unwrap_or_default()
    }

    fn drop_item(&mut self, at: &Location, stack: ItemStack) {
        self.dropped.push((at.clone(), stack));
    }
}

impl IgnitionControl for MockWorld {
    fn burn_time(&self, at: &Location) -> Ticks {
        self.furnaces.get(at).map(|f| f.burn_time).unwrap_or(0)
    }

    fn set_burning(&mut self, at: &Location, burning: bool, burn_time: Ticks) {
        let Some(state) = self.furnaces.get_mut(at) else {
            return;
        };
        state.burning = burning;
        state.burn_time = burn_time;
        if let Some(block) = self.blocks.get_mut(at) {
            *block = if burning {
                Material::BurningFurnace
            } else {
                Material::Furnace
            };
        }
    }

    fn set_cook_time(&mut self, at: &Location, elapsed: Ticks) {
        if let Some(state) = self.furnaces.get_mut(at) {
            state.cook_time = elapsed;
        }
    }
}
