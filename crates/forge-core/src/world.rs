//! Contracts the engine needs from the host world.
//!
//! The engine never caches world state: every operation reads block
//! materials, slot contents and burn state through these traits at the
//! moment it needs them.

use crate::fixed::Ticks;
use crate::id::{Face, Location};
use crate::material::{ItemStack, Material};

/// Processor slot holding the material being smelted.
pub const RAW_SLOT: usize = 0;
/// Processor slot holding fuel.
pub const FUEL_SLOT: usize = 1;
/// Processor slot holding finished product.
pub const PRODUCT_SLOT: usize = 2;

/// Read-only block lookups.
pub trait BlockQuery {
    /// The material of the block at `at`. Unloaded or empty space is `Air`.
    fn material_at(&self, at: &Location) -> Material;

    /// The direction a processor block faces, or `None` if the block has
    /// no facing.
    fn facing(&self, at: &Location) -> Option<Face>;
}

/// Slot-level access to block inventories (processors and containers).
pub trait InventoryAccess {
    /// The stack in a slot. `None` for an empty slot or a block without an
    /// inventory.
    fn slot(&self, at: &Location, index: usize) -> Option<ItemStack>;

    /// Replace the contents of a slot. `None` empties it.
    fn set_slot(&mut self, at: &Location, index: usize, stack: Option<ItemStack>);

    fn clear_slot(&mut self, at: &Location, index: usize) {
        self.set_slot(at, index, None);
    }

    /// Merge a stack into an inventory. Returns whatever did not fit.
    fn add_item(&mut self, at: &Location, stack: ItemStack) -> Option<ItemStack>;

    /// Every slot of an inventory, in slot order.
    fn contents(&self, at: &Location) -> Vec<Option<ItemStack>>;

    fn contains(&self, at: &Location, material: Material) -> bool {
        self.contents(at)
            .iter()
            .flatten()
            .any(|s| s.material == material && !s.is_empty())
    }

    /// Spill a stack into the world at a location.
    fn drop_item(&mut self, at: &Location, stack: ItemStack);
}

/// Privileged processor state that sits outside normal inventories.
pub trait IgnitionControl {
    /// Remaining burn time of a processor.
    fn burn_time(&self, at: &Location) -> Ticks;

    /// Set the lit flag and the remaining burn time together.
    fn set_burning(&mut self, at: &Location, burning: bool, burn_time: Ticks);

    /// Set the elapsed cook time of the item being smelted.
    fn set_cook_time(&mut self, at: &Location, elapsed: Ticks);
}

/// Everything the engine touches. Implemented automatically.
pub trait World: BlockQuery + InventoryAccess + IgnitionControl {}

impl<T: BlockQuery + InventoryAccess + IgnitionControl + ?Sized> World for T {}
