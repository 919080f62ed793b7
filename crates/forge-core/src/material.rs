//! Block and item materials, item stacks, and the fixed smelting lookup.
//!
//! There is no recipe engine: a smeltable material has exactly one product,
//! and each product maps back to the single raw material it is made from.

use serde::{Deserialize, Serialize};

/// Every block or item kind the forge logic can encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Material {
    Air,

    // -- Structure blocks --
    Furnace,
    BurningFurnace,
    Lava,
    StationaryLava,
    Chest,

    // -- Smeltables and their products --
    IronOre,
    IronIngot,
    GoldOre,
    GoldIngot,
    DiamondOre,
    Diamond,
    Sand,
    Glass,
    Cobblestone,
    Stone,
    ClayBall,
    ClayBrick,
    Netherrack,
    NetherBrick,
    Cactus,
    GreenDye,
    Log,
    Charcoal,
    RawPorkchop,
    CookedPorkchop,
    RawBeef,
    CookedBeef,
    RawChicken,
    CookedChicken,
    RawFish,
    CookedFish,
    Potato,
    BakedPotato,

    // -- Fuels --
    Coal,
    Planks,
    Sapling,
    Stick,
    LavaBucket,
    BlazeRod,

    // -- Crafted fuels --
    Fence,
    WoodStairs,
    TrapDoor,
    WoodDoor,
    Torch,
    Workbench,

    // -- Other --
    Bucket,
}

/// Smeltable material and what it becomes.
const SMELTING: &[(Material, Material)] = &[
    (Material::IronOre, Material::IronIngot),
    (Material::GoldOre, Material::GoldIngot),
    (Material::DiamondOre, Material::Diamond),
    (Material::Sand, Material::Glass),
    (Material::Cobblestone, Material::Stone),
    (Material::ClayBall, Material::ClayBrick),
    (Material::Netherrack, Material::NetherBrick),
    (Material::Cactus, Material::GreenDye),
    (Material::Log, Material::Charcoal),
    (Material::RawPorkchop, Material::CookedPorkchop),
    (Material::RawBeef, Material::CookedBeef),
    (Material::RawChicken, Material::CookedChicken),
    (Material::RawFish, Material::CookedFish),
    (Material::Potato, Material::BakedPotato),
];

impl Material {
    /// A furnace block, lit or unlit.
    pub fn is_processor(self) -> bool {
        matches!(self, Material::Furnace | Material::BurningFurnace)
    }

    /// Lava, flowing or still.
    pub fn is_heat_source(self) -> bool {
        matches!(self, Material::Lava | Material::StationaryLava)
    }

    pub fn is_container(self) -> bool {
        self == Material::Chest
    }

    /// What this material becomes when smelted.
    pub fn smelt_result(self) -> Option<Material> {
        SMELTING
            .iter()
            .find(|(raw, _)| *raw == self)
            .map(|(_, product)| *product)
    }

    /// The raw material this product is smelted from.
    pub fn smelt_source(self) -> Option<Material> {
        SMELTING
            .iter()
            .find(|(_, product)| *product == self)
            .map(|(raw, _)| *raw)
    }

    pub fn is_smeltable(self) -> bool {
        self.smelt_result().is_some()
    }

    /// Whether this material burns in a furnace. Crafted wooden items only
    /// count when `allow_crafted` is set.
    pub fn is_fuel(self, allow_crafted: bool) -> bool {
        match self {
            Material::Coal
            | Material::Charcoal
            | Material::Log
            | Material::Planks
            | Material::Sapling
            | Material::Stick
            | Material::LavaBucket
            | Material::BlazeRod => true,
            Material::Fence
            | Material::WoodStairs
            | Material::TrapDoor
            | Material::WoodDoor
            | Material::Chest
            | Material::Torch
            | Material::Workbench => allow_crafted,
            _ => false,
        }
    }

    /// A smelting product that is itself fuel. When fuel is required it
    /// is routed back to the input container instead of the output.
    pub fn is_byproduct_fuel(self) -> bool {
        self == Material::Charcoal
    }
}

// ---------------------------------------------------------------------------
// ItemStack
// ---------------------------------------------------------------------------

/// A quantity of one material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub material: Material,
    pub quantity: u32,
}

impl ItemStack {
    pub fn new(material: Material, quantity: u32) -> Self {
        Self { material, quantity }
    }

    /// A copy of this stack with a different quantity.
    pub fn with_quantity(&self, quantity: u32) -> Self {
        Self {
            material: self.material,
            quantity,
        }
    }

    /// Air or a zero quantity. Hosts may report either for an empty slot.
    pub fn is_empty(&self) -> bool {
        self.material == Material::Air || self.quantity == 0
    }
}

/// Normalise a slot read: empty stacks become `None`.
pub fn occupied(stack: Option<ItemStack>) -> Option<ItemStack> {
    stack.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smelting_is_invertible() {
        for (raw, product) in SMELTING {
            assert_eq!(raw.smelt_result(), Some(*product));
            assert_eq!(product.smelt_source(), Some(*raw));
        }
    }

    #[test]
    fn products_are_not_smeltable() {
        assert!(!Material::IronIngot.is_smeltable());
        assert!(Material::IronOre.is_smeltable());
        assert_eq!(Material::Coal.smelt_result(), None);
    }

    #[test]
    fn crafted_fuel_needs_permission() {
        assert!(Material::Coal.is_fuel(false));
        assert!(Material::LavaBucket.is_fuel(false));
        assert!(!Material::Fence.is_fuel(false));
        assert!(Material::Fence.is_fuel(true));
        assert!(!Material::IronOre.is_fuel(true));
    }

    #[test]
    fn log_is_both_fuel_and_smeltable() {
        assert!(Material::Log.is_fuel(false));
        assert_eq!(Material::Log.smelt_result(), Some(Material::Charcoal));
        assert!(Material::Charcoal.is_byproduct_fuel());
    }

    #[test]
    fn structure_blocks() {
        assert!(Material::BurningFurnace.is_processor());
        assert!(Material::StationaryLava.is_heat_source());
        assert!(Material::Chest.is_container());
        assert!(!Material::Furnace.is_container());
    }

    #[test]
    fn empty_stacks_are_not_occupied() {
        assert_eq!(occupied(Some(ItemStack::new(Material::Air, 5))), None);
        assert_eq!(occupied(Some(ItemStack::new(Material::Coal, 0))), None);
        assert_eq!(
            occupied(Some(ItemStack::new(Material::Coal, 3))),
            Some(ItemStack::new(Material::Coal, 3))
        );
    }
}
