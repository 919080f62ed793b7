//! The forge handle and its per-visit resource flow.
//!
//! A [`Forge`] is only a location. Each step below reads the processor's
//! slots and the neighbouring containers fresh from the world, moves at
//! most one stack, and reports whether the forge can keep working.

use crate::id::Location;
use crate::locator::StructureLocator;
use crate::material::{ItemStack, occupied};
use crate::policy::Policy;
use crate::world::{FUEL_SLOT, PRODUCT_SLOT, RAW_SLOT, World};

/// Why a forge cannot keep working.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallReason {
    /// Product could not be moved out and the raw material waiting behind
    /// it would smelt into something else.
    ProductBlocked,
    /// The raw slot holds something that does not smelt.
    RawNotSmeltable,
    /// No input container is reachable.
    NoInputContainer,
    /// The input container has nothing smeltable.
    NoRawMaterial,
    /// The input container has nothing burnable.
    NoFuel,
}

/// Handle to a forge. Equal locations are the same forge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Forge {
    location: Location,
}

impl Forge {
    pub fn new(location: Location) -> Self {
        Self { location }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn is_valid<W: World + ?Sized>(&self, world: &W, policy: &Policy) -> bool {
        StructureLocator::from_policy(policy).is_valid(world, &self.location)
    }

    pub fn is_burning<W: World + ?Sized>(&self, world: &W) -> bool {
        world.burn_time(&self.location) > 0
    }

    pub fn input_container<W: World + ?Sized>(
        &self,
        world: &W,
        policy: &Policy,
    ) -> Option<Location> {
        StructureLocator::from_policy(policy).input_container(world, &self.location)
    }

    pub fn output_container<W: World + ?Sized>(
        &self,
        world: &W,
        policy: &Policy,
    ) -> Option<Location> {
        StructureLocator::from_policy(policy).output_container(world, &self.location)
    }

    // -- Ignition --

    /// Light the processor for a full burn duration.
    pub fn ignite<W: World + ?Sized>(&self, world: &mut W, policy: &Policy) {
        world.set_burning(&self.location, true, policy.durations.burn_duration);
    }

    /// Put the processor out immediately.
    pub fn douse<W: World + ?Sized>(&self, world: &mut W) {
        world.set_burning(&self.location, false, 0);
    }

    // -- Resource flow --

    /// Move finished product out of the product slot.
    ///
    /// Product goes to the output container, except byproduct fuel when fuel
    /// is required, which goes back to the input container. Anything that
    /// does not fit stays in the product slot; that only stalls the forge
    /// when the raw slot holds a material that smelts into something else.
    pub fn update_product<W: World + ?Sized>(
        &self,
        world: &mut W,
        policy: &Policy,
    ) -> Result<(), StallReason> {
        let Some(item) = occupied(world.slot(&self.location, PRODUCT_SLOT)) else {
            return Ok(());
        };
        world.clear_slot(&self.location, PRODUCT_SLOT);

        let dest = if policy.require_fuel && item.material.is_byproduct_fuel() {
            self.input_container(world, policy)
        } else {
            self.output_container(world, policy)
        };

        let Some(remains) = self.add_to(world, item, dest.as_ref(), false) else {
            return Ok(());
        };
        let leftover = remains.material;
        world.set_slot(&self.location, PRODUCT_SLOT, Some(remains));

        if let Some(raw) = occupied(world.slot(&self.location, RAW_SLOT)) {
            if raw.material.smelt_result() != Some(leftover) {
                return Err(StallReason::ProductBlocked);
            }
        }
        Ok(())
    }

    /// Refill an empty raw slot from the input container.
    ///
    /// Prefers the raw material of whatever is in the product slot, then
    /// falls back to the first smeltable stack. The whole stack is taken.
    pub fn update_raw_material<W: World + ?Sized>(
        &self,
        world: &mut W,
        policy: &Policy,
    ) -> Result<(), StallReason> {
        if let Some(raw) = occupied(world.slot(&self.location, RAW_SLOT)) {
            return if raw.material.is_smeltable() {
                Ok(())
            } else {
                Err(StallReason::RawNotSmeltable)
            };
        }

        let input = self
            .input_container(world, policy)
            .ok_or(StallReason::NoInputContainer)?;
        let contents = world.contents(&input);

        let wanted = occupied(world.slot(&self.location, PRODUCT_SLOT))
            .and_then(|product| product.material.smelt_source());
        let matching = wanted.and_then(|want| {
            contents
                .iter()
                .position(|s| s.as_ref().is_some_and(|s| !s.is_empty() && s.material == want))
        });
        let index = matching
            .or_else(|| {
                contents.iter().position(|s| {
                    s.as_ref()
                        .is_some_and(|s| !s.is_empty() && s.material.is_smeltable())
                })
            })
            .ok_or(StallReason::NoRawMaterial)?;

        let Some(stack) = contents[index].clone() else {
            return Err(StallReason::NoRawMaterial);
        };
        world.clear_slot(&input, index);
        world.set_slot(&self.location, RAW_SLOT, Some(stack));
        Ok(())
    }

    /// Refill an empty fuel slot from the input container.
    ///
    /// Takes a quarter of the first burnable stack (at least one item) so a
    /// single stack can feed several forges sharing the container.
    pub fn update_fuel<W: World + ?Sized>(
        &self,
        world: &mut W,
        policy: &Policy,
    ) -> Result<(), StallReason> {
        if occupied(world.slot(&self.location, FUEL_SLOT)).is_some() {
            return Ok(());
        }

        let input = self
            .input_container(world, policy)
            .ok_or(StallReason::NoInputContainer)?;
        let contents = world.contents(&input);

        let (index, stack) = contents
            .into_iter()
            .enumerate()
            .find_map(|(i, s)| {
                s.filter(|s| !s.is_empty() && s.material.is_fuel(policy.allow_crafted_fuel))
                    .map(|s| (i, s))
            })
            .ok_or(StallReason::NoFuel)?;

        let take = (stack.quantity / 4).max(1);
        let left = stack.quantity - take;
        world.set_slot(&input, index, (left > 0).then(|| stack.with_quantity(left)));
        world.set_slot(&self.location, FUEL_SLOT, Some(stack.with_quantity(take)));
        Ok(())
    }

    /// Empty the fuel slot back into the input container, dropping whatever
    /// does not fit. No items are lost.
    pub fn unload_fuel<W: World + ?Sized>(&self, world: &mut W, policy: &Policy) {
        let Some(fuel) = occupied(world.slot(&self.location, FUEL_SLOT)) else {
            return;
        };
        world.clear_slot(&self.location, FUEL_SLOT);
        let input = self.input_container(world, policy);
        let _ = self.add_to(world, fuel, input.as_ref(), true);
    }

    /// Move a stack into a container.
    ///
    /// Returns what could not be placed, or `None` if everything was placed
    /// or, with `drop_remains`, dropped at the forge.
    pub fn add_to<W: World + ?Sized>(
        &self,
        world: &mut W,
        item: ItemStack,
        container: Option<&Location>,
        drop_remains: bool,
    ) -> Option<ItemStack> {
        let remains = match container {
            Some(chest) if world.material_at(chest).is_container() => world.add_item(chest, item),
            _ => Some(item),
        };
        let remains = occupied(remains)?;
        if drop_remains {
            world.drop_item(&self.location, remains);
            None
        } else {
            Some(remains)
        }
    }
}
