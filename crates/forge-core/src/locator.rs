//! Structure detection and container routing.
//!
//! A forge is a processor block sitting on a heat source, or on another
//! forge, up to the vertical stacking limit. Containers are found beside a
//! forge, beside any forge it is stacked on, or beside forges chained
//! sideways up to the horizontal stacking limit.

use crate::id::{Face, Location};
use crate::policy::Policy;
use crate::world::BlockQuery;

/// Whether `at` is a valid forge, allowing `vertical_limit` processors in
/// the column down to and including this one.
pub fn is_valid_structure<W: BlockQuery + ?Sized>(
    world: &W,
    at: &Location,
    vertical_limit: i32,
) -> bool {
    if !world.material_at(at).is_processor() {
        return false;
    }
    if vertical_limit <= 0 {
        return false;
    }
    let below = at.below();
    world.material_at(&below).is_heat_source()
        || is_valid_structure(world, &below, vertical_limit - 1)
}

/// Search for a container reachable from the forge at `at` in `direction`.
///
/// Descending through a stacked forge is free; stepping sideways into an
/// adjacent forge costs one unit of `horizontal_limit`.
pub fn find_container<W: BlockQuery + ?Sized>(
    world: &W,
    at: &Location,
    direction: Face,
    horizontal_limit: i32,
    vertical_limit: i32,
) -> Option<Location> {
    if horizontal_limit <= 0 {
        return None;
    }

    let adjacent = at.relative(direction);
    if world.material_at(&adjacent).is_container() {
        return Some(adjacent);
    }

    let below = at.below();
    if is_valid_structure(world, &below, vertical_limit) {
        return find_container(world, &below, direction, horizontal_limit, vertical_limit);
    }

    if is_valid_structure(world, &adjacent, vertical_limit) {
        return find_container(world, &adjacent, direction, horizontal_limit - 1, vertical_limit);
    }

    None
}

// ---------------------------------------------------------------------------
// StructureLocator
// ---------------------------------------------------------------------------

/// The locator functions bound to a policy's stacking limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructureLocator {
    pub vertical_limit: i32,
    pub horizontal_limit: i32,
}

impl StructureLocator {
    pub fn new(vertical_limit: i32, horizontal_limit: i32) -> Self {
        Self {
            vertical_limit,
            horizontal_limit,
        }
    }

    pub fn from_policy(policy: &Policy) -> Self {
        Self::new(policy.max_stack_vertical, policy.max_stack_horizontal)
    }

    pub fn is_valid<W: BlockQuery + ?Sized>(&self, world: &W, at: &Location) -> bool {
        is_valid_structure(world, at, self.vertical_limit)
    }

    pub fn find_container<W: BlockQuery + ?Sized>(
        &self,
        world: &W,
        at: &Location,
        direction: Face,
    ) -> Option<Location> {
        find_container(world, at, direction, self.horizontal_limit, self.vertical_limit)
    }

    /// The container on the forge's right-hand side (clockwise from facing).
    pub fn input_container<W: BlockQuery + ?Sized>(
        &self,
        world: &W,
        at: &Location,
    ) -> Option<Location> {
        let facing = world.facing(at)?;
        self.find_container(world, at, facing.clockwise())
    }

    /// The container on the forge's left-hand side (counter-clockwise).
    pub fn output_container<W: BlockQuery + ?Sized>(
        &self,
        world: &W,
        at: &Location,
    ) -> Option<Location> {
        let facing = world.facing(at)?;
        self.find_container(world, at, facing.counter_clockwise())
    }
}
