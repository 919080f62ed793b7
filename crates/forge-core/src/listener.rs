//! Host event handlers.
//!
//! Each handler is called from inside the host's own event dispatch, so it
//! only reads the world; any mutation is deferred to the scheduler and runs
//! through [`ForgeEngine::run_task`] after the dispatch unwinds. Permission
//! checks stay with the host: handlers that return `true` tell the host a
//! forge is involved and its checks apply.

use crate::engine::{EngineError, ForgeEngine};
use crate::id::Location;
use crate::material::Material;
use crate::persist::ActiveStore;
use crate::scheduler::{ForgeTask, Scheduler};
use crate::world::World;

/// Cube radius around a heat-source ignition inside which forges suppress it.
pub const IGNITE_GUARD_RADIUS: i32 = 3;

impl<S: Scheduler, St: ActiveStore> ForgeEngine<S, St> {
    /// A block was placed. True when the placement forms a forge: a valid
    /// processor, or a heat source with a valid processor directly above.
    pub fn on_block_placed<W: World + ?Sized>(
        &self,
        world: &W,
        at: &Location,
        material: Material,
    ) -> Result<bool, EngineError> {
        self.ensure_enabled()?;
        let locator = self.locator();
        Ok(if material.is_processor() {
            locator.is_valid(world, at)
        } else if material.is_heat_source() {
            locator.is_valid(world, &at.above())
        } else {
            false
        })
    }

    /// A block is about to be broken. True when it is a forge.
    pub fn on_block_broken<W: World + ?Sized>(
        &self,
        world: &W,
        at: &Location,
    ) -> Result<bool, EngineError> {
        self.ensure_enabled()?;
        Ok(self.locator().is_valid(world, at))
    }

    /// A user struck a block. Queues a toggle if it is a forge.
    pub fn on_block_damaged<W: World + ?Sized>(
        &mut self,
        world: &W,
        at: &Location,
    ) -> Result<bool, EngineError> {
        self.ensure_enabled()?;
        if !self.locator().is_valid(world, at) {
            return Ok(false);
        }
        self.scheduler.defer(ForgeTask::Toggle(at.clone()));
        Ok(true)
    }

    /// Something is about to catch fire. True (suppress the ignition) when
    /// a heat source caused it and a forge lies within
    /// [`IGNITE_GUARD_RADIUS`] in every axis.
    pub fn on_block_ignite<W: World + ?Sized>(
        &self,
        world: &W,
        at: &Location,
        caused_by_heat_source: bool,
    ) -> Result<bool, EngineError> {
        self.ensure_enabled()?;
        if !caused_by_heat_source {
            return Ok(false);
        }
        let locator = self.locator();
        let r = IGNITE_GUARD_RADIUS;
        for dx in -r..=r {
            for dy in -r..=r {
                for dz in -r..=r {
                    let Some(near) = at.offset(dx, dy, dz) else {
                        continue;
                    };
                    if locator.is_valid(world, &near) {
                        tracing::debug!(at = %at, "ignition suppressed near forge");
                        return Ok(true);
                    }
                }
            }
        }
        Ok(false)
    }

    /// A processor started burning `fuel`. Queues the empty-bucket return
    /// for lava buckets, and a refuel check when fuel is required.
    pub fn on_fuel_burn<W: World + ?Sized>(
        &mut self,
        world: &W,
        at: &Location,
        fuel: Material,
    ) -> Result<(), EngineError> {
        self.ensure_enabled()?;
        if self.lookup(world, at).is_none() {
            return Ok(());
        }
        if fuel == Material::LavaBucket {
            self.scheduler.defer(ForgeTask::ReturnBucket(at.clone()));
        }
        if self.policy.require_fuel {
            self.scheduler.defer(ForgeTask::BurnUpdate(at.clone()));
        }
        Ok(())
    }

    /// A processor finished a smelt. Queues a smelt update if it is a forge.
    pub fn on_smelt<W: World + ?Sized>(
        &mut self,
        world: &W,
        at: &Location,
    ) -> Result<bool, EngineError> {
        self.ensure_enabled()?;
        if !self.locator().is_valid(world, at) {
            return Ok(false);
        }
        self.scheduler.defer(ForgeTask::SmeltUpdate(at.clone()));
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::Face;
    use crate::policy::Policy;
    use crate::scheduler::TickScheduler;
    use crate::test_utils::*;

    fn fuel_policy() -> Policy {
        Policy {
            require_fuel: true,
            ..Policy::default()
        }
    }

    fn drain(scheduler: &mut TickScheduler) -> Vec<ForgeTask> {
        scheduler.advance();
        std::iter::from_fn(|| scheduler.next_ready()).collect()
    }

    // -----------------------------------------------------------------------
    // Placement / breaking
    // -----------------------------------------------------------------------

    #[test]
    fn placing_processor_on_lava_forms_forge() {
        let mut world = MockWorld::new();
        let at = build_forge(&mut world, loc(0, 64, 0), Face::North);
        let engine = enabled_engine(Policy::default());
        assert!(engine.on_block_placed(&world, &at, Material::Furnace).unwrap());
    }

    #[test]
    fn placing_lava_under_processor_forms_forge() {
        let mut world = MockWorld::new();
        let at = build_forge(&mut world, loc(0, 64, 0), Face::North);
        let engine = enabled_engine(Policy::default());
        assert!(
            engine
                .on_block_placed(&world, &at.below(), Material::StationaryLava)
                .unwrap()
        );
    }

    #[test]
    fn placing_unrelated_block_is_ignored() {
        let mut world = MockWorld::new();
        world.place_chest(loc(0, 64, 0));
        let engine = enabled_engine(Policy::default());
        assert!(!engine.on_block_placed(&world, &loc(0, 64, 0), Material::Chest).unwrap());

        world.set_processor(loc(5, 64, 0), Face::North);
        assert!(!engine.on_block_placed(&world, &loc(5, 64, 0), Material::Furnace).unwrap());
    }

    #[test]
    fn breaking_reports_forges_only() {
        let mut world = MockWorld::new();
        let at = build_forge(&mut world, loc(0, 64, 0), Face::North);
        let engine = enabled_engine(Policy::default());
        assert!(engine.on_block_broken(&world, &at).unwrap());
        assert!(!engine.on_block_broken(&world, &at.below()).unwrap());
    }

    // -----------------------------------------------------------------------
    // Deferred work
    // -----------------------------------------------------------------------

    #[test]
    fn damage_defers_toggle() {
        let mut world = MockWorld::new();
        let at = build_forge(&mut world, loc(0, 64, 0), Face::North);
        let mut engine = enabled_engine(Policy::default());

        assert!(engine.on_block_damaged(&world, &at).unwrap());
        assert!(!engine.is_active(&at).unwrap());
        assert_eq!(drain(engine.scheduler_mut()), vec![ForgeTask::Toggle(at)]);
    }

    #[test]
    fn damage_to_plain_furnace_does_nothing() {
        let mut world = MockWorld::new();
        world.set_processor(loc(0, 64, 0), Face::North);
        let mut engine = enabled_engine(Policy::default());

        assert!(!engine.on_block_damaged(&world, &loc(0, 64, 0)).unwrap());
        assert_eq!(engine.scheduler().pending_deferred(), 0);
    }

    #[test]
    fn smelt_defers_smelt_update() {
        let mut world = MockWorld::new();
        let at = build_forge(&mut world, loc(0, 64, 0), Face::North);
        let mut engine = enabled_engine(Policy::default());

        assert!(engine.on_smelt(&world, &at).unwrap());
        assert_eq!(drain(engine.scheduler_mut()), vec![ForgeTask::SmeltUpdate(at)]);
    }

    #[test]
    fn lava_bucket_burn_defers_bucket_then_refuel() {
        let mut world = MockWorld::new();
        let at = build_forge(&mut world, loc(0, 64, 0), Face::North);
        let mut engine = enabled_engine(fuel_policy());

        engine.on_fuel_burn(&world, &at, Material::LavaBucket).unwrap();
        assert_eq!(
            drain(engine.scheduler_mut()),
            vec![ForgeTask::ReturnBucket(at.clone()), ForgeTask::BurnUpdate(at)]
        );
    }

    #[test]
    fn coal_burn_without_fuel_rule_defers_nothing() {
        let mut world = MockWorld::new();
        let at = build_forge(&mut world, loc(0, 64, 0), Face::North);
        let mut engine = enabled_engine(Policy::default());

        engine.on_fuel_burn(&world, &at, Material::Coal).unwrap();
        assert_eq!(engine.scheduler().pending_deferred(), 0);
    }

    #[test]
    fn burn_in_plain_furnace_is_ignored() {
        let mut world = MockWorld::new();
        world.set_processor(loc(0, 64, 0), Face::North);
        let mut engine = enabled_engine(fuel_policy());

        engine.on_fuel_burn(&world, &loc(0, 64, 0), Material::LavaBucket).unwrap();
        assert_eq!(engine.scheduler().pending_deferred(), 0);
    }

    #[test]
    fn deferred_toggle_runs_on_next_tick() {
        let mut world = MockWorld::new();
        let at = build_forge(&mut world, loc(0, 64, 0), Face::North);
        let mut engine = enabled_engine(Policy::default());

        engine.on_block_damaged(&world, &at).unwrap();
        engine.tick(&mut world).unwrap();
        assert!(engine.is_active(&at).unwrap());
    }

    // -----------------------------------------------------------------------
    // Ignition guard
    // -----------------------------------------------------------------------

    #[test]
    fn ignition_near_forge_suppressed() {
        let mut world = MockWorld::new();
        build_forge(&mut world, loc(0, 64, 0), Face::North);
        let engine = enabled_engine(Policy::default());

        assert!(engine.on_block_ignite(&world, &loc(3, 61, -3), true).unwrap());
        assert!(!engine.on_block_ignite(&world, &loc(4, 64, 0), true).unwrap());
    }

    #[test]
    fn ignition_at_coordinate_edge_skips_outside_blocks() {
        let mut world = MockWorld::new();
        build_forge(&mut world, loc(i32::MAX, 64, 0), Face::North);
        let engine = enabled_engine(Policy::default());

        assert!(engine.on_block_ignite(&world, &loc(i32::MAX - 1, 64, 0), true).unwrap());
        assert!(!engine.on_block_ignite(&world, &loc(i32::MIN + 1, 64, 0), true).unwrap());
    }

    #[test]
    fn ignition_from_other_causes_allowed() {
        let mut world = MockWorld::new();
        build_forge(&mut world, loc(0, 64, 0), Face::North);
        let engine = enabled_engine(Policy::default());
        assert!(!engine.on_block_ignite(&world, &loc(1, 64, 0), false).unwrap());
    }

    #[test]
    fn handlers_require_enabled_engine() {
        let world = MockWorld::new();
        let mut engine = enabled_engine(Policy::default());
        engine.disable().unwrap();
        assert!(matches!(
            engine.on_smelt(&world, &loc(0, 0, 0)),
            Err(EngineError::NotEnabled)
        ));
    }
}
