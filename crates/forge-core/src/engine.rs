//! The forge engine: owns the policy, the active registry, the scheduler
//! facade and the persistence store, and runs forge tasks against a live
//! world.
//!
//! # Lifecycle
//!
//! An engine starts disabled. [`ForgeEngine::enable`] restores the active
//! set from the store and re-activates every restored forge so automatic
//! re-evaluation resumes. [`ForgeEngine::disable`] cancels every recurring
//! task and saves the active set. Every other entry point reports
//! [`EngineError::NotEnabled`] outside that window.
//!
//! # Task flow
//!
//! Event handlers (see the `listener` module) never touch the world they
//! were called from beyond reading it; they defer a [`ForgeTask`]. The host
//! scheduler hands tasks back to [`ForgeEngine::run_task`], which re-reads
//! everything it needs from the world at that point.

use crate::forge::{Forge, StallReason};
use crate::id::Location;
use crate::locator::StructureLocator;
use crate::material::{ItemStack, Material};
use crate::persist::{ActiveStore, FileStore, PersistError};
use crate::policy::{Policy, PolicyError};
use crate::registry::ActiveRegistry;
use crate::scheduler::{ForgeTask, Scheduler, TickScheduler};
use crate::world::{FUEL_SLOT, World};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Misuse of the engine, or a persistence failure surfaced by a lifecycle
/// call. Stalls and invalid structures are state transitions, not errors.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("forge engine is not enabled")]
    NotEnabled,
    #[error("forge engine is already enabled")]
    AlreadyEnabled,
    #[error("persistence failed: {0}")]
    Persist(#[from] PersistError),
}

// ---------------------------------------------------------------------------
// ForgeEngine
// ---------------------------------------------------------------------------

/// Context object for every forge operation.
#[derive(Debug)]
pub struct ForgeEngine<S: Scheduler = TickScheduler, St: ActiveStore = FileStore> {
    pub(crate) policy: Policy,
    pub(crate) registry: ActiveRegistry,
    pub(crate) scheduler: S,
    pub(crate) store: St,
    pub(crate) enabled: bool,
}

impl<S: Scheduler, St: ActiveStore> ForgeEngine<S, St> {
    /// Build a disabled engine. `seed` drives period jitter.
    pub fn new(policy: Policy, scheduler: S, store: St, seed: u64) -> Result<Self, PolicyError> {
        policy.validate()?;
        Ok(Self {
            policy,
            registry: ActiveRegistry::new(seed),
            scheduler,
            store,
            enabled: false,
        })
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// The active set. Only meaningful while enabled.
    pub fn registry(&self) -> Result<&ActiveRegistry, EngineError> {
        self.ensure_enabled()?;
        Ok(&self.registry)
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn store(&self) -> &St {
        &self.store
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn ensure_enabled(&self) -> Result<(), EngineError> {
        if self.enabled {
            Ok(())
        } else {
            Err(EngineError::NotEnabled)
        }
    }

    pub(crate) fn locator(&self) -> StructureLocator {
        StructureLocator::from_policy(&self.policy)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Restore the active set and re-activate every restored forge.
    ///
    /// A damaged store is logged and whatever was read before the damage
    /// is restored. Returns the number of forges made active.
    pub fn enable(&mut self) -> Result<usize, EngineError> {
        if self.enabled {
            return Err(EngineError::AlreadyEnabled);
        }
        let outcome = self.store.load();
        if let Some(err) = &outcome.error {
            tracing::error!(
                error = %err,
                recovered = outcome.locations.len(),
                "failed to read active forges; restoring what was parsed"
            );
        }

        self.enabled = true;
        let mut restored = 0;
        for at in outcome.locations {
            let forge = Forge::new(at);
            if self
                .registry
                .activate(&forge, &self.policy.durations, &mut self.scheduler)
            {
                restored += 1;
            }
        }
        tracing::info!("Restored {restored} active forges");
        Ok(restored)
    }

    /// Cancel every recurring task and save the active set.
    ///
    /// The engine is disabled even when saving fails. Returns the number of
    /// forges saved.
    pub fn disable(&mut self) -> Result<usize, EngineError> {
        self.ensure_enabled()?;
        self.enabled = false;

        let locations: Vec<Location> = self
            .registry
            .clear(&mut self.scheduler)
            .into_iter()
            .map(|forge| forge.location().clone())
            .collect();
        let saved = self.store.save(&locations).inspect_err(|err| {
            tracing::error!(error = %err, "failed to save active forges");
        })?;
        tracing::info!("Saved {saved} active forges");
        Ok(saved)
    }

    /// Save the current active set without changing it.
    pub fn save_active(&mut self) -> Result<usize, EngineError> {
        self.ensure_enabled()?;
        let locations: Vec<Location> = self.registry.locations().cloned().collect();
        let saved = self.store.save(&locations).inspect_err(|err| {
            tracing::warn!(error = %err, "failed to save active forges");
        })?;
        tracing::debug!(saved, "active forges saved");
        Ok(saved)
    }

    // -----------------------------------------------------------------------
    // Lookup and registry transitions
    // -----------------------------------------------------------------------

    /// The active handle at `at`, else a fresh handle if `at` is a valid
    /// forge, else `None`.
    pub fn find<W: World + ?Sized>(
        &self,
        world: &W,
        at: &Location,
    ) -> Result<Option<Forge>, EngineError> {
        self.ensure_enabled()?;
        Ok(self.lookup(world, at))
    }

    pub fn is_active(&self, at: &Location) -> Result<bool, EngineError> {
        self.ensure_enabled()?;
        Ok(self.registry.is_active(at))
    }

    pub(crate) fn lookup<W: World + ?Sized>(&self, world: &W, at: &Location) -> Option<Forge> {
        if let Some(entry) = self.registry.get(at) {
            return Some(entry.forge.clone());
        }
        self.locator().is_valid(world, at).then(|| Forge::new(at.clone()))
    }

    /// Make a forge active. Returns false if it already was.
    pub fn activate(&mut self, forge: &Forge) -> Result<bool, EngineError> {
        self.ensure_enabled()?;
        Ok(self
            .registry
            .activate(forge, &self.policy.durations, &mut self.scheduler))
    }

    /// Make a forge inactive. Returns false if it already was.
    pub fn deactivate(&mut self, forge: &Forge) -> Result<bool, EngineError> {
        self.ensure_enabled()?;
        Ok(self.registry.deactivate(forge, &mut self.scheduler))
    }

    // -----------------------------------------------------------------------
    // Forge operations
    // -----------------------------------------------------------------------

    /// Re-evaluate one forge under the current policy.
    pub fn update<W: World + ?Sized>(
        &mut self,
        world: &mut W,
        forge: &Forge,
    ) -> Result<(), EngineError> {
        self.ensure_enabled()?;
        self.update_forge(world, forge);
        Ok(())
    }

    /// Re-evaluate after a fuel item started burning.
    pub fn burn_update<W: World + ?Sized>(
        &mut self,
        world: &mut W,
        forge: &Forge,
    ) -> Result<(), EngineError> {
        self.update(world, forge)
    }

    /// Re-evaluate after a smelt finished, then restart the cook countdown
    /// if the forge is still active.
    pub fn smelt_update<W: World + ?Sized>(
        &mut self,
        world: &mut W,
        forge: &Forge,
    ) -> Result<(), EngineError> {
        self.ensure_enabled()?;
        self.smelt_forge(world, forge);
        Ok(())
    }

    /// Switch a forge on or off at a user's request.
    pub fn toggle<W: World + ?Sized>(
        &mut self,
        world: &mut W,
        forge: &Forge,
    ) -> Result<(), EngineError> {
        self.ensure_enabled()?;
        self.toggle_forge(world, forge);
        Ok(())
    }

    /// Execute one task handed back by the scheduler.
    pub fn run_task<W: World + ?Sized>(
        &mut self,
        world: &mut W,
        task: &ForgeTask,
    ) -> Result<(), EngineError> {
        self.ensure_enabled()?;
        match task {
            ForgeTask::Update(at) => {
                // Only the registry's own handle is ever re-evaluated here.
                if let Some(forge) = self.registry.get(at).map(|entry| entry.forge.clone()) {
                    self.update_forge(world, &forge);
                }
            }
            ForgeTask::Toggle(at) => match self.lookup(world, at) {
                Some(forge) => self.toggle_forge(world, &forge),
                None => tracing::debug!(forge = %at, "toggle skipped; no forge"),
            },
            ForgeTask::BurnUpdate(at) => {
                if let Some(forge) = self.lookup(world, at) {
                    self.update_forge(world, &forge);
                }
            }
            ForgeTask::SmeltUpdate(at) => {
                if let Some(forge) = self.lookup(world, at) {
                    self.smelt_forge(world, &forge);
                }
            }
            ForgeTask::ReturnBucket(at) => self.return_bucket(world, at),
        }
        Ok(())
    }

    fn update_forge<W: World + ?Sized>(&mut self, world: &mut W, forge: &Forge) {
        if !forge.is_valid(world, &self.policy) {
            self.registry.deactivate(forge, &mut self.scheduler);
            // With fuel required the forge burns out on its own.
            if !self.policy.require_fuel {
                forge.douse(world);
            }
            return;
        }

        if self.policy.require_fuel {
            if let Err(reason) = refuel_cycle(world, forge, &self.policy) {
                tracing::debug!(forge = %forge.location(), ?reason, "forge stalled");
                self.registry.deactivate(forge, &mut self.scheduler);
                forge.unload_fuel(world, &self.policy);
            }
        } else {
            if let Err(reason) = forge.update_product(world, &self.policy) {
                tracing::debug!(forge = %forge.location(), ?reason, "product step stalled");
            }
            if let Err(reason) = forge.update_raw_material(world, &self.policy) {
                tracing::debug!(forge = %forge.location(), ?reason, "raw material step stalled");
            }
            forge.ignite(world, &self.policy);
        }
    }

    fn smelt_forge<W: World + ?Sized>(&mut self, world: &mut W, forge: &Forge) {
        self.update_forge(world, forge);
        if self.registry.is_active(forge.location()) {
            world.set_cook_time(forge.location(), self.policy.cook_ticks());
        }
    }

    fn toggle_forge<W: World + ?Sized>(&mut self, world: &mut W, forge: &Forge) {
        if self.registry.is_active(forge.location()) {
            if self.policy.require_fuel {
                forge.unload_fuel(world, &self.policy);
            }
            self.registry.deactivate(forge, &mut self.scheduler);
            forge.douse(world);
            tracing::debug!(forge = %forge.location(), "forge toggled off");
        } else {
            self.registry
                .activate(forge, &self.policy.durations, &mut self.scheduler);
            world.set_cook_time(forge.location(), self.policy.cook_ticks());
            tracing::debug!(forge = %forge.location(), "forge toggled on");
        }
    }

    /// Put the empty bucket left by a burned lava bucket into the output
    /// container, else the input container. The fuel slot is cleared only
    /// when the bucket found a home.
    fn return_bucket<W: World + ?Sized>(&mut self, world: &mut W, at: &Location) {
        let Some(forge) = self.lookup(world, at) else {
            return;
        };
        let containers = [
            forge.output_container(world, &self.policy),
            forge.input_container(world, &self.policy),
        ];

        let mut bucket = Some(ItemStack::new(Material::Bucket, 1));
        for container in containers.iter().flatten() {
            if let Some(item) = bucket.take() {
                bucket = forge.add_to(world, item, Some(container), false);
            }
        }
        if bucket.is_none() {
            world.clear_slot(forge.location(), FUEL_SLOT);
        }
    }
}

impl<St: ActiveStore> ForgeEngine<TickScheduler, St> {
    /// Advance the tick scheduler once and run every task it releases.
    /// Returns the number of tasks run.
    pub fn tick<W: World + ?Sized>(&mut self, world: &mut W) -> Result<usize, EngineError> {
        self.ensure_enabled()?;
        self.scheduler.advance();
        let mut ran = 0;
        while let Some(task) = self.scheduler.next_ready() {
            self.run_task(world, &task)?;
            ran += 1;
        }
        Ok(ran)
    }

    /// Run `ticks` ticks. Returns the total number of tasks run.
    pub fn run_ticks<W: World + ?Sized>(
        &mut self,
        world: &mut W,
        ticks: u64,
    ) -> Result<usize, EngineError> {
        let mut ran = 0;
        for _ in 0..ticks {
            ran += self.tick(world)?;
        }
        Ok(ran)
    }
}

/// Product, raw material and fuel in order, stopping at the first stall.
fn refuel_cycle<W: World + ?Sized>(
    world: &mut W,
    forge: &Forge,
    policy: &Policy,
) -> Result<(), StallReason> {
    forge.update_product(world, policy)?;
    forge.update_raw_material(world, policy)?;
    forge.update_fuel(world, policy)
}
