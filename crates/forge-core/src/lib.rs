//! Forge Core -- unattended furnace automation for block worlds.
//!
//! A forge is a processor block sitting on a heat source, optionally stacked
//! on other forges and flanked by storage containers. This crate detects
//! valid forges, routes raw material and fuel in from the input container,
//! routes product out to the output container, and keeps every active forge
//! re-evaluated on a jittered recurring schedule so that many forges switched
//! on together do not all re-check on the same tick.
//!
//! # Host contracts
//!
//! The crate never owns the world. Hosts implement the traits in [`world`]
//! (block queries, inventories, ignition control), a [`scheduler::Scheduler`]
//! and a [`persist::ActiveStore`], then feed events to the handlers on
//! [`engine::ForgeEngine`] and hand scheduled tasks back to
//! [`engine::ForgeEngine::run_task`].
//!
//! ```rust,ignore
//! let mut engine = ForgeEngine::new(policy, TickScheduler::new(), FileStore::in_dir(dir), seed)?;
//! engine.enable()?;
//! engine.on_block_damaged(&world, &at)?;
//! engine.tick(&mut world)?;
//! engine.disable()?;
//! ```
//!
//! # Key Types
//!
//! - [`engine::ForgeEngine`] -- Context object owning policy, registry,
//!   scheduler and store.
//! - [`forge::Forge`] -- Location handle with the per-visit resource flow.
//! - [`locator::StructureLocator`] -- Structural validity and container search.
//! - [`registry::ActiveRegistry`] -- Active forges and their recurring tasks.
//! - [`scheduler::TickScheduler`] -- In-memory deferred and recurring tasks.
//! - [`persist`] -- Framed bitcode stream of active locations.
//! - [`policy::Policy`] -- Fuel rules, stacking limits and durations.

pub mod engine;
pub mod fixed;
pub mod forge;
pub mod id;
pub mod listener;
pub mod locator;
pub mod material;
pub mod persist;
pub mod policy;
pub mod registry;
pub mod rng;
pub mod scheduler;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
