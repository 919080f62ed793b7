//! The set of active forges and their recurring tasks.
//!
//! A location is active exactly when it has an entry here, and every entry
//! owns one scheduled recurring [`ForgeTask::Update`].

use crate::fixed::Ticks;
use crate::forge::Forge;
use crate::id::{Location, TaskId};
use crate::policy::Durations;
use crate::rng::SimRng;
use crate::scheduler::{ForgeTask, Scheduler};
use std::collections::BTreeMap;

/// An active forge and the recurring task that re-evaluates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveEntry {
    pub forge: Forge,
    pub task: TaskId,
}

/// Registry of active forges, keyed by location.
#[derive(Debug)]
pub struct ActiveRegistry {
    entries: BTreeMap<Location, ActiveEntry>,
    rng: SimRng,
}

impl ActiveRegistry {
    /// Create an empty registry. `seed` drives period jitter.
    pub fn new(seed: u64) -> Self {
        Self {
            entries: BTreeMap::new(),
            rng: SimRng::new(seed),
        }
    }

    pub fn is_active(&self, at: &Location) -> bool {
        self.entries.contains_key(at)
    }

    pub fn get(&self, at: &Location) -> Option<&ActiveEntry> {
        self.entries.get(at)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Active locations in ascending order.
    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.entries.keys()
    }

    /// A fresh re-check period in `[task_period, task_period + max_jitter)`.
    ///
    /// Sampled per activation so forges switched on together drift apart
    /// instead of re-checking on the same tick forever.
    pub fn jittered_period(&mut self, durations: &Durations) -> Ticks {
        durations.task_period + self.rng.below(durations.max_jitter)
    }

    /// Make a forge active. Returns false if it already was.
    pub fn activate<S: Scheduler + ?Sized>(
        &mut self,
        forge: &Forge,
        durations: &Durations,
        scheduler: &mut S,
    ) -> bool {
        if self.is_active(forge.location()) {
            return false;
        }
        let period = self.jittered_period(durations);
        let task =
            scheduler.schedule_recurring(0, period, ForgeTask::Update(forge.location().clone()));
        self.entries.insert(
            forge.location().clone(),
            ActiveEntry {
                forge: forge.clone(),
                task,
            },
        );
        tracing::debug!(forge = %forge.location(), period, "forge activated");
        true
    }

    /// Make a forge inactive, cancelling its task before returning.
    /// Returns false if it was not active.
    pub fn deactivate<S: Scheduler + ?Sized>(&mut self, forge: &Forge, scheduler: &mut S) -> bool {
        let Some(entry) = self.entries.remove(forge.location()) else {
            return false;
        };
        scheduler.cancel(entry.task);
        tracing::debug!(forge = %forge.location(), "forge deactivated");
        true
    }

    /// Cancel every task and empty the registry, returning the forges that
    /// were active.
    pub fn clear<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) -> Vec<Forge> {
        let entries = std::mem::take(&mut self.entries);
        entries
            .into_values()
            .map(|entry| {
                scheduler.cancel(entry.task);
                entry.forge
            })
            .collect()
    }
}
