//! Task scheduling contract and an in-memory tick scheduler.
//!
//! Tasks are plain data. The scheduler only decides *when* a task is due;
//! the engine executes it against the live world. Deferred tasks exist to
//! break reentrancy: an event handler never mutates the inventory that
//! triggered it, it defers the work to the next turn instead.

use crate::fixed::Ticks;
use crate::id::{Location, TaskId};
use slotmap::SlotMap;
use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// Task enum
// ---------------------------------------------------------------------------

/// A unit of work for the engine, bound to one forge location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForgeTask {
    /// Periodic re-evaluation of an active forge.
    Update(Location),
    /// User-initiated on/off switch.
    Toggle(Location),
    /// A fuel item started burning.
    BurnUpdate(Location),
    /// A smelt finished.
    SmeltUpdate(Location),
    /// A lava bucket was burned; return the empty bucket to storage.
    ReturnBucket(Location),
}

// ---------------------------------------------------------------------------
// Scheduler trait
// ---------------------------------------------------------------------------

/// What the engine requires from the host's scheduler.
pub trait Scheduler {
    /// Run `task` on the next turn, after the current handler returns.
    /// Deferred tasks run in the order they were enqueued.
    fn defer(&mut self, task: ForgeTask);

    /// Run `task` after `delay` ticks, then every `period` ticks until
    /// cancelled.
    fn schedule_recurring(&mut self, delay: Ticks, period: Ticks, task: ForgeTask) -> TaskId;

    /// Cancel a recurring task. Once this returns no further firing of the
    /// task may be delivered. Returns false if the task was unknown.
    fn cancel(&mut self, id: TaskId) -> bool;
}

// ---------------------------------------------------------------------------
// TickScheduler
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct RecurringTask {
    task: ForgeTask,
    period: Ticks,
    next_due: Ticks,
}

/// A single-threaded scheduler driven by [`TickScheduler::advance`].
///
/// Each advance releases, in order: every task deferred since the previous
/// advance, then every recurring task that has come due (ordered by due
/// tick). Released tasks are pulled one at a time with
/// [`TickScheduler::next_ready`]; tasks deferred while draining wait for
/// the next advance.
#[derive(Debug, Default)]
pub struct TickScheduler {
    tick: Ticks,
    deferred: Vec<ForgeTask>,
    recurring: SlotMap<TaskId, RecurringTask>,
    ready: VecDeque<(Option<TaskId>, ForgeTask)>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current tick.
    pub fn tick(&self) -> Ticks {
        self.tick
    }

    /// Number of deferred tasks waiting for the next advance.
    pub fn pending_deferred(&self) -> usize {
        self.deferred.len()
    }

    /// Number of live recurring tasks.
    pub fn recurring_count(&self) -> usize {
        self.recurring.len()
    }

    /// Period of a live recurring task.
    pub fn period(&self, id: TaskId) -> Option<Ticks> {
        self.recurring.get(id).map(|r| r.period)
    }

    /// Whether a recurring task is still scheduled.
    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.recurring.contains_key(id)
    }

    /// Move to the next tick and release due work. Returns the new tick.
    pub fn advance(&mut self) -> Ticks {
        self.tick += 1;
        let now = self.tick;

        for task in self.deferred.drain(..) {
            self.ready.push_back((None, task));
        }

        let mut due: Vec<(Ticks, TaskId)> = self
            .recurring
            .iter()
            .filter(|(_, r)| r.next_due <= now)
            .map(|(id, r)| (r.next_due, id))
            .collect();
        due.sort();

        for (_, id) in due {
            if let Some(entry) = self.recurring.get_mut(id) {
                entry.next_due = now + entry.period;
                self.ready.push_back((Some(id), entry.task.clone()));
            }
        }

        now
    }

    /// Pop the next released task.
    pub fn next_ready(&mut self) -> Option<ForgeTask> {
        self.ready.pop_front().map(|(_, task)| task)
    }
}

impl Scheduler for TickScheduler {
    fn defer(&mut self, task: ForgeTask) {
        self.deferred.push(task);
    }

    fn schedule_recurring(&mut self, delay: Ticks, period: Ticks, task: ForgeTask) -> TaskId {
        self.recurring.insert(RecurringTask {
            task,
            period: period.max(1),
            next_due: self.tick + delay,
        })
    }

    fn cancel(&mut self, id: TaskId) -> bool {
        self.ready.retain(|(owner, _)| *owner != Some(id));
        self.recurring.remove(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: i32) -> Location {
        Location::new("world", x, 64, 0)
    }

    fn drain(s: &mut TickScheduler) -> Vec<ForgeTask> {
        std::iter::from_fn(|| s.next_ready()).collect()
    }

    #[test]
    fn deferred_runs_next_tick_in_order() {
        let mut s = TickScheduler::new();
        s.defer(ForgeTask::Toggle(at(1)));
        s.defer(ForgeTask::SmeltUpdate(at(2)));
        assert_eq!(s.next_ready(), None);

        s.advance();
        assert_eq!(
            drain(&mut s),
            vec![ForgeTask::Toggle(at(1)), ForgeTask::SmeltUpdate(at(2))]
        );
    }

    #[test]
    fn deferred_during_drain_waits_for_next_advance() {
        let mut s = TickScheduler::new();
        s.defer(ForgeTask::Toggle(at(1)));
        s.advance();
        assert!(s.next_ready().is_some());
        s.defer(ForgeTask::Toggle(at(2)));
        assert_eq!(s.next_ready(), None);
        assert_eq!(s.pending_deferred(), 1);
    }

    #[test]
    fn zero_delay_recurring_fires_on_next_advance() {
        let mut s = TickScheduler::new();
        s.schedule_recurring(0, 10, ForgeTask::Update(at(1)));
        s.advance();
        assert_eq!(drain(&mut s), vec![ForgeTask::Update(at(1))]);
    }

    #[test]
    fn recurring_repeats_every_period() {
        let mut s = TickScheduler::new();
        s.schedule_recurring(0, 3, ForgeTask::Update(at(1)));
        let mut fired = Vec::new();
        for _ in 0..10 {
            let tick = s.advance();
            if !drain(&mut s).is_empty() {
                fired.push(tick);
            }
        }
        assert_eq!(fired, vec![1, 4, 7, 10]);
    }

    #[test]
    fn deferred_precede_recurring() {
        let mut s = TickScheduler::new();
        s.schedule_recurring(0, 5, ForgeTask::Update(at(1)));
        s.defer(ForgeTask::Toggle(at(2)));
        s.advance();
        assert_eq!(
            drain(&mut s),
            vec![ForgeTask::Toggle(at(2)), ForgeTask::Update(at(1))]
        );
    }

    #[test]
    fn cancel_stops_future_firings() {
        let mut s = TickScheduler::new();
        let id = s.schedule_recurring(0, 1, ForgeTask::Update(at(1)));
        s.advance();
        drain(&mut s);
        assert!(s.cancel(id));
        assert!(!s.is_scheduled(id));
        s.advance();
        assert!(drain(&mut s).is_empty());
    }

    #[test]
    fn cancel_withdraws_released_firing() {
        let mut s = TickScheduler::new();
        let a = s.schedule_recurring(0, 1, ForgeTask::Update(at(1)));
        s.schedule_recurring(0, 1, ForgeTask::Update(at(2)));
        s.advance();
        s.cancel(a);
        assert_eq!(drain(&mut s), vec![ForgeTask::Update(at(2))]);
    }

    #[test]
    fn cancel_unknown_is_false() {
        let mut s = TickScheduler::new();
        let id = s.schedule_recurring(0, 1, ForgeTask::Update(at(1)));
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        assert_eq!(s.recurring_count(), 0);
    }
}
