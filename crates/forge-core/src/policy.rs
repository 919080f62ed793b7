//! Operator policy: fuel rules, stacking limits, and timing.

use crate::fixed::{Fixed64, MINUTE, Ticks, seconds_to_ticks};

/// Longest smelt a processor performs, in seconds.
pub const MAX_COOK_SECONDS: f64 = 9.25;

/// Errors from policy validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("task period must be positive")]
    ZeroTaskPeriod,
    #[error(
        "task period {task_period} + jitter {max_jitter} must be below burn duration {burn_duration}"
    )]
    BurnTooShort {
        task_period: Ticks,
        max_jitter: Ticks,
        burn_duration: Ticks,
    },
}

// ---------------------------------------------------------------------------
// Durations
// ---------------------------------------------------------------------------

/// Timing of the recurring re-check. A lit forge burns for
/// `burn_duration`, and is re-checked every `task_period` plus up to
/// `max_jitter`, so the re-check always lands before the fire goes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Durations {
    pub task_period: Ticks,
    pub max_jitter: Ticks,
    pub burn_duration: Ticks,
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            task_period: 20 * MINUTE,
            max_jitter: 2 * MINUTE,
            burn_duration: 25 * MINUTE,
        }
    }
}

impl Durations {
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.task_period == 0 {
            return Err(PolicyError::ZeroTaskPeriod);
        }
        if self.task_period.saturating_add(self.max_jitter) >= self.burn_duration {
            return Err(PolicyError::BurnTooShort {
                task_period: self.task_period,
                max_jitter: self.max_jitter,
                burn_duration: self.burn_duration,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Read-only configuration consulted by every forge operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    /// Seconds a single smelt takes.
    pub cook_time: Fixed64,
    /// Fuel must come from the input container. When false, forges burn
    /// without consuming anything and stay lit until toggled off.
    pub require_fuel: bool,
    /// Count crafted wooden items as fuel.
    pub allow_crafted_fuel: bool,
    /// How many forges sideways a container may be reached through.
    pub max_stack_horizontal: i32,
    /// How many forges may be stacked above one heat source, counting the
    /// bottom one. Zero or less makes no furnace a forge.
    pub max_stack_vertical: i32,
    pub durations: Durations,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            cook_time: Fixed64::from_num(MAX_COOK_SECONDS),
            require_fuel: false,
            allow_crafted_fuel: false,
            max_stack_horizontal: 1,
            max_stack_vertical: 3,
            durations: Durations::default(),
        }
    }
}

impl Policy {
    pub fn validate(&self) -> Result<(), PolicyError> {
        self.durations.validate()
    }

    /// The elapsed cook time to set on a processor so the current smelt
    /// finishes after `cook_time` seconds. Processors count elapsed time
    /// toward a fixed full duration, so shorter smelts start further along.
    pub fn cook_ticks(&self) -> Ticks {
        let max = Fixed64::from_num(MAX_COOK_SECONDS);
        let remaining = self.cook_time.clamp(Fixed64::ZERO, max);
        seconds_to_ticks(max - remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::TICKS_PER_SECOND;

    fn secs(n: u64) -> Ticks {
        n * TICKS_PER_SECOND
    }

    #[test]
    fn default_durations_are_ordered() {
        let d = Durations::default();
        assert!(d.task_period + d.max_jitter < d.burn_duration);
        assert_eq!(d.validate(), Ok(()));
    }

    #[test]
    fn burn_must_outlast_period_plus_jitter() {
        let d = Durations {
            task_period: secs(10),
            max_jitter: secs(5),
            burn_duration: secs(15),
        };
        assert!(matches!(d.validate(), Err(PolicyError::BurnTooShort { .. })));
    }

    #[test]
    fn zero_period_rejected() {
        let d = Durations {
            task_period: 0,
            max_jitter: 0,
            burn_duration: 100,
        };
        assert_eq!(d.validate(), Err(PolicyError::ZeroTaskPeriod));
    }

    #[test]
    fn default_cook_time_sets_no_head_start() {
        assert_eq!(Policy::default().cook_ticks(), 0);
    }

    #[test]
    fn shorter_cook_time_starts_further_along() {
        let policy = Policy {
            cook_time: Fixed64::from_num(4.25),
            ..Policy::default()
        };
        assert_eq!(policy.cook_ticks(), secs(5));
    }

    #[test]
    fn out_of_range_cook_time_is_clamped() {
        let fast = Policy {
            cook_time: Fixed64::from_num(-1),
            ..Policy::default()
        };
        assert_eq!(fast.cook_ticks(), 185);

        let slow = Policy {
            cook_time: Fixed64::from_num(30),
            ..Policy::default()
        };
        assert_eq!(slow.cook_ticks(), 0);

        let huge = Policy {
            cook_time: Fixed64::from_num(200_000_000),
            ..Policy::default()
        };
        assert_eq!(huge.cook_ticks(), 0);
    }
}
