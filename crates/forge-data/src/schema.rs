//! Serde structs for the policy file.
//!
//! Keys are kebab-case so existing plugin configuration files carry over
//! unchanged. Every key is optional; missing keys take the default policy's
//! value.

use forge_core::fixed::{Ticks, fixed64_to_f64};
use forge_core::policy::{Durations, Policy};
use serde::Deserialize;

// ===========================================================================
// Policy
// ===========================================================================

/// The on-disk policy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PolicyData {
    /// Seconds per smelt. 9.25 is the processor's own speed.
    pub cooking_time: f64,
    pub require_fuel: bool,
    /// Count crafted wooden items (fences, stairs, doors...) as fuel.
    pub allow_crafted_items: bool,
    pub stack_limit_horizontal: i32,
    pub stack_limit_vertical: i32,
    pub durations: DurationsData,
}

impl Default for PolicyData {
    fn default() -> Self {
        let policy = Policy::default();
        Self {
            cooking_time: fixed64_to_f64(policy.cook_time),
            require_fuel: policy.require_fuel,
            allow_crafted_items: policy.allow_crafted_fuel,
            stack_limit_horizontal: policy.max_stack_horizontal,
            stack_limit_vertical: policy.max_stack_vertical,
            durations: DurationsData::default(),
        }
    }
}

// ===========================================================================
// Durations
// ===========================================================================

/// Re-check timing, in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DurationsData {
    pub task_period: Ticks,
    pub max_jitter: Ticks,
    pub burn_duration: Ticks,
}

impl Default for DurationsData {
    fn default() -> Self {
        let d = Durations::default();
        Self {
            task_period: d.task_period,
            max_jitter: d.max_jitter,
            burn_duration: d.burn_duration,
        }
    }
}

impl From<DurationsData> for Durations {
    fn from(data: DurationsData) -> Self {
        Durations {
            task_period: data.task_period,
            max_jitter: data.max_jitter,
            burn_duration: data.burn_duration,
        }
    }
}
