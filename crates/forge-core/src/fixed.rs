use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of host time.
pub type Ticks = u64;

/// Host ticks per wall-clock second.
pub const TICKS_PER_SECOND: Ticks = 20;

/// One minute of host time.
pub const MINUTE: Ticks = 60 * TICKS_PER_SECOND;

/// Convert an f64 to Fixed64. Use only for initialization, never per tick.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display and config output.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Convert a duration in seconds to whole ticks, truncating toward zero.
/// Negative durations map to zero.
#[inline]
pub fn seconds_to_ticks(seconds: Fixed64) -> Ticks {
    if seconds <= Fixed64::ZERO {
        return 0;
    }
    let ticks = seconds * Fixed64::from_num(TICKS_PER_SECOND);
    ticks.to_num::<u64>()
}
