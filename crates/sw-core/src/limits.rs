// sw-core/src/limits.rs

/// Hardware resolution floor for a single hold segment, in microseconds.
pub const MIN_HOLD_TIME: u32 = 50;

/// Lowest code accepted by the 12-bit DAC.
pub const DAC_MIN: i32 = 0;

/// Highest code accepted by the 12-bit DAC.
pub const DAC_MAX: i32 = 4095;

/// Microseconds per second, used for period/frequency conversion.
pub const MICROS_PER_SECOND: f64 = 1e6;
