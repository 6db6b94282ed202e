//! Price scaling and time-of-day helpers
//!
//! Prices travel through the whole pipeline as signed fixed-point ticks
//! (`price = tick * 0.01`). Conversion to floating-point currency only happens
//! at the output boundary and inside derived features.

/// Currency units per price tick.
pub const PRICE_SCALE: f64 = 0.01;

/// Tolerance used when guarding divisions by volume.
pub const PRICE_EPSILON: f64 = 1e-6;

pub const SECONDS_PER_MINUTE: u16 = 60;
pub const SECONDS_PER_HOUR: u16 = 3600;

/// Convert a price tick into currency units.
#[inline]
pub fn tick_to_price(tick: i16) -> f64 {
    f64::from(tick) * PRICE_SCALE
}

/// Wall-clock split of a seconds-in-day value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClockTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl ClockTime {
    /// Split seconds-in-day into hour/minute/second.
    ///
    /// Values past 24h keep counting hours; the archive never produces them
    /// but wrapped deltas can.
    pub fn from_seconds(time_s: u16) -> Self {
        let hour = time_s / SECONDS_PER_HOUR;
        let rem = time_s - hour * SECONDS_PER_HOUR;
        let minute = rem / SECONDS_PER_MINUTE;
        let second = rem - minute * SECONDS_PER_MINUTE;
        Self {
            hour: hour as u8,
            minute: minute as u8,
            second: second as u8,
        }
    }
}
