//! One-minute OHLC bar records
//!
//! A bar is mutable while its minute is open and becomes immutable once it is
//! finalized into a `BarSeries`. Prices stay in ticks; volume and turnover are
//! summed over the minute in widened integers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::features::FeatureTable;
use crate::ids::PeriodId;
use crate::numeric::{tick_to_price, ClockTime, PRICE_EPSILON};

pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Calendar minute of a bar.
///
/// Field order makes the derived `Ord` chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BarTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
}

impl BarTime {
    /// Minute containing `time_s` on `day` of `period`.
    pub fn new(period: PeriodId, day: u8, time_s: u16) -> Self {
        let clock = ClockTime::from_seconds(time_s);
        Self {
            year: period.year,
            month: period.month,
            day,
            hour: clock.hour,
            minute: clock.minute,
        }
    }

    /// Minutes since midnight.
    pub fn minute_of_day(&self) -> u16 {
        u16::from(self.hour) * 60 + u16::from(self.minute)
    }

    /// Same calendar date as `other`.
    pub fn same_day(&self, other: &BarTime) -> bool {
        (self.year, self.month, self.day) == (other.year, other.month, other.day)
    }

    /// Same date, different minute.
    pub fn at_minute_of_day(&self, minute_of_day: u16) -> Self {
        Self {
            hour: (minute_of_day / 60) as u8,
            minute: (minute_of_day % 60) as u8,
            ..*self
        }
    }
}

impl fmt::Display for BarTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute
        )
    }
}

/// A single one-minute OHLC bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarRecord {
    pub time: BarTime,
    pub open: i16,
    pub high: i16,
    pub low: i16,
    pub close: i16,
    /// Lots traded during the minute.
    pub volume: u64,
    /// Currency turnover during the minute.
    pub turnover: u64,
}

impl BarRecord {
    /// Open a bar from the first step of its minute.
    pub fn new(time: BarTime, price_tick: i16, volume: u64, turnover: u64) -> Self {
        Self {
            time,
            open: price_tick,
            high: price_tick,
            low: price_tick,
            close: price_tick,
            volume,
            turnover,
        }
    }

    /// Fold another step of the same minute into the bar.
    pub fn update(&mut self, price_tick: i16, volume: u64, turnover: u64) {
        if price_tick > self.high {
            self.high = price_tick;
        }
        if price_tick < self.low {
            self.low = price_tick;
        }
        self.close = price_tick;
        self.volume += volume;
        self.turnover += turnover;
    }

    /// A no-trade bar held at the previous close.
    pub fn flat(time: BarTime, prev_close: i16) -> Self {
        Self::new(time, prev_close, 0, 0)
    }

    /// Turnover over volume, or 0 when nothing traded.
    pub fn vwap(&self) -> f64 {
        let volume = self.volume as f64;
        if volume < PRICE_EPSILON {
            0.0
        } else {
            self.turnover as f64 / volume
        }
    }

    pub fn open_price(&self) -> f64 {
        tick_to_price(self.open)
    }

    pub fn high_price(&self) -> f64 {
        tick_to_price(self.high)
    }

    pub fn low_price(&self) -> f64 {
        tick_to_price(self.low)
    }

    pub fn close_price(&self) -> f64 {
        tick_to_price(self.close)
    }

    /// OHLC invariants.
    pub fn is_valid(&self) -> bool {
        self.high >= self.open
            && self.high >= self.close
            && self.high >= self.low
            && self.low <= self.open
            && self.low <= self.close
    }
}

/// Append-only sequence of finalized bars plus their feature columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    records: Vec<BarRecord>,
    features: FeatureTable,
}

impl BarSeries {
    pub fn new(features: FeatureTable) -> Self {
        Self {
            records: Vec::new(),
            features,
        }
    }

    pub fn reserve(&mut self, additional: usize) {
        self.records.reserve(additional);
    }

    /// Append one finalized bar and its feature row.
    ///
    /// # Panics
    /// If `features` does not match the table width.
    pub fn push(&mut self, record: BarRecord, features: &[f64]) {
        self.features.push_row(features);
        self.records.push(record);
    }

    pub fn records(&self) -> &[BarRecord] {
        &self.records
    }

    pub fn features(&self) -> &FeatureTable {
        &self.features
    }

    pub fn last(&self) -> Option<&BarRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
