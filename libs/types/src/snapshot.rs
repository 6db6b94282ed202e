//! Fixed-interval snapshot records
//!
//! A snapshot is the regularized view of book state and trade statistics at
//! one aggregation step. Snapshots are created once, appended to their series
//! and never mutated afterwards. Each one points back to the bar that owns its
//! minute by position in the bar series, not by reference.

use serde::{Deserialize, Serialize};

use crate::features::FeatureTable;
use crate::numeric::tick_to_price;
use crate::tick::{TickRecord, BOOK_DEPTH};

/// One aggregation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// Position of the owning one-minute bar in the bar series.
    pub bar_index: u32,
    /// Second within the minute (0..=59).
    pub second: u8,
    /// Absolute latest price in ticks.
    pub price_tick: i16,
    pub trade_count: u8,
    pub turnover: u32,
    pub volume: u16,
    pub bid_price_ticks: [i16; BOOK_DEPTH],
    pub bid_volumes: [u16; BOOK_DEPTH],
    pub ask_price_ticks: [i16; BOOK_DEPTH],
    pub ask_volumes: [u16; BOOK_DEPTH],
    pub direction: u8,
    /// True when the step was synthesized to fill a gap.
    pub synthetic: bool,
}

impl SnapshotRecord {
    /// Build a snapshot from a reconstructed tick.
    pub fn from_tick(tick: &TickRecord, bar_index: u32, synthetic: bool) -> Self {
        Self {
            bar_index,
            second: tick.clock().second,
            price_tick: tick.price_tick,
            trade_count: tick.trade_count,
            turnover: tick.turnover,
            volume: tick.volume,
            bid_price_ticks: tick.bid_price_ticks,
            bid_volumes: tick.bid_volumes,
            ask_price_ticks: tick.ask_price_ticks,
            ask_volumes: tick.ask_volumes,
            direction: tick.direction,
            synthetic,
        }
    }

    pub fn price(&self) -> f64 {
        tick_to_price(self.price_tick)
    }

    pub fn best_bid(&self) -> f64 {
        tick_to_price(self.bid_price_ticks[0])
    }

    pub fn best_ask(&self) -> f64 {
        tick_to_price(self.ask_price_ticks[0])
    }
}

/// Append-only snapshot sequence plus its feature columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSeries {
    records: Vec<SnapshotRecord>,
    features: FeatureTable,
}

impl SnapshotSeries {
    /// Create an empty series whose rows carry the given feature table layout.
    pub fn new(features: FeatureTable) -> Self {
        Self {
            records: Vec::new(),
            features,
        }
    }

    /// Reserve room for `additional` more snapshots.
    pub fn reserve(&mut self, additional: usize) {
        self.records.reserve(additional);
    }

    /// Append one snapshot and its feature row.
    ///
    /// # Panics
    /// If `features` does not match the table width.
    pub fn push(&mut self, record: SnapshotRecord, features: &[f64]) {
        self.features.push_row(features);
        self.records.push(record);
    }

    pub fn records(&self) -> &[SnapshotRecord] {
        &self.records
    }

    pub fn features(&self) -> &FeatureTable {
        &self.features
    }

    pub fn last(&self) -> Option<&SnapshotRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
