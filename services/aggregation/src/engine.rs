//! Streaming aggregation engine
//!
//! Consumes the reconstructed, time-ordered tick stream of one asset and
//! builds two append-only series: fixed-interval snapshots and one-minute
//! bars.
//!
//! # Per-record flow
//!
//! 1. **Day check**: a record starts a new trading day when its calendar
//!    date differs from the previous record's, or its time of day went
//!    backwards. Nothing is synthesized across a day change.
//! 2. **Gap synthesis**: on the same day, if the record is more than one
//!    interval after the previous one, a synthetic step is emitted at every
//!    missed interval boundary. Synthetic steps copy the previous record's
//!    price, book and direction with zero trade count, volume and turnover.
//! 3. **Bar membership**: a step whose minute differs from the open bar's
//!    finalizes that bar, fills flat bars for any same-day minutes in
//!    between, and opens a new bar. Otherwise the open bar is updated.
//! 4. **Snapshot emission**: the step is appended with its feature row; its
//!    `bar_index` is the position the open bar will take in the bar series.
//!
//! Gaps between archive periods are not bridged: a new period always
//! changes the calendar date.

use lob_types::bar::{BarRecord, BarSeries, BarTime};
use lob_types::features::FeatureTable;
use lob_types::ids::PeriodId;
use lob_types::snapshot::{SnapshotRecord, SnapshotSeries};
use lob_types::tick::TickRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::EngineError;
use crate::features::{self, FeatureContext, FeatureHistory, FeatureSet, StepMetrics};

/// Nominal snapshot cadence in seconds.
pub const DEFAULT_INTERVAL_SECS: u16 = 3;

/// Feature columns carried by every bar.
pub const BAR_FEATURES: [&str; 1] = [features::VWAP];

/// Configuration for the aggregation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Snapshot interval in seconds.
    pub interval_secs: u16,
    /// Snapshot feature columns, by name.
    pub features: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            features: features::default_names(),
        }
    }
}

/// Counters for one asset stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Real records consumed.
    pub records_in: u64,
    /// Snapshots synthesized to fill intra-day gaps.
    pub synthetic_snapshots: u64,
    /// Flat bars synthesized for minutes without any step.
    pub flat_bars: u64,
    pub day_changes: u64,
}

/// Completed output of one engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedSeries {
    pub snapshots: SnapshotSeries,
    pub bars: BarSeries,
    pub stats: EngineStats,
}

/// Position of the last emitted step.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    date: (u16, u8, u8),
    time_s: u16,
    record: TickRecord,
}

/// Aggregation state for one asset.
pub struct AggregationEngine {
    interval: u16,
    features: FeatureSet,
    history: FeatureHistory,
    cursor: Option<Cursor>,
    /// The bar of the current minute; it takes index `bars.len()` once final.
    open_bar: Option<BarRecord>,
    snapshots: SnapshotSeries,
    bars: BarSeries,
    row: Vec<f64>,
    stats: EngineStats,
}

impl AggregationEngine {
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let features = FeatureSet::from_names(config.features.as_slice())?;
        Self::with_features(config.interval_secs, features)
    }

    /// Build with a caller-assembled feature set (custom features allowed).
    pub fn with_features(interval_secs: u16, features: FeatureSet) -> Result<Self, EngineError> {
        if interval_secs == 0 {
            return Err(EngineError::InvalidInterval);
        }
        let snapshot_table = FeatureTable::new(features.names())?;
        let bar_table = FeatureTable::new(BAR_FEATURES)?;
        Ok(Self {
            interval: interval_secs,
            row: Vec::with_capacity(features.len()),
            features,
            history: FeatureHistory::default(),
            cursor: None,
            open_bar: None,
            snapshots: SnapshotSeries::new(snapshot_table),
            bars: BarSeries::new(bar_table),
            stats: EngineStats::default(),
        })
    }

    /// Pre-size the output series.
    pub fn reserve(&mut self, snapshots: usize, bars: usize) {
        self.snapshots.reserve(snapshots);
        self.bars.reserve(bars);
    }

    /// Feed every record of one period, in order.
    pub fn process_period(&mut self, period: PeriodId, records: &[TickRecord]) {
        for record in records {
            self.process(period, record);
        }
    }

    /// Feed one reconstructed record.
    pub fn process(&mut self, period: PeriodId, record: &TickRecord) {
        self.stats.records_in += 1;
        let date = (period.year, period.month, record.day);

        let mut new_day = false;
        if let Some(prev) = self.cursor {
            new_day = prev.date != date || record.time_s < prev.time_s;
            if new_day {
                self.stats.day_changes += 1;
                debug!(
                    period = %period,
                    day = record.day,
                    prev_time = prev.time_s,
                    time = record.time_s,
                    "Day change"
                );
            } else if record.time_s - prev.time_s > self.interval {
                self.fill_gap(period, &prev, record.time_s);
            }
        }

        self.emit(period, record, false, new_day);
    }

    /// Synthesize steps at `prev + k * interval` strictly before `until`.
    fn fill_gap(&mut self, period: PeriodId, prev: &Cursor, until: u16) {
        let interval = u32::from(self.interval);
        let mut t = u32::from(prev.time_s) + interval;
        let mut synthetic = prev.record;
        synthetic.trade_count = 0;
        synthetic.volume = 0;
        synthetic.turnover = 0;

        trace!(from = prev.time_s, until, "Filling snapshot gap");
        while t < u32::from(until) {
            synthetic.time_s = t as u16;
            self.emit(period, &synthetic, true, false);
            self.stats.synthetic_snapshots += 1;
            t += interval;
        }
    }

    fn emit(&mut self, period: PeriodId, record: &TickRecord, synthetic: bool, new_day: bool) {
        let delta_t = match &self.cursor {
            Some(prev) if !new_day => f64::from(record.time_s.wrapping_sub(prev.time_s)),
            _ => 0.0,
        };

        let bar_index = self.assign_bar(period, record);
        let snapshot = SnapshotRecord::from_tick(record, bar_index, synthetic);

        let metrics = StepMetrics::compute(&snapshot, self.history.last_vwap(), delta_t);
        self.history.record(snapshot.price(), &metrics);

        let ctx = FeatureContext {
            previous: self.snapshots.last(),
            metrics,
            history: &self.history,
        };
        self.features.compute_row(&snapshot, &ctx, &mut self.row);
        self.snapshots.push(snapshot, &self.row);

        self.cursor = Some(Cursor {
            date: (period.year, period.month, record.day),
            time_s: record.time_s,
            record: *record,
        });
    }

    /// Place one step into the open bar, rolling bars over on a new minute.
    /// Returns the index of the bar that owns the step.
    fn assign_bar(&mut self, period: PeriodId, record: &TickRecord) -> u32 {
        let time = BarTime::new(period, record.day, record.time_s);
        let volume = u64::from(record.volume);
        let turnover = u64::from(record.turnover);

        if let Some(bar) = self.open_bar.as_mut() {
            if bar.time == time {
                bar.update(record.price_tick, volume, turnover);
                return self.bars.len() as u32;
            }
        }

        if let Some(done) = self.open_bar.take() {
            self.finalize(done);
            self.fill_flat_bars(&done, time);
        }
        self.open_bar = Some(BarRecord::new(time, record.price_tick, volume, turnover));
        self.bars.len() as u32
    }

    fn finalize(&mut self, bar: BarRecord) {
        self.bars.push(bar, &[bar.vwap()]);
    }

    /// Flat bars for every same-day minute strictly between `prev` and `next`.
    fn fill_flat_bars(&mut self, prev: &BarRecord, next: BarTime) {
        if !prev.time.same_day(&next) {
            return;
        }
        let from = prev.time.minute_of_day() + 1;
        let to = next.minute_of_day();
        for minute in from..to {
            let flat = BarRecord::flat(prev.time.at_minute_of_day(minute), prev.close);
            self.finalize(flat);
            self.stats.flat_bars += 1;
        }
    }

    pub fn snapshots(&self) -> &SnapshotSeries {
        &self.snapshots
    }

    /// Finalized bars; the open bar is not included.
    pub fn bars(&self) -> &BarSeries {
        &self.bars
    }

    pub fn open_bar(&self) -> Option<&BarRecord> {
        self.open_bar.as_ref()
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Finalize the open bar and hand over both series.
    pub fn finish(mut self) -> AggregatedSeries {
        if let Some(bar) = self.open_bar.take() {
            self.finalize(bar);
        }
        AggregatedSeries {
            snapshots: self.snapshots,
            bars: self.bars,
            stats: self.stats,
        }
    }
}

impl std::fmt::Debug for AggregationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregationEngine")
            .field("interval", &self.interval)
            .field("features", &self.features)
            .field("snapshots", &self.snapshots.len())
            .field("bars", &self.bars.len())
            .field("stats", &self.stats)
            .finish()
    }
}
