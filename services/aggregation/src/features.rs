//! Per-snapshot derived features
//!
//! Every aggregation step computes a fixed set of step metrics (mid price,
//! spread, VWAP, delta t) that feed the rolling histories. Which values are
//! emitted as columns is decided by a [`FeatureSet`] built from names, so new
//! metrics plug in without touching the snapshot record.
//!
//! # Built-in features
//! - `mid_price`: `best_bid + 0.5 * best_ask` (kept exactly as the archive
//!   tooling has always computed it; not the midpoint)
//! - `spread`: `best_ask - best_bid`
//! - `vwap`: step turnover / step volume, previous VWAP when nothing traded;
//!   in price ticks, like turnover per lot
//! - `delta_t`: seconds since the previous snapshot, 0 across a day change
//! - `norm_spread`: spread over its recent rolling mean
//! - `mid_price_ma`: rolling mean of the mid price
//! - `price_volatility`: rolling standard deviation of the latest price
//! - `mean_delta_t`: rolling mean of `delta_t`
//! - `ofi_bid_1..5`, `ofi_ask_1..5`: per-level order-flow imbalance

use lob_types::numeric::PRICE_EPSILON;
use lob_types::snapshot::SnapshotRecord;
use lob_types::tick::BOOK_DEPTH;

use crate::error::EngineError;
use crate::window::RollingWindow;

/// Depth of every rolling history.
pub const HISTORY_LEN: usize = 100;

/// Snapshots covered by the rolling statistics.
pub const STAT_WINDOW: usize = 20;

pub const MID_PRICE: &str = "mid_price";
pub const SPREAD: &str = "spread";
pub const VWAP: &str = "vwap";
pub const DELTA_T: &str = "delta_t";
pub const NORM_SPREAD: &str = "norm_spread";
pub const MID_PRICE_MA: &str = "mid_price_ma";
pub const PRICE_VOLATILITY: &str = "price_volatility";
pub const MEAN_DELTA_T: &str = "mean_delta_t";

/// Shorthand that expands to every built-in feature.
pub const EXTENDED: &str = "extended";

pub type History = RollingWindow<f64, HISTORY_LEN>;

// ── Step metrics ────────────────────────────────────────────────────

/// Metrics computed for every snapshot, emitted or not.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepMetrics {
    pub mid_price: f64,
    pub spread: f64,
    pub vwap: f64,
    pub delta_t: f64,
}

impl StepMetrics {
    pub fn compute(record: &SnapshotRecord, prev_vwap: Option<f64>, delta_t: f64) -> Self {
        Self {
            mid_price: mid_price(record),
            spread: spread(record),
            vwap: step_vwap(record, prev_vwap),
            delta_t,
        }
    }
}

/// Best bid plus half the best ask.
pub fn mid_price(record: &SnapshotRecord) -> f64 {
    record.best_bid() + 0.5 * record.best_ask()
}

pub fn spread(record: &SnapshotRecord) -> f64 {
    record.best_ask() - record.best_bid()
}

/// Turnover over volume for the step. Falls back to `prev_vwap`, and to the
/// latest price tick when there is no previous step.
///
/// Turnover is quoted per lot, so the quotient is in price ticks; the seed
/// must be too.
pub fn step_vwap(record: &SnapshotRecord, prev_vwap: Option<f64>) -> f64 {
    let volume = f64::from(record.volume);
    if volume < PRICE_EPSILON {
        prev_vwap.unwrap_or_else(|| f64::from(record.price_tick))
    } else {
        f64::from(record.turnover) / volume
    }
}

/// Rolling histories of the step metrics, newest at the back.
#[derive(Debug, Clone, Default)]
pub struct FeatureHistory {
    pub prices: History,
    pub spreads: History,
    pub mid_prices: History,
    pub vwaps: History,
    pub delta_ts: History,
}

impl FeatureHistory {
    pub fn record(&mut self, price: f64, metrics: &StepMetrics) {
        self.prices.push_back(price);
        self.spreads.push_back(metrics.spread);
        self.mid_prices.push_back(metrics.mid_price);
        self.vwaps.push_back(metrics.vwap);
        self.delta_ts.push_back(metrics.delta_t);
    }

    pub fn last_vwap(&self) -> Option<f64> {
        self.vwaps.back().copied()
    }
}

fn mean<'a>(values: impl Iterator<Item = &'a f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Population standard deviation.
fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values.iter())?;
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

// ── Feature trait ───────────────────────────────────────────────────

/// What a feature can see when computing its value for one snapshot.
///
/// Histories already include the current step.
pub struct FeatureContext<'a> {
    pub previous: Option<&'a SnapshotRecord>,
    pub metrics: StepMetrics,
    pub history: &'a FeatureHistory,
}

/// One named snapshot column.
pub trait SnapshotFeature: Send + Sync {
    fn name(&self) -> &str;

    fn compute(&self, record: &SnapshotRecord, ctx: &FeatureContext<'_>) -> f64;
}

struct MidPrice;

impl SnapshotFeature for MidPrice {
    fn name(&self) -> &str {
        MID_PRICE
    }

    fn compute(&self, _record: &SnapshotRecord, ctx: &FeatureContext<'_>) -> f64 {
        ctx.metrics.mid_price
    }
}

struct Spread;

impl SnapshotFeature for Spread {
    fn name(&self) -> &str {
        SPREAD
    }

    fn compute(&self, _record: &SnapshotRecord, ctx: &FeatureContext<'_>) -> f64 {
        ctx.metrics.spread
    }
}

struct Vwap;

impl SnapshotFeature for Vwap {
    fn name(&self) -> &str {
        VWAP
    }

    fn compute(&self, _record: &SnapshotRecord, ctx: &FeatureContext<'_>) -> f64 {
        ctx.metrics.vwap
    }
}

struct DeltaT;

impl SnapshotFeature for DeltaT {
    fn name(&self) -> &str {
        DELTA_T
    }

    fn compute(&self, _record: &SnapshotRecord, ctx: &FeatureContext<'_>) -> f64 {
        ctx.metrics.delta_t
    }
}

struct NormSpread;

impl SnapshotFeature for NormSpread {
    fn name(&self) -> &str {
        NORM_SPREAD
    }

    fn compute(&self, _record: &SnapshotRecord, ctx: &FeatureContext<'_>) -> f64 {
        let recent = ctx.history.spreads.last(STAT_WINDOW);
        match mean(recent.iter()) {
            Some(m) if m.abs() >= PRICE_EPSILON => ctx.metrics.spread / m,
            _ => 0.0,
        }
    }
}

struct MidPriceMa;

impl SnapshotFeature for MidPriceMa {
    fn name(&self) -> &str {
        MID_PRICE_MA
    }

    fn compute(&self, _record: &SnapshotRecord, ctx: &FeatureContext<'_>) -> f64 {
        mean(ctx.history.mid_prices.last(STAT_WINDOW).iter()).unwrap_or(ctx.metrics.mid_price)
    }
}

struct PriceVolatility;

impl SnapshotFeature for PriceVolatility {
    fn name(&self) -> &str {
        PRICE_VOLATILITY
    }

    fn compute(&self, _record: &SnapshotRecord, ctx: &FeatureContext<'_>) -> f64 {
        std_dev(&ctx.history.prices.last(STAT_WINDOW).to_vec()).unwrap_or(0.0)
    }
}

struct MeanDeltaT;

impl SnapshotFeature for MeanDeltaT {
    fn name(&self) -> &str {
        MEAN_DELTA_T
    }

    fn compute(&self, _record: &SnapshotRecord, ctx: &FeatureContext<'_>) -> f64 {
        mean(ctx.history.delta_ts.last(STAT_WINDOW).iter()).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSide {
    Bid,
    Ask,
}

/// Order-flow imbalance at one book level against the previous snapshot.
///
/// Bid side: volume added when the level price rises, volume change when it
/// holds, volume removed when it falls. The ask side mirrors this with the
/// price direction inverted.
pub struct OrderFlowImbalance {
    side: BookSide,
    level: usize,
    name: String,
}

impl OrderFlowImbalance {
    /// `level` is 1-based.
    pub fn new(side: BookSide, level: usize) -> Option<Self> {
        if !(1..=BOOK_DEPTH).contains(&level) {
            return None;
        }
        let prefix = match side {
            BookSide::Bid => "ofi_bid",
            BookSide::Ask => "ofi_ask",
        };
        Some(Self {
            side,
            level: level - 1,
            name: format!("{}_{}", prefix, level),
        })
    }
}

impl SnapshotFeature for OrderFlowImbalance {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&self, record: &SnapshotRecord, ctx: &FeatureContext<'_>) -> f64 {
        let Some(prev) = ctx.previous else {
            return 0.0;
        };
        let l = self.level;
        let (improved, held, volume, prev_volume) = match self.side {
            BookSide::Bid => {
                let (price, prev_price) = (record.bid_price_ticks[l], prev.bid_price_ticks[l]);
                (
                    price > prev_price,
                    price == prev_price,
                    record.bid_volumes[l],
                    prev.bid_volumes[l],
                )
            }
            BookSide::Ask => {
                let (price, prev_price) = (record.ask_price_ticks[l], prev.ask_price_ticks[l]);
                (
                    price < prev_price,
                    price == prev_price,
                    record.ask_volumes[l],
                    prev.ask_volumes[l],
                )
            }
        };
        let (volume, prev_volume) = (f64::from(volume), f64::from(prev_volume));
        if improved {
            volume
        } else if held {
            volume - prev_volume
        } else {
            -prev_volume
        }
    }
}

// ── Registry ────────────────────────────────────────────────────────

/// Names of the default column set.
pub fn default_names() -> Vec<String> {
    vec![MID_PRICE.to_string(), SPREAD.to_string(), VWAP.to_string()]
}

/// Names of every built-in feature, in column order.
pub fn extended_names() -> Vec<String> {
    let mut names = default_names();
    names.push(DELTA_T.to_string());
    names.push(NORM_SPREAD.to_string());
    names.push(MID_PRICE_MA.to_string());
    names.push(PRICE_VOLATILITY.to_string());
    names.push(MEAN_DELTA_T.to_string());
    for level in 1..=BOOK_DEPTH {
        names.push(format!("ofi_bid_{}", level));
    }
    for level in 1..=BOOK_DEPTH {
        names.push(format!("ofi_ask_{}", level));
    }
    names
}

/// Look up a built-in feature by name.
pub fn builtin(name: &str) -> Option<Box<dyn SnapshotFeature>> {
    match name {
        MID_PRICE => Some(Box::new(MidPrice)),
        SPREAD => Some(Box::new(Spread)),
        VWAP => Some(Box::new(Vwap)),
        DELTA_T => Some(Box::new(DeltaT)),
        NORM_SPREAD => Some(Box::new(NormSpread)),
        MID_PRICE_MA => Some(Box::new(MidPriceMa)),
        PRICE_VOLATILITY => Some(Box::new(PriceVolatility)),
        MEAN_DELTA_T => Some(Box::new(MeanDeltaT)),
        other => {
            let (side, level) = if let Some(level) = other.strip_prefix("ofi_bid_") {
                (BookSide::Bid, level)
            } else if let Some(level) = other.strip_prefix("ofi_ask_") {
                (BookSide::Ask, level)
            } else {
                return None;
            };
            let level: usize = level.parse().ok()?;
            OrderFlowImbalance::new(side, level)
                .map(|f| Box::new(f) as Box<dyn SnapshotFeature>)
        }
    }
}

/// Ordered list of features emitted as snapshot columns.
#[derive(Default)]
pub struct FeatureSet {
    features: Vec<Box<dyn SnapshotFeature>>,
}

impl FeatureSet {
    /// Build from names; `"extended"` expands to every built-in.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, EngineError> {
        let mut set = Self::default();
        for name in names {
            let name = name.as_ref();
            if name == EXTENDED {
                for n in extended_names() {
                    if !set.contains(&n) {
                        set.push_builtin(&n)?;
                    }
                }
            } else if !set.contains(name) {
                set.push_builtin(name)?;
            }
        }
        Ok(set)
    }

    /// Append a custom feature.
    pub fn push(&mut self, feature: Box<dyn SnapshotFeature>) {
        self.features.push(feature);
    }

    fn push_builtin(&mut self, name: &str) -> Result<(), EngineError> {
        let feature = builtin(name).ok_or_else(|| EngineError::UnknownFeature(name.to_string()))?;
        self.push(feature);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.features.iter().any(|f| f.name() == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.features.iter().map(|f| f.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Compute one row into `out` (cleared first), in column order.
    pub fn compute_row(&self, record: &SnapshotRecord, ctx: &FeatureContext<'_>, out: &mut Vec<f64>) {
        out.clear();
        out.extend(self.features.iter().map(|f| f.compute(record, ctx)));
    }
}

impl std::fmt::Debug for FeatureSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.features.iter().map(|x| x.name())).finish()
    }
}
