//! Per-asset pipeline
//!
//! One asset is one linear, strictly ordered pipeline:
//!
//! ```text
//! periods ──► locate ──► read ──► inflate ──► decode ──► reconstruct ──► engine
//!   (in order)   │         │         │           │                        │
//!                └─────────┴─────────┴───────────┴── PeriodError ─► report │
//!                                                                         ▼
//!                                                             AssetOutput
//! ```
//!
//! A failing period is recorded and skipped; the asset moves on to the next
//! period. Nothing is shared between two `run` calls, so any number of assets
//! may run concurrently against the same `AssetPipeline`.

use std::fs;
use std::time::{Duration, Instant};

use aggregation::{AggregationEngine, EngineConfig, EngineError, EngineStats};
use lob_types::bar::BarSeries;
use lob_types::ids::{AssetCode, PeriodId};
use lob_types::snapshot::SnapshotSeries;
use lob_types::tick::TickRecord;
use sha2::{Digest, Sha256};
use tick_codec::{decode_into, reconstruct, Compression, DecodeError, Decompressor};
use tracing::{debug, error, info, warn};

use crate::error::PeriodError;
use crate::locator::{TickFile, TickFileLocator};

/// Expected snapshots per bar, used to pre-size the bar series.
pub const SNAPSHOTS_PER_BAR: usize = 20;

/// What happened to one period of one asset.
#[derive(Debug)]
pub enum PeriodOutcome {
    Processed {
        period: PeriodId,
        records: usize,
        /// The record-count hint failed and the adaptive path was used.
        hint_fallback: bool,
    },
    Skipped {
        period: PeriodId,
        error: PeriodError,
    },
}

impl PeriodOutcome {
    pub fn period(&self) -> PeriodId {
        match self {
            PeriodOutcome::Processed { period, .. } | PeriodOutcome::Skipped { period, .. } => *period,
        }
    }

    pub fn is_processed(&self) -> bool {
        matches!(self, PeriodOutcome::Processed { .. })
    }
}

/// Per-period outcomes of one asset run.
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub outcomes: Vec<PeriodOutcome>,
    pub elapsed: Duration,
}

impl PipelineReport {
    pub fn processed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_processed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.processed()
    }

    /// Skipped periods whose error is more than a warning.
    pub fn failures(&self) -> usize {
        self.errors().filter(|(_, e)| !e.is_warning()).count()
    }

    /// Reconstructed records fed to the engine.
    pub fn records(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o {
                PeriodOutcome::Processed { records, .. } => *records,
                PeriodOutcome::Skipped { .. } => 0,
            })
            .sum()
    }

    pub fn errors(&self) -> impl Iterator<Item = (PeriodId, &PeriodError)> {
        self.outcomes.iter().filter_map(|o| match o {
            PeriodOutcome::Skipped { period, error } => Some((*period, error)),
            PeriodOutcome::Processed { .. } => None,
        })
    }
}

/// Output of one asset pipeline.
#[derive(Debug)]
pub struct AssetOutput {
    pub asset: AssetCode,
    pub snapshots: SnapshotSeries,
    pub bars: BarSeries,
    pub report: PipelineReport,
    pub stats: EngineStats,
}

impl AssetOutput {
    /// SHA-256 over both series, hex encoded.
    ///
    /// Covers every record field and every feature value bit for bit.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.asset.as_str().as_bytes());
        hasher.update(b"|");

        for s in self.snapshots.records() {
            hasher.update(s.bar_index.to_le_bytes());
            hasher.update([s.second, s.trade_count, s.direction, u8::from(s.synthetic)]);
            hasher.update(s.price_tick.to_le_bytes());
            hasher.update(s.turnover.to_le_bytes());
            hasher.update(s.volume.to_le_bytes());
            for level in 0..s.bid_price_ticks.len() {
                hasher.update(s.bid_price_ticks[level].to_le_bytes());
                hasher.update(s.bid_volumes[level].to_le_bytes());
                hasher.update(s.ask_price_ticks[level].to_le_bytes());
                hasher.update(s.ask_volumes[level].to_le_bytes());
            }
        }
        hasher.update(b"---");
        hash_table(&mut hasher, self.snapshots.features());
        hasher.update(b"===");

        for b in self.bars.records() {
            hasher.update(b.time.to_string().as_bytes());
            for price in [b.open, b.high, b.low, b.close] {
                hasher.update(price.to_le_bytes());
            }
            hasher.update(b.volume.to_le_bytes());
            hasher.update(b.turnover.to_le_bytes());
        }
        hasher.update(b"---");
        hash_table(&mut hasher, self.bars.features());

        format!("{:x}", hasher.finalize())
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty() && self.bars.is_empty()
    }
}

fn hash_table(hasher: &mut Sha256, table: &lob_types::features::FeatureTable) {
    for name in table.names() {
        hasher.update(name.as_bytes());
        hasher.update(b":");
        if let Some(column) = table.column(name) {
            for value in column {
                hasher.update(value.to_bits().to_le_bytes());
            }
        }
        hasher.update(b",");
    }
}

/// Decode-and-aggregate pipeline shared by every asset of a batch.
#[derive(Debug)]
pub struct AssetPipeline<L> {
    locator: L,
    decompressor: Decompressor,
    engine: EngineConfig,
}

impl<L: TickFileLocator> AssetPipeline<L> {
    /// Fails when the engine settings cannot build an engine.
    pub fn new(locator: L, compression: Compression, engine: EngineConfig) -> Result<Self, EngineError> {
        AggregationEngine::new(&engine)?;
        Ok(Self {
            locator,
            decompressor: Decompressor::new(compression),
            engine,
        })
    }

    pub fn locator(&self) -> &L {
        &self.locator
    }

    /// Run every period of `asset`, in the order given.
    pub fn run(&self, asset: &AssetCode, periods: &[PeriodId]) -> Result<AssetOutput, EngineError> {
        let started = Instant::now();
        let mut engine = AggregationEngine::new(&self.engine)?;
        let mut report = PipelineReport::default();

        let resolved: Vec<(PeriodId, Option<TickFile>)> = periods
            .iter()
            .map(|period| (*period, self.locator.locate(asset, *period)))
            .collect();

        let expected: usize = resolved
            .iter()
            .filter_map(|(_, file)| file.as_ref().and_then(|f| f.expected_records))
            .sum();
        engine.reserve(expected, expected / SNAPSHOTS_PER_BAR);

        let mut records = Vec::new();
        for (period, file) in resolved {
            let outcome = match file {
                None => Err(PeriodError::MissingFile {
                    asset: asset.clone(),
                    period,
                }),
                Some(file) => self.load(&file, &mut records),
            };

            match outcome {
                Ok(hint_fallback) => {
                    engine.process_period(period, &records);
                    report.outcomes.push(PeriodOutcome::Processed {
                        period,
                        records: records.len(),
                        hint_fallback,
                    });
                }
                Err(err) => {
                    if err.is_warning() {
                        warn!(asset = %asset, period = %period, kind = err.kind(), error = %err, "Skipping period");
                    } else {
                        error!(asset = %asset, period = %period, kind = err.kind(), error = %err, "Skipping period");
                    }
                    report.outcomes.push(PeriodOutcome::Skipped { period, error: err });
                }
            }
        }

        let series = engine.finish();
        report.elapsed = started.elapsed();
        let output = AssetOutput {
            asset: asset.clone(),
            snapshots: series.snapshots,
            bars: series.bars,
            report,
            stats: series.stats,
        };

        info!(
            asset = %asset,
            periods = periods.len(),
            processed = output.report.processed(),
            skipped = output.report.skipped(),
            failures = output.report.failures(),
            records = output.report.records(),
            snapshots = output.snapshots.len(),
            bars = output.bars.len(),
            synthetic_snapshots = output.stats.synthetic_snapshots,
            flat_bars = output.stats.flat_bars,
            ms = output.report.elapsed.as_millis() as u64,
            digest = %output.digest(),
            "Asset processed"
        );
        Ok(output)
    }

    /// Read, inflate, decode and reconstruct one file into `records`.
    /// Returns whether the hinted path had to fall back.
    fn load(&self, file: &TickFile, records: &mut Vec<TickRecord>) -> Result<bool, PeriodError> {
        records.clear();
        let compressed = fs::read(&file.path).map_err(|source| PeriodError::Io {
            path: file.path.clone(),
            source,
        })?;
        if compressed.is_empty() {
            return Err(PeriodError::EmptyResult {
                path: file.path.clone(),
            });
        }

        let (raw, hint_fallback) = self.inflate(file, &compressed)?;
        decode_into(&raw, records)?;
        reconstruct(records);
        if records.is_empty() {
            return Err(PeriodError::EmptyResult {
                path: file.path.clone(),
            });
        }

        debug!(
            asset = %file.asset,
            period = %file.period,
            compressed = compressed.len(),
            raw = raw.len(),
            records = records.len(),
            "Decoded tick file"
        );
        if let Some(expected) = file.expected_records {
            if expected != records.len() {
                debug!(expected, actual = records.len(), "Record count differs from file name");
            }
        }
        Ok(hint_fallback)
    }

    fn inflate(&self, file: &TickFile, compressed: &[u8]) -> Result<(Vec<u8>, bool), DecodeError> {
        let Some(records) = file.expected_records else {
            return Ok((self.decompressor.inflate_adaptive(compressed)?, false));
        };
        match self.decompressor.inflate_exact(compressed, records) {
            Ok(raw) => Ok((raw, false)),
            Err(e) => {
                warn!(
                    asset = %file.asset,
                    period = %file.period,
                    expected_records = records,
                    error = %e,
                    "Hinted decompression failed, retrying adaptively"
                );
                Ok((self.decompressor.inflate_adaptive(compressed)?, true))
            }
        }
    }
}
