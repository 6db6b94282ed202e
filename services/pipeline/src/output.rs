//! Output collaborators
//!
//! An `OutputSink` receives each finished `AssetOutput` exactly once. Prices
//! leave the pipeline as ticks; sinks scale them by 0.01 at the boundary.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use lob_types::bar::BarSeries;
use lob_types::features::FeatureTable;
use lob_types::ids::AssetCode;
use lob_types::numeric::tick_to_price;
use lob_types::snapshot::SnapshotSeries;
use tracing::{debug, info};

use crate::error::SinkError;
use crate::orchestrator::AssetOutput;

pub const SNAPSHOT_SUFFIX: &str = "snapshot_3s";
pub const BAR_SUFFIX: &str = "bar_1m";

const SNAPSHOT_HEADER: [&str; 27] = [
    "index_1m",
    "seconds",
    "latest_price",
    "trade_count",
    "turnover",
    "volume",
    "bid_price_1",
    "bid_price_2",
    "bid_price_3",
    "bid_price_4",
    "bid_price_5",
    "bid_vol_1",
    "bid_vol_2",
    "bid_vol_3",
    "bid_vol_4",
    "bid_vol_5",
    "ask_price_1",
    "ask_price_2",
    "ask_price_3",
    "ask_price_4",
    "ask_price_5",
    "ask_vol_1",
    "ask_vol_2",
    "ask_vol_3",
    "ask_vol_4",
    "ask_vol_5",
    "direction",
];

const BAR_HEADER: [&str; 11] = [
    "year", "month", "day", "hour", "minute", "open", "high", "low", "close", "volume", "turnover",
];

/// Receives finished asset outputs.
pub trait OutputSink: Send + Sync {
    fn write(&self, output: &AssetOutput) -> Result<(), SinkError>;
}

/// Configuration for the CSV sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvSinkConfig {
    pub output_dir: PathBuf,
    /// Write only the last N rows of each series; `None` writes all.
    pub tail_rows: Option<usize>,
}

impl Default for CsvSinkConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            tail_rows: None,
        }
    }
}

/// Writes `<asset>_snapshot_3s.csv` and `<asset>_bar_1m.csv`.
#[derive(Debug, Clone)]
pub struct CsvSink {
    config: CsvSinkConfig,
}

impl CsvSink {
    pub fn new(config: CsvSinkConfig) -> Self {
        Self { config }
    }

    pub fn path_for(&self, asset: &AssetCode, suffix: &str) -> PathBuf {
        self.config
            .output_dir
            .join(format!("{}_{}.csv", asset, suffix))
    }

    fn first_row(&self, len: usize) -> usize {
        match self.config.tail_rows {
            Some(n) if n > 0 && n < len => len - n,
            _ => 0,
        }
    }

    fn write_snapshots(&self, asset: &AssetCode, series: &SnapshotSeries) -> Result<(), SinkError> {
        if series.is_empty() {
            return Ok(());
        }
        let path = self.path_for(asset, SNAPSHOT_SUFFIX);
        let mut writer = open_writer(&path)?;
        writer.write_record(header(&SNAPSHOT_HEADER, series.features()))?;

        let start = self.first_row(series.len());
        let mut row: Vec<String> = Vec::with_capacity(SNAPSHOT_HEADER.len() + series.features().width());
        for (i, s) in series.records().iter().enumerate().skip(start) {
            row.clear();
            row.push(s.bar_index.to_string());
            row.push(s.second.to_string());
            row.push(price(s.price_tick));
            row.push(s.trade_count.to_string());
            row.push(s.turnover.to_string());
            row.push(s.volume.to_string());
            row.extend(s.bid_price_ticks.iter().map(|t| price(*t)));
            row.extend(s.bid_volumes.iter().map(|v| v.to_string()));
            row.extend(s.ask_price_ticks.iter().map(|t| price(*t)));
            row.extend(s.ask_volumes.iter().map(|v| v.to_string()));
            row.push(s.direction.to_string());
            push_features(&mut row, series.features(), i);
            writer.write_record(&row)?;
        }
        writer.flush()?;
        debug!(path = %path.display(), rows = series.len() - start, "Wrote snapshot CSV");
        Ok(())
    }

    fn write_bars(&self, asset: &AssetCode, series: &BarSeries) -> Result<(), SinkError> {
        if series.is_empty() {
            return Ok(());
        }
        let path = self.path_for(asset, BAR_SUFFIX);
        let mut writer = open_writer(&path)?;
        writer.write_record(header(&BAR_HEADER, series.features()))?;

        let start = self.first_row(series.len());
        let mut row: Vec<String> = Vec::with_capacity(BAR_HEADER.len() + series.features().width());
        for (i, b) in series.records().iter().enumerate().skip(start) {
            row.clear();
            row.push(b.time.year.to_string());
            row.push(b.time.month.to_string());
            row.push(b.time.day.to_string());
            row.push(b.time.hour.to_string());
            row.push(b.time.minute.to_string());
            row.push(price(b.open));
            row.push(price(b.high));
            row.push(price(b.low));
            row.push(price(b.close));
            row.push(b.volume.to_string());
            row.push(b.turnover.to_string());
            push_features(&mut row, series.features(), i);
            writer.write_record(&row)?;
        }
        writer.flush()?;
        debug!(path = %path.display(), rows = series.len() - start, "Wrote bar CSV");
        Ok(())
    }
}

impl OutputSink for CsvSink {
    fn write(&self, output: &AssetOutput) -> Result<(), SinkError> {
        if output.is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.config.output_dir)?;
        self.write_bars(&output.asset, &output.bars)?;
        self.write_snapshots(&output.asset, &output.snapshots)?;
        info!(
            asset = %output.asset,
            dir = %self.config.output_dir.display(),
            bars = output.bars.len(),
            snapshots = output.snapshots.len(),
            "Wrote CSV output"
        );
        Ok(())
    }
}

fn open_writer(path: &Path) -> Result<csv::Writer<fs::File>, SinkError> {
    Ok(csv::WriterBuilder::new().has_headers(true).from_path(path)?)
}

fn header<'a>(fixed: &'a [&'a str], features: &'a FeatureTable) -> Vec<&'a str> {
    fixed
        .iter()
        .copied()
        .chain(features.names().iter().map(String::as_str))
        .collect()
}

fn push_features(row: &mut Vec<String>, features: &FeatureTable, index: usize) {
    for name in features.names() {
        let value = features.value(index, name).unwrap_or(0.0);
        row.push(value.to_string());
    }
}

fn price(tick: i16) -> String {
    format!("{:.2}", tick_to_price(tick))
}

/// Keeps every output in memory. Period reports are not retained.
#[derive(Debug, Default)]
pub struct MemorySink {
    outputs: Mutex<Vec<AssetOutput>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything written so far, sorted by asset code.
    pub fn take(&self) -> Vec<AssetOutput> {
        let mut outputs = match self.outputs.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        outputs.sort_by(|a, b| a.asset.cmp(&b.asset));
        outputs
    }
}

impl OutputSink for MemorySink {
    fn write(&self, output: &AssetOutput) -> Result<(), SinkError> {
        let copy = AssetOutput {
            asset: output.asset.clone(),
            snapshots: output.snapshots.clone(),
            bars: output.bars.clone(),
            report: Default::default(),
            stats: output.stats,
        };
        match self.outputs.lock() {
            Ok(mut guard) => guard.push(copy),
            Err(poisoned) => poisoned.into_inner().push(copy),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::PipelineReport;
    use aggregation::{AggregationEngine, EngineConfig};
    use lob_types::ids::PeriodId;
    use lob_types::tick::TickRecord;

    fn output(ticks: &[(u16, i16)]) -> AssetOutput {
        let mut engine = AggregationEngine::new(&EngineConfig::default()).unwrap();
        let period = PeriodId::new(2023, 7).unwrap();
        for (time_s, price_tick) in ticks {
            engine.process(
                period,
                &TickRecord {
                    day: 14,
                    time_s: *time_s,
                    price_tick: *price_tick,
                    volume: 2,
                    turnover: 2 * *price_tick as u32,
                    bid_price_ticks: [price_tick - 1; 5],
                    ask_price_ticks: [price_tick + 1; 5],
                    ..Default::default()
                },
            );
        }
        let series = engine.finish();
        AssetOutput {
            asset: AssetCode::new("600004"),
            snapshots: series.snapshots,
            bars: series.bars,
            report: PipelineReport::default(),
            stats: series.stats,
        }
    }

    fn sink(dir: &Path, tail_rows: Option<usize>) -> CsvSink {
        CsvSink::new(CsvSinkConfig {
            output_dir: dir.to_path_buf(),
            tail_rows,
        })
    }

    #[test]
    fn test_csv_headers_and_scaling() {
        let tmp = tempfile::TempDir::new().unwrap();
        let sink = sink(tmp.path(), None);
        let out = output(&[(34_200, 1000), (34_203, 997)]);
        sink.write(&out).unwrap();

        let text = fs::read_to_string(tmp.path().join("600004_snapshot_3s.csv")).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("index_1m,seconds,latest_price,trade_count"));
        assert!(header.ends_with("direction,mid_price,spread,vwap"));
        let second = lines.nth(1).unwrap();
        assert!(second.starts_with("0,3,9.97,0,1994,2,9.96,"));
        assert_eq!(text.lines().count(), 3);

        let bars = fs::read_to_string(tmp.path().join("600004_bar_1m.csv")).unwrap();
        let mut lines = bars.lines();
        assert_eq!(
            lines.next().unwrap(),
            "year,month,day,hour,minute,open,high,low,close,volume,turnover,vwap"
        );
        assert!(lines.next().unwrap().starts_with("2023,7,14,9,30,10.00,10.00,9.97,9.97,4,3994,"));
    }

    #[test]
    fn test_tail_rows_keeps_latest() {
        let tmp = tempfile::TempDir::new().unwrap();
        let sink = sink(tmp.path(), Some(2));
        let out = output(&[(34_200, 1000), (34_203, 1001), (34_206, 1002), (34_209, 1003)]);
        sink.write(&out).unwrap();

        let text = fs::read_to_string(tmp.path().join("600004_snapshot_3s.csv")).unwrap();
        let rows: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("0,6,10.02,"));
        assert!(rows[1].starts_with("0,9,10.03,"));
    }

    #[test]
    fn test_empty_output_writes_nothing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let out_dir = tmp.path().join("out");
        let sink = sink(&out_dir, None);
        sink.write(&output(&[])).unwrap();
        assert!(!out_dir.exists());
    }

    #[test]
    fn test_memory_sink_collects_sorted() {
        let sink = MemorySink::new();
        let mut b = output(&[(34_200, 1000)]);
        b.asset = AssetCode::new("600005");
        let a = output(&[(34_200, 1000)]);
        sink.write(&b).unwrap();
        sink.write(&a).unwrap();

        let outputs = sink.take();
        let codes: Vec<&str> = outputs.iter().map(|o| o.asset.as_str()).collect();
        assert_eq!(codes, vec!["600004", "600005"]);
        assert_eq!(outputs[0].digest(), a.digest());
        assert!(sink.take().is_empty());
    }
}
