//! JSON configuration and stock lifespans
//!
//! Two files drive a batch:
//! - the application config (`AppConfig`): where the archive lives, where
//!   output goes, the last month with data, worker count and engine settings
//! - the stock universe: one `StockInfo` per asset code, giving the listing
//!   lifespan that decides which period folders are visited

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use aggregation::{EngineConfig, FeatureSet};
use chrono::{Datelike, NaiveDate};
use lob_types::ids::{AssetCode, PeriodId};
use serde::{Deserialize, Serialize};
use tick_codec::Compression;

use crate::error::ConfigError;

/// Worker count when hardware concurrency cannot be determined.
pub const FALLBACK_THREADS: usize = 4;

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root containing `YYYY_MM` period folders.
    pub snapshot_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Last month with data (`YYYY-MM`); lifespan end of listed assets.
    pub end_month: String,
    /// Worker threads; hardware concurrency when absent.
    #[serde(default)]
    pub threads: Option<usize>,
    /// Write only the last N rows of each CSV.
    #[serde(default)]
    pub tail_rows: Option<usize>,
    #[serde(default)]
    pub compression: Compression,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = read(path)?;
        let config: AppConfig = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.end_period()?;
        if self.threads == Some(0) {
            return Err(ConfigError::Invalid("threads must be at least 1".to_string()));
        }
        if self.engine.interval_secs == 0 {
            return Err(ConfigError::Invalid("engine.interval_secs must be at least 1".to_string()));
        }
        FeatureSet::from_names(self.engine.features.as_slice())?;
        Ok(())
    }

    pub fn end_period(&self) -> Result<PeriodId, ConfigError> {
        parse_month(&self.end_month)
    }

    /// Configured worker count, else hardware concurrency, else 4.
    pub fn thread_count(&self) -> usize {
        self.threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(FALLBACK_THREADS)
        })
    }
}

/// Listing metadata of one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockInfo {
    pub name: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub sub_industry: String,
    /// `YYYY-MM` or `YYYY-MM-DD`.
    pub ipo_date: String,
    #[serde(default)]
    pub delist_date: Option<String>,
    #[serde(default)]
    pub is_delisted: bool,
}

impl StockInfo {
    /// First and last period of the listing. Still-listed assets (and
    /// delisted ones without a date) end at `end_month`.
    pub fn lifespan(&self, end_month: PeriodId) -> Result<(PeriodId, PeriodId), ConfigError> {
        let start = parse_month(&self.ipo_date)?;
        let end = match (&self.delist_date, self.is_delisted) {
            (Some(date), true) => parse_month(date)?,
            _ => end_month,
        };
        Ok((start, end))
    }

    /// Every period of the listing, in chronological order.
    pub fn periods(&self, end_month: PeriodId) -> Result<Vec<PeriodId>, ConfigError> {
        let (start, end) = self.lifespan(end_month)?;
        Ok(month_range(start, end))
    }
}

/// Stock universe keyed by asset code; iteration is in code order.
pub type StockUniverse = BTreeMap<AssetCode, StockInfo>;

pub fn load_stock_info(path: &Path) -> Result<StockUniverse, ConfigError> {
    let text = read(path)?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Every period from `start` to `end`, inclusive; empty when inverted.
pub fn month_range(start: PeriodId, end: PeriodId) -> Vec<PeriodId> {
    PeriodId::range_inclusive(start, end)
}

/// Parse `YYYY-MM`, or a full `YYYY-MM-DD` date truncated to its month.
pub fn parse_month(text: &str) -> Result<PeriodId, ConfigError> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        let year = u16::try_from(date.year())
            .map_err(|_| ConfigError::Invalid(format!("year out of range: {}", text)))?;
        return Ok(PeriodId::new(year, date.month() as u8)?);
    }
    Ok(PeriodId::parse_year_month(text)?)
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
