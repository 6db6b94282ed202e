//! Decode-and-aggregate pipeline over tick archives
//!
//! Drives every asset of a stock universe through:
//! - File location in `YYYY_MM` period folders
//! - Decompression, record decoding and delta reconstruction
//! - Snapshot and one-minute bar aggregation
//! - Output to CSV (or memory)
//!
//! # Architecture
//!
//! ```text
//!  stock info + config
//!          │
//!   ┌──────▼──────┐
//!   │ BatchRunner │  ← bounded rayon pool, one job per asset
//!   └──────┬──────┘
//!     ┌────┴────┬─────────┐
//!   ┌─▼──┐   ┌──▼─┐    ┌──▼─┐
//!   │Pipe│   │Pipe│ …  │Pipe│  ← AssetPipeline::run, strictly sequential
//!   └─┬──┘   └──┬─┘    └──┬─┘
//!   ┌─▼─────────▼─────────▼─┐
//!   │      OutputSink       │
//!   └───────────────────────┘
//! ```
//!
//! Assets share nothing mutable; a failure in one never reaches another.

pub mod batch;
pub mod config;
pub mod error;
pub mod locator;
pub mod orchestrator;
pub mod output;

pub use batch::{plan_jobs, AssetJob, AssetStatus, AssetSummary, BatchRunner, BatchSummary};
pub use config::{load_stock_info, month_range, AppConfig, StockInfo, StockUniverse};
pub use error::{BatchError, ConfigError, PeriodError, SinkError};
pub use locator::{DirectoryLocator, TickFile, TickFileLocator};
pub use orchestrator::{AssetOutput, AssetPipeline, PeriodOutcome, PipelineReport};
pub use output::{CsvSink, CsvSinkConfig, MemorySink, OutputSink};
