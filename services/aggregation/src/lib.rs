//! Aggregation service
//!
//! Turns one asset's reconstructed tick stream into gap-free 3-second
//! snapshots and one-minute OHLC bars.
//!
//! # Modules
//! - `window`: Fixed-capacity double-ended rolling window
//! - `features`: Step metrics, rolling histories and the feature registry
//! - `engine`: Snapshot/bar state machine with gap synthesis
//! - `error`: Engine construction errors

pub mod engine;
pub mod error;
pub mod features;
pub mod window;

pub use engine::{AggregatedSeries, AggregationEngine, EngineConfig, EngineStats, DEFAULT_INTERVAL_SECS};
pub use error::EngineError;
pub use features::{FeatureContext, FeatureSet, SnapshotFeature, StepMetrics};
pub use window::{RollingWindow, SplitView};
