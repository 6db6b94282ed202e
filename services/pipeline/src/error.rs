//! Error taxonomy for the pipeline
//!
//! Per-period errors never abort an asset: each one is recorded in the
//! asset's report and the pipeline moves on to the next period.

use std::io;
use std::path::PathBuf;

use aggregation::EngineError;
use lob_types::errors::ModelError;
use lob_types::ids::{AssetCode, PeriodId};
use thiserror::Error;
use tick_codec::{CodecError, DecodeError};

/// Failure to turn one period file into records.
#[derive(Error, Debug)]
pub enum PeriodError {
    #[error("No tick file for {asset} in {period}")]
    MissingFile { asset: AssetCode, period: PeriodId },

    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Size mismatch: {0}")]
    SizeMismatch(#[from] CodecError),

    #[error("File decoded to zero records: {}", .path.display())]
    EmptyResult { path: PathBuf },
}

impl PeriodError {
    /// Warnings are expected conditions rather than damaged input.
    pub fn is_warning(&self) -> bool {
        matches!(self, PeriodError::EmptyResult { .. })
    }

    /// Short stable label for reports.
    pub fn kind(&self) -> &'static str {
        match self {
            PeriodError::MissingFile { .. } => "missing_file",
            PeriodError::Io { .. } => "io",
            PeriodError::Decode(_) => "decode",
            PeriodError::SizeMismatch(_) => "size_mismatch",
            PeriodError::EmptyResult { .. } => "empty_result",
        }
    }
}

/// Configuration loading failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid JSON in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid month: {0}")]
    Month(#[from] ModelError),

    #[error("Invalid engine settings: {0}")]
    Engine(#[from] EngineError),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Output sink failures.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Batch setup failures.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Cannot build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
