use lob_types::errors::ModelError;
use thiserror::Error;

/// Engine construction errors. Processing itself never fails.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Unknown feature: {0}")]
    UnknownFeature(String),

    #[error("Aggregation interval must be at least one second")]
    InvalidInterval,

    #[error(transparent)]
    Model(#[from] ModelError),
}
