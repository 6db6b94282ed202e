//! Error types for the shared data model
//!
//! Parsing failures for identifiers coming from folder names, file names and
//! configuration files, plus misuse of the feature table.

use thiserror::Error;

/// Errors raised while building model values from external text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid period identifier: {0}")]
    InvalidPeriod(String),

    #[error("Invalid asset code: {0:?}")]
    InvalidAssetCode(String),

    #[error("Duplicate feature column: {0}")]
    DuplicateColumn(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_period_display() {
        let err = ModelError::InvalidPeriod("2023-13".to_string());
        assert_eq!(err.to_string(), "Invalid period identifier: 2023-13");
    }

    #[test]
    fn test_asset_code_display_is_quoted() {
        let err = ModelError::InvalidAssetCode(String::new());
        assert_eq!(err.to_string(), "Invalid asset code: \"\"");
    }
}
