//! Error types for the tick codec

use thiserror::Error;

/// Decompression failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Compressed input is empty")]
    EmptyInput,

    #[error("Record hint {records} overflows the target buffer size")]
    HintOverflow { records: usize },

    #[error("Decompressed data does not fit the hinted {target} bytes ({records} records)")]
    HintTooSmall { records: usize, target: usize },

    #[error("Decompressed data exceeds {max_len} bytes ({compressed_len} compressed bytes)")]
    BoundExceeded { compressed_len: usize, max_len: usize },

    #[error("Corrupt {codec} stream: {reason}")]
    Corrupt { codec: &'static str, reason: String },
}

/// Record layout failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Decompressed length {len} is not a multiple of the {width}-byte record width")]
    SizeMismatch { len: usize, width: usize },
}
