//! Tick archive codec
//!
//! Turns the compressed bytes of one archive file into an ordered array of
//! absolute tick records, and back again.
//!
//! # Decode flow
//!
//! ```text
//! compressed bytes
//!        │
//!  ┌─────▼──────┐
//!  │Decompressor│  ← exact size from record hint, else adaptive doubling
//!  └─────┬──────┘
//!  ┌─────▼──────┐
//!  │   Codec    │  ← 54-byte fixed-width records, length must divide evenly
//!  └─────┬──────┘
//!  ┌─────▼──────┐
//!  │Reconstruct │  ← running deltas → absolute values, strictly in order
//!  └─────┬──────┘
//!        ▼
//!  Vec<TickRecord>
//! ```
//!
//! Every file is reconstructed on its own, starting from its first record;
//! no state is carried between files.

pub mod codec;
pub mod compression;
pub mod error;
pub mod reconstruct;

pub use codec::{decode_into, decode_records, encode_records};
pub use compression::{compress, Compression, Decompressor, INITIAL_EXPANSION, MAX_EXPANSION};
pub use error::{CodecError, DecodeError};
pub use reconstruct::{delta_encode, reconstruct};

use lob_types::tick::TickRecord;

/// Decode raw (already inflated) bytes and reverse the delta encoding.
pub fn decode_absolute(raw: &[u8]) -> Result<Vec<TickRecord>, CodecError> {
    let mut records = decode_records(raw)?;
    reconstruct(&mut records);
    Ok(records)
}

/// Inverse of the full decode flow: delta-encode, pack and compress.
pub fn encode_absolute(
    records: &[TickRecord],
    compression: Compression,
) -> std::io::Result<Vec<u8>> {
    let mut raw = records.to_vec();
    delta_encode(&mut raw);
    compress(&encode_records(&raw), compression)
}
