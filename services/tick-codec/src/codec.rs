//! Fixed-width record codec
//!
//! A decompressed buffer is a plain concatenation of 54-byte records. The
//! buffer length must be an exact multiple of the record width; anything
//! else means a truncated or foreign file.

use lob_types::tick::{TickRecord, RECORD_WIDTH};

use crate::error::CodecError;

/// Decode every record in `bytes`, in file order.
pub fn decode_records(bytes: &[u8]) -> Result<Vec<TickRecord>, CodecError> {
    let mut records = Vec::with_capacity(bytes.len() / RECORD_WIDTH);
    decode_into(bytes, &mut records)?;
    Ok(records)
}

/// Decode into a reusable buffer. `out` is cleared first; on error it is
/// left empty.
pub fn decode_into(bytes: &[u8], out: &mut Vec<TickRecord>) -> Result<(), CodecError> {
    out.clear();
    check_length(bytes.len())?;

    out.reserve(bytes.len() / RECORD_WIDTH);
    let mut packed = [0u8; RECORD_WIDTH];
    for chunk in bytes.chunks_exact(RECORD_WIDTH) {
        packed.copy_from_slice(chunk);
        out.push(TickRecord::from_bytes(&packed));
    }
    Ok(())
}

/// Pack records back into the on-disk layout.
pub fn encode_records(records: &[TickRecord]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(records.len() * RECORD_WIDTH);
    for record in records {
        bytes.extend_from_slice(&record.to_bytes());
    }
    bytes
}

fn check_length(len: usize) -> Result<(), CodecError> {
    if len % RECORD_WIDTH != 0 {
        return Err(CodecError::SizeMismatch {
            len,
            width: RECORD_WIDTH,
        });
    }
    Ok(())
}
