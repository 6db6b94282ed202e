//! Decompression with bounded output sizing
//!
//! Archive files are single compressed streams whose decompressed size is
//! not stored in the stream. Two sizing strategies:
//!
//! - **Hinted**: the filename carries the record count, so the output
//!   buffer is allocated at exactly `records * 54` bytes and one attempt is
//!   made. Output that does not fit is an error.
//! - **Adaptive**: no hint. Start at 8x the compressed size, double while
//!   the stream does not fit, give up past 32x.
//!
//! zlib is the archive format; zstd is accepted as an alternative container.

use std::io::{self, Read, Write};

use flate2::write::ZlibEncoder;
use flate2::{Decompress, FlushDecompress, Status};
use lob_types::tick::RECORD_WIDTH;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::DecodeError;

/// First adaptive attempt, as a multiple of the compressed size.
pub const INITIAL_EXPANSION: usize = 8;

/// Largest adaptive attempt, as a multiple of the compressed size.
pub const MAX_EXPANSION: usize = 32;

/// zstd level used when writing archives.
const ZSTD_LEVEL: i32 = 3;

/// Stream container of an archive file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Zlib,
    Zstd,
}

impl Compression {
    pub fn name(&self) -> &'static str {
        match self {
            Compression::Zlib => "zlib",
            Compression::Zstd => "zstd",
        }
    }
}

/// Stateless decompressor for one stream container.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decompressor {
    compression: Compression,
}

impl Decompressor {
    pub fn new(compression: Compression) -> Self {
        Self { compression }
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Decompress using the hinted path when a record count is known,
    /// otherwise the adaptive path.
    pub fn inflate(
        &self,
        compressed: &[u8],
        record_hint: Option<usize>,
    ) -> Result<Vec<u8>, DecodeError> {
        match record_hint {
            Some(records) => self.inflate_exact(compressed, records),
            None => self.inflate_adaptive(compressed),
        }
    }

    /// Single attempt into a buffer of exactly `records * RECORD_WIDTH` bytes.
    pub fn inflate_exact(&self, compressed: &[u8], records: usize) -> Result<Vec<u8>, DecodeError> {
        if compressed.is_empty() {
            return Err(DecodeError::EmptyInput);
        }
        let target = records
            .checked_mul(RECORD_WIDTH)
            .ok_or(DecodeError::HintOverflow { records })?;

        trace!(
            codec = self.compression.name(),
            compressed_len = compressed.len(),
            target,
            "Hinted decompression"
        );

        self.attempt(compressed, target)?
            .ok_or(DecodeError::HintTooSmall { records, target })
    }

    /// Doubling attempts from 8x up to 32x the compressed size.
    pub fn inflate_adaptive(&self, compressed: &[u8]) -> Result<Vec<u8>, DecodeError> {
        if compressed.is_empty() {
            return Err(DecodeError::EmptyInput);
        }
        let max_len = compressed.len().saturating_mul(MAX_EXPANSION);
        let mut capacity = compressed.len().saturating_mul(INITIAL_EXPANSION);

        loop {
            if let Some(buf) = self.attempt(compressed, capacity)? {
                return Ok(buf);
            }
            if capacity >= max_len {
                return Err(DecodeError::BoundExceeded {
                    compressed_len: compressed.len(),
                    max_len,
                });
            }
            debug!(
                codec = self.compression.name(),
                capacity,
                "Destination too small, doubling"
            );
            capacity = capacity.saturating_mul(2).min(max_len);
        }
    }

    /// `Ok(None)` means the stream did not fit into `capacity` bytes.
    fn attempt(&self, compressed: &[u8], capacity: usize) -> Result<Option<Vec<u8>>, DecodeError> {
        match self.compression {
            Compression::Zlib => inflate_zlib(compressed, capacity),
            Compression::Zstd => inflate_zstd(compressed, capacity),
        }
    }
}

fn inflate_zlib(compressed: &[u8], capacity: usize) -> Result<Option<Vec<u8>>, DecodeError> {
    let mut out = vec![0u8; capacity];
    let mut inflater = Decompress::new(true);

    match inflater.decompress(compressed, &mut out, FlushDecompress::Finish) {
        Ok(Status::StreamEnd) => {
            out.truncate(inflater.total_out() as usize);
            Ok(Some(out))
        }
        Ok(Status::Ok) | Ok(Status::BufError) => {
            if inflater.total_out() as usize >= capacity {
                Ok(None)
            } else {
                Err(DecodeError::Corrupt {
                    codec: "zlib",
                    reason: "stream ended before completion".to_string(),
                })
            }
        }
        Err(e) => Err(DecodeError::Corrupt {
            codec: "zlib",
            reason: e.to_string(),
        }),
    }
}

/// Streams at most `capacity + 1` bytes; reaching the extra byte means the
/// frame does not fit.
fn inflate_zstd(compressed: &[u8], capacity: usize) -> Result<Option<Vec<u8>>, DecodeError> {
    let corrupt = |e: io::Error| DecodeError::Corrupt {
        codec: "zstd",
        reason: e.to_string(),
    };
    let decoder = zstd::stream::read::Decoder::new(compressed).map_err(corrupt)?;
    let mut out = Vec::with_capacity(capacity);
    decoder
        .take(capacity as u64 + 1)
        .read_to_end(&mut out)
        .map_err(corrupt)?;

    if out.len() > capacity {
        Ok(None)
    } else {
        Ok(Some(out))
    }
}

/// Compress a raw record buffer into the given container.
pub fn compress(raw: &[u8], compression: Compression) -> io::Result<Vec<u8>> {
    match compression {
        Compression::Zlib => {
            let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(raw)?;
            encoder.finish()
        }
        Compression::Zstd => zstd::encode_all(raw, ZSTD_LEVEL),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_records(count: usize) -> Vec<u8> {
        (0..count * RECORD_WIDTH).map(|i| (i % 7) as u8).collect()
    }

    /// Incompressible noise followed by a long zero run: compresses by
    /// roughly 15x, between the first adaptive attempt and the bound.
    fn mid_ratio_records() -> Vec<u8> {
        let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
        let mut raw: Vec<u8> = (0..1_080)
            .map(|_| {
                state = state
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407);
                (state >> 56) as u8
            })
            .collect();
        raw.resize(300 * RECORD_WIDTH, 0);
        raw
    }

    fn assert_adaptive_doubles(compression: Compression) {
        let raw = mid_ratio_records();
        let packed = compress(&raw, compression).unwrap();
        // The first attempt cannot hold the output, the bound can
        assert!(raw.len() > packed.len() * INITIAL_EXPANSION);
        assert!(raw.len() <= packed.len() * MAX_EXPANSION);

        let out = Decompressor::new(compression).inflate_adaptive(&packed).unwrap();
        assert_eq!(out, raw);
    }

    #[test]
    fn test_hinted_zlib_exact_size() {
        let raw = raw_records(40);
        let packed = compress(&raw, Compression::Zlib).unwrap();
        let out = Decompressor::new(Compression::Zlib)
            .inflate(&packed, Some(40))
            .unwrap();
        assert_eq!(out, raw);
    }

    #[test]
    fn test_hinted_too_small_is_error() {
        let raw = raw_records(40);
        let packed = compress(&raw, Compression::Zlib).unwrap();
        let err = Decompressor::new(Compression::Zlib)
            .inflate(&packed, Some(39))
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::HintTooSmall {
                records: 39,
                target: 39 * RECORD_WIDTH
            }
        );
    }

    #[test]
    fn test_hint_larger_than_data_yields_actual_length() {
        let raw = raw_records(10);
        let packed = compress(&raw, Compression::Zlib).unwrap();
        let out = Decompressor::new(Compression::Zlib)
            .inflate(&packed, Some(12))
            .unwrap();
        assert_eq!(out.len(), 10 * RECORD_WIDTH);
    }

    #[test]
    fn test_adaptive_zlib_succeeds_after_doubling() {
        assert_adaptive_doubles(Compression::Zlib);
    }

    #[test]
    fn test_adaptive_zstd_succeeds_after_doubling() {
        assert_adaptive_doubles(Compression::Zstd);
    }

    #[test]
    fn test_zstd_truncated_and_garbage_are_corrupt() {
        let raw = raw_records(25);
        let packed = compress(&raw, Compression::Zstd).unwrap();
        let d = Decompressor::new(Compression::Zstd);
        assert!(matches!(
            d.inflate(&packed[..packed.len() / 2], Some(25)),
            Err(DecodeError::Corrupt { codec: "zstd", .. })
        ));
        assert!(matches!(
            d.inflate(&[1, 2, 3, 4, 5, 6], Some(1)),
            Err(DecodeError::Corrupt { codec: "zstd", .. })
        ));
    }

    #[test]
    fn test_adaptive_within_initial_bound() {
        let raw = raw_records(3);
        let packed = compress(&raw, Compression::Zlib).unwrap();
        let out = Decompressor::new(Compression::Zlib)
            .inflate_adaptive(&packed)
            .unwrap();
        assert_eq!(out, raw);
    }

    #[test]
    fn test_adaptive_bound_exceeded() {
        let raw = vec![0u8; 1 << 20];
        let packed = compress(&raw, Compression::Zlib).unwrap();
        let err = Decompressor::new(Compression::Zlib)
            .inflate_adaptive(&packed)
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::BoundExceeded {
                compressed_len: packed.len(),
                max_len: packed.len() * MAX_EXPANSION,
            }
        );
    }

    #[test]
    fn test_corrupt_zlib_stream() {
        let err = Decompressor::new(Compression::Zlib)
            .inflate(&[0xde, 0xad, 0xbe, 0xef, 0x00, 0x01], None)
            .unwrap_err();
        assert!(matches!(err, DecodeError::Corrupt { codec: "zlib", .. }));
    }

    #[test]
    fn test_truncated_zlib_stream() {
        let raw = raw_records(20);
        let packed = compress(&raw, Compression::Zlib).unwrap();
        let truncated = &packed[..packed.len() / 2];
        let err = Decompressor::new(Compression::Zlib)
            .inflate(truncated, Some(20))
            .unwrap_err();
        assert!(matches!(err, DecodeError::Corrupt { .. }));
    }

    #[test]
    fn test_empty_input() {
        let d = Decompressor::default();
        assert_eq!(d.inflate(&[], Some(3)), Err(DecodeError::EmptyInput));
        assert_eq!(d.inflate(&[], None), Err(DecodeError::EmptyInput));
    }

    #[test]
    fn test_hint_overflow() {
        let err = Decompressor::default()
            .inflate(&[1, 2, 3], Some(usize::MAX))
            .unwrap_err();
        assert_eq!(err, DecodeError::HintOverflow { records: usize::MAX });
    }

    #[test]
    fn test_zstd_hinted_and_adaptive() {
        let raw = raw_records(25);
        let packed = compress(&raw, Compression::Zstd).unwrap();
        let d = Decompressor::new(Compression::Zstd);
        assert_eq!(d.inflate(&packed, Some(25)).unwrap(), raw);
        assert!(matches!(
            d.inflate(&packed, Some(5)),
            Err(DecodeError::HintTooSmall { records: 5, .. })
        ));
    }

    #[test]
    fn test_compression_default_and_names() {
        assert_eq!(Compression::default(), Compression::Zlib);
        assert_eq!(Compression::Zstd.name(), "zstd");
    }
}
