//! Archive files on disk
//!
//! Layout: `<root>/<YYYY_MM>/<prefix><asset>_<record count>.bin`, one
//! compressed, delta-encoded file per asset per period.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use lob_types::ids::{AssetCode, PeriodId};
use lob_types::tick::TickRecord;
use tick_codec::{encode_absolute, Compression};
use tracing::debug;

use crate::generator::TickGenerator;

/// Delta-encode, pack and compress absolute records.
pub fn encode_file(records: &[TickRecord], compression: Compression) -> io::Result<Vec<u8>> {
    encode_absolute(records, compression)
}

/// File name carrying the asset code and record count.
pub fn file_name(prefix: &str, asset: &AssetCode, records: usize) -> String {
    format!("{}{}_{}.bin", prefix, asset, records)
}

/// Write one period file, creating the period folder if needed.
pub fn write_period_file(
    root: &Path,
    period: PeriodId,
    prefix: &str,
    asset: &AssetCode,
    records: &[TickRecord],
    compression: Compression,
) -> io::Result<PathBuf> {
    let dir = root.join(period.folder_name());
    fs::create_dir_all(&dir)?;
    let path = dir.join(file_name(prefix, asset, records.len()));
    let bytes = encode_file(records, compression)?;
    fs::write(&path, &bytes)?;

    debug!(
        asset = %asset,
        period = %period,
        records = records.len(),
        bytes = bytes.len(),
        "Wrote archive file"
    );
    Ok(path)
}

/// Generate `days` trading days per period and write one file per period.
pub fn write_asset_archive(
    root: &Path,
    prefix: &str,
    asset: &AssetCode,
    periods: &[PeriodId],
    days: u8,
    generator: &mut TickGenerator,
    compression: Compression,
) -> io::Result<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(periods.len());
    for period in periods {
        let records = generator.generate_days(1..=days);
        paths.push(write_period_file(root, *period, prefix, asset, &records, compression)?);
    }
    Ok(paths)
}
