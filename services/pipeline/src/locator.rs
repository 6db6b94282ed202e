//! Filesystem collaborator: resolves (asset, period) to a tick file
//!
//! Archive layout:
//!
//! ```text
//! <root>/
//!   2023_07/
//!     sh600004_58381.bin
//!     sz000001_61002.bin
//!   2023_08/
//!     ...
//! ```
//!
//! File names are `<2-letter exchange prefix><asset code>_<record count>.bin`.
//! The record count is only a sizing hint; a missing or zero count means the
//! decompressor sizes its buffer adaptively.

use std::fs;
use std::path::{Path, PathBuf};

use lob_types::ids::{AssetCode, PeriodId};
use tracing::{debug, error};

/// Extension of archive files.
pub const FILE_EXTENSION: &str = "bin";

/// Length of the exchange prefix in front of the asset code.
pub const EXCHANGE_PREFIX_LEN: usize = 2;

/// One resolved archive file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickFile {
    pub asset: AssetCode,
    pub period: PeriodId,
    pub path: PathBuf,
    /// Record count embedded in the file name, if usable.
    pub expected_records: Option<usize>,
}

/// Resolves archive files for an asset and period.
pub trait TickFileLocator: Send + Sync {
    fn locate(&self, asset: &AssetCode, period: PeriodId) -> Option<TickFile>;
}

/// Locator over `<root>/<YYYY_MM>/` folders.
#[derive(Debug, Clone)]
pub struct DirectoryLocator {
    root: PathBuf,
}

impl DirectoryLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn period_dir(&self, period: PeriodId) -> PathBuf {
        self.root.join(period.folder_name())
    }
}

impl TickFileLocator for DirectoryLocator {
    fn locate(&self, asset: &AssetCode, period: PeriodId) -> Option<TickFile> {
        let dir = self.period_dir(period);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                error!(dir = %dir.display(), error = %e, "Cannot read period folder");
                return None;
            }
        };

        // Lexicographically first match, so resolution does not depend on
        // directory iteration order.
        let mut best: Option<(String, PathBuf)> = None;
        for entry in entries.flatten() {
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if asset_code_of(&name) != Some(asset.as_str()) {
                continue;
            }
            if best.as_ref().map_or(true, |(current, _)| name < *current) {
                best = Some((name, entry.path()));
            }
        }

        let (name, path) = best?;
        let expected_records = record_count_of(&name);
        debug!(
            asset = %asset,
            period = %period,
            file = %name,
            expected_records = ?expected_records,
            "Located tick file"
        );
        Some(TickFile {
            asset: asset.clone(),
            period,
            path,
            expected_records,
        })
    }
}

/// Asset code embedded in an archive file name, e.g. `600004` for
/// `sh600004_58381.bin`.
pub fn asset_code_of(file_name: &str) -> Option<&str> {
    let stem = archive_stem(file_name)?;
    let underscore = stem.find('_')?;
    if underscore <= EXCHANGE_PREFIX_LEN {
        return None;
    }
    stem.get(EXCHANGE_PREFIX_LEN..underscore)
}

/// Record count after the last underscore; zero or unparsable is no count.
pub fn record_count_of(file_name: &str) -> Option<usize> {
    let stem = archive_stem(file_name)?;
    let (_, count) = stem.rsplit_once('_')?;
    match count.parse::<usize>() {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(n),
    }
}

fn archive_stem(file_name: &str) -> Option<&str> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    (ext == FILE_EXTENSION).then_some(stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_asset_code_of() {
        assert_eq!(asset_code_of("sh600004_58381.bin"), Some("600004"));
        assert_eq!(asset_code_of("sz000001_1.bin"), Some("000001"));
        assert_eq!(asset_code_of("sh_5.bin"), None);
        assert_eq!(asset_code_of("sh600004.bin"), None);
        assert_eq!(asset_code_of("sh600004_58381.csv"), None);
    }

    #[test]
    fn test_record_count_of() {
        assert_eq!(record_count_of("sh600004_58381.bin"), Some(58_381));
        assert_eq!(record_count_of("sh600004_0.bin"), None);
        assert_eq!(record_count_of("sh600004_x.bin"), None);
        assert_eq!(record_count_of("sh600004_a_12.bin"), Some(12));
    }

    proptest! {
        #[test]
        fn prop_generated_file_names_parse_back(
            prefix in "s[hz]",
            code in "[0-9]{6}",
            records in 1usize..10_000_000,
        ) {
            let name = simulation::archive::file_name(&prefix, &AssetCode::new(code.as_str()), records);
            prop_assert_eq!(asset_code_of(&name), Some(code.as_str()));
            prop_assert_eq!(record_count_of(&name), Some(records));
        }
    }

    #[test]
    fn test_locate_in_period_folder() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("2023_07");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("sh600004_120.bin"), b"x").unwrap();
        fs::write(dir.join("sh600005_7.bin"), b"x").unwrap();
        fs::write(dir.join("notes.txt"), b"x").unwrap();

        let locator = DirectoryLocator::new(tmp.path());
        let period = PeriodId::new(2023, 7).unwrap();
        let file = locator.locate(&AssetCode::new("600004"), period).unwrap();
        assert_eq!(file.path, dir.join("sh600004_120.bin"));
        assert_eq!(file.expected_records, Some(120));
        assert_eq!(file.period, period);

        assert!(locator.locate(&AssetCode::new("600006"), period).is_none());
    }

    #[test]
    fn test_missing_period_folder_is_not_found() {
        let tmp = tempfile::TempDir::new().unwrap();
        let locator = DirectoryLocator::new(tmp.path());
        let period = PeriodId::new(2001, 1).unwrap();
        assert!(locator.locate(&AssetCode::new("600004"), period).is_none());
    }

    #[test]
    fn test_directories_are_skipped() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("2023_07");
        fs::create_dir_all(dir.join("sh600004_3.bin")).unwrap();
        let locator = DirectoryLocator::new(tmp.path());
        let period = PeriodId::new(2023, 7).unwrap();
        assert!(locator.locate(&AssetCode::new("600004"), period).is_none());
    }
}
