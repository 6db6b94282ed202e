//! Identifier types for assets and archive periods
//!
//! An asset is addressed by its exchange code (e.g. `600004`). An archive
//! period is one calendar month; on disk every period is a folder named
//! `YYYY_MM`, and configuration files spell months as `YYYY-MM`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Exchange code of a single asset (stock, fund, index).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetCode(String);

impl AssetCode {
    /// Create an asset code without validation.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Create an asset code, rejecting empty or non-alphanumeric input.
    pub fn try_new(code: impl Into<String>) -> Result<Self, ModelError> {
        let code = code.into();
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ModelError::InvalidAssetCode(code));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AssetCode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_new(s)
    }
}

/// One calendar month of archived ticks.
///
/// Field order makes the derived `Ord` chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeriodId {
    pub year: u16,
    pub month: u8,
}

impl PeriodId {
    pub fn new(year: u16, month: u8) -> Result<Self, ModelError> {
        if !(1..=12).contains(&month) {
            return Err(ModelError::InvalidPeriod(format!("{:04}-{:02}", year, month)));
        }
        Ok(Self { year, month })
    }

    /// Parse a period folder name such as `2023_07`.
    pub fn parse_folder(name: &str) -> Result<Self, ModelError> {
        Self::parse_with(name, '_')
    }

    /// Parse a configuration month such as `2023-07`.
    pub fn parse_year_month(text: &str) -> Result<Self, ModelError> {
        Self::parse_with(text, '-')
    }

    fn parse_with(text: &str, sep: char) -> Result<Self, ModelError> {
        let invalid = || ModelError::InvalidPeriod(text.to_string());
        let (year, month) = text.trim().split_once(sep).ok_or_else(invalid)?;
        if year.len() != 4 || month.is_empty() || month.len() > 2 {
            return Err(invalid());
        }
        let year: u16 = year.parse().map_err(|_| invalid())?;
        let month: u8 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }

    /// Folder name used by the tick archive (`YYYY_MM`).
    pub fn folder_name(&self) -> String {
        format!("{:04}_{:02}", self.year, self.month)
    }

    /// The following calendar month.
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Every period from `start` to `end`, both inclusive, in chronological
    /// order. An inverted range is empty.
    pub fn range_inclusive(start: PeriodId, end: PeriodId) -> Vec<PeriodId> {
        let mut periods = Vec::new();
        let mut current = start;
        while current <= end {
            periods.push(current);
            current = current.next();
        }
        periods
    }
}

impl fmt::Display for PeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}_{:02}", self.year, self.month)
    }
}
