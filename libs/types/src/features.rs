//! Named-column feature table
//!
//! Derived metrics (mid price, spread, VWAP, order-flow imbalance, ...) are
//! stored column-wise next to a record sequence instead of as struct fields,
//! so the set of metrics can grow without touching the record contract.
//! Row `i` of the table belongs to record `i` of the owning series.

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Column-major table of `f64` features.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    rows: usize,
}

impl FeatureTable {
    /// Create an empty table with the given columns.
    pub fn new<I, S>(names: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_capacity(names, 0)
    }

    /// Create an empty table, reserving `rows` rows per column.
    pub fn with_capacity<I, S>(names: I, rows: usize) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::default();
        for name in names {
            table.add_column(name, 0.0)?;
        }
        for column in &mut table.columns {
            column.reserve(rows);
        }
        Ok(table)
    }

    /// Append a column; existing rows are filled with `fill`.
    pub fn add_column(&mut self, name: impl Into<String>, fill: f64) -> Result<(), ModelError> {
        let name = name.into();
        if self.names.contains(&name) {
            return Err(ModelError::DuplicateColumn(name));
        }
        self.names.push(name);
        self.columns.push(vec![fill; self.rows]);
        Ok(())
    }

    /// Append one row.
    ///
    /// # Panics
    /// If `row` does not hold exactly one value per column.
    pub fn push_row(&mut self, row: &[f64]) {
        assert_eq!(
            row.len(),
            self.columns.len(),
            "feature row width does not match column count"
        );
        for (column, value) in self.columns.iter_mut().zip(row) {
            column.push(*value);
        }
        self.rows += 1;
    }

    /// Column values by name.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.position(name).map(|i| self.columns[i].as_slice())
    }

    /// Single value at (`row`, `name`).
    pub fn value(&self, row: usize, name: &str) -> Option<f64> {
        self.column(name).and_then(|c| c.get(row).copied())
    }

    /// All values of one row, in column order.
    pub fn row(&self, row: usize) -> Option<Vec<f64>> {
        if row >= self.rows {
            return None;
        }
        Some(self.columns.iter().map(|c| c[row]).collect())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn width(&self) -> usize {
        self.names.len()
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_read_columns() {
        let mut table = FeatureTable::new(["mid_price", "spread"]).unwrap();
        table.push_row(&[10.0, 0.01]);
        table.push_row(&[10.5, 0.02]);

        assert_eq!(table.len(), 2);
        assert_eq!(table.column("spread").unwrap(), &[0.01, 0.02]);
        assert_eq!(table.value(1, "mid_price"), Some(10.5));
        assert_eq!(table.row(0).unwrap(), vec![10.0, 0.01]);
        assert!(table.row(2).is_none());
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let result = FeatureTable::new(["vwap", "vwap"]);
        assert_eq!(result, Err(ModelError::DuplicateColumn("vwap".to_string())));
    }

    #[test]
    fn test_add_column_backfills_existing_rows() {
        let mut table = FeatureTable::new(["vwap"]).unwrap();
        table.push_row(&[1.0]);
        table.push_row(&[2.0]);
        table.add_column("ofi_bid_1", f64::NAN).unwrap();

        let ofi = table.column("ofi_bid_1").unwrap();
        assert_eq!(ofi.len(), 2);
        assert!(ofi.iter().all(|v| v.is_nan()));

        table.push_row(&[3.0, 4.0]);
        assert_eq!(table.value(2, "ofi_bid_1"), Some(4.0));
    }

    #[test]
    #[should_panic(expected = "feature row width")]
    fn test_push_row_width_mismatch_panics() {
        let mut table = FeatureTable::new(["a", "b"]).unwrap();
        table.push_row(&[1.0]);
    }
}
