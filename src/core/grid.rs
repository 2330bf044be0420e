//! Row-labelled, (Profile x Type)-columned numeric grid.

use serde::{Deserialize, Serialize};

use super::error::{AllocError, Result};
use super::types::{AllocationType, ColumnKey, Profile, RowKey};

/// Numeric table handed to the presentation layer.
///
/// Values are stored row-major and are never rounded; formatting to a fixed
/// precision happens at render time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationGrid {
    rows: Vec<RowKey>,
    columns: Vec<ColumnKey>,
    values: Vec<Vec<f64>>,
}

impl AllocationGrid {
    /// Create an empty grid with the given columns.
    pub fn with_columns(columns: Vec<ColumnKey>) -> Self {
        Self {
            rows: Vec::new(),
            columns,
            values: Vec::new(),
        }
    }

    /// Append a row. The value count must match the column count.
    pub fn push_row(&mut self, row: RowKey, values: Vec<f64>) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(AllocError::length_mismatch(
                format!("row {}", row.id),
                self.columns.len(),
                values.len(),
            ));
        }
        self.rows.push(row);
        self.values.push(values);
        Ok(())
    }

    #[inline]
    pub fn rows(&self) -> &[RowKey] {
        &self.rows
    }

    #[inline]
    pub fn columns(&self) -> &[ColumnKey] {
        &self.columns
    }

    /// All values, one inner vector per row.
    #[inline]
    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Index of the row with the given id.
    pub fn row_index(&self, id: &str) -> Option<usize> {
        self.rows.iter().position(|r| r.id.as_str() == id)
    }

    /// Index of the given column.
    pub fn column_index(&self, column: &ColumnKey) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Value at (row id, column).
    pub fn get(&self, row_id: &str, column: &ColumnKey) -> Option<f64> {
        let r = self.row_index(row_id)?;
        let c = self.column_index(column)?;
        Some(self.values[r][c])
    }

    /// Value for a profiled column, looked up by names.
    pub fn get_profiled(&self, row_id: &str, profile: &str, kind: AllocationType) -> Option<f64> {
        self.get(row_id, &ColumnKey::profiled(&Profile::from(profile), kind))
    }

    /// Values of a single column, in row order.
    pub fn column_values(&self, column: &ColumnKey) -> Option<Vec<f64>> {
        let c = self.column_index(column)?;
        Some(self.values.iter().map(|row| row[c]).collect())
    }

    /// Distinct column profiles in order of first appearance.
    pub fn column_groups(&self) -> Vec<Option<Profile>> {
        let mut groups: Vec<Option<Profile>> = Vec::new();
        for column in &self.columns {
            if !groups.contains(&column.profile) {
                groups.push(column.profile.clone());
            }
        }
        groups
    }

    /// Build a new grid with the same rows and the given columns, computing
    /// each row's values with `f`.
    pub(crate) fn remap_columns<F>(&self, columns: Vec<ColumnKey>, mut f: F) -> Result<Self>
    where
        F: FnMut(&[f64]) -> Result<Vec<f64>>,
    {
        let mut grid = Self::with_columns(columns);
        for (row, values) in self.rows.iter().zip(&self.values) {
            let remapped = f(values)?;
            grid.push_row(row.clone(), remapped)?;
        }
        Ok(grid)
    }
}
