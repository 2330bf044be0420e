//! Active-weight (Tactical - Strategic) columns and their highlighting.

use serde::{Deserialize, Serialize};

use crate::core::error::{AllocError, Result};
use crate::core::grid::AllocationGrid;
use crate::core::types::{AllocationType, ColumnKey};

/// Difference magnitude (percentage points) at which highlighting saturates.
pub const HIGHLIGHT_SATURATION: f64 = 10.0;

/// Add a `Difference = Tactical - Strategic` column for every column group
/// (profile) and reorder columns to Strategic, Tactical, Difference per group.
///
/// Existing Difference columns are recomputed. Group order follows the first
/// appearance of each profile in the input.
///
/// # Errors
/// `KeyMismatch` if a group lacks its Strategic or Tactical column.
pub fn add_difference_columns(grid: &AllocationGrid) -> Result<AllocationGrid> {
    let mut columns = Vec::new();
    let mut sources = Vec::new();
    let mut missing = Vec::new();

    for profile in grid.column_groups() {
        let strategic = ColumnKey::new(profile.clone(), AllocationType::Strategic);
        let tactical = ColumnKey::new(profile.clone(), AllocationType::Tactical);
        match (grid.column_index(&strategic), grid.column_index(&tactical)) {
            (Some(s), Some(t)) => {
                sources.push((s, t));
                columns.push(strategic);
                columns.push(tactical);
                columns.push(ColumnKey::new(profile, AllocationType::Difference));
            }
            (s, t) => {
                if s.is_none() {
                    missing.push(strategic.to_string());
                }
                if t.is_none() {
                    missing.push(tactical.to_string());
                }
            }
        }
    }

    if !missing.is_empty() {
        return Err(AllocError::key_mismatch(
            "difference columns",
            missing,
            Vec::new(),
        ));
    }

    grid.remap_columns(columns, |row| {
        Ok(sources
            .iter()
            .flat_map(|&(s, t)| [row[s], row[t], row[t] - row[s]])
            .collect())
    })
}

/// Highlight of a difference cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Highlight {
    /// Zero difference.
    None,
    /// Tactical above strategic.
    Overweight { intensity: f64 },
    /// Tactical below strategic.
    Underweight { intensity: f64 },
}

impl Highlight {
    /// Classify a difference; intensity is `min(1, |value| / 10)`.
    pub fn for_difference(value: f64) -> Self {
        let intensity = (value.abs() / HIGHLIGHT_SATURATION).min(1.0);
        if value > 0.0 {
            Highlight::Overweight { intensity }
        } else if value < 0.0 {
            Highlight::Underweight { intensity }
        } else {
            Highlight::None
        }
    }

    pub fn intensity(self) -> f64 {
        match self {
            Highlight::None => 0.0,
            Highlight::Overweight { intensity } | Highlight::Underweight { intensity } => {
                intensity
            }
        }
    }
}

/// Highlights for every cell of the grid; non-Difference cells are `None`.
pub fn difference_highlights(grid: &AllocationGrid) -> Vec<Vec<Highlight>> {
    grid.values()
        .iter()
        .map(|row| {
            row.iter()
                .zip(grid.columns())
                .map(|(&value, column)| match column.kind {
                    AllocationType::Difference => Highlight::for_difference(value),
                    _ => Highlight::None,
                })
                .collect()
        })
        .collect()
}
