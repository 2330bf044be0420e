//! Reconciliation of level-1 and level-2 allocations into one total table.

use tracing::debug;

use crate::core::error::{AllocError, Result};
use crate::core::grid::AllocationGrid;
use crate::core::types::{label_for, AllocationType, ClassId, Labels, ProfileTable, RowKey};

use super::allocation::{Level1Allocation, Level2Allocation};

/// Build the total allocation table.
///
/// Rows are emitted per level-1 class in `strategic` declaration order: the
/// class row (level-1 values), then its sub-class rows in level-2
/// declaration order, each re-based as
/// `own[sub, Type] * level1[parent, Profile, Type] / 100`.
/// Classes without a level-2 breakdown (e.g. cash) contribute their class row
/// only. Columns match the level-1 grid.
///
/// # Errors
/// `UnknownClass` if a level-2 table names a parent that is not a level-1
/// class, or a level-1 class is missing from `level1`.
pub fn reconcile_totals(
    level1: &Level1Allocation,
    level2: &[Level2Allocation],
    strategic: &ProfileTable,
    labels: &Labels,
) -> Result<AllocationGrid> {
    if let Some(orphan) = level2.iter().find(|t| !strategic.contains_key(t.parent())) {
        return Err(AllocError::unknown_class(orphan.parent().as_str()));
    }

    let columns = level1.columns();
    let mut grid = AllocationGrid::with_columns(columns.clone());

    for class in strategic.keys() {
        let parent_values = level1
            .row_values(class)
            .ok_or_else(|| AllocError::unknown_class(class.as_str()))?;
        grid.push_row(
            RowKey::class(class.clone(), label_for(labels, class)),
            parent_values.clone(),
        )?;

        let Some(breakdown) = level2.iter().find(|t| t.parent() == class) else {
            continue;
        };
        for sub_class in breakdown.sub_classes() {
            let values = columns
                .iter()
                .zip(&parent_values)
                .map(|(column, &parent_value)| {
                    breakdown
                        .own(sub_class, column.kind)
                        .map(|own| own * parent_value / 100.0)
                        .ok_or_else(|| AllocError::unknown_class(sub_class.as_str()))
                })
                .collect::<Result<Vec<f64>>>()?;
            grid.push_row(
                RowKey::sub_class(sub_class.clone(), label_for(labels, sub_class), class.clone()),
                values,
            )?;
        }
    }

    debug!(rows = grid.n_rows(), cols = grid.n_cols(), "reconciled total allocations");
    Ok(grid)
}

/// Largest absolute gap, over all parents and Strategic/Tactical columns,
/// between a parent row and the sum of its sub-class rows.
///
/// Parents without sub-class rows are skipped.
pub fn max_parent_residual(grid: &AllocationGrid) -> f64 {
    let mut worst: f64 = 0.0;
    for (r, row) in grid.rows().iter().enumerate() {
        if !row.is_class() {
            continue;
        }
        let children: Vec<usize> = sub_class_rows(grid, &row.id).map(|(i, _)| i).collect();
        if children.is_empty() {
            continue;
        }
        for (c, column) in grid.columns().iter().enumerate() {
            if column.kind == AllocationType::Difference {
                continue;
            }
            let total: f64 = children.iter().map(|&i| grid.values()[i][c]).sum();
            worst = worst.max((total - grid.values()[r][c]).abs());
        }
    }
    worst
}

/// Sub-class rows of `parent` in the total table, with their row indices.
pub fn sub_class_rows<'a>(
    grid: &'a AllocationGrid,
    parent: &'a ClassId,
) -> impl Iterator<Item = (usize, &'a RowKey)> {
    grid.rows()
        .iter()
        .enumerate()
        .filter(move |(_, row)| row.parent.as_ref() == Some(parent))
}
