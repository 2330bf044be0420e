//! Plain-text rendering of allocation grids.

use std::fmt::Write;

use crate::core::grid::AllocationGrid;
use crate::core::types::AllocationType;
use crate::portfolio::validator::WeightCheck;

/// Precision used by the dashboard (one decimal place).
pub const DEFAULT_PRECISION: usize = 1;

const SUB_CLASS_INDENT: &str = "  ";
const CLASS_MARKER: &str = "* ";

/// Format a value to `precision` decimals. Differences carry an explicit sign.
pub fn format_value(value: f64, kind: AllocationType, precision: usize) -> String {
    match kind {
        AllocationType::Difference => format!("{:+.*}", precision, value),
        _ => format!("{:.*}", precision, value),
    }
}

/// Options for [`render_grid`].
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub precision: usize,
    /// Mark level-1 rows (used for the total table).
    pub emphasize_classes: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            emphasize_classes: false,
        }
    }
}

/// Render a grid as an aligned text table with a profile header line and a
/// type header line. Sub-class rows are indented under their parent.
pub fn render_grid(title: &str, grid: &AllocationGrid, options: RenderOptions) -> String {
    let labels: Vec<String> = grid
        .rows()
        .iter()
        .map(|row| {
            if row.is_class() {
                if options.emphasize_classes {
                    format!("{}{}", CLASS_MARKER, row.label)
                } else {
                    row.label.clone()
                }
            } else {
                format!("{}{}", SUB_CLASS_INDENT, row.label)
            }
        })
        .collect();

    let cells: Vec<Vec<String>> = grid
        .values()
        .iter()
        .map(|row| {
            row.iter()
                .zip(grid.columns())
                .map(|(&v, column)| format_value(v, column.kind, options.precision))
                .collect()
        })
        .collect();

    let profile_header: Vec<String> = grid
        .columns()
        .iter()
        .map(|c| c.profile.as_ref().map(|p| p.to_string()).unwrap_or_default())
        .collect();
    let type_header: Vec<String> = grid.columns().iter().map(|c| c.kind.to_string()).collect();

    let label_width = labels.iter().map(String::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..grid.n_cols())
        .map(|c| {
            cells
                .iter()
                .map(|row| row[c].len())
                .chain([profile_header[c].len(), type_header[c].len()])
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let _ = writeln!(out, "{}", title);

    let has_profiles = profile_header.iter().any(|p| !p.is_empty());
    if has_profiles {
        let _ = writeln!(out, "{}", header_line(label_width, &widths, &profile_header));
    }
    let _ = writeln!(out, "{}", header_line(label_width, &widths, &type_header));

    let rule_len = label_width + widths.iter().map(|w| w + 2).sum::<usize>();
    let _ = writeln!(out, "{}", "-".repeat(rule_len));

    for (label, row) in labels.iter().zip(&cells) {
        let mut line = format!("{:<width$}", label, width = label_width);
        for (cell, &w) in row.iter().zip(&widths) {
            let _ = write!(line, "  {:>width$}", cell, width = w);
        }
        let _ = writeln!(out, "{}", line);
    }
    out
}

fn header_line(label_width: usize, widths: &[usize], header: &[String]) -> String {
    let mut line = " ".repeat(label_width);
    for (text, &w) in header.iter().zip(widths) {
        let _ = write!(line, "  {:>width$}", text, width = w);
    }
    line
}

/// One status line per weight check.
pub fn render_check(check: &WeightCheck) -> String {
    let marker = if check.is_valid() { "[ok]" } else { "[!!]" };
    format!("{} {}", marker, check.message())
}
