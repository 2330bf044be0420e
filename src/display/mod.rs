//! Display-side derivations: difference columns, highlights and text output.

pub mod difference;
pub mod render;

pub use difference::{add_difference_columns, difference_highlights, Highlight};
pub use render::{render_check, render_grid, RenderOptions};
