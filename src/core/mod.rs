//! Core types and utilities for RaptorAlloc.

pub mod config;
pub mod error;
pub mod grid;
pub mod ordered;
pub mod types;

pub use config::{AllocationConfig, Level1Tilt, Level2Group, WeightBounds};
pub use error::{AllocError, Result};
pub use grid::AllocationGrid;
pub use ordered::{KeyDifference, WeightTotal};
pub use types::*;
