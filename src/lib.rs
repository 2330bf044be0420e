// Suppress warning from PyO3 macro expansion (fixed in newer PyO3 versions)
#![cfg_attr(feature = "python", allow(non_local_definitions))]

//! RaptorAlloc - strategic/tactical asset allocation engine.
//!
//! This crate provides:
//! - Level-1 tactical allocation across risk profiles (strategic + multiplier x active)
//! - Level-2 tactical allocation within a broad asset class (baseline + active)
//! - Zero-sum validation of active weights
//! - Reconciliation of sub-class rows into portfolio-level totals
//! - Difference columns and plain-text rendering for presentation

pub mod core;
pub mod display;
pub mod portfolio;
#[cfg(feature = "python")]
pub mod python;

pub use crate::core::{AllocError, AllocationConfig, AllocationGrid, Result};
pub use crate::portfolio::{AllocationEngine, AllocationInputs, AllocationReport};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python module entry point
#[cfg(feature = "python")]
#[pymodule]
fn _raptoralloc(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    // Register engine and result classes
    m.add_class::<python::bindings::PyAllocationEngine>()?;
    m.add_class::<python::bindings::PyAllocationReport>()?;
    m.add_class::<python::bindings::PyAllocationGrid>()?;
    m.add_class::<python::bindings::PyWeightCheck>()?;

    // Register standalone functions
    m.add_function(wrap_pyfunction!(
        python::bindings::validate_active_weights,
        m
    )?)?;
    m.add_function(wrap_pyfunction!(
        python::bindings::compute_level2_tactical,
        m
    )?)?;

    Ok(())
}
