//! Conversions between Python objects and engine types.

use std::collections::HashMap;

use numpy::PyArray2;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::core::types::{ClassId, Weights};

/// Convert row-major grid values to a 2-D numpy array (rows x columns).
pub fn grid_to_numpy<'py>(
    py: Python<'py>,
    values: &[Vec<f64>],
    n_cols: usize,
) -> PyResult<&'py PyArray2<f64>> {
    if values.is_empty() {
        return Ok(PyArray2::zeros(py, [0, n_cols], false));
    }
    PyArray2::from_vec2(py, values).map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Convert a Python dict of weights into ordered weights.
///
/// Keys known to `order` come first in its declaration order; any other keys
/// follow sorted by name, so key-set mismatches are still reported by the
/// engine.
pub fn dict_to_weights(mut dict: HashMap<String, f64>, order: Option<&Weights>) -> Weights {
    let mut weights = Weights::new();
    if let Some(order) = order {
        for key in order.keys() {
            if let Some(value) = dict.remove(key.as_str()) {
                weights.insert(key.clone(), value);
            }
        }
    }
    let mut rest: Vec<(String, f64)> = dict.into_iter().collect();
    rest.sort_by(|a, b| a.0.cmp(&b.0));
    for (key, value) in rest {
        weights.insert(ClassId::new(key), value);
    }
    weights
}

/// Convert ordered weights into a plain map.
pub fn weights_to_map(weights: &Weights) -> HashMap<String, f64> {
    weights
        .iter()
        .map(|(k, &v)| (k.as_str().to_string(), v))
        .collect()
}
