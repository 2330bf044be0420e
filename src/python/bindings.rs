//! PyO3 bindings for RaptorAlloc.
//!
//! The Python side owns widgets and styling; it calls `AllocationEngine.run`
//! on every input change and renders the returned grids.

use std::collections::HashMap;

use numpy::PyArray2;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::core::config::AllocationConfig;
use crate::core::grid::AllocationGrid;
use crate::core::types::{AllocationType, ClassId, ColumnKey, Profile, RowLevel};
use crate::display::difference::{difference_highlights, Highlight};
use crate::display::render::{render_grid, RenderOptions};
use crate::portfolio::allocation;
use crate::portfolio::engine::{AllocationEngine, AllocationReport};
use crate::portfolio::validator::{WeightCheck, WeightValidator};

use super::numpy_bridge::*;

fn parse_kind(kind: &str) -> PyResult<AllocationType> {
    match kind.to_ascii_lowercase().as_str() {
        "strategic" => Ok(AllocationType::Strategic),
        "tactical" => Ok(AllocationType::Tactical),
        "difference" => Ok(AllocationType::Difference),
        other => Err(PyValueError::new_err(format!(
            "Unknown allocation type: {}",
            other
        ))),
    }
}

fn validator_for(exact_validation: bool) -> WeightValidator {
    if exact_validation {
        WeightValidator::exact()
    } else {
        WeightValidator::default()
    }
}

// ============================================================================
// Result Classes
// ============================================================================

/// Python-exposed allocation grid.
#[pyclass(name = "AllocationGrid")]
#[derive(Debug, Clone)]
pub struct PyAllocationGrid {
    grid: AllocationGrid,
}

#[pymethods]
impl PyAllocationGrid {
    /// Stable row ids.
    fn row_ids(&self) -> Vec<String> {
        self.grid
            .rows()
            .iter()
            .map(|r| r.id.as_str().to_string())
            .collect()
    }

    /// Display labels of the rows.
    fn row_labels(&self) -> Vec<String> {
        self.grid.rows().iter().map(|r| r.label.clone()).collect()
    }

    /// "class" or "sub_class" per row.
    fn row_levels(&self) -> Vec<&'static str> {
        self.grid
            .rows()
            .iter()
            .map(|r| match r.level {
                RowLevel::Class => "class",
                RowLevel::SubClass => "sub_class",
            })
            .collect()
    }

    /// Column keys as (profile, type) tuples; profile is None for level-2 grids.
    fn columns(&self) -> Vec<(Option<String>, String)> {
        self.grid
            .columns()
            .iter()
            .map(|c| {
                (
                    c.profile.as_ref().map(|p| p.to_string()),
                    c.kind.to_string(),
                )
            })
            .collect()
    }

    /// Values as a (rows x columns) numpy array.
    fn values<'py>(&self, py: Python<'py>) -> PyResult<&'py PyArray2<f64>> {
        grid_to_numpy(py, self.grid.values(), self.grid.n_cols())
    }

    /// Single value lookup.
    #[pyo3(signature = (row_id, kind, profile=None))]
    fn get(&self, row_id: &str, kind: &str, profile: Option<&str>) -> PyResult<Option<f64>> {
        let column = ColumnKey::new(profile.map(Profile::from), parse_kind(kind)?);
        Ok(self.grid.get(row_id, &column))
    }

    /// Signed highlight intensity per cell: positive for overweight,
    /// negative for underweight, 0 elsewhere.
    fn highlights(&self) -> Vec<Vec<f64>> {
        difference_highlights(&self.grid)
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|h| match h {
                        Highlight::None => 0.0,
                        Highlight::Overweight { intensity } => intensity,
                        Highlight::Underweight { intensity } => -intensity,
                    })
                    .collect()
            })
            .collect()
    }

    /// Plain-text rendering.
    #[pyo3(signature = (title="", precision=1, emphasize_classes=false))]
    fn render(&self, title: &str, precision: usize, emphasize_classes: bool) -> String {
        render_grid(
            title,
            &self.grid,
            RenderOptions {
                precision,
                emphasize_classes,
            },
        )
    }

    fn __len__(&self) -> usize {
        self.grid.n_rows()
    }

    fn __repr__(&self) -> String {
        format!(
            "AllocationGrid(rows={}, columns={})",
            self.grid.n_rows(),
            self.grid.n_cols()
        )
    }
}

/// Python-exposed zero-sum check result.
#[pyclass(name = "WeightCheck")]
#[derive(Debug, Clone)]
pub struct PyWeightCheck {
    #[pyo3(get)]
    pub group: String,
    #[pyo3(get)]
    pub sum: f64,
    #[pyo3(get)]
    pub valid: bool,
    #[pyo3(get)]
    pub message: String,
}

impl From<&WeightCheck> for PyWeightCheck {
    fn from(check: &WeightCheck) -> Self {
        Self {
            group: check.group.clone(),
            sum: check.sum,
            valid: check.is_valid(),
            message: check.message(),
        }
    }
}

#[pymethods]
impl PyWeightCheck {
    fn __repr__(&self) -> String {
        format!(
            "WeightCheck(group={}, sum={}, valid={})",
            self.group, self.sum, self.valid
        )
    }
}

/// Python-exposed allocation report.
#[pyclass(name = "AllocationReport")]
#[derive(Debug, Clone)]
pub struct PyAllocationReport {
    #[pyo3(get)]
    pub profiles: Vec<String>,
    #[pyo3(get)]
    pub show_active_weights: bool,
    report: AllocationReport,
}

#[pymethods]
impl PyAllocationReport {
    /// Level-1 grid.
    fn level1(&self) -> PyAllocationGrid {
        PyAllocationGrid {
            grid: self.report.level1.clone(),
        }
    }

    /// Parent ids of the level-2 grids, in configuration order.
    fn level2_parents(&self) -> Vec<String> {
        self.report
            .level2
            .iter()
            .map(|r| r.parent.as_str().to_string())
            .collect()
    }

    /// Level-2 grid of a parent class.
    fn level2(&self, parent: &str) -> Option<PyAllocationGrid> {
        self.report
            .level2_grid(parent)
            .map(|grid| PyAllocationGrid { grid: grid.clone() })
    }

    /// Reconciled total grid.
    fn total(&self) -> PyAllocationGrid {
        PyAllocationGrid {
            grid: self.report.total.clone(),
        }
    }

    fn weight_checks(&self) -> Vec<PyWeightCheck> {
        self.report
            .weight_checks
            .iter()
            .map(PyWeightCheck::from)
            .collect()
    }

    fn all_weights_valid(&self) -> bool {
        self.report.all_weights_valid()
    }

    /// Full report as a JSON string.
    fn to_json(&self) -> PyResult<String> {
        Ok(self.report.to_json_pretty()?)
    }

    fn __repr__(&self) -> String {
        format!(
            "AllocationReport(profiles={}, total_rows={}, weights_valid={})",
            self.profiles.len(),
            self.report.total.n_rows(),
            self.report.all_weights_valid()
        )
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Python-exposed allocation engine.
#[pyclass(name = "AllocationEngine")]
#[derive(Debug, Clone)]
pub struct PyAllocationEngine {
    engine: AllocationEngine,
}

#[pymethods]
impl PyAllocationEngine {
    /// Engine over the built-in reference configuration.
    #[new]
    #[pyo3(signature = (exact_validation=false))]
    fn new(exact_validation: bool) -> Self {
        Self {
            engine: AllocationEngine::new(AllocationConfig::default())
                .with_validator(validator_for(exact_validation)),
        }
    }

    /// Engine over the built-in reference configuration.
    #[staticmethod]
    #[pyo3(name = "default", signature = (exact_validation=false))]
    fn py_default(exact_validation: bool) -> Self {
        Self::new(exact_validation)
    }

    /// Engine over a JSON configuration document.
    #[staticmethod]
    #[pyo3(signature = (json, exact_validation=false))]
    fn from_json(json: &str, exact_validation: bool) -> PyResult<Self> {
        let config = AllocationConfig::from_json_str(json)?;
        Ok(Self {
            engine: AllocationEngine::new(config).with_validator(validator_for(exact_validation)),
        })
    }

    /// Engine over a JSON configuration file.
    #[staticmethod]
    #[pyo3(signature = (path, exact_validation=false))]
    fn from_path(path: &str, exact_validation: bool) -> PyResult<Self> {
        let config = AllocationConfig::from_path(path)?;
        Ok(Self {
            engine: AllocationEngine::new(config).with_validator(validator_for(exact_validation)),
        })
    }

    fn profiles(&self) -> Vec<String> {
        self.engine
            .config()
            .profiles()
            .iter()
            .map(|p| p.to_string())
            .collect()
    }

    /// Seed for the level-1 active weight.
    fn default_equities_active(&self) -> f64 {
        self.engine.config().moderate_equities_active()
    }

    /// Default level-2 active weights as {parent: {sub_class: weight}}, in
    /// configuration order.
    fn default_active_weights(&self, py: Python) -> PyResult<PyObject> {
        let outer = PyDict::new(py);
        for group in self.engine.config().groups() {
            let inner = PyDict::new(py);
            for (id, &value) in group.default_active.iter() {
                inner.set_item(id.as_str(), value)?;
            }
            outer.set_item(group.parent.as_str(), inner)?;
        }
        Ok(outer.into())
    }

    /// Display label of an id.
    fn label(&self, id: &str) -> String {
        self.engine.config().label(&ClassId::from(id))
    }

    /// (min, max) bounds for active weights.
    fn bounds(&self) -> (f64, f64) {
        let bounds = self.engine.config().bounds();
        (bounds.min, bounds.max)
    }

    /// Recompute every table.
    ///
    /// Unspecified inputs fall back to the configuration defaults.
    #[pyo3(signature = (equities_active=None, active_weights=None, show_active_weights=false))]
    fn run(
        &self,
        equities_active: Option<f64>,
        active_weights: Option<HashMap<String, HashMap<String, f64>>>,
        show_active_weights: bool,
    ) -> PyResult<PyAllocationReport> {
        let config = self.engine.config();
        let mut inputs = self
            .engine
            .default_inputs()
            .with_show_active_weights(show_active_weights);

        if let Some(x) = equities_active {
            inputs.set_equities_active(x)?;
        }

        for (parent, weights) in active_weights.unwrap_or_default() {
            for (sub_class, &value) in &weights {
                config
                    .bounds()
                    .check(&format!("{}.{}", parent, sub_class), value)?;
            }
            let order = config.group(&parent).map(|g| &g.baseline);
            inputs = inputs.with_group_weights(ClassId::new(parent), dict_to_weights(weights, order));
        }

        let report = self.engine.run(&inputs)?;
        Ok(PyAllocationReport {
            profiles: report.profiles.iter().map(|p| p.to_string()).collect(),
            show_active_weights: report.show_active_weights,
            report,
        })
    }

    fn __repr__(&self) -> String {
        format!(
            "AllocationEngine(profiles={}, groups={})",
            self.engine.config().profiles().len(),
            self.engine.config().groups().len()
        )
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Zero-sum check of a single group of active weights.
#[pyfunction]
#[pyo3(signature = (weights, group="weights", exact=false))]
pub fn validate_active_weights(
    weights: HashMap<String, f64>,
    group: &str,
    exact: bool,
) -> PyWeightCheck {
    let weights = dict_to_weights(weights, None);
    PyWeightCheck::from(&validator_for(exact).validate(group, &weights))
}

/// Level-2 tactical allocation: baseline + active per key.
#[pyfunction]
pub fn compute_level2_tactical(
    baseline: HashMap<String, f64>,
    active: HashMap<String, f64>,
) -> PyResult<HashMap<String, f64>> {
    let baseline = dict_to_weights(baseline, None);
    let active = dict_to_weights(active, Some(&baseline));
    let tactical = allocation::compute_level2_tactical(&baseline, &active)?;
    Ok(weights_to_map(&tactical))
}
