//! Allocation pipeline: level 1 -> weight checks -> level 2 -> totals.
//!
//! The engine holds the immutable configuration and recomputes every table
//! from scratch on each call to [`AllocationEngine::run`]; front ends call it
//! whenever an input changes.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::core::config::{AllocationConfig, WeightBounds};
use crate::core::error::{AllocError, Result};
use crate::core::grid::AllocationGrid;
use crate::core::ordered::KeyDifference;
use crate::core::types::{ClassId, Profile, Weights};
use crate::display::difference::add_difference_columns;

use super::allocation::{Level1Allocation, Level2Allocation};
use super::reconcile::{max_parent_residual, reconcile_totals};
use super::validator::{WeightCheck, WeightValidator};

/// User-controlled inputs of one recomputation.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationInputs {
    /// Level-1 degree of freedom (moderate profile's equities active weight).
    equities_active: f64,
    /// Level-2 active weights keyed by parent class.
    level2_active: IndexMap<ClassId, Weights>,
    show_active_weights: bool,
    bounds: WeightBounds,
}

impl AllocationInputs {
    /// Inputs seeded from the configuration defaults.
    pub fn from_defaults(config: &AllocationConfig) -> Self {
        Self {
            equities_active: config.moderate_equities_active(),
            level2_active: config
                .groups()
                .iter()
                .map(|g| (g.parent.clone(), g.default_active.clone()))
                .collect(),
            show_active_weights: false,
            bounds: config.bounds(),
        }
    }

    #[inline]
    pub fn equities_active(&self) -> f64 {
        self.equities_active
    }

    #[inline]
    pub fn level2_active(&self) -> &IndexMap<ClassId, Weights> {
        &self.level2_active
    }

    /// Active weights of the group under `parent`.
    pub fn group_active(&self, parent: &str) -> Option<&Weights> {
        self.level2_active.get(parent)
    }

    #[inline]
    pub fn show_active_weights(&self) -> bool {
        self.show_active_weights
    }

    /// Set the level-1 active weight, rejecting values outside the bounds.
    pub fn set_equities_active(&mut self, value: f64) -> Result<()> {
        self.bounds.check("equities active weight", value)?;
        self.equities_active = value;
        Ok(())
    }

    /// Set one level-2 active weight, rejecting unknown ids and values outside
    /// the bounds.
    pub fn set_active_weight(&mut self, parent: &str, sub_class: &str, value: f64) -> Result<()> {
        self.bounds
            .check(&format!("{}.{}", parent, sub_class), value)?;
        let group = self
            .level2_active
            .get_mut(parent)
            .ok_or_else(|| AllocError::unknown_class(parent))?;
        let slot = group
            .get_mut(sub_class)
            .ok_or_else(|| AllocError::unknown_class(format!("{}.{}", parent, sub_class)))?;
        *slot = value;
        Ok(())
    }

    /// Replace the whole weight set of a group. Key sets are checked when
    /// the engine runs.
    pub fn with_group_weights(mut self, parent: ClassId, weights: Weights) -> Self {
        self.level2_active.insert(parent, weights);
        self
    }

    pub fn with_show_active_weights(mut self, show: bool) -> Self {
        self.show_active_weights = show;
        self
    }

    pub fn set_show_active_weights(&mut self, show: bool) {
        self.show_active_weights = show;
    }
}

/// Level-2 table of one parent class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Level2Report {
    pub parent: ClassId,
    pub label: String,
    pub grid: AllocationGrid,
}

/// Everything the presentation layer needs for one render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationReport {
    pub profiles: Vec<Profile>,
    pub level1: AllocationGrid,
    pub level2: Vec<Level2Report>,
    pub total: AllocationGrid,
    pub weight_checks: Vec<WeightCheck>,
    pub show_active_weights: bool,
}

impl AllocationReport {
    /// True when every level-2 group passed the zero-sum check.
    pub fn all_weights_valid(&self) -> bool {
        self.weight_checks.iter().all(WeightCheck::is_valid)
    }

    /// Level-2 grid of the group under `parent`.
    pub fn level2_grid(&self, parent: &str) -> Option<&AllocationGrid> {
        self.level2
            .iter()
            .find(|r| r.parent.as_str() == parent)
            .map(|r| &r.grid)
    }

    /// Serialize the report as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Stateless allocation engine over an immutable configuration.
#[derive(Debug, Clone)]
pub struct AllocationEngine {
    config: AllocationConfig,
    validator: WeightValidator,
}

impl AllocationEngine {
    /// Create an engine with the default (tolerance-based) validator.
    pub fn new(config: AllocationConfig) -> Self {
        Self {
            config,
            validator: WeightValidator::default(),
        }
    }

    /// Use a specific weight validator.
    pub fn with_validator(mut self, validator: WeightValidator) -> Self {
        self.validator = validator;
        self
    }

    #[inline]
    pub fn config(&self) -> &AllocationConfig {
        &self.config
    }

    #[inline]
    pub fn validator(&self) -> &WeightValidator {
        &self.validator
    }

    /// Inputs seeded from the configuration defaults.
    pub fn default_inputs(&self) -> AllocationInputs {
        AllocationInputs::from_defaults(&self.config)
    }

    /// Run the full pipeline.
    ///
    /// Zero-sum violations are reported in [`AllocationReport::weight_checks`]
    /// and do not stop the computation. Key-set mismatches are fatal.
    pub fn run(&self, inputs: &AllocationInputs) -> Result<AllocationReport> {
        let config = &self.config;
        let labels = config.labels();

        let level1 = Level1Allocation::compute(
            config.strategic(),
            config.multipliers(),
            config.tilt(),
            inputs.equities_active(),
        )?;

        let configured: IndexMap<ClassId, ()> = config
            .groups()
            .iter()
            .map(|g| (g.parent.clone(), ()))
            .collect();
        let (missing, unexpected) = inputs.level2_active().key_difference(&configured);
        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(AllocError::key_mismatch(
                "level-2 groups",
                missing.into_iter().map(|k| k.to_string()).collect(),
                unexpected.into_iter().map(|k| k.to_string()).collect(),
            ));
        }

        let mut weight_checks = Vec::with_capacity(config.groups().len());
        let mut level2 = Vec::with_capacity(config.groups().len());
        for group in config.groups() {
            let active = inputs
                .group_active(group.parent.as_str())
                .ok_or_else(|| AllocError::unknown_class(group.parent.as_str()))?;
            weight_checks.push(self.validator.validate(&config.label(&group.parent), active));
            level2.push(Level2Allocation::compute(
                group.parent.clone(),
                &group.baseline,
                active,
            )?);
        }

        let total = reconcile_totals(&level1, &level2, config.strategic(), labels)?;
        debug!(residual = max_parent_residual(&total), "total table reconciled");

        let annotate = |grid: AllocationGrid| -> Result<AllocationGrid> {
            if inputs.show_active_weights() {
                add_difference_columns(&grid)
            } else {
                Ok(grid)
            }
        };

        let level2_reports = level2
            .iter()
            .map(|l2| -> Result<Level2Report> {
                Ok(Level2Report {
                    parent: l2.parent().clone(),
                    label: config.label(l2.parent()),
                    grid: annotate(l2.to_grid(labels)?)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let report = AllocationReport {
            profiles: config.profiles(),
            level1: annotate(level1.to_grid(labels)?)?,
            level2: level2_reports,
            total: annotate(total)?,
            weight_checks,
            show_active_weights: inputs.show_active_weights(),
        };

        info!(
            equities_active = inputs.equities_active(),
            weights_valid = report.all_weights_valid(),
            rows = report.total.n_rows(),
            "allocation run complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::AllocationType;

    fn engine() -> AllocationEngine {
        AllocationEngine::new(AllocationConfig::default())
    }

    #[test]
    fn test_default_run() {
        let engine = engine();
        let report = engine.run(&engine.default_inputs()).unwrap();

        assert_eq!(report.profiles.len(), 3);
        assert_eq!(report.level1.n_rows(), 3);
        assert_eq!(report.level2.len(), 2);
        // 3 classes + 6 equity sub-classes + 5 fixed income sectors
        assert_eq!(report.total.n_rows(), 14);
        assert!(report.all_weights_valid());
        assert!(!report.show_active_weights);
    }

    #[test]
    fn test_show_active_weights_adds_difference_columns() {
        let engine = engine();
        let inputs = engine.default_inputs().with_show_active_weights(true);
        let report = engine.run(&inputs).unwrap();

        assert_eq!(report.level1.n_cols(), 9);
        assert_eq!(report.total.n_cols(), 9);
        assert_eq!(report.level2_grid("equities").unwrap().n_cols(), 3);

        let d = report
            .level2_grid("equities")
            .unwrap()
            .get(
                "large_cap_growth",
                &crate::core::types::ColumnKey::unprofiled(AllocationType::Difference),
            )
            .unwrap();
        assert!((d - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_invalid_weights_do_not_block() {
        let engine = engine();
        let mut inputs = engine.default_inputs();
        inputs.set_active_weight("fixed_income", "high_yield", 2.0).unwrap();

        let report = engine.run(&inputs).unwrap();
        assert!(!report.all_weights_valid());
        let fixed_income = report.level2_grid("fixed_income").unwrap();
        let tactical = fixed_income
            .get(
                "high_yield",
                &crate::core::types::ColumnKey::unprofiled(AllocationType::Tactical),
            )
            .unwrap();
        assert!((tactical - 12.0).abs() < 1e-10);
    }

    #[test]
    fn test_input_bounds() {
        let engine = engine();
        let mut inputs = engine.default_inputs();
        assert!(matches!(
            inputs.set_equities_active(10.5),
            Err(AllocError::OutOfRange { .. })
        ));
        assert!(inputs.set_equities_active(-10.0).is_ok());
        assert!(matches!(
            inputs.set_active_weight("equities", "mid_cap", 1.0),
            Err(AllocError::UnknownClass { .. })
        ));
        assert!(matches!(
            inputs.set_active_weight("alternatives", "gold", 1.0),
            Err(AllocError::UnknownClass { .. })
        ));
    }

    #[test]
    fn test_partial_group_weights_are_fatal() {
        let engine = engine();
        let partial: Weights = [(ClassId::from("large_cap_growth"), 0.0)]
            .into_iter()
            .collect();
        let inputs = engine
            .default_inputs()
            .with_group_weights(ClassId::from("equities"), partial);
        assert!(matches!(
            engine.run(&inputs),
            Err(AllocError::KeyMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_group_is_fatal() {
        let engine = engine();
        let inputs = engine
            .default_inputs()
            .with_group_weights(ClassId::from("alternatives"), Weights::new());
        assert!(matches!(
            engine.run(&inputs),
            Err(AllocError::KeyMismatch { .. })
        ));
    }

    #[test]
    fn test_report_serializes() {
        let engine = engine();
        let json = engine
            .run(&engine.default_inputs())
            .unwrap()
            .to_json_pretty()
            .unwrap();
        assert!(json.contains("\"weight_checks\""));
        assert!(json.contains("Large Cap Growth"));
    }
}
