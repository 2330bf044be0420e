//! Allocation configuration.
//!
//! Loaded once per session from JSON, validated, then treated as immutable.
//! Malformed or inconsistent configuration is fatal; default active weights
//! that do not net to zero only produce a warning, matching how the weight
//! validator treats user input.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::portfolio::validator::ZeroSumCheck;

use super::error::{AllocError, Result};
use super::ordered::{KeyDifference, WeightTotal};
use super::types::{label_for, ClassId, Labels, Multipliers, Profile, ProfileTable, Weights};

/// Stable id of the equities asset class.
pub const EQUITIES: &str = "equities";
/// Stable id of the fixed income asset class.
pub const FIXED_INCOME: &str = "fixed_income";
/// Stable id of the cash asset class.
pub const CASH: &str = "cash";

/// Tolerance for "sums to 100" checks on configured baselines.
const PERCENT_SUM_TOLERANCE: f64 = 1e-6;

/// Inclusive bounds for user-entered active weights (percentage points).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for WeightBounds {
    fn default() -> Self {
        Self {
            min: -10.0,
            max: 10.0,
        }
    }
}

impl WeightBounds {
    /// Reject `value` if it falls outside the bounds.
    pub fn check(&self, field: &str, value: f64) -> Result<()> {
        if !value.is_finite() || value < self.min || value > self.max {
            return Err(AllocError::out_of_range(field, value, self.min, self.max));
        }
        Ok(())
    }
}

/// Level-2 breakdown of one top-level asset class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level2Group {
    /// Parent level-1 class.
    pub parent: ClassId,
    /// Sub-class -> strategic own-percentage, summing to 100.
    pub baseline: Weights,
    /// Sub-class -> default active weight, expected to net to zero.
    pub default_active: Weights,
}

impl Level2Group {
    /// Whether the default active weights pass the run-time zero-sum check.
    pub fn defaults_balanced(&self) -> bool {
        ZeroSumCheck::default().passes(self.default_active.total())
    }
}

/// The single level-1 degree of freedom: `overweight` receives `+x`,
/// `underweight` receives `-x`, every other class receives 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level1Tilt {
    pub overweight: ClassId,
    pub underweight: ClassId,
}

impl Default for Level1Tilt {
    fn default() -> Self {
        Self {
            overweight: ClassId::from(EQUITIES),
            underweight: ClassId::from(FIXED_INCOME),
        }
    }
}

/// JSON layout of the configuration file.
#[derive(Debug, Deserialize)]
struct RawConfig {
    multipliers: Multipliers,
    strategic_allocations: ProfileTable,
    equities_size_style: Weights,
    fixed_income_sector: Weights,
    default_equities_active_weight: Weights,
    default_fixed_income_active_weight: Weights,
    moderate_equities_active: f64,
    #[serde(default)]
    labels: Labels,
    #[serde(default)]
    active_weight_bounds: WeightBounds,
}

/// Validated, immutable allocation configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationConfig {
    multipliers: Multipliers,
    strategic: ProfileTable,
    groups: Vec<Level2Group>,
    tilt: Level1Tilt,
    moderate_equities_active: f64,
    labels: Labels,
    bounds: WeightBounds,
}

impl AllocationConfig {
    /// Build and validate a configuration from its parts.
    pub fn from_parts(
        multipliers: Multipliers,
        strategic: ProfileTable,
        groups: Vec<Level2Group>,
        moderate_equities_active: f64,
        labels: Labels,
        bounds: WeightBounds,
    ) -> Result<Self> {
        let config = Self {
            multipliers,
            strategic,
            groups,
            tilt: Level1Tilt::default(),
            moderate_equities_active,
            labels,
            bounds,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(json)?;
        let groups = vec![
            Level2Group {
                parent: ClassId::from(EQUITIES),
                baseline: raw.equities_size_style,
                default_active: raw.default_equities_active_weight,
            },
            Level2Group {
                parent: ClassId::from(FIXED_INCOME),
                baseline: raw.fixed_income_sector,
                default_active: raw.default_fixed_income_active_weight,
            },
        ];
        Self::from_parts(
            raw.multipliers,
            raw.strategic_allocations,
            groups,
            raw.moderate_equities_active,
            raw.labels,
            raw.active_weight_bounds,
        )
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading allocation config");
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Profiles in display order (the key order of `multipliers`).
    pub fn profiles(&self) -> Vec<Profile> {
        self.multipliers.keys().cloned().collect()
    }

    #[inline]
    pub fn multipliers(&self) -> &Multipliers {
        &self.multipliers
    }

    /// Level-1 strategic table.
    #[inline]
    pub fn strategic(&self) -> &ProfileTable {
        &self.strategic
    }

    #[inline]
    pub fn groups(&self) -> &[Level2Group] {
        &self.groups
    }

    /// Level-2 group whose parent is `parent`.
    pub fn group(&self, parent: &str) -> Option<&Level2Group> {
        self.groups.iter().find(|g| g.parent.as_str() == parent)
    }

    #[inline]
    pub fn tilt(&self) -> &Level1Tilt {
        &self.tilt
    }

    /// Seed for the level-1 active weight.
    #[inline]
    pub fn moderate_equities_active(&self) -> f64 {
        self.moderate_equities_active
    }

    #[inline]
    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Display label for an id.
    pub fn label(&self, id: &ClassId) -> String {
        label_for(&self.labels, id)
    }

    #[inline]
    pub fn bounds(&self) -> WeightBounds {
        self.bounds
    }

    fn validate(&self) -> Result<()> {
        if !(self.bounds.min < self.bounds.max) {
            return Err(AllocError::invalid_config(format!(
                "active_weight_bounds min {} must be below max {}",
                self.bounds.min, self.bounds.max
            )));
        }

        if self.multipliers.is_empty() {
            return Err(AllocError::invalid_config("no profiles in multipliers"));
        }
        for (profile, m) in self.multipliers.iter() {
            if !m.is_finite() {
                return Err(AllocError::invalid_config(format!(
                    "multiplier for {} is not finite",
                    profile
                )));
            }
        }

        self.validate_strategic()?;

        for id in [&self.tilt.overweight, &self.tilt.underweight] {
            if !self.strategic.contains_key(id) {
                return Err(AllocError::unknown_class(id.as_str()));
            }
        }

        for group in &self.groups {
            self.validate_group(group)?;
        }

        self.bounds
            .check("moderate_equities_active", self.moderate_equities_active)?;

        Ok(())
    }

    fn validate_strategic(&self) -> Result<()> {
        let n_profiles = self.multipliers.len();
        if self.strategic.is_empty() {
            return Err(AllocError::invalid_config("strategic_allocations is empty"));
        }

        for (class, row) in self.strategic.iter() {
            if row.len() != n_profiles {
                return Err(AllocError::length_mismatch(
                    format!("strategic_allocations.{}", class),
                    n_profiles,
                    row.len(),
                ));
            }
            for &value in row {
                check_percentage(&format!("strategic_allocations.{}", class), value)?;
            }
        }

        for (i, profile) in self.multipliers.keys().enumerate() {
            let total: f64 = self.strategic.values().map(|row| row[i]).sum();
            if (total - 100.0).abs() > PERCENT_SUM_TOLERANCE {
                return Err(AllocError::invalid_config(format!(
                    "strategic allocations for {} sum to {}, expected 100",
                    profile, total
                )));
            }
        }
        Ok(())
    }

    fn validate_group(&self, group: &Level2Group) -> Result<()> {
        if !self.strategic.contains_key(&group.parent) {
            return Err(AllocError::unknown_class(group.parent.as_str()));
        }
        if self.groups.iter().filter(|g| g.parent == group.parent).count() > 1 {
            return Err(AllocError::invalid_config(format!(
                "more than one level-2 breakdown for {}",
                group.parent
            )));
        }
        if group.baseline.is_empty() {
            return Err(AllocError::invalid_config(format!(
                "level-2 breakdown of {} is empty",
                group.parent
            )));
        }

        for (id, &value) in group.baseline.iter() {
            if self.strategic.contains_key(id) {
                return Err(AllocError::invalid_config(format!(
                    "sub-class id {} collides with a level-1 class",
                    id
                )));
            }
            check_percentage(&format!("{}.{}", group.parent, id), value)?;
        }
        let total = group.baseline.total();
        if (total - 100.0).abs() > PERCENT_SUM_TOLERANCE {
            return Err(AllocError::invalid_config(format!(
                "level-2 breakdown of {} sums to {}, expected 100",
                group.parent, total
            )));
        }

        let (missing, unexpected) = group.default_active.key_difference(&group.baseline);
        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(AllocError::key_mismatch(
                format!("default active weights of {}", group.parent),
                missing.into_iter().map(|k| k.to_string()).collect(),
                unexpected.into_iter().map(|k| k.to_string()).collect(),
            ));
        }
        for (id, &value) in group.default_active.iter() {
            self.bounds.check(&format!("{}.{}", group.parent, id), value)?;
        }

        if !group.defaults_balanced() {
            let net = group.default_active.total();
            warn!(group = %group.parent, net, "default active weights do not net to zero");
        }
        Ok(())
    }
}

fn check_percentage(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(AllocError::invalid_config(format!(
            "{} = {} is not a percentage in [0, 100]",
            field, value
        )));
    }
    Ok(())
}

impl Default for AllocationConfig {
    /// Baseline of the reference dashboard: three profiles, equities split by
    /// size and style, fixed income split by sector.
    fn default() -> Self {
        let multipliers: Multipliers = [
            (Profile::from("Aggressive"), 1.5),
            (Profile::from("Moderate"), 1.0),
            (Profile::from("Conservative"), 0.5),
        ]
        .into_iter()
        .collect();

        let strategic: ProfileTable = [
            (ClassId::from(EQUITIES), vec![70.0, 60.0, 50.0]),
            (ClassId::from(FIXED_INCOME), vec![25.0, 35.0, 45.0]),
            (ClassId::from(CASH), vec![5.0, 5.0, 5.0]),
        ]
        .into_iter()
        .collect();

        let equities = Level2Group {
            parent: ClassId::from(EQUITIES),
            baseline: weights(&[
                ("large_cap_growth", 25.0),
                ("large_cap_value", 25.0),
                ("small_growth", 10.0),
                ("small_value", 10.0),
                ("international_developed", 20.0),
                ("international_emerging", 10.0),
            ]),
            default_active: weights(&[
                ("large_cap_growth", 5.0),
                ("large_cap_value", -5.0),
                ("small_growth", 0.0),
                ("small_value", 0.0),
                ("international_developed", 0.0),
                ("international_emerging", 0.0),
            ]),
        };

        let fixed_income = Level2Group {
            parent: ClassId::from(FIXED_INCOME),
            baseline: weights(&[
                ("tsys_cds_gses", 30.0),
                ("mortgage_backed", 25.0),
                ("ig_corp_preferred", 25.0),
                ("high_yield", 10.0),
                ("international_bonds", 10.0),
            ]),
            default_active: weights(&[
                ("tsys_cds_gses", 0.0),
                ("mortgage_backed", 0.0),
                ("ig_corp_preferred", 0.0),
                ("high_yield", 0.0),
                ("international_bonds", 0.0),
            ]),
        };

        let labels: Labels = [
            (EQUITIES, "Equities"),
            (FIXED_INCOME, "Fixed Income"),
            (CASH, "Cash"),
            ("large_cap_growth", "Large Cap Growth"),
            ("large_cap_value", "Large Cap Value"),
            ("small_growth", "Small Growth"),
            ("small_value", "Small Value"),
            ("international_developed", "International: Developed"),
            ("international_emerging", "International: Emerging"),
            ("tsys_cds_gses", "Tsys, CDs & GSEs"),
            ("mortgage_backed", "Mortgage Backed"),
            ("ig_corp_preferred", "IG Corp & Preferred"),
            ("high_yield", "High Yield"),
            ("international_bonds", "International"),
        ]
        .into_iter()
        .map(|(id, label)| (ClassId::from(id), label.to_string()))
        .collect();

        Self {
            multipliers,
            strategic,
            groups: vec![equities, fixed_income],
            tilt: Level1Tilt::default(),
            moderate_equities_active: 0.0,
            labels,
            bounds: WeightBounds::default(),
        }
    }
}

fn weights(entries: &[(&str, f64)]) -> Weights {
    entries
        .iter()
        .map(|&(id, value)| (ClassId::from(id), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "multipliers": {"Aggressive": 1.5, "Moderate": 1.0, "Conservative": 0.5},
        "strategic_allocations": {
            "equities": [70, 60, 50],
            "fixed_income": [25, 35, 45],
            "cash": [5, 5, 5]
        },
        "equities_size_style": {"large": 60, "small": 40},
        "fixed_income_sector": {"govt": 70, "corp": 30},
        "default_equities_active_weight": {"large": 2, "small": -2},
        "default_fixed_income_active_weight": {"govt": 0, "corp": 0},
        "moderate_equities_active": 1.0
    }"#;

    #[test]
    fn test_default_is_valid() {
        let config = AllocationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.profiles().len(), 3);
    }

    #[test]
    fn test_parse_sample() {
        let config = AllocationConfig::from_json_str(SAMPLE).unwrap();
        let profiles: Vec<String> = config.profiles().iter().map(|p| p.to_string()).collect();
        assert_eq!(profiles, vec!["Aggressive", "Moderate", "Conservative"]);
        assert_eq!(config.groups().len(), 2);
        assert!((config.moderate_equities_active() - 1.0).abs() < 1e-10);
        assert_eq!(config.bounds(), WeightBounds::default());
        // No labels configured: ids are shown as-is.
        assert_eq!(config.label(&ClassId::from("cash")), "cash");
    }

    #[test]
    fn test_missing_key_is_fatal() {
        let json = SAMPLE.replace(r#""moderate_equities_active": 1.0"#, r#""unused": 0"#);
        assert!(matches!(
            AllocationConfig::from_json_str(&json),
            Err(AllocError::Json(_))
        ));
    }

    #[test]
    fn test_profile_sum_must_be_100() {
        let json = SAMPLE.replace("[5, 5, 5]", "[5, 5, 6]");
        assert!(matches!(
            AllocationConfig::from_json_str(&json),
            Err(AllocError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_row_length_must_match_profiles() {
        let json = SAMPLE.replace("[5, 5, 5]", "[5, 5]");
        assert!(matches!(
            AllocationConfig::from_json_str(&json),
            Err(AllocError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_default_weight_keys_must_match_baseline() {
        let json = SAMPLE.replace(r#"{"large": 2, "small": -2}"#, r#"{"large": 0}"#);
        assert!(matches!(
            AllocationConfig::from_json_str(&json),
            Err(AllocError::KeyMismatch { .. })
        ));
    }

    #[test]
    fn test_seed_out_of_bounds() {
        let json = SAMPLE.replace(
            r#""moderate_equities_active": 1.0"#,
            r#""moderate_equities_active": 12.5"#,
        );
        assert!(matches!(
            AllocationConfig::from_json_str(&json),
            Err(AllocError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_defaults_balanced_uses_validator_tolerance() {
        let ids = ["a", "b", "c"];
        let group = |values: [f64; 3]| Level2Group {
            parent: ClassId::from(EQUITIES),
            baseline: ids.iter().map(|&id| (ClassId::from(id), 100.0 / 3.0)).collect(),
            default_active: ids
                .iter()
                .zip(values)
                .map(|(&id, v)| (ClassId::from(id), v))
                .collect(),
        };

        // 0.1 + 0.2 - 0.3 leaves float noise, which the run-time check accepts
        assert!(group([0.1, 0.2, -0.3]).defaults_balanced());
        assert!(group([5.0, -5.0, 0.0]).defaults_balanced());
        assert!(!group([2.0, -1.0, 0.0]).defaults_balanced());
    }

    #[test]
    fn test_bounds_check() {
        let bounds = WeightBounds::default();
        assert!(bounds.check("w", 10.0).is_ok());
        assert!(bounds.check("w", -10.0).is_ok());
        assert!(bounds.check("w", 10.5).is_err());
        assert!(bounds.check("w", f64::NAN).is_err());
    }
}
