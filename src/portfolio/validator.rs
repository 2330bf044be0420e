//! Zero-sum check for active weights.
//!
//! Validation is advisory: a failed check is reported and logged, and the
//! caller goes on to compute tactical allocations from the unbalanced weights.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::ordered::WeightTotal;
use crate::core::types::Weights;

/// Default tolerance for the zero-sum check.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// How the weight sum is compared against zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ZeroSumCheck {
    /// `sum == 0.0` exactly.
    Exact,
    /// `|sum| < tolerance`.
    Tolerance(f64),
}

impl Default for ZeroSumCheck {
    fn default() -> Self {
        ZeroSumCheck::Tolerance(DEFAULT_TOLERANCE)
    }
}

impl ZeroSumCheck {
    #[inline]
    pub fn passes(self, sum: f64) -> bool {
        match self {
            ZeroSumCheck::Exact => sum == 0.0,
            ZeroSumCheck::Tolerance(eps) => sum.abs() < eps,
        }
    }
}

/// Outcome of a zero-sum check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeightStatus {
    Valid,
    Invalid,
}

/// Result of validating one group of active weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightCheck {
    /// Group label, e.g. "Equities".
    pub group: String,
    /// Sum of the group's weights.
    pub sum: f64,
    pub status: WeightStatus,
}

impl WeightCheck {
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.status == WeightStatus::Valid
    }

    /// Status line for the presentation layer.
    pub fn message(&self) -> String {
        match self.status {
            WeightStatus::Valid => format!("{}: the sum of active weights is valid.", self.group),
            WeightStatus::Invalid => format!(
                "{}: the sum of active weights must equal 0 (currently {}). Please adjust the weights.",
                self.group, self.sum
            ),
        }
    }
}

/// Zero-sum validator for groups of active weights.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WeightValidator {
    check: ZeroSumCheck,
}

impl WeightValidator {
    pub fn new(check: ZeroSumCheck) -> Self {
        Self { check }
    }

    /// Validator with the exact `sum == 0` boundary.
    pub fn exact() -> Self {
        Self::new(ZeroSumCheck::Exact)
    }

    #[inline]
    pub fn mode(&self) -> ZeroSumCheck {
        self.check
    }

    /// Check that `weights` sum to zero.
    pub fn validate(&self, group: &str, weights: &Weights) -> WeightCheck {
        let sum = weights.total();
        let status = if self.check.passes(sum) {
            WeightStatus::Valid
        } else {
            warn!(group, sum, "active weights do not sum to zero");
            WeightStatus::Invalid
        };
        WeightCheck {
            group: group.to_string(),
            sum,
            status,
        }
    }
}
