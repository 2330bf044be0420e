//! Strategic to tactical allocation at both hierarchy levels.

use tracing::debug;

use crate::core::config::Level1Tilt;
use crate::core::error::{AllocError, Result};
use crate::core::grid::AllocationGrid;
use crate::core::ordered::KeyDifference;
use crate::core::types::{
    label_for, AllocationType, ClassId, ColumnKey, Labels, Multipliers, Profile, ProfileTable,
    RowKey, Weights,
};

/// Compute level-1 tactical allocations.
///
/// For every class `a` and profile `p` at position `i`:
/// `tactical[a][i] = strategic[a][i] + multiplier[p] * active[a]`.
///
/// No normalization is applied. When `active` nets to zero (see
/// [`coupled_active_weights`]) each profile's tactical row keeps the
/// strategic total.
///
/// # Errors
/// * `LengthMismatch` if a strategic row does not hold one value per profile.
/// * `KeyMismatch` if a strategic class has no active weight.
pub fn compute_level1_tactical(
    strategic: &ProfileTable,
    multipliers: &Multipliers,
    active: &Weights,
) -> Result<ProfileTable> {
    let missing: Vec<String> = strategic
        .keys()
        .filter(|class| !active.contains_key(*class))
        .map(|class| class.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(AllocError::key_mismatch(
            "level-1 active weights",
            missing,
            Vec::new(),
        ));
    }

    let mut tactical = ProfileTable::new();
    for (class, row) in strategic.iter() {
        if row.len() != multipliers.len() {
            return Err(AllocError::length_mismatch(
                format!("strategic row {}", class),
                multipliers.len(),
                row.len(),
            ));
        }
        let weight = active.get(class).copied().unwrap_or(0.0);
        let tilted = row
            .iter()
            .zip(multipliers.values())
            .map(|(&s, &m)| s + m * weight)
            .collect();
        tactical.insert(class.clone(), tilted);
    }
    Ok(tactical)
}

/// Build the zero-sum level-1 active-weight vector from the single user
/// degree of freedom: `+x` for the overweight class, `-x` for the underweight
/// class and `0` for every other class (cash is residual).
pub fn coupled_active_weights(strategic: &ProfileTable, tilt: &Level1Tilt, x: f64) -> Weights {
    strategic
        .keys()
        .map(|class| {
            let weight = if *class == tilt.overweight {
                x
            } else if *class == tilt.underweight {
                -x
            } else {
                0.0
            };
            (class.clone(), weight)
        })
        .collect()
}

/// Compute level-2 tactical allocations: `baseline[k] + active[k]` for every
/// key, in baseline order.
///
/// # Errors
/// `KeyMismatch` unless `active` has exactly the keys of `baseline`.
pub fn compute_level2_tactical(baseline: &Weights, active: &Weights) -> Result<Weights> {
    let (missing, unexpected) = active.key_difference(baseline);
    if !missing.is_empty() || !unexpected.is_empty() {
        return Err(AllocError::key_mismatch(
            "level-2 active weights",
            missing.into_iter().map(|k| k.to_string()).collect(),
            unexpected.into_iter().map(|k| k.to_string()).collect(),
        ));
    }

    Ok(baseline
        .iter()
        .map(|(key, &base)| {
            let delta = active.get(key).copied().unwrap_or(0.0);
            (key.clone(), base + delta)
        })
        .collect())
}

/// Level-1 strategic and tactical tables for all profiles.
#[derive(Debug, Clone, PartialEq)]
pub struct Level1Allocation {
    profiles: Vec<Profile>,
    strategic: ProfileTable,
    tactical: ProfileTable,
}

impl Level1Allocation {
    /// Tilt `strategic` by the single level-1 degree of freedom `x`.
    pub fn compute(
        strategic: &ProfileTable,
        multipliers: &Multipliers,
        tilt: &Level1Tilt,
        x: f64,
    ) -> Result<Self> {
        let active = coupled_active_weights(strategic, tilt, x);
        let tactical = compute_level1_tactical(strategic, multipliers, &active)?;
        debug!(active_weight = x, classes = strategic.len(), "computed level-1 tactical");
        Ok(Self {
            profiles: multipliers.keys().cloned().collect(),
            strategic: strategic.clone(),
            tactical,
        })
    }

    #[inline]
    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    #[inline]
    pub fn strategic(&self) -> &ProfileTable {
        &self.strategic
    }

    #[inline]
    pub fn tactical(&self) -> &ProfileTable {
        &self.tactical
    }

    /// Table of the given type (`Difference` has no stored table).
    pub fn table(&self, kind: AllocationType) -> Option<&ProfileTable> {
        match kind {
            AllocationType::Strategic => Some(&self.strategic),
            AllocationType::Tactical => Some(&self.tactical),
            AllocationType::Difference => None,
        }
    }

    /// Value of `class` for the profile at `profile_idx`.
    pub fn value(&self, class: &ClassId, profile_idx: usize, kind: AllocationType) -> Option<f64> {
        self.table(kind)?.get(class)?.get(profile_idx).copied()
    }

    /// Per-profile column totals of the given type.
    pub fn profile_totals(&self, kind: AllocationType) -> Vec<f64> {
        let Some(table) = self.table(kind) else {
            return Vec::new();
        };
        (0..self.profiles.len())
            .map(|i| table.values().map(|row| row[i]).sum())
            .collect()
    }

    /// Columns (Profile, Strategic), (Profile, Tactical) for each profile.
    pub fn columns(&self) -> Vec<ColumnKey> {
        self.profiles
            .iter()
            .flat_map(|p| {
                [
                    ColumnKey::profiled(p, AllocationType::Strategic),
                    ColumnKey::profiled(p, AllocationType::Tactical),
                ]
            })
            .collect()
    }

    /// Values of one class laid out like [`Self::columns`].
    pub fn row_values(&self, class: &ClassId) -> Option<Vec<f64>> {
        let strategic = self.strategic.get(class)?;
        let tactical = self.tactical.get(class)?;
        Some(
            strategic
                .iter()
                .zip(tactical)
                .flat_map(|(&s, &t)| [s, t])
                .collect(),
        )
    }

    /// Level-1 table as a grid, one row per class.
    pub fn to_grid(&self, labels: &Labels) -> Result<AllocationGrid> {
        let mut grid = AllocationGrid::with_columns(self.columns());
        for class in self.strategic.keys() {
            let values = self
                .row_values(class)
                .ok_or_else(|| AllocError::unknown_class(class.as_str()))?;
            grid.push_row(RowKey::class(class.clone(), label_for(labels, class)), values)?;
        }
        Ok(grid)
    }
}

/// Level-2 strategic and tactical own-percentages of one parent class.
#[derive(Debug, Clone, PartialEq)]
pub struct Level2Allocation {
    parent: ClassId,
    strategic: Weights,
    tactical: Weights,
}

impl Level2Allocation {
    /// Apply `active` to `baseline` for the sub-classes of `parent`.
    pub fn compute(parent: ClassId, baseline: &Weights, active: &Weights) -> Result<Self> {
        let tactical = compute_level2_tactical(baseline, active)?;
        debug!(parent = %parent, sub_classes = baseline.len(), "computed level-2 tactical");
        Ok(Self {
            parent,
            strategic: baseline.clone(),
            tactical,
        })
    }

    #[inline]
    pub fn parent(&self) -> &ClassId {
        &self.parent
    }

    #[inline]
    pub fn strategic(&self) -> &Weights {
        &self.strategic
    }

    #[inline]
    pub fn tactical(&self) -> &Weights {
        &self.tactical
    }

    /// Own-percentage of `sub_class` of the given type.
    pub fn own(&self, sub_class: &ClassId, kind: AllocationType) -> Option<f64> {
        match kind {
            AllocationType::Strategic => self.strategic.get(sub_class).copied(),
            AllocationType::Tactical => self.tactical.get(sub_class).copied(),
            AllocationType::Difference => None,
        }
    }

    /// Sub-class ids in declaration order.
    pub fn sub_classes(&self) -> impl Iterator<Item = &ClassId> {
        self.strategic.keys()
    }

    /// Level-2 table as a grid with Strategic and Tactical columns.
    pub fn to_grid(&self, labels: &Labels) -> Result<AllocationGrid> {
        let mut grid = AllocationGrid::with_columns(vec![
            ColumnKey::unprofiled(AllocationType::Strategic),
            ColumnKey::unprofiled(AllocationType::Tactical),
        ]);
        for (id, &strategic) in self.strategic.iter() {
            let tactical = self
                .tactical
                .get(id)
                .copied()
                .ok_or_else(|| AllocError::unknown_class(id.as_str()))?;
            grid.push_row(
                RowKey::sub_class(id.clone(), label_for(labels, id), self.parent.clone()),
                vec![strategic, tactical],
            )?;
        }
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ordered::WeightTotal;

    fn multipliers() -> Multipliers {
        [
            (Profile::from("Aggressive"), 1.5),
            (Profile::from("Moderate"), 1.0),
            (Profile::from("Conservative"), 0.5),
        ]
        .into_iter()
        .collect()
    }

    fn strategic() -> ProfileTable {
        [
            (ClassId::from("equities"), vec![70.0, 60.0, 50.0]),
            (ClassId::from("fixed_income"), vec![25.0, 35.0, 45.0]),
            (ClassId::from("cash"), vec![5.0, 5.0, 5.0]),
        ]
        .into_iter()
        .collect()
    }

    fn weights(entries: &[(&str, f64)]) -> Weights {
        entries
            .iter()
            .map(|&(k, v)| (ClassId::from(k), v))
            .collect()
    }

    #[test]
    fn test_level1_tilt() {
        let level1 =
            Level1Allocation::compute(&strategic(), &multipliers(), &Level1Tilt::default(), 2.0)
                .unwrap();

        let equities = level1.tactical().get("equities").unwrap();
        let fixed_income = level1.tactical().get("fixed_income").unwrap();
        let cash = level1.tactical().get("cash").unwrap();

        // Aggressive: 70 + 1.5 * 2 = 73, Moderate: 60 + 2 = 62, Conservative: 50 + 1 = 51
        for (got, want) in equities.iter().zip([73.0, 62.0, 51.0]) {
            assert!((got - want).abs() < 1e-10);
        }
        // Fixed income takes -x through the same multipliers: 25 - 3, 35 - 2, 45 - 1
        for (got, want) in fixed_income.iter().zip([22.0, 33.0, 44.0]) {
            assert!((got - want).abs() < 1e-10);
        }
        assert_eq!(cash, &vec![5.0, 5.0, 5.0]);

        for total in level1.profile_totals(AllocationType::Tactical) {
            assert!((total - 100.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_level1_missing_active_weight() {
        let active = weights(&[("equities", 1.0), ("fixed_income", -1.0)]);
        let result = compute_level1_tactical(&strategic(), &multipliers(), &active);
        assert!(matches!(result, Err(AllocError::KeyMismatch { .. })));
    }

    #[test]
    fn test_level1_row_length_mismatch() {
        let mut table = strategic();
        table.insert(ClassId::from("cash"), vec![5.0, 5.0]);
        let active = coupled_active_weights(&table, &Level1Tilt::default(), 1.0);
        let result = compute_level1_tactical(&table, &multipliers(), &active);
        assert!(matches!(result, Err(AllocError::LengthMismatch { .. })));
    }

    #[test]
    fn test_coupled_weights_net_to_zero() {
        let active = coupled_active_weights(&strategic(), &Level1Tilt::default(), 3.5);
        assert_eq!(active.get("equities"), Some(&3.5));
        assert_eq!(active.get("fixed_income"), Some(&-3.5));
        assert_eq!(active.get("cash"), Some(&0.0));
        assert!(active.total().abs() < 1e-12);
    }

    #[test]
    fn test_level2_tactical() {
        let baseline = weights(&[("growth", 60.0), ("value", 40.0)]);
        let active = weights(&[("value", -3.0), ("growth", 3.0)]);
        let tactical = compute_level2_tactical(&baseline, &active).unwrap();

        // Output follows baseline order regardless of active-weight order.
        let keys: Vec<&str> = tactical.keys().map(ClassId::as_str).collect();
        assert_eq!(keys, vec!["growth", "value"]);
        assert!((tactical.get("growth").unwrap() - 63.0).abs() < 1e-10);
        assert!((tactical.get("value").unwrap() - 37.0).abs() < 1e-10);
        assert!((tactical.total() - baseline.total()).abs() < 1e-10);
    }

    #[test]
    fn test_level2_key_mismatch() {
        let baseline = weights(&[("growth", 60.0), ("value", 40.0)]);

        let partial = weights(&[("growth", 0.0)]);
        assert!(matches!(
            compute_level2_tactical(&baseline, &partial),
            Err(AllocError::KeyMismatch { .. })
        ));

        let extra = weights(&[("growth", 0.0), ("value", 0.0), ("blend", 0.0)]);
        match compute_level2_tactical(&baseline, &extra) {
            Err(AllocError::KeyMismatch { unexpected, .. }) => {
                assert_eq!(unexpected, vec!["blend".to_string()]);
            }
            other => panic!("expected key mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_level1_grid_layout() {
        let level1 =
            Level1Allocation::compute(&strategic(), &multipliers(), &Level1Tilt::default(), 0.0)
                .unwrap();
        let grid = level1.to_grid(&Labels::new()).unwrap();

        assert_eq!(grid.n_rows(), 3);
        assert_eq!(grid.n_cols(), 6);
        assert_eq!(grid.columns()[0].to_string(), "Aggressive/Strategic");
        assert_eq!(grid.columns()[1].to_string(), "Aggressive/Tactical");
        assert_eq!(grid.columns()[2].to_string(), "Moderate/Strategic");
        assert_eq!(grid.values()[1], vec![25.0, 25.0, 35.0, 35.0, 45.0, 45.0]);
    }

    #[test]
    fn test_level2_grid() {
        let baseline = weights(&[("growth", 60.0), ("value", 40.0)]);
        let active = weights(&[("growth", 5.0), ("value", -5.0)]);
        let level2 = Level2Allocation::compute(ClassId::from("equities"), &baseline, &active)
            .unwrap();
        let grid = level2.to_grid(&Labels::new()).unwrap();

        assert_eq!(grid.n_cols(), 2);
        assert_eq!(grid.values()[0], vec![60.0, 65.0]);
        assert_eq!(grid.rows()[1].parent, Some(ClassId::from("equities")));
    }
}
