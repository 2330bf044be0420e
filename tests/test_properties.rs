//! Property tests for allocation invariants.

use proptest::prelude::*;

use raptoralloc::core::ordered::WeightTotal;
use raptoralloc::core::types::{AllocationType, ClassId, Weights};
use raptoralloc::core::AllocationConfig;
use raptoralloc::portfolio::{compute_level2_tactical, max_parent_residual, AllocationEngine};

const EQUITY_IDS: [&str; 6] = [
    "large_cap_growth",
    "large_cap_value",
    "small_growth",
    "small_value",
    "international_developed",
    "international_emerging",
];

proptest! {
    #[test]
    fn level1_tactical_columns_sum_to_100(x in -10.0f64..=10.0) {
        let engine = AllocationEngine::new(AllocationConfig::default());
        let mut inputs = engine.default_inputs();
        inputs.set_equities_active(x).unwrap();
        let report = engine.run(&inputs).unwrap();

        for profile in ["Aggressive", "Moderate", "Conservative"] {
            let sum: f64 = ["equities", "fixed_income", "cash"]
                .iter()
                .map(|id| {
                    report
                        .level1
                        .get_profiled(id, profile, AllocationType::Tactical)
                        .unwrap()
                })
                .sum();
            prop_assert!((sum - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn level2_preserves_baseline_plus_active_sum(
        active in proptest::collection::vec(-10.0f64..=10.0, 6),
    ) {
        let config = AllocationConfig::default();
        let baseline = &config.group("equities").unwrap().baseline;
        let active: Weights = EQUITY_IDS
            .iter()
            .zip(&active)
            .map(|(id, v)| (ClassId::from(*id), *v))
            .collect();

        let tactical = compute_level2_tactical(baseline, &active).unwrap();
        prop_assert!((tactical.total() - (baseline.total() + active.total())).abs() < 1e-9);
    }

    #[test]
    fn level2_zero_sum_weights_preserve_baseline_total(
        raw in proptest::collection::vec(-5.0f64..=5.0, 6),
    ) {
        let config = AllocationConfig::default();
        let baseline = &config.group("equities").unwrap().baseline;

        // Centre the draw so the active weights net to zero
        let mean = raw.iter().sum::<f64>() / raw.len() as f64;
        let active: Weights = EQUITY_IDS
            .iter()
            .zip(&raw)
            .map(|(id, v)| (ClassId::from(*id), v - mean))
            .collect();
        prop_assert!(active.total().abs() < 1e-9);

        let tactical = compute_level2_tactical(baseline, &active).unwrap();
        prop_assert!((tactical.total() - baseline.total()).abs() < 1e-9);
        prop_assert!((tactical.total() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn zero_sum_weights_reconcile(
        x in -10.0f64..=10.0,
        shift in -10.0f64..=10.0,
        from in 0usize..6,
        to in 0usize..6,
    ) {
        prop_assume!(from != to);

        let engine = AllocationEngine::new(AllocationConfig::default());
        let mut inputs = engine.default_inputs().with_show_active_weights(true);
        inputs.set_equities_active(x).unwrap();
        inputs.set_active_weight("equities", "large_cap_growth", 0.0).unwrap();
        inputs.set_active_weight("equities", "large_cap_value", 0.0).unwrap();
        inputs.set_active_weight("equities", EQUITY_IDS[from], shift).unwrap();
        inputs.set_active_weight("equities", EQUITY_IDS[to], -shift).unwrap();

        let report = engine.run(&inputs).unwrap();
        prop_assert!(report.all_weights_valid());
        prop_assert!(max_parent_residual(&report.total) < 1e-9);
    }
}
