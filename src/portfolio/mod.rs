//! Allocation engine for RaptorAlloc.

pub mod allocation;
pub mod engine;
pub mod reconcile;
pub mod validator;

pub use allocation::{
    compute_level1_tactical, compute_level2_tactical, coupled_active_weights, Level1Allocation,
    Level2Allocation,
};
pub use engine::{AllocationEngine, AllocationInputs, AllocationReport, Level2Report};
pub use reconcile::{max_parent_residual, reconcile_totals, sub_class_rows};
pub use validator::{WeightCheck, WeightStatus, WeightValidator, ZeroSumCheck};
