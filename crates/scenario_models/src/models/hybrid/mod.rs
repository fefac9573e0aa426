//! Cross-asset correlation.
//!
//! - [`CorrelationMatrix`]: named factors, input repair and Cholesky factorisation
//! - [`CrossAssetShockGenerator`]: correlated `[factor × scenario × step]` shocks,
//!   optionally driven by short-rate residuals

pub mod correlated;
pub mod shocks;

pub use correlated::{
    CholeskyFactor, CorrelationMatrix, CorrelationPreset, RepairAction, DEFAULT_FACTORS,
};
pub use shocks::{
    extract_factor, verify_against, CorrelationCheck, CrossAssetShockGenerator, PairCheck,
    ShockCube,
};
