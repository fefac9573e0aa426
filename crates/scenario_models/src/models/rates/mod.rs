//! Interest rate models.
//!
//! - [`ShortRateSimulator`]: Hull-White one-factor paths with explosive-path
//!   filtering and residual extraction

pub mod hull_white;

pub use hull_white::{
    deflators_from_discount_rates, FilterOutcome, HullWhiteParams, PathFilterPolicy,
    PathFilterReport, RateBounds, ShortRateScenarios, ShortRateSimulator,
};
