//! Stochastic models layered on the calibrated curve.
//!
//! Dependency order:
//! 1. [`rates`]: short-rate paths, deflators and rate residuals
//! 2. [`hybrid`]: correlated shocks, reusing the rate residuals
//! 3. [`equity`] and [`real_estate`]: asset returns on top of rates and shocks

pub mod equity;
pub mod hybrid;
pub mod rates;
pub mod real_estate;
