//! Numerical building blocks.
//!
//! - [`interpolators`]: natural cubic spline
//! - [`solvers`]: Brent root finder and Levenberg-Marquardt least squares
//! - [`statistics`]: sample moments, percentiles and Pearson correlation

pub mod interpolators;
pub mod solvers;
pub mod statistics;
