//! # Scenario Models (L2: Business Logic)
//!
//! Curve calibration and the stochastic models layered on it.
//!
//! This crate provides:
//! - [`calibration::YieldCurveCalibrator`]: spot curve to bond-price and
//!   smoothed forward curves on the simulation grid
//! - [`calibration::SwaptionCalibrator`] and friends: Hull-White, equity and
//!   real-estate parameters estimated from market or historical data
//! - [`models::rates::ShortRateSimulator`]: Hull-White short-rate paths,
//!   deflators, residual shocks and explosive-path control
//! - [`models::hybrid::CrossAssetShockGenerator`]: correlated shock cubes via
//!   Cholesky factorisation
//! - [`models::equity::EquityReturnModel`]: risk-neutral equity returns
//! - [`models::real_estate::RealEstateReturnModel`]: price and rental returns
//!   driven by an auxiliary mean-reverting rate
//!
//! ## Design Principles
//!
//! - Every random draw goes through a caller-owned
//!   [`ScenarioRng`](scenario_core::rng::ScenarioRng)
//! - Paths are `[scenario × step]` [`PathMatrix`](scenario_core::types::PathMatrix) values
//! - Presets are parameter records, not separate model types

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod calibration;
pub mod models;
