//! # scenario_core: Foundation Layer for the Economic Scenario Generator
//!
//! ## Layer 1 (Foundation) Role
//!
//! scenario_core is the bottom layer of the workspace, providing:
//! - Error taxonomy: `ScenarioError`, `InterpolationError`, `CorrelationError`,
//!   `SolverError` (`types::error`)
//! - Dense scenario-by-step storage: `PathMatrix` (`types::matrix`)
//! - Natural cubic spline interpolation (`math::interpolators`)
//! - Brent and Levenberg-Marquardt solvers for parameter fitting (`math::solvers`)
//! - Descriptive statistics and correlation estimates (`math::statistics`)
//! - Input yield curves and currency presets (`market_data`)
//! - The explicit random-stream handle `ScenarioRng` (`rng`)
//! - Cooperative cancellation between pipeline stages (`cancel`)
//!
//! ## Zero Workspace Dependency Principle
//!
//! Layer 1 has no dependencies on other workspace crates, with minimal external dependencies:
//! - num-traits: generic floating-point bounds for interpolation
//! - thiserror: structured error enums
//! - serde: configuration and result serialisation
//! - rand / rand_distr: seeded pseudo-random streams
//!
//! ## Usage Examples
//!
//! ```rust
//! use scenario_core::market_data::{Currency, YieldCurve};
//! use scenario_core::rng::ScenarioRng;
//!
//! let curve = Currency::EUR.preset_curve();
//! assert_eq!(curve.len(), 60);
//!
//! let mut rng = ScenarioRng::from_seed(42);
//! let mut shocks = vec![0.0; 8];
//! rng.fill_antithetic(&mut shocks);
//! assert_eq!(shocks[0], -shocks[4]);
//! # let _ = YieldCurve::from_annual_rates(&[0.01, 0.02, 0.03]).unwrap();
//! ```

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod cancel;
pub mod market_data;
pub mod math;
pub mod rng;
pub mod types;
