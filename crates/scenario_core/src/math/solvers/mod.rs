//! Solvers for model-parameter fitting.
//!
//! ## Root finding
//!
//! - [`BrentSolver`]: bracketing root finder, no derivative needed. Used for
//!   one-parameter fits where the first-order condition changes sign on a
//!   known interval.
//!
//! ## Least squares
//!
//! - [`LevenbergMarquardtSolver`]: damped Gauss-Newton over a residual
//!   vector, with optional box bounds on the parameters.
//!
//! ## Configuration
//!
//! [`SolverConfig`] holds the tolerance and iteration budget of the root
//! finder; [`LMConfig`] adds the damping schedule.
//!
//! ## Example
//!
//! ```
//! use scenario_core::math::solvers::{BrentSolver, LevenbergMarquardtSolver, SolverConfig};
//!
//! // volatility that makes a 5y Black variance equal 0.05
//! let brent = BrentSolver::new(SolverConfig::default());
//! let sigma = brent.find_root(|s: f64| s * s * 5.0 - 0.05, 0.01, 1.0).unwrap();
//! assert!((sigma - 0.1).abs() < 1e-10);
//!
//! // straight line through (0, 1) and (1, 3)
//! let lm = LevenbergMarquardtSolver::with_defaults();
//! let fit = lm
//!     .solve(|p: &[f64]| vec![p[0] - 1.0, p[0] + p[1] - 3.0], vec![0.0, 0.0])
//!     .unwrap();
//! assert!(fit.converged);
//! assert!((fit.params[1] - 2.0).abs() < 1e-6);
//! ```

mod brent;
mod config;
mod levenberg_marquardt;

pub use brent::BrentSolver;
pub use config::SolverConfig;
pub use levenberg_marquardt::{LMConfig, LMResult, LevenbergMarquardtSolver};
