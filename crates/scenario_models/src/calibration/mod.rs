//! Curve and model-parameter calibration.
//!
//! - [`YieldCurveCalibrator`]: builds a [`CalibratedCurve`] (bond prices and
//!   smoothed instantaneous forwards) on the simulation time grid
//! - [`SwaptionCalibrator`], [`fit_short_rate_history`], [`initial_guess`]:
//!   Hull-White `a` and `σ`
//! - [`fit_equity_params`], [`risk_premium`], [`sharpe_ratio`]: equity
//!   volatility and premium estimates
//! - [`calibrate_real_estate`]: real-estate mean reversion, volatility and
//!   rental yield from a price index
//!
//! # Example
//!
//! ```
//! use scenario_core::market_data::YieldCurve;
//! use scenario_models::calibration::YieldCurveCalibrator;
//!
//! let spot = YieldCurve::from_annual_rates(&[0.02, 0.025, 0.028, 0.03, 0.031]).unwrap();
//! let mut calibrator = YieldCurveCalibrator::new(spot, 0.5).unwrap();
//! let curve = calibrator.calibrate().unwrap();
//!
//! assert_eq!(curve.len(), 11);
//! assert!(curve.forward_rates().iter().all(|f| *f > 0.0));
//! ```

mod equity;
mod hull_white;
mod real_estate;
mod yield_curve;

pub use equity::{annualised_volatility, fit_equity_params, risk_premium, sharpe_ratio};
pub use hull_white::{
    fit_short_rate_history, initial_guess, model_volatility, HullWhiteFit, ShortRateFit,
    SwaptionCalibrator, SwaptionQuote, MEAN_REVERSION_RANGE, VOLATILITY_RANGE,
};
pub use real_estate::{calibrate_real_estate, RealEstateFit, RE_MEAN_REVERSION_RANGE};
pub use yield_curve::{CalibratedCurve, SmoothingParams, YieldCurveCalibrator};
