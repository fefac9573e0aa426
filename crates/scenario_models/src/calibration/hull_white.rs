//! Hull-White parameter calibration.
//!
//! Three routes to `(a, σ)`:
//! - [`initial_guess`]: rule of thumb from the spot curve, a starting point
//! - [`SwaptionCalibrator`]: fit to swaption implied volatilities
//! - [`fit_short_rate_history`]: regression of an observed short-rate series
//!   on its exact one-step transition
//!
//! The swaption fit uses the expiry-only approximation
//! ```text
//! vol(T) = sqrt(L(T) / T),   L(T) = σ²/(2a)·(1 - e^{-2aT})
//! ```
//! so the tenor is carried for reporting but does not enter the model value.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use scenario_core::market_data::YieldCurve;
use scenario_core::math::solvers::{BrentSolver, LevenbergMarquardtSolver, SolverConfig};
use scenario_core::math::statistics::{mean, std_dev};
use scenario_core::types::ScenarioError;

use crate::models::rates::HullWhiteParams;

/// Search interval for the mean reversion speed.
pub const MEAN_REVERSION_RANGE: (f64, f64) = (0.001, 2.0);

/// Search interval for the short-rate volatility.
pub const VOLATILITY_RANGE: (f64, f64) = (0.001, 0.1);

/// One market swaption volatility.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SwaptionQuote {
    /// Option expiry in years
    pub expiry: f64,
    /// Underlying swap tenor in years
    pub tenor: f64,
    /// Implied volatility
    pub volatility: f64,
}

impl SwaptionQuote {
    /// Validated quote.
    pub fn new(expiry: f64, tenor: f64, volatility: f64) -> Result<Self, ScenarioError> {
        let quote = Self {
            expiry,
            tenor,
            volatility,
        };
        quote.validate()?;
        Ok(quote)
    }

    /// Positive, finite expiry, tenor and volatility.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        for (field, value) in [
            ("swaption.expiry", self.expiry),
            ("swaption.tenor", self.tenor),
            ("swaption.volatility", self.volatility),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ScenarioError::configuration(
                    field,
                    format!("must be positive, got {}", value),
                ));
            }
        }
        Ok(())
    }
}

/// Model swaption volatility for `params` at `expiry`.
#[inline]
pub fn model_volatility(params: &HullWhiteParams, expiry: f64) -> f64 {
    (params.l(expiry) / expiry).sqrt()
}

/// Result of a Hull-White fit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HullWhiteFit {
    /// Fitted parameters
    pub params: HullWhiteParams,
    /// Root mean square volatility error over the quotes
    pub rmse: f64,
    /// Solver iterations
    pub iterations: usize,
    /// False when a parameter ended on its search bound or the solver stopped early
    pub converged: bool,
}

/// Rule-of-thumb parameters from a spot curve: `a = 0.1` and
/// `σ = ½·sd(Δ spot)`, clamped to `[0.005, 0.05]`.
pub fn initial_guess(curve: &YieldCurve) -> HullWhiteParams {
    let changes: Vec<f64> = curve.rates().windows(2).map(|w| w[1] - w[0]).collect();
    let sd = std_dev(&changes);
    let volatility = if sd.is_finite() {
        (0.5 * sd).clamp(0.005, 0.05)
    } else {
        0.01
    };
    HullWhiteParams {
        mean_reversion: 0.1,
        volatility,
    }
}

/// Fits Hull-White parameters to swaption volatilities.
///
/// # Example
///
/// ```
/// use scenario_models::calibration::{model_volatility, SwaptionCalibrator, SwaptionQuote};
/// use scenario_models::models::rates::HullWhiteParams;
///
/// let truth = HullWhiteParams::new(0.05, 0.012).unwrap();
/// let quotes: Vec<SwaptionQuote> = [1.0, 5.0, 10.0]
///     .iter()
///     .map(|&t| SwaptionQuote::new(t, 5.0, model_volatility(&truth, t)).unwrap())
///     .collect();
///
/// let fit = SwaptionCalibrator::new(quotes).unwrap().calibrate_volatility(0.05).unwrap();
/// assert!((fit.params.volatility - 0.012).abs() < 1e-9);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SwaptionCalibrator {
    quotes: Vec<SwaptionQuote>,
}

impl SwaptionCalibrator {
    /// Calibrator over at least one valid quote.
    pub fn new(quotes: Vec<SwaptionQuote>) -> Result<Self, ScenarioError> {
        if quotes.is_empty() {
            return Err(ScenarioError::configuration(
                "swaptions",
                "at least one quote is required",
            ));
        }
        for quote in &quotes {
            quote.validate()?;
        }
        Ok(Self { quotes })
    }

    /// Quotes in input order.
    pub fn quotes(&self) -> &[SwaptionQuote] {
        &self.quotes
    }

    /// Root mean square error of `params` against the quotes.
    pub fn rmse(&self, params: &HullWhiteParams) -> f64 {
        let ss: f64 = self
            .quotes
            .iter()
            .map(|q| (model_volatility(params, q.expiry) - q.volatility).powi(2))
            .sum();
        (ss / self.quotes.len() as f64).sqrt()
    }

    /// Least-squares `σ` for a fixed `a`.
    ///
    /// The model volatility is `σ·g(T)`, so the first-order condition
    /// `Σ (σ·g_i - v_i)·g_i = 0` is increasing in `σ` and is solved with
    /// Brent's method on [`VOLATILITY_RANGE`]. A root outside the range
    /// pins `σ` to the nearer bound.
    pub fn calibrate_volatility(&self, mean_reversion: f64) -> Result<HullWhiteFit, ScenarioError> {
        let unit = HullWhiteParams::new(mean_reversion, 1.0)?;
        let loadings: Vec<(f64, f64)> = self
            .quotes
            .iter()
            .map(|q| (model_volatility(&unit, q.expiry), q.volatility))
            .collect();
        let gradient = |sigma: f64| -> f64 {
            loadings.iter().map(|(g, v)| (sigma * g - v) * g).sum()
        };

        let (lo, hi) = VOLATILITY_RANGE;
        let (volatility, converged) = if gradient(lo) >= 0.0 {
            warn!(lower = lo, "swaption volatilities imply sigma below the search range");
            (lo, false)
        } else if gradient(hi) <= 0.0 {
            warn!(upper = hi, "swaption volatilities imply sigma above the search range");
            (hi, false)
        } else {
            let solver = BrentSolver::new(SolverConfig::new(1e-14, 200));
            (solver.find_root(gradient, lo, hi)?, true)
        };

        let params = HullWhiteParams::new(mean_reversion, volatility)?;
        let rmse = self.rmse(&params);
        debug!(mean_reversion, volatility, rmse, "calibrated Hull-White volatility");
        Ok(HullWhiteFit {
            params,
            rmse,
            iterations: 0,
            converged,
        })
    }

    /// Joint least-squares fit of `a` and `σ` from `initial`.
    ///
    /// Needs quotes at two or more distinct expiries; a single expiry
    /// cannot separate `a` from `σ`.
    pub fn calibrate(&self, initial: HullWhiteParams) -> Result<HullWhiteFit, ScenarioError> {
        let first = self.quotes[0].expiry;
        if self.quotes.iter().all(|q| (q.expiry - first).abs() < 1e-12) {
            return Err(ScenarioError::configuration(
                "swaptions",
                "a joint fit needs quotes at two or more expiries",
            ));
        }

        let residuals = |p: &[f64]| -> Vec<f64> {
            let params = HullWhiteParams {
                mean_reversion: p[0],
                volatility: p[1],
            };
            self.quotes
                .iter()
                .map(|q| model_volatility(&params, q.expiry) - q.volatility)
                .collect()
        };
        let result = LevenbergMarquardtSolver::with_defaults().solve_bounded(
            residuals,
            vec![initial.mean_reversion, initial.volatility],
            &[MEAN_REVERSION_RANGE, VOLATILITY_RANGE],
        )?;

        let params = HullWhiteParams::new(result.params[0], result.params[1])?;
        let on_bound = [
            (params.mean_reversion, MEAN_REVERSION_RANGE),
            (params.volatility, VOLATILITY_RANGE),
        ]
        .iter()
        .any(|(x, (lo, hi))| x <= lo || x >= hi);
        if on_bound {
            warn!(?params, "Hull-White fit stopped on a search bound");
        }
        let fit = HullWhiteFit {
            params,
            rmse: result.rmse(self.quotes.len()),
            iterations: result.iterations,
            converged: result.converged && !on_bound,
        };
        debug!(?fit, "calibrated Hull-White parameters");
        Ok(fit)
    }
}

/// Hull-White parameters and long-run level estimated from a rate history.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShortRateFit {
    /// Mean reversion and volatility
    pub params: HullWhiteParams,
    /// Level the rate reverts to
    pub long_run_mean: f64,
    /// Least-squares convergence flag
    pub converged: bool,
}

/// Fit `a`, `σ` and a constant reversion level to rates observed every `dt`.
///
/// Minimises the one-step errors
/// ```text
/// e_k = r_{k+1} - θ - (r_k - θ)·e^{-aΔ}
/// ```
/// with Levenberg-Marquardt over `(a, θ)`, then maps the error variance back
/// to `σ² = var(e)·2a / (1 - e^{-2aΔ})`.
pub fn fit_short_rate_history(rates: &[f64], dt: f64) -> Result<ShortRateFit, ScenarioError> {
    if !(dt.is_finite() && dt > 0.0) {
        return Err(ScenarioError::configuration(
            "dt",
            format!("must be positive, got {}", dt),
        ));
    }
    if rates.len() < 3 {
        return Err(ScenarioError::configuration(
            "short_rates",
            format!("need at least 3 observations, got {}", rates.len()),
        ));
    }
    if rates.iter().any(|r| !r.is_finite()) {
        return Err(ScenarioError::configuration("short_rates", "must be finite"));
    }

    let residuals = |p: &[f64]| -> Vec<f64> {
        let decay = (-p[0] * dt).exp();
        rates
            .windows(2)
            .map(|w| w[1] - p[1] - (w[0] - p[1]) * decay)
            .collect()
    };
    let result = LevenbergMarquardtSolver::with_defaults().solve_bounded(
        residuals,
        vec![0.1, mean(rates)],
        &[MEAN_REVERSION_RANGE, (-1.0, 1.0)],
    )?;

    let a = result.params[0];
    let error_variance = result.residual_ss / (rates.len() - 1) as f64;
    let volatility = (error_variance * 2.0 * a / (1.0 - (-2.0 * a * dt).exp())).sqrt();
    let params = HullWhiteParams::new(a, volatility)?;
    debug!(?params, long_run_mean = result.params[1], "fitted short-rate history");
    Ok(ShortRateFit {
        params,
        long_run_mean: result.params[1],
        converged: result.converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use scenario_core::rng::ScenarioRng;

    fn quotes_for(params: &HullWhiteParams, expiries: &[f64]) -> Vec<SwaptionQuote> {
        expiries
            .iter()
            .map(|&t| SwaptionQuote::new(t, 10.0, model_volatility(params, t)).unwrap())
            .collect()
    }

    // ========================================
    // Swaption calibration
    // ========================================

    #[test]
    fn test_volatility_recovered_for_known_mean_reversion() {
        let truth = HullWhiteParams::new(0.08, 0.015).unwrap();
        let calibrator = SwaptionCalibrator::new(quotes_for(&truth, &[1.0, 2.0, 5.0, 10.0])).unwrap();
        let fit = calibrator.calibrate_volatility(0.08).unwrap();
        assert!(fit.converged);
        assert_relative_eq!(fit.params.volatility, 0.015, epsilon = 1e-10);
        assert!(fit.rmse < 1e-10);
    }

    #[test]
    fn test_volatility_pinned_to_bound() {
        let quotes = vec![SwaptionQuote::new(5.0, 5.0, 0.9).unwrap()];
        let fit = SwaptionCalibrator::new(quotes)
            .unwrap()
            .calibrate_volatility(0.1)
            .unwrap();
        assert!(!fit.converged);
        assert_eq!(fit.params.volatility, VOLATILITY_RANGE.1);
    }

    #[test]
    fn test_joint_fit_recovers_both_parameters() {
        let truth = HullWhiteParams::new(0.12, 0.011).unwrap();
        let calibrator =
            SwaptionCalibrator::new(quotes_for(&truth, &[0.5, 1.0, 2.0, 3.0, 5.0, 7.0, 10.0])).unwrap();
        let start = HullWhiteParams::new(0.5, 0.03).unwrap();
        let fit = calibrator.calibrate(start).unwrap();
        assert!(fit.converged);
        assert_relative_eq!(fit.params.mean_reversion, 0.12, epsilon = 1e-5);
        assert_relative_eq!(fit.params.volatility, 0.011, epsilon = 1e-7);
        assert!(fit.rmse < 1e-8);
    }

    #[test]
    fn test_joint_fit_needs_two_expiries() {
        let truth = HullWhiteParams::new(0.1, 0.01).unwrap();
        let quotes = vec![
            SwaptionQuote::new(2.0, 5.0, model_volatility(&truth, 2.0)).unwrap(),
            SwaptionQuote::new(2.0, 10.0, model_volatility(&truth, 2.0)).unwrap(),
        ];
        let err = SwaptionCalibrator::new(quotes).unwrap().calibrate(truth).unwrap_err();
        assert!(matches!(err, ScenarioError::Configuration { ref field, .. } if field == "swaptions"));
    }

    #[test]
    fn test_rejects_bad_quotes() {
        assert!(SwaptionCalibrator::new(Vec::new()).is_err());
        assert!(SwaptionQuote::new(0.0, 5.0, 0.2).is_err());
        assert!(SwaptionQuote::new(1.0, 5.0, f64::NAN).is_err());
    }

    #[test]
    fn test_initial_guess_from_curve() {
        let flat = YieldCurve::from_annual_rates(&[0.03; 10]).unwrap();
        let guess = initial_guess(&flat);
        assert_eq!(guess.mean_reversion, 0.1);
        assert_eq!(guess.volatility, 0.005);

        let jumpy = YieldCurve::from_annual_rates(&[0.01, 0.2, 0.01, 0.2, 0.01]).unwrap();
        assert_eq!(initial_guess(&jumpy).volatility, 0.05);
    }

    // ========================================
    // Short-rate history
    // ========================================

    #[test]
    fn test_history_fit_recovers_simulated_parameters() {
        let (a, theta, sigma, dt): (f64, f64, f64, f64) = (0.3, 0.04, 0.012, 1.0 / 12.0);
        let decay = (-a * dt).exp();
        let step_sd = sigma * ((1.0 - (-2.0 * a * dt).exp()) / (2.0 * a)).sqrt();
        let mut rng = ScenarioRng::from_seed(2024);
        let mut rates = vec![0.02];
        for _ in 0..12_000 {
            let r = *rates.last().unwrap();
            rates.push(theta + (r - theta) * decay + step_sd * rng.gen_normal());
        }

        let fit = fit_short_rate_history(&rates, dt).unwrap();
        assert!((fit.params.mean_reversion - a).abs() < 0.1, "a = {}", fit.params.mean_reversion);
        assert!((fit.long_run_mean - theta).abs() < 0.005, "theta = {}", fit.long_run_mean);
        assert_relative_eq!(fit.params.volatility, sigma, max_relative = 0.05);
    }

    #[test]
    fn test_history_fit_rejects_short_or_constant_series() {
        assert!(fit_short_rate_history(&[0.01, 0.02], 1.0).is_err());
        assert!(fit_short_rate_history(&[0.01, 0.02, 0.03], 0.0).is_err());
        // no variation leaves sigma at zero
        assert!(fit_short_rate_history(&[0.03; 10], 1.0).is_err());
    }
}
