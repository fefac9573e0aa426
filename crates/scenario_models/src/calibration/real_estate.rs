//! Real-estate parameter estimates from a price index and rents.
//!
//! Log price returns are treated as an AR(1) series. Their lag-one
//! autocorrelation `β` maps to a mean reversion `a = -ln(β) / Δ`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use scenario_core::math::statistics::{mean, pearson, std_dev};
use scenario_core::types::ScenarioError;

use crate::models::real_estate::RealEstateParams;

/// Clamp range for the estimated mean reversion.
pub const RE_MEAN_REVERSION_RANGE: (f64, f64) = (0.05, 0.5);

/// Floor on the autocorrelation before taking its logarithm.
const MIN_AUTOCORRELATION: f64 = 0.01;

/// Used when the history is too short for an autocorrelation.
const FALLBACK_MEAN_REVERSION: f64 = 0.1;

/// Used when no rents are supplied.
const FALLBACK_RENTAL_YIELD: f64 = 0.03;

/// Estimated real-estate parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RealEstateFit {
    /// Mean reversion from the return autocorrelation
    pub mean_reversion: f64,
    /// Annualised price volatility
    pub volatility: f64,
    /// Average rent-to-price ratio
    pub rental_yield: f64,
}

impl RealEstateFit {
    /// Model parameters with rent indexation `inflation_adjustment`.
    pub fn into_params(self, inflation_adjustment: f64) -> Result<RealEstateParams, ScenarioError> {
        RealEstateParams::new(
            self.mean_reversion,
            self.volatility,
            self.rental_yield,
            inflation_adjustment,
        )
    }
}

/// Estimate `(a, σ, rental yield)` from prices observed every `dt` years and
/// the rents paid over the same periods.
///
/// `rents` may be empty, in which case the yield defaults to 3%.
pub fn calibrate_real_estate(prices: &[f64], rents: &[f64], dt: f64) -> Result<RealEstateFit, ScenarioError> {
    if !(dt.is_finite() && dt > 0.0) {
        return Err(ScenarioError::configuration(
            "dt",
            format!("must be positive, got {}", dt),
        ));
    }
    if prices.len() < 3 {
        return Err(ScenarioError::configuration(
            "prices",
            format!("need at least 3 observations, got {}", prices.len()),
        ));
    }
    if let Some(p) = prices.iter().find(|p| !(p.is_finite() && **p > 0.0)) {
        return Err(ScenarioError::configuration(
            "prices",
            format!("must be positive, got {}", p),
        ));
    }
    if !rents.is_empty() && rents.len() != prices.len() {
        return Err(ScenarioError::dimension_mismatch(
            "real-estate rents",
            prices.len(),
            rents.len(),
        ));
    }

    let returns: Vec<f64> = prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect();
    let volatility = std_dev(&returns) / dt.sqrt();

    let beta = pearson(&returns[..returns.len() - 1], &returns[1..]);
    let mean_reversion = if beta.is_finite() {
        let (lo, hi) = RE_MEAN_REVERSION_RANGE;
        (-beta.max(MIN_AUTOCORRELATION).ln() / dt).clamp(lo, hi)
    } else {
        FALLBACK_MEAN_REVERSION
    };

    let rental_yield = if rents.is_empty() {
        FALLBACK_RENTAL_YIELD
    } else {
        let ratios: Vec<f64> = rents.iter().zip(prices).map(|(r, p)| r / p).collect();
        mean(&ratios)
    };

    debug!(mean_reversion, volatility, rental_yield, "fitted real-estate parameters");
    Ok(RealEstateFit {
        mean_reversion,
        volatility,
        rental_yield,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use scenario_core::rng::ScenarioRng;

    /// Price index whose log returns are AR(1) with stationary sd `sigma`.
    fn ar1_index(a: f64, sigma: f64, n: usize, seed: u64) -> Vec<f64> {
        let beta = (-a).exp();
        let innovation = sigma * (1.0 - beta * beta).sqrt();
        let mut rng = ScenarioRng::from_seed(seed);
        let mut ret = sigma * rng.gen_normal();
        let mut prices = vec![100.0];
        for _ in 0..n {
            let last = prices[prices.len() - 1];
            prices.push(last * ret.exp());
            ret = beta * ret + innovation * rng.gen_normal();
        }
        prices
    }

    #[test]
    fn test_recovers_simulated_parameters() {
        let prices = ar1_index(0.2, 0.1, 20_000, 8);
        let rents: Vec<f64> = prices.iter().map(|p| 0.04 * p).collect();

        let fit = calibrate_real_estate(&prices, &rents, 1.0).unwrap();
        assert!((fit.mean_reversion - 0.2).abs() < 0.03, "a = {}", fit.mean_reversion);
        assert_relative_eq!(fit.volatility, 0.1, max_relative = 0.05);
        assert_relative_eq!(fit.rental_yield, 0.04, epsilon = 1e-12);

        let params = fit.into_params(0.02).unwrap();
        assert_eq!(params.inflation_adjustment, 0.02);
    }

    #[test]
    fn test_uncorrelated_returns_hit_upper_clamp() {
        // independent returns: beta near zero, a = -ln(0.01) before clamping
        let mut rng = ScenarioRng::from_seed(1);
        let mut prices = vec![100.0];
        for _ in 0..5_000 {
            let last = prices[prices.len() - 1];
            prices.push(last * (0.1 * rng.gen_normal()).exp());
        }
        let fit = calibrate_real_estate(&prices, &[], 1.0).unwrap();
        assert_eq!(fit.mean_reversion, RE_MEAN_REVERSION_RANGE.1);
        assert_eq!(fit.rental_yield, FALLBACK_RENTAL_YIELD);
    }

    #[test]
    fn test_volatility_scales_with_dt() {
        let prices = ar1_index(0.2, 0.05, 2_000, 3);
        let annual = calibrate_real_estate(&prices, &[], 1.0).unwrap();
        let quarterly = calibrate_real_estate(&prices, &[], 0.25).unwrap();
        assert_relative_eq!(quarterly.volatility, 2.0 * annual.volatility, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_bad_history() {
        assert!(calibrate_real_estate(&[100.0, 101.0], &[], 1.0).is_err());
        assert!(calibrate_real_estate(&[100.0, -1.0, 102.0], &[], 1.0).is_err());
        assert!(calibrate_real_estate(&[100.0, 101.0, 102.0], &[3.0], 1.0).is_err());
        assert!(calibrate_real_estate(&[100.0, 101.0, 102.0], &[], 0.0).is_err());
    }
}
