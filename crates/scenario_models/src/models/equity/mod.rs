//! Equity returns under stochastic rates.
//!
//! Log total return over one step, driven by the simulated short rate:
//! ```text
//! total_k    = (r_k + σ²/2)·Δ + σ·sqrt(Δ)·z_k
//! dividend_k = ln(1 + q)·Δ          (zero on the first step)
//! price_k    = total_k - dividend_k
//! ```
//!
//! [`DividendGrowthModel`] gives the matching constant-growth valuation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use scenario_core::math::statistics::percentile;
use scenario_core::rng::ScenarioRng;
use scenario_core::types::{PathMatrix, ScenarioError};

mod dividend;

pub use dividend::DividendGrowthModel;

/// Equity model parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EquityParams {
    /// Annualised volatility `σ`
    pub volatility: f64,
    /// Continuous dividend yield `q`, annual-compounded
    pub dividend_yield: f64,
    /// Correlation with rate shocks when the model draws its own shocks
    pub rate_correlation: f64,
}

impl Default for EquityParams {
    fn default() -> Self {
        Self {
            volatility: 0.18,
            dividend_yield: 0.02,
            rate_correlation: 0.0,
        }
    }
}

impl EquityParams {
    /// Validated parameters with zero rate correlation.
    pub fn new(volatility: f64, dividend_yield: f64) -> Result<Self, ScenarioError> {
        let params = Self {
            volatility,
            dividend_yield,
            rate_correlation: 0.0,
        };
        params.validate()?;
        Ok(params)
    }

    /// Set the rate correlation.
    pub fn with_rate_correlation(mut self, rho: f64) -> Result<Self, ScenarioError> {
        self.rate_correlation = rho;
        self.validate()?;
        Ok(self)
    }

    /// `σ > 0`, `q ≥ 0`, `ρ ∈ [-1, 1]`.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !(self.volatility.is_finite() && self.volatility > 0.0) {
            return Err(ScenarioError::configuration(
                "equity.volatility",
                format!("must be positive, got {}", self.volatility),
            ));
        }
        if !(self.dividend_yield.is_finite() && self.dividend_yield >= 0.0) {
            return Err(ScenarioError::configuration(
                "equity.dividend_yield",
                format!("must be non-negative, got {}", self.dividend_yield),
            ));
        }
        if !(-1.0..=1.0).contains(&self.rate_correlation) {
            return Err(ScenarioError::configuration(
                "equity.rate_correlation",
                format!("must lie in [-1, 1], got {}", self.rate_correlation),
            ));
        }
        Ok(())
    }
}

/// Where the equity shocks come from.
#[derive(Clone, Copy, Debug)]
pub enum EquityShocks<'a> {
    /// Factor taken from a correlated shock cube
    Supplied(&'a PathMatrix),
    /// `ρ·rate + sqrt(1-ρ²)·independent`, using the model's rate correlation
    CorrelatedWith(&'a PathMatrix),
    /// Fresh independent draws
    Independent,
}

/// Equity return decomposition, all `[scenario × step]` log returns.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EquityReturns {
    /// Price plus dividend
    pub total: PathMatrix,
    /// Capital gain
    pub price: PathMatrix,
    /// Dividend income
    pub dividend: PathMatrix,
}

/// Maximum drawdown of a price path.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Drawdown {
    /// Relative fall from peak, non-positive
    pub value: f64,
    /// Index of the preceding peak
    pub peak: usize,
    /// Index of the trough
    pub trough: usize,
}

/// Risk-neutral equity return model.
///
/// # Examples
///
/// ```
/// use scenario_core::rng::ScenarioRng;
/// use scenario_core::types::PathMatrix;
/// use scenario_models::models::equity::{EquityParams, EquityReturnModel, EquityShocks};
///
/// let model = EquityReturnModel::new(EquityParams::new(0.2, 0.02).unwrap(), 1.0).unwrap();
/// let rates = PathMatrix::filled(4, 3, 0.03);
/// let shocks = PathMatrix::zeros(4, 3);
/// let mut rng = ScenarioRng::from_seed(0);
///
/// let out = model
///     .generate_returns(&rates, EquityShocks::Supplied(&shocks), &mut rng)
///     .unwrap();
/// assert!((out.total.get(0, 1) - (0.03 + 0.02)).abs() < 1e-12);
/// assert_eq!(out.dividend.get(0, 0), 0.0);
/// ```
#[derive(Clone, Debug)]
pub struct EquityReturnModel {
    params: EquityParams,
    dt: f64,
}

impl EquityReturnModel {
    /// Model on step `dt`.
    pub fn new(params: EquityParams, dt: f64) -> Result<Self, ScenarioError> {
        params.validate()?;
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ScenarioError::configuration(
                "timestep",
                format!("must be positive, got {}", dt),
            ));
        }
        Ok(Self { params, dt })
    }

    /// Parameters.
    pub fn params(&self) -> &EquityParams {
        &self.params
    }

    /// Step length.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Total, price and dividend log returns over `short_rates`' grid.
    ///
    /// `short_rates` are annualised. Supplied or rate shocks must share its shape.
    pub fn generate_returns(
        &self,
        short_rates: &PathMatrix,
        shocks: EquityShocks<'_>,
        rng: &mut ScenarioRng,
    ) -> Result<EquityReturns, ScenarioError> {
        let (rows, cols) = short_rates.shape();
        let z = match shocks {
            EquityShocks::Supplied(z) => {
                check_shape("equity shocks", short_rates, z)?;
                z.clone()
            }
            EquityShocks::CorrelatedWith(rate) => {
                check_shape("rate shocks", short_rates, rate)?;
                let rho = self.params.rate_correlation;
                let scale = (1.0 - rho * rho).sqrt();
                let mut z = PathMatrix::zeros(rows, cols);
                rng.fill_normal(z.as_mut_slice());
                for (out, r) in z.as_mut_slice().iter_mut().zip(rate.as_slice()) {
                    *out = rho * r + scale * *out;
                }
                z
            }
            EquityShocks::Independent => {
                let mut z = PathMatrix::zeros(rows, cols);
                rng.fill_normal(z.as_mut_slice());
                z
            }
        };

        let sigma = self.params.volatility;
        let vol = sigma * self.dt.sqrt();
        let convexity = 0.5 * sigma * sigma;
        let mut total = PathMatrix::zeros(rows, cols);
        for ((out, r), e) in total
            .as_mut_slice()
            .iter_mut()
            .zip(short_rates.as_slice())
            .zip(z.as_slice())
        {
            *out = (r + convexity) * self.dt + vol * e;
        }

        let income = (1.0 + self.params.dividend_yield).ln() * self.dt;
        let mut dividend = PathMatrix::filled(rows, cols, income);
        for s in 0..rows {
            dividend.set(s, 0, 0.0);
        }

        let mut price = total.clone();
        for (p, d) in price.as_mut_slice().iter_mut().zip(dividend.as_slice()) {
            *p -= d;
        }

        debug!(scenarios = rows, steps = cols, "generated equity returns");
        Ok(EquityReturns {
            total,
            price,
            dividend,
        })
    }
}

fn check_shape(context: &str, expected: &PathMatrix, got: &PathMatrix) -> Result<(), ScenarioError> {
    if expected.shape() != got.shape() {
        return Err(ScenarioError::dimension_mismatch(
            context,
            format!("{}x{}", expected.rows(), expected.cols()),
            format!("{}x{}", got.rows(), got.cols()),
        ));
    }
    Ok(())
}

/// Price paths from log returns.
///
/// The result has one more column than `returns`: column 0 is
/// `initial_price`, column `k + 1` is `initial_price · exp(Σ_{j≤k} ret_j)`.
pub fn simulate_prices(returns: &PathMatrix, initial_price: f64) -> PathMatrix {
    let (rows, cols) = returns.shape();
    let mut prices = PathMatrix::zeros(rows, cols + 1);
    for (s, path) in returns.iter_rows().enumerate() {
        let out = prices.row_mut(s);
        out[0] = initial_price;
        let mut cumulative = 0.0;
        for (k, ret) in path.iter().enumerate() {
            cumulative += ret;
            out[k + 1] = initial_price * cumulative.exp();
        }
    }
    prices
}

/// Cross-scenario percentile bands, one series per requested percentile.
pub fn percentiles(returns: &PathMatrix, ps: &[f64]) -> Vec<(f64, Vec<f64>)> {
    let columns: Vec<Vec<f64>> = (0..returns.cols()).map(|k| returns.column(k)).collect();
    ps.iter()
        .map(|&p| (p, columns.iter().map(|c| percentile(c, p)).collect()))
        .collect()
}

/// Largest relative fall from a running peak. `None` for an empty path.
pub fn max_drawdown(prices: &[f64]) -> Option<Drawdown> {
    let first = *prices.first()?;
    let mut running = first;
    let mut running_at = 0;
    let mut worst = Drawdown {
        value: 0.0,
        peak: 0,
        trough: 0,
    };
    for (i, &p) in prices.iter().enumerate() {
        if p > running {
            running = p;
            running_at = i;
        }
        let dd = (p - running) / running;
        if dd < worst.value {
            worst = Drawdown {
                value: dd,
                peak: running_at,
                trough: i,
            };
        }
    }
    Some(worst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn model(sigma: f64, q: f64, dt: f64) -> EquityReturnModel {
        EquityReturnModel::new(EquityParams::new(sigma, q).unwrap(), dt).unwrap()
    }

    #[test]
    fn test_params_validation() {
        assert!(EquityParams::new(0.0, 0.02).is_err());
        assert!(EquityParams::new(0.2, -0.01).is_err());
        assert!(EquityParams::default().with_rate_correlation(1.5).is_err());
        assert!(EquityReturnModel::new(EquityParams::default(), 0.0).is_err());
    }

    #[test]
    fn test_return_decomposition() {
        let m = model(0.2, 0.03, 0.5);
        let rates = PathMatrix::filled(2, 4, 0.04);
        let z = PathMatrix::filled(2, 4, 1.0);
        let mut rng = ScenarioRng::from_seed(0);
        let out = m
            .generate_returns(&rates, EquityShocks::Supplied(&z), &mut rng)
            .unwrap();

        let expected = (0.04 + 0.02) * 0.5 + 0.2 * 0.5f64.sqrt();
        assert_relative_eq!(out.total.get(1, 2), expected, epsilon = 1e-14);
        assert_eq!(out.dividend.get(1, 0), 0.0);
        assert_relative_eq!(out.dividend.get(1, 3), 1.03f64.ln() * 0.5, epsilon = 1e-14);
        for k in 0..4 {
            assert_relative_eq!(
                out.price.get(0, k) + out.dividend.get(0, k),
                out.total.get(0, k),
                epsilon = 1e-14
            );
        }
    }

    #[test]
    fn test_correlated_own_shocks() {
        let params = EquityParams::new(0.2, 0.0)
            .unwrap()
            .with_rate_correlation(0.6)
            .unwrap();
        let m = EquityReturnModel::new(params, 1.0).unwrap();
        let mut rng = ScenarioRng::from_seed(11);
        let mut rate = PathMatrix::zeros(5000, 2);
        rng.fill_normal(rate.as_mut_slice());
        let rates = PathMatrix::zeros(5000, 2);
        let out = m
            .generate_returns(&rates, EquityShocks::CorrelatedWith(&rate), &mut rng)
            .unwrap();
        // zero rates: total = σ²/2 + σ z
        let z: Vec<f64> = out.total.as_slice().iter().map(|t| (t - 0.02) / 0.2).collect();
        let rho = scenario_core::math::statistics::pearson(&z, rate.as_slice());
        assert!((rho - 0.6).abs() < 0.05, "rho {}", rho);
    }

    #[test]
    fn test_shock_shape_mismatch() {
        let m = model(0.2, 0.02, 1.0);
        let rates = PathMatrix::zeros(3, 3);
        let z = PathMatrix::zeros(3, 2);
        let err = m
            .generate_returns(&rates, EquityShocks::Supplied(&z), &mut ScenarioRng::from_seed(0))
            .unwrap_err();
        assert!(matches!(err, ScenarioError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_simulate_prices() {
        let returns = PathMatrix::from_rows(&[vec![0.1, -0.1, 0.2]]).unwrap();
        let prices = simulate_prices(&returns, 100.0);
        assert_eq!(prices.shape(), (1, 4));
        assert_eq!(prices.get(0, 0), 100.0);
        assert_relative_eq!(prices.get(0, 2), 100.0, epsilon = 1e-12);
        assert_relative_eq!(prices.get(0, 3), 100.0 * 0.2f64.exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_percentile_bands() {
        let rows: Vec<Vec<f64>> = (0..101).map(|i| vec![i as f64, -(i as f64)]).collect();
        let returns = PathMatrix::from_rows(&rows).unwrap();
        let bands = percentiles(&returns, &[5.0, 50.0]);
        assert_eq!(bands.len(), 2);
        assert_relative_eq!(bands[0].1[0], 5.0);
        assert_relative_eq!(bands[1].1[1], -50.0);
    }

    #[test]
    fn test_max_drawdown() {
        let dd = max_drawdown(&[100.0, 120.0, 90.0, 110.0, 60.0, 130.0]).unwrap();
        assert_relative_eq!(dd.value, -0.5);
        assert_eq!(dd.peak, 1);
        assert_eq!(dd.trough, 4);
        assert!(max_drawdown(&[]).is_none());
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0]).unwrap().value, 0.0);
    }
}
