//! Gordon growth valuation, `P = D / (r - g)`.

use serde::{Deserialize, Serialize};

use scenario_core::types::ScenarioError;

/// Constant-growth dividend discount model.
///
/// # Example
///
/// ```
/// use scenario_models::models::equity::DividendGrowthModel;
///
/// let model = DividendGrowthModel::new(2.0, 0.03, 0.08).unwrap();
/// assert!((model.price() - 40.0).abs() < 1e-12);
/// assert!((model.dividend_yield() - 0.05).abs() < 1e-12);
///
/// assert!(DividendGrowthModel::new(2.0, 0.08, 0.08).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DividendGrowthModel {
    /// Next dividend per share `D`
    pub initial_dividend: f64,
    /// Constant dividend growth `g`
    pub growth_rate: f64,
    /// Required return `r`, strictly above `g`
    pub required_return: f64,
}

impl DividendGrowthModel {
    /// Validated model; `D > 0` and `g < r`.
    pub fn new(initial_dividend: f64, growth_rate: f64, required_return: f64) -> Result<Self, ScenarioError> {
        if !(initial_dividend.is_finite() && initial_dividend > 0.0) {
            return Err(ScenarioError::configuration(
                "equity.initial_dividend",
                format!("must be positive, got {}", initial_dividend),
            ));
        }
        if !(growth_rate.is_finite() && required_return.is_finite()) {
            return Err(ScenarioError::configuration(
                "equity.growth_rate",
                "growth and required return must be finite",
            ));
        }
        if growth_rate >= required_return {
            return Err(ScenarioError::configuration(
                "equity.growth_rate",
                format!(
                    "growth {} must be below the required return {}",
                    growth_rate, required_return
                ),
            ));
        }
        Ok(Self {
            initial_dividend,
            growth_rate,
            required_return,
        })
    }

    /// Fair value `D / (r - g)`.
    pub fn price(&self) -> f64 {
        self.initial_dividend / (self.required_return - self.growth_rate)
    }

    /// `D / P`, which reduces to `r - g`.
    pub fn dividend_yield(&self) -> f64 {
        self.initial_dividend / self.price()
    }

    /// Dividends for years `0..n_years`, `D·(1+g)^k`.
    pub fn project_dividends(&self, n_years: usize) -> Vec<f64> {
        let mut dividend = self.initial_dividend;
        (0..n_years)
            .map(|_| {
                let out = dividend;
                dividend *= 1.0 + self.growth_rate;
                out
            })
            .collect()
    }

    /// Required return implied by a market `price`, `D/P + g`.
    pub fn implied_required_return(initial_dividend: f64, growth_rate: f64, price: f64) -> Result<f64, ScenarioError> {
        if !(price.is_finite() && price > 0.0) {
            return Err(ScenarioError::configuration(
                "equity.price",
                format!("must be positive, got {}", price),
            ));
        }
        let model = Self::new(initial_dividend, growth_rate, growth_rate + initial_dividend / price)?;
        Ok(model.required_return)
    }
}
