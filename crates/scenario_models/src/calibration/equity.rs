//! Equity parameter estimates from historical returns.

use tracing::debug;

use scenario_core::math::statistics::{mean, std_dev};
use scenario_core::types::ScenarioError;

use crate::models::equity::EquityParams;

fn require_sample(field: &str, values: &[f64], min_len: usize) -> Result<(), ScenarioError> {
    if values.len() < min_len {
        return Err(ScenarioError::configuration(
            field,
            format!("need at least {} observations, got {}", min_len, values.len()),
        ));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ScenarioError::configuration(field, "must be finite"));
    }
    Ok(())
}

/// Annualised volatility of returns sampled `periods_per_year` times a year
/// (12 for monthly, 252 for daily, 1 for annual data).
pub fn annualised_volatility(returns: &[f64], periods_per_year: f64) -> Result<f64, ScenarioError> {
    require_sample("returns", returns, 2)?;
    if !(periods_per_year.is_finite() && periods_per_year > 0.0) {
        return Err(ScenarioError::configuration(
            "periods_per_year",
            format!("must be positive, got {}", periods_per_year),
        ));
    }
    Ok(std_dev(returns) * periods_per_year.sqrt())
}

/// Equity risk premium, `mean(equity) - mean(risk_free)`.
///
/// The two series need not have equal length.
pub fn risk_premium(equity_returns: &[f64], risk_free_rates: &[f64]) -> Result<f64, ScenarioError> {
    require_sample("equity_returns", equity_returns, 1)?;
    require_sample("risk_free_rates", risk_free_rates, 1)?;
    Ok(mean(equity_returns) - mean(risk_free_rates))
}

/// Sharpe ratio of `returns` over a constant `risk_free_rate`.
///
/// # Errors
///
/// `Configuration` for fewer than two returns or a constant series.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> Result<f64, ScenarioError> {
    require_sample("returns", returns, 2)?;
    let excess: Vec<f64> = returns.iter().map(|r| r - risk_free_rate).collect();
    let sd = std_dev(&excess);
    if sd == 0.0 {
        return Err(ScenarioError::configuration(
            "returns",
            "constant series has no volatility",
        ));
    }
    Ok(mean(&excess) / sd)
}

/// [`EquityParams`] with the volatility estimated from `returns`.
pub fn fit_equity_params(
    returns: &[f64],
    periods_per_year: f64,
    dividend_yield: f64,
) -> Result<EquityParams, ScenarioError> {
    let volatility = annualised_volatility(returns, periods_per_year)?;
    debug!(volatility, observations = returns.len(), "fitted equity volatility");
    EquityParams::new(volatility, dividend_yield)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use scenario_core::rng::ScenarioRng;

    #[test]
    fn test_volatility_recovered_from_monthly_returns() {
        let sigma = 0.2;
        let mut rng = ScenarioRng::from_seed(11);
        let returns: Vec<f64> = (0..12_000)
            .map(|_| 0.006 + sigma / 12f64.sqrt() * rng.gen_normal())
            .collect();
        let vol = annualised_volatility(&returns, 12.0).unwrap();
        assert_relative_eq!(vol, sigma, max_relative = 0.03);

        let params = fit_equity_params(&returns, 12.0, 0.02).unwrap();
        assert_eq!(params.volatility, vol);
        assert_eq!(params.dividend_yield, 0.02);
    }

    #[test]
    fn test_risk_premium() {
        let equity = [0.12, 0.08, 0.10];
        let rates = [0.03, 0.02];
        assert_relative_eq!(risk_premium(&equity, &rates).unwrap(), 0.075, epsilon = 1e-15);
        assert!(risk_premium(&[], &rates).is_err());
    }

    #[test]
    fn test_sharpe_ratio() {
        // excess 0.02, 0.06: mean 0.04, sample sd 0.02·sqrt(2)
        let sharpe = sharpe_ratio(&[0.05, 0.09], 0.03).unwrap();
        assert_relative_eq!(sharpe, 0.04 / (0.02 * 2f64.sqrt()), epsilon = 1e-12);
        assert!(sharpe_ratio(&[0.05, 0.05], 0.03).is_err());
    }

    #[test]
    fn test_rejects_bad_inputs() {
        assert!(annualised_volatility(&[0.1], 12.0).is_err());
        assert!(annualised_volatility(&[0.1, 0.2], 0.0).is_err());
        assert!(annualised_volatility(&[0.1, f64::NAN], 12.0).is_err());
    }
}
