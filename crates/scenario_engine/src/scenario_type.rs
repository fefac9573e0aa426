//! Named economic outlooks used by batch generation.

use serde::{Deserialize, Serialize};

use scenario_core::types::ScenarioError;

use crate::config::EconomicParams;

/// Economic outlook with preset means and volatilities.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioType {
    /// Weak growth, high volatility
    Pessimistic,
    /// Configured parameters unchanged
    Baseline,
    /// Strong growth, low volatility
    Optimistic,
}

impl ScenarioType {
    /// Every outlook in batch order.
    pub const ALL: [ScenarioType; 3] = [
        ScenarioType::Pessimistic,
        ScenarioType::Baseline,
        ScenarioType::Optimistic,
    ];

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioType::Pessimistic => "pessimistic",
            ScenarioType::Baseline => "baseline",
            ScenarioType::Optimistic => "optimistic",
        }
    }

    /// Weight of the outlook in a probability-weighted batch.
    pub fn probability(&self) -> f64 {
        match self {
            ScenarioType::Pessimistic => 0.25,
            ScenarioType::Baseline => 0.5,
            ScenarioType::Optimistic => 0.25,
        }
    }

    /// Overlay the outlook's means and volatilities on `base`.
    ///
    /// Model parameters (mean reversion, dividend yield, rental terms) are
    /// left untouched.
    pub fn apply(&self, base: &EconomicParams) -> EconomicParams {
        let mut p = *base;
        match self {
            ScenarioType::Baseline => {}
            ScenarioType::Optimistic => {
                p.inflation_mean = 0.02;
                p.inflation_volatility = 0.01;
                p.interest_mean = 0.035;
                p.interest_volatility = 0.015;
                p.equity_drift = 0.12;
                p.equity_volatility = 0.15;
                p.bond_return_mean = 0.06;
                p.bond_return_std = 0.05;
                p.real_estate_drift = 0.10;
                p.real_estate_volatility = 0.10;
                p.gdp_growth_mean = 0.035;
                p.gdp_growth_std = 0.015;
            }
            ScenarioType::Pessimistic => {
                p.inflation_mean = 0.03;
                p.inflation_volatility = 0.025;
                p.interest_mean = 0.025;
                p.interest_volatility = 0.025;
                p.equity_drift = 0.06;
                p.equity_volatility = 0.25;
                p.bond_return_mean = 0.03;
                p.bond_return_std = 0.10;
                p.real_estate_drift = 0.04;
                p.real_estate_volatility = 0.18;
                p.gdp_growth_mean = 0.015;
                p.gdp_growth_std = 0.03;
            }
        }
        p
    }
}

impl std::str::FromStr for ScenarioType {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pessimistic" => Ok(ScenarioType::Pessimistic),
            "baseline" => Ok(ScenarioType::Baseline),
            "optimistic" => Ok(ScenarioType::Optimistic),
            _ => Err(ScenarioError::configuration(
                "scenario_type",
                format!(
                    "unknown outlook '{}', expected pessimistic, baseline or optimistic",
                    s
                ),
            )),
        }
    }
}

impl std::fmt::Display for ScenarioType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_probabilities_sum_to_one() {
        let total: f64 = ScenarioType::ALL.iter().map(|t| t.probability()).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_baseline_is_identity() {
        let base = EconomicParams::default();
        assert_eq!(ScenarioType::Baseline.apply(&base), base);
    }

    #[test]
    fn test_outlooks_order_equity_drift() {
        let base = EconomicParams::default();
        let pess = ScenarioType::Pessimistic.apply(&base);
        let opt = ScenarioType::Optimistic.apply(&base);
        assert!(pess.equity_drift < base.equity_drift);
        assert!(opt.equity_drift > base.equity_drift);
        assert!(pess.equity_volatility > opt.equity_volatility);
        assert_eq!(pess.mean_reversion_speed, base.mean_reversion_speed);
    }

    #[test]
    fn test_parse_and_display() {
        for t in ScenarioType::ALL {
            assert_eq!(t.to_string().parse::<ScenarioType>().unwrap(), t);
        }
        assert!("neutral".parse::<ScenarioType>().is_err());
    }
}
