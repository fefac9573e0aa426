//! Run diagnostics returned next to the tables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use scenario_core::math::statistics::{correlation_matrix, mean, SummaryStatistics};
use scenario_core::types::{PathMatrix, ScenarioError};
use scenario_models::models::hybrid::{CorrelationCheck, RepairAction};
use scenario_models::models::rates::PathFilterReport;

use crate::config::GenerationMode;
use crate::table::{EconomicScenarioTable, Indicator};

/// Pearson correlation between table columns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RealizedCorrelation {
    /// Row and column labels
    pub indicators: Vec<Indicator>,
    /// Square matrix in `indicators` order
    pub matrix: Vec<Vec<f64>>,
}

impl RealizedCorrelation {
    /// Correlate every indicator column of `table`.
    pub fn from_table(table: &EconomicScenarioTable) -> Self {
        let columns: Vec<Vec<f64>> = Indicator::ALL.iter().map(|i| table.column(*i)).collect();
        let refs: Vec<&[f64]> = columns.iter().map(Vec::as_slice).collect();
        let flat = correlation_matrix(&refs);
        let n = refs.len();
        let matrix = flat.chunks(n.max(1)).map(<[f64]>::to_vec).collect();
        Self {
            indicators: Indicator::ALL.to_vec(),
            matrix,
        }
    }

    /// Entry for a pair of indicators.
    pub fn get(&self, a: Indicator, b: Indicator) -> Option<f64> {
        let i = self.indicators.iter().position(|x| *x == a)?;
        let j = self.indicators.iter().position(|x| *x == b)?;
        Some(self.matrix[i][j])
    }
}

/// Martingale check of the deflators against the calibrated bond prices.
///
/// For each step `k` the ratio `mean_s D[s,k] / P(0, t_{k+1})` should be 1
/// under the risk-neutral measure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MartingaleTest {
    /// True when `max_deviation < tolerance`
    pub passes: bool,
    /// `max_k |ratio_k - 1|`
    pub max_deviation: f64,
    /// `mean_k |ratio_k - 1|`
    pub mean_deviation: f64,
    /// Threshold applied
    pub tolerance: f64,
    /// Cross-scenario mean deflator at the final step
    pub mean_final_deflator: f64,
    /// Per-step ratios
    pub ratios: Vec<f64>,
}

impl MartingaleTest {
    /// Run the check.
    ///
    /// `bond_prices[k]` must be `P(0, t_{k+1})`.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` when fewer bond prices than steps are supplied.
    pub fn evaluate(
        deflators: &PathMatrix,
        bond_prices: &[f64],
        tolerance: f64,
    ) -> Result<Self, ScenarioError> {
        let steps = deflators.cols();
        if bond_prices.len() < steps {
            return Err(ScenarioError::dimension_mismatch(
                "martingale bond prices",
                steps,
                bond_prices.len(),
            ));
        }
        let means = deflators.column_means();
        let ratios: Vec<f64> = means
            .iter()
            .zip(bond_prices)
            .map(|(m, p)| m / p)
            .collect();
        let deviations: Vec<f64> = ratios.iter().map(|r| (r - 1.0).abs()).collect();
        let max_deviation = deviations.iter().copied().fold(0.0, f64::max);
        let mean_deviation = mean(&deviations);
        Ok(Self {
            passes: max_deviation < tolerance,
            max_deviation,
            mean_deviation,
            tolerance,
            mean_final_deflator: means.last().copied().unwrap_or(f64::NAN),
            ratios,
        })
    }
}

/// Everything a caller needs to judge a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Generation method
    pub method: GenerationMode,
    /// Scenarios in the table
    pub num_scenarios: usize,
    /// Periods per scenario
    pub num_time_periods: usize,
    /// Root seed
    pub seed: u64,
    /// Per-indicator summary statistics
    pub summary: BTreeMap<Indicator, SummaryStatistics>,
    /// Realised correlation between indicators
    pub correlations: RealizedCorrelation,
    /// Deflator martingale test (stochastic mode)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub martingale: Option<MartingaleTest>,
    /// Explosive-path filter report (stochastic mode)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_filter: Option<PathFilterReport>,
    /// Shock-cube correlation against target (stochastic mode)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shock_correlation: Option<CorrelationCheck>,
    /// Repairs behind the Cholesky factor used for the shocks (stochastic mode)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub correlation_repairs: Vec<RepairAction>,
    /// Min and max of the smoothed forward curve (stochastic mode)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_curve_range: Option<(f64, f64)>,
}

impl Diagnostics {
    /// Summary and correlation of `table`; stochastic extras unset.
    pub fn from_table(method: GenerationMode, table: &EconomicScenarioTable, seed: u64) -> Self {
        let summary = Indicator::ALL
            .iter()
            .map(|i| (*i, SummaryStatistics::from_sample(&table.column(*i))))
            .collect();
        Self {
            method,
            num_scenarios: table.num_scenarios(),
            num_time_periods: table.num_steps(),
            seed,
            summary,
            correlations: RealizedCorrelation::from_table(table),
            martingale: None,
            path_filter: None,
            shock_correlation: None,
            correlation_repairs: Vec::new(),
            forward_curve_range: None,
        }
    }

    /// Mean of each indicator.
    pub fn mean_returns(&self) -> BTreeMap<Indicator, f64> {
        self.summary.iter().map(|(k, v)| (*k, v.mean)).collect()
    }

    /// Standard deviation of each indicator.
    pub fn volatilities(&self) -> BTreeMap<Indicator, f64> {
        self.summary.iter().map(|(k, v)| (*k, v.std)).collect()
    }

    /// Fewer scenarios delivered than requested.
    pub fn has_shortfall(&self) -> bool {
        self.path_filter.map_or(false, |r| r.shortfall() > 0)
    }
}
