//! Output tables handed to downstream consumers.
//!
//! - [`EconomicScenarioTable`]: long format, one [`ScenarioRow`] per
//!   `(scenario, period)`, scenario-major
//! - [`DeflatorTable`]: one row per scenario, one column per step

use serde::{Deserialize, Serialize};

use scenario_core::types::{PathMatrix, ScenarioError};

/// Economic indicator columns of the scenario table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    /// Annualised short rate
    InterestRate,
    /// Equity log return over the period
    StockReturn,
    /// Bond return over the period
    BondReturn,
    /// Real-estate log return over the period
    RealEstateReturn,
    /// Annual inflation
    Inflation,
    /// Annual GDP growth
    GdpGrowth,
}

impl Indicator {
    /// Every indicator in column order.
    pub const ALL: [Indicator; 6] = [
        Indicator::InterestRate,
        Indicator::StockReturn,
        Indicator::BondReturn,
        Indicator::RealEstateReturn,
        Indicator::Inflation,
        Indicator::GdpGrowth,
    ];

    /// Column header.
    pub fn column_name(&self) -> &'static str {
        match self {
            Indicator::InterestRate => "interest_rate",
            Indicator::StockReturn => "stock_return",
            Indicator::BondReturn => "bond_return",
            Indicator::RealEstateReturn => "real_estate_return",
            Indicator::Inflation => "inflation",
            Indicator::GdpGrowth => "gdp_growth",
        }
    }
}

impl std::fmt::Display for Indicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column_name())
    }
}

/// `scenario_0001` style identifier for the zero-based index `i`.
pub fn scenario_id(i: usize) -> String {
    format!("scenario_{:04}", i + 1)
}

/// One `(scenario, period)` observation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRow {
    /// `scenario_0001` …
    pub scenario_id: String,
    /// End of the period in years, `(k + 1) · dt`
    pub time_period: f64,
    /// Annualised short rate
    pub interest_rate: f64,
    /// Equity return
    pub stock_return: f64,
    /// Bond return
    pub bond_return: f64,
    /// Real-estate return
    pub real_estate_return: f64,
    /// Inflation
    pub inflation: f64,
    /// GDP growth
    pub gdp_growth: f64,
}

impl ScenarioRow {
    /// Value of one indicator.
    pub fn value(&self, indicator: Indicator) -> f64 {
        match indicator {
            Indicator::InterestRate => self.interest_rate,
            Indicator::StockReturn => self.stock_return,
            Indicator::BondReturn => self.bond_return,
            Indicator::RealEstateReturn => self.real_estate_return,
            Indicator::Inflation => self.inflation,
            Indicator::GdpGrowth => self.gdp_growth,
        }
    }
}

/// Indicator paths, each `[scenario × step]`, before flattening.
#[derive(Clone, Debug)]
pub struct IndicatorPaths {
    /// Annualised short rates
    pub interest_rate: PathMatrix,
    /// Equity returns
    pub stock_return: PathMatrix,
    /// Bond returns
    pub bond_return: PathMatrix,
    /// Real-estate returns
    pub real_estate_return: PathMatrix,
    /// Inflation
    pub inflation: PathMatrix,
    /// GDP growth
    pub gdp_growth: PathMatrix,
}

impl IndicatorPaths {
    /// Path matrix of one indicator.
    pub fn get(&self, indicator: Indicator) -> &PathMatrix {
        match indicator {
            Indicator::InterestRate => &self.interest_rate,
            Indicator::StockReturn => &self.stock_return,
            Indicator::BondReturn => &self.bond_return,
            Indicator::RealEstateReturn => &self.real_estate_return,
            Indicator::Inflation => &self.inflation,
            Indicator::GdpGrowth => &self.gdp_growth,
        }
    }
}

/// Long-format scenario table.
///
/// Invariant: `len() == num_scenarios × num_steps`, rows ordered by scenario
/// then period.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EconomicScenarioTable {
    rows: Vec<ScenarioRow>,
    num_scenarios: usize,
    num_steps: usize,
    dt: f64,
}

impl EconomicScenarioTable {
    /// Flatten indicator paths.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` if the six matrices differ in shape.
    pub fn from_paths(paths: &IndicatorPaths, dt: f64) -> Result<Self, ScenarioError> {
        let shape = paths.interest_rate.shape();
        for indicator in Indicator::ALL {
            let got = paths.get(indicator).shape();
            if got != shape {
                return Err(ScenarioError::dimension_mismatch(
                    indicator.column_name(),
                    format!("{:?}", shape),
                    format!("{:?}", got),
                ));
            }
        }
        let (n, steps) = shape;
        let mut rows = Vec::with_capacity(n * steps);
        for s in 0..n {
            let id = scenario_id(s);
            for k in 0..steps {
                rows.push(ScenarioRow {
                    scenario_id: id.clone(),
                    time_period: (k + 1) as f64 * dt,
                    interest_rate: paths.interest_rate.get(s, k),
                    stock_return: paths.stock_return.get(s, k),
                    bond_return: paths.bond_return.get(s, k),
                    real_estate_return: paths.real_estate_return.get(s, k),
                    inflation: paths.inflation.get(s, k),
                    gdp_growth: paths.gdp_growth.get(s, k),
                });
            }
        }
        Ok(Self {
            rows,
            num_scenarios: n,
            num_steps: steps,
            dt,
        })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Scenario count.
    pub fn num_scenarios(&self) -> usize {
        self.num_scenarios
    }

    /// Periods per scenario.
    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    /// Step length in years.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// All rows.
    pub fn rows(&self) -> &[ScenarioRow] {
        &self.rows
    }

    /// Rows of scenario `i` (zero-based).
    pub fn scenario(&self, i: usize) -> &[ScenarioRow] {
        let start = i * self.num_steps;
        &self.rows[start..start + self.num_steps]
    }

    /// One indicator across every row.
    pub fn column(&self, indicator: Indicator) -> Vec<f64> {
        self.rows.iter().map(|r| r.value(indicator)).collect()
    }
}

/// Per-scenario deflators, columns `t_1 … t_n`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeflatorTable {
    scenario_ids: Vec<String>,
    values: PathMatrix,
}

impl DeflatorTable {
    /// Wrap a `[scenario × step]` deflator matrix.
    pub fn new(values: PathMatrix) -> Self {
        let scenario_ids = (0..values.rows()).map(scenario_id).collect();
        Self {
            scenario_ids,
            values,
        }
    }

    /// Header row: `scenario_id, t_1, …, t_n`.
    pub fn header(&self) -> Vec<String> {
        std::iter::once("scenario_id".to_string())
            .chain((1..=self.values.cols()).map(|k| format!("t_{}", k)))
            .collect()
    }

    /// Scenario identifiers in row order.
    pub fn scenario_ids(&self) -> &[String] {
        &self.scenario_ids
    }

    /// Deflator matrix.
    pub fn values(&self) -> &PathMatrix {
        &self.values
    }

    /// Number of scenarios.
    pub fn len(&self) -> usize {
        self.values.rows()
    }

    /// True when no scenario is present.
    pub fn is_empty(&self) -> bool {
        self.values.rows() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(n: usize, steps: usize) -> IndicatorPaths {
        let base = PathMatrix::from_vec(n, steps, (0..n * steps).map(|v| v as f64).collect()).unwrap();
        IndicatorPaths {
            interest_rate: base.clone(),
            stock_return: base.map(|v| v * 2.0),
            bond_return: base.clone(),
            real_estate_return: base.clone(),
            inflation: base.clone(),
            gdp_growth: base,
        }
    }

    #[test]
    fn test_scenario_ids_are_one_based() {
        assert_eq!(scenario_id(0), "scenario_0001");
        assert_eq!(scenario_id(41), "scenario_0042");
    }

    #[test]
    fn test_flatten_is_scenario_major() {
        let table = EconomicScenarioTable::from_paths(&paths(3, 4), 0.25).unwrap();
        assert_eq!(table.len(), 12);
        let second = table.scenario(1);
        assert_eq!(second[0].scenario_id, "scenario_0002");
        assert_eq!(second[0].interest_rate, 4.0);
        assert_eq!(second[2].stock_return, 12.0);
        let periods: Vec<f64> = second.iter().map(|r| r.time_period).collect();
        assert_eq!(periods, vec![0.25, 0.5, 0.75, 1.0]);
        assert_eq!(table.column(Indicator::GdpGrowth).len(), 12);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let mut p = paths(3, 4);
        p.inflation = PathMatrix::zeros(3, 5);
        let err = EconomicScenarioTable::from_paths(&p, 1.0).unwrap_err();
        assert!(err.to_string().contains("inflation"));
    }

    #[test]
    fn test_deflator_header() {
        let table = DeflatorTable::new(PathMatrix::filled(2, 3, 0.9));
        assert_eq!(table.header(), vec!["scenario_id", "t_1", "t_2", "t_3"]);
        assert_eq!(table.scenario_ids()[1], "scenario_0002");
        assert_eq!(table.len(), 2);
    }
}
