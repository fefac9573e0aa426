//! Simple mode: closed-form correlated normals, no calibration.
//!
//! Three standard-normal drivers per scenario (base, inflation, market) are
//! mixed with fixed loadings into the six indicators.

use tracing::debug;

use scenario_core::cancel::CancellationToken;
use scenario_core::rng::ScenarioRng;
use scenario_core::types::{PathMatrix, ScenarioError};

use crate::config::{EconomicParams, GenerationMode, ScenarioConfig};
use crate::diagnostics::Diagnostics;
use crate::orchestrator::ScenarioOutput;
use crate::table::{DeflatorTable, EconomicScenarioTable, IndicatorPaths};

/// Loadings `(base, inflation, market)` per indicator.
struct Loadings {
    base: f64,
    inflation: f64,
    market: f64,
}

const INFLATION: Loadings = Loadings { base: 0.7, inflation: 0.3, market: 0.0 };
const INTEREST: Loadings = Loadings { base: 0.5, inflation: 0.5, market: 0.0 };
const EQUITY: Loadings = Loadings { base: 0.2, inflation: 0.0, market: 0.8 };
const BOND: Loadings = Loadings { base: 0.7, inflation: 0.0, market: -0.3 };
const REAL_ESTATE: Loadings = Loadings { base: 0.5, inflation: 0.0, market: 0.5 };
const GDP: Loadings = Loadings { base: 0.4, inflation: 0.0, market: 0.6 };

impl Loadings {
    #[inline]
    fn mix(&self, base: f64, inflation: f64, market: f64) -> f64 {
        self.base * base + self.inflation * inflation + self.market * market
    }
}

/// Indicator paths for `n` scenarios of `steps` periods.
pub(crate) fn simulate_paths(
    params: &EconomicParams,
    n: usize,
    steps: usize,
    rng: &mut ScenarioRng,
) -> IndicatorPaths {
    let mut paths = IndicatorPaths {
        interest_rate: PathMatrix::zeros(n, steps),
        stock_return: PathMatrix::zeros(n, steps),
        bond_return: PathMatrix::zeros(n, steps),
        real_estate_return: PathMatrix::zeros(n, steps),
        inflation: PathMatrix::zeros(n, steps),
        gdp_growth: PathMatrix::zeros(n, steps),
    };

    let mut base = vec![0.0; steps];
    let mut infl = vec![0.0; steps];
    let mut market = vec![0.0; steps];

    for s in 0..n {
        rng.fill_normal(&mut base);
        rng.fill_normal(&mut infl);
        rng.fill_normal(&mut market);

        for k in 0..steps {
            let (b, i, m) = (base[k], infl[k], market[k]);
            paths.inflation.set(
                s,
                k,
                params.inflation_mean + params.inflation_volatility * INFLATION.mix(b, i, m),
            );
            paths.interest_rate.set(
                s,
                k,
                params.interest_mean + params.interest_volatility * INTEREST.mix(b, i, m),
            );
            paths.stock_return.set(
                s,
                k,
                params.equity_drift + params.equity_volatility * EQUITY.mix(b, i, m),
            );
            paths.bond_return.set(
                s,
                k,
                params.bond_return_mean + params.bond_return_std * BOND.mix(b, i, m),
            );
            paths.real_estate_return.set(
                s,
                k,
                params.real_estate_drift + params.real_estate_volatility * REAL_ESTATE.mix(b, i, m),
            );
            paths.gdp_growth.set(
                s,
                k,
                params.gdp_growth_mean + params.gdp_growth_std * GDP.mix(b, i, m),
            );
        }
    }
    paths
}

/// `exp(-Σ_{j≤k} r_j · dt)` per scenario.
pub(crate) fn deflators_from_rates(rates: &PathMatrix, dt: f64) -> PathMatrix {
    let (n, steps) = rates.shape();
    let mut out = PathMatrix::zeros(n, steps);
    for s in 0..n {
        let mut acc = 0.0;
        for (k, r) in rates.row(s).iter().enumerate() {
            acc += r * dt;
            out.set(s, k, (-acc).exp());
        }
    }
    out
}

pub(crate) fn generate(
    config: &ScenarioConfig,
    rng: &mut ScenarioRng,
    cancel: &CancellationToken,
) -> Result<ScenarioOutput, ScenarioError> {
    let n = config.num_scenarios;
    let steps = config.num_steps();
    debug!(n, steps, "simple mode: drawing correlated normals");

    let paths = simulate_paths(&config.economic, n, steps, rng);
    cancel.checkpoint("indicators")?;

    let deflators = deflators_from_rates(&paths.interest_rate, config.timestep);
    let table = EconomicScenarioTable::from_paths(&paths, config.timestep)?;
    let diagnostics = Diagnostics::from_table(GenerationMode::Simple, &table, rng.seed());

    Ok(ScenarioOutput {
        table,
        deflators: DeflatorTable::new(deflators),
        diagnostics,
    })
}
