//! Stochastic mode: calibrate, simulate rates, correlate shocks, layer assets.

use tracing::{debug, info, warn};

use scenario_core::cancel::CancellationToken;
use scenario_core::rng::ScenarioRng;
use scenario_core::types::{PathMatrix, ScenarioError};
use scenario_models::calibration::{CalibratedCurve, YieldCurveCalibrator};
use scenario_models::models::equity::{EquityReturnModel, EquityShocks};
use scenario_models::models::hybrid::CrossAssetShockGenerator;
use scenario_models::models::rates::ShortRateSimulator;
use scenario_models::models::real_estate::RealEstateReturnModel;

use crate::config::{GenerationMode, ScenarioConfig, RATE_FACTOR};
use crate::diagnostics::{Diagnostics, MartingaleTest};
use crate::orchestrator::ScenarioOutput;
use crate::table::{DeflatorTable, EconomicScenarioTable, IndicatorPaths};

/// Calibrate the configured curve on the simulation grid.
pub fn calibrate(config: &ScenarioConfig) -> Result<CalibratedCurve, ScenarioError> {
    let mut calibrator = YieldCurveCalibrator::new(config.curve(), config.timestep)?
        .with_smoothing(config.smoothing())?;
    Ok(calibrator.calibrate()?.clone())
}

pub(crate) fn generate(
    config: &ScenarioConfig,
    rng: &mut ScenarioRng,
    cancel: &CancellationToken,
) -> Result<ScenarioOutput, ScenarioError> {
    let steps = config.num_steps();
    let dt = config.timestep;
    let params = &config.economic;

    let curve = calibrate(config)?;
    let forward_range = curve.forward_range();
    debug!(points = curve.len(), ?forward_range, "calibrated curve");
    cancel.checkpoint("calibration")?;

    let simulator = ShortRateSimulator::new(params.hull_white()?, &curve)?
        .with_policy(config.filter_policy())?;
    let rates = simulator.simulate(config.num_scenarios, steps, config.antithetic, rng)?;
    let report = rates.report;
    if report.delivered == 0 {
        return Err(ScenarioError::configuration(
            "rate_bounds",
            format!(
                "every simulated path breached the bounds after {} attempts",
                report.attempts
            ),
        ));
    }
    if report.shortfall() > 0 {
        warn!(
            requested = report.requested,
            delivered = report.delivered,
            outcome = ?report.outcome,
            "continuing with fewer scenarios than requested"
        );
    }
    cancel.checkpoint("short_rate")?;

    let n = report.delivered;
    // filtering can break the pairs, leaving an odd count
    let antithetic = config.antithetic && n % 2 == 0;
    let generator = CrossAssetShockGenerator::new(config.correlation.to_matrix()?, n, steps, antithetic)?
        .with_rate_factor(RATE_FACTOR)?;
    let cube = generator.generate(rng, Some(&rates.residuals))?;
    let shock_check = generator.verify(&cube);
    debug!(max_abs_deviation = shock_check.max_abs_deviation, "shock correlation check");
    cancel.checkpoint("shocks")?;

    let equity_shocks = cube.factor("equity")?;
    let equity = EquityReturnModel::new(params.equity()?, dt)?.generate_returns(
        &rates.short_rates,
        EquityShocks::Supplied(&equity_shocks),
        rng,
    )?;

    let inflation_shocks = cube.factor("inflation")?;
    let real_estate = RealEstateReturnModel::new(params.real_estate()?, dt)?.generate_returns(
        curve.forward_curve(steps)?,
        &cube.factor("real_estate")?,
        &inflation_shocks,
    )?;
    cancel.checkpoint("asset_returns")?;

    let inflation = inflation_shocks
        .map(|z| params.inflation_mean + params.inflation_volatility * z);
    let mut gdp_growth = PathMatrix::zeros(n, steps);
    for ((out, e), r) in gdp_growth
        .as_mut_slice()
        .iter_mut()
        .zip(equity_shocks.as_slice())
        .zip(rates.residuals.as_slice())
    {
        *out = params.gdp_growth_mean + params.gdp_growth_std * (0.6 * e + 0.4 * r);
    }

    let paths = IndicatorPaths {
        interest_rate: rates.short_rates,
        stock_return: equity.total,
        bond_return: rates.discount_rates,
        real_estate_return: real_estate.total,
        inflation,
        gdp_growth,
    };
    let table = EconomicScenarioTable::from_paths(&paths, dt)?;

    let bond_prices = curve.bond_price_curve(steps + 1)?;
    let martingale =
        MartingaleTest::evaluate(&rates.deflators, &bond_prices[1..], config.martingale_tolerance)?;
    if !martingale.passes {
        warn!(
            max_deviation = martingale.max_deviation,
            tolerance = martingale.tolerance,
            "deflators failed the martingale test"
        );
    }
    info!(
        scenarios = n,
        steps,
        martingale_max_deviation = martingale.max_deviation,
        "stochastic generation complete"
    );

    let mut diagnostics = Diagnostics::from_table(GenerationMode::Stochastic, &table, rng.seed());
    diagnostics.martingale = Some(martingale);
    diagnostics.path_filter = Some(report);
    diagnostics.shock_correlation = Some(shock_check);
    diagnostics.correlation_repairs = generator.cholesky().repairs().to_vec();
    diagnostics.forward_curve_range = Some(forward_range);

    Ok(ScenarioOutput {
        table,
        deflators: DeflatorTable::new(rates.deflators),
        diagnostics,
    })
}
