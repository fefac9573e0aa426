//! End-to-end tests chaining calibration, short rates, shocks and asset models.

use approx::assert_relative_eq;
use proptest::prelude::*;

use scenario_core::market_data::YieldCurve;
use scenario_core::math::statistics::mean;
use scenario_core::rng::ScenarioRng;
use scenario_models::calibration::YieldCurveCalibrator;
use scenario_models::models::equity::{EquityParams, EquityReturnModel, EquityShocks};
use scenario_models::models::hybrid::{
    CorrelationMatrix, CorrelationPreset, CrossAssetShockGenerator,
};
use scenario_models::models::rates::{HullWhiteParams, ShortRateSimulator};
use scenario_models::models::real_estate::{RealEstateParams, RealEstateReturnModel};

/// Spot curve rising linearly from 2% at 1y to 3.5% at 10y.
fn rising_curve() -> YieldCurve {
    let rates: Vec<f64> = (0..10).map(|i| 0.02 + 0.015 * i as f64 / 9.0).collect();
    YieldCurve::from_annual_rates(&rates).unwrap()
}

// ========================================
// Rates
// ========================================

#[test]
fn test_rising_curve_mean_rate_and_martingale() {
    let mut calibrator = YieldCurveCalibrator::new(rising_curve(), 0.5).unwrap();
    let curve = calibrator.calibrate().unwrap().clone();
    assert_relative_eq!(curve.bond_prices()[0], 1.0, epsilon = 1e-14);

    let steps = 20;
    let simulator =
        ShortRateSimulator::new(HullWhiteParams::new(0.1, 0.01).unwrap(), &curve).unwrap();
    let mut rng = ScenarioRng::from_seed(42);
    let paths = simulator.simulate(1000, steps, true, &mut rng).unwrap();

    let avg_forward = mean(curve.forward_curve(steps).unwrap());
    let avg_rate = paths.short_rates.mean();
    assert!(
        (avg_rate - avg_forward).abs() < 0.0015,
        "mean rate {} vs mean forward {}",
        avg_rate,
        avg_forward
    );

    let final_deflator = paths.deflators.column(steps - 1);
    let ratio = mean(&final_deflator) / curve.bond_prices()[steps];
    assert!((ratio - 1.0).abs() < 0.05, "martingale ratio {}", ratio);
    assert!(paths.deflators.min() > 0.0);
}

// ========================================
// Full model chain
// ========================================

#[test]
fn test_models_share_rate_residuals() {
    let mut calibrator = YieldCurveCalibrator::new(rising_curve(), 1.0).unwrap();
    let curve = calibrator.calibrate().unwrap().clone();
    let steps = 8;

    let simulator =
        ShortRateSimulator::new(HullWhiteParams::new(0.1, 0.01).unwrap(), &curve).unwrap();
    let mut rng = ScenarioRng::from_seed(7);
    let paths = simulator.simulate(200, steps, false, &mut rng).unwrap();
    let n = paths.num_scenarios();

    let generator = CrossAssetShockGenerator::new(
        CorrelationMatrix::from_preset(CorrelationPreset::Ahlgrim2005),
        n,
        steps,
        false,
    )
    .unwrap();
    let cube = generator.generate(&mut rng, Some(&paths.residuals)).unwrap();
    assert_eq!(cube.factor("short_rate").unwrap(), paths.residuals);

    let equity = EquityReturnModel::new(EquityParams::default(), 1.0).unwrap();
    let equity_shocks = cube.factor("equity").unwrap();
    let eq = equity
        .generate_returns(&paths.short_rates, EquityShocks::Supplied(&equity_shocks), &mut rng)
        .unwrap();
    assert_eq!(eq.total.shape(), (n, steps));

    let re = RealEstateReturnModel::new(RealEstateParams::default(), 1.0).unwrap();
    let re_out = re
        .generate_returns(
            curve.forward_curve(steps).unwrap(),
            &cube.factor("real_estate").unwrap(),
            &cube.factor("inflation").unwrap(),
        )
        .unwrap();
    assert_eq!(re_out.total.shape(), (n, steps));
    assert!(re_out.rental.get(0, steps - 1) > re_out.rental.get(0, 0));
}

#[test]
fn test_calibrator_rejects_early_queries() {
    let calibrator = YieldCurveCalibrator::new(rising_curve(), 0.5).unwrap();
    assert!(calibrator.forward_curve(5).is_err());

    let mut calibrator = calibrator;
    calibrator.calibrate().unwrap();
    assert!(calibrator.forward_curve(21).is_ok());
    assert!(calibrator.forward_curve(22).is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Deflators stay strictly positive for any sane parameter set.
    #[test]
    fn prop_deflators_positive(
        a in 0.01f64..0.5,
        sigma in 0.001f64..0.03,
        seed in 0u64..1000,
    ) {
        let mut calibrator = YieldCurveCalibrator::new(rising_curve(), 1.0).unwrap();
        let curve = calibrator.calibrate().unwrap().clone();
        let simulator = ShortRateSimulator::new(HullWhiteParams::new(a, sigma).unwrap(), &curve).unwrap();
        let paths = simulator
            .simulate(50, 9, true, &mut ScenarioRng::from_seed(seed))
            .unwrap();
        prop_assert!(paths.deflators.as_slice().iter().all(|&d| d > 0.0 && d.is_finite()));
    }
}
