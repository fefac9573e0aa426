//! Integration tests for module exports and cross-module behaviour of the
//! foundation layer.

use approx::assert_relative_eq;
use proptest::prelude::*;

/// Error taxonomy is reachable from `types`.
#[test]
fn test_types_module_exports() {
    use scenario_core::types::{CorrelationError, InterpolationError, PathMatrix, ScenarioError};

    let err: ScenarioError = InterpolationError::InsufficientData { got: 1, need: 3 }.into();
    assert!(matches!(err, ScenarioError::Interpolation(_)));

    let err: ScenarioError = CorrelationError::InvalidOrder("dup".into()).into();
    assert!(err.is_configuration());

    let m = PathMatrix::filled(2, 2, 0.5);
    assert_eq!(m.mean(), 0.5);
}

/// Spline discount factors through a preset curve stay inside the quoted
/// points and reproduce them at the knots.
#[test]
fn test_spline_through_preset_discount_factors() {
    use scenario_core::market_data::Currency;
    use scenario_core::math::interpolators::{CubicSplineInterpolator, Interpolator};

    let curve = Currency::EUR.preset_curve();
    let mut xs = vec![0.0];
    xs.extend_from_slice(curve.maturities());
    let mut ys = vec![1.0];
    ys.extend(curve.discount_factors());

    let spline = CubicSplineInterpolator::new(&xs, &ys).unwrap();
    assert_relative_eq!(spline.interpolate(0.0).unwrap(), 1.0, epsilon = 1e-12);
    assert_relative_eq!(spline.interpolate(30.0).unwrap(), ys[30], epsilon = 1e-12);

    let mid = spline.interpolate(10.5).unwrap();
    assert!(mid < ys[10] && mid > ys[11]);
}

/// Statistics agree with a hand-computed sample.
#[test]
fn test_statistics_exports() {
    use scenario_core::math::statistics::{percentile, SummaryStatistics};

    let sample: Vec<f64> = (1..=101).map(|i| i as f64).collect();
    assert_relative_eq!(percentile(&sample, 5.0), 6.0);
    assert_relative_eq!(percentile(&sample, 95.0), 96.0);

    let summary = SummaryStatistics::from_sample(&sample);
    assert_relative_eq!(summary.mean, 51.0);
    assert_relative_eq!(summary.median, 51.0);
}

/// Cancellation and RNG are reachable from their modules.
#[test]
fn test_cancel_and_rng_exports() {
    use scenario_core::cancel::CancellationToken;
    use scenario_core::rng::ScenarioRng;

    let token = CancellationToken::new();
    assert!(!token.is_cancelled());

    let rng = ScenarioRng::from_seed(3);
    let workers: Vec<u64> = (0..4).map(|i| rng.derive(i).seed()).collect();
    let mut unique = workers.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), workers.len());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Bootstrapping the discount factors of any Nelson-Siegel curve returns
    /// the curve.
    #[test]
    fn prop_bootstrap_recovers_nelson_siegel(
        beta0 in 0.01f64..0.06,
        beta1 in -0.03f64..0.03,
        beta2 in -0.02f64..0.02,
        lambda in 0.5f64..5.0,
    ) {
        use scenario_core::market_data::{bootstrap_spot_rates, nelson_siegel, YieldCurve};

        let maturities: Vec<f64> = (1..=30).map(|m| m as f64).collect();
        let rates = nelson_siegel(&maturities, beta0, beta1, beta2, lambda);
        let curve = YieldCurve::new(maturities.clone(), rates.clone()).unwrap();
        let recovered = bootstrap_spot_rates(&curve.discount_factors(), &maturities).unwrap();
        for (a, b) in recovered.iter().zip(rates.iter()) {
            prop_assert!((a - b).abs() < 1e-10);
        }
    }
}
