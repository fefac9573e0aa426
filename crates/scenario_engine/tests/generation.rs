//! Integration tests for both generation modes.

use proptest::prelude::*;

use scenario_core::cancel::CancellationToken;
use scenario_core::market_data::YieldCurve;
use scenario_core::rng::ScenarioRng;
use scenario_core::types::ScenarioError;
use scenario_engine::config::{CorrelationSpec, GenerationMode, ScenarioConfig};
use scenario_engine::export::write_to_dir;
use scenario_engine::table::Indicator;
use scenario_engine::ScenarioOrchestrator;
use scenario_models::models::hybrid::RepairAction;
use scenario_models::models::rates::{FilterOutcome, PathFilterPolicy, RateBounds};

fn rising_curve() -> YieldCurve {
    let rates: Vec<f64> = (0..10).map(|i| 0.02 + 0.015 * i as f64 / 9.0).collect();
    YieldCurve::from_annual_rates(&rates).unwrap()
}

fn stochastic(n: usize) -> ScenarioConfig {
    ScenarioConfig::builder()
        .mode(GenerationMode::Stochastic)
        .yield_curve(rising_curve())
        .num_scenarios(n)
        .time_horizon(10.0)
        .timestep(0.5)
        .build()
        .unwrap()
}

// ========================================
// Stochastic mode
// ========================================

#[test]
fn test_stochastic_end_to_end() {
    let output = ScenarioOrchestrator::new(stochastic(1000))
        .unwrap()
        .generate_seeded()
        .unwrap();

    let report = output.diagnostics.path_filter.unwrap();
    assert_eq!(report.outcome, FilterOutcome::Accepted);
    assert_eq!(report.delivered, 1000);
    assert_eq!(output.table.len(), 20_000);
    assert!(!output.diagnostics.has_shortfall());
    assert!(output.diagnostics.correlation_repairs.is_empty());
    assert_eq!(output.deflators.values().cols(), 20);
    assert!(output.deflators.values().min() > 0.0);

    let martingale = output.diagnostics.martingale.as_ref().unwrap();
    assert!(martingale.passes, "max deviation {}", martingale.max_deviation);
    assert_eq!(martingale.ratios.len(), 20);

    let shocks = output.diagnostics.shock_correlation.as_ref().unwrap();
    assert!(shocks.within(0.05), "shock deviation {}", shocks.max_abs_deviation);

    let (lo, hi) = output.diagnostics.forward_curve_range.unwrap();
    assert!(lo > 0.0 && hi < 0.08);
}

#[test]
fn test_stochastic_determinism() {
    let orchestrator = ScenarioOrchestrator::new(stochastic(100)).unwrap();
    let a = orchestrator.generate(&mut ScenarioRng::from_seed(5)).unwrap();
    let b = orchestrator.generate(&mut ScenarioRng::from_seed(5)).unwrap();
    assert_eq!(a, b);

    let c = orchestrator.generate(&mut ScenarioRng::from_seed(6)).unwrap();
    assert_ne!(a.table, c.table);
}

#[test]
fn test_tight_bounds_record_shortfall() {
    // no replacement rounds and no discard ceiling: the first discard ends the run
    let policy = PathFilterPolicy {
        bounds: RateBounds {
            upper: 0.07,
            lower: 0.0,
        },
        max_discard_fraction: 1.0,
        max_replacement_attempts: 0,
    };
    let config = ScenarioConfig::builder()
        .mode(GenerationMode::Stochastic)
        .yield_curve(rising_curve())
        .num_scenarios(200)
        .time_horizon(10.0)
        .timestep(0.5)
        .filter_policy(policy)
        .build()
        .unwrap();

    let output = ScenarioOrchestrator::new(config).unwrap().generate_seeded().unwrap();
    let report = output.diagnostics.path_filter.unwrap();

    assert_eq!(report.requested, 200);
    assert_eq!(report.outcome, FilterOutcome::AttemptsExhausted);
    assert_eq!(report.attempts, 1);
    assert!(report.delivered > 0);
    assert!(report.delivered < report.requested);
    assert_eq!(report.discarded, report.requested - report.delivered);
    assert!(output.diagnostics.has_shortfall());

    assert_eq!(output.table.num_scenarios(), report.delivered);
    assert_eq!(output.table.len(), report.delivered * 20);
    assert_eq!(output.deflators.len(), report.delivered);
    assert_eq!(output.diagnostics.num_scenarios, report.delivered);
}

#[test]
fn test_nothing_delivered_is_rate_bounds_error() {
    // a band no path can stay inside for twenty steps
    let policy = PathFilterPolicy {
        bounds: RateBounds {
            upper: 0.0201,
            lower: 0.02,
        },
        max_discard_fraction: 1.0,
        max_replacement_attempts: 0,
    };
    let config = ScenarioConfig::builder()
        .mode(GenerationMode::Stochastic)
        .yield_curve(rising_curve())
        .num_scenarios(20)
        .time_horizon(10.0)
        .timestep(0.5)
        .filter_policy(policy)
        .build()
        .unwrap();

    let err = ScenarioOrchestrator::new(config)
        .unwrap()
        .generate_seeded()
        .unwrap_err();
    assert!(matches!(err, ScenarioError::Configuration { ref field, .. } if field == "rate_bounds"));
}

#[test]
fn test_singular_correlation_reports_regularisation() {
    // real estate and equity perfectly correlated
    let spec = CorrelationSpec::Explicit {
        factors: ["short_rate", "inflation", "real_estate", "equity"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        matrix: vec![
            vec![1.0, 0.2, 0.3, 0.3],
            vec![0.2, 1.0, 0.4, 0.4],
            vec![0.3, 0.4, 1.0, 1.0],
            vec![0.3, 0.4, 1.0, 1.0],
        ],
    };
    let mut config = stochastic(100);
    config.correlation = spec;
    let output = ScenarioOrchestrator::new(config).unwrap().generate_seeded().unwrap();
    assert_eq!(
        output.diagnostics.correlation_repairs,
        vec![RepairAction::Regularised]
    );

    let json = serde_json::to_value(&output.diagnostics).unwrap();
    assert_eq!(json["correlation_repairs"][0], "regularised");
}

#[test]
fn test_unrepairable_correlation_fails() {
    let spec = CorrelationSpec::Explicit {
        factors: ["short_rate", "inflation", "real_estate", "equity"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        matrix: vec![
            vec![1.0, 0.99, -0.99, 0.99],
            vec![0.99, 1.0, 0.99, -0.99],
            vec![-0.99, 0.99, 1.0, 0.99],
            vec![0.99, -0.99, 0.99, 1.0],
        ],
    };
    let mut config = stochastic(50);
    config.correlation = spec;
    let err = ScenarioOrchestrator::new(config)
        .unwrap()
        .generate_seeded()
        .unwrap_err();
    assert!(matches!(err, ScenarioError::CorrelationStructure(_)));
}

#[test]
fn test_cancellation_from_another_thread() {
    let token = CancellationToken::new();
    let orchestrator = ScenarioOrchestrator::new(stochastic(100))
        .unwrap()
        .with_cancellation(token.clone());
    std::thread::spawn(move || token.cancel()).join().unwrap();
    assert!(matches!(
        orchestrator.generate_seeded(),
        Err(ScenarioError::Cancelled { .. })
    ));
}

// ========================================
// Simple mode
// ========================================

#[test]
fn test_simple_mode_diagnostics() {
    let config = ScenarioConfig::builder()
        .num_scenarios(1000)
        .time_horizon(30.0)
        .build()
        .unwrap();
    let output = ScenarioOrchestrator::new(config).unwrap().generate_seeded().unwrap();
    assert_eq!(output.table.len(), 30_000);

    let means = output.diagnostics.mean_returns();
    assert!((means[&Indicator::StockReturn] - 0.10).abs() < 0.01);
    assert!((means[&Indicator::InterestRate] - 0.03).abs() < 0.005);

    let rho = output
        .diagnostics
        .correlations
        .get(Indicator::Inflation, Indicator::InterestRate)
        .unwrap();
    assert!(rho > 0.7, "inflation/interest correlation {}", rho);
}

#[test]
fn test_export_writes_three_files() {
    let config = ScenarioConfig::builder()
        .num_scenarios(5)
        .time_horizon(3.0)
        .build()
        .unwrap();
    let output = ScenarioOrchestrator::new(config).unwrap().generate_seeded().unwrap();

    let dir = std::env::temp_dir().join(format!("esg-export-{}", std::process::id()));
    let paths = write_to_dir(&output, &dir).unwrap();

    let scenarios = std::fs::read_to_string(&paths.scenarios).unwrap();
    let mut lines = scenarios.lines();
    assert_eq!(
        lines.next().unwrap(),
        "scenario_id,time_period,interest_rate,stock_return,bond_return,real_estate_return,inflation,gdp_growth"
    );
    assert_eq!(lines.count(), 15);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&paths.diagnostics).unwrap()).unwrap();
    assert_eq!(json["method"], "simple");
    assert_eq!(json["num_time_periods"], 3);

    std::fs::remove_dir_all(&dir).unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    /// Table length is always scenarios × steps in simple mode.
    #[test]
    fn prop_simple_table_length(n in 1usize..40, horizon in 1u32..12, quarterly in any::<bool>(), seed in 0u64..500) {
        let dt = if quarterly { 0.25 } else { 1.0 };
        let config = ScenarioConfig::builder()
            .num_scenarios(n)
            .time_horizon(horizon as f64)
            .timestep(dt)
            .seed(seed)
            .build()
            .unwrap();
        let steps = config.num_steps();
        let output = ScenarioOrchestrator::new(config).unwrap().generate_seeded().unwrap();
        prop_assert_eq!(output.table.len(), n * steps);
        prop_assert!(output.deflators.values().as_slice().iter().all(|d| *d > 0.0));
    }
}
