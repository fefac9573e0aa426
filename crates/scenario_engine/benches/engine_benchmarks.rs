//! Criterion benchmarks for scenario generation.
//!
//! Measures the full stochastic pipeline and the simple fast path across
//! scenario counts, plus the calibration stage on its own.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use scenario_engine::config::{GenerationMode, ScenarioConfig};
use scenario_engine::stochastic::calibrate;
use scenario_engine::ScenarioOrchestrator;

fn config(mode: GenerationMode, n: usize) -> ScenarioConfig {
    ScenarioConfig::builder()
        .mode(mode)
        .num_scenarios(n)
        .time_horizon(30.0)
        .timestep(1.0)
        .build()
        .unwrap()
}

/// Full calibrate → rates → shocks → assets pipeline.
fn bench_stochastic_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("stochastic_pipeline");
    group.sample_size(10);

    for n in [100, 1000, 5000] {
        let orchestrator = ScenarioOrchestrator::new(config(GenerationMode::Stochastic, n)).unwrap();
        group.bench_with_input(BenchmarkId::new("scenarios", n), &orchestrator, |b, o| {
            b.iter(|| black_box(o.generate_seeded().unwrap()));
        });
    }

    group.finish();
}

fn bench_simple_mode(c: &mut Criterion) {
    let mut group = c.benchmark_group("simple_mode");

    for n in [100, 1000, 5000] {
        let orchestrator = ScenarioOrchestrator::new(config(GenerationMode::Simple, n)).unwrap();
        group.bench_with_input(BenchmarkId::new("scenarios", n), &orchestrator, |b, o| {
            b.iter(|| black_box(o.generate_seeded().unwrap()));
        });
    }

    group.finish();
}

fn bench_calibration(c: &mut Criterion) {
    let mut group = c.benchmark_group("calibration");

    for dt in [1.0, 0.25, 1.0 / 12.0] {
        let cfg = ScenarioConfig::builder().timestep(dt).build().unwrap();
        group.bench_with_input(BenchmarkId::new("dt", format!("{:.3}", dt)), &cfg, |b, cfg| {
            b.iter(|| calibrate(black_box(cfg)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_stochastic_pipeline,
    bench_simple_mode,
    bench_calibration
);
criterion_main!(benches);
