//! Parallel generation of independent runs.
//!
//! Each job gets its own child stream `root.derive(i)`, so results depend
//! only on the root seed and the job's position, never on scheduling.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{info, warn};

use scenario_core::cancel::CancellationToken;
use scenario_core::rng::ScenarioRng;
use scenario_core::types::ScenarioError;

use crate::config::ScenarioConfig;
use crate::orchestrator::{ScenarioOrchestrator, ScenarioOutput};
use crate::scenario_type::ScenarioType;
use crate::table::Indicator;

/// One run of a batch.
#[derive(Clone, Debug)]
pub struct BatchJob {
    /// Label used in logs and output paths
    pub label: String,
    /// Weight in [`weighted_means`]
    pub probability: f64,
    /// Run configuration
    pub config: ScenarioConfig,
}

/// Outcome of one job.
#[derive(Debug)]
pub struct BatchResult {
    /// Job label
    pub label: String,
    /// Job weight
    pub probability: f64,
    /// Output or the error that stopped it
    pub output: Result<ScenarioOutput, ScenarioError>,
}

/// Pessimistic, baseline and optimistic variants of `base`.
pub fn outlook_jobs(base: &ScenarioConfig) -> Vec<BatchJob> {
    ScenarioType::ALL
        .iter()
        .map(|t| {
            let mut config = base.clone();
            config.economic = t.apply(&base.economic);
            BatchJob {
                label: t.to_string(),
                probability: t.probability(),
                config,
            }
        })
        .collect()
}

/// Run `jobs` on the rayon pool. Results keep job order.
///
/// A failing job does not stop the others; cancelling `cancel` stops every
/// job at its next stage boundary.
pub fn generate_batch(
    jobs: &[BatchJob],
    root: &ScenarioRng,
    cancel: &CancellationToken,
) -> Vec<BatchResult> {
    info!(jobs = jobs.len(), seed = root.seed(), "starting batch");
    jobs.par_iter()
        .enumerate()
        .map(|(i, job)| {
            let mut rng = root.derive(i as u64);
            let output = ScenarioOrchestrator::new(job.config.clone())
                .map(|o| o.with_cancellation(cancel.clone()))
                .and_then(|o| o.generate(&mut rng));
            if let Err(err) = &output {
                warn!(label = %job.label, error = %err, "batch job failed");
            }
            BatchResult {
                label: job.label.clone(),
                probability: job.probability,
                output,
            }
        })
        .collect()
}

/// Probability-weighted mean of each indicator over successful jobs.
///
/// Weights are renormalised over the jobs that succeeded. `None` when none did.
pub fn weighted_means(results: &[BatchResult]) -> Option<BTreeMap<Indicator, f64>> {
    let ok: Vec<(f64, &ScenarioOutput)> = results
        .iter()
        .filter_map(|r| r.output.as_ref().ok().map(|o| (r.probability, o)))
        .collect();
    let total: f64 = ok.iter().map(|(p, _)| p).sum();
    if ok.is_empty() || total <= 0.0 {
        return None;
    }
    let mut means = BTreeMap::new();
    for indicator in Indicator::ALL {
        let value = ok
            .iter()
            .map(|(p, o)| {
                p * o
                    .diagnostics
                    .summary
                    .get(&indicator)
                    .map_or(0.0, |s| s.mean)
            })
            .sum::<f64>()
            / total;
        means.insert(indicator, value);
    }
    Some(means)
}
