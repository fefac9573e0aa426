//! Generate command implementation
//!
//! Runs one scenario set and writes the tables and diagnostics.

use std::path::Path;

use tracing::{info, warn};

use scenario_engine::export::write_to_dir;
use scenario_engine::ScenarioOrchestrator;

use crate::config::{resolve, Overrides};
use crate::Result;

/// Run the generate command
pub fn run(config_path: &str, overrides: &Overrides, output_dir: &str) -> Result<()> {
    info!("Generating scenarios...");
    info!("  Config: {}", config_path);
    info!("  Output directory: {}", output_dir);

    let config = resolve(config_path, overrides)?;
    info!(
        "  Mode: {}, scenarios: {}, steps: {}, seed: {}",
        config.mode,
        config.num_scenarios,
        config.num_steps(),
        config.seed
    );

    let output = ScenarioOrchestrator::new(config)?.generate_seeded()?;
    let diagnostics = &output.diagnostics;

    for (indicator, stats) in &diagnostics.summary {
        info!(
            "  {:<20} mean {:>9.5}  std {:>9.5}",
            indicator.column_name(),
            stats.mean,
            stats.std
        );
    }
    if let Some(martingale) = &diagnostics.martingale {
        let verdict = if martingale.passes { "pass" } else { "FAIL" };
        info!(
            "  Martingale test: {} (max deviation {:.4}, tolerance {})",
            verdict, martingale.max_deviation, martingale.tolerance
        );
    }
    if let Some(report) = diagnostics.path_filter {
        if report.shortfall() > 0 {
            warn!(
                "  Delivered {} of {} scenarios ({:?})",
                report.delivered, report.requested, report.outcome
            );
        }
    }

    let paths = write_to_dir(&output, Path::new(output_dir))?;
    info!("Wrote {}", paths.scenarios.display());
    info!("Wrote {}", paths.deflators.display());
    info!("Wrote {}", paths.diagnostics.display());
    Ok(())
}
