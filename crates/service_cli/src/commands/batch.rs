//! Batch command implementation
//!
//! Runs the pessimistic, baseline and optimistic outlooks in parallel and
//! writes each into its own subdirectory.

use std::path::Path;

use tracing::{error, info};

use scenario_core::cancel::CancellationToken;
use scenario_engine::batch::{generate_batch, outlook_jobs, weighted_means};
use scenario_engine::export::write_to_dir;

use crate::config::{resolve, Overrides};
use crate::{CliError, Result};

/// Run the batch command
pub fn run(config_path: &str, overrides: &Overrides, output_dir: &str) -> Result<()> {
    info!("Running outlook batch...");
    info!("  Config: {}", config_path);
    info!("  Output directory: {}", output_dir);

    let config = resolve(config_path, overrides)?;
    let root = config.rng();
    let jobs = outlook_jobs(&config);
    let results = generate_batch(&jobs, &root, &CancellationToken::new());

    let mut succeeded = 0;
    for result in &results {
        match &result.output {
            Ok(output) => {
                let dir = Path::new(output_dir).join(&result.label);
                write_to_dir(output, &dir)?;
                info!(
                    "  {:<12} p={:.2}  {} rows -> {}",
                    result.label,
                    result.probability,
                    output.table.len(),
                    dir.display()
                );
                succeeded += 1;
            }
            Err(err) => error!("  {:<12} failed: {}", result.label, err),
        }
    }
    if succeeded == 0 {
        return Err(CliError::BatchFailed(results.len()));
    }

    if let Some(means) = weighted_means(&results) {
        info!("Probability-weighted means:");
        for (indicator, value) in means {
            info!("  {:<20} {:>9.5}", indicator.column_name(), value);
        }
    }
    info!("Batch complete: {}/{} outlooks", succeeded, results.len());
    Ok(())
}
