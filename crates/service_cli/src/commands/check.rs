//! Check command implementation
//!
//! Validates a configuration without simulating.

use tracing::{info, warn};

use scenario_core::types::ScenarioError;
use scenario_engine::config::GenerationMode;
use scenario_engine::stochastic::calibrate;

use crate::config::{resolve, Overrides};
use crate::Result;

/// Run the check command
pub fn run(config_path: &str) -> Result<()> {
    info!("Checking configuration: {}", config_path);

    let config = resolve(config_path, &Overrides::default())?;
    info!("  Mode: {}", config.mode);
    info!(
        "  Scenarios: {}, horizon: {} years, dt: {} ({} steps)",
        config.num_scenarios,
        config.time_horizon,
        config.timestep,
        config.num_steps()
    );
    info!("  Seed: {}", config.seed);

    let matrix = config.correlation.to_matrix()?;
    if !matrix.repairs().is_empty() {
        warn!("  Correlation matrix needs repair: {:?}", matrix.repairs());
    }
    if config.mode == GenerationMode::Stochastic {
        let factor = matrix.cholesky().map_err(ScenarioError::from)?;
        if factor.is_regularised() {
            warn!("  Correlation matrix is only positive definite after regularisation");
        }
        let curve = calibrate(&config)?;
        let (lo, hi) = curve.forward_range();
        info!(
            "  Calibrated {} grid points, forward range [{:.4}, {:.4}]",
            curve.len(),
            lo,
            hi
        );
    }

    info!("Configuration OK");
    Ok(())
}
