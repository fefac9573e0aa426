//! Entry point composing calibration, models and diagnostics.

use std::time::Instant;

use serde::Serialize;
use tracing::info;

use scenario_core::cancel::CancellationToken;
use scenario_core::rng::ScenarioRng;
use scenario_core::types::ScenarioError;

use crate::config::{GenerationMode, ScenarioConfig};
use crate::diagnostics::Diagnostics;
use crate::table::{DeflatorTable, EconomicScenarioTable};
use crate::{simple, stochastic};

/// Tables and diagnostics of one generation call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScenarioOutput {
    /// Long-format indicator table
    pub table: EconomicScenarioTable,
    /// Per-scenario deflators
    pub deflators: DeflatorTable,
    /// Summary, correlation and stochastic checks
    pub diagnostics: Diagnostics,
}

/// Scenario orchestrator.
///
/// Holds a validated configuration; each [`generate`](Self::generate) call
/// builds every curve, path and cube afresh from the caller's random stream.
///
/// # Examples
///
/// ```
/// use scenario_engine::config::ScenarioConfig;
/// use scenario_engine::orchestrator::ScenarioOrchestrator;
///
/// let config = ScenarioConfig::builder()
///     .num_scenarios(20)
///     .time_horizon(5.0)
///     .build()
///     .unwrap();
/// let output = ScenarioOrchestrator::new(config).unwrap().generate_seeded().unwrap();
///
/// assert_eq!(output.table.len(), 20 * 5);
/// assert_eq!(output.deflators.len(), 20);
/// ```
#[derive(Clone, Debug)]
pub struct ScenarioOrchestrator {
    config: ScenarioConfig,
    cancel: CancellationToken,
}

impl ScenarioOrchestrator {
    /// Validate `config` up front.
    ///
    /// # Errors
    ///
    /// `Configuration` naming the first invalid field.
    pub fn new(config: ScenarioConfig) -> Result<Self, ScenarioError> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Observe `token` between pipeline stages.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Configuration in use.
    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Cancellation handle; cancelling a clone aborts a running call.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Generate from the caller's stream.
    ///
    /// # Errors
    ///
    /// - `Cancelled` when the token fires between stages
    /// - `CorrelationStructure` for an unrepairable correlation override
    /// - `Configuration` when every rate path breaches the bounds
    pub fn generate(&self, rng: &mut ScenarioRng) -> Result<ScenarioOutput, ScenarioError> {
        let started = Instant::now();
        info!(
            mode = %self.config.mode,
            scenarios = self.config.num_scenarios,
            steps = self.config.num_steps(),
            seed = rng.seed(),
            "generating scenarios"
        );
        self.cancel.checkpoint("start")?;

        let output = match self.config.mode {
            GenerationMode::Simple => simple::generate(&self.config, rng, &self.cancel)?,
            GenerationMode::Stochastic => stochastic::generate(&self.config, rng, &self.cancel)?,
        };

        info!(
            rows = output.table.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generation finished"
        );
        Ok(output)
    }

    /// Generate from a fresh stream seeded with `config.seed`.
    pub fn generate_seeded(&self) -> Result<ScenarioOutput, ScenarioError> {
        let mut rng = self.config.rng();
        self.generate(&mut rng)
    }
}
