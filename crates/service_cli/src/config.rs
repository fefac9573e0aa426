//! Configuration loading for the CLI.
//!
//! Precedence, lowest first: `ScenarioConfig` defaults, the TOML file,
//! `ESG_*` environment variables, command-line flags.

use std::path::Path;

use tracing::debug;

use scenario_engine::config::{GenerationMode, ScenarioConfig};

use crate::{CliError, Result};

/// Default configuration file name.
pub const DEFAULT_CONFIG: &str = "esg.toml";

/// Read `path` as TOML.
///
/// A missing file is an error unless `path` is [`DEFAULT_CONFIG`], in which
/// case the defaults are used.
pub fn load(path: &str) -> Result<ScenarioConfig> {
    if !Path::new(path).exists() {
        if path == DEFAULT_CONFIG {
            debug!("{} not found, using defaults", path);
            return Ok(ScenarioConfig::default());
        }
        return Err(CliError::FileNotFound(path.to_string()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_string(),
        source,
    })?;
    parse(&content, path)
}

/// Parse TOML text; `origin` labels errors.
pub fn parse(content: &str, origin: &str) -> Result<ScenarioConfig> {
    toml::from_str(content).map_err(|e| CliError::Parse {
        path: origin.to_string(),
        message: e.to_string(),
    })
}

/// Apply `ESG_NUM_SCENARIOS`, `ESG_SEED` and `ESG_MODE` read through `lookup`.
pub fn with_env_override<F>(mut config: ScenarioConfig, lookup: F) -> Result<ScenarioConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(n) = lookup("ESG_NUM_SCENARIOS") {
        config.num_scenarios = n
            .trim()
            .parse()
            .map_err(|_| CliError::InvalidArgument(format!("ESG_NUM_SCENARIOS={}", n)))?;
    }
    if let Some(seed) = lookup("ESG_SEED") {
        config.seed = seed
            .trim()
            .parse()
            .map_err(|_| CliError::InvalidArgument(format!("ESG_SEED={}", seed)))?;
    }
    if let Some(mode) = lookup("ESG_MODE") {
        config.mode = mode.parse::<GenerationMode>()?;
    }
    Ok(config)
}

/// File, then process environment.
pub fn load_with_env(path: &str) -> Result<ScenarioConfig> {
    with_env_override(load(path)?, |key| std::env::var(key).ok())
}

/// Command-line overrides.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    /// `--mode`
    pub mode: Option<GenerationMode>,
    /// `--scenarios`
    pub num_scenarios: Option<usize>,
    /// `--seed`
    pub seed: Option<u64>,
}

impl Overrides {
    /// Apply set flags to `config`.
    pub fn apply(&self, mut config: ScenarioConfig) -> ScenarioConfig {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(n) = self.num_scenarios {
            config.num_scenarios = n;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config
    }
}

/// File, environment, flags, then validation.
pub fn resolve(path: &str, overrides: &Overrides) -> Result<ScenarioConfig> {
    let config = overrides.apply(load_with_env(path)?);
    config.validate()?;
    Ok(config)
}
