//! CLI error types.

use thiserror::Error;

use scenario_core::types::ScenarioError;
use scenario_engine::export::ExportError;

/// Errors surfaced by `esg` commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Referenced file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Configuration file could not be read.
    #[error("Cannot read {path}: {source}")]
    Io {
        /// File involved
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for `ScenarioConfig`.
    #[error("Invalid configuration in {path}: {message}")]
    Parse {
        /// File involved
        path: String,
        /// Parser message
        message: String,
    },

    /// Bad command-line or environment value.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Generation or validation failure.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    /// Writing output failed.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Curve CSV output failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Every job of a batch failed.
    #[error("All {0} batch jobs failed")]
    BatchFailed(usize),
}

/// Result alias for CLI commands.
pub type Result<T> = std::result::Result<T, CliError>;
