//! ESG CLI - Command Line Operations for the Economic Scenario Generator
//!
//! # Commands
//!
//! - `esg generate --output <dir>` - Generate one scenario set
//! - `esg calibrate --currency EUR --dt 0.5` - Calibrate a yield curve
//! - `esg batch --output <dir>` - Run the three outlooks in parallel
//! - `esg check` - Validate a configuration file
//! - `esg fit --quotes swaptions.csv` - Fit Hull-White parameters to swaption vols
//!
//! Configuration is read from `--config` (default `esg.toml`), then
//! `ESG_NUM_SCENARIOS`, `ESG_SEED` and `ESG_MODE`, then command flags.

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scenario_engine::config::GenerationMode;

mod commands;
mod config;
mod error;

pub use error::{CliError, Result};

use config::Overrides;

/// Economic scenario generator CLI
#[derive(Parser)]
#[command(name = "esg")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = config::DEFAULT_CONFIG)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate scenarios and write CSV/JSON output
    Generate {
        /// Generation mode (simple, stochastic)
        #[arg(short, long)]
        mode: Option<GenerationMode>,

        /// Number of scenarios
        #[arg(short = 'n', long)]
        scenarios: Option<usize>,

        /// Random seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Output directory
        #[arg(short, long, default_value = "./scenarios")]
        output: String,
    },

    /// Calibrate a yield curve and print the forward curve
    Calibrate {
        /// Preset curve currency (EUR, USD, GBP); defaults to the configured curve
        #[arg(long)]
        currency: Option<String>,

        /// Grid step in years
        #[arg(long, default_value = "1.0")]
        dt: f64,

        /// Output CSV file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Run pessimistic, baseline and optimistic outlooks in parallel
    Batch {
        /// Number of scenarios per outlook
        #[arg(short = 'n', long)]
        scenarios: Option<usize>,

        /// Root random seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Output directory
        #[arg(short, long, default_value = "./scenarios")]
        output: String,
    },

    /// Validate the configuration without simulating
    Check,

    /// Fit Hull-White parameters to swaption volatilities
    Fit {
        /// CSV with expiry,tenor,volatility columns
        #[arg(short, long)]
        quotes: String,

        /// Fix the mean reversion and fit only sigma
        #[arg(short = 'a', long)]
        mean_reversion: Option<f64>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    debug!("Verbose mode enabled");

    match cli.command {
        Commands::Generate {
            mode,
            scenarios,
            seed,
            output,
        } => {
            let overrides = Overrides {
                mode,
                num_scenarios: scenarios,
                seed,
            };
            commands::generate::run(&cli.config, &overrides, &output)?
        }
        Commands::Calibrate {
            currency,
            dt,
            output,
        } => commands::calibrate::run(&cli.config, currency.as_deref(), dt, output.as_deref())?,
        Commands::Batch {
            scenarios,
            seed,
            output,
        } => {
            let overrides = Overrides {
                mode: None,
                num_scenarios: scenarios,
                seed,
            };
            commands::batch::run(&cli.config, &overrides, &output)?
        }
        Commands::Check => commands::check::run(&cli.config)?,
        Commands::Fit {
            quotes,
            mean_reversion,
        } => commands::fit::run(&cli.config, &quotes, mean_reversion)?,
    }
    Ok(())
}
