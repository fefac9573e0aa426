//! Fit command implementation
//!
//! Calibrates Hull-White `a` and `σ` to swaption volatilities read from a
//! CSV file with an `expiry,tenor,volatility` header.

use std::io::Read;
use std::path::Path;

use tracing::info;

use scenario_models::calibration::{initial_guess, HullWhiteFit, SwaptionCalibrator, SwaptionQuote};

use crate::config::load_with_env;
use crate::{CliError, Result};

/// Run the fit command
///
/// With `mean_reversion` only `σ` is fitted; otherwise both parameters are,
/// starting from a guess derived from the configured curve.
pub fn run(config_path: &str, quotes_path: &str, mean_reversion: Option<f64>) -> Result<()> {
    info!("Fitting Hull-White parameters...");
    info!("  Quotes: {}", quotes_path);

    if !Path::new(quotes_path).exists() {
        return Err(CliError::FileNotFound(quotes_path.to_string()));
    }
    let file = std::fs::File::open(quotes_path).map_err(|source| CliError::Io {
        path: quotes_path.to_string(),
        source,
    })?;
    let calibrator = SwaptionCalibrator::new(read_quotes(file)?)?;
    info!("  {} quotes loaded", calibrator.quotes().len());

    let fit = match mean_reversion {
        Some(a) => {
            info!("  Mean reversion fixed at {}", a);
            calibrator.calibrate_volatility(a)?
        }
        None => {
            let config = load_with_env(config_path)?;
            let start = initial_guess(&config.curve());
            info!(
                "  Starting from a = {}, sigma = {:.4}",
                start.mean_reversion, start.volatility
            );
            calibrator.calibrate(start)?
        }
    };
    report(&fit);
    Ok(())
}

fn read_quotes<R: Read>(reader: R) -> Result<Vec<SwaptionQuote>> {
    let mut csv = csv::Reader::from_reader(reader);
    let mut quotes = Vec::new();
    for row in csv.deserialize() {
        let quote: SwaptionQuote = row?;
        quotes.push(quote);
    }
    Ok(quotes)
}

fn report(fit: &HullWhiteFit) {
    info!("Hull-White fit:");
    info!("  mean_reversion_speed = {:.6}", fit.params.mean_reversion);
    info!("  hw_volatility        = {:.6}", fit.params.volatility);
    info!("  RMSE                 = {:.3e}", fit.rmse);
    if !fit.converged {
        info!("  (stopped on a search bound or before convergence)");
    }
}
