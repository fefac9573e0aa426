//! Calibrate command implementation
//!
//! Calibrates a preset or configured yield curve onto the simulation grid and
//! emits the bond-price and forward curves as CSV.

use std::fs::File;
use std::io::Write;

use tracing::info;

use scenario_core::market_data::Currency;
use scenario_engine::stochastic::calibrate;
use scenario_models::calibration::CalibratedCurve;

use crate::config::load_with_env;
use crate::{CliError, Result};

/// Run the calibrate command
///
/// `currency` replaces any curve from the configuration file with the preset.
pub fn run(config_path: &str, currency: Option<&str>, dt: f64, output: Option<&str>) -> Result<()> {
    info!("Starting calibration...");

    let mut config = load_with_env(config_path)?;
    if let Some(code) = currency {
        config.currency = code.parse::<Currency>()?;
        config.yield_curve = None;
    }
    config.timestep = dt;
    info!(
        "  Curve: {}",
        if config.yield_curve.is_some() {
            "configured".to_string()
        } else {
            format!("{} preset", config.currency)
        }
    );
    info!("  Time step: {}", dt);

    let curve = calibrate(&config)?;
    let (lo, hi) = curve.forward_range();
    info!(
        "  Grid points: {}, forward range [{:.4}, {:.4}]",
        curve.len(),
        lo,
        hi
    );

    match output {
        Some(path) => {
            let file = File::create(path).map_err(|source| CliError::Io {
                path: path.to_string(),
                source,
            })?;
            write_curve(&curve, file)?;
            info!("Wrote calibrated curve to: {}", path);
        }
        None => write_curve(&curve, std::io::stdout().lock())?,
    }

    info!("Calibration complete");
    Ok(())
}

/// `time, bond_price, forward_rate, raw_forward_rate` rows.
fn write_curve<W: Write>(curve: &CalibratedCurve, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["time", "bond_price", "forward_rate", "raw_forward_rate"])?;
    let times = curve.times();
    for (i, t) in times.iter().enumerate() {
        csv.write_record([
            t.to_string(),
            curve.bond_prices()[i].to_string(),
            curve.forward_rates()[i].to_string(),
            curve.raw_forward_rates()[i].to_string(),
        ])?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}
