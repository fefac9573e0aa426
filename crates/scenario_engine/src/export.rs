//! CSV and JSON export of generation output.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::diagnostics::Diagnostics;
use crate::orchestrator::ScenarioOutput;
use crate::table::{DeflatorTable, EconomicScenarioTable};

/// Export failures.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV encoding or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem failure.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Diagnostics serialisation failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ExportError + '_ {
    move |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Write the scenario table with a header row.
pub fn write_scenarios<W: Write>(table: &EconomicScenarioTable, writer: W) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in table.rows() {
        csv.serialize(row)?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write the deflator table: `scenario_id, t_1, …, t_n`.
pub fn write_deflators<W: Write>(table: &DeflatorTable, writer: W) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(table.header())?;
    for (id, values) in table.scenario_ids().iter().zip(table.values().iter_rows()) {
        let record = std::iter::once(id.clone()).chain(values.iter().map(|v| v.to_string()));
        csv.write_record(record)?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Pretty-printed diagnostics.
pub fn write_diagnostics<W: Write>(diagnostics: &Diagnostics, writer: W) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(writer, diagnostics)?;
    Ok(())
}

/// Files written by [`write_to_dir`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportPaths {
    /// `scenarios.csv`
    pub scenarios: PathBuf,
    /// `deflators.csv`
    pub deflators: PathBuf,
    /// `diagnostics.json`
    pub diagnostics: PathBuf,
}

/// Write `scenarios.csv`, `deflators.csv` and `diagnostics.json` into `dir`,
/// creating it if needed.
pub fn write_to_dir(output: &ScenarioOutput, dir: &Path) -> Result<ExportPaths, ExportError> {
    fs::create_dir_all(dir).map_err(io_error(dir))?;
    let paths = ExportPaths {
        scenarios: dir.join("scenarios.csv"),
        deflators: dir.join("deflators.csv"),
        diagnostics: dir.join("diagnostics.json"),
    };

    let file = File::create(&paths.scenarios).map_err(io_error(&paths.scenarios))?;
    write_scenarios(&output.table, file)?;
    let file = File::create(&paths.deflators).map_err(io_error(&paths.deflators))?;
    write_deflators(&output.deflators, file)?;
    let file = File::create(&paths.diagnostics).map_err(io_error(&paths.diagnostics))?;
    write_diagnostics(&output.diagnostics, file)?;

    info!(dir = %dir.display(), rows = output.table.len(), "exported scenarios");
    Ok(paths)
}
