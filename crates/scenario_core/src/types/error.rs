//! Error types for structured error handling.
//!
//! This module provides:
//! - `ScenarioError`: the taxonomy shared by every generation stage
//! - `InterpolationError`: errors from spline construction and evaluation
//! - `CorrelationError`: errors from correlation-matrix validation and factorisation
//! - `SolverError`: errors from the root finder and least-squares fitter
//!
//! Explosive rate paths are deliberately absent: they are recovered inside the
//! short-rate simulator and surfaced through diagnostics, never raised.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Categorised scenario-generation errors.
///
/// # Variants
/// - `Configuration`: missing or invalid parameter, reported with the field name
/// - `CorrelationStructure`: correlation matrix could not be repaired
/// - `DimensionMismatch`: two collaborating arrays disagree in shape
/// - `NotCalibrated`: curve queried before calibration
/// - `CurveTooShort`: more steps requested than the calibrated curve holds
/// - `Interpolation`: wrapped spline failure
/// - `Solver`: wrapped parameter-fitting failure
/// - `Cancelled`: an external cancellation signal was observed between stages
///
/// # Examples
/// ```
/// use scenario_core::types::ScenarioError;
///
/// let err = ScenarioError::configuration("timestep", "must be positive, got 0");
/// assert_eq!(
///     format!("{}", err),
///     "Configuration error in 'timestep': must be positive, got 0"
/// );
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScenarioError {
    /// Invalid or missing configuration value.
    #[error("Configuration error in '{field}': {message}")]
    Configuration {
        /// Name of the offending field
        field: String,
        /// What is wrong with it
        message: String,
    },

    /// Correlation matrix is indefinite beyond repair.
    #[error("Correlation structure error: {0}")]
    CorrelationStructure(String),

    /// Array shapes disagree.
    #[error("Dimension mismatch in {context}: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Where the mismatch was detected
        context: String,
        /// Expected shape, rendered
        expected: String,
        /// Actual shape, rendered
        got: String,
    },

    /// Curve accessed before calibration.
    #[error("Curve has not been calibrated")]
    NotCalibrated,

    /// Requested horizon exceeds the calibrated curve.
    #[error("Curve too short: requested {requested} points, {available} available")]
    CurveTooShort {
        /// Points requested
        requested: usize,
        /// Points available
        available: usize,
    },

    /// Interpolation failure.
    #[error("Interpolation error: {0}")]
    Interpolation(#[from] InterpolationError),

    /// Parameter fitting failure.
    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    /// Generation aborted by a cancellation signal.
    #[error("Generation cancelled after stage '{stage}'")]
    Cancelled {
        /// Last completed stage
        stage: String,
    },
}

impl ScenarioError {
    /// Create a configuration error for `field`.
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a dimension mismatch error.
    pub fn dimension_mismatch(
        context: impl Into<String>,
        expected: impl std::fmt::Display,
        got: impl std::fmt::Display,
    ) -> Self {
        Self::DimensionMismatch {
            context: context.into(),
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }

    /// True for errors caused by caller input rather than numerics.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. } | Self::CurveTooShort { .. } | Self::DimensionMismatch { .. }
        )
    }
}

/// Interpolation-related errors.
///
/// # Examples
/// ```
/// use scenario_core::types::InterpolationError;
///
/// let err = InterpolationError::OutOfBounds { x: 5.0, min: 0.0, max: 3.0 };
/// assert!(format!("{}", err).contains("outside valid domain"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InterpolationError {
    /// Query point outside valid interpolation domain.
    #[error("Query point {x} outside valid domain [{min}, {max}]")]
    OutOfBounds {
        /// The query point that was out of bounds
        x: f64,
        /// Minimum valid value
        min: f64,
        /// Maximum valid value
        max: f64,
    },

    /// Insufficient data points for interpolation.
    #[error("Insufficient data points: got {got}, need at least {need}")]
    InsufficientData {
        /// Number of points provided
        got: usize,
        /// Minimum number of points required
        need: usize,
    },

    /// Abscissae are not strictly increasing.
    #[error("Data is not strictly increasing at index {index}")]
    NonMonotonicData {
        /// Index where the violation was detected
        index: usize,
    },

    /// Invalid input data or parameters.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Root-finding and least-squares errors.
///
/// # Examples
/// ```
/// use scenario_core::types::SolverError;
///
/// let err = SolverError::NoBracket { a: 0.001, b: 0.1 };
/// assert!(format!("{}", err).contains("same sign"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SolverError {
    /// Iteration budget spent before convergence.
    #[error("Failed to converge after {iterations} iterations")]
    MaxIterationsExceeded {
        /// Iterations performed
        iterations: usize,
    },

    /// The objective has the same sign at both ends of the bracket.
    #[error("No bracket: f({a}) and f({b}) have the same sign")]
    NoBracket {
        /// Left end
        a: f64,
        /// Right end
        b: f64,
    },

    /// Empty parameter or residual vector, or a non-finite objective.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),
}

/// Correlation-matrix errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CorrelationError {
    /// Matrix is not square.
    #[error("Correlation matrix must be square: {rows} rows, row {row} has {cols} columns")]
    NotSquare {
        /// Number of rows
        rows: usize,
        /// Offending row
        row: usize,
        /// Its column count
        cols: usize,
    },

    /// Factor names do not match the matrix dimension.
    #[error("Expected {expected} factor names, got {got}")]
    NameCount {
        /// Matrix dimension
        expected: usize,
        /// Names supplied
        got: usize,
    },

    /// Unknown factor name.
    #[error("Unknown factor '{name}'. Available: {available}")]
    UnknownFactor {
        /// Requested name
        name: String,
        /// Comma-separated known names
        available: String,
    },

    /// A diagonal entry is non-positive or non-finite and cannot be normalised.
    #[error("Diagonal element at index {index} is {value}, cannot normalise")]
    InvalidDiagonal {
        /// Diagonal index
        index: usize,
        /// Value found
        value: f64,
    },

    /// Cholesky factorisation failed even after regularisation.
    #[error("Correlation matrix is not positive definite (pivot {pivot} = {value:.3e}) even after regularisation")]
    NotPositiveDefinite {
        /// Failing pivot row
        pivot: usize,
        /// Pivot value at failure
        value: f64,
    },

    /// Reordering is not a permutation.
    #[error("Invalid factor order: {0}")]
    InvalidOrder(String),
}

impl From<CorrelationError> for ScenarioError {
    fn from(err: CorrelationError) -> Self {
        match err {
            CorrelationError::NotPositiveDefinite { .. } | CorrelationError::InvalidDiagonal { .. } => {
                ScenarioError::CorrelationStructure(err.to_string())
            }
            other => ScenarioError::configuration("correlation", other.to_string()),
        }
    }
}
