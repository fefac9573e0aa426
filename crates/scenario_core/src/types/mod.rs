//! Core types: error taxonomy and path storage.

pub mod error;
pub mod matrix;

pub use error::{CorrelationError, InterpolationError, ScenarioError, SolverError};
pub use matrix::PathMatrix;
