//! CLI command implementations
//!
//! Each submodule implements a specific CLI command.

pub mod batch;
pub mod calibrate;
pub mod check;
pub mod fit;
pub mod generate;
