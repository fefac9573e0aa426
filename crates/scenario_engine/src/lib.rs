//! # Scenario Engine (L3: Orchestration)
//!
//! Composes the calibration and model layer into complete economic scenario
//! sets.
//!
//! This crate provides:
//! - [`config::ScenarioConfig`]: validated run configuration (serde + builder)
//! - [`orchestrator::ScenarioOrchestrator`]: simple and stochastic generation
//! - [`table::EconomicScenarioTable`] / [`table::DeflatorTable`]: the outputs
//!   handed to downstream consumers
//! - [`diagnostics::Diagnostics`]: summary statistics, realised correlation,
//!   martingale test and path-filter report
//! - [`batch::generate_batch`]: independent runs in parallel on rayon
//! - [`export`]: CSV / JSON writers
//!
//! ## Generation modes
//!
//! | Mode | Pipeline |
//! |------|----------|
//! | `simple` | three normal drivers mixed with fixed loadings |
//! | `stochastic` | calibrate → Hull-White → correlated shocks → equity → real estate |
//!
//! ## Usage
//!
//! ```rust
//! use scenario_engine::config::{GenerationMode, ScenarioConfig};
//! use scenario_engine::orchestrator::ScenarioOrchestrator;
//!
//! let config = ScenarioConfig::builder()
//!     .mode(GenerationMode::Stochastic)
//!     .num_scenarios(100)
//!     .time_horizon(10.0)
//!     .build()
//!     .unwrap();
//!
//! let output = ScenarioOrchestrator::new(config).unwrap().generate_seeded().unwrap();
//! let martingale = output.diagnostics.martingale.unwrap();
//! assert!(martingale.max_deviation.is_finite());
//! ```

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod batch;
pub mod config;
pub mod diagnostics;
pub mod export;
pub mod orchestrator;
pub mod scenario_type;
mod simple;
pub mod stochastic;
pub mod table;

pub use config::{GenerationMode, ScenarioConfig};
pub use orchestrator::{ScenarioOrchestrator, ScenarioOutput};
pub use scenario_type::ScenarioType;
