//! Market inputs: observed spot-rate curves and synthetic curve builders.

mod yield_curve;

pub use yield_curve::{bootstrap_spot_rates, nelson_siegel, Currency, YieldCurve};
