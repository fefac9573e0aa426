//! Interpolation methods for curve construction.
//!
//! - [`CubicSplineInterpolator`]: natural cubic spline with C² continuity, used
//!   to move discount factors onto the simulation grid
//!
//! All interpolators implement [`Interpolator`] and are generic over
//! `T: num_traits::Float`.
//!
//! ## Example
//!
//! ```
//! use scenario_core::math::interpolators::{CubicSplineInterpolator, Interpolator};
//!
//! let xs: [f64; 4] = [0.0, 1.0, 2.0, 3.0];
//! let ys: [f64; 4] = [1.0, 0.98, 0.95, 0.91];
//!
//! let spline = CubicSplineInterpolator::new(&xs, &ys).unwrap();
//! assert_eq!(spline.domain(), (0.0, 3.0));
//! assert!((spline.interpolate(2.0).unwrap() - 0.95).abs() < 1e-12);
//! ```

mod cubic_spline;
mod traits;

pub use cubic_spline::CubicSplineInterpolator;
pub use traits::Interpolator;
