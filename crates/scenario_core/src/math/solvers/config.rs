//! Root-finder configuration.

use num_traits::Float;

/// Tolerance and iteration budget of a root finder.
///
/// # Example
///
/// ```
/// use scenario_core::math::solvers::SolverConfig;
///
/// let config: SolverConfig<f64> = SolverConfig::default();
/// assert_eq!(config.max_iterations, 100);
///
/// let tight = SolverConfig::new(1e-14, 500);
/// assert!(tight.tolerance < config.tolerance);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig<T: Float> {
    /// Stop when `|f(x)|` or half the bracket width falls below this
    pub tolerance: T,
    /// Iterations before `MaxIterationsExceeded`
    pub max_iterations: usize,
}

impl<T: Float> Default for SolverConfig<T> {
    /// `tolerance = 1e-10`, `max_iterations = 100`.
    fn default() -> Self {
        Self {
            tolerance: T::from(1e-10).unwrap_or_else(T::epsilon),
            max_iterations: 100,
        }
    }
}

impl<T: Float> SolverConfig<T> {
    /// Explicit configuration.
    ///
    /// # Panics
    ///
    /// Panics if `tolerance <= 0` or `max_iterations == 0`.
    pub fn new(tolerance: T, max_iterations: usize) -> Self {
        assert!(tolerance > T::zero(), "tolerance must be positive");
        assert!(max_iterations > 0, "max_iterations must be > 0");
        Self {
            tolerance,
            max_iterations,
        }
    }
}
