//! Brent's bracketing root finder.

use num_traits::Float;

use super::SolverConfig;
use crate::types::SolverError;

/// Brent's method: inverse quadratic interpolation or secant steps while
/// they stay inside the bracket, bisection otherwise.
///
/// Converges for any continuous `f` whose values at the bracket ends differ
/// in sign.
///
/// # Example
///
/// ```
/// use scenario_core::math::solvers::{BrentSolver, SolverConfig};
///
/// // continuously compounded rate of a 10y discount factor of 0.75
/// let solver = BrentSolver::new(SolverConfig::default());
/// let rate = solver.find_root(|r: f64| (-10.0 * r).exp() - 0.75, 0.0, 0.2).unwrap();
/// assert!((rate - 0.75f64.ln() / -10.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct BrentSolver<T: Float> {
    config: SolverConfig<T>,
}

impl<T: Float> BrentSolver<T> {
    /// Solver with `config`.
    pub fn new(config: SolverConfig<T>) -> Self {
        Self { config }
    }

    /// Solver with [`SolverConfig::default`].
    pub fn with_defaults() -> Self {
        Self::new(SolverConfig::default())
    }

    /// Configuration in use.
    pub fn config(&self) -> &SolverConfig<T> {
        &self.config
    }

    /// Root of `f` in `[lower, upper]`.
    ///
    /// # Errors
    ///
    /// * `NoBracket` - `f(lower)` and `f(upper)` share a sign
    /// * `NumericalInstability` - `f` is not finite at a bracket end
    /// * `MaxIterationsExceeded` - the budget ran out
    pub fn find_root<F>(&self, f: F, lower: T, upper: T) -> Result<T, SolverError>
    where
        F: Fn(T) -> T,
    {
        let to_f64 = |x: T| x.to_f64().unwrap_or(f64::NAN);
        let two = T::one() + T::one();
        let three = two + T::one();
        let tol = self.config.tolerance;

        let (mut a, mut b) = (lower, upper);
        let (mut fa, mut fb) = (f(a), f(b));
        if !(fa.is_finite() && fb.is_finite()) {
            return Err(SolverError::NumericalInstability(format!(
                "objective not finite at bracket [{}, {}]",
                to_f64(a),
                to_f64(b)
            )));
        }
        if fa == T::zero() {
            return Ok(a);
        }
        if fb == T::zero() {
            return Ok(b);
        }
        if fa.signum() == fb.signum() {
            return Err(SolverError::NoBracket {
                a: to_f64(a),
                b: to_f64(b),
            });
        }

        // c is the contrapoint: f(b) and f(c) always bracket the root
        let (mut c, mut fc) = (a, fa);
        let mut step = b - a;
        let mut prev_step = step;

        for _ in 0..self.config.max_iterations {
            if fb.signum() == fc.signum() {
                c = a;
                fc = fa;
                step = b - a;
                prev_step = step;
            }
            if fc.abs() < fb.abs() {
                a = b;
                b = c;
                c = a;
                fa = fb;
                fb = fc;
                fc = fa;
            }

            let half = (c - b) / two;
            if fb.abs() < tol || half.abs() <= tol {
                return Ok(b);
            }

            let mut bisect = true;
            if prev_step.abs() >= tol && fa.abs() > fb.abs() {
                let s = fb / fa;
                let (p, q) = if a == c {
                    (two * half * s, T::one() - s)
                } else {
                    let q = fa / fc;
                    let r = fb / fc;
                    (
                        s * (two * half * q * (q - r) - (b - a) * (r - T::one())),
                        (q - T::one()) * (r - T::one()) * (s - T::one()),
                    )
                };
                let (p, q) = if p > T::zero() { (p, -q) } else { (-p, q) };
                if two * p < (three * half * q - (tol * q).abs()).min((prev_step * q).abs()) {
                    prev_step = step;
                    step = p / q;
                    bisect = false;
                }
            }
            if bisect {
                step = half;
                prev_step = half;
            }

            a = b;
            fa = fb;
            b = if step.abs() > tol {
                b + step
            } else if half > T::zero() {
                b + tol
            } else {
                b - tol
            };
            fb = f(b);
        }

        Err(SolverError::MaxIterationsExceeded {
            iterations: self.config.max_iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // ========================================
    // Convergence
    // ========================================

    #[test]
    fn test_polynomial_root() {
        let solver = BrentSolver::with_defaults();
        let f = |x: f64| x * x * x - x - 2.0;
        let root = solver.find_root(f, 1.0, 2.0).unwrap();
        assert!(f(root).abs() < 1e-10);
    }

    #[test]
    fn test_reversed_bracket() {
        let solver = BrentSolver::with_defaults();
        let root = solver.find_root(|x: f64| x * x - 2.0, 2.0, 0.0).unwrap();
        assert_relative_eq!(root, std::f64::consts::SQRT_2, epsilon = 1e-10);
    }

    #[test]
    fn test_root_at_endpoint() {
        let solver = BrentSolver::with_defaults();
        assert_eq!(solver.find_root(|x: f64| x - 1.0, 1.0, 3.0).unwrap(), 1.0);
    }

    #[test]
    fn test_flat_then_steep() {
        // bisection fallback: interpolation is poor on this shape
        let solver = BrentSolver::with_defaults();
        let f = |x: f64| if x < 0.7 { -1e-3 } else { (x - 0.7) * 1e3 - 1e-3 };
        let root = solver.find_root(f, 0.0, 1.0).unwrap();
        assert_relative_eq!(root, 0.700001, epsilon = 1e-8);
    }

    #[test]
    fn test_f32() {
        let solver: BrentSolver<f32> = BrentSolver::new(SolverConfig::new(1e-6, 100));
        let root = solver.find_root(|x: f32| x * x - 4.0, 0.0, 5.0).unwrap();
        assert!((root - 2.0).abs() < 1e-5);
    }

    // ========================================
    // Errors
    // ========================================

    #[test]
    fn test_no_bracket() {
        let solver = BrentSolver::with_defaults();
        let err = solver.find_root(|x: f64| x * x + 1.0, -1.0, 1.0).unwrap_err();
        assert_eq!(err, SolverError::NoBracket { a: -1.0, b: 1.0 });
    }

    #[test]
    fn test_non_finite_endpoint() {
        let solver = BrentSolver::with_defaults();
        let err = solver.find_root(|x: f64| 1.0 / x, 0.0, 1.0).unwrap_err();
        assert!(matches!(err, SolverError::NumericalInstability(_)));
    }

    #[test]
    fn test_budget_exhausted() {
        let solver = BrentSolver::new(SolverConfig::new(1e-15, 2));
        let err = solver
            .find_root(|x: f64| (x - 0.123456789).powi(3), -10.0, 10.0)
            .unwrap_err();
        assert_eq!(err, SolverError::MaxIterationsExceeded { iterations: 2 });
    }
}
