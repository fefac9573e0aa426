//! Levenberg-Marquardt nonlinear least squares.
//!
//! Each iteration solves the damped normal equations
//!
//! ```text
//! (JᵀJ + λI) δ = -Jᵀr
//! ```
//!
//! with a forward-difference Jacobian `J`. An improving step is accepted and
//! `λ` shrinks; otherwise `λ` grows and the step is retried. With bounds, every
//! trial point is projected onto the box before it is evaluated.

use crate::types::SolverError;

/// Damping schedule and stopping rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LMConfig {
    /// Stop when `sqrt(Σ r²)` falls below this
    pub tolerance: f64,
    /// Stop when the relative parameter step falls below this
    pub param_tolerance: f64,
    /// Iteration budget
    pub max_iterations: usize,
    /// Starting damping
    pub initial_lambda: f64,
    /// Damping multiplier after a rejected step
    pub lambda_up: f64,
    /// Damping multiplier after an accepted step
    pub lambda_down: f64,
    /// Damping floor
    pub min_lambda: f64,
    /// Damping ceiling; reaching it ends the search
    pub max_lambda: f64,
}

impl Default for LMConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-12,
            param_tolerance: 1e-10,
            max_iterations: 200,
            initial_lambda: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
            min_lambda: 1e-12,
            max_lambda: 1e12,
        }
    }
}

/// Outcome of a fit.
#[derive(Debug, Clone, PartialEq)]
pub struct LMResult {
    /// Fitted parameters
    pub params: Vec<f64>,
    /// `Σ r²` at `params`
    pub residual_ss: f64,
    /// Iterations used
    pub iterations: usize,
    /// False when the budget or damping ceiling was hit first
    pub converged: bool,
}

impl LMResult {
    /// `sqrt(Σ r² / n)`.
    pub fn rmse(&self, n_observations: usize) -> f64 {
        if n_observations == 0 {
            return 0.0;
        }
        (self.residual_ss / n_observations as f64).sqrt()
    }
}

/// Levenberg-Marquardt minimiser of `Σ r(p)²`.
///
/// # Example
///
/// ```
/// use scenario_core::math::solvers::LevenbergMarquardtSolver;
///
/// // exponential decay y = A·e^{-k·t}
/// let t: [f64; 5] = [0.0, 1.0, 2.0, 3.0, 4.0];
/// let y: Vec<f64> = t.iter().map(|t| 2.0 * (-0.3 * t).exp()).collect();
///
/// let solver = LevenbergMarquardtSolver::with_defaults();
/// let fit = solver
///     .solve(
///         |p: &[f64]| t.iter().zip(&y).map(|(t, y)| p[0] * (-p[1] * t).exp() - y).collect(),
///         vec![1.0, 0.1],
///     )
///     .unwrap();
/// assert!((fit.params[0] - 2.0).abs() < 1e-6);
/// assert!((fit.params[1] - 0.3).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct LevenbergMarquardtSolver {
    config: LMConfig,
}

impl LevenbergMarquardtSolver {
    /// Solver with `config`.
    pub fn new(config: LMConfig) -> Self {
        Self { config }
    }

    /// Solver with [`LMConfig::default`].
    pub fn with_defaults() -> Self {
        Self::new(LMConfig::default())
    }

    /// Configuration in use.
    pub fn config(&self) -> &LMConfig {
        &self.config
    }

    /// Unconstrained fit from `initial`.
    ///
    /// # Errors
    ///
    /// `NumericalInstability` for empty parameter or residual vectors, or a
    /// non-finite objective at the starting point.
    pub fn solve<F>(&self, residuals: F, initial: Vec<f64>) -> Result<LMResult, SolverError>
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        self.solve_bounded(residuals, initial, &[])
    }

    /// Fit with `bounds[i] = (lower, upper)` on parameter `i`.
    ///
    /// An empty `bounds` slice means unconstrained. The starting point is
    /// projected onto the box first.
    pub fn solve_bounded<F>(
        &self,
        residuals: F,
        initial: Vec<f64>,
        bounds: &[(f64, f64)],
    ) -> Result<LMResult, SolverError>
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        let n = initial.len();
        if n == 0 {
            return Err(SolverError::NumericalInstability("empty parameter vector".into()));
        }
        if !bounds.is_empty() && bounds.len() != n {
            return Err(SolverError::NumericalInstability(format!(
                "{} bounds for {} parameters",
                bounds.len(),
                n
            )));
        }
        let project = |p: &mut [f64]| {
            for (x, (lo, hi)) in p.iter_mut().zip(bounds) {
                *x = x.clamp(*lo, *hi);
            }
        };

        let mut params = initial;
        project(&mut params);
        let mut r = residuals(&params);
        if r.is_empty() {
            return Err(SolverError::NumericalInstability("empty residual vector".into()));
        }
        let mut ss = sum_of_squares(&r);
        if !ss.is_finite() {
            return Err(SolverError::NumericalInstability(
                "objective not finite at the starting point".into(),
            ));
        }

        let mut lambda = self.config.initial_lambda;
        for iteration in 0..self.config.max_iterations {
            if ss.sqrt() < self.config.tolerance {
                return Ok(self.finish(params, ss, iteration, true));
            }

            let jacobian = forward_jacobian(&residuals, &params, &r);
            let (jtj, jtr) = normal_equations(&jacobian, &r, n);

            let mut accepted = false;
            while lambda < self.config.max_lambda {
                let mut damped = jtj.clone();
                for i in 0..n {
                    // Marquardt scaling keeps the step invariant to parameter units
                    damped[i * n + i] += lambda * jtj[i * n + i].max(1e-12);
                }
                let Some(delta) = solve_spd(&damped, &jtr, n) else {
                    lambda *= self.config.lambda_up;
                    continue;
                };

                let mut trial: Vec<f64> = params.iter().zip(&delta).map(|(p, d)| p + d).collect();
                project(&mut trial);
                let step: f64 = trial
                    .iter()
                    .zip(&params)
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum::<f64>()
                    .sqrt();
                let scale = params.iter().map(|p| p * p).sum::<f64>().sqrt().max(1.0);
                if step / scale < self.config.param_tolerance {
                    return Ok(self.finish(params, ss, iteration, true));
                }

                let trial_r = residuals(&trial);
                let trial_ss = sum_of_squares(&trial_r);
                if trial_ss.is_finite() && trial_ss < ss {
                    params = trial;
                    r = trial_r;
                    ss = trial_ss;
                    lambda = (lambda * self.config.lambda_down).max(self.config.min_lambda);
                    accepted = true;
                    break;
                }
                lambda *= self.config.lambda_up;
            }
            if !accepted {
                // no descent direction left at any damping
                return Ok(self.finish(params, ss, iteration, true));
            }
        }

        Ok(self.finish(params, ss, self.config.max_iterations, false))
    }

    fn finish(&self, params: Vec<f64>, residual_ss: f64, iterations: usize, converged: bool) -> LMResult {
        LMResult {
            params,
            residual_ss,
            iterations,
            converged,
        }
    }
}

#[inline]
fn sum_of_squares(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum()
}

/// Row-major `[residual × parameter]` forward differences.
fn forward_jacobian<F>(residuals: &F, params: &[f64], r0: &[f64]) -> Vec<f64>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let n = params.len();
    let m = r0.len();
    let mut jacobian = vec![0.0; m * n];
    let mut bumped = params.to_vec();
    for j in 0..n {
        let h = 1e-7 * params[j].abs().max(1e-3);
        bumped[j] = params[j] + h;
        let r = residuals(&bumped);
        bumped[j] = params[j];
        for i in 0..m {
            jacobian[i * n + j] = (r[i] - r0[i]) / h;
        }
    }
    jacobian
}

/// `(JᵀJ, -Jᵀr)`, both row-major.
fn normal_equations(jacobian: &[f64], r: &[f64], n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut jtj = vec![0.0; n * n];
    let mut jtr = vec![0.0; n];
    for (row, ri) in jacobian.chunks(n).zip(r) {
        for a in 0..n {
            jtr[a] -= row[a] * ri;
            for b in 0..=a {
                jtj[a * n + b] += row[a] * row[b];
            }
        }
    }
    for a in 0..n {
        for b in 0..a {
            jtj[b * n + a] = jtj[a * n + b];
        }
    }
    (jtj, jtr)
}

/// Cholesky solve of a symmetric positive definite system.
fn solve_spd(a: &[f64], b: &[f64], n: usize) -> Option<Vec<f64>> {
    let mut l = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..=i {
            let s: f64 = (0..j).map(|k| l[i * n + k] * l[j * n + k]).sum();
            if i == j {
                let pivot = a[i * n + i] - s;
                if !(pivot > 0.0 && pivot.is_finite()) {
                    return None;
                }
                l[i * n + i] = pivot.sqrt();
            } else {
                l[i * n + j] = (a[i * n + j] - s) / l[j * n + j];
            }
        }
    }
    let mut y = vec![0.0; n];
    for i in 0..n {
        let s: f64 = (0..i).map(|k| l[i * n + k] * y[k]).sum();
        y[i] = (b[i] - s) / l[i * n + i];
    }
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let s: f64 = ((i + 1)..n).map(|k| l[k * n + i] * x[k]).sum();
        x[i] = (y[i] - s) / l[i * n + i];
    }
    Some(x)
}
