//! Hull-White one-factor short-rate simulation.
//!
//! The short rate follows
//! ```text
//! dr(t) = [θ(t) - a·r(t)] dt + σ dW(t)
//! ```
//! with θ fitted to the calibrated forward curve. Paths are advanced with the
//! exact Gaussian transition over one step:
//! ```text
//! r(t+Δ) = r(t)·e^{-aΔ} + α(t+Δ) - α(t)·e^{-aΔ} + sqrt(L(Δ))·z
//! α(t)   = f(0,t) + σ²/2·K(t)²
//! K(t)   = (1 - e^{-at}) / a
//! L(t)   = σ²/(2a)·(1 - e^{-2at})
//! ```
//! and discounted with the per-period rate `R_k = -ln P(t_k, t_{k+1})` read from
//! the closed-form bond price.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use scenario_core::rng::ScenarioRng;
use scenario_core::types::{PathMatrix, ScenarioError};

use crate::calibration::CalibratedCurve;

/// Below this mean reversion `K` and `L` use their `a → 0` limits.
const SMALL_MEAN_REVERSION: f64 = 1e-10;

/// Hull-White parameters.
///
/// # Example
///
/// ```
/// use scenario_models::models::rates::HullWhiteParams;
///
/// let params = HullWhiteParams::new(0.1, 0.01).unwrap();
/// assert!((params.k(1.0) - (1.0 - (-0.1f64).exp()) / 0.1).abs() < 1e-15);
///
/// assert!(HullWhiteParams::new(-0.1, 0.01).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HullWhiteParams {
    /// Mean reversion speed `a`
    pub mean_reversion: f64,
    /// Short-rate volatility `σ`
    pub volatility: f64,
}

impl HullWhiteParams {
    /// Validated parameters (`a > 0`, `σ > 0`).
    pub fn new(mean_reversion: f64, volatility: f64) -> Result<Self, ScenarioError> {
        let params = Self {
            mean_reversion,
            volatility,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check both parameters are finite and positive.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !self.mean_reversion.is_finite() || self.mean_reversion <= 0.0 {
            return Err(ScenarioError::configuration(
                "hull_white.mean_reversion",
                format!("must be positive, got {}", self.mean_reversion),
            ));
        }
        if !self.volatility.is_finite() || self.volatility <= 0.0 {
            return Err(ScenarioError::configuration(
                "hull_white.volatility",
                format!("must be positive, got {}", self.volatility),
            ));
        }
        Ok(())
    }

    /// `K(t) = (1 - e^{-at}) / a`, equal to `t` when `a = 0`.
    #[inline]
    pub fn k(&self, t: f64) -> f64 {
        let a = self.mean_reversion;
        if a.abs() < SMALL_MEAN_REVERSION {
            t
        } else {
            (1.0 - (-a * t).exp()) / a
        }
    }

    /// `L(t) = σ²/(2a)·(1 - e^{-2at})`, the variance of `r` accumulated over `t`.
    #[inline]
    pub fn l(&self, t: f64) -> f64 {
        let a = self.mean_reversion;
        let s2 = self.volatility * self.volatility;
        if a.abs() < SMALL_MEAN_REVERSION {
            s2 * t
        } else {
            s2 / (2.0 * a) * (1.0 - (-2.0 * a * t).exp())
        }
    }
}

/// Annually compounded limits on the per-period discount rate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateBounds {
    /// Upper limit, e.g. `0.10` for 10%
    pub upper: f64,
    /// Lower limit, e.g. `-0.05`
    pub lower: f64,
}

impl Default for RateBounds {
    fn default() -> Self {
        Self {
            upper: 0.10,
            lower: -0.05,
        }
    }
}

impl RateBounds {
    /// Continuously compounded `(lower, upper)`.
    pub fn continuous(&self) -> (f64, f64) {
        ((1.0 + self.lower).ln(), (1.0 + self.upper).ln())
    }

    /// Require `-1 < lower < upper`.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !(self.lower > -1.0 && self.lower < self.upper && self.upper.is_finite()) {
            return Err(ScenarioError::configuration(
                "rate_bounds",
                format!(
                    "need -1 < lower < upper, got lower {} upper {}",
                    self.lower, self.upper
                ),
            ));
        }
        Ok(())
    }
}

/// Limits of the explosive-path filter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathFilterPolicy {
    /// Bounds a path's discount rates must respect at every step
    pub bounds: RateBounds,
    /// Cumulative discarded share above which replacement is abandoned
    pub max_discard_fraction: f64,
    /// Replacement rounds after the initial generation
    pub max_replacement_attempts: usize,
}

impl Default for PathFilterPolicy {
    fn default() -> Self {
        Self {
            bounds: RateBounds::default(),
            max_discard_fraction: 0.5,
            max_replacement_attempts: 10,
        }
    }
}

impl PathFilterPolicy {
    /// Validate bounds and the discard ceiling.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.bounds.validate()?;
        if !(0.0..=1.0).contains(&self.max_discard_fraction) {
            return Err(ScenarioError::configuration(
                "max_discard_fraction",
                format!("must lie in [0, 1], got {}", self.max_discard_fraction),
            ));
        }
        Ok(())
    }
}

/// Terminal state of the filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOutcome {
    /// The requested number of bounded paths was delivered
    Accepted,
    /// Replacement rounds ran out before the target was met
    AttemptsExhausted,
    /// Too large a share of generated paths was explosive
    DiscardCeilingExceeded,
}

/// What the explosive-path filter did during one simulation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathFilterReport {
    /// Scenarios asked for
    pub requested: usize,
    /// Scenarios returned
    pub delivered: usize,
    /// Paths generated and thrown away
    pub discarded: usize,
    /// Generation rounds, including the first
    pub attempts: usize,
    /// Terminal state
    pub outcome: FilterOutcome,
}

impl PathFilterReport {
    /// Scenarios missing from the result.
    pub fn shortfall(&self) -> usize {
        self.requested.saturating_sub(self.delivered)
    }

    /// True when every requested scenario was delivered.
    pub fn is_complete(&self) -> bool {
        self.outcome == FilterOutcome::Accepted
    }
}

/// Output of [`ShortRateSimulator::simulate`]. All matrices are
/// `[delivered × steps]`.
#[derive(Clone, Debug)]
pub struct ShortRateScenarios {
    /// Step length in years
    pub dt: f64,
    /// `r(t_k)` for `k = 0..steps`, annualised
    pub short_rates: PathMatrix,
    /// `R_k = -ln P(t_k, t_{k+1})`, per period
    pub discount_rates: PathMatrix,
    /// `exp(-Σ_{j≤k} R_j)`, the discount from `t_{k+1}` to today
    pub deflators: PathMatrix,
    /// Standardised shocks recovered from the realised transitions
    pub residuals: PathMatrix,
    /// Explosive-path filter summary
    pub report: PathFilterReport,
}

impl ShortRateScenarios {
    /// Number of delivered scenarios.
    pub fn num_scenarios(&self) -> usize {
        self.short_rates.rows()
    }

    /// Number of steps.
    pub fn num_steps(&self) -> usize {
        self.short_rates.cols()
    }
}

/// One generation round before filtering.
struct PathBatch {
    /// `[n × (steps + 1)]`, includes the terminal state
    states: PathMatrix,
    discount_rates: PathMatrix,
}

/// States of the bounded replacement loop.
enum FilterState {
    Generate { count: usize },
    Filter(PathBatch),
    Replace { missing: usize },
    Accept,
    Fail(FilterOutcome),
}

/// Monte Carlo simulator for Hull-White short rates on a calibrated curve.
#[derive(Clone, Debug)]
pub struct ShortRateSimulator {
    params: HullWhiteParams,
    curve: CalibratedCurve,
    policy: PathFilterPolicy,
}

impl ShortRateSimulator {
    /// Simulator with the default filter policy.
    pub fn new(params: HullWhiteParams, curve: &CalibratedCurve) -> Result<Self, ScenarioError> {
        params.validate()?;
        Ok(Self {
            params,
            curve: curve.clone(),
            policy: PathFilterPolicy::default(),
        })
    }

    /// Replace the explosive-path filter policy.
    pub fn with_policy(mut self, policy: PathFilterPolicy) -> Result<Self, ScenarioError> {
        policy.validate()?;
        self.policy = policy;
        Ok(self)
    }

    /// Model parameters.
    pub fn params(&self) -> &HullWhiteParams {
        &self.params
    }

    /// Curve the simulator is fitted to.
    pub fn curve(&self) -> &CalibratedCurve {
        &self.curve
    }

    /// Filter policy in force.
    pub fn policy(&self) -> &PathFilterPolicy {
        &self.policy
    }

    /// `r(0) = f(0, 0)`.
    pub fn initial_rate(&self) -> f64 {
        self.curve.forward_rates()[0]
    }

    /// Zero-coupon price `P(t, T)` given `r(t) = r`:
    /// ```text
    /// P(t,T) = A(t,T)·exp(-B(t,T)·r),  B = K(T - t)
    /// ln A   = ln(P(0,T)/P(0,t)) + B·f(0,t) - σ²/(4a)·(1 - e^{-2at})·B²
    /// ```
    ///
    /// # Errors
    ///
    /// `Configuration` when `t > T` or either time lies beyond the curve.
    pub fn bond_price(&self, t: f64, maturity: f64, r: f64) -> Result<f64, ScenarioError> {
        if maturity < t {
            return Err(ScenarioError::configuration(
                "maturity",
                format!("maturity {} precedes valuation time {}", maturity, t),
            ));
        }
        let b = self.params.k(maturity - t);
        let p_t = self.curve.bond_price_at(t)?;
        let p_big_t = self.curve.bond_price_at(maturity)?;
        let f_t = self.curve.forward_rate_at(t)?;
        let ln_a = (p_big_t / p_t).ln() + b * f_t - 0.5 * self.params.l(t) * b * b;
        Ok((ln_a - b * r).exp())
    }

    /// Simulate `num_scenarios` paths of `num_steps` steps.
    ///
    /// With `antithetic`, scenario `i` and `i + n/2` are driven by opposite
    /// shocks and `num_scenarios` must be even. Paths whose discount rate
    /// leaves [`RateBounds`] are replaced within the policy limits; any
    /// shortfall is reported, never padded.
    ///
    /// # Errors
    ///
    /// * `Configuration` for zero scenarios/steps or an odd antithetic count
    /// * `CurveTooShort` when the curve has fewer than `num_steps + 1` points
    pub fn simulate(
        &self,
        num_scenarios: usize,
        num_steps: usize,
        antithetic: bool,
        rng: &mut ScenarioRng,
    ) -> Result<ShortRateScenarios, ScenarioError> {
        if num_scenarios == 0 {
            return Err(ScenarioError::configuration(
                "num_scenarios",
                "must be positive, got 0",
            ));
        }
        if antithetic && num_scenarios % 2 != 0 {
            return Err(ScenarioError::configuration(
                "num_scenarios",
                format!("must be even for antithetic sampling, got {}", num_scenarios),
            ));
        }
        if num_steps == 0 {
            return Err(ScenarioError::configuration("num_steps", "must be positive, got 0"));
        }
        if num_steps + 1 > self.curve.len() {
            return Err(ScenarioError::CurveTooShort {
                requested: num_steps + 1,
                available: self.curve.len(),
            });
        }

        let (lo, hi) = self.policy.bounds.continuous();
        let dt = self.curve.dt();
        let mut states = PathMatrix::zeros(0, num_steps + 1);
        let mut discount_rates = PathMatrix::zeros(0, num_steps);
        let mut generated = 0usize;
        let mut discarded = 0usize;
        let mut attempts = 0usize;

        let mut state = FilterState::Generate {
            count: num_scenarios,
        };
        let outcome = loop {
            state = match state {
                FilterState::Generate { count } => {
                    attempts += 1;
                    generated += count;
                    FilterState::Filter(self.generate_batch(count, num_steps, antithetic, rng))
                }
                FilterState::Filter(batch) => {
                    let keep: Vec<usize> = (0..batch.discount_rates.rows())
                        .filter(|&i| {
                            batch
                                .discount_rates
                                .row(i)
                                .iter()
                                .all(|&rate| (lo..=hi).contains(&(rate / dt)))
                        })
                        .collect();
                    let dropped = batch.discount_rates.rows() - keep.len();
                    discarded += dropped;
                    if dropped > 0 {
                        debug!(attempt = attempts, dropped, "filtered explosive rate paths");
                    }
                    states.append_rows(&batch.states.select_rows(&keep))?;
                    discount_rates.append_rows(&batch.discount_rates.select_rows(&keep))?;

                    if states.rows() >= num_scenarios {
                        FilterState::Accept
                    } else if discarded as f64 / generated as f64 > self.policy.max_discard_fraction
                    {
                        FilterState::Fail(FilterOutcome::DiscardCeilingExceeded)
                    } else {
                        FilterState::Replace {
                            missing: num_scenarios - states.rows(),
                        }
                    }
                }
                FilterState::Replace { missing } => {
                    if attempts > self.policy.max_replacement_attempts {
                        FilterState::Fail(FilterOutcome::AttemptsExhausted)
                    } else {
                        let count = if antithetic { missing + missing % 2 } else { missing };
                        FilterState::Generate { count }
                    }
                }
                FilterState::Accept => break FilterOutcome::Accepted,
                FilterState::Fail(outcome) => break outcome,
            };
        };

        states.truncate_rows(num_scenarios);
        discount_rates.truncate_rows(num_scenarios);

        let report = PathFilterReport {
            requested: num_scenarios,
            delivered: states.rows(),
            discarded,
            attempts,
            outcome,
        };
        if report.outcome != FilterOutcome::Accepted {
            warn!(
                requested = report.requested,
                delivered = report.delivered,
                discarded = report.discarded,
                outcome = ?report.outcome,
                "explosive-path replacement fell short"
            );
        }

        let residuals = self.extract_residuals(&states);
        let deflators = deflators_from_discount_rates(&discount_rates);
        let short_rates = drop_terminal_state(&states);

        Ok(ShortRateScenarios {
            dt,
            short_rates,
            discount_rates,
            deflators,
            residuals,
            report,
        })
    }

    /// Deterministic part of each transition, `α(t_{k+1}) - α(t_k)·e^{-aΔ}`.
    fn transition_drift(&self, num_steps: usize) -> Vec<f64> {
        let p = &self.params;
        let dt = self.curve.dt();
        let decay = (-p.mean_reversion * dt).exp();
        let f = self.curve.forward_rates();
        let half_s2 = 0.5 * p.volatility * p.volatility;
        (0..num_steps)
            .map(|k| {
                let (t0, t1) = (k as f64 * dt, (k + 1) as f64 * dt);
                let k0 = p.k(t0);
                let k1 = p.k(t1);
                f[k + 1] - f[k] * decay + half_s2 * (k1 * k1 - decay * k0 * k0)
            })
            .collect()
    }

    fn generate_batch(
        &self,
        count: usize,
        num_steps: usize,
        antithetic: bool,
        rng: &mut ScenarioRng,
    ) -> PathBatch {
        let p = &self.params;
        let dt = self.curve.dt();
        let decay = (-p.mean_reversion * dt).exp();
        let step_sd = p.l(dt).sqrt();
        let k_dt = p.k(dt);
        let drift = self.transition_drift(num_steps);
        let f = self.curve.forward_rates();
        let bonds = self.curve.bond_prices();

        let shocks = draw_shocks(count, num_steps, antithetic, rng);

        // Deterministic part of R_k
        let base_rate: Vec<f64> = (0..num_steps)
            .map(|k| {
                -(bonds[k + 1] / bonds[k]).ln() + 0.5 * k_dt * k_dt * p.l(k as f64 * dt)
                    - k_dt * f[k]
            })
            .collect();

        let mut states = PathMatrix::zeros(count, num_steps + 1);
        let mut discount_rates = PathMatrix::zeros(count, num_steps);
        for i in 0..count {
            let z = shocks.row(i);
            let path = states.row_mut(i);
            path[0] = f[0];
            for k in 0..num_steps {
                path[k + 1] = path[k] * decay + drift[k] + step_sd * z[k];
            }
            let rates = discount_rates.row_mut(i);
            for k in 0..num_steps {
                rates[k] = base_rate[k] + k_dt * states.get(i, k);
            }
        }
        PathBatch {
            states,
            discount_rates,
        }
    }

    /// `(r_{k+1} - r_k·e^{-aΔ} - drift_k) / sqrt(L(Δ))`.
    fn extract_residuals(&self, states: &PathMatrix) -> PathMatrix {
        let num_steps = states.cols().saturating_sub(1);
        let decay = (-self.params.mean_reversion * self.curve.dt()).exp();
        let step_sd = self.params.l(self.curve.dt()).sqrt();
        let drift = self.transition_drift(num_steps);

        let mut residuals = PathMatrix::zeros(states.rows(), num_steps);
        for i in 0..states.rows() {
            let path = states.row(i);
            let out = residuals.row_mut(i);
            for k in 0..num_steps {
                out[k] = (path[k + 1] - path[k] * decay - drift[k]) / step_sd;
            }
        }
        residuals
    }
}

/// `[count × steps]` standard normals; with `antithetic` (even `count`) rows
/// `i` and `i + count/2` are exact negations.
fn draw_shocks(count: usize, num_steps: usize, antithetic: bool, rng: &mut ScenarioRng) -> PathMatrix {
    let mut shocks = PathMatrix::zeros(count, num_steps);
    if antithetic {
        rng.fill_antithetic(shocks.as_mut_slice());
    } else {
        rng.fill_normal(shocks.as_mut_slice());
    }
    shocks
}

/// Cumulative discounting `exp(-Σ R)` along each scenario.
pub fn deflators_from_discount_rates(discount_rates: &PathMatrix) -> PathMatrix {
    let mut out = PathMatrix::zeros(discount_rates.rows(), discount_rates.cols());
    for i in 0..discount_rates.rows() {
        let mut acc = 0.0;
        let src = discount_rates.row(i);
        let dst = out.row_mut(i);
        for (d, r) in dst.iter_mut().zip(src) {
            acc += r;
            *d = (-acc).exp();
        }
    }
    out
}

fn drop_terminal_state(states: &PathMatrix) -> PathMatrix {
    let steps = states.cols().saturating_sub(1);
    let mut out = PathMatrix::zeros(states.rows(), steps);
    for i in 0..states.rows() {
        out.row_mut(i).copy_from_slice(&states.row(i)[..steps]);
    }
    out
}
