//! Real-estate price and rental returns.
//!
//! ## Model
//!
//! An auxiliary mean-reverting rate `r2` is anchored to the forward curve:
//! ```text
//! r2_{k+1} = r2_k·e^{-aΔ} + f_k·(1 - e^{-aΔ}) + σ·sqrt(K₂(Δ))·ε^rent_k,   r2_0 = f_0
//! ```
//! and drives the price return
//! ```text
//! price_k  = f_k·Δ + (r2_k - f_k)·K(Δ) + η·ε^price_k
//! η        = σ/a · sqrt(Δ - 2K(Δ) + K₂(Δ))
//! K(Δ)     = (1 - e^{-aΔ}) / a,   K₂(Δ) = (1 - e^{-2aΔ}) / (2a)
//! ```
//! Rental income is deterministic and grows linearly with elapsed steps:
//! ```text
//! rental_k = ln(1 + y)·Δ + k·i·Δ
//! ```
//!
//! Commercial and residential properties are [`RealEstateParams`] presets of
//! the same model.

use serde::{Deserialize, Serialize};
use tracing::debug;

use scenario_core::rng::ScenarioRng;
use scenario_core::types::{PathMatrix, ScenarioError};

/// Residential location bundle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// City centre
    Urban,
    /// Commuter belt
    Suburban,
    /// Countryside
    Rural,
}

/// Vacancy and expense terms of a commercial property.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommercialTerms {
    /// Yield before vacancy and expenses
    pub gross_yield: f64,
    /// Fraction of time unlet
    pub vacancy_rate: f64,
    /// Operating expenses as a fraction of effective rent
    pub operating_expense_ratio: f64,
}

/// Net operating income breakdown.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetOperatingIncome {
    /// `value · gross_yield`
    pub gross_income: f64,
    /// Expenses on the effective (post-vacancy) income
    pub operating_expenses: f64,
    /// Effective income less expenses
    pub noi: f64,
}

/// Real-estate model parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RealEstateParams {
    /// Mean reversion of the auxiliary rate
    pub mean_reversion: f64,
    /// Price volatility
    pub volatility: f64,
    /// Net rental yield, annual-compounded
    pub rental_yield: f64,
    /// Annual rent indexation added per elapsed step
    pub inflation_adjustment: f64,
    /// Present for commercial presets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commercial: Option<CommercialTerms>,
}

impl Default for RealEstateParams {
    fn default() -> Self {
        Self {
            mean_reversion: 0.15,
            volatility: 0.12,
            rental_yield: 0.03,
            inflation_adjustment: 0.02,
            commercial: None,
        }
    }
}

impl RealEstateParams {
    /// Validated generic parameters.
    pub fn new(
        mean_reversion: f64,
        volatility: f64,
        rental_yield: f64,
        inflation_adjustment: f64,
    ) -> Result<Self, ScenarioError> {
        let params = Self {
            mean_reversion,
            volatility,
            rental_yield,
            inflation_adjustment,
            commercial: None,
        };
        params.validate()?;
        Ok(params)
    }

    /// Commercial preset; the model runs on the net yield
    /// `gross · (1 - vacancy) · (1 - opex)`.
    pub fn commercial(
        mean_reversion: f64,
        volatility: f64,
        gross_yield: f64,
        vacancy_rate: f64,
        operating_expense_ratio: f64,
        inflation_adjustment: f64,
    ) -> Result<Self, ScenarioError> {
        for (field, v) in [
            ("real_estate.vacancy_rate", vacancy_rate),
            ("real_estate.operating_expense_ratio", operating_expense_ratio),
        ] {
            if !(0.0..1.0).contains(&v) {
                return Err(ScenarioError::configuration(
                    field,
                    format!("must lie in [0, 1), got {}", v),
                ));
            }
        }
        let net = gross_yield * (1.0 - vacancy_rate) * (1.0 - operating_expense_ratio);
        let params = Self {
            mean_reversion,
            volatility,
            rental_yield: net,
            inflation_adjustment,
            commercial: Some(CommercialTerms {
                gross_yield,
                vacancy_rate,
                operating_expense_ratio,
            }),
        };
        params.validate()?;
        Ok(params)
    }

    /// Residential bundle for `location`, with 2% rent indexation.
    pub fn residential(location: Location) -> Self {
        let (mean_reversion, volatility, rental_yield) = match location {
            Location::Urban => (0.15, 0.12, 0.035),
            Location::Suburban => (0.12, 0.10, 0.040),
            Location::Rural => (0.10, 0.08, 0.045),
        };
        Self {
            mean_reversion,
            volatility,
            rental_yield,
            inflation_adjustment: 0.02,
            commercial: None,
        }
    }

    /// `a > 0`, `σ > 0`, yield `≥ 0`, finite indexation.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !(self.mean_reversion.is_finite() && self.mean_reversion > 0.0) {
            return Err(ScenarioError::configuration(
                "real_estate.mean_reversion",
                format!("must be positive, got {}", self.mean_reversion),
            ));
        }
        if !(self.volatility.is_finite() && self.volatility > 0.0) {
            return Err(ScenarioError::configuration(
                "real_estate.volatility",
                format!("must be positive, got {}", self.volatility),
            ));
        }
        if !(self.rental_yield.is_finite() && self.rental_yield >= 0.0) {
            return Err(ScenarioError::configuration(
                "real_estate.rental_yield",
                format!("must be non-negative, got {}", self.rental_yield),
            ));
        }
        if !self.inflation_adjustment.is_finite() {
            return Err(ScenarioError::configuration(
                "real_estate.inflation_adjustment",
                "must be finite",
            ));
        }
        Ok(())
    }

    /// Income breakdown for a commercial property worth `value`.
    /// `None` for non-commercial parameters.
    pub fn net_operating_income(&self, value: f64) -> Option<NetOperatingIncome> {
        let terms = self.commercial?;
        let gross_income = value * terms.gross_yield;
        let effective = gross_income * (1.0 - terms.vacancy_rate);
        let operating_expenses = effective * terms.operating_expense_ratio;
        Some(NetOperatingIncome {
            gross_income,
            operating_expenses,
            noi: effective - operating_expenses,
        })
    }
}

/// `noi / value`.
pub fn cap_rate(noi: f64, value: f64) -> f64 {
    noi / value
}

/// `value / annual_rent`.
pub fn price_to_rent(value: f64, annual_rent: f64) -> f64 {
    value / annual_rent
}

/// Real-estate return paths, `[scenario × step]`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RealEstateReturns {
    /// Capital-gain log return
    pub price: PathMatrix,
    /// Rental income log return
    pub rental: PathMatrix,
    /// `price + rental`
    pub total: PathMatrix,
    /// Auxiliary rate `r2`
    pub aux_rate: PathMatrix,
}

/// Step coefficients for a given `(a, σ, Δ)`.
#[derive(Clone, Copy, Debug)]
struct Coefficients {
    decay: f64,
    k: f64,
    aux_vol: f64,
    eta: f64,
}

impl Coefficients {
    fn new(params: &RealEstateParams, dt: f64) -> Self {
        let a = params.mean_reversion;
        let sigma = params.volatility;
        let decay = (-a * dt).exp();
        let k = (1.0 - decay) / a;
        let k2 = (1.0 - (-2.0 * a * dt).exp()) / (2.0 * a);
        // rounding can push the bracket marginally negative for tiny aΔ
        let eta = sigma / a * (dt - 2.0 * k + k2).max(0.0).sqrt();
        Self {
            decay,
            k,
            aux_vol: sigma * k2.sqrt(),
            eta,
        }
    }
}

/// Real-estate return model.
///
/// # Examples
///
/// ```
/// use scenario_core::types::PathMatrix;
/// use scenario_models::models::real_estate::{RealEstateParams, RealEstateReturnModel};
///
/// let model = RealEstateReturnModel::new(RealEstateParams::default(), 1.0).unwrap();
/// let forward = vec![0.03; 5];
/// let zero = PathMatrix::zeros(2, 5);
///
/// let out = model.generate_returns(&forward, &zero, &zero).unwrap();
/// assert!((out.price.get(0, 0) - 0.03).abs() < 1e-12);
/// assert!(out.rental.get(0, 4) > out.rental.get(0, 0));
/// ```
#[derive(Clone, Debug)]
pub struct RealEstateReturnModel {
    params: RealEstateParams,
    dt: f64,
}

impl RealEstateReturnModel {
    /// Model on step `dt`.
    pub fn new(params: RealEstateParams, dt: f64) -> Result<Self, ScenarioError> {
        params.validate()?;
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ScenarioError::configuration(
                "timestep",
                format!("must be positive, got {}", dt),
            ));
        }
        Ok(Self { params, dt })
    }

    /// Parameters.
    pub fn params(&self) -> &RealEstateParams {
        &self.params
    }

    /// Returns for shocks of shape `[scenario × step]`.
    ///
    /// `forward_curve` must hold at least one value per step; the auxiliary
    /// rate starts at its first value.
    ///
    /// # Errors
    ///
    /// * `Configuration` when the shocks have no steps
    /// * `DimensionMismatch` when the two shock matrices differ in shape
    /// * `CurveTooShort` when `forward_curve` is shorter than the step count
    pub fn generate_returns(
        &self,
        forward_curve: &[f64],
        price_shocks: &PathMatrix,
        rental_shocks: &PathMatrix,
    ) -> Result<RealEstateReturns, ScenarioError> {
        let (rows, steps) = price_shocks.shape();
        if steps == 0 {
            return Err(ScenarioError::configuration("num_steps", "must be positive, got 0"));
        }
        if rental_shocks.shape() != (rows, steps) {
            return Err(ScenarioError::dimension_mismatch(
                "real-estate rental shocks",
                format!("{}x{}", rows, steps),
                format!("{}x{}", rental_shocks.rows(), rental_shocks.cols()),
            ));
        }
        if forward_curve.len() < steps {
            return Err(ScenarioError::CurveTooShort {
                requested: steps,
                available: forward_curve.len(),
            });
        }

        let c = Coefficients::new(&self.params, self.dt);
        let initial_rate = forward_curve[0];
        let mut aux_rate = PathMatrix::zeros(rows, steps);
        let mut price = PathMatrix::zeros(rows, steps);
        for s in 0..rows {
            let z_rent = rental_shocks.row(s);
            let z_price = price_shocks.row(s);
            let mut r2 = initial_rate;
            for k in 0..steps {
                let f = forward_curve[k];
                aux_rate.set(s, k, r2);
                price.set(s, k, f * self.dt + (r2 - f) * c.k + c.eta * z_price[k]);
                r2 = r2 * c.decay + f * (1.0 - c.decay) + c.aux_vol * z_rent[k];
            }
        }

        let rental = self.rental_returns(rows, steps);
        let mut total = price.clone();
        for (t, r) in total.as_mut_slice().iter_mut().zip(rental.as_slice()) {
            *t += r;
        }

        debug!(scenarios = rows, steps, "generated real-estate returns");
        Ok(RealEstateReturns {
            price,
            rental,
            total,
            aux_rate,
        })
    }

    /// [`generate_returns`](Self::generate_returns) with independent draws for
    /// both shock factors.
    pub fn generate_independent(
        &self,
        forward_curve: &[f64],
        num_scenarios: usize,
        rng: &mut ScenarioRng,
    ) -> Result<RealEstateReturns, ScenarioError> {
        let steps = forward_curve.len();
        let mut price_shocks = PathMatrix::zeros(num_scenarios, steps);
        let mut rental_shocks = PathMatrix::zeros(num_scenarios, steps);
        rng.fill_normal(price_shocks.as_mut_slice());
        rng.fill_normal(rental_shocks.as_mut_slice());
        self.generate_returns(forward_curve, &price_shocks, &rental_shocks)
    }

    /// Deterministic rental income, identical across scenarios.
    pub fn rental_returns(&self, num_scenarios: usize, steps: usize) -> PathMatrix {
        let base = (1.0 + self.params.rental_yield).ln() * self.dt;
        let step = self.params.inflation_adjustment * self.dt;
        let row: Vec<f64> = (0..steps).map(|k| base + k as f64 * step).collect();
        let mut out = PathMatrix::zeros(num_scenarios, steps);
        for s in 0..num_scenarios {
            out.row_mut(s).copy_from_slice(&row);
        }
        out
    }
}
