//! Observed spot-rate curves and synthetic curve builders.
//!
//! Rates are annually compounded: a spot rate `r` at maturity `m` years
//! corresponds to the discount factor `(1 + r)^-m`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::math::interpolators::{CubicSplineInterpolator, Interpolator};
use crate::types::ScenarioError;

/// Tolerance when testing whether a maturity lies on the integer-year grid.
const GRID_TOLERANCE: f64 = 1e-9;

/// Ordered `(maturity, spot rate)` pairs.
///
/// Invariants: at least 3 points, maturities positive and strictly
/// increasing, all values finite.
///
/// # Examples
///
/// ```
/// use scenario_core::market_data::YieldCurve;
///
/// let curve = YieldCurve::new(vec![1.0, 2.0, 5.0], vec![0.02, 0.025, 0.03]).unwrap();
/// assert_eq!(curve.len(), 3);
/// assert!(!curve.is_annual_grid());
///
/// assert!(YieldCurve::new(vec![1.0, 1.0, 2.0], vec![0.02, 0.02, 0.02]).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawYieldCurve", into = "RawYieldCurve")]
pub struct YieldCurve {
    maturities: Vec<f64>,
    rates: Vec<f64>,
}

/// Serialised shape, validated on the way in.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct RawYieldCurve {
    maturities: Vec<f64>,
    rates: Vec<f64>,
}

impl TryFrom<RawYieldCurve> for YieldCurve {
    type Error = ScenarioError;

    fn try_from(raw: RawYieldCurve) -> Result<Self, Self::Error> {
        YieldCurve::new(raw.maturities, raw.rates)
    }
}

impl From<YieldCurve> for RawYieldCurve {
    fn from(curve: YieldCurve) -> Self {
        Self {
            maturities: curve.maturities,
            rates: curve.rates,
        }
    }
}

impl YieldCurve {
    /// Validate and wrap a curve.
    ///
    /// # Errors
    ///
    /// `ScenarioError::Configuration` on the `yield_curve` field.
    pub fn new(maturities: Vec<f64>, rates: Vec<f64>) -> Result<Self, ScenarioError> {
        let fail = |message: String| Err(ScenarioError::configuration("yield_curve", message));

        if maturities.len() != rates.len() {
            return fail(format!(
                "{} maturities but {} rates",
                maturities.len(),
                rates.len()
            ));
        }
        if maturities.len() < 3 {
            return fail(format!(
                "at least 3 points are required, got {}",
                maturities.len()
            ));
        }
        if let Some(i) = rates.iter().position(|r| !r.is_finite() || *r <= -1.0) {
            return fail(format!("rate at index {} is invalid: {}", i, rates[i]));
        }
        if let Some(i) = maturities.iter().position(|m| !m.is_finite() || *m <= 0.0) {
            return fail(format!(
                "maturity at index {} must be positive, got {}",
                i, maturities[i]
            ));
        }
        if let Some(i) = maturities.windows(2).position(|w| w[1] <= w[0]) {
            return fail(format!(
                "maturities must be strictly increasing: {} followed by {}",
                maturities[i],
                maturities[i + 1]
            ));
        }
        Ok(Self { maturities, rates })
    }

    /// Curve with one rate per integer year, maturities `1..=rates.len()`.
    pub fn from_annual_rates(rates: &[f64]) -> Result<Self, ScenarioError> {
        let maturities = (1..=rates.len()).map(|m| m as f64).collect();
        Self::new(maturities, rates.to_vec())
    }

    /// Maturities in years.
    pub fn maturities(&self) -> &[f64] {
        &self.maturities
    }

    /// Spot rates, annually compounded.
    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.maturities.len()
    }

    /// Never true for a validated curve.
    pub fn is_empty(&self) -> bool {
        self.maturities.is_empty()
    }

    /// Longest maturity.
    pub fn max_maturity(&self) -> f64 {
        self.maturities.last().copied().unwrap_or(0.0)
    }

    /// True when maturities are exactly `1, 2, ..., M`.
    pub fn is_annual_grid(&self) -> bool {
        self.maturities
            .iter()
            .enumerate()
            .all(|(i, m)| (m - (i + 1) as f64).abs() < GRID_TOLERANCE)
    }

    /// Discount factors `(1 + r)^-m` at the curve maturities.
    pub fn discount_factors(&self) -> Vec<f64> {
        self.maturities
            .iter()
            .zip(&self.rates)
            .map(|(m, r)| (1.0 + r).powf(-m))
            .collect()
    }

    /// Spot rate at `maturity`: cubic spline inside the quoted range, flat
    /// beyond either end.
    pub fn rate_at(&self, maturity: f64) -> Result<f64, ScenarioError> {
        let spline = CubicSplineInterpolator::new(&self.maturities, &self.rates)?;
        let (lo, hi) = spline.domain();
        Ok(spline.interpolate(maturity.clamp(lo, hi))?)
    }

    /// Resample onto maturities `1..=floor(max maturity)`.
    ///
    /// Curves already on that grid are returned unchanged.
    pub fn to_annual_grid(&self) -> Result<Self, ScenarioError> {
        if self.is_annual_grid() {
            return Ok(self.clone());
        }
        let last = (self.max_maturity() + GRID_TOLERANCE).floor() as usize;
        if last < 3 {
            return Err(ScenarioError::configuration(
                "yield_curve",
                format!(
                    "longest maturity {} gives fewer than 3 annual points",
                    self.max_maturity()
                ),
            ));
        }
        let spline = CubicSplineInterpolator::new(&self.maturities, &self.rates)?;
        let (lo, hi) = spline.domain();
        let rates = (1..=last)
            .map(|m| spline.interpolate((m as f64).clamp(lo, hi)))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_annual_rates(&rates)
    }
}

/// Currencies with a built-in synthetic curve.
///
/// # Examples
///
/// ```
/// use scenario_core::market_data::Currency;
///
/// let gbp: Currency = "gbp".parse().unwrap();
/// assert_eq!(gbp, Currency::GBP);
/// assert_eq!(gbp.to_string(), "GBP");
/// assert!("JPY".parse::<Currency>().is_err());
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Euro
    #[default]
    EUR,
    /// United States Dollar
    USD,
    /// British Pound Sterling
    GBP,
}

impl Currency {
    /// All supported currencies.
    pub const ALL: [Currency; 3] = [Currency::EUR, Currency::USD, Currency::GBP];

    /// ISO 4217 code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::EUR => "EUR",
            Currency::USD => "USD",
            Currency::GBP => "GBP",
        }
    }

    /// `(base, slope)` of the preset curve `base + slope·(1 - e^{-m/10})`.
    pub fn preset_parameters(&self) -> (f64, f64) {
        match self {
            Currency::EUR => (0.015, 0.020),
            Currency::USD => (0.025, 0.020),
            Currency::GBP => (0.020, 0.025),
        }
    }

    /// Synthetic 60-year annual curve.
    pub fn preset_curve(&self) -> YieldCurve {
        let (base, slope) = self.preset_parameters();
        let maturities: Vec<f64> = (1..=60).map(|m| m as f64).collect();
        let rates = maturities
            .iter()
            .map(|m| base + slope * (1.0 - (-m / 10.0).exp()))
            .collect();
        YieldCurve { maturities, rates }
    }
}

impl FromStr for Currency {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "EUR" => Ok(Currency::EUR),
            "USD" => Ok(Currency::USD),
            "GBP" => Ok(Currency::GBP),
            _ => Err(ScenarioError::configuration(
                "currency",
                format!("unknown currency '{}', expected one of EUR, USD, GBP", s),
            )),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Nelson-Siegel yields
/// `β0 + β1·g(m) + β2·(g(m) - e^{-m/λ})` with `g(m) = (1 - e^{-m/λ}) / (m/λ)`.
///
/// At `m = 0` the limit `β0 + β1` is used.
pub fn nelson_siegel(maturities: &[f64], beta0: f64, beta1: f64, beta2: f64, lambda: f64) -> Vec<f64> {
    maturities
        .iter()
        .map(|&m| {
            let x = m / lambda;
            let decay = (-x).exp();
            let g = if x.abs() < 1e-12 { 1.0 } else { (1.0 - decay) / x };
            beta0 + beta1 * g + beta2 * (g - decay)
        })
        .collect()
}

/// Spot rates implied by zero-coupon prices, `r = P^(-1/T) - 1`.
///
/// # Errors
///
/// `Configuration` when lengths differ, a price is not positive, or a
/// maturity is not positive.
pub fn bootstrap_spot_rates(bond_prices: &[f64], maturities: &[f64]) -> Result<Vec<f64>, ScenarioError> {
    if bond_prices.len() != maturities.len() {
        return Err(ScenarioError::dimension_mismatch(
            "bootstrap_spot_rates",
            maturities.len(),
            bond_prices.len(),
        ));
    }
    bond_prices
        .iter()
        .zip(maturities)
        .map(|(&p, &t)| {
            if p <= 0.0 || !p.is_finite() {
                Err(ScenarioError::configuration(
                    "bond_prices",
                    format!("price must be positive, got {}", p),
                ))
            } else if t <= 0.0 {
                Err(ScenarioError::configuration(
                    "maturities",
                    format!("maturity must be positive, got {}", t),
                ))
            } else {
                Ok(p.powf(-1.0 / t) - 1.0)
            }
        })
        .collect()
}
