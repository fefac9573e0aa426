//! Spot curve to simulation-grid bond prices and forward rates.
//!
//! Pipeline:
//! 1. `P(0,n) = (1 + r_n)^-n` at the integer maturities, with `P(0,0) = 1`
//! 2. Natural cubic spline of `P` onto `t_i = i·dt`, re-pinning `P(0,0) = 1`
//! 3. `f(0,t) = -d/dt ln P(0,t)` by centred differences, one-sided at the ends
//! 4. Rolling-average smoothing of the forward tail from `start_year`

use serde::{Deserialize, Serialize};
use tracing::debug;

use scenario_core::market_data::YieldCurve;
use scenario_core::math::interpolators::{CubicSplineInterpolator, Interpolator};
use scenario_core::types::ScenarioError;

/// Forward-tail smoothing controls, in years.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SmoothingParams {
    /// First maturity whose forward rate is smoothed
    pub start_year: f64,
    /// Length of the forward-looking averaging window
    pub window_years: f64,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            start_year: 60.0,
            window_years: 20.0,
        }
    }
}

impl SmoothingParams {
    /// Reject negative or non-finite values.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !self.start_year.is_finite() || self.start_year < 0.0 {
            return Err(ScenarioError::configuration(
                "smoothing_start",
                format!("must be non-negative, got {}", self.start_year),
            ));
        }
        if !self.window_years.is_finite() || self.window_years < 0.0 {
            return Err(ScenarioError::configuration(
                "smoothing_window",
                format!("must be non-negative, got {}", self.window_years),
            ));
        }
        Ok(())
    }
}

/// Calibrated curves on the grid `t_i = i·dt`, `i = 0..len`.
///
/// Immutable once built; `bond_prices()[0] == 1`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibratedCurve {
    dt: f64,
    bond_prices: Vec<f64>,
    raw_forward_rates: Vec<f64>,
    forward_rates: Vec<f64>,
}

impl CalibratedCurve {
    /// Grid spacing in years.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Number of grid points.
    pub fn len(&self) -> usize {
        self.bond_prices.len()
    }

    /// Never true for a calibrated curve.
    pub fn is_empty(&self) -> bool {
        self.bond_prices.is_empty()
    }

    /// Grid times `i·dt`.
    pub fn times(&self) -> Vec<f64> {
        (0..self.len()).map(|i| i as f64 * self.dt).collect()
    }

    /// Last grid time.
    pub fn horizon(&self) -> f64 {
        self.len().saturating_sub(1) as f64 * self.dt
    }

    /// `P(0, t_i)` over the whole grid.
    pub fn bond_prices(&self) -> &[f64] {
        &self.bond_prices
    }

    /// Smoothed `f(0, t_i)` over the whole grid.
    pub fn forward_rates(&self) -> &[f64] {
        &self.forward_rates
    }

    /// Forward rates before tail smoothing.
    pub fn raw_forward_rates(&self) -> &[f64] {
        &self.raw_forward_rates
    }

    /// First `n_steps` smoothed forward rates.
    ///
    /// # Errors
    ///
    /// `CurveTooShort` when `n_steps` exceeds the grid; the curve is never
    /// extrapolated.
    pub fn forward_curve(&self, n_steps: usize) -> Result<&[f64], ScenarioError> {
        self.check_length(n_steps)?;
        Ok(&self.forward_rates[..n_steps])
    }

    /// First `n_steps` bond prices.
    pub fn bond_price_curve(&self, n_steps: usize) -> Result<&[f64], ScenarioError> {
        self.check_length(n_steps)?;
        Ok(&self.bond_prices[..n_steps])
    }

    /// `(min, max)` of the smoothed forward curve.
    pub fn forward_range(&self) -> (f64, f64) {
        self.forward_rates
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &f| {
                (lo.min(f), hi.max(f))
            })
    }

    /// `P(0, t)` for any `t` on `[0, horizon]`, log-linear between grid points.
    pub fn bond_price_at(&self, t: f64) -> Result<f64, ScenarioError> {
        let (i, w) = self.locate(t)?;
        if w == 0.0 {
            return Ok(self.bond_prices[i]);
        }
        let (lo, hi) = (self.bond_prices[i].ln(), self.bond_prices[i + 1].ln());
        Ok((lo + w * (hi - lo)).exp())
    }

    /// `f(0, t)` for any `t` on `[0, horizon]`, linear between grid points.
    pub fn forward_rate_at(&self, t: f64) -> Result<f64, ScenarioError> {
        let (i, w) = self.locate(t)?;
        if w == 0.0 {
            return Ok(self.forward_rates[i]);
        }
        let (lo, hi) = (self.forward_rates[i], self.forward_rates[i + 1]);
        Ok(lo + w * (hi - lo))
    }

    fn check_length(&self, n_steps: usize) -> Result<(), ScenarioError> {
        if n_steps > self.len() {
            return Err(ScenarioError::CurveTooShort {
                requested: n_steps,
                available: self.len(),
            });
        }
        Ok(())
    }

    /// Grid index and interpolation weight for `t`.
    fn locate(&self, t: f64) -> Result<(usize, f64), ScenarioError> {
        let horizon = self.horizon();
        if !(0.0..=horizon + 1e-12).contains(&t) {
            return Err(ScenarioError::configuration(
                "maturity",
                format!("time {} outside calibrated range [0, {}]", t, horizon),
            ));
        }
        let x = t / self.dt;
        let i = (x.floor() as usize).min(self.len() - 1);
        let w = x - i as f64;
        if i == self.len() - 1 || w < 1e-12 {
            Ok((i, 0.0))
        } else {
            Ok((i, w))
        }
    }
}

/// Converts a spot curve into [`CalibratedCurve`] at step `dt`.
///
/// # Examples
///
/// ```
/// use scenario_core::market_data::Currency;
/// use scenario_models::calibration::YieldCurveCalibrator;
///
/// let mut calibrator = YieldCurveCalibrator::new(Currency::USD.preset_curve(), 0.5).unwrap();
/// assert!(calibrator.forward_curve(10).is_err()); // not calibrated yet
///
/// calibrator.calibrate().unwrap();
/// assert_eq!(calibrator.bond_prices(21).unwrap()[0], 1.0);
/// assert_eq!(calibrator.forward_curve(21).unwrap().len(), 21);
/// ```
#[derive(Clone, Debug)]
pub struct YieldCurveCalibrator {
    curve: YieldCurve,
    dt: f64,
    smoothing: SmoothingParams,
    calibrated: Option<CalibratedCurve>,
}

impl YieldCurveCalibrator {
    /// Calibrator for `curve` at step `dt` with default smoothing.
    ///
    /// Curves not quoted on integer years are resampled first.
    ///
    /// # Errors
    ///
    /// `Configuration` when `dt` is not positive or exceeds the curve length.
    pub fn new(curve: YieldCurve, dt: f64) -> Result<Self, ScenarioError> {
        let curve = curve.to_annual_grid()?;
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ScenarioError::configuration(
                "timestep",
                format!("must be positive, got {}", dt),
            ));
        }
        if dt > curve.max_maturity() {
            return Err(ScenarioError::configuration(
                "timestep",
                format!(
                    "{} exceeds the longest curve maturity {}",
                    dt,
                    curve.max_maturity()
                ),
            ));
        }
        Ok(Self {
            curve,
            dt,
            smoothing: SmoothingParams::default(),
            calibrated: None,
        })
    }

    /// Override the tail smoothing.
    pub fn with_smoothing(mut self, smoothing: SmoothingParams) -> Result<Self, ScenarioError> {
        smoothing.validate()?;
        self.smoothing = smoothing;
        self.calibrated = None;
        Ok(self)
    }

    /// Input curve, on the annual grid.
    pub fn yield_curve(&self) -> &YieldCurve {
        &self.curve
    }

    /// Simulation step.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Run the calibration pipeline. Recalibrating replaces the previous result.
    pub fn calibrate(&mut self) -> Result<&CalibratedCurve, ScenarioError> {
        let bond_prices = self.interpolate_bond_prices()?;
        let raw_forward_rates = forward_rates_from_prices(&bond_prices, self.dt);
        let forward_rates = smooth_tail(&raw_forward_rates, self.dt, &self.smoothing);

        debug!(
            points = bond_prices.len(),
            dt = self.dt,
            f0 = forward_rates.first().copied().unwrap_or(f64::NAN),
            "calibrated yield curve"
        );

        Ok(&*self.calibrated.insert(CalibratedCurve {
            dt: self.dt,
            bond_prices,
            raw_forward_rates,
            forward_rates,
        }))
    }

    /// Result of the last [`calibrate`](Self::calibrate).
    pub fn calibrated(&self) -> Result<&CalibratedCurve, ScenarioError> {
        self.calibrated.as_ref().ok_or(ScenarioError::NotCalibrated)
    }

    /// First `n_steps` smoothed forward rates.
    pub fn forward_curve(&self, n_steps: usize) -> Result<&[f64], ScenarioError> {
        self.calibrated()?.forward_curve(n_steps)
    }

    /// First `n_steps` bond prices.
    pub fn bond_prices(&self, n_steps: usize) -> Result<&[f64], ScenarioError> {
        self.calibrated()?.bond_price_curve(n_steps)
    }

    fn interpolate_bond_prices(&self) -> Result<Vec<f64>, ScenarioError> {
        let mut xs = Vec::with_capacity(self.curve.len() + 1);
        let mut ys = Vec::with_capacity(self.curve.len() + 1);
        xs.push(0.0);
        ys.push(1.0);
        xs.extend_from_slice(self.curve.maturities());
        ys.extend(self.curve.discount_factors());

        let spline = CubicSplineInterpolator::new(&xs, &ys)?;
        let t_max = self.curve.max_maturity();
        let n = (t_max / self.dt + 1e-9).floor() as usize + 1;

        let mut prices = (0..n)
            .map(|i| spline.interpolate((i as f64 * self.dt).min(t_max)))
            .collect::<Result<Vec<_>, _>>()?;
        prices[0] = 1.0;
        if let Some(i) = prices.iter().position(|p| *p <= 0.0) {
            return Err(ScenarioError::configuration(
                "yield_curve",
                format!(
                    "interpolated bond price at t = {} is not positive",
                    i as f64 * self.dt
                ),
            ));
        }
        Ok(prices)
    }
}

/// `-d/dt ln P` by finite differences; needs at least two points.
fn forward_rates_from_prices(prices: &[f64], dt: f64) -> Vec<f64> {
    let log_p: Vec<f64> = prices.iter().map(|p| p.ln()).collect();
    let n = log_p.len();
    let mut f = vec![0.0; n];
    f[0] = -(log_p[1] - log_p[0]) / dt;
    for i in 1..n - 1 {
        f[i] = -(log_p[i + 1] - log_p[i - 1]) / (2.0 * dt);
    }
    f[n - 1] = -(log_p[n - 1] - log_p[n - 2]) / dt;
    f
}

/// Forward-looking rolling mean over `window + 1` points from `start`, with
/// the last averaged value held to the end of the grid.
fn smooth_tail(raw: &[f64], dt: f64, params: &SmoothingParams) -> Vec<f64> {
    let mut out = raw.to_vec();
    let n = raw.len();
    let start = (params.start_year / dt) as usize;
    let window = (params.window_years / dt) as usize;
    let stop = n.saturating_sub(window);

    if window == 0 || start >= stop {
        return out;
    }
    for i in start..stop {
        let slice = &raw[i..=(i + window).min(n - 1)];
        out[i] = slice.iter().sum::<f64>() / slice.len() as f64;
    }
    let held = out[stop - 1];
    out[stop..].iter_mut().for_each(|f| *f = held);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use scenario_core::market_data::Currency;

    fn flat_curve(rate: f64, years: usize) -> YieldCurve {
        YieldCurve::from_annual_rates(&vec![rate; years]).unwrap()
    }

    // ========================================
    // Pipeline
    // ========================================

    #[test]
    fn test_flat_curve_gives_flat_forward() {
        let mut cal = YieldCurveCalibrator::new(flat_curve(0.03, 30), 0.25).unwrap();
        let curve = cal.calibrate().unwrap();
        let expected = (1.03f64).ln();
        // spline error is largest at the ends where the natural condition bites
        for f in &curve.forward_rates()[4..curve.len() - 4] {
            assert_relative_eq!(*f, expected, epsilon = 2e-4);
        }
        assert_eq!(curve.len(), 121);
    }

    #[test]
    fn test_bond_price_pinned_and_knots_matched() {
        let mut cal = YieldCurveCalibrator::new(Currency::EUR.preset_curve(), 0.5).unwrap();
        let curve = cal.calibrate().unwrap();
        assert_eq!(curve.bond_prices()[0], 1.0);
        let p10 = Currency::EUR.preset_curve().discount_factors()[9];
        assert_relative_eq!(curve.bond_prices()[20], p10, epsilon = 1e-12);
    }

    #[test]
    fn test_grid_stops_at_last_maturity() {
        let mut cal = YieldCurveCalibrator::new(flat_curve(0.02, 10), 0.3).unwrap();
        let curve = cal.calibrate().unwrap();
        // 0, 0.3, ..., 9.9
        assert_eq!(curve.len(), 34);
        assert!(curve.horizon() <= 10.0);
    }

    // ========================================
    // Accessors
    // ========================================

    #[test]
    fn test_not_calibrated() {
        let cal = YieldCurveCalibrator::new(flat_curve(0.02, 5), 1.0).unwrap();
        assert_eq!(cal.forward_curve(2), Err(ScenarioError::NotCalibrated));
        assert_eq!(cal.bond_prices(2), Err(ScenarioError::NotCalibrated));
    }

    #[test]
    fn test_too_many_steps() {
        let mut cal = YieldCurveCalibrator::new(flat_curve(0.02, 5), 1.0).unwrap();
        cal.calibrate().unwrap();
        assert_eq!(
            cal.forward_curve(7),
            Err(ScenarioError::CurveTooShort {
                requested: 7,
                available: 6
            })
        );
        assert_eq!(cal.bond_prices(6).unwrap().len(), 6);
    }

    #[test]
    fn test_invalid_dt() {
        assert!(YieldCurveCalibrator::new(flat_curve(0.02, 5), 0.0).is_err());
        assert!(YieldCurveCalibrator::new(flat_curve(0.02, 5), -0.5).is_err());
        assert!(YieldCurveCalibrator::new(flat_curve(0.02, 5), 6.0).is_err());
    }

    #[test]
    fn test_interpolated_lookups() {
        let mut cal = YieldCurveCalibrator::new(flat_curve(0.03, 20), 1.0).unwrap();
        let curve = cal.calibrate().unwrap();
        let p = curve.bond_price_at(2.5).unwrap();
        assert!(p < curve.bond_prices()[2] && p > curve.bond_prices()[3]);
        assert_relative_eq!(curve.bond_price_at(3.0).unwrap(), curve.bond_prices()[3]);
        assert!(curve.bond_price_at(25.0).is_err());
        assert!(curve.forward_rate_at(-1.0).is_err());
    }

    // ========================================
    // Smoothing
    // ========================================

    #[test]
    fn test_smooth_tail_rolling_mean_then_hold() {
        let raw: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let params = SmoothingParams {
            start_year: 2.0,
            window_years: 2.0,
        };
        let out = smooth_tail(&raw, 1.0, &params);
        assert_eq!(&out[..2], &[0.0, 1.0]);
        // mean of 2,3,4
        assert_relative_eq!(out[2], 3.0);
        // last averaged index is 7: mean of 7,8,9
        assert_relative_eq!(out[7], 8.0);
        assert_eq!(&out[8..], &[8.0, 8.0]);
    }

    #[test]
    fn test_smoothing_beyond_curve_is_noop() {
        let raw = vec![0.01, 0.02, 0.03];
        let out = smooth_tail(&raw, 1.0, &SmoothingParams::default());
        assert_eq!(out, raw);
    }

    #[test]
    fn test_custom_smoothing_changes_tail_only() {
        let base = YieldCurveCalibrator::new(Currency::GBP.preset_curve(), 1.0).unwrap();
        let smoothed = base
            .clone()
            .with_smoothing(SmoothingParams {
                start_year: 30.0,
                window_years: 10.0,
            })
            .unwrap();
        let (mut base, mut smoothed) = (base, smoothed);
        let a = base.calibrate().unwrap().clone();
        let b = smoothed.calibrate().unwrap();
        assert_eq!(&a.forward_rates()[..30], &b.forward_rates()[..30]);
        assert_eq!(a.raw_forward_rates(), b.raw_forward_rates());
        let tail = &b.forward_rates()[51..];
        assert!(tail.windows(2).all(|w| w[0] == w[1]));
    }
}
