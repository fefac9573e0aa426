//! Generation configuration.
//!
//! [`ScenarioConfig`] is deserialisable from TOML/JSON with every field
//! defaulted, and can also be assembled with [`ScenarioConfigBuilder`].
//! [`ScenarioConfig::validate`] runs before any simulation and names the
//! offending field on failure.

use serde::{Deserialize, Serialize};

use scenario_core::market_data::{Currency, YieldCurve};
use scenario_core::rng::ScenarioRng;
use scenario_core::types::ScenarioError;
use scenario_models::calibration::SmoothingParams;
use scenario_models::models::equity::EquityParams;
use scenario_models::models::hybrid::{CorrelationMatrix, CorrelationPreset};
use scenario_models::models::rates::{HullWhiteParams, PathFilterPolicy, RateBounds};
use scenario_models::models::real_estate::RealEstateParams;

/// Factors the stochastic pipeline reads from the shock cube.
pub const REQUIRED_FACTORS: [&str; 4] = ["short_rate", "inflation", "real_estate", "equity"];

/// Factor that receives the short-rate residuals.
pub const RATE_FACTOR: &str = "short_rate";

/// Upper limit on `num_scenarios × num_steps`.
pub const MAX_CELLS: usize = 100_000_000;

/// Generation method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// Closed-form correlated normals, no calibration
    #[default]
    Simple,
    /// Calibrated Hull-White rates with correlated asset models
    Stochastic,
}

impl GenerationMode {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::Simple => "simple",
            GenerationMode::Stochastic => "stochastic",
        }
    }
}

impl std::str::FromStr for GenerationMode {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(GenerationMode::Simple),
            "stochastic" => Ok(GenerationMode::Stochastic),
            _ => Err(ScenarioError::configuration(
                "mode",
                format!("unknown mode '{}', expected simple or stochastic", s),
            )),
        }
    }
}

impl std::fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-asset hyperparameters.
///
/// Means and volatilities drive simple mode. Stochastic mode uses the
/// Hull-White, equity and real-estate entries plus the inflation and GDP
/// means/volatilities.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomicParams {
    /// Mean annual short rate
    pub interest_mean: f64,
    /// Short-rate volatility
    pub interest_volatility: f64,
    /// Mean annual inflation
    pub inflation_mean: f64,
    /// Inflation volatility
    pub inflation_volatility: f64,
    /// Expected equity return
    pub equity_drift: f64,
    /// Equity volatility
    pub equity_volatility: f64,
    /// Expected bond return
    pub bond_return_mean: f64,
    /// Bond return volatility
    pub bond_return_std: f64,
    /// Expected real-estate return
    pub real_estate_drift: f64,
    /// Real-estate volatility
    pub real_estate_volatility: f64,
    /// Mean GDP growth
    pub gdp_growth_mean: f64,
    /// GDP growth volatility
    pub gdp_growth_std: f64,
    /// Hull-White `a`
    pub mean_reversion_speed: f64,
    /// Hull-White `σ`
    pub hw_volatility: f64,
    /// Equity dividend yield
    pub equity_dividend_yield: f64,
    /// Real-estate auxiliary-rate mean reversion
    pub re_mean_reversion: f64,
    /// Real-estate rental yield
    pub re_rental_yield: f64,
    /// Real-estate rent indexation
    pub re_inflation_adj: f64,
}

impl Default for EconomicParams {
    fn default() -> Self {
        Self {
            interest_mean: 0.03,
            interest_volatility: 0.02,
            inflation_mean: 0.025,
            inflation_volatility: 0.015,
            equity_drift: 0.10,
            equity_volatility: 0.18,
            bond_return_mean: 0.05,
            bond_return_std: 0.07,
            real_estate_drift: 0.08,
            real_estate_volatility: 0.12,
            gdp_growth_mean: 0.025,
            gdp_growth_std: 0.02,
            mean_reversion_speed: 0.1,
            hw_volatility: 0.01,
            equity_dividend_yield: 0.02,
            re_mean_reversion: 0.15,
            re_rental_yield: 0.03,
            re_inflation_adj: 0.02,
        }
    }
}

impl EconomicParams {
    /// Hull-White parameters.
    pub fn hull_white(&self) -> Result<HullWhiteParams, ScenarioError> {
        HullWhiteParams::new(self.mean_reversion_speed, self.hw_volatility)
    }

    /// Equity model parameters.
    pub fn equity(&self) -> Result<EquityParams, ScenarioError> {
        EquityParams::new(self.equity_volatility, self.equity_dividend_yield)
    }

    /// Real-estate model parameters.
    pub fn real_estate(&self) -> Result<RealEstateParams, ScenarioError> {
        RealEstateParams::new(
            self.re_mean_reversion,
            self.real_estate_volatility,
            self.re_rental_yield,
            self.re_inflation_adj,
        )
    }

    /// Means finite, volatilities non-negative.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let means = [
            ("economic.interest_mean", self.interest_mean),
            ("economic.inflation_mean", self.inflation_mean),
            ("economic.equity_drift", self.equity_drift),
            ("economic.bond_return_mean", self.bond_return_mean),
            ("economic.real_estate_drift", self.real_estate_drift),
            ("economic.gdp_growth_mean", self.gdp_growth_mean),
        ];
        for (field, v) in means {
            if !v.is_finite() {
                return Err(ScenarioError::configuration(field, "must be finite"));
            }
        }
        let vols = [
            ("economic.interest_volatility", self.interest_volatility),
            ("economic.inflation_volatility", self.inflation_volatility),
            ("economic.equity_volatility", self.equity_volatility),
            ("economic.bond_return_std", self.bond_return_std),
            ("economic.real_estate_volatility", self.real_estate_volatility),
            ("economic.gdp_growth_std", self.gdp_growth_std),
        ];
        for (field, v) in vols {
            if !(v.is_finite() && v >= 0.0) {
                return Err(ScenarioError::configuration(
                    field,
                    format!("must be non-negative, got {}", v),
                ));
            }
        }
        Ok(())
    }
}

/// Correlation override: a named preset or an explicit matrix.
///
/// ```toml
/// [correlation]
/// preset = "stress"
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrelationSpec {
    /// Built-in matrix over the default factors
    Preset {
        /// Which preset
        preset: CorrelationPreset,
    },
    /// Explicit matrix with factor names
    Explicit {
        /// Factor names in matrix order
        factors: Vec<String>,
        /// Square matrix rows
        matrix: Vec<Vec<f64>>,
    },
}

impl Default for CorrelationSpec {
    fn default() -> Self {
        CorrelationSpec::Preset {
            preset: CorrelationPreset::default(),
        }
    }
}

impl CorrelationSpec {
    /// Build and repair the matrix.
    pub fn to_matrix(&self) -> Result<CorrelationMatrix, ScenarioError> {
        match self {
            CorrelationSpec::Preset { preset } => Ok(CorrelationMatrix::from_preset(*preset)),
            CorrelationSpec::Explicit { factors, matrix } => {
                Ok(CorrelationMatrix::new(factors.clone(), matrix)?)
            }
        }
    }
}

/// Complete generation configuration.
///
/// # Examples
///
/// ```
/// use scenario_engine::config::{GenerationMode, ScenarioConfig};
///
/// let config = ScenarioConfig::builder()
///     .num_scenarios(500)
///     .time_horizon(10.0)
///     .timestep(0.5)
///     .mode(GenerationMode::Stochastic)
///     .seed(7)
///     .build()
///     .unwrap();
/// assert_eq!(config.num_steps(), 20);
///
/// let err = ScenarioConfig::builder().timestep(0.0).build().unwrap_err();
/// assert!(err.to_string().contains("timestep"));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Monte Carlo scenario count
    pub num_scenarios: usize,
    /// Horizon in years
    pub time_horizon: f64,
    /// Step length `dt` in years
    pub timestep: f64,
    /// Simple or stochastic generation
    pub mode: GenerationMode,
    /// Preset curve used when `yield_curve` is absent
    pub currency: Currency,
    /// Explicit spot curve
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yield_curve: Option<YieldCurve>,
    /// Asset hyperparameters
    pub economic: EconomicParams,
    /// Cross-asset correlation
    pub correlation: CorrelationSpec,
    /// Antithetic sampling (stochastic mode, even `num_scenarios`)
    pub antithetic: bool,
    /// Explosive-path bounds, annual-compounded
    pub rate_bounds: RateBounds,
    /// Discarded share above which replacement stops
    pub max_discard_fraction: f64,
    /// Replacement rounds after the first generation
    pub max_replacement_attempts: usize,
    /// Year the forward-tail smoothing starts
    pub smoothing_start: f64,
    /// Rolling window of the tail smoothing, in years
    pub smoothing_window: f64,
    /// Martingale test tolerance
    pub martingale_tolerance: f64,
    /// Seed of the root random stream
    pub seed: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        let policy = PathFilterPolicy::default();
        let smoothing = SmoothingParams::default();
        Self {
            num_scenarios: 1000,
            time_horizon: 30.0,
            timestep: 1.0,
            mode: GenerationMode::Simple,
            currency: Currency::default(),
            yield_curve: None,
            economic: EconomicParams::default(),
            correlation: CorrelationSpec::default(),
            antithetic: true,
            rate_bounds: policy.bounds,
            max_discard_fraction: policy.max_discard_fraction,
            max_replacement_attempts: policy.max_replacement_attempts,
            smoothing_start: smoothing.start_year,
            smoothing_window: smoothing.window_years,
            martingale_tolerance: 0.05,
            seed: 42,
        }
    }
}

impl ScenarioConfig {
    /// Fluent builder starting from the defaults.
    pub fn builder() -> ScenarioConfigBuilder {
        ScenarioConfigBuilder::default()
    }

    /// `floor(time_horizon / timestep)`, tolerant of rounding.
    pub fn num_steps(&self) -> usize {
        (self.time_horizon / self.timestep + 1e-9).floor() as usize
    }

    /// Spot curve for calibration.
    pub fn curve(&self) -> YieldCurve {
        self.yield_curve
            .clone()
            .unwrap_or_else(|| self.currency.preset_curve())
    }

    /// Explosive-path filter settings.
    pub fn filter_policy(&self) -> PathFilterPolicy {
        PathFilterPolicy {
            bounds: self.rate_bounds,
            max_discard_fraction: self.max_discard_fraction,
            max_replacement_attempts: self.max_replacement_attempts,
        }
    }

    /// Forward-tail smoothing settings.
    pub fn smoothing(&self) -> SmoothingParams {
        SmoothingParams {
            start_year: self.smoothing_start,
            window_years: self.smoothing_window,
        }
    }

    /// Root random stream.
    pub fn rng(&self) -> ScenarioRng {
        ScenarioRng::from_seed(self.seed)
    }

    /// Check every field before simulation.
    ///
    /// # Errors
    ///
    /// `Configuration` naming the first offending field.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.num_scenarios == 0 {
            return Err(ScenarioError::configuration(
                "num_scenarios",
                "must be positive, got 0",
            ));
        }
        if !(self.time_horizon.is_finite() && self.time_horizon > 0.0) {
            return Err(ScenarioError::configuration(
                "time_horizon",
                format!("must be positive, got {}", self.time_horizon),
            ));
        }
        if !(self.timestep.is_finite() && self.timestep > 0.0) {
            return Err(ScenarioError::configuration(
                "timestep",
                format!("must be positive, got {}", self.timestep),
            ));
        }
        let steps = self.num_steps();
        if steps == 0 {
            return Err(ScenarioError::configuration(
                "timestep",
                format!(
                    "{} is longer than the horizon {}",
                    self.timestep, self.time_horizon
                ),
            ));
        }
        if self.num_scenarios.saturating_mul(steps) > MAX_CELLS {
            return Err(ScenarioError::configuration(
                "num_scenarios",
                format!(
                    "{} scenarios x {} steps exceeds the limit of {} cells",
                    self.num_scenarios, steps, MAX_CELLS
                ),
            ));
        }
        if !(self.martingale_tolerance.is_finite() && self.martingale_tolerance > 0.0) {
            return Err(ScenarioError::configuration(
                "martingale_tolerance",
                format!("must be positive, got {}", self.martingale_tolerance),
            ));
        }
        self.economic.validate()?;

        if self.mode == GenerationMode::Stochastic {
            self.validate_stochastic(steps)?;
        }
        Ok(())
    }

    fn validate_stochastic(&self, steps: usize) -> Result<(), ScenarioError> {
        if self.antithetic && self.num_scenarios % 2 != 0 {
            return Err(ScenarioError::configuration(
                "num_scenarios",
                format!(
                    "must be even for antithetic sampling, got {}",
                    self.num_scenarios
                ),
            ));
        }
        self.economic.hull_white()?;
        self.economic.equity()?;
        self.economic.real_estate()?;
        self.filter_policy().validate()?;
        self.smoothing().validate()?;

        let curve = self.curve();
        let covered = (curve.max_maturity() / self.timestep + 1e-9).floor() as usize;
        if covered < steps {
            return Err(ScenarioError::configuration(
                "yield_curve",
                format!(
                    "curve ends at {} years, horizon needs {}",
                    curve.max_maturity(),
                    steps as f64 * self.timestep
                ),
            ));
        }

        let matrix = self.correlation.to_matrix()?;
        for factor in REQUIRED_FACTORS {
            matrix.index_of(factor)?;
        }
        Ok(())
    }
}

/// Builder for [`ScenarioConfig`]; unset fields keep their defaults.
#[derive(Clone, Debug, Default)]
pub struct ScenarioConfigBuilder {
    config: ScenarioConfig,
}

impl ScenarioConfigBuilder {
    /// Scenario count.
    pub fn num_scenarios(mut self, n: usize) -> Self {
        self.config.num_scenarios = n;
        self
    }

    /// Horizon in years.
    pub fn time_horizon(mut self, years: f64) -> Self {
        self.config.time_horizon = years;
        self
    }

    /// Step length in years.
    pub fn timestep(mut self, dt: f64) -> Self {
        self.config.timestep = dt;
        self
    }

    /// Generation mode.
    pub fn mode(mut self, mode: GenerationMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Preset curve currency.
    pub fn currency(mut self, currency: Currency) -> Self {
        self.config.currency = currency;
        self
    }

    /// Explicit spot curve.
    pub fn yield_curve(mut self, curve: YieldCurve) -> Self {
        self.config.yield_curve = Some(curve);
        self
    }

    /// Asset hyperparameters.
    pub fn economic(mut self, params: EconomicParams) -> Self {
        self.config.economic = params;
        self
    }

    /// Correlation override.
    pub fn correlation(mut self, spec: CorrelationSpec) -> Self {
        self.config.correlation = spec;
        self
    }

    /// Antithetic sampling.
    pub fn antithetic(mut self, on: bool) -> Self {
        self.config.antithetic = on;
        self
    }

    /// Explosive-path filter.
    pub fn filter_policy(mut self, policy: PathFilterPolicy) -> Self {
        self.config.rate_bounds = policy.bounds;
        self.config.max_discard_fraction = policy.max_discard_fraction;
        self.config.max_replacement_attempts = policy.max_replacement_attempts;
        self
    }

    /// Forward-tail smoothing.
    pub fn smoothing(mut self, smoothing: SmoothingParams) -> Self {
        self.config.smoothing_start = smoothing.start_year;
        self.config.smoothing_window = smoothing.window_years;
        self
    }

    /// Martingale tolerance.
    pub fn martingale_tolerance(mut self, tolerance: f64) -> Self {
        self.config.martingale_tolerance = tolerance;
        self
    }

    /// Root seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<ScenarioConfig, ScenarioError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
