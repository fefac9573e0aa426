//! Correlated shock cube across named asset factors.
//!
//! The generator draws an independent standard-normal block per factor,
//! optionally replaces the rate factor's block with residuals backed out of
//! the short-rate simulation, and applies the Cholesky factor at every
//! `(scenario, step)` cell.

use serde::{Deserialize, Serialize};
use tracing::debug;

use scenario_core::math::statistics::pearson;
use scenario_core::rng::ScenarioRng;
use scenario_core::types::{CorrelationError, PathMatrix, ScenarioError};

use super::correlated::{CholeskyFactor, CorrelationMatrix};

/// Tensor `[factor × scenario × step]`, factor-major.
#[derive(Clone, Debug, PartialEq)]
pub struct ShockCube {
    names: Vec<String>,
    num_scenarios: usize,
    num_steps: usize,
    data: Vec<f64>,
}

impl ShockCube {
    fn zeros(names: Vec<String>, num_scenarios: usize, num_steps: usize) -> Self {
        let len = names.len() * num_scenarios * num_steps;
        Self {
            names,
            num_scenarios,
            num_steps,
            data: vec![0.0; len],
        }
    }

    #[inline]
    fn offset(&self, factor: usize, scenario: usize, step: usize) -> usize {
        (factor * self.num_scenarios + scenario) * self.num_steps + step
    }

    /// Factor names in cube order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of factors.
    pub fn num_factors(&self) -> usize {
        self.names.len()
    }

    /// Number of scenarios.
    pub fn num_scenarios(&self) -> usize {
        self.num_scenarios
    }

    /// Number of steps.
    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    /// Single value.
    pub fn get(&self, factor: usize, scenario: usize, step: usize) -> f64 {
        self.data[self.offset(factor, scenario, step)]
    }

    /// Flat `[scenario × step]` block of one factor.
    pub fn factor_slice(&self, factor: usize) -> &[f64] {
        let block = self.num_scenarios * self.num_steps;
        &self.data[factor * block..(factor + 1) * block]
    }

    /// Copy of factor `name` as a `[scenario × step]` matrix.
    pub fn factor(&self, name: &str) -> Result<PathMatrix, ScenarioError> {
        let index = self
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| CorrelationError::UnknownFactor {
                name: name.to_string(),
                available: self.names.join(", "),
            })?;
        PathMatrix::from_vec(
            self.num_scenarios,
            self.num_steps,
            self.factor_slice(index).to_vec(),
        )
    }
}

/// Free-function form of [`ShockCube::factor`].
pub fn extract_factor(cube: &ShockCube, name: &str) -> Result<PathMatrix, ScenarioError> {
    cube.factor(name)
}

/// Target against realised correlation for one factor pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PairCheck {
    /// First factor
    pub first: String,
    /// Second factor
    pub second: String,
    /// Entry of the correlation matrix
    pub target: f64,
    /// Pearson estimate over all `(scenario, step)` cells
    pub empirical: f64,
    /// `empirical - target`
    pub difference: f64,
}

/// Result of [`CrossAssetShockGenerator::verify`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorrelationCheck {
    /// One entry per unordered pair
    pub pairs: Vec<PairCheck>,
    /// Largest `|difference|`
    pub max_abs_deviation: f64,
}

impl CorrelationCheck {
    /// True when every pair is within `tolerance`.
    pub fn within(&self, tolerance: f64) -> bool {
        self.max_abs_deviation <= tolerance
    }
}

/// Correlated shock generator.
///
/// # Examples
///
/// ```
/// use scenario_core::rng::ScenarioRng;
/// use scenario_models::models::hybrid::{
///     CorrelationMatrix, CorrelationPreset, CrossAssetShockGenerator,
/// };
///
/// let corr = CorrelationMatrix::from_preset(CorrelationPreset::Ahlgrim2005);
/// let generator = CrossAssetShockGenerator::new(corr, 100, 10, true).unwrap();
/// let mut rng = ScenarioRng::from_seed(1);
/// let cube = generator.generate(&mut rng, None).unwrap();
/// assert_eq!(cube.num_factors(), 5);
/// assert_eq!(cube.factor("equity").unwrap().shape(), (100, 10));
/// ```
#[derive(Clone, Debug)]
pub struct CrossAssetShockGenerator {
    correlation: CorrelationMatrix,
    cholesky: CholeskyFactor,
    num_scenarios: usize,
    num_steps: usize,
    antithetic: bool,
    rate_factor: usize,
}

impl CrossAssetShockGenerator {
    /// Factorise `correlation` and fix the cube shape.
    ///
    /// The rate factor defaults to index 0.
    pub fn new(
        correlation: CorrelationMatrix,
        num_scenarios: usize,
        num_steps: usize,
        antithetic: bool,
    ) -> Result<Self, ScenarioError> {
        if correlation.dim() == 0 {
            return Err(ScenarioError::configuration(
                "correlation",
                "at least one factor is required",
            ));
        }
        if num_scenarios == 0 {
            return Err(ScenarioError::configuration(
                "num_scenarios",
                "must be positive, got 0",
            ));
        }
        if num_steps == 0 {
            return Err(ScenarioError::configuration("num_steps", "must be positive, got 0"));
        }
        if antithetic && num_scenarios % 2 != 0 {
            return Err(ScenarioError::configuration(
                "num_scenarios",
                format!("antithetic sampling needs an even count, got {}", num_scenarios),
            ));
        }
        let cholesky = correlation.cholesky()?;
        Ok(Self {
            correlation,
            cholesky,
            num_scenarios,
            num_steps,
            antithetic,
            rate_factor: 0,
        })
    }

    /// Designate the factor that receives external rate residuals.
    pub fn with_rate_factor(mut self, name: &str) -> Result<Self, ScenarioError> {
        self.rate_factor = self.correlation.index_of(name)?;
        Ok(self)
    }

    /// Correlation in use.
    pub fn correlation(&self) -> &CorrelationMatrix {
        &self.correlation
    }

    /// Cholesky factor in use.
    pub fn cholesky(&self) -> &CholeskyFactor {
        &self.cholesky
    }

    /// Index of the rate factor.
    pub fn rate_factor(&self) -> usize {
        self.rate_factor
    }

    /// Draw independent normals, substitute residuals, correlate.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` when `rate_residuals` is not `[num_scenarios × num_steps]`.
    pub fn generate(
        &self,
        rng: &mut ScenarioRng,
        rate_residuals: Option<&PathMatrix>,
    ) -> Result<ShockCube, ScenarioError> {
        let mut cube = self.independent(rng, rate_residuals)?;
        self.correlate(&mut cube);
        debug!(
            factors = cube.num_factors(),
            scenarios = self.num_scenarios,
            steps = self.num_steps,
            "generated correlated shock cube"
        );
        Ok(cube)
    }

    /// Uncorrelated cube with the rate block already substituted.
    pub fn independent(
        &self,
        rng: &mut ScenarioRng,
        rate_residuals: Option<&PathMatrix>,
    ) -> Result<ShockCube, ScenarioError> {
        if let Some(residuals) = rate_residuals {
            if residuals.shape() != (self.num_scenarios, self.num_steps) {
                return Err(ScenarioError::dimension_mismatch(
                    "rate residuals",
                    format!("{}x{}", self.num_scenarios, self.num_steps),
                    format!("{}x{}", residuals.rows(), residuals.cols()),
                ));
            }
        }

        let mut cube = ShockCube::zeros(
            self.correlation.names().to_vec(),
            self.num_scenarios,
            self.num_steps,
        );
        let block = self.num_scenarios * self.num_steps;
        for (factor, chunk) in cube.data.chunks_mut(block).enumerate() {
            match rate_residuals {
                Some(residuals) if factor == self.rate_factor => {
                    chunk.copy_from_slice(residuals.as_slice());
                }
                _ => draw_block(chunk, self.antithetic, rng),
            }
        }
        Ok(cube)
    }

    fn correlate(&self, cube: &mut ShockCube) {
        let dim = cube.num_factors();
        let mut cell = vec![0.0; dim];
        for s in 0..self.num_scenarios {
            for t in 0..self.num_steps {
                for (f, z) in cell.iter_mut().enumerate() {
                    *z = cube.get(f, s, t);
                }
                self.cholesky.transform_inplace(&mut cell);
                for (f, w) in cell.iter().enumerate() {
                    let offset = cube.offset(f, s, t);
                    cube.data[offset] = *w;
                }
            }
        }
    }

    /// Compare realised pairwise correlation in `cube` with the target.
    pub fn verify(&self, cube: &ShockCube) -> CorrelationCheck {
        verify_against(&self.correlation, cube)
    }
}

/// Rows are scenarios, so mirroring the flat block pairs scenario `s` with `s + n/2`.
fn draw_block(chunk: &mut [f64], antithetic: bool, rng: &mut ScenarioRng) {
    if antithetic {
        rng.fill_antithetic(chunk);
    } else {
        rng.fill_normal(chunk);
    }
}

/// Pearson estimate of every factor pair against `target`.
pub fn verify_against(target: &CorrelationMatrix, cube: &ShockCube) -> CorrelationCheck {
    let n = cube.num_factors().min(target.dim());
    let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            let empirical = pearson(cube.factor_slice(i), cube.factor_slice(j));
            let t = target.get(i, j);
            pairs.push(PairCheck {
                first: cube.names()[i].clone(),
                second: cube.names()[j].clone(),
                target: t,
                empirical,
                difference: empirical - t,
            });
        }
    }
    let max_abs_deviation = pairs
        .iter()
        .map(|p| p.difference.abs())
        .fold(0.0, f64::max);
    CorrelationCheck {
        pairs,
        max_abs_deviation,
    }
}
