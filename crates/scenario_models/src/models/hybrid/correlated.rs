//! Named correlation matrices with repair and Cholesky factorisation.
//!
//! ## Mathematical Background
//!
//! Given independent standard normals `Z`, correlated normals are
//! ```text
//! W = L · Z,   C = L · Lᵀ
//! ```
//! where `L` is the lower-triangular Cholesky factor of the correlation matrix `C`.
//!
//! ## Repair
//!
//! Input matrices are accepted when they can be repaired:
//! - asymmetric input is replaced by `(C + Cᵀ) / 2`
//! - a non-unit diagonal is normalised, `C_ij / sqrt(C_ii · C_jj)`
//! - a failed factorisation is retried once on `C + 1e-6·I`
//!
//! Every repair is logged. Input repairs are recorded in
//! [`CorrelationMatrix::repairs`]; the factor returned by
//! [`CorrelationMatrix::cholesky`] carries those plus any regularisation in
//! [`CholeskyFactor::repairs`].
//!
//! ## Usage
//!
//! ```
//! use scenario_models::models::hybrid::{CorrelationMatrix, CorrelationPreset};
//!
//! let corr = CorrelationMatrix::from_preset(CorrelationPreset::Ahlgrim2005);
//! assert_eq!(corr.dim(), 5);
//! assert_eq!(corr.names()[0], "short_rate");
//!
//! let chol = corr.cholesky().unwrap();
//! let w = chol.transform(&[1.0, 0.0, 0.0, 0.0, 0.0]);
//! assert!((w[3] - 0.80).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

use scenario_core::types::CorrelationError;

/// Diagonal shift used by the single regularisation retry.
pub const REGULARISATION_EPSILON: f64 = 1e-6;

/// Tolerance for symmetry and unit-diagonal checks.
const REPAIR_TOLERANCE: f64 = 1e-8;

/// Factor order of the built-in presets.
pub const DEFAULT_FACTORS: [&str; 5] = [
    "short_rate",
    "inflation",
    "real_estate",
    "long_rate",
    "equity",
];

/// Built-in cross-asset correlation structures over [`DEFAULT_FACTORS`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationPreset {
    /// Ahlgrim, D'Arcy & Gorvett (2005) estimates
    #[default]
    Ahlgrim2005,
    /// Dampened correlations
    Conservative,
    /// Crisis-level correlations
    Stress,
}

impl CorrelationPreset {
    /// Row-major 5×5 matrix.
    pub fn matrix(&self) -> [[f64; 5]; 5] {
        match self {
            CorrelationPreset::Ahlgrim2005 => [
                [1.00, 0.25, 0.35, 0.80, 0.15],
                [0.25, 1.00, 0.45, 0.30, 0.10],
                [0.35, 0.45, 1.00, 0.40, 0.50],
                [0.80, 0.30, 0.40, 1.00, 0.20],
                [0.15, 0.10, 0.50, 0.20, 1.00],
            ],
            CorrelationPreset::Conservative => [
                [1.00, 0.15, 0.20, 0.70, 0.10],
                [0.15, 1.00, 0.30, 0.20, 0.05],
                [0.20, 0.30, 1.00, 0.25, 0.35],
                [0.70, 0.20, 0.25, 1.00, 0.15],
                [0.10, 0.05, 0.35, 0.15, 1.00],
            ],
            CorrelationPreset::Stress => [
                [1.00, 0.40, 0.50, 0.90, 0.25],
                [0.40, 1.00, 0.60, 0.45, 0.20],
                [0.50, 0.60, 1.00, 0.55, 0.65],
                [0.90, 0.45, 0.55, 1.00, 0.30],
                [0.25, 0.20, 0.65, 0.30, 1.00],
            ],
        }
    }
}

/// Adjustment applied to make an input usable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairAction {
    /// Replaced by its symmetric part
    Symmetrised,
    /// Rescaled to a unit diagonal
    DiagonalNormalised,
    /// Shifted by `1e-6·I` before factorisation
    Regularised,
}

/// Square, symmetric, unit-diagonal matrix with named factors.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrelationMatrix {
    names: Vec<String>,
    data: Vec<f64>,
    dim: usize,
    repairs: Vec<RepairAction>,
}

impl CorrelationMatrix {
    /// Validate, repair and wrap `rows`.
    ///
    /// # Errors
    ///
    /// * `NotSquare` - ragged or non-square rows
    /// * `NameCount` - `names.len()` differs from the dimension
    /// * `InvalidDiagonal` - a diagonal entry is non-positive or not finite
    pub fn new(names: Vec<String>, rows: &[Vec<f64>]) -> Result<Self, CorrelationError> {
        let dim = rows.len();
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != dim) {
            return Err(CorrelationError::NotSquare {
                rows: dim,
                row,
                cols: r.len(),
            });
        }
        if names.len() != dim {
            return Err(CorrelationError::NameCount {
                expected: dim,
                got: names.len(),
            });
        }

        let mut data: Vec<f64> = rows.iter().flatten().copied().collect();
        let mut repairs = Vec::new();

        let asymmetric = (0..dim).any(|i| {
            ((i + 1)..dim).any(|j| (data[i * dim + j] - data[j * dim + i]).abs() > REPAIR_TOLERANCE)
        });
        if asymmetric {
            warn!("correlation matrix is not symmetric, symmetrising");
            for i in 0..dim {
                for j in (i + 1)..dim {
                    let avg = 0.5 * (data[i * dim + j] + data[j * dim + i]);
                    data[i * dim + j] = avg;
                    data[j * dim + i] = avg;
                }
            }
            repairs.push(RepairAction::Symmetrised);
        }

        let diag: Vec<f64> = (0..dim).map(|i| data[i * dim + i]).collect();
        if let Some(index) = diag.iter().position(|d| !d.is_finite() || *d <= 0.0) {
            return Err(CorrelationError::InvalidDiagonal {
                index,
                value: diag[index],
            });
        }
        if diag.iter().any(|d| (d - 1.0).abs() > REPAIR_TOLERANCE) {
            warn!("correlation matrix diagonal is not 1, normalising");
            let sd: Vec<f64> = diag.iter().map(|d| d.sqrt()).collect();
            for i in 0..dim {
                for j in 0..dim {
                    data[i * dim + j] /= sd[i] * sd[j];
                }
            }
            repairs.push(RepairAction::DiagonalNormalised);
        }

        Ok(Self {
            names,
            data,
            dim,
            repairs,
        })
    }

    /// One of the built-in matrices over [`DEFAULT_FACTORS`].
    pub fn from_preset(preset: CorrelationPreset) -> Self {
        let m = preset.matrix();
        Self {
            names: DEFAULT_FACTORS.iter().map(|s| s.to_string()).collect(),
            data: m.iter().flatten().copied().collect(),
            dim: 5,
            repairs: Vec::new(),
        }
    }

    /// Uncorrelated factors.
    pub fn identity(names: Vec<String>) -> Self {
        let dim = names.len();
        let mut data = vec![0.0; dim * dim];
        for i in 0..dim {
            data[i * dim + i] = 1.0;
        }
        Self {
            names,
            data,
            dim,
            repairs: Vec::new(),
        }
    }

    /// Matrix dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Factor names in matrix order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Element `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.dim + j]
    }

    /// Row-major elements.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Rows as nested vectors.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.data.chunks(self.dim.max(1)).map(<[f64]>::to_vec).collect()
    }

    /// Repairs applied to the input matrix.
    pub fn repairs(&self) -> &[RepairAction] {
        &self.repairs
    }

    /// Position of factor `name`.
    pub fn index_of(&self, name: &str) -> Result<usize, CorrelationError> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| CorrelationError::UnknownFactor {
                name: name.to_string(),
                available: self.names.join(", "),
            })
    }

    /// Cholesky factor, retrying once on `C + 1e-6·I`.
    ///
    /// A successful retry appends [`RepairAction::Regularised`] to the
    /// factor's repair history.
    ///
    /// # Errors
    ///
    /// `NotPositiveDefinite` when the regularised matrix also fails.
    pub fn cholesky(&self) -> Result<CholeskyFactor, CorrelationError> {
        match cholesky_lower(&self.data, self.dim, 0.0) {
            Ok(lower) => Ok(CholeskyFactor {
                data: lower,
                dim: self.dim,
                repairs: self.repairs.clone(),
            }),
            Err(first) => {
                warn!(%first, "correlation matrix is not positive definite, adding small diagonal");
                let lower = cholesky_lower(&self.data, self.dim, REGULARISATION_EPSILON)?;
                let mut repairs = self.repairs.clone();
                repairs.push(RepairAction::Regularised);
                Ok(CholeskyFactor {
                    data: lower,
                    dim: self.dim,
                    repairs,
                })
            }
        }
    }

    /// Same matrix with factors permuted: position `k` of the result holds
    /// factor `new_order[k]` of `self`.
    pub fn reorder(&self, new_order: &[usize]) -> Result<Self, CorrelationError> {
        if new_order.len() != self.dim {
            return Err(CorrelationError::InvalidOrder(format!(
                "expected {} indices, got {}",
                self.dim,
                new_order.len()
            )));
        }
        let mut seen = vec![false; self.dim];
        for &i in new_order {
            if i >= self.dim || std::mem::replace(&mut seen[i], true) {
                return Err(CorrelationError::InvalidOrder(format!(
                    "{:?} is not a permutation of 0..{}",
                    new_order, self.dim
                )));
            }
        }
        let n = self.dim;
        let mut data = vec![0.0; n * n];
        for (a, &i) in new_order.iter().enumerate() {
            for (b, &j) in new_order.iter().enumerate() {
                data[a * n + b] = self.get(i, j);
            }
        }
        Ok(Self {
            names: new_order.iter().map(|&i| self.names[i].clone()).collect(),
            data,
            dim: n,
            repairs: self.repairs.clone(),
        })
    }

    /// [`reorder`](Self::reorder) by factor names.
    pub fn reorder_by_name(&self, names: &[&str]) -> Result<Self, CorrelationError> {
        let order = names
            .iter()
            .map(|n| self.index_of(n))
            .collect::<Result<Vec<_>, _>>()?;
        self.reorder(&order)
    }
}

/// Plain Cholesky of `data + shift·I`.
fn cholesky_lower(data: &[f64], n: usize, shift: f64) -> Result<Vec<f64>, CorrelationError> {
    let mut lower = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| lower[i * n + k] * lower[j * n + k]).sum();
            if i == j {
                let pivot = data[i * n + i] + shift - sum;
                if !(pivot > 0.0) || !pivot.is_finite() {
                    return Err(CorrelationError::NotPositiveDefinite { pivot: i, value: pivot });
                }
                lower[i * n + i] = pivot.sqrt();
            } else {
                lower[i * n + j] = (data[i * n + j] - sum) / lower[j * n + j];
            }
        }
    }
    Ok(lower)
}

/// Lower-triangular factor `L` with `C ≈ L·Lᵀ`.
#[derive(Clone, Debug, PartialEq)]
pub struct CholeskyFactor {
    data: Vec<f64>,
    dim: usize,
    repairs: Vec<RepairAction>,
}

impl CholeskyFactor {
    /// Dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Element `(i, j)`, zero above the diagonal.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if j > i {
            0.0
        } else {
            self.data[i * self.dim + j]
        }
    }

    /// Every repair behind this factor, input repairs first.
    pub fn repairs(&self) -> &[RepairAction] {
        &self.repairs
    }

    /// True when the factor belongs to the regularised matrix.
    pub fn is_regularised(&self) -> bool {
        self.repairs.contains(&RepairAction::Regularised)
    }

    /// `W = L · Z`.
    ///
    /// # Panics
    ///
    /// Panics if `z.len() < self.dim()`.
    pub fn transform(&self, z: &[f64]) -> Vec<f64> {
        let mut w = z[..self.dim].to_vec();
        self.transform_inplace(&mut w);
        w
    }

    /// `z ← L · z`, working from the last row up so no buffer is needed.
    pub fn transform_inplace(&self, z: &mut [f64]) {
        let n = self.dim;
        for i in (0..n).rev() {
            let row = &self.data[i * n..i * n + i + 1];
            z[i] = row.iter().zip(z.iter()).map(|(l, x)| l * x).sum();
        }
    }

    /// `L · Lᵀ`, row-major.
    pub fn reconstruct(&self) -> Vec<f64> {
        let n = self.dim;
        let mut out = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                out[i * n + j] = (0..=i.min(j)).map(|k| self.get(i, k) * self.get(j, k)).sum();
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{}", i)).collect()
    }

    // ========================================
    // Construction and repair
    // ========================================

    #[test]
    fn test_rejects_non_square() {
        let err = CorrelationMatrix::new(names(2), &[vec![1.0, 0.5], vec![0.5]]).unwrap_err();
        assert!(matches!(err, CorrelationError::NotSquare { row: 1, .. }));
    }

    #[test]
    fn test_rejects_name_count() {
        let err = CorrelationMatrix::new(names(3), &[vec![1.0, 0.5], vec![0.5, 1.0]]).unwrap_err();
        assert_eq!(err, CorrelationError::NameCount { expected: 2, got: 3 });
    }

    #[test]
    fn test_symmetrises() {
        let corr = CorrelationMatrix::new(names(2), &[vec![1.0, 0.4], vec![0.6, 1.0]]).unwrap();
        assert_relative_eq!(corr.get(0, 1), 0.5);
        assert_relative_eq!(corr.get(1, 0), 0.5);
        assert_eq!(corr.repairs(), &[RepairAction::Symmetrised]);
    }

    #[test]
    fn test_normalises_diagonal() {
        // covariance with variances 4 and 9
        let corr = CorrelationMatrix::new(names(2), &[vec![4.0, 3.0], vec![3.0, 9.0]]).unwrap();
        assert_relative_eq!(corr.get(0, 0), 1.0);
        assert_relative_eq!(corr.get(1, 1), 1.0);
        assert_relative_eq!(corr.get(0, 1), 0.5);
        assert_eq!(corr.repairs(), &[RepairAction::DiagonalNormalised]);
    }

    #[test]
    fn test_rejects_zero_diagonal() {
        let err = CorrelationMatrix::new(names(2), &[vec![1.0, 0.0], vec![0.0, 0.0]]).unwrap_err();
        assert!(matches!(err, CorrelationError::InvalidDiagonal { index: 1, .. }));
    }

    // ========================================
    // Cholesky
    // ========================================

    #[test]
    fn test_presets_reconstruct() {
        for preset in [
            CorrelationPreset::Ahlgrim2005,
            CorrelationPreset::Conservative,
            CorrelationPreset::Stress,
        ] {
            let corr = CorrelationMatrix::from_preset(preset);
            let chol = corr.cholesky().unwrap();
            assert!(!chol.is_regularised());
            assert!(chol.repairs().is_empty());
            for (a, b) in chol.reconstruct().iter().zip(corr.as_slice()) {
                assert_relative_eq!(a, b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_singular_matrix_regularised() {
        // perfectly correlated: PSD but singular
        let corr = CorrelationMatrix::new(names(2), &[vec![1.0, 1.0], vec![1.0, 1.0]]).unwrap();
        let chol = corr.cholesky().unwrap();
        assert!(chol.is_regularised());
        assert_eq!(chol.repairs(), &[RepairAction::Regularised]);
        assert!(corr.repairs().is_empty());
        assert_relative_eq!(chol.reconstruct()[1], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_factor_keeps_input_repairs_before_regularisation() {
        // asymmetric and singular once symmetrised
        let corr = CorrelationMatrix::new(names(2), &[vec![1.0, 0.98], vec![1.02, 1.0]]).unwrap();
        assert_eq!(corr.repairs(), &[RepairAction::Symmetrised]);
        let chol = corr.cholesky().unwrap();
        assert_eq!(
            chol.repairs(),
            &[RepairAction::Symmetrised, RepairAction::Regularised]
        );
    }

    #[test]
    fn test_indefinite_fails() {
        let rows = vec![
            vec![1.0, 0.9, -0.9],
            vec![0.9, 1.0, 0.9],
            vec![-0.9, 0.9, 1.0],
        ];
        let corr = CorrelationMatrix::new(names(3), &rows).unwrap();
        assert!(matches!(
            corr.cholesky(),
            Err(CorrelationError::NotPositiveDefinite { .. })
        ));
    }

    #[test]
    fn test_transform_inplace_matches_transform() {
        let chol = CorrelationMatrix::from_preset(CorrelationPreset::Stress)
            .cholesky()
            .unwrap();
        let z = [0.3, -1.2, 0.7, 2.0, -0.4];
        let w = chol.transform(&z);
        let mut zz = z;
        chol.transform_inplace(&mut zz);
        for (a, b) in w.iter().zip(zz.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-15);
        }
        // first factor passes through unchanged
        assert_relative_eq!(w[0], 0.3);
    }

    // ========================================
    // Reordering
    // ========================================

    #[test]
    fn test_reorder_by_name() {
        let corr = CorrelationMatrix::from_preset(CorrelationPreset::Ahlgrim2005);
        let moved = corr
            .reorder_by_name(&["equity", "short_rate", "inflation", "real_estate", "long_rate"])
            .unwrap();
        assert_eq!(moved.names()[0], "equity");
        assert_relative_eq!(moved.get(0, 1), 0.15);
        assert_relative_eq!(moved.get(1, 4), 0.80);
        assert!(moved.cholesky().is_ok());
    }

    #[test]
    fn test_reorder_rejects_non_permutation() {
        let corr = CorrelationMatrix::from_preset(CorrelationPreset::Ahlgrim2005);
        assert!(corr.reorder(&[0, 1, 2, 3]).is_err());
        assert!(corr.reorder(&[0, 1, 2, 3, 3]).is_err());
        assert!(corr.reorder(&[0, 1, 2, 3, 7]).is_err());
        assert!(matches!(
            corr.index_of("gold"),
            Err(CorrelationError::UnknownFactor { .. })
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Any Gram matrix of random unit vectors factors and reconstructs.
        #[test]
        fn prop_gram_matrix_reconstructs(
            raw in proptest::collection::vec(-1.0f64..1.0, 12)
        ) {
            // four 3-vectors plus a ridge so the Gram matrix is definite
            let vecs: Vec<[f64; 3]> = raw.chunks(3).map(|c| [c[0], c[1], c[2]]).collect();
            let mut rows = vec![vec![0.0; 4]; 4];
            for i in 0..4 {
                for j in 0..4 {
                    let dot: f64 = (0..3).map(|k| vecs[i][k] * vecs[j][k]).sum();
                    rows[i][j] = dot + if i == j { 0.5 } else { 0.0 };
                }
            }
            let corr = CorrelationMatrix::new(names(4), &rows).unwrap();
            let chol = corr.cholesky().unwrap();
            for (a, b) in chol.reconstruct().iter().zip(corr.as_slice()) {
                prop_assert!((a - b).abs() < 1e-10);
            }
            for i in 0..4 {
                prop_assert!((corr.get(i, i) - 1.0).abs() < 1e-12);
            }
        }
    }
}
