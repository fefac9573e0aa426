//! Dense scenario-by-step matrix.
//!
//! Every path-valued quantity in the generator (short rates, deflators,
//! residuals, returns) is a `[scenario × step]` matrix stored row-major so
//! that a scenario's path is a contiguous slice.

use serde::{Deserialize, Serialize};

use super::error::ScenarioError;

/// Row-major `[scenario × step]` matrix of `f64`.
///
/// # Examples
///
/// ```
/// use scenario_core::types::PathMatrix;
///
/// let mut m = PathMatrix::zeros(2, 3);
/// m.set(1, 2, 4.0);
/// assert_eq!(m.get(1, 2), 4.0);
/// assert_eq!(m.row(1), &[0.0, 0.0, 4.0]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl PathMatrix {
    /// Matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    /// Matrix with every element equal to `value`.
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Wrap a row-major buffer.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` when `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, ScenarioError> {
        if data.len() != rows * cols {
            return Err(ScenarioError::dimension_mismatch(
                "PathMatrix::from_vec",
                rows * cols,
                data.len(),
            ));
        }
        Ok(Self { rows, cols, data })
    }

    /// Build from equally long rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, ScenarioError> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(ScenarioError::dimension_mismatch(
                    format!("PathMatrix::from_rows row {}", i),
                    cols,
                    row.len(),
                ));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// Number of scenarios.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of steps.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// True when the matrix holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element at (scenario, step).
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    /// Overwrite element at (scenario, step).
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    /// One scenario path.
    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// One scenario path, mutable.
    #[inline]
    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        let cols = self.cols;
        &mut self.data[row * cols..(row + 1) * cols]
    }

    /// Iterate over scenario paths.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact(0) panics, and a zero-column matrix has no elements anyway
        self.data
            .chunks_exact(self.cols.max(1))
            .take(if self.cols == 0 { 0 } else { self.rows })
    }

    /// Cross-section of all scenarios at one step.
    pub fn column(&self, col: usize) -> Vec<f64> {
        (0..self.rows).map(|r| self.get(r, col)).collect()
    }

    /// Flat row-major view.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Flat row-major view, mutable.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Mean across scenarios at each step.
    pub fn column_means(&self) -> Vec<f64> {
        let mut means = vec![0.0; self.cols];
        if self.rows == 0 {
            return means;
        }
        for row in self.iter_rows() {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        let n = self.rows as f64;
        means.iter_mut().for_each(|m| *m /= n);
        means
    }

    /// Grand mean of all elements.
    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().sum::<f64>() / self.data.len() as f64
    }

    /// Smallest element, `NaN` when empty.
    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::NAN, f64::min)
    }

    /// Apply `f` element-wise.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Keep the listed scenarios, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        let mut data = Vec::with_capacity(rows.len() * self.cols);
        for &r in rows {
            data.extend_from_slice(self.row(r));
        }
        Self {
            rows: rows.len(),
            cols: self.cols,
            data,
        }
    }

    /// Append the scenarios of `other` below this matrix.
    pub fn append_rows(&mut self, other: &PathMatrix) -> Result<(), ScenarioError> {
        if other.rows > 0 && self.rows > 0 && other.cols != self.cols {
            return Err(ScenarioError::dimension_mismatch(
                "PathMatrix::append_rows",
                self.cols,
                other.cols,
            ));
        }
        if self.rows == 0 {
            self.cols = other.cols;
        }
        self.data.extend_from_slice(&other.data);
        self.rows += other.rows;
        Ok(())
    }

    /// Drop scenarios beyond the first `rows`.
    pub fn truncate_rows(&mut self, rows: usize) {
        if rows < self.rows {
            self.rows = rows;
            self.data.truncate(rows * self.cols);
        }
    }
}
