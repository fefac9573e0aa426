//! Interpolator trait shared by the 1D interpolators.

use crate::types::InterpolationError;
use num_traits::Float;

/// One-dimensional interpolation over a closed domain.
pub trait Interpolator<T: Float> {
    /// Value at `x`.
    ///
    /// # Errors
    ///
    /// `InterpolationError::OutOfBounds` when `x` lies outside [`Interpolator::domain`].
    fn interpolate(&self, x: T) -> Result<T, InterpolationError>;

    /// Inclusive `(min, max)` of the abscissae.
    fn domain(&self) -> (T, T);

    /// Evaluate at every point of `xs`.
    fn interpolate_many(&self, xs: &[T]) -> Result<Vec<T>, InterpolationError> {
        xs.iter().map(|&x| self.interpolate(x)).collect()
    }
}
