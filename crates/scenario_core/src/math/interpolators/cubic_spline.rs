//! Natural cubic spline interpolation.

use super::Interpolator;
use crate::types::InterpolationError;
use num_traits::Float;

/// Segment polynomial `y = a + b·dx + c·dx² + d·dx³`, `dx = x - x_i`.
#[derive(Debug, Clone, Copy)]
struct SplineCoeffs<T: Float> {
    a: T,
    b: T,
    c: T,
    d: T,
}

impl<T: Float> SplineCoeffs<T> {
    #[inline]
    fn eval(&self, dx: T) -> T {
        self.a + dx * (self.b + dx * (self.c + dx * self.d))
    }
}

/// Natural cubic spline (zero second derivative at both ends).
///
/// Input points are sorted by abscissa on construction; repeated abscissae
/// are rejected. At least 3 points are required.
///
/// # Example
///
/// ```
/// use scenario_core::math::interpolators::{CubicSplineInterpolator, Interpolator};
///
/// let spline = CubicSplineInterpolator::new(&[0.0, 1.0, 2.0], &[0.0, 1.0, 4.0]).unwrap();
/// let y = spline.interpolate(1.5).unwrap();
/// assert!(y > 1.0 && y < 4.0);
///
/// assert!(CubicSplineInterpolator::new(&[0.0, 1.0], &[0.0, 1.0]).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct CubicSplineInterpolator<T: Float> {
    xs: Vec<T>,
    coeffs: Vec<SplineCoeffs<T>>,
}

impl<T: Float> CubicSplineInterpolator<T> {
    /// Build the spline through `(xs[i], ys[i])`.
    ///
    /// # Errors
    ///
    /// * `InvalidInput` - lengths differ or a value is not finite
    /// * `InsufficientData` - fewer than 3 points
    /// * `NonMonotonicData` - two points share an abscissa
    pub fn new(xs: &[T], ys: &[T]) -> Result<Self, InterpolationError> {
        if xs.len() != ys.len() {
            return Err(InterpolationError::InvalidInput(format!(
                "xs and ys must have same length: got {} and {}",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() < 3 {
            return Err(InterpolationError::InsufficientData {
                got: xs.len(),
                need: 3,
            });
        }
        if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
            return Err(InterpolationError::InvalidInput(
                "spline knots must be finite".to_string(),
            ));
        }

        let mut pairs: Vec<(T, T)> = xs.iter().copied().zip(ys.iter().copied()).collect();
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        let (sorted_xs, sorted_ys): (Vec<T>, Vec<T>) = pairs.into_iter().unzip();

        if let Some(index) = sorted_xs.windows(2).position(|w| w[1] <= w[0]) {
            return Err(InterpolationError::NonMonotonicData { index: index + 1 });
        }

        let coeffs = Self::compute_coefficients(&sorted_xs, &sorted_ys);
        Ok(Self {
            xs: sorted_xs,
            coeffs,
        })
    }

    /// Solve the tridiagonal system for the knot second derivatives `M`
    /// (Thomas algorithm, `M[0] = M[n-1] = 0`) and convert to segment
    /// polynomials.
    fn compute_coefficients(xs: &[T], ys: &[T]) -> Vec<SplineCoeffs<T>> {
        let n = xs.len();
        let two = T::one() + T::one();
        let six = two * (two + T::one());

        let h: Vec<T> = xs.windows(2).map(|w| w[1] - w[0]).collect();
        let slope: Vec<T> = (0..n - 1).map(|i| (ys[i + 1] - ys[i]) / h[i]).collect();

        // Row j of the system belongs to knot j + 1:
        //   h[j]·M[j] + 2(h[j] + h[j+1])·M[j+1] + h[j+1]·M[j+2] = 6(slope[j+1] - slope[j])
        let interior = n - 2;
        let mut c_prime = vec![T::zero(); interior];
        let mut d_prime = vec![T::zero(); interior];
        for j in 0..interior {
            let diag = two * (h[j] + h[j + 1]);
            let rhs = six * (slope[j + 1] - slope[j]);
            let (denom, carried) = if j == 0 {
                (diag, rhs)
            } else {
                (
                    diag - h[j] * c_prime[j - 1],
                    rhs - h[j] * d_prime[j - 1],
                )
            };
            c_prime[j] = h[j + 1] / denom;
            d_prime[j] = carried / denom;
        }

        let mut m = vec![T::zero(); n];
        for j in (0..interior).rev() {
            m[j + 1] = d_prime[j] - c_prime[j] * m[j + 2];
        }
        // the last row has no super-diagonal; m[n-1] = 0 makes the term vanish

        (0..n - 1)
            .map(|i| SplineCoeffs {
                a: ys[i],
                b: slope[i] - h[i] * (two * m[i] + m[i + 1]) / six,
                c: m[i] / two,
                d: (m[i + 1] - m[i]) / (six * h[i]),
            })
            .collect()
    }

    /// Index `i` with `xs[i] <= x < xs[i+1]`, clamped to `[0, n-2]`.
    #[inline]
    fn find_segment(&self, x: T) -> usize {
        let pos = self.xs.partition_point(|&xi| xi <= x);
        if pos == 0 {
            0
        } else if pos >= self.xs.len() {
            self.xs.len() - 2
        } else {
            pos - 1
        }
    }

    /// Evaluate, continuing the boundary polynomials outside the domain.
    pub fn extrapolate(&self, x: T) -> T {
        let i = self.find_segment(x);
        self.coeffs[i].eval(x - self.xs[i])
    }

    /// Sorted abscissae.
    #[inline]
    pub fn xs(&self) -> &[T] {
        &self.xs
    }

    /// Number of knots.
    #[inline]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Always false for a constructed spline.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }
}

impl<T: Float> Interpolator<T> for CubicSplineInterpolator<T> {
    fn interpolate(&self, x: T) -> Result<T, InterpolationError> {
        let (x_min, x_max) = self.domain();
        if x < x_min || x > x_max || x.is_nan() {
            return Err(InterpolationError::OutOfBounds {
                x: x.to_f64().unwrap_or(f64::NAN),
                min: x_min.to_f64().unwrap_or(f64::NAN),
                max: x_max.to_f64().unwrap_or(f64::NAN),
            });
        }
        Ok(self.extrapolate(x))
    }

    #[inline]
    fn domain(&self) -> (T, T) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    // ========================================
    // Construction
    // ========================================

    #[test]
    fn test_new_rejects_two_points() {
        match CubicSplineInterpolator::new(&[0.0, 1.0], &[0.0, 1.0]) {
            Err(InterpolationError::InsufficientData { got, need }) => {
                assert_eq!(got, 2);
                assert_eq!(need, 3);
            }
            other => panic!("Expected InsufficientData, got {:?}", other),
        }
    }

    #[test]
    fn test_new_rejects_mismatched_lengths() {
        let result = CubicSplineInterpolator::new(&[0.0, 1.0, 2.0], &[0.0, 1.0]);
        assert!(matches!(result, Err(InterpolationError::InvalidInput(_))));
    }

    #[test]
    fn test_new_rejects_duplicate_abscissa() {
        let result = CubicSplineInterpolator::new(&[0.0, 1.0, 1.0, 2.0], &[0.0, 1.0, 1.5, 2.0]);
        assert!(matches!(
            result,
            Err(InterpolationError::NonMonotonicData { index: 2 })
        ));
    }

    #[test]
    fn test_new_sorts_input() {
        let spline = CubicSplineInterpolator::new(&[3.0, 1.0, 2.0, 0.0], &[9.0, 1.0, 4.0, 0.0])
            .unwrap();
        assert_eq!(spline.xs(), &[0.0, 1.0, 2.0, 3.0]);
    }

    // ========================================
    // Evaluation
    // ========================================

    #[test]
    fn test_passes_through_knots() {
        let xs = [0.0, 0.5, 1.7, 3.0, 4.2];
        let ys = [1.0, 0.99, 0.96, 0.92, 0.88];
        let spline = CubicSplineInterpolator::new(&xs, &ys).unwrap();
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert_relative_eq!(spline.interpolate(*x).unwrap(), *y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_three_points_single_interior() {
        // With one interior knot M[1] = 3 (s1 - s0) / (h0 + h1)
        let spline = CubicSplineInterpolator::new(&[0.0, 1.0, 2.0], &[0.0, 1.0, 4.0]).unwrap();
        // Symmetric knots: midpoint of the first segment is (0 + 1)/2 - M1·h²/16
        let m1 = 3.0 * (3.0 - 1.0) / 2.0;
        let expected = 0.5 - m1 / 16.0;
        assert_relative_eq!(spline.interpolate(0.5).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_reproduces_linear_data_exactly() {
        let xs: Vec<f64> = (0..8).map(|i| i as f64 * 0.7).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 - 0.3 * x).collect();
        let spline = CubicSplineInterpolator::new(&xs, &ys).unwrap();
        assert_relative_eq!(spline.interpolate(2.45).unwrap(), 2.0 - 0.3 * 2.45, epsilon = 1e-12);
    }

    #[test]
    fn test_out_of_bounds() {
        let spline = CubicSplineInterpolator::new(&[0.0, 1.0, 2.0], &[0.0, 1.0, 4.0]).unwrap();
        assert!(matches!(
            spline.interpolate(2.5),
            Err(InterpolationError::OutOfBounds { .. })
        ));
        assert!(spline.extrapolate(2.5).is_finite());
    }

    #[test]
    fn test_second_derivative_continuous_at_interior_knot() {
        let spline =
            CubicSplineInterpolator::new(&[0.0, 1.0, 2.5, 4.0], &[0.0, 2.0, 1.0, 3.0]).unwrap();
        let h = 1e-4;
        let second = |x: f64| {
            (spline.extrapolate(x + h) - 2.0 * spline.extrapolate(x) + spline.extrapolate(x - h))
                / (h * h)
        };
        assert_relative_eq!(second(1.0 - 2.0 * h), second(1.0 + 2.0 * h), epsilon = 1e-2);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_knots_reproduced(ys in proptest::collection::vec(-1.0f64..1.0, 3..20)) {
            let xs: Vec<f64> = (0..ys.len()).map(|i| i as f64).collect();
            let spline = CubicSplineInterpolator::new(&xs, &ys).unwrap();
            for (x, y) in xs.iter().zip(ys.iter()) {
                prop_assert!((spline.interpolate(*x).unwrap() - y).abs() < 1e-10);
            }
        }
    }
}
