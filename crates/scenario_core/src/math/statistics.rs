//! Descriptive statistics over scenario samples.
//!
//! Conventions: sample standard deviation uses `n - 1`, percentiles use
//! linear interpolation between closest ranks.

use serde::{Deserialize, Serialize};

/// Arithmetic mean, `NaN` for an empty sample.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (`n - 1` denominator), `NaN` below two observations.
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64
}

/// Sample standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Percentile `p` in `[0, 100]` with linear interpolation.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    percentile_sorted(&sorted, p)
}

/// Percentile of an already ascending sample.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let w = rank - lo as f64;
    sorted[lo] + w * (sorted[hi] - sorted[lo])
}

/// Median.
pub fn median(values: &[f64]) -> f64 {
    percentile(values, 50.0)
}

/// Pearson correlation, `NaN` when either sample is constant.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return f64::NAN;
    }
    let (mx, my) = (mean(&x[..n]), mean(&y[..n]));
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for i in 0..n {
        let dx = x[i] - mx;
        let dy = y[i] - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let denom = (sxx * syy).sqrt();
    if denom == 0.0 {
        f64::NAN
    } else {
        sxy / denom
    }
}

/// Pairwise Pearson matrix over equally long series, row-major `k × k`.
pub fn correlation_matrix(series: &[&[f64]]) -> Vec<f64> {
    let k = series.len();
    let mut out = vec![0.0; k * k];
    for i in 0..k {
        out[i * k + i] = 1.0;
        for j in (i + 1)..k {
            let rho = pearson(series[i], series[j]);
            out[i * k + j] = rho;
            out[j * k + i] = rho;
        }
    }
    out
}

/// Five-number style summary of one indicator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    /// Mean
    pub mean: f64,
    /// Sample standard deviation
    pub std: f64,
    /// Minimum
    pub min: f64,
    /// Maximum
    pub max: f64,
    /// Median
    pub median: f64,
}

impl SummaryStatistics {
    /// Summarise a sample.
    pub fn from_sample(values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self {
            mean: mean(values),
            std: std_dev(values),
            min: sorted.first().copied().unwrap_or(f64::NAN),
            max: sorted.last().copied().unwrap_or(f64::NAN),
            median: percentile_sorted(&sorted, 50.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_and_std() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(mean(&xs), 2.5);
        assert_relative_eq!(std_dev(&xs), (5.0f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert!(std_dev(&[1.0]).is_nan());
    }

    #[test]
    fn test_percentile_interpolates() {
        let xs = [4.0, 1.0, 3.0, 2.0];
        assert_relative_eq!(percentile(&xs, 0.0), 1.0);
        assert_relative_eq!(percentile(&xs, 100.0), 4.0);
        assert_relative_eq!(percentile(&xs, 25.0), 1.75);
        assert_relative_eq!(median(&xs), 2.5);
    }

    #[test]
    fn test_pearson_perfect_and_constant() {
        let x = [1.0, 2.0, 3.0];
        assert_relative_eq!(pearson(&x, &[2.0, 4.0, 6.0]), 1.0, epsilon = 1e-12);
        assert_relative_eq!(pearson(&x, &[3.0, 2.0, 1.0]), -1.0, epsilon = 1e-12);
        assert!(pearson(&x, &[1.0, 1.0, 1.0]).is_nan());
    }

    #[test]
    fn test_correlation_matrix_symmetric() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [1.0, 3.0, 2.0, 4.0];
        let m = correlation_matrix(&[&a, &b]);
        assert_eq!(m[0], 1.0);
        assert_eq!(m[1], m[2]);
        assert_relative_eq!(m[1], 0.8, epsilon = 1e-12);
    }

    #[test]
    fn test_summary() {
        let s = SummaryStatistics::from_sample(&[3.0, 1.0, 2.0]);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 3.0);
        assert_eq!(s.median, 2.0);
        assert_relative_eq!(s.mean, 2.0);
    }
}
