//! Shared statistical primitives.
//!
//! Rolling estimates use boundary-clamped windows: near the edges the window
//! shrinks to stay in bounds rather than padding or wrapping.

/// Arithmetic mean; 0 for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance; 0 for slices shorter than 2.
#[must_use]
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mu = mean(values);
    values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
#[inline]
#[must_use]
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Rolling population variance with a boundary-clamped window of the given
/// radius around each index.
#[must_use]
pub fn rolling_variance(values: &[f64], radius: usize) -> Vec<f64> {
    let n = values.len();
    (0..n)
        .map(|i| {
            let start = i.saturating_sub(radius);
            let end = (i + radius).min(n.saturating_sub(1));
            variance(&values[start..=end])
        })
        .collect()
}

/// Rolling population standard deviation; see [`rolling_variance`].
#[must_use]
pub fn rolling_std(values: &[f64], radius: usize) -> Vec<f64> {
    rolling_variance(values, radius)
        .into_iter()
        .map(f64::sqrt)
        .collect()
}

/// Successive differences `x[i+1] - x[i]`; empty for slices shorter than 2.
#[must_use]
pub fn first_differences(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Least-squares line fit against the index axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

/// Fit `y = intercept + slope * i` over indices `0..n`.
///
/// For fewer than 2 points the fit is flat with `r_squared` 0.
#[must_use]
pub fn linear_fit(values: &[f64]) -> LinearFit {
    let n = values.len();
    if n < 2 {
        return LinearFit {
            slope: 0.0,
            intercept: values.first().copied().unwrap_or(0.0),
            r_squared: 0.0,
        };
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxx += dx * dx;
        sxy += dx * (y - y_mean);
    }
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    let intercept = y_mean - slope * x_mean;

    let ss_tot: f64 = values.iter().map(|y| (y - y_mean).powi(2)).sum();
    let ss_res: f64 = values
        .iter()
        .enumerate()
        .map(|(i, y)| (y - (intercept + slope * i as f64)).powi(2))
        .sum();
    let r_squared = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else {
        0.0
    };

    LinearFit {
        slope,
        intercept,
        r_squared,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_variance() {
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&xs), 5.0);
        assert_eq!(variance(&xs), 4.0);
        assert_eq!(std_dev(&xs), 2.0);
    }

    #[test]
    fn rolling_std_clamps_at_boundaries() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let rs = rolling_std(&xs, 1);
        assert_eq!(rs.len(), 5);
        // Interior windows of [x-1, x, x+1] all share the same spread.
        assert!((rs[1] - rs[2]).abs() < 1e-12);
        // Edge windows shrink to two points.
        assert!(rs[0] < rs[1]);
    }

    #[test]
    fn linear_fit_exact_line() {
        let xs: Vec<f64> = (0..10).map(|i| 3.0 + 2.0 * i as f64).collect();
        let fit = linear_fit(&xs);
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 3.0).abs() < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
    }

    #[test]
    fn linear_fit_flat_series() {
        let fit = linear_fit(&[5.0, 5.0, 5.0]);
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.r_squared, 0.0);
    }

    #[test]
    fn first_differences_shape() {
        assert_eq!(first_differences(&[1.0, 3.0, 6.0]), vec![2.0, 3.0]);
        assert!(first_differences(&[1.0]).is_empty());
    }
}
