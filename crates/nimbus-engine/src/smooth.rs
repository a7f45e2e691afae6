//! Solter smoothing engine.
//!
//! Adaptive exponentially-weighted window smoothing: each point is replaced
//! by a weighted average of its window, with weights decaying as
//! `exp(-alpha * |i - j| / r(i))`. The radius `r(i)` adapts to a rolling
//! variance estimate: wider where the series is locally quiet, narrower
//! where it is locally noisy, and shrunk near the boundary so windows never
//! read out of bounds.
//!
//! The smoothed value is a convex combination of its window, so it always
//! lies within the window's min/max; the center point always contributes
//! weight 1, so the normalizer is strictly positive.

use crate::config::SmoothConfig;
use crate::stats::{rolling_variance, variance};

/// Numeric failure while smoothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SmoothError {
    /// NaN or infinite value in the input series.
    #[error("non-finite value at row {index}")]
    NonFinite { index: usize },
}

/// Apply Solter smoothing to one numeric series.
///
/// A `base_radius` of 0 (or a series shorter than 2) is the identity.
///
/// # Errors
/// `SmoothError::NonFinite` when the input contains NaN or an infinity.
pub fn solter(values: &[f64], config: &SmoothConfig) -> Result<Vec<f64>, SmoothError> {
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(SmoothError::NonFinite { index });
    }
    let n = values.len();
    if n < 2 || config.base_radius == 0 {
        return Ok(values.to_vec());
    }

    let global_var = variance(values);
    let local_var = rolling_variance(values, config.variance_radius);
    let max_radius = config.base_radius * config.max_widen.max(1);

    let mut out = Vec::with_capacity(n);
    for (i, center) in values.iter().enumerate() {
        let radius = adaptive_radius(i, n, global_var, local_var[i], max_radius, config);
        if radius == 0 {
            out.push(*center);
            continue;
        }
        let mut weighted_sum = 0.0;
        let mut normalizer = 0.0;
        for j in i - radius..=i + radius {
            let distance = (i as f64 - j as f64).abs();
            let weight = (-config.alpha * distance / radius as f64).exp();
            weighted_sum += weight * values[j];
            normalizer += weight;
        }
        out.push(weighted_sum / normalizer);
    }
    Ok(out)
}

/// Window radius at index `i`: the base radius scaled by how quiet the
/// neighborhood is relative to the whole series, clamped to `max_radius`
/// and to the distance from the series boundary.
fn adaptive_radius(
    i: usize,
    n: usize,
    global_var: f64,
    local_var: f64,
    max_radius: usize,
    config: &SmoothConfig,
) -> usize {
    let ratio = if local_var > 0.0 && global_var > 0.0 {
        (global_var / local_var).sqrt()
    } else {
        config.max_widen.max(1) as f64
    };
    let scaled = (config.base_radius as f64 * ratio).round();
    // Saturating float-to-int conversion keeps huge ratios at max_radius.
    let radius = (scaled as usize).clamp(1, max_radius);
    radius.min(i).min(n - 1 - i)
}

/// Plain moving average with boundary-clamped windows; kept as a simpler
/// alternative smoother with the same shape and convexity guarantees.
#[must_use]
pub fn moving_average(values: &[f64], window_size: usize) -> Vec<f64> {
    let n = values.len();
    if n < 2 || window_size < 2 {
        return values.to_vec();
    }
    let half = window_size.min(n) / 2;
    (0..n)
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half).min(n - 1);
            let window = &values[start..=end];
            window.iter().sum::<f64>() / window.len() as f64
        })
        .collect()
}
