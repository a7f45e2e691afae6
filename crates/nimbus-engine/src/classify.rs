//! Pattern classifier.
//!
//! Labels one numeric series `trend`, `cyclic`, or `random`:
//! 1. a linear fit whose normalized slope clears the trend threshold and
//!    explains enough variance wins as `trend`;
//! 2. otherwise the strongest non-zero-lag autocorrelation peak above the
//!    cyclic threshold wins as `cyclic`, carrying the peak lag as the period;
//! 3. otherwise `random`.
//!
//! Degenerate inputs (fewer than 3 points, zero variance) fall back to
//! `random` without computation and never fail the pipeline.

use crate::config::ClassifyConfig;
use crate::stats::{linear_fit, mean, variance};
use serde::{Deserialize, Serialize};

/// Classification outcome for one numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "label", rename_all = "lowercase")]
pub enum Label {
    /// Dominant linear trend.
    Trend,
    /// Dominant cycle at the detected period (in rows).
    Cyclic { period: usize },
    /// Neither; treated as noise-like.
    Random,
}

impl Label {
    /// Stable lowercase name of the label.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Trend => "trend",
            Self::Cyclic { .. } => "cyclic",
            Self::Random => "random",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cyclic { period } => write!(f, "cyclic(period={period})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Truly invalid input the classifier cannot label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    /// NaN or infinite value in the series.
    #[error("non-finite value at row {index}")]
    NonFinite { index: usize },
}

/// Classify one numeric series.
///
/// # Errors
/// `ClassifyError::NonFinite` when the series contains NaN or an infinity;
/// every other degeneracy resolves to `Label::Random`.
pub fn classify(values: &[f64], config: &ClassifyConfig) -> Result<Label, ClassifyError> {
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(ClassifyError::NonFinite { index });
    }
    if values.len() < 3 {
        return Ok(Label::Random);
    }
    if variance(values) <= f64::EPSILON {
        // Autocorrelation is undefined for a constant series.
        return Ok(Label::Random);
    }

    let fit = linear_fit(values);
    let spread = spread(values);
    let normalized_slope = fit.slope.abs() * (values.len() - 1) as f64 / spread;
    if normalized_slope > config.trend_slope && fit.r_squared >= config.r2_floor {
        tracing::debug!(
            slope = normalized_slope,
            r_squared = fit.r_squared,
            "classified as trend"
        );
        return Ok(Label::Trend);
    }

    if let Some((lag, peak)) = strongest_acf_peak(values) {
        if peak > config.cyclic_threshold {
            tracing::debug!(period = lag, peak, "classified as cyclic");
            return Ok(Label::Cyclic { period: lag });
        }
    }

    Ok(Label::Random)
}

fn spread(values: &[f64]) -> f64 {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(*v);
        max = max.max(*v);
    }
    max - min
}

/// Strongest local maximum of the autocorrelation profile over lags
/// `2..=n/2`, falling back to the global maximum over `1..=n/2` when the
/// profile has no interior peak.
fn strongest_acf_peak(values: &[f64]) -> Option<(usize, f64)> {
    let n = values.len();
    let max_lag = n / 2;
    if max_lag < 2 {
        return None;
    }
    let mu = mean(values);
    let denom: f64 = values.iter().map(|v| (v - mu).powi(2)).sum();
    if denom <= 0.0 {
        return None;
    }

    let acf: Vec<f64> = (1..=max_lag)
        .map(|k| {
            let num: f64 = (0..n - k)
                .map(|i| (values[i] - mu) * (values[i + k] - mu))
                .sum();
            num / denom
        })
        .collect();

    let mut best: Option<(usize, f64)> = None;
    for k in 2..=max_lag {
        let r = acf[k - 1];
        let left = acf[k - 2];
        let right = if k < max_lag {
            acf[k]
        } else {
            f64::NEG_INFINITY
        };
        if r >= left && r >= right && best.map_or(true, |(_, b)| r > b) {
            best = Some((k, r));
        }
    }

    best.or_else(|| {
        acf.iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, r)| (i + 1, *r))
    })
}
