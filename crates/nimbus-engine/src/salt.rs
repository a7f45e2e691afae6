//! Salting engine.
//!
//! Applies a classification-specific perturbation to one numeric series:
//! - `trend`: amplify the existing direction with a term proportional to the
//!   local first difference;
//! - `cyclic`: reinforce the detected cycle with a phase-fitted sinusoid
//!   whose amplitude follows the local standard deviation;
//! - `random`: add seeded, bounded noise scaled by the local standard
//!   deviation.
//!
//! Determinism is a correctness contract: the seed is derived from the
//! session identifier and column name, so the same inputs always salt
//! identically. Output never leaves a bounded multiple of the original value
//! range.

use crate::classify::Label;
use crate::config::SaltConfig;
use crate::stats::rolling_std;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

/// Numeric failure while salting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SaltError {
    /// NaN or infinite value in the input series.
    #[error("non-finite value at row {index}")]
    NonFinite { index: usize },
}

/// Derive the deterministic salting seed for a (session, column) pair.
#[must_use]
pub fn derive_seed(session_id: &str, column: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(session_id.as_bytes());
    hasher.update(b":");
    hasher.update(column.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// Salt one numeric series according to its classification label.
///
/// Output length equals input length, and every value is clamped to
/// `config.bound_factor` times the original value range, centered on the
/// range midpoint.
///
/// # Errors
/// `SaltError::NonFinite` when the input contains NaN or an infinity.
pub fn salt(
    values: &[f64],
    label: Label,
    seed: u64,
    config: &SaltConfig,
) -> Result<Vec<f64>, SaltError> {
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(SaltError::NonFinite { index });
    }
    if values.len() < 2 {
        return Ok(values.to_vec());
    }

    let salted = match label {
        Label::Trend => salt_trend(values, config),
        Label::Cyclic { period } => salt_cyclic(values, period, config),
        Label::Random => salt_random(values, seed, config),
    };
    Ok(clamp_to_bounds(values, salted, config.bound_factor))
}

/// Systematic perturbation proportional to the local first difference.
fn salt_trend(values: &[f64], config: &SaltConfig) -> Vec<f64> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let diff = if i == 0 {
                values[1] - values[0]
            } else {
                values[i] - values[i - 1]
            };
            v + config.intensity * diff
        })
        .collect()
}

/// Periodic component at the detected period, phase-fitted to the series so
/// the injected cycle reinforces the existing one.
fn salt_cyclic(values: &[f64], period: usize, config: &SaltConfig) -> Vec<f64> {
    if period == 0 {
        return values.to_vec();
    }
    let omega = 2.0 * std::f64::consts::PI / period as f64;
    let mu = values.iter().sum::<f64>() / values.len() as f64;
    let mut sin_dot = 0.0;
    let mut cos_dot = 0.0;
    for (i, v) in values.iter().enumerate() {
        let centered = v - mu;
        sin_dot += centered * (omega * i as f64).sin();
        cos_dot += centered * (omega * i as f64).cos();
    }
    let phase = cos_dot.atan2(sin_dot);

    let local_std = rolling_std(values, config.rolling_radius);
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v + config.intensity * local_std[i] * (omega * i as f64 + phase).sin()
        })
        .collect()
}

/// Bounded pseudo-random noise with variance following the local standard
/// deviation, drawn from the deterministic per-column stream.
fn salt_random(values: &[f64], seed: u64, config: &SaltConfig) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let local_std = rolling_std(values, config.rolling_radius);
    values
        .iter()
        .enumerate()
        .map(|(i, v)| v + config.intensity * local_std[i] * rng.random_range(-1.0..=1.0))
        .collect()
}

/// Clamp salted values to `bound_factor` times the original range, centered
/// on the range midpoint. Degenerate ranges widen to `max(|v|, 1)`.
fn clamp_to_bounds(original: &[f64], salted: Vec<f64>, bound_factor: f64) -> Vec<f64> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in original {
        min = min.min(*v);
        max = max.max(*v);
    }
    let spread = if max - min > 0.0 {
        max - min
    } else {
        max.abs().max(1.0)
    };
    let mid = (min + max) / 2.0;
    let half = bound_factor * spread / 2.0;
    let (lo, hi) = (mid - half, mid + half);
    salted.into_iter().map(|v| v.clamp(lo, hi)).collect()
}
