//! Engine tuning knobs.
//!
//! Every numeric constant the engines use lives here; upstream fixed none of
//! them normatively, so all are configurable with conservative defaults.
//! Smoothing defaults (`alpha` 0.3, 5-point base window) follow the original
//! Solter parameters.

use serde::{Deserialize, Serialize};

/// Pattern-classifier thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifyConfig {
    /// Normalized slope magnitude above which a fit counts as a trend.
    pub trend_slope: f64,
    /// Minimum R-squared for the trend fit to win.
    pub r2_floor: f64,
    /// Autocorrelation peak above which a series counts as cyclic.
    pub cyclic_threshold: f64,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            trend_slope: 0.15,
            r2_floor: 0.5,
            cyclic_threshold: 0.4,
        }
    }
}

/// Salting-engine parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaltConfig {
    /// Perturbation intensity factor applied by every salting policy.
    pub intensity: f64,
    /// Salted values are clamped to this multiple of the original value
    /// range, centered on the range midpoint.
    pub bound_factor: f64,
    /// Radius of the rolling window behind the local standard deviation.
    pub rolling_radius: usize,
}

impl Default for SaltConfig {
    fn default() -> Self {
        Self {
            intensity: 0.3,
            bound_factor: 3.0,
            rolling_radius: 2,
        }
    }
}

/// Solter smoothing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothConfig {
    /// Base window radius before adaptation; 0 makes smoothing the identity.
    pub base_radius: usize,
    /// Exponential weight decay constant.
    pub alpha: f64,
    /// Radius of the rolling-variance window driving adaptation.
    pub variance_radius: usize,
    /// Maximum widening factor over `base_radius` in quiet regions.
    pub max_widen: usize,
}

impl Default for SmoothConfig {
    fn default() -> Self {
        Self {
            base_radius: 2,
            alpha: 0.3,
            variance_radius: 2,
            max_widen: 3,
        }
    }
}

/// Aggregate configuration for all three engines.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub classify: ClassifyConfig,
    pub salt: SaltConfig,
    pub smooth: SmoothConfig,
}

impl EngineConfig {
    /// Create the default configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the classifier thresholds.
    #[inline]
    #[must_use]
    pub fn with_classify(mut self, classify: ClassifyConfig) -> Self {
        self.classify = classify;
        self
    }

    /// Replace the salting parameters.
    #[inline]
    #[must_use]
    pub fn with_salt(mut self, salt: SaltConfig) -> Self {
        self.salt = salt;
        self
    }

    /// Replace the smoothing parameters.
    #[inline]
    #[must_use]
    pub fn with_smooth(mut self, smooth: SmoothConfig) -> Self {
        self.smooth = smooth;
        self
    }
}
