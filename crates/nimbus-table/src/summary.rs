//! Read-only dataset summary snapshot.
//!
//! Computed once when a dataset validates and never recomputed; the shape
//! mirrors what the upstream analysis step reported per upload (row and
//! column counts, dtype split, missing values, descriptive stats).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Descriptive statistics for one numeric column, over its finite values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
}

impl ColumnStats {
    /// Compute over the finite entries of `values`.
    ///
    /// Returns `None` when no entry is finite.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return None;
        }
        let n = finite.len() as f64;
        let mean = finite.iter().sum::<f64>() / n;
        let var = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in &finite {
            min = min.min(*v);
            max = max.max(*v);
        }
        Some(Self {
            min,
            max,
            mean,
            std: var.sqrt(),
        })
    }
}

/// Aggregate per-dataset snapshot exposed to readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    /// Row count.
    pub rows: usize,
    /// Total column count.
    pub columns: usize,
    /// All column names in dataset order.
    pub column_names: Vec<String>,
    /// Names of numeric columns.
    pub numeric_columns: Vec<String>,
    /// Names of categorical columns.
    pub categorical_columns: Vec<String>,
    /// Missing-value count per column, in dataset order.
    pub missing_values: IndexMap<String, usize>,
    /// Descriptive stats per numeric column, in dataset order.
    pub numeric_stats: IndexMap<String, ColumnStats>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_ignore_non_finite() {
        let stats = ColumnStats::from_values(&[1.0, f64::NAN, 3.0]).unwrap();
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 3.0);
        assert_eq!(stats.mean, 2.0);
        assert_eq!(stats.std, 1.0);
    }

    #[test]
    fn stats_none_for_all_nan() {
        assert!(ColumnStats::from_values(&[f64::NAN, f64::NAN]).is_none());
    }
}
