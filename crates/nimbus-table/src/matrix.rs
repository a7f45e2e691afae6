//! Labeled, row-aligned numeric matrices.
//!
//! The shape every stage produces and the renderer consumes: an ordered set
//! of named series sharing one row count.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// One named numeric series of a matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Series label (column name, possibly suffixed by a stage).
    pub name: String,
    /// Row-aligned values; always finite for stage outputs.
    pub values: Vec<f64>,
}

/// A labeled numeric matrix with a fixed row count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    series: Vec<Series>,
}

impl Matrix {
    /// Empty matrix with a fixed row count.
    #[inline]
    #[must_use]
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            series: Vec::new(),
        }
    }

    /// Build from `(name, values)` pairs, enforcing equal lengths.
    pub fn from_columns(
        rows: usize,
        columns: impl IntoIterator<Item = (String, Vec<f64>)>,
    ) -> Result<Self, ValidationError> {
        let mut matrix = Self::new(rows);
        for (name, values) in columns {
            matrix.push(name, values)?;
        }
        Ok(matrix)
    }

    /// Append a series; its length must match the matrix row count.
    pub fn push(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), ValidationError> {
        let name = name.into();
        if values.len() != self.rows {
            return Err(ValidationError::InconsistentRows {
                column: name,
                expected: self.rows,
                actual: values.len(),
            });
        }
        self.series.push(Series { name, values });
        Ok(())
    }

    /// Row count shared by every series.
    #[inline]
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of series.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.series.len()
    }

    /// All series in insertion order.
    #[inline]
    #[must_use]
    pub fn series(&self) -> &[Series] {
        &self.series
    }

    /// Look up a series by label.
    #[must_use]
    pub fn series_named(&self, name: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_enforces_row_count() {
        let mut m = Matrix::new(3);
        m.push("a", vec![1.0, 2.0, 3.0]).unwrap();
        let err = m.push("b", vec![1.0]).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InconsistentRows {
                expected: 3,
                actual: 1,
                ..
            }
        ));
        assert_eq!(m.width(), 1);
    }

    #[test]
    fn lookup_by_name() {
        let m = Matrix::from_columns(2, vec![("x".to_string(), vec![1.0, 2.0])]).unwrap();
        assert_eq!(m.series_named("x").unwrap().values, vec![1.0, 2.0]);
        assert!(m.series_named("y").is_none());
    }

    // The renderer boundary depends on this JSON shape.
    #[test]
    fn series_json_shape() {
        let m = Matrix::from_columns(2, vec![("x".to_string(), vec![1.0, 2.0])]).unwrap();
        let json = serde_json::to_value(m.series()).unwrap();
        assert_eq!(json[0]["name"], "x");
        assert_eq!(json[0]["values"][1], 2.0);
    }
}
