//! Datasets: ordered sequences of named, typed columns.
//!
//! Construction is unchecked so that malformed input can still be submitted
//! and land a session directly in its failed state; [`Dataset::validate`]
//! performs every ingestion check once and yields the summary snapshot.

use crate::column::{CategoricalColumn, Column, ColumnKind, NumericColumn};
use crate::error::ValidationError;
use crate::matrix::Matrix;
use crate::summary::{ColumnStats, DatasetSummary};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// An ordered, typed table. Row and column counts are fixed after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: usize,
}

impl Dataset {
    /// Assemble a dataset from columns in order.
    ///
    /// The row count is taken from the first column; consistency is checked
    /// by [`Dataset::validate`], not here.
    #[must_use]
    pub fn new(columns: Vec<Column>) -> Self {
        let rows = columns.first().map_or(0, Column::len);
        Self { columns, rows }
    }

    /// Row count.
    #[inline]
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// All columns in order.
    #[inline]
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Numeric columns in dataset order.
    pub fn numeric_columns(&self) -> impl Iterator<Item = &NumericColumn> {
        self.columns.iter().filter_map(|c| match c {
            Column::Numeric(n) => Some(n),
            Column::Categorical(_) => None,
        })
    }

    /// Categorical columns in dataset order.
    pub fn categorical_columns(&self) -> impl Iterator<Item = &CategoricalColumn> {
        self.columns.iter().filter_map(|c| match c {
            Column::Categorical(n) => Some(n),
            Column::Numeric(_) => None,
        })
    }

    /// Validate the dataset and compute its summary snapshot.
    ///
    /// Checks, in order: non-empty, unique column names, consistent row
    /// lengths, at least one numeric column, and at least one finite value
    /// per numeric column.
    pub fn validate(&self) -> Result<DatasetSummary, ValidationError> {
        if self.columns.is_empty() || self.rows == 0 {
            return Err(ValidationError::Empty);
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.name()) {
                return Err(ValidationError::DuplicateColumn {
                    name: column.name().to_string(),
                });
            }
            if column.len() != self.rows {
                return Err(ValidationError::InconsistentRows {
                    column: column.name().to_string(),
                    expected: self.rows,
                    actual: column.len(),
                });
            }
        }

        if self.numeric_columns().next().is_none() {
            return Err(ValidationError::NoNumericColumns);
        }
        for column in self.numeric_columns() {
            if column.filled().is_none() {
                return Err(ValidationError::AllMissing {
                    column: column.name().to_string(),
                });
            }
        }

        Ok(self.summarize())
    }

    /// Gap-filled numeric view of the dataset: one series per numeric
    /// column, in dataset order.
    pub fn numeric_matrix(&self) -> Result<Matrix, ValidationError> {
        let mut matrix = Matrix::new(self.rows);
        for column in self.numeric_columns() {
            let filled = column.filled().ok_or_else(|| ValidationError::AllMissing {
                column: column.name().to_string(),
            })?;
            matrix.push(column.name(), filled)?;
        }
        Ok(matrix)
    }

    fn summarize(&self) -> DatasetSummary {
        let mut numeric = Vec::new();
        let mut categorical = Vec::new();
        let mut missing = IndexMap::new();
        let mut stats = IndexMap::new();

        for column in &self.columns {
            missing.insert(column.name().to_string(), column.missing());
            match column.kind() {
                ColumnKind::Numeric => numeric.push(column.name().to_string()),
                ColumnKind::Categorical => categorical.push(column.name().to_string()),
            }
        }
        for column in self.numeric_columns() {
            if let Some(s) = ColumnStats::from_values(column.values()) {
                stats.insert(column.name().to_string(), s);
            }
        }

        DatasetSummary {
            rows: self.rows,
            columns: self.columns.len(),
            column_names: self.columns.iter().map(|c| c.name().to_string()).collect(),
            numeric_columns: numeric,
            categorical_columns: categorical,
            missing_values: missing,
            numeric_stats: stats,
        }
    }
}
