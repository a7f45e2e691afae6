//! Validation errors raised at dataset ingestion.

/// Errors detected when a dataset is validated at submit time.
///
/// Raised once, before any pipeline stage runs; a dataset that validates
/// cleanly never produces one of these later.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Dataset has no columns or no rows.
    #[error("dataset is empty")]
    Empty,

    /// Two columns share a name.
    #[error("duplicate column name '{name}'")]
    DuplicateColumn { name: String },

    /// A column's length disagrees with the dataset row count.
    #[error("column '{column}' has {actual} rows, expected {expected}")]
    InconsistentRows {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// No numeric column to run the pipeline on.
    #[error("dataset has no numeric columns")]
    NoNumericColumns,

    /// A numeric column has no finite value at all.
    #[error("column '{column}' has no usable values")]
    AllMissing { column: String },
}
