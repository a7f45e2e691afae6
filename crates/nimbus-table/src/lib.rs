//! Nimbus Table - Typed tabular data model
//!
//! The validated input representation for the Nimbus pipeline:
//! - Columns tagged `numeric` or `categorical`, with missing-value bookkeeping
//! - Datasets as ordered sequences of named columns
//! - Labeled numeric matrices handed to the engines and the renderer
//! - A read-only summary snapshot computed once at validation time
//!
//! The core never parses raw upload bytes; collaborators hand it an
//! already-typed table built from [`Column`] values.

#![warn(unreachable_pub)]

pub mod column;
pub mod dataset;
pub mod error;
pub mod matrix;
pub mod summary;

pub use column::{CategoricalColumn, Column, ColumnKind, NumericColumn};
pub use dataset::Dataset;
pub use error::ValidationError;
pub use matrix::{Matrix, Series};
pub use summary::{ColumnStats, DatasetSummary};
