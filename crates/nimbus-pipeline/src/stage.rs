//! Stages, stage results, and rendered artifacts.

use chrono::{DateTime, Utc};
use nimbus_table::{CategoricalColumn, Matrix};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// One of the four ordered pipeline steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Baseline view of the original numeric data.
    Plot,
    /// Pattern-adaptive perturbation output.
    Salt,
    /// Adaptive-window noise reduction output.
    Smooth,
    /// Composite view of original, salted, and smoothed series.
    Graph,
}

impl Stage {
    /// All stages in pipeline order.
    pub const ALL: [Stage; 4] = [Stage::Plot, Stage::Salt, Stage::Smooth, Stage::Graph];

    /// Stable lowercase stage name.
    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Stage::Plot => "plot",
            Stage::Salt => "salt",
            Stage::Smooth => "smooth",
            Stage::Graph => "graph",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for unrecognized stage names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stage '{0}'")]
pub struct ParseStageError(String);

impl FromStr for Stage {
    type Err = ParseStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plot" => Ok(Stage::Plot),
            "salt" => Ok(Stage::Salt),
            "smooth" => Ok(Stage::Smooth),
            "graph" => Ok(Stage::Graph),
            other => Err(ParseStageError(other.to_string())),
        }
    }
}

/// A rendered representation of a stage result, owned by its session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    content_type: String,
    bytes: Vec<u8>,
}

impl Artifact {
    /// Build an artifact from a content type and payload.
    #[must_use]
    pub fn new(content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            bytes,
        }
    }

    /// MIME content type of the payload.
    #[inline]
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Payload bytes.
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Payload size in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the payload is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Immutable output of one completed stage.
///
/// The artifact is absent when rendering failed independently of the
/// computation; the matrix is always present once the result exists.
#[derive(Debug, Clone)]
pub struct StageResult {
    /// Which stage produced this result.
    pub stage: Stage,
    /// Labeled numeric matrix, row-aligned with the dataset.
    pub matrix: Arc<Matrix>,
    /// Categorical columns carried through unmodified for reference.
    pub categorical: Arc<Vec<CategoricalColumn>>,
    /// Rendered artifact, if rendering succeeded.
    pub artifact: Option<Arc<Artifact>>,
    /// When the stage completed.
    pub completed_at: DateTime<Utc>,
}

impl StageResult {
    /// Build a result completed now.
    #[must_use]
    pub fn new(
        stage: Stage,
        matrix: Arc<Matrix>,
        categorical: Arc<Vec<CategoricalColumn>>,
        artifact: Option<Artifact>,
    ) -> Self {
        Self {
            stage,
            matrix,
            categorical,
            artifact: artifact.map(Arc::new),
            completed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_round_trip() {
        for stage in Stage::ALL {
            assert_eq!(stage.name().parse::<Stage>().unwrap(), stage);
        }
        assert!("initial".parse::<Stage>().is_err());
    }

    #[test]
    fn stage_order() {
        assert_eq!(
            Stage::ALL.map(|s| s.name()),
            ["plot", "salt", "smooth", "graph"]
        );
    }

    #[test]
    fn artifact_accessors() {
        let artifact = Artifact::new("application/json", vec![1, 2, 3]);
        assert_eq!(artifact.content_type(), "application/json");
        assert_eq!(artifact.len(), 3);
        assert!(!artifact.is_empty());
    }
}
