//! Renderer boundary.
//!
//! The renderer is an external collaborator: labeled matrix in, artifact or
//! error out, never partial output. The orchestrator invokes it once per
//! stage under an enforced timeout, so a slow or wedged renderer fails one
//! session without affecting any other.

use crate::stage::{Artifact, Stage};
use async_trait::async_trait;
use nimbus_table::Matrix;
use std::time::Duration;

/// Renderer failure reported to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// The renderer reported an error.
    #[error("render failed: {0}")]
    Failed(String),

    /// The renderer did not answer within the enforced timeout.
    #[error("render timed out after {0:?}")]
    Timeout(Duration),
}

/// External collaborator that turns a labeled matrix into an artifact.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Render the matrix for one stage.
    async fn render(&self, stage: Stage, matrix: &Matrix) -> Result<Artifact, RenderError>;
}

/// Built-in renderer producing `application/json` table artifacts.
///
/// Serializes the labeled matrix as-is; useful as a default so the pipeline
/// is usable end-to-end without an external raster renderer, and as the
/// serialized-table export of the processed data.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableRenderer;

impl TableRenderer {
    /// Create the built-in table renderer.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Renderer for TableRenderer {
    async fn render(&self, stage: Stage, matrix: &Matrix) -> Result<Artifact, RenderError> {
        let payload = serde_json::json!({
            "stage": stage.name(),
            "rows": matrix.rows(),
            "series": matrix.series(),
        });
        let bytes =
            serde_json::to_vec(&payload).map_err(|e| RenderError::Failed(e.to_string()))?;
        Ok(Artifact::new("application/json", bytes))
    }
}
