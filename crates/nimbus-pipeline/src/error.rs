//! Pipeline error taxonomy.
//!
//! Classification degeneracies are recovered locally via the `random`
//! fallback and never surface here. Registry-level errors (`Conflict`,
//! `SessionNotFound`, `StageNotFound`) are returned synchronously and never
//! mutate session state; every other variant is recorded on the failing
//! session and aborts its remaining stages.

use crate::renderer::RenderError;
use crate::session::SessionId;
use crate::stage::Stage;
use crate::state::State;
use nimbus_engine::ClassifyError;
use nimbus_table::ValidationError;

/// Main pipeline error type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// Malformed dataset rejected at submit.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Numerically degenerate input the classifier cannot label.
    #[error("classification failed for column '{column}': {source}")]
    Classification {
        column: String,
        source: ClassifyError,
    },

    /// Salting or smoothing numeric failure.
    #[error("{stage} computation failed for column '{column}': {message}")]
    Computation {
        stage: Stage,
        column: String,
        message: String,
    },

    /// Renderer failure or timeout.
    #[error("renderer failed during {stage}: {source}")]
    ExternalProcess { stage: Stage, source: RenderError },

    /// A second `run` while one is already in flight.
    #[error("session {0} already has a run in flight")]
    Conflict(SessionId),

    /// Unknown session identifier.
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    /// The session has not produced this stage (or never will).
    #[error("stage '{stage}' not available for session {session}")]
    StageNotFound { session: SessionId, stage: Stage },

    /// A run was cancelled between stages.
    #[error("run cancelled during {during}")]
    Cancelled { during: State },

    /// Internal sequencing bug: the orchestrator attempted an illegal
    /// transition.
    #[error("illegal state transition: {from} -> {to}")]
    IllegalTransition { from: State, to: State },
}

impl PipelineError {
    /// Stable error-kind tag for status reporting.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Classification { .. } => "classification",
            Self::Computation { .. } => "computation",
            Self::ExternalProcess { .. } => "external",
            Self::Conflict(_) => "conflict",
            Self::SessionNotFound(_) | Self::StageNotFound { .. } => "not_found",
            Self::Cancelled { .. } => "cancelled",
            Self::IllegalTransition { .. } => "state",
        }
    }

    /// Whether this is a lookup failure rather than a pipeline failure.
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::SessionNotFound(_) | Self::StageNotFound { .. }
        )
    }

    /// Whether this is the single-flight rejection.
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Failure recorded on a session: where it happened and what went wrong.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    /// State the session was in when the failure occurred.
    pub during: State,
    /// The originating error.
    pub error: PipelineError,
}
