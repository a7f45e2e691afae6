//! Sessions: isolated single-dataset execution contexts.
//!
//! A session owns its dataset, summary snapshot, cached classification
//! labels, and the immutable sequence of completed stage results. Interior
//! state sits behind a `parking_lot` lock that is never held across an
//! await point; the single-flight and cancellation flags are lock-free.

use crate::error::{Failure, PipelineError};
use crate::stage::{Stage, StageResult};
use crate::state::{transition_allowed, State};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use nimbus_engine::Label;
use nimbus_table::{CategoricalColumn, Dataset, DatasetSummary, ValidationError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Opaque, globally unique session identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a fresh identifier.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Point-in-time view of a session's lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub id: SessionId,
    pub state: State,
    pub failure: Option<Failure>,
    pub created_at: DateTime<Utc>,
}

/// Read-only per-session summary: the validation-time dataset snapshot plus
/// the classification labels once the classifying stage has run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub dataset: DatasetSummary,
    pub labels: IndexMap<String, Label>,
}

#[derive(Debug)]
struct SessionState {
    state: State,
    results: Vec<StageResult>,
    labels: IndexMap<String, Label>,
    failure: Option<Failure>,
}

/// One session entry: dataset, snapshot, and mutable lifecycle state.
#[derive(Debug)]
pub(crate) struct Session {
    pub(crate) id: SessionId,
    pub(crate) dataset: Dataset,
    pub(crate) summary: Option<DatasetSummary>,
    pub(crate) categorical: Arc<Vec<CategoricalColumn>>,
    pub(crate) created_at: DateTime<Utc>,
    running: AtomicBool,
    cancel_requested: AtomicBool,
    inner: RwLock<SessionState>,
}

impl Session {
    /// Session whose dataset validated cleanly; sits in `Validating`,
    /// awaiting `run`.
    pub(crate) fn validated(id: SessionId, dataset: Dataset, summary: DatasetSummary) -> Self {
        Self::build(id, dataset, Some(summary), State::Validating, None)
    }

    /// Session created directly in `Failed` because validation rejected the
    /// dataset.
    pub(crate) fn rejected(id: SessionId, dataset: Dataset, error: ValidationError) -> Self {
        let failure = Failure {
            during: State::Validating,
            error: PipelineError::Validation(error),
        };
        Self::build(id, dataset, None, State::Failed, Some(failure))
    }

    fn build(
        id: SessionId,
        dataset: Dataset,
        summary: Option<DatasetSummary>,
        state: State,
        failure: Option<Failure>,
    ) -> Self {
        let categorical = Arc::new(
            dataset
                .categorical_columns()
                .cloned()
                .collect::<Vec<CategoricalColumn>>(),
        );
        Self {
            id,
            dataset,
            summary,
            categorical,
            created_at: Utc::now(),
            running: AtomicBool::new(false),
            cancel_requested: AtomicBool::new(false),
            inner: RwLock::new(SessionState {
                state,
                results: Vec::new(),
                labels: IndexMap::new(),
                failure,
            }),
        }
    }

    /// Current state.
    pub(crate) fn state(&self) -> State {
        self.inner.read().state
    }

    /// Point-in-time status snapshot.
    pub(crate) fn status(&self) -> SessionStatus {
        let inner = self.inner.read();
        SessionStatus {
            id: self.id,
            state: inner.state,
            failure: inner.failure.clone(),
            created_at: self.created_at,
        }
    }

    /// Attempt a forward transition.
    pub(crate) fn transition(&self, to: State) -> Result<(), PipelineError> {
        let mut inner = self.inner.write();
        if !transition_allowed(inner.state, to) {
            return Err(PipelineError::IllegalTransition {
                from: inner.state,
                to,
            });
        }
        tracing::debug!(session = %self.id, from = %inner.state, to = %to, "state transition");
        inner.state = to;
        Ok(())
    }

    /// Record a failure and move to `Failed`. No-op once terminal, since
    /// `Failed` is absorbing and `Completed` accepts no transitions.
    pub(crate) fn fail(&self, error: PipelineError) {
        let mut inner = self.inner.write();
        if inner.state.is_terminal() {
            return;
        }
        tracing::warn!(session = %self.id, during = %inner.state, %error, "session failed");
        inner.failure = Some(Failure {
            during: inner.state,
            error,
        });
        inner.state = State::Failed;
    }

    /// Append a completed stage result. Results are immutable once appended
    /// and a session holds at most one result per stage.
    pub(crate) fn append_result(&self, result: StageResult) {
        let mut inner = self.inner.write();
        debug_assert!(
            inner.results.iter().all(|r| r.stage != result.stage),
            "one result per stage"
        );
        inner.results.push(result);
    }

    /// Fetch the result of one stage, if produced.
    pub(crate) fn result(&self, stage: Stage) -> Option<StageResult> {
        self.inner
            .read()
            .results
            .iter()
            .find(|r| r.stage == stage)
            .cloned()
    }

    /// All results in completion order.
    pub(crate) fn results(&self) -> Vec<StageResult> {
        self.inner.read().results.clone()
    }

    /// Cache the per-column classification labels.
    pub(crate) fn set_labels(&self, labels: IndexMap<String, Label>) {
        self.inner.write().labels = labels;
    }

    /// Read-only summary: snapshot plus cached labels.
    pub(crate) fn summary(&self) -> Option<SessionSummary> {
        let dataset = self.summary.clone()?;
        Some(SessionSummary {
            dataset,
            labels: self.inner.read().labels.clone(),
        })
    }

    /// Single-flight check-and-set; true when this caller won the run slot.
    pub(crate) fn begin_run(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Release the run slot and clear any pending cancellation.
    pub(crate) fn end_run(&self) {
        self.cancel_requested.store(false, Ordering::Release);
        self.running.store(false, Ordering::Release);
    }

    /// Whether a run currently holds the slot.
    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ask the in-flight run to stop before its next stage; true when a run
    /// was in flight to observe it.
    pub(crate) fn request_cancel(&self) -> bool {
        if self.is_running() {
            self.cancel_requested.store(true, Ordering::Release);
            true
        } else {
            false
        }
    }

    /// Whether cancellation was requested for the in-flight run.
    pub(crate) fn cancel_pending(&self) -> bool {
        self.cancel_requested.load(Ordering::Acquire)
    }
}
