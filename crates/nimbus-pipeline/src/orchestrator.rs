//! Pipeline orchestrator.
//!
//! Drives each session through `Validating -> Classifying -> Salting ->
//! Smoothing -> Rendering -> Completed`, appending one immutable
//! [`StageResult`] per stage. Stages within a session run strictly
//! sequentially; sessions run independently of one another. A failure in
//! any stage records the originating error on the session and halts the
//! rest; partial results are never rolled back.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::registry::SessionRegistry;
use crate::renderer::{RenderError, Renderer, TableRenderer};
use crate::session::{Session, SessionId, SessionStatus, SessionSummary};
use crate::stage::{Stage, StageResult};
use crate::state::State;
use indexmap::IndexMap;
use nimbus_engine::{classify, derive_seed, salt, solter, Label};
use nimbus_table::{Dataset, Matrix};
use std::sync::Arc;
use tokio::time::timeout;

/// The pipeline: session registry plus the orchestration logic.
pub struct Pipeline {
    config: PipelineConfig,
    registry: SessionRegistry,
    renderer: Arc<dyn Renderer>,
}

/// Releases the single-flight slot even when the driving task is dropped.
struct RunGuard<'a>(&'a Session);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.end_run();
    }
}

impl Pipeline {
    /// Create a pipeline with an explicit renderer.
    #[must_use]
    pub fn new(config: PipelineConfig, renderer: Arc<dyn Renderer>) -> Self {
        let registry = SessionRegistry::new(config.max_sessions, config.max_session_age);
        Self {
            config,
            registry,
            renderer,
        }
    }

    /// Create a pipeline with the built-in JSON table renderer.
    #[must_use]
    pub fn with_default_renderer(config: PipelineConfig) -> Self {
        Self::new(config, Arc::new(TableRenderer::new()))
    }

    /// Configuration in effect.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Accept a dataset and create its session.
    ///
    /// Validation happens here: an invalid dataset still gets a session,
    /// created directly in `Failed` with the validation error recorded,
    /// never silently dropped.
    pub fn submit(&self, dataset: Dataset) -> SessionId {
        let id = SessionId::new();
        let session = match dataset.validate() {
            Ok(summary) => {
                tracing::info!(
                    session = %id,
                    rows = summary.rows,
                    columns = summary.columns,
                    "dataset accepted"
                );
                Session::validated(id, dataset, summary)
            }
            Err(error) => {
                tracing::warn!(session = %id, %error, "dataset rejected");
                Session::rejected(id, dataset, error)
            }
        };
        self.registry.insert(Arc::new(session));
        id
    }

    /// Execute the session's remaining stages in order.
    ///
    /// Resolves with the session's final state. Stage failures are recorded
    /// on the session, not propagated. A `run` on a terminal session is a
    /// no-op resolving with that state.
    ///
    /// # Errors
    /// `Conflict` when a run is already in flight for this session;
    /// `SessionNotFound` for an unknown id. Neither mutates session state.
    pub async fn run(&self, id: SessionId) -> Result<State, PipelineError> {
        let session = self
            .registry
            .get(&id)
            .ok_or(PipelineError::SessionNotFound(id))?;
        if session.state().is_terminal() {
            return Ok(session.state());
        }
        if !session.begin_run() {
            return Err(PipelineError::Conflict(id));
        }
        let guard = RunGuard(&session);
        if let Err(error) = self.drive(&session).await {
            tracing::debug!(session = %id, %error, "run halted");
        }
        drop(guard);
        Ok(session.state())
    }

    /// Current state and, when failed, the error descriptor.
    pub fn status(&self, id: SessionId) -> Result<SessionStatus, PipelineError> {
        let session = self
            .registry
            .get(&id)
            .ok_or(PipelineError::SessionNotFound(id))?;
        Ok(session.status())
    }

    /// Completed result of one stage.
    ///
    /// # Errors
    /// `SessionNotFound` for an unknown id; `StageNotFound` when the
    /// session has not produced that stage.
    pub fn get_stage(&self, id: SessionId, stage: Stage) -> Result<StageResult, PipelineError> {
        let session = self
            .registry
            .get(&id)
            .ok_or(PipelineError::SessionNotFound(id))?;
        session
            .result(stage)
            .ok_or(PipelineError::StageNotFound { session: id, stage })
    }

    /// All completed stage results, in completion order.
    pub fn stage_results(&self, id: SessionId) -> Result<Vec<StageResult>, PipelineError> {
        let session = self
            .registry
            .get(&id)
            .ok_or(PipelineError::SessionNotFound(id))?;
        Ok(session.results())
    }

    /// Read-only session summary (validation snapshot + cached labels).
    ///
    /// # Errors
    /// `SessionNotFound` when the id is unknown or the session failed
    /// validation and therefore has no snapshot.
    pub fn summary(&self, id: SessionId) -> Result<SessionSummary, PipelineError> {
        let session = self
            .registry
            .get(&id)
            .ok_or(PipelineError::SessionNotFound(id))?;
        session
            .summary()
            .ok_or(PipelineError::SessionNotFound(id))
    }

    /// Ask an in-flight run to stop before its next stage. No-op when the
    /// session is idle.
    pub fn cancel(&self, id: SessionId) -> Result<(), PipelineError> {
        let session = self
            .registry
            .get(&id)
            .ok_or(PipelineError::SessionNotFound(id))?;
        if session.request_cancel() {
            tracing::info!(session = %id, "cancellation requested");
        }
        Ok(())
    }

    /// Explicitly remove a session and its artifacts.
    pub fn evict(&self, id: SessionId) -> bool {
        self.registry.remove(&id)
    }

    /// Drop idle sessions older than the configured age.
    pub fn evict_expired(&self) -> usize {
        self.registry.evict_expired()
    }

    /// Number of live sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.registry.len()
    }

    /// Run the remaining stages; failures are recorded on the session and
    /// returned to stop the caller's loop.
    async fn drive(&self, session: &Session) -> Result<(), PipelineError> {
        let engine = &self.config.engine;

        // Classifying: label every numeric column once, cache on session.
        self.advance(session, State::Classifying)?;
        let original = match session.dataset.numeric_matrix() {
            Ok(matrix) => matrix,
            Err(error) => return Err(self.fail(session, error.into())),
        };
        let mut labels: IndexMap<String, Label> = IndexMap::new();
        for series in original.series() {
            match classify(&series.values, &engine.classify) {
                Ok(label) => {
                    tracing::debug!(session = %session.id, column = %series.name, %label, "classified");
                    labels.insert(series.name.clone(), label);
                }
                Err(source) => {
                    return Err(self.fail(
                        session,
                        PipelineError::Classification {
                            column: series.name.clone(),
                            source,
                        },
                    ));
                }
            }
        }
        session.set_labels(labels.clone());

        // Salting: label-specific perturbation, deterministic per column.
        self.advance(session, State::Salting)?;
        let session_key = session.id.to_string();
        let mut salted = Matrix::new(original.rows());
        for series in original.series() {
            let label = labels[&series.name];
            let seed = derive_seed(&session_key, &series.name);
            let values = salt(&series.values, label, seed, &engine.salt).map_err(|e| {
                self.fail(
                    session,
                    PipelineError::Computation {
                        stage: Stage::Salt,
                        column: series.name.clone(),
                        message: e.to_string(),
                    },
                )
            })?;
            salted.push(series.name.clone(), values).map_err(|e| {
                self.fail(
                    session,
                    PipelineError::Computation {
                        stage: Stage::Salt,
                        column: series.name.clone(),
                        message: e.to_string(),
                    },
                )
            })?;
        }

        // Smoothing: Solter pass over the salted series.
        self.advance(session, State::Smoothing)?;
        let mut smoothed = Matrix::new(original.rows());
        for series in salted.series() {
            let values = solter(&series.values, &engine.smooth).map_err(|e| {
                self.fail(
                    session,
                    PipelineError::Computation {
                        stage: Stage::Smooth,
                        column: series.name.clone(),
                        message: e.to_string(),
                    },
                )
            })?;
            smoothed.push(series.name.clone(), values).map_err(|e| {
                self.fail(
                    session,
                    PipelineError::Computation {
                        stage: Stage::Smooth,
                        column: series.name.clone(),
                        message: e.to_string(),
                    },
                )
            })?;
        }

        // Rendering: one renderer call per stage, in stage order.
        self.advance(session, State::Rendering)?;
        let graph = composite(&original, &salted, &smoothed);
        let matrices = [
            (Stage::Plot, Arc::new(original)),
            (Stage::Salt, Arc::new(salted)),
            (Stage::Smooth, Arc::new(smoothed)),
            (Stage::Graph, Arc::new(graph)),
        ];
        for (stage, matrix) in matrices {
            if session.cancel_pending() {
                let error = PipelineError::Cancelled {
                    during: State::Rendering,
                };
                session.fail(error.clone());
                return Err(error);
            }
            match self.render_stage(stage, &matrix).await {
                Ok(artifact) => {
                    tracing::info!(session = %session.id, %stage, bytes = artifact.len(), "stage rendered");
                    session.append_result(StageResult::new(
                        stage,
                        matrix,
                        Arc::clone(&session.categorical),
                        Some(artifact),
                    ));
                }
                Err(source) => {
                    // The computed matrix stays inspectable even though the
                    // artifact is absent.
                    session.append_result(StageResult::new(
                        stage,
                        matrix,
                        Arc::clone(&session.categorical),
                        None,
                    ));
                    return Err(self.fail(
                        session,
                        PipelineError::ExternalProcess { stage, source },
                    ));
                }
            }
        }

        self.advance(session, State::Completed)?;
        tracing::info!(session = %session.id, "pipeline completed");
        Ok(())
    }

    /// Invoke the renderer under the enforced timeout.
    async fn render_stage(
        &self,
        stage: Stage,
        matrix: &Matrix,
    ) -> Result<crate::stage::Artifact, RenderError> {
        match timeout(
            self.config.render_timeout,
            self.renderer.render(stage, matrix),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(RenderError::Timeout(self.config.render_timeout)),
        }
    }

    /// Transition forward, honoring a pending cancellation first.
    fn advance(&self, session: &Session, to: State) -> Result<(), PipelineError> {
        if session.cancel_pending() {
            let error = PipelineError::Cancelled {
                during: session.state(),
            };
            session.fail(error.clone());
            return Err(error);
        }
        session.transition(to).map_err(|error| {
            session.fail(error.clone());
            error
        })
    }

    /// Record a failure on the session and hand the error back for `?`.
    fn fail(&self, session: &Session, error: PipelineError) -> PipelineError {
        session.fail(error.clone());
        error
    }
}

/// The composite graph matrix: for every numeric column `c`, the series
/// `c`, `c_salted`, and `c_smoothed`, row-aligned.
fn composite(original: &Matrix, salted: &Matrix, smoothed: &Matrix) -> Matrix {
    let mut graph = Matrix::new(original.rows());
    for (i, series) in original.series().iter().enumerate() {
        // Lengths are equal by construction; push cannot fail here.
        let _ = graph.push(series.name.clone(), series.values.clone());
        let _ = graph.push(
            format!("{}_salted", series.name),
            salted.series()[i].values.clone(),
        );
        let _ = graph.push(
            format!("{}_smoothed", series.name),
            smoothed.series()[i].values.clone(),
        );
    }
    graph
}
