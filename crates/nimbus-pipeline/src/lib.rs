//! Nimbus Pipeline - session orchestration for the tabular transformation
//! pipeline.
//!
//! Accepts datasets, drives each one through the four stages (plot, salt,
//! smooth, graph) under an explicit per-session state machine, and exposes
//! status, summaries, and completed stage results. Sessions are isolated
//! and concurrency-safe; the renderer is an external collaborator behind
//! the [`Renderer`] trait.

#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod renderer;
mod registry;
mod session;
pub mod stage;
pub mod state;

pub use config::PipelineConfig;
pub use error::{Failure, PipelineError};
pub use orchestrator::Pipeline;
pub use renderer::{RenderError, Renderer, TableRenderer};
pub use session::{SessionId, SessionStatus, SessionSummary};
pub use stage::{Artifact, ParseStageError, Stage, StageResult};
pub use state::State;
