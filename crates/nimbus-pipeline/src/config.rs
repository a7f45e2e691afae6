//! Pipeline configuration.

use nimbus_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Orchestrator-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Numeric engine tuning.
    pub engine: EngineConfig,
    /// Enforced timeout for each renderer call; always finite.
    pub render_timeout: Duration,
    /// Capacity bound on the session registry.
    pub max_sessions: usize,
    /// Age bound for time-based eviction of idle sessions.
    pub max_session_age: Duration,
}

impl PipelineConfig {
    /// Create the default configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the engine tuning.
    #[inline]
    #[must_use]
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Replace the per-call renderer timeout.
    #[inline]
    #[must_use]
    pub fn with_render_timeout(mut self, timeout: Duration) -> Self {
        self.render_timeout = timeout;
        self
    }

    /// Replace the registry capacity bound.
    #[inline]
    #[must_use]
    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max;
        self
    }

    /// Replace the idle-session age bound.
    #[inline]
    #[must_use]
    pub fn with_max_session_age(mut self, age: Duration) -> Self {
        self.max_session_age = age;
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            render_timeout: Duration::from_secs(10),
            max_sessions: 64,
            max_session_age: Duration::from_secs(3600),
        }
    }
}
