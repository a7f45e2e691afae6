//! Concurrency-safe session registry.
//!
//! The only shared mutable structure in the pipeline: an id-keyed map of
//! sessions with an explicit eviction lifecycle. Sessions are never removed
//! implicitly during reads; eviction is capacity-driven at insert or
//! age-driven via [`SessionRegistry::evict_expired`]. Artifacts die with
//! their session.

use crate::session::{Session, SessionId};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

/// Id-keyed store of live sessions.
#[derive(Debug)]
pub(crate) struct SessionRegistry {
    sessions: DashMap<SessionId, Arc<Session>>,
    max_sessions: usize,
    max_age: Duration,
}

impl SessionRegistry {
    pub(crate) fn new(max_sessions: usize, max_age: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            max_sessions: max_sessions.max(1),
            max_age,
        }
    }

    /// Insert a session, evicting the oldest idle one when at capacity.
    pub(crate) fn insert(&self, session: Arc<Session>) {
        if self.sessions.len() >= self.max_sessions {
            if let Some(victim) = self.eviction_candidate() {
                tracing::info!(session = %victim, "evicting session at capacity");
                self.sessions.remove(&victim);
            } else {
                tracing::warn!("registry over capacity with every session running");
            }
        }
        self.sessions.insert(session.id, session);
    }

    pub(crate) fn get(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Explicitly remove one session; true when it existed.
    pub(crate) fn remove(&self, id: &SessionId) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Drop idle sessions older than the configured age; returns how many
    /// were evicted.
    pub(crate) fn evict_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, session| {
            if session.is_running() {
                return true;
            }
            let age = (now - session.created_at).to_std().unwrap_or_default();
            age <= self.max_age
        });
        before - self.sessions.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Oldest idle session, terminal ones first.
    fn eviction_candidate(&self) -> Option<SessionId> {
        let mut best: Option<(bool, chrono::DateTime<Utc>, SessionId)> = None;
        for entry in self.sessions.iter() {
            let session = entry.value();
            if session.is_running() {
                continue;
            }
            // Sort key: terminal before non-terminal, then oldest first;
            // the minimum is the preferred victim.
            let key = (!session.state().is_terminal(), session.created_at);
            if best
                .as_ref()
                .map_or(true, |(t, at, _)| key < (*t, *at))
            {
                best = Some((key.0, key.1, session.id));
            }
        }
        best.map(|(_, _, id)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nimbus_table::{Column, Dataset};

    fn session() -> Arc<Session> {
        let dataset = Dataset::new(vec![Column::numeric_dense("x", vec![1.0, 2.0, 3.0])]);
        let summary = dataset.validate().unwrap();
        Arc::new(Session::validated(SessionId::new(), dataset, summary))
    }

    #[test]
    fn insert_and_lookup() {
        let registry = SessionRegistry::new(4, Duration::from_secs(3600));
        let s = session();
        let id = s.id;
        registry.insert(s);
        assert!(registry.get(&id).is_some());
        assert_eq!(registry.len(), 1);
        assert!(registry.remove(&id));
        assert!(registry.get(&id).is_none());
    }

    #[test]
    fn capacity_eviction_drops_oldest_idle() {
        let registry = SessionRegistry::new(2, Duration::from_secs(3600));
        let first = session();
        let first_id = first.id;
        registry.insert(first);
        registry.insert(session());
        registry.insert(session());
        assert_eq!(registry.len(), 2);
        assert!(registry.get(&first_id).is_none(), "oldest should be evicted");
    }

    #[test]
    fn capacity_eviction_skips_running_sessions() {
        let registry = SessionRegistry::new(1, Duration::from_secs(3600));
        let busy = session();
        let busy_id = busy.id;
        assert!(busy.begin_run());
        registry.insert(busy);
        registry.insert(session());
        assert!(registry.get(&busy_id).is_some(), "running session survives");
    }

    #[test]
    fn expired_eviction() {
        let registry = SessionRegistry::new(8, Duration::ZERO);
        registry.insert(session());
        registry.insert(session());
        assert_eq!(registry.evict_expired(), 2);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn expired_eviction_keeps_running_sessions() {
        let registry = SessionRegistry::new(8, Duration::ZERO);
        let busy = session();
        assert!(busy.begin_run());
        registry.insert(busy);
        assert_eq!(registry.evict_expired(), 0);
        assert_eq!(registry.len(), 1);
    }
}
