//! Per-session pipeline state machine.
//!
//! Transitions are strictly forward; no state is ever revisited. `Failed`
//! is reachable from every non-terminal state and, like `Completed`, is
//! absorbing.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    Created,
    Validating,
    Classifying,
    Salting,
    Smoothing,
    Rendering,
    Completed,
    Failed,
}

impl State {
    /// All states in pipeline order (`Failed` last).
    pub const ALL: [State; 8] = [
        State::Created,
        State::Validating,
        State::Classifying,
        State::Salting,
        State::Smoothing,
        State::Rendering,
        State::Completed,
        State::Failed,
    ];

    /// Whether the state accepts no further transitions.
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Completed | State::Failed)
    }

    /// Position in pipeline order; used to check monotonicity.
    /// `Failed` sorts after everything since it is reachable from any
    /// non-terminal state.
    #[inline]
    #[must_use]
    pub fn order(self) -> usize {
        match self {
            State::Created => 0,
            State::Validating => 1,
            State::Classifying => 2,
            State::Salting => 3,
            State::Smoothing => 4,
            State::Rendering => 5,
            State::Completed => 6,
            State::Failed => 7,
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            State::Created => "created",
            State::Validating => "validating",
            State::Classifying => "classifying",
            State::Salting => "salting",
            State::Smoothing => "smoothing",
            State::Rendering => "rendering",
            State::Completed => "completed",
            State::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// States reachable from `from` in one transition.
#[must_use]
pub fn allowed_transitions(from: State) -> Vec<State> {
    use State::*;
    match from {
        Created => vec![Validating, Failed],
        Validating => vec![Classifying, Failed],
        Classifying => vec![Salting, Failed],
        Salting => vec![Smoothing, Failed],
        Smoothing => vec![Rendering, Failed],
        Rendering => vec![Completed, Failed],
        Completed | Failed => vec![],
    }
}

/// Whether `from -> to` is a legal transition.
#[inline]
#[must_use]
pub fn transition_allowed(from: State, to: State) -> bool {
    allowed_transitions(from).contains(&to)
}
