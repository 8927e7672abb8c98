use serde::{Deserialize, Serialize};

/// Lifecycle of one exam attempt.
///
/// Transitions only move forward, with a single exception: `Errored` may go
/// back to `Submitting` when a failed submission is retried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    #[default]
    NotStarted,
    InProgress,
    Submitting,
    Completed,
    Errored,
}

impl SessionState {
    /// Whether moving from `self` to `next` is a legal transition.
    #[must_use]
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::{Completed, Errored, InProgress, NotStarted, Submitting};
        matches!(
            (self, next),
            (NotStarted, InProgress)
                | (InProgress, Submitting)
                | (Submitting, Completed | Errored)
                | (Errored, Submitting)
        )
    }

    /// Answer, flag and navigation input is only accepted while in progress.
    #[must_use]
    pub fn accepts_input(self) -> bool {
        self == SessionState::InProgress
    }
}
