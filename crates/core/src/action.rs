//! Rejection reasons for session actions
//!
//! Rejections are ordinary outcomes, not faults: the session stays consistent and the
//! caller decides what to report.

/// Why an action was not applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionError {
    /// The session is paused (or was never started)
    NotRunning,
    /// The session has ended; only reset is accepted
    GameOver,
    /// A detected clear has not committed yet
    ClearPending,
    /// The move or rotation collides
    Blocked,
    /// No falling block exists
    NoActive,
    /// The session is already in the requested phase
    Unchanged,
}

impl ActionError {
    pub fn code(self) -> &'static str {
        match self {
            ActionError::NotRunning | ActionError::GameOver | ActionError::ClearPending => {
                "not_playable"
            }
            ActionError::Blocked => "blocked",
            ActionError::NoActive => "no_active",
            ActionError::Unchanged => "unchanged",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ActionError::NotRunning => "session is not running",
            ActionError::GameOver => "game is over",
            ActionError::ClearPending => "waiting for line clear to commit",
            ActionError::Blocked => "target position collides",
            ActionError::NoActive => "no active block",
            ActionError::Unchanged => "session is already in that phase",
        }
    }
}
