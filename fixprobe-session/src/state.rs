/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Session state machine.
//!
//! A connection walks `Disconnected -> Connecting -> LogonPending -> Active`
//! and ends in `Disconnected` again. Any other move is rejected.

use fixprobe_core::SessionError;
use std::fmt;

/// Lifecycle state of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// No transport, or the session has ended.
    #[default]
    Disconnected,
    /// Transport is being established.
    Connecting,
    /// Transport is up; the Logon exchange has not completed.
    LogonPending,
    /// Logon acknowledged; business messages may flow.
    Active,
}

impl SessionState {
    /// Returns true if `self -> next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Disconnected, Self::Connecting)
                | (Self::Connecting, Self::LogonPending)
                | (Self::LogonPending, Self::Active)
                | (Self::Connecting, Self::Disconnected)
                | (Self::LogonPending, Self::Disconnected)
                | (Self::Active, Self::Disconnected)
        )
    }

    /// Returns the state after moving to `next`.
    ///
    /// # Errors
    /// Returns `SessionError::InvalidState` if the move is not in the table.
    pub fn transition(self, next: Self) -> Result<Self, SessionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(SessionError::InvalidState {
                expected: format!("a state that may move to {next}"),
                current: self.to_string(),
            })
        }
    }

    /// Returns true when business messages may be exchanged.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns true while a transport is attached.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::LogonPending | Self::Active)
    }

    /// Returns the state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::LogonPending => "LogonPending",
            Self::Active => "Active",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let state = SessionState::default()
            .transition(SessionState::Connecting)
            .and_then(|s| s.transition(SessionState::LogonPending))
            .and_then(|s| s.transition(SessionState::Active))
            .and_then(|s| s.transition(SessionState::Disconnected))
            .unwrap();
        assert_eq!(state, SessionState::Disconnected);
    }

    #[test]
    fn test_illegal_transitions() {
        let err = SessionState::Disconnected
            .transition(SessionState::Active)
            .unwrap_err();
        assert!(err.is_protocol_violation());
        assert!(matches!(err, SessionError::InvalidState { ref current, .. } if current == "Disconnected"));

        assert!(!SessionState::Active.can_transition_to(SessionState::LogonPending));
        assert!(!SessionState::Connecting.can_transition_to(SessionState::Active));
        assert!(!SessionState::Disconnected.can_transition_to(SessionState::Disconnected));
    }
}
