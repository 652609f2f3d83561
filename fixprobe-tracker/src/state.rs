/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Order state machine.
//!
//! | From            | Action        | To                   |
//! |-----------------|---------------|----------------------|
//! | Unsent          | issue New     | PendingNew           |
//! | PendingNew      | ack New       | New                  |
//! | PendingNew      | ack Reject    | Rejected             |
//! | New             | issue Cancel  | PendingCancel        |
//! | PendingCancel   | ack Canceled  | Canceled             |
//! | PendingCancel   | ack Reject    | New                  |
//! | New             | issue Replace | PendingReplace       |
//! | PendingReplace  | ack Replaced  | New                  |
//! | PendingReplace  | ack Reject    | New                  |
//! | New             | partial fill  | New                  |
//! | New             | full fill     | Filled               |
//!
//! Filled, Canceled and Rejected are terminal.

use fixprobe_core::TrackerError;
use std::fmt;

/// Lifecycle state of a tracked order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderState {
    /// Not yet sent.
    #[default]
    Unsent,
    /// NewOrderSingle sent, no acknowledgment yet.
    PendingNew,
    /// Working at the exchange.
    New,
    /// Cancel sent, no acknowledgment yet.
    PendingCancel,
    /// Replace sent, no acknowledgment yet.
    PendingReplace,
    /// Fully executed.
    Filled,
    /// Canceled by request.
    Canceled,
    /// Refused by the exchange.
    Rejected,
}

impl OrderState {
    /// Returns the state reached by applying `action`, if the table allows it.
    #[must_use]
    pub const fn next(self, action: OrderAction) -> Option<Self> {
        use OrderAction as A;
        Some(match (self, action) {
            (Self::Unsent, A::IssueNew) => Self::PendingNew,
            (Self::PendingNew, A::AckNew) => Self::New,
            (Self::PendingNew, A::AckReject) => Self::Rejected,
            (Self::New, A::IssueCancel) => Self::PendingCancel,
            (Self::PendingCancel, A::AckCanceled) => Self::Canceled,
            (Self::PendingCancel | Self::PendingReplace, A::AckReject)
            | (Self::PendingReplace, A::AckReplaced)
            | (Self::New, A::PartialFill) => Self::New,
            (Self::New, A::IssueReplace) => Self::PendingReplace,
            (Self::New, A::FullFill) => Self::Filled,
            _ => return None,
        })
    }

    /// Returns the state after `action`.
    ///
    /// # Errors
    /// Returns `TrackerError::InvalidTransition` naming the action and the
    /// current state if the pair is not in the table.
    pub fn transition(self, action: OrderAction) -> Result<Self, TrackerError> {
        self.next(action)
            .ok_or_else(|| TrackerError::InvalidTransition {
                action: action.to_string(),
                state: self.to_string(),
            })
    }

    /// Returns true if no further action is accepted.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Filled | Self::Canceled | Self::Rejected)
    }

    /// Returns true while a request awaits its acknowledgment.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(
            self,
            Self::PendingNew | Self::PendingCancel | Self::PendingReplace
        )
    }

    /// Returns the state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unsent => "UNSENT",
            Self::PendingNew => "PENDING_NEW",
            Self::New => "NEW",
            Self::PendingCancel => "PENDING_CANCEL",
            Self::PendingReplace => "PENDING_REPLACE",
            Self::Filled => "FILLED",
            Self::Canceled => "CANCELED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event that moves an order between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderAction {
    /// A NewOrderSingle is sent.
    IssueNew,
    /// The exchange acknowledged the order.
    AckNew,
    /// The exchange refused the pending request.
    AckReject,
    /// An OrderCancelRequest is sent.
    IssueCancel,
    /// The exchange confirmed the cancel.
    AckCanceled,
    /// An OrderCancelReplaceRequest is sent.
    IssueReplace,
    /// The exchange confirmed the replace.
    AckReplaced,
    /// An execution left quantity open.
    PartialFill,
    /// An execution completed the order.
    FullFill,
}

impl OrderAction {
    /// Returns the action name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IssueNew => "issue New",
            Self::AckNew => "ack New",
            Self::AckReject => "ack Reject",
            Self::IssueCancel => "issue Cancel",
            Self::AckCanceled => "ack Canceled",
            Self::IssueReplace => "issue Replace",
            Self::AckReplaced => "ack Replaced",
            Self::PartialFill => "partial fill",
            Self::FullFill => "full fill",
        }
    }
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_path() {
        let state = OrderState::default()
            .transition(OrderAction::IssueNew)
            .and_then(|s| s.transition(OrderAction::AckNew))
            .and_then(|s| s.transition(OrderAction::IssueCancel))
            .and_then(|s| s.transition(OrderAction::AckCanceled))
            .unwrap();
        assert_eq!(state, OrderState::Canceled);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_reject_returns_to_new_only_from_pending_amend() {
        assert_eq!(
            OrderState::PendingCancel.next(OrderAction::AckReject),
            Some(OrderState::New)
        );
        assert_eq!(
            OrderState::PendingReplace.next(OrderAction::AckReject),
            Some(OrderState::New)
        );
        assert_eq!(
            OrderState::PendingNew.next(OrderAction::AckReject),
            Some(OrderState::Rejected)
        );
        assert_eq!(OrderState::New.next(OrderAction::AckReject), None);
    }

    #[test]
    fn test_terminal_states_accept_nothing() {
        let actions = [
            OrderAction::IssueNew,
            OrderAction::AckNew,
            OrderAction::AckReject,
            OrderAction::IssueCancel,
            OrderAction::AckCanceled,
            OrderAction::IssueReplace,
            OrderAction::AckReplaced,
            OrderAction::PartialFill,
            OrderAction::FullFill,
        ];
        for state in [OrderState::Filled, OrderState::Canceled, OrderState::Rejected] {
            for action in actions {
                assert_eq!(state.next(action), None, "{state} accepted {action}");
            }
        }
    }

    #[test]
    fn test_invalid_transition_carries_context() {
        let err = OrderState::PendingNew
            .transition(OrderAction::IssueCancel)
            .unwrap_err();
        assert_eq!(
            err,
            TrackerError::InvalidTransition {
                action: "issue Cancel".to_string(),
                state: "PENDING_NEW".to_string(),
            }
        );
    }
}
