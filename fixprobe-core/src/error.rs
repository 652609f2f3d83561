/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Error types for the fixprobe FIX test harness.
//!
//! This module provides a unified error hierarchy using `thiserror`. Each layer
//! owns one enum and [`FixError`] unifies them:
//! - [`DecodeError`]: malformed wire input, always rejected and never repaired
//! - [`BuildError`]: a typed message view is missing a required tag
//! - [`SessionError`]: protocol violations, bounded-wait expirations and transport failures
//! - [`TrackerError`]: invalid order transitions and failed verifications
//! - [`ConfigError`]: invalid configuration values

use thiserror::Error;

/// Result type alias using [`FixError`] as the error type.
pub type Result<T> = std::result::Result<T, FixError>;

/// Top-level error type for all fixprobe operations.
#[derive(Debug, Error)]
pub enum FixError {
    /// The bytes on the wire do not form a valid FIX message.
    #[error("malformed message: {0}")]
    Malformed(#[from] DecodeError),

    /// A typed message could not be constructed.
    #[error("build error: {0}")]
    Build(#[from] BuildError),

    /// Error in session layer operations.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Error raised by an order lifecycle tracker.
    #[error("tracker error: {0}")]
    Tracker(#[from] TrackerError),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error from underlying transport.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl FixError {
    /// Returns true if this error rejects a malformed wire message.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }

    /// Returns true if this error is a session protocol violation.
    #[must_use]
    pub const fn is_protocol_violation(&self) -> bool {
        match self {
            Self::Session(e) => e.is_protocol_violation(),
            _ => false,
        }
    }

    /// Returns true if this error is a bounded-wait expiration.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        match self {
            Self::Session(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Returns true if this error means the connection is gone.
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Session(e) => e.is_connection_error(),
            _ => false,
        }
    }
}

/// Errors that occur during FIX message decoding.
///
/// Every variant is a `MalformedMessage` condition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer is empty.
    #[error("empty message")]
    Empty,

    /// A field is not of the form `tag=value<SOH>`.
    #[error("invalid field structure at offset {offset}: {reason}")]
    InvalidFieldStructure {
        /// Byte offset of the offending field.
        offset: usize,
        /// Description of the structural problem.
        reason: &'static str,
    },

    /// Invalid tag format (not a positive integer).
    #[error("invalid tag format: {0}")]
    InvalidTag(String),

    /// Invalid BeginString field (tag 8) or tag 8 not first.
    #[error("invalid begin string: expected 8=FIX.x.y as first field")]
    InvalidBeginString,

    /// Missing BodyLength field (tag 9) in second position.
    #[error("missing body length field (tag 9)")]
    MissingBodyLength,

    /// BodyLength value is not a non-negative integer.
    #[error("invalid body length value")]
    InvalidBodyLength,

    /// BodyLength does not match the observed byte span.
    #[error("body length mismatch: declared {declared}, actual {actual}")]
    BodyLengthMismatch {
        /// BodyLength value carried by the message.
        declared: usize,
        /// Bytes observed between BodyLength and Checksum.
        actual: usize,
    },

    /// Missing MsgType field (tag 35) in third position.
    #[error("missing msg type field (tag 35)")]
    MissingMsgType,

    /// Missing Checksum trailer (tag 10).
    #[error("missing checksum field (tag 10)")]
    MissingChecksum,

    /// Checksum value is not exactly three decimal digits.
    #[error("invalid checksum format: {0:?}")]
    InvalidChecksum(String),

    /// Checksum mismatch between calculated and declared values.
    #[error("checksum mismatch: calculated {calculated}, declared {declared}")]
    ChecksumMismatch {
        /// Calculated checksum value.
        calculated: u8,
        /// Declared checksum value in message.
        declared: u8,
    },

    /// Bytes follow the Checksum field.
    #[error("{0} trailing bytes after checksum")]
    TrailingData(usize),

    /// Missing required header field.
    #[error("missing required field: tag {tag}")]
    MissingRequiredField {
        /// The tag number of the missing field.
        tag: u32,
    },

    /// Invalid field value for the expected type.
    #[error("invalid field value for tag {tag}: {reason}")]
    InvalidFieldValue {
        /// The tag number of the field.
        tag: u32,
        /// Description of why the value is invalid.
        reason: String,
    },

    /// Invalid UTF-8 in a field.
    #[error("invalid utf-8 in field: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// Errors raised while constructing a typed message view.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A tag the message type requires is absent.
    #[error("missing required field for msg type {msg_type}: tag {tag}")]
    MissingRequiredField {
        /// MsgType (tag 35) of the message being built.
        msg_type: &'static str,
        /// The tag number of the missing field.
        tag: u32,
    },

    /// The generic message has a different MsgType than the requested view.
    #[error("wrong msg type: expected {expected}, found {actual}")]
    WrongMsgType {
        /// MsgType of the requested view.
        expected: &'static str,
        /// MsgType carried by the message.
        actual: String,
    },

    /// A present field carries an unusable value.
    #[error("invalid field value for tag {tag}: {reason}")]
    InvalidFieldValue {
        /// The tag number of the field.
        tag: u32,
        /// Description of why the value is invalid.
        reason: String,
    },
}

/// Errors in FIX session layer operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Session is not in the correct state for the operation.
    #[error("invalid session state: expected {expected}, current {current}")]
    InvalidState {
        /// Expected state for the operation.
        expected: String,
        /// Current session state.
        current: String,
    },

    /// Sequence number gap detected.
    #[error("sequence gap detected: expected {expected}, received {received}")]
    SequenceGap {
        /// Expected sequence number.
        expected: u64,
        /// Received sequence number.
        received: u64,
    },

    /// Sequence number too low (possible duplicate).
    #[error("sequence too low: expected {expected}, received {received}")]
    SequenceTooLow {
        /// Expected sequence number.
        expected: u64,
        /// Received sequence number.
        received: u64,
    },

    /// MsgSeqNum is absent or not numeric.
    #[error("invalid msg seq num: {value:?}")]
    InvalidSeqNum {
        /// Raw tag 34 value, if any.
        value: Option<String>,
    },

    /// Inbound CompID does not mirror the session identity.
    #[error("comp id mismatch on tag {tag}: expected {expected}, received {received}")]
    CompIdMismatch {
        /// Tag carrying the mismatched identifier.
        tag: u32,
        /// Identifier the session expects.
        expected: String,
        /// Identifier the counterparty sent.
        received: String,
    },

    /// The counterparty's Logon carries an unusable HeartBtInt (108).
    #[error("invalid heartbeat interval: {value:?}")]
    InvalidHeartBtInt {
        /// Raw tag 108 value.
        value: String,
    },

    /// Logon was rejected by counterparty.
    #[error("logon rejected: {reason}")]
    LogonRejected {
        /// Reason for rejection.
        reason: String,
    },

    /// Heartbeat timeout - no response to TestRequest.
    #[error("heartbeat timeout after {elapsed_ms} milliseconds")]
    HeartbeatTimeout {
        /// Elapsed time in milliseconds since last inbound message.
        elapsed_ms: u64,
    },

    /// No Logon acknowledgment arrived in time.
    #[error("logon timeout after {timeout_ms} milliseconds")]
    LogonTimeout {
        /// Configured wait in milliseconds.
        timeout_ms: u64,
    },

    /// No matching ExecutionReport arrived in time.
    #[error("ack timeout for ClOrdID {cl_ord_id} after {timeout_ms} milliseconds")]
    AckTimeout {
        /// ClOrdID being waited on.
        cl_ord_id: String,
        /// Configured wait in milliseconds.
        timeout_ms: u64,
    },

    /// An outbound message carries a value that cannot be put on the wire.
    #[error("unencodable message: {0}")]
    Unencodable(#[from] BuildError),

    /// Connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// The session has already been closed.
    #[error("session disconnected")]
    Disconnected,
}

impl SessionError {
    /// Returns true for faults that force the session to disconnect.
    #[must_use]
    pub const fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidState { .. }
                | Self::SequenceGap { .. }
                | Self::SequenceTooLow { .. }
                | Self::InvalidSeqNum { .. }
                | Self::CompIdMismatch { .. }
                | Self::InvalidHeartBtInt { .. }
                | Self::LogonRejected { .. }
                | Self::HeartbeatTimeout { .. }
        )
    }

    /// Returns true for bounded-wait expirations the caller may recover from.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::LogonTimeout { .. } | Self::AckTimeout { .. })
    }

    /// Returns true for transport failures.
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Disconnected)
    }
}

/// Errors raised by an order lifecycle tracker.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// The action is not allowed from the current state.
    #[error("invalid transition: cannot {action} from state {state}")]
    InvalidTransition {
        /// The attempted action.
        action: String,
        /// The order state at the time of the attempt.
        state: String,
    },

    /// An expectation did not match the tracked order.
    #[error("verification failed on {field}: expected {expected}, actual {actual}")]
    VerificationFailed {
        /// Name of the compared attribute.
        field: &'static str,
        /// Expected value.
        expected: String,
        /// Actual value.
        actual: String,
    },

    /// An inbound report carries a value the tracker cannot apply.
    #[error("unusable report: {0}")]
    UnusableReport(String),
}

/// Errors for invalid configuration values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required value was not supplied.
    #[error("missing configuration value: {0}")]
    Missing(&'static str),

    /// A value is outside its allowed range.
    #[error("invalid configuration value for {field}: {reason}")]
    Invalid {
        /// Name of the configuration field.
        field: &'static str,
        /// Description of why the value is invalid.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::ChecksumMismatch {
            calculated: 100,
            declared: 200,
        };
        assert_eq!(
            err.to_string(),
            "checksum mismatch: calculated 100, declared 200"
        );
    }

    #[test]
    fn test_fix_error_from_decode_is_malformed() {
        let fix_err: FixError = DecodeError::MissingChecksum.into();
        assert!(fix_err.is_malformed());
        assert!(!fix_err.is_protocol_violation());
    }

    #[test]
    fn test_session_error_classification() {
        let gap = SessionError::SequenceGap {
            expected: 5,
            received: 7,
        };
        assert!(gap.is_protocol_violation());
        assert!(!gap.is_timeout());

        let ack = SessionError::AckTimeout {
            cl_ord_id: "C1".to_string(),
            timeout_ms: 5000,
        };
        assert!(ack.is_timeout());
        assert!(!ack.is_protocol_violation());

        let fix_err: FixError = SessionError::Disconnected.into();
        assert!(fix_err.is_connection_error());
    }

    #[test]
    fn test_build_error_display() {
        let err = BuildError::MissingRequiredField {
            msg_type: "D",
            tag: 11,
        };
        assert_eq!(
            err.to_string(),
            "missing required field for msg type D: tag 11"
        );
    }

    #[test]
    fn test_tracker_error_display() {
        let err = TrackerError::InvalidTransition {
            action: "issue cancel".to_string(),
            state: "PENDING_NEW".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid transition: cannot issue cancel from state PENDING_NEW"
        );
    }
}
