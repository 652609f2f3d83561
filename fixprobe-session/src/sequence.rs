/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Sequence number management.
//!
//! Outgoing numbers are allocated exactly once and never reused. Incoming
//! numbers must equal the expected value; anything else is a session fault,
//! since no resend recovery is performed.

use fixprobe_core::SessionError;
use fixprobe_core::types::SeqNum;
use std::sync::atomic::{AtomicU64, Ordering};

/// Manages sequence numbers for a FIX session.
///
/// Uses atomic operations so counters can be read without holding the
/// session lock.
#[derive(Debug)]
pub struct SequenceManager {
    /// Next outgoing sequence number.
    next_sender_seq: AtomicU64,
    /// Next expected incoming sequence number.
    next_target_seq: AtomicU64,
}

impl SequenceManager {
    /// Creates a new sequence manager with sequence numbers starting at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::with_initial(1, 1)
    }

    /// Creates a new sequence manager with specified starting values.
    ///
    /// # Arguments
    /// * `sender_seq` - Initial sender sequence number
    /// * `target_seq` - Initial target sequence number
    #[must_use]
    pub fn with_initial(sender_seq: u64, target_seq: u64) -> Self {
        Self {
            next_sender_seq: AtomicU64::new(sender_seq),
            next_target_seq: AtomicU64::new(target_seq),
        }
    }

    /// Returns the next sender sequence number without incrementing.
    #[inline]
    #[must_use]
    pub fn next_sender_seq(&self) -> SeqNum {
        SeqNum::new(self.next_sender_seq.load(Ordering::SeqCst))
    }

    /// Returns the next target sequence number without incrementing.
    #[inline]
    #[must_use]
    pub fn next_target_seq(&self) -> SeqNum {
        SeqNum::new(self.next_target_seq.load(Ordering::SeqCst))
    }

    /// Allocates and returns the next sender sequence number.
    #[inline]
    pub fn allocate_sender_seq(&self) -> SeqNum {
        SeqNum::new(self.next_sender_seq.fetch_add(1, Ordering::SeqCst))
    }

    /// Validates the raw MsgSeqNum (34) of an inbound message and, when it
    /// equals the expected value, advances the expected counter.
    ///
    /// # Errors
    /// - `SessionError::InvalidSeqNum` if the value is absent or not numeric
    /// - `SessionError::SequenceTooLow` if it is below the expected value
    /// - `SessionError::SequenceGap` if it is above the expected value
    pub fn accept_incoming(&self, raw: Option<&str>) -> Result<SeqNum, SessionError> {
        let received = raw
            .filter(|v| !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or_else(|| SessionError::InvalidSeqNum {
                value: raw.map(str::to_string),
            })?;

        let expected = self.next_target_seq.load(Ordering::SeqCst);
        if received < expected {
            return Err(SessionError::SequenceTooLow { expected, received });
        }
        if received > expected {
            return Err(SessionError::SequenceGap { expected, received });
        }

        self.next_target_seq.store(expected + 1, Ordering::SeqCst);
        Ok(SeqNum::new(received))
    }
}

impl Default for SequenceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_manager_new() {
        let mgr = SequenceManager::new();
        assert_eq!(mgr.next_sender_seq().value(), 1);
        assert_eq!(mgr.next_target_seq().value(), 1);
    }

    #[test]
    fn test_allocate_sender_seq() {
        let mgr = SequenceManager::new();

        let seq1 = mgr.allocate_sender_seq();
        assert_eq!(seq1.value(), 1);
        assert_eq!(mgr.next_sender_seq().value(), 2);

        let seq2 = mgr.allocate_sender_seq();
        assert_eq!(seq2.value(), 2);
        assert_eq!(mgr.next_sender_seq().value(), 3);
    }

    #[test]
    fn test_accept_incoming_in_order() {
        let mgr = SequenceManager::new();

        for expected in 1..=5 {
            let seq = mgr.accept_incoming(Some(&expected.to_string())).unwrap();
            assert_eq!(seq.value(), expected);
        }
        assert_eq!(mgr.next_target_seq().value(), 6);
    }

    #[test]
    fn test_accept_incoming_faults() {
        let mgr = SequenceManager::with_initial(1, 5);

        assert_eq!(
            mgr.accept_incoming(Some("4")),
            Err(SessionError::SequenceTooLow {
                expected: 5,
                received: 4
            })
        );
        assert_eq!(
            mgr.accept_incoming(Some("7")),
            Err(SessionError::SequenceGap {
                expected: 5,
                received: 7
            })
        );
        assert_eq!(
            mgr.accept_incoming(Some("5x")),
            Err(SessionError::InvalidSeqNum {
                value: Some("5x".to_string())
            })
        );
        assert_eq!(
            mgr.accept_incoming(None),
            Err(SessionError::InvalidSeqNum { value: None })
        );

        // Rejected values leave the expected counter untouched.
        assert_eq!(mgr.next_target_seq().value(), 5);
    }
}
