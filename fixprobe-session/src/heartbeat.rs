/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Heartbeat and TestRequest management.
//!
//! This module handles FIX session liveness:
//! - A Heartbeat is due after one interval of outbound silence
//! - A TestRequest is due after two intervals of inbound silence
//! - The session times out when the TestRequest is not answered within one
//!   further interval
//!
//! Every check takes the current instant so timing can be driven from tests.

use std::time::{Duration, Instant};

/// Largest HeartBtInt either side may negotiate.
pub const MAX_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// What the session owner should do after a liveness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeartbeatAction {
    /// Send a Heartbeat (35=0).
    SendHeartbeat,
    /// Send a TestRequest (35=1) carrying this TestReqID.
    SendTestRequest(String),
    /// The counterparty did not answer a TestRequest in time.
    TimedOut {
        /// Inbound silence observed when the timeout fired.
        elapsed: Duration,
    },
}

/// Manages heartbeat timing for a FIX session.
#[derive(Debug)]
pub struct HeartbeatManager {
    /// Heartbeat interval.
    interval: Duration,
    /// Time of last message sent.
    last_sent: Instant,
    /// Time of last message received.
    last_received: Instant,
    /// Pending TestRequest ID, if any.
    test_request_pending: Option<String>,
    /// Time when TestRequest was sent.
    test_request_sent_at: Option<Instant>,
}

impl HeartbeatManager {
    /// Creates a new heartbeat manager with the specified interval.
    ///
    /// # Arguments
    /// * `interval` - The heartbeat interval
    /// * `now` - Start of both silence windows
    #[must_use]
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            last_sent: now,
            last_received: now,
            test_request_pending: None,
            test_request_sent_at: None,
        }
    }

    /// Records that a message was sent.
    #[inline]
    pub fn on_message_sent(&mut self, now: Instant) {
        self.last_sent = now;
    }

    /// Records that a message was received.
    ///
    /// If a TestRequest was pending and a Heartbeat with matching ID is received,
    /// the pending request is cleared.
    ///
    /// # Arguments
    /// * `now` - Arrival time
    /// * `is_heartbeat` - Whether the received message is a Heartbeat
    /// * `test_req_id` - The TestReqID from the Heartbeat, if present
    pub fn on_message_received(
        &mut self,
        now: Instant,
        is_heartbeat: bool,
        test_req_id: Option<&str>,
    ) {
        self.last_received = now;

        if is_heartbeat
            && let (Some(pending), Some(received)) = (&self.test_request_pending, test_req_id)
            && pending == received
        {
            self.test_request_pending = None;
            self.test_request_sent_at = None;
        }
    }

    /// Decides the next liveness action, if any.
    ///
    /// A returned `SendTestRequest` is recorded as pending and as outbound
    /// activity; a returned `SendHeartbeat` is not, the caller records it
    /// through [`HeartbeatManager::on_message_sent`] once written.
    pub fn poll(&mut self, now: Instant) -> Option<HeartbeatAction> {
        if let Some(sent_at) = self.test_request_sent_at {
            if now.saturating_duration_since(sent_at) >= self.interval {
                return Some(HeartbeatAction::TimedOut {
                    elapsed: now.saturating_duration_since(self.last_received),
                });
            }
        } else if now.saturating_duration_since(self.last_received)
            >= self.interval.saturating_mul(2)
        {
            let id = generate_test_req_id();
            self.test_request_pending = Some(id.clone());
            self.test_request_sent_at = Some(now);
            self.last_sent = now;
            return Some(HeartbeatAction::SendTestRequest(id));
        }

        if now.saturating_duration_since(self.last_sent) >= self.interval {
            return Some(HeartbeatAction::SendHeartbeat);
        }
        None
    }

    /// Returns the pending TestRequest ID, if any.
    #[must_use]
    pub fn pending_test_request(&self) -> Option<&str> {
        self.test_request_pending.as_deref()
    }

    /// Returns the heartbeat interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Replaces the heartbeat interval, e.g. with the counterparty's HeartBtInt.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }
}

/// Generates a unique TestReqID.
///
/// Uses the current timestamp in nanoseconds.
#[must_use]
pub fn generate_test_req_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();

    format!("TEST{nanos}")
}
