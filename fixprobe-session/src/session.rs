/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Sans-IO session core.
//!
//! [`Session`] owns the state, sequence counters and liveness timers of one
//! connection. It never touches a socket: callers feed it decoded inbound
//! messages, ask it to stamp outbound ones and poll it for heartbeat work.

use crate::config::SessionConfig;
use crate::heartbeat::{HeartbeatAction, HeartbeatManager, MAX_HEARTBEAT_INTERVAL};
use crate::sequence::SequenceManager;
use crate::state::SessionState;
use fixprobe_core::{Message, MsgType, SeqNum, SessionError, Timestamp, tags};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// How an inbound message was handled by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// The counterparty's Logon was accepted; the session is now Active.
    LogonAccepted {
        /// HeartBtInt (108) announced by the counterparty, in seconds.
        heart_bt_int: u64,
    },
    /// Administrative message consumed by the session.
    Admin {
        /// Response to write back, unstamped.
        reply: Option<Message>,
    },
    /// The counterparty asked to end the session.
    Logout,
    /// Business message for the application.
    Deliver,
}

/// State of one FIX session.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    id: String,
    state: SessionState,
    sequences: SequenceManager,
    heartbeat: HeartbeatManager,
    counterparty_sub_id: Option<String>,
}

impl Session {
    /// Creates a disconnected session.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            id: config.session_id(),
            heartbeat: HeartbeatManager::new(config.heartbeat_interval, Instant::now()),
            sequences: SequenceManager::new(),
            state: SessionState::Disconnected,
            counterparty_sub_id: None,
            config,
        }
    }

    /// Returns the session configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the `SENDER->TARGET` label used in logs.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns the next outgoing MsgSeqNum.
    #[must_use]
    pub fn next_sender_seq(&self) -> SeqNum {
        self.sequences.next_sender_seq()
    }

    /// Returns the next expected inbound MsgSeqNum.
    #[must_use]
    pub fn next_target_seq(&self) -> SeqNum {
        self.sequences.next_target_seq()
    }

    /// Returns the effective heartbeat interval.
    #[must_use]
    pub const fn heartbeat_interval(&self) -> Duration {
        self.heartbeat.interval()
    }

    /// Marks the transport as being established.
    ///
    /// # Errors
    /// Returns `SessionError::InvalidState` unless the session is Disconnected.
    pub fn on_connecting(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::Connecting)
    }

    /// Marks the transport as established; the Logon exchange may begin.
    ///
    /// # Errors
    /// Returns `SessionError::InvalidState` unless the session is Connecting.
    pub fn on_connected(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::LogonPending)?;
        self.heartbeat = HeartbeatManager::new(self.heartbeat.interval(), Instant::now());
        Ok(())
    }

    /// Ends the session. Calling it on a disconnected session does nothing.
    pub fn disconnect(&mut self) {
        if self.state != SessionState::Disconnected {
            info!(session = %self.id, from = %self.state, "session disconnected");
            self.state = SessionState::Disconnected;
        }
    }

    /// Stamps the header of an outbound message.
    ///
    /// Assigns SenderCompID, TargetCompID, the optional sub IDs, the next
    /// MsgSeqNum and SendingTime. While the Logon exchange is pending only
    /// Logon and Logout may be stamped.
    ///
    /// # Errors
    /// Returns `SessionError::InvalidState` if the session cannot send `msg`.
    pub fn stamp(&mut self, mut msg: Message) -> Result<Message, SessionError> {
        let allowed = match self.state {
            SessionState::Active => true,
            SessionState::LogonPending => {
                matches!(msg.msg_type(), MsgType::Logon | MsgType::Logout)
            }
            SessionState::Disconnected | SessionState::Connecting => false,
        };
        if !allowed {
            return Err(SessionError::InvalidState {
                expected: SessionState::Active.to_string(),
                current: self.state.to_string(),
            });
        }

        let seq = self.sequences.allocate_sender_seq();
        msg.set(tags::SENDER_COMP_ID, self.config.sender_comp_id.as_str())
            .set(tags::TARGET_COMP_ID, self.config.target_comp_id.as_str())
            .set(tags::MSG_SEQ_NUM, seq.to_string())
            .set(
                tags::SENDING_TIME,
                Timestamp::now().format_millis().as_str(),
            )
            .set_opt(tags::SENDER_SUB_ID, self.config.sender_sub_id.as_deref())
            .set_opt(
                tags::TARGET_SUB_ID,
                self.config
                    .target_sub_id
                    .as_deref()
                    .or(self.counterparty_sub_id.as_deref()),
            );
        self.heartbeat.on_message_sent(Instant::now());

        debug!(session = %self.id, seq = seq.value(), msg_type = %msg.msg_type(), "stamped outbound");
        Ok(msg)
    }

    /// Processes a decoded inbound message.
    ///
    /// Validates MsgSeqNum and the CompID mirror, records activity and
    /// drives the Logon and TestRequest exchanges. Any error is fatal: the
    /// session is Disconnected before the error is returned.
    ///
    /// # Errors
    /// Returns the protocol violation that ended the session.
    pub fn on_inbound(&mut self, msg: &Message) -> Result<Inbound, SessionError> {
        if !self.state.is_connected() {
            return Err(SessionError::InvalidState {
                expected: SessionState::Active.to_string(),
                current: self.state.to_string(),
            });
        }

        match self.process_inbound(msg) {
            Ok(inbound) => Ok(inbound),
            Err(e) => {
                error!(session = %self.id, error = %e, "protocol violation");
                self.disconnect();
                Err(e)
            }
        }
    }

    fn process_inbound(&mut self, msg: &Message) -> Result<Inbound, SessionError> {
        let seq = self.sequences.accept_incoming(msg.get(tags::MSG_SEQ_NUM))?;
        self.check_comp_ids(msg)?;

        let msg_type = msg.msg_type();
        debug!(session = %self.id, seq = seq.value(), msg_type = %msg_type, "received inbound");

        let is_heartbeat = msg_type == MsgType::Heartbeat;
        self.heartbeat
            .on_message_received(Instant::now(), is_heartbeat, msg.get(tags::TEST_REQ_ID));

        match (self.state, msg_type) {
            (_, MsgType::Logout) => Ok(Inbound::Logout),
            (SessionState::LogonPending, MsgType::Logon) => {
                let heart_bt_int = negotiated_heart_bt_int(msg.get(tags::HEART_BT_INT))?;
                if heart_bt_int > 0 {
                    self.heartbeat
                        .set_interval(Duration::from_secs(heart_bt_int));
                }
                self.counterparty_sub_id = msg.get(tags::SENDER_SUB_ID).map(str::to_string);
                self.transition(SessionState::Active)?;
                Ok(Inbound::LogonAccepted { heart_bt_int })
            }
            (SessionState::LogonPending, other) => Err(SessionError::InvalidState {
                expected: SessionState::Active.to_string(),
                current: format!("{} (received MsgType {other})", self.state),
            }),
            (_, MsgType::Logon) => Err(SessionError::InvalidState {
                expected: SessionState::LogonPending.to_string(),
                current: self.state.to_string(),
            }),
            (_, MsgType::Heartbeat) => Ok(Inbound::Admin { reply: None }),
            (_, MsgType::TestRequest) => {
                let mut reply = Message::new(&self.config.begin_string, MsgType::Heartbeat);
                reply.set_opt(tags::TEST_REQ_ID, msg.get(tags::TEST_REQ_ID));
                Ok(Inbound::Admin { reply: Some(reply) })
            }
            _ => Ok(Inbound::Deliver),
        }
    }

    fn check_comp_ids(&self, msg: &Message) -> Result<(), SessionError> {
        let checks = [
            (tags::SENDER_COMP_ID, self.config.target_comp_id.as_str()),
            (tags::TARGET_COMP_ID, self.config.sender_comp_id.as_str()),
        ];
        for (tag, expected) in checks {
            let received = msg.get(tag).unwrap_or_default();
            if received != expected {
                return Err(SessionError::CompIdMismatch {
                    tag,
                    expected: expected.to_string(),
                    received: received.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Runs the liveness checks at `now`.
    ///
    /// Returns `None` outside the Active state. A `TimedOut` result has
    /// already moved the session to Disconnected.
    pub fn poll_heartbeat(&mut self, now: Instant) -> Option<HeartbeatAction> {
        if !self.state.is_active() {
            return None;
        }
        let action = self.heartbeat.poll(now)?;
        match &action {
            HeartbeatAction::TimedOut { elapsed } => {
                error!(session = %self.id, elapsed_ms = elapsed.as_millis() as u64, "heartbeat timeout");
                self.disconnect();
            }
            HeartbeatAction::SendTestRequest(id) => {
                warn!(session = %self.id, test_req_id = %id, "inbound silence, sending TestRequest");
            }
            HeartbeatAction::SendHeartbeat => {}
        }
        Some(action)
    }

    /// Builds the unstamped message a liveness action asks for.
    #[must_use]
    pub fn liveness_message(&self, action: &HeartbeatAction) -> Option<Message> {
        match action {
            HeartbeatAction::SendHeartbeat => Some(Message::new(
                &self.config.begin_string,
                MsgType::Heartbeat,
            )),
            HeartbeatAction::SendTestRequest(id) => Some(
                Message::new(&self.config.begin_string, MsgType::TestRequest)
                    .with(tags::TEST_REQ_ID, id.as_str()),
            ),
            HeartbeatAction::TimedOut { .. } => None,
        }
    }

    /// Builds an unstamped Logon announcing this session's heartbeat interval.
    #[must_use]
    pub fn logon_message(&self) -> Message {
        Message::new(&self.config.begin_string, MsgType::Logon)
            .with(tags::ENCRYPT_METHOD, "0")
            .with(
                tags::HEART_BT_INT,
                self.heartbeat.interval().as_secs().to_string(),
            )
    }

    /// Builds an unstamped Logout.
    #[must_use]
    pub fn logout_message(&self, text: Option<&str>) -> Message {
        let mut msg = Message::new(&self.config.begin_string, MsgType::Logout);
        msg.set_opt(tags::TEXT, text);
        msg
    }

    fn transition(&mut self, next: SessionState) -> Result<(), SessionError> {
        let from = self.state;
        self.state = from.transition(next)?;
        info!(session = %self.id, %from, to = %next, "session state changed");
        Ok(())
    }
}

/// HeartBtInt in seconds; absent means 0, meaning keep the configured interval.
fn negotiated_heart_bt_int(raw: Option<&str>) -> Result<u64, SessionError> {
    let Some(raw) = raw else {
        return Ok(0);
    };
    raw.parse::<u64>()
        .ok()
        .filter(|&secs| secs <= MAX_HEARTBEAT_INTERVAL.as_secs())
        .ok_or_else(|| SessionError::InvalidHeartBtInt {
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfigBuilder;
    use fixprobe_tagvalue::{decode, encode};

    fn config(sender: &str, target: &str) -> SessionConfig {
        SessionConfigBuilder::new()
            .sender_comp_id(sender)
            .target_comp_id(target)
            .heartbeat_interval(Duration::from_secs(1))
            .build()
            .unwrap()
    }

    fn wire(msg: &Message) -> Message {
        decode(&encode(msg).unwrap()).unwrap()
    }

    fn connected(config: SessionConfig) -> Session {
        let mut session = Session::new(config);
        session.on_connecting().unwrap();
        session.on_connected().unwrap();
        session
    }

    fn established_pair() -> (Session, Session) {
        let mut client = connected(config("CLIENT", "SERVER").with_sender_sub_id("W1"));
        let mut server = connected(config("SERVER", "CLIENT"));

        let logon = wire(&client.stamp(client.logon_message()).unwrap());
        assert_eq!(
            server.on_inbound(&logon).unwrap(),
            Inbound::LogonAccepted { heart_bt_int: 1 }
        );
        let ack = wire(&server.stamp(server.logon_message()).unwrap());
        assert_eq!(
            client.on_inbound(&ack).unwrap(),
            Inbound::LogonAccepted { heart_bt_int: 1 }
        );
        assert_eq!(client.state(), SessionState::Active);
        assert_eq!(server.state(), SessionState::Active);
        (client, server)
    }

    fn order(cl_ord_id: &str) -> Message {
        Message::new("FIX.4.4", MsgType::NewOrderSingle).with(tags::CL_ORD_ID, cl_ord_id)
    }

    #[test]
    fn test_logon_handshake_echoes_sub_id() {
        let (_client, mut server) = established_pair();
        let msg = server.stamp(order("X")).unwrap();
        assert_eq!(msg.get(tags::TARGET_SUB_ID), Some("W1"));
        assert_eq!(msg.sender_comp_id(), Some("SERVER"));
        assert_eq!(msg.msg_seq_num(), Some(2));
    }

    #[test]
    fn test_in_order_messages_have_consecutive_seq_nums() {
        let (mut client, mut server) = established_pair();

        let mut last = 1;
        for i in 0..20 {
            let msg = wire(&client.stamp(order(&format!("C{i}"))).unwrap());
            let seq = msg.msg_seq_num().unwrap();
            assert_eq!(seq, last + 1);
            last = seq;
            assert_eq!(server.on_inbound(&msg).unwrap(), Inbound::Deliver);
        }
        assert_eq!(server.next_target_seq().value(), 22);
        assert_eq!(server.state(), SessionState::Active);
    }

    #[test]
    fn test_seq_gap_disconnects() {
        let (mut client, mut server) = established_pair();

        let mut msg = client.stamp(order("C1")).unwrap();
        let expected = server.next_target_seq().value();
        msg.set(tags::MSG_SEQ_NUM, (expected + 2).to_string());

        let err = server.on_inbound(&wire(&msg)).unwrap_err();
        assert_eq!(
            err,
            SessionError::SequenceGap {
                expected,
                received: expected + 2
            }
        );
        assert!(err.is_protocol_violation());
        assert_eq!(server.state(), SessionState::Disconnected);

        // A disconnected session accepts nothing further.
        assert!(server.on_inbound(&wire(&msg)).is_err());
        assert!(server.stamp(order("C2")).is_err());
    }

    #[test]
    fn test_low_and_non_numeric_seq_disconnect() {
        let (mut client, mut server) = established_pair();
        let mut msg = client.stamp(order("C1")).unwrap();
        msg.set(tags::MSG_SEQ_NUM, "1");
        assert!(matches!(
            server.on_inbound(&wire(&msg)),
            Err(SessionError::SequenceTooLow { .. })
        ));
        assert_eq!(server.state(), SessionState::Disconnected);

        let (mut client, mut server) = established_pair();
        let mut msg = client.stamp(order("C1")).unwrap();
        msg.set(tags::MSG_SEQ_NUM, "two");
        assert!(matches!(
            server.on_inbound(&wire(&msg)),
            Err(SessionError::InvalidSeqNum { .. })
        ));
        assert_eq!(server.state(), SessionState::Disconnected);
    }

    #[test]
    fn test_comp_id_mirror_enforced() {
        let mut client = connected(config("INTRUDER", "SERVER"));
        let mut server = connected(config("SERVER", "CLIENT"));

        let logon = wire(&client.stamp(client.logon_message()).unwrap());
        let err = server.on_inbound(&logon).unwrap_err();
        assert!(matches!(
            err,
            SessionError::CompIdMismatch {
                tag: tags::SENDER_COMP_ID,
                ..
            }
        ));
        assert_eq!(server.state(), SessionState::Disconnected);
    }

    #[test]
    fn test_first_message_must_be_logon() {
        let mut client = connected(config("CLIENT", "SERVER"));
        let mut server = connected(config("SERVER", "CLIENT"));

        assert!(client.stamp(order("C1")).is_err());

        let mut early = order("C1");
        early
            .set(tags::SENDER_COMP_ID, "CLIENT")
            .set(tags::TARGET_COMP_ID, "SERVER")
            .set(tags::MSG_SEQ_NUM, "1")
            .set(tags::SENDING_TIME, "20260127-10:00:00.000");
        let err = server.on_inbound(&wire(&early)).unwrap_err();
        assert!(err.is_protocol_violation());
        assert_eq!(server.state(), SessionState::Disconnected);
    }

    #[test]
    fn test_test_request_answered_with_heartbeat() {
        let (mut client, mut server) = established_pair();
        let test_request = client
            .stamp(
                Message::new("FIX.4.4", MsgType::TestRequest).with(tags::TEST_REQ_ID, "PING-7"),
            )
            .unwrap();

        let Inbound::Admin { reply: Some(reply) } = server.on_inbound(&wire(&test_request)).unwrap()
        else {
            panic!("expected a Heartbeat reply");
        };
        assert_eq!(reply.msg_type(), MsgType::Heartbeat);
        assert_eq!(reply.get(tags::TEST_REQ_ID), Some("PING-7"));
    }

    #[test]
    fn test_unanswered_test_request_times_out() {
        let (mut client, _server) = established_pair();
        let start = Instant::now();

        let action = client.poll_heartbeat(start + Duration::from_secs(2));
        let Some(HeartbeatAction::SendTestRequest(id)) = action.clone() else {
            panic!("expected TestRequest, got {action:?}");
        };
        let msg = client
            .liveness_message(&HeartbeatAction::SendTestRequest(id.clone()))
            .unwrap();
        assert_eq!(msg.get(tags::TEST_REQ_ID), Some(id.as_str()));

        let action = client.poll_heartbeat(start + Duration::from_secs(4));
        assert!(matches!(action, Some(HeartbeatAction::TimedOut { .. })));
        assert_eq!(client.state(), SessionState::Disconnected);
        assert_eq!(client.poll_heartbeat(start + Duration::from_secs(5)), None);
    }

    #[test]
    fn test_logout_is_reported() {
        let (mut client, mut server) = established_pair();
        let logout = client.stamp(client.logout_message(Some("bye"))).unwrap();
        assert_eq!(server.on_inbound(&wire(&logout)).unwrap(), Inbound::Logout);
    }

    #[test]
    fn test_out_of_range_heart_bt_int_disconnects() {
        for raw in ["18446744073709551615", "86401", "-30", "abc"] {
            let mut client = connected(config("CLIENT", "SERVER"));
            let mut server = connected(config("SERVER", "CLIENT"));
            let mut logon = client.stamp(client.logon_message()).unwrap();
            logon.set(tags::HEART_BT_INT, raw);

            let err = server.on_inbound(&wire(&logon)).unwrap_err();
            assert_eq!(
                err,
                SessionError::InvalidHeartBtInt {
                    value: raw.to_string()
                }
            );
            assert!(err.is_protocol_violation());
            assert_eq!(server.state(), SessionState::Disconnected);
            assert_eq!(
                server.poll_heartbeat(Instant::now() + Duration::from_secs(10)),
                None
            );
        }
    }

    #[test]
    fn test_heart_bt_int_adopted_up_to_one_day() {
        let mut client = connected(config("CLIENT", "SERVER"));
        let mut server = connected(config("SERVER", "CLIENT"));
        let mut logon = client.stamp(client.logon_message()).unwrap();
        logon.set(tags::HEART_BT_INT, "86400");

        assert_eq!(
            server.on_inbound(&wire(&logon)).unwrap(),
            Inbound::LogonAccepted {
                heart_bt_int: 86_400
            }
        );
        assert_eq!(
            server.poll_heartbeat(Instant::now() + Duration::from_secs(3600)),
            None
        );
    }
}
