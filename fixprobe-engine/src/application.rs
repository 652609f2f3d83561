/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Application callback interface.
//!
//! This module defines the callback interface an acceptor uses to hand
//! business messages to the code that answers them.

use crate::connection::Connection;
use async_trait::async_trait;
use fixprobe_core::Message;
use fixprobe_session::SessionConfig;

/// Session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId {
    /// BeginString (FIX version).
    pub begin_string: String,
    /// Sender CompID.
    pub sender_comp_id: String,
    /// Target CompID.
    pub target_comp_id: String,
    /// Optional sender sub ID.
    pub sender_sub_id: Option<String>,
    /// Optional target sub ID.
    pub target_sub_id: Option<String>,
}

impl SessionId {
    /// Creates a new session ID.
    #[must_use]
    pub fn new(
        begin_string: impl Into<String>,
        sender_comp_id: impl Into<String>,
        target_comp_id: impl Into<String>,
    ) -> Self {
        Self {
            begin_string: begin_string.into(),
            sender_comp_id: sender_comp_id.into(),
            target_comp_id: target_comp_id.into(),
            sender_sub_id: None,
            target_sub_id: None,
        }
    }

    /// Sets the target sub ID.
    #[must_use]
    pub fn with_target_sub_id(mut self, sub_id: impl Into<String>) -> Self {
        self.target_sub_id = Some(sub_id.into());
        self
    }
}

impl From<&SessionConfig> for SessionId {
    fn from(config: &SessionConfig) -> Self {
        Self {
            begin_string: config.begin_string.clone(),
            sender_comp_id: config.sender_comp_id.to_string(),
            target_comp_id: config.target_comp_id.to_string(),
            sender_sub_id: config.sender_sub_id.clone(),
            target_sub_id: config.target_sub_id.clone(),
        }
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}->{}",
            self.begin_string, self.sender_comp_id, self.target_comp_id
        )?;
        if let Some(sub) = &self.target_sub_id {
            write!(f, "/{sub}")?;
        }
        Ok(())
    }
}

/// Reason for rejecting a message with a session-level Reject (35=3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectReason {
    /// SessionRejectReason (373) code.
    pub code: u32,
    /// Human-readable rejection text.
    pub text: String,
    /// Reference tag that caused the rejection.
    pub ref_tag: Option<u32>,
}

impl RejectReason {
    /// Creates a new rejection reason.
    #[must_use]
    pub fn new(code: u32, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
            ref_tag: None,
        }
    }

    /// Sets the reference tag.
    #[must_use]
    pub const fn with_ref_tag(mut self, tag: u32) -> Self {
        self.ref_tag = Some(tag);
        self
    }
}

/// Application callback interface for an acceptor.
///
/// Responses returned from [`Application::on_message`] are stamped and
/// written in order on the connection the request arrived on. Messages
/// sent later through a retained [`Connection`] are serialized with them.
#[async_trait]
pub trait Application: Send + Sync + 'static {
    /// Called once the counterparty's Logon has been accepted and answered.
    async fn on_logon(&self, _connection: &Connection) {}

    /// Called when a logged-on connection ends, for any reason.
    async fn on_logout(&self, _connection: &Connection) {}

    /// Called for every business message.
    ///
    /// # Returns
    /// The responses to write back, or a `RejectReason` to answer with a
    /// session Reject.
    async fn on_message(
        &self,
        message: &Message,
        connection: &Connection,
    ) -> Result<Vec<Message>, RejectReason>;
}

/// Application that accepts every message without answering.
#[derive(Debug, Default)]
pub struct NoOpApplication;

#[async_trait]
impl Application for NoOpApplication {
    async fn on_message(
        &self,
        _message: &Message,
        _connection: &Connection,
    ) -> Result<Vec<Message>, RejectReason> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixprobe_core::CompId;

    #[test]
    fn test_session_id() {
        let id = SessionId::new("FIX.4.4", "SENDER", "TARGET");
        assert_eq!(id.begin_string, "FIX.4.4");
        assert_eq!(id.sender_comp_id, "SENDER");
        assert_eq!(id.target_comp_id, "TARGET");
        assert_eq!(id.to_string(), "FIX.4.4:SENDER->TARGET");
        assert_eq!(
            id.with_target_sub_id("W2").to_string(),
            "FIX.4.4:SENDER->TARGET/W2"
        );
    }

    #[test]
    fn test_session_id_from_config() {
        let config = SessionConfig::new(
            CompId::new("CLIENT").unwrap(),
            CompId::new("EXCHANGE").unwrap(),
            "FIX.4.2",
        )
        .with_sender_sub_id("W0");
        let id = SessionId::from(&config);
        assert_eq!(id.sender_sub_id.as_deref(), Some("W0"));
        assert_eq!(id.to_string(), "FIX.4.2:CLIENT->EXCHANGE");
    }

    #[test]
    fn test_reject_reason() {
        let reason = RejectReason::new(11, "Invalid MsgType").with_ref_tag(35);
        assert_eq!(reason.code, 11);
        assert_eq!(reason.text, "Invalid MsgType");
        assert_eq!(reason.ref_tag, Some(35));
    }
}
