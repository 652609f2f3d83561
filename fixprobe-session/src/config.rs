/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Session configuration.
//!
//! This module provides configuration options for FIX sessions.

use crate::heartbeat::MAX_HEARTBEAT_INTERVAL;
use fixprobe_core::types::CompId;
use fixprobe_core::ConfigError;
use fixprobe_tagvalue::DEFAULT_BEGIN_STRING;
use std::time::Duration;

/// Configuration for a FIX session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Sender CompID (tag 49).
    pub sender_comp_id: CompId,
    /// Target CompID (tag 56).
    pub target_comp_id: CompId,
    /// FIX version BeginString (e.g., "FIX.4.4").
    pub begin_string: String,
    /// Heartbeat interval.
    pub heartbeat_interval: Duration,
    /// Maximum frame size in bytes.
    pub max_message_size: usize,
    /// Logon timeout duration.
    pub logon_timeout: Duration,
    /// Optional sender sub ID (tag 50).
    pub sender_sub_id: Option<String>,
    /// Optional target sub ID (tag 57).
    pub target_sub_id: Option<String>,
}

impl SessionConfig {
    /// Creates a new session configuration with required fields.
    ///
    /// # Arguments
    /// * `sender_comp_id` - The sender CompID
    /// * `target_comp_id` - The target CompID
    /// * `begin_string` - The FIX version string
    #[must_use]
    pub fn new(
        sender_comp_id: CompId,
        target_comp_id: CompId,
        begin_string: impl Into<String>,
    ) -> Self {
        Self {
            sender_comp_id,
            target_comp_id,
            begin_string: begin_string.into(),
            heartbeat_interval: Duration::from_secs(30),
            max_message_size: 64 * 1024,
            logon_timeout: Duration::from_secs(10),
            sender_sub_id: None,
            target_sub_id: None,
        }
    }

    /// Sets the heartbeat interval.
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets the maximum message size.
    #[must_use]
    pub const fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Sets the logon timeout.
    #[must_use]
    pub fn with_logon_timeout(mut self, timeout: Duration) -> Self {
        self.logon_timeout = timeout;
        self
    }

    /// Sets the sender sub ID.
    #[must_use]
    pub fn with_sender_sub_id(mut self, sub_id: impl Into<String>) -> Self {
        self.sender_sub_id = Some(sub_id.into());
        self
    }

    /// Sets the target sub ID.
    #[must_use]
    pub fn with_target_sub_id(mut self, sub_id: impl Into<String>) -> Self {
        self.target_sub_id = Some(sub_id.into());
        self
    }

    /// Returns the heartbeat interval in whole seconds, as sent in HeartBtInt (108).
    #[must_use]
    pub fn heartbeat_interval_secs(&self) -> u64 {
        self.heartbeat_interval.as_secs()
    }

    /// Returns a `SENDER->TARGET` label for log fields.
    #[must_use]
    pub fn session_id(&self) -> String {
        match &self.sender_sub_id {
            Some(sub) => format!("{}/{}->{}", self.sender_comp_id, sub, self.target_comp_id),
            None => format!("{}->{}", self.sender_comp_id, self.target_comp_id),
        }
    }

    /// Checks value ranges.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` for a heartbeat interval that is zero or
    /// above [`MAX_HEARTBEAT_INTERVAL`], a zero logon timeout or an empty
    /// BeginString.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.heartbeat_interval.is_zero() {
            return Err(ConfigError::Invalid {
                field: "heartbeat_interval",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.heartbeat_interval > MAX_HEARTBEAT_INTERVAL {
            return Err(ConfigError::Invalid {
                field: "heartbeat_interval",
                reason: format!("must not exceed {}s", MAX_HEARTBEAT_INTERVAL.as_secs()),
            });
        }
        if self.logon_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                field: "logon_timeout",
                reason: "must be greater than zero".to_string(),
            });
        }
        if !self.begin_string.starts_with("FIX") {
            return Err(ConfigError::Invalid {
                field: "begin_string",
                reason: format!("{:?} is not a FIX version", self.begin_string),
            });
        }
        Ok(())
    }
}

/// Builder for session configuration.
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    sender_comp_id: Option<String>,
    target_comp_id: Option<String>,
    begin_string: Option<String>,
    heartbeat_interval: Option<Duration>,
    logon_timeout: Option<Duration>,
    sender_sub_id: Option<String>,
    target_sub_id: Option<String>,
}

impl SessionConfigBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sender CompID.
    #[must_use]
    pub fn sender_comp_id(mut self, id: impl Into<String>) -> Self {
        self.sender_comp_id = Some(id.into());
        self
    }

    /// Sets the target CompID.
    #[must_use]
    pub fn target_comp_id(mut self, id: impl Into<String>) -> Self {
        self.target_comp_id = Some(id.into());
        self
    }

    /// Sets the FIX version.
    #[must_use]
    pub fn begin_string(mut self, version: impl Into<String>) -> Self {
        self.begin_string = Some(version.into());
        self
    }

    /// Sets the heartbeat interval.
    #[must_use]
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = Some(interval);
        self
    }

    /// Sets the logon timeout.
    #[must_use]
    pub fn logon_timeout(mut self, timeout: Duration) -> Self {
        self.logon_timeout = Some(timeout);
        self
    }

    /// Sets the sender sub ID.
    #[must_use]
    pub fn sender_sub_id(mut self, sub_id: impl Into<String>) -> Self {
        self.sender_sub_id = Some(sub_id.into());
        self
    }

    /// Sets the target sub ID.
    #[must_use]
    pub fn target_sub_id(mut self, sub_id: impl Into<String>) -> Self {
        self.target_sub_id = Some(sub_id.into());
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    /// Returns `ConfigError::Missing` when a CompID is not set and
    /// `ConfigError::Invalid` when a value is out of range.
    pub fn build(self) -> Result<SessionConfig, ConfigError> {
        let sender = comp_id("sender_comp_id", self.sender_comp_id)?;
        let target = comp_id("target_comp_id", self.target_comp_id)?;
        let begin_string = self
            .begin_string
            .unwrap_or_else(|| DEFAULT_BEGIN_STRING.to_string());

        let mut config = SessionConfig::new(sender, target, begin_string);
        if let Some(interval) = self.heartbeat_interval {
            config.heartbeat_interval = interval;
        }
        if let Some(timeout) = self.logon_timeout {
            config.logon_timeout = timeout;
        }
        config.sender_sub_id = self.sender_sub_id;
        config.target_sub_id = self.target_sub_id;

        config.validate()?;
        Ok(config)
    }
}

fn comp_id(field: &'static str, value: Option<String>) -> Result<CompId, ConfigError> {
    let value = value.ok_or(ConfigError::Missing(field))?;
    CompId::new(&value).ok_or_else(|| ConfigError::Invalid {
        field,
        reason: format!("{value:?} must be 1 to 32 characters"),
    })
}
