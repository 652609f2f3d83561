/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Message types for FIX protocol.
//!
//! This module provides:
//! - [`MsgType`]: Enumeration of the FIX message types the harness speaks
//! - [`Message`]: Ordered `tag=value` mapping with derived header accessors
//! - [`WireInfo`]: BodyLength and Checksum observed when a message was decoded

use crate::error::DecodeError;
use crate::field::{Field, parse_value, tags};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// FIX message types used by the session and order-entry layers.
///
/// Anything else is carried as `Custom(String)` so it can be rejected
/// at the session level instead of failing to decode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MsgType {
    /// Heartbeat (0) - Session level.
    #[default]
    Heartbeat,
    /// Test Request (1) - Session level.
    TestRequest,
    /// Reject (3) - Session level.
    Reject,
    /// Logout (5) - Session level.
    Logout,
    /// Execution Report (8).
    ExecutionReport,
    /// Order Cancel Reject (9).
    OrderCancelReject,
    /// Logon (A) - Session level.
    Logon,
    /// New Order Single (D).
    NewOrderSingle,
    /// Order Cancel Request (F).
    OrderCancelRequest,
    /// Order Cancel/Replace Request (G).
    OrderCancelReplaceRequest,
    /// Custom or unsupported message type.
    Custom(String),
}

impl FromStr for MsgType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "0" => Self::Heartbeat,
            "1" => Self::TestRequest,
            "3" => Self::Reject,
            "5" => Self::Logout,
            "8" => Self::ExecutionReport,
            "9" => Self::OrderCancelReject,
            "A" => Self::Logon,
            "D" => Self::NewOrderSingle,
            "F" => Self::OrderCancelRequest,
            "G" => Self::OrderCancelReplaceRequest,
            other => Self::Custom(other.to_string()),
        })
    }
}

impl From<&str> for MsgType {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(msg_type) => msg_type,
            Err(never) => match never {},
        }
    }
}

impl MsgType {
    /// Returns the wire representation of this message type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Heartbeat => "0",
            Self::TestRequest => "1",
            Self::Reject => "3",
            Self::Logout => "5",
            Self::ExecutionReport => "8",
            Self::OrderCancelReject => "9",
            Self::Logon => "A",
            Self::NewOrderSingle => "D",
            Self::OrderCancelRequest => "F",
            Self::OrderCancelReplaceRequest => "G",
            Self::Custom(s) => s.as_str(),
        }
    }

    /// Returns true if this is an administrative message.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Self::Heartbeat | Self::TestRequest | Self::Reject | Self::Logout | Self::Logon
        )
    }

    /// Returns true if this is an application message.
    #[must_use]
    pub fn is_app(&self) -> bool {
        !self.is_admin()
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// BodyLength and Checksum as observed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireInfo {
    /// Value of tag 9.
    pub body_length: usize,
    /// Value of tag 10.
    pub checksum: u8,
}

/// A FIX message as an ordered `tag=value` mapping.
///
/// BeginString (8), BodyLength (9) and Checksum (10) are not stored as fields:
/// BeginString is kept separately and the other two are computed by the
/// encoder. Setting a tag that is already present replaces its value in place.
///
/// Equality compares BeginString and the field set, ignoring field order
/// and [`WireInfo`].
#[derive(Debug, Clone)]
pub struct Message {
    begin_string: String,
    fields: SmallVec<[Field; 16]>,
    wire: Option<WireInfo>,
}

impl Message {
    /// Creates an empty message of the given type.
    ///
    /// # Arguments
    /// * `begin_string` - The FIX version string (e.g., "FIX.4.4")
    /// * `msg_type` - The message type written as tag 35
    #[must_use]
    pub fn new(begin_string: impl Into<String>, msg_type: MsgType) -> Self {
        let mut msg = Self {
            begin_string: begin_string.into(),
            fields: SmallVec::new(),
            wire: None,
        };
        msg.set(tags::MSG_TYPE, msg_type.as_str());
        msg
    }

    /// Creates a message from decoded parts.
    ///
    /// # Arguments
    /// * `begin_string` - The FIX version string
    /// * `fields` - Fields in wire order, excluding 8, 9 and 10
    /// * `wire` - BodyLength and Checksum observed on the wire
    #[must_use]
    pub fn from_parts(
        begin_string: impl Into<String>,
        fields: impl IntoIterator<Item = Field>,
        wire: Option<WireInfo>,
    ) -> Self {
        Self {
            begin_string: begin_string.into(),
            fields: fields.into_iter().collect(),
            wire,
        }
    }

    /// Sets a field, replacing any previous value for the tag.
    pub fn set(&mut self, tag: u32, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        match self.fields.iter_mut().find(|f| f.tag == tag) {
            Some(field) => field.value = value,
            None => self.fields.push(Field { tag, value }),
        }
        self
    }

    /// Builder form of [`Message::set`].
    #[must_use]
    pub fn with(mut self, tag: u32, value: impl Into<String>) -> Self {
        self.set(tag, value);
        self
    }

    /// Sets a field only when a value is supplied.
    pub fn set_opt<V: Into<String>>(&mut self, tag: u32, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.set(tag, value);
        }
        self
    }

    /// Removes a field, returning its previous value.
    pub fn remove(&mut self, tag: u32) -> Option<String> {
        let idx = self.fields.iter().position(|f| f.tag == tag)?;
        Some(self.fields.remove(idx).value)
    }

    /// Gets a field value by tag.
    #[must_use]
    pub fn get(&self, tag: u32) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.tag == tag)
            .map(|f| f.value.as_str())
    }

    /// Returns true if the tag is present.
    #[must_use]
    pub fn contains(&self, tag: u32) -> bool {
        self.fields.iter().any(|f| f.tag == tag)
    }

    /// Gets a field value parsed as the specified type.
    ///
    /// # Errors
    /// Returns `DecodeError::MissingRequiredField` if the tag is absent or
    /// `DecodeError::InvalidFieldValue` if it cannot be parsed.
    pub fn get_as<T: FromStr>(&self, tag: u32) -> Result<T, DecodeError> {
        let value = self
            .get(tag)
            .ok_or(DecodeError::MissingRequiredField { tag })?;
        parse_value(tag, value)
    }

    /// Gets an optional field parsed as the specified type.
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidFieldValue` if the tag is present but cannot be parsed.
    pub fn get_opt<T: FromStr>(&self, tag: u32) -> Result<Option<T>, DecodeError> {
        self.get(tag).map(|v| parse_value(tag, v)).transpose()
    }

    /// Returns an iterator over all fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Returns the number of fields, excluding 8, 9 and 10.
    #[inline]
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Returns the BeginString value (e.g., "FIX.4.4").
    #[must_use]
    pub fn begin_string(&self) -> &str {
        &self.begin_string
    }

    /// Returns the message type (tag 35).
    #[must_use]
    pub fn msg_type(&self) -> MsgType {
        MsgType::from(self.get(tags::MSG_TYPE).unwrap_or_default())
    }

    /// Returns true if tag 35 equals the given type.
    #[must_use]
    pub fn is(&self, msg_type: &MsgType) -> bool {
        self.get(tags::MSG_TYPE) == Some(msg_type.as_str())
    }

    /// Returns SenderCompID (49).
    #[must_use]
    pub fn sender_comp_id(&self) -> Option<&str> {
        self.get(tags::SENDER_COMP_ID)
    }

    /// Returns TargetCompID (56).
    #[must_use]
    pub fn target_comp_id(&self) -> Option<&str> {
        self.get(tags::TARGET_COMP_ID)
    }

    /// Returns MsgSeqNum (34) if present and numeric.
    #[must_use]
    pub fn msg_seq_num(&self) -> Option<u64> {
        self.get(tags::MSG_SEQ_NUM).and_then(|v| v.parse().ok())
    }

    /// Returns SendingTime (52).
    #[must_use]
    pub fn sending_time(&self) -> Option<&str> {
        self.get(tags::SENDING_TIME)
    }

    /// Returns ClOrdID (11).
    #[must_use]
    pub fn cl_ord_id(&self) -> Option<&str> {
        self.get(tags::CL_ORD_ID)
    }

    /// Returns OrigClOrdID (41).
    #[must_use]
    pub fn orig_cl_ord_id(&self) -> Option<&str> {
        self.get(tags::ORIG_CL_ORD_ID)
    }

    /// Returns BodyLength as observed when decoded.
    #[must_use]
    pub fn body_length(&self) -> Option<usize> {
        self.wire.map(|w| w.body_length)
    }

    /// Returns Checksum as observed when decoded.
    #[must_use]
    pub fn checksum(&self) -> Option<u8> {
        self.wire.map(|w| w.checksum)
    }

    /// Returns the wire metadata of a decoded message.
    #[must_use]
    pub fn wire_info(&self) -> Option<WireInfo> {
        self.wire
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.begin_string == other.begin_string
            && self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .all(|f| other.get(f.tag) == Some(f.value.as_str()))
    }
}

impl Eq for Message {}

impl fmt::Display for Message {
    /// Renders the message with `|` in place of SOH, for logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "8={}", self.begin_string)?;
        for field in &self.fields {
            write!(f, "|{field}")?;
        }
        Ok(())
    }
}
