/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Core types for FIX protocol operations.
//!
//! This module provides fundamental types used throughout fixprobe:
//! - [`SeqNum`]: Sequence number wrapper
//! - [`Timestamp`]: FIX-formatted UTC timestamp
//! - [`CompId`]: Component identifier (SenderCompID, TargetCompID, sub IDs)
//! - [`Side`], [`OrdType`], [`ExecType`], [`OrdStatus`], [`CxlRejResponseTo`]: single-character code sets

use arrayvec::ArrayString;
use chrono::{DateTime, Utc};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum length for CompID strings in bytes.
pub const COMP_ID_MAX_LEN: usize = 32;

/// FIX message sequence number.
///
/// Sequence numbers start at 1 and increment for each message sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct SeqNum(u64);

impl SeqNum {
    /// Creates a new sequence number.
    ///
    /// # Arguments
    /// * `value` - The sequence number value (should be >= 1 for valid FIX messages)
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw sequence number value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns the next sequence number.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl Default for SeqNum {
    fn default() -> Self {
        Self(1)
    }
}

impl From<u64> for SeqNum {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for SeqNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// UTC timestamp rendered in FIX `UTCTimestamp` format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    nanos_since_epoch: u64,
}

impl Timestamp {
    /// Creates a timestamp from milliseconds since Unix epoch.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self {
            nanos_since_epoch: millis * 1_000_000,
        }
    }

    /// Returns the current UTC timestamp.
    #[inline]
    #[must_use]
    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    /// Returns milliseconds since Unix epoch.
    #[inline]
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.nanos_since_epoch / 1_000_000
    }

    /// Converts to a chrono `DateTime<Utc>`.
    #[must_use]
    pub fn to_datetime(self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.nanos_since_epoch as i64)
    }

    /// Formats the timestamp as `YYYYMMDD-HH:MM:SS.sss`, the SendingTime layout.
    #[must_use]
    pub fn format_millis(self) -> ArrayString<21> {
        let dt = self.to_datetime();
        let mut buf = ArrayString::new();
        let _ = std::fmt::write(
            &mut buf,
            format_args!("{}", dt.format("%Y%m%d-%H:%M:%S%.3f")),
        );
        buf
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self {
            nanos_since_epoch: dt.timestamp_nanos_opt().unwrap_or(0) as u64,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_millis())
    }
}

/// Component identifier for FIX sessions.
///
/// Used for SenderCompID (49), TargetCompID (56) and the sub IDs (50, 57).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct CompId(ArrayString<COMP_ID_MAX_LEN>);

impl CompId {
    /// Creates a new CompId from a string slice.
    ///
    /// # Returns
    /// `Some(CompId)` if the string is non-empty and fits within the maximum length.
    #[must_use]
    pub fn new(s: &str) -> Option<Self> {
        if s.is_empty() {
            return None;
        }
        ArrayString::from(s).ok().map(Self)
    }

    /// Returns the CompId as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for CompId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for CompId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompId {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or_else(|| UnknownCode {
            kind: "CompId",
            value: s.to_string(),
        })
    }
}

/// A string that is not a member of a FIX code set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind} value: {value:?}")]
pub struct UnknownCode {
    /// Name of the code set.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Declares a single-character FIX code set backed by its ASCII byte.
macro_rules! char_code_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $code:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromPrimitive)]
        #[repr(u8)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $code, )+
        }

        impl $name {
            /// Creates a value from its wire character.
            #[must_use]
            pub fn from_char(c: char) -> Option<Self> {
                if c.is_ascii() {
                    Self::from_u8(c as u8)
                } else {
                    None
                }
            }

            /// Returns the wire character of this value.
            #[inline]
            #[must_use]
            pub const fn as_char(self) -> char {
                self as u8 as char
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_char())
            }
        }

        impl FromStr for $name {
            type Err = UnknownCode;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::from_char(c),
                    _ => None,
                }
                .ok_or_else(|| UnknownCode {
                    kind: stringify!($name),
                    value: s.to_string(),
                })
            }
        }
    };
}

char_code_enum! {
    /// Order side (tag 54).
    Side {
        /// Buy order.
        Buy = b'1',
        /// Sell order.
        Sell = b'2',
        /// Buy minus.
        BuyMinus = b'3',
        /// Sell plus.
        SellPlus = b'4',
        /// Sell short.
        SellShort = b'5',
        /// Sell short exempt.
        SellShortExempt = b'6',
    }
}

impl Side {
    /// Returns true if this is a buy-side order.
    #[must_use]
    pub const fn is_buy(self) -> bool {
        matches!(self, Self::Buy | Self::BuyMinus)
    }
}

char_code_enum! {
    /// Order type (tag 40).
    OrdType {
        /// Market order.
        Market = b'1',
        /// Limit order, requires Price (44).
        Limit = b'2',
        /// Stop order.
        Stop = b'3',
        /// Stop limit order.
        StopLimit = b'4',
    }
}

impl OrdType {
    /// Returns true if orders of this type carry a Price (44).
    #[must_use]
    pub const fn requires_price(self) -> bool {
        matches!(self, Self::Limit | Self::StopLimit)
    }
}

char_code_enum! {
    /// Execution event type (tag 150).
    ExecType {
        /// New.
        New = b'0',
        /// Partial fill (FIX 4.2 and earlier).
        PartialFill = b'1',
        /// Fill (FIX 4.2 and earlier).
        Fill = b'2',
        /// Done for day.
        DoneForDay = b'3',
        /// Canceled.
        Canceled = b'4',
        /// Replaced.
        Replaced = b'5',
        /// Pending cancel.
        PendingCancel = b'6',
        /// Stopped.
        Stopped = b'7',
        /// Rejected.
        Rejected = b'8',
        /// Suspended.
        Suspended = b'9',
        /// Pending new.
        PendingNew = b'A',
        /// Calculated.
        Calculated = b'B',
        /// Expired.
        Expired = b'C',
        /// Restated.
        Restated = b'D',
        /// Pending replace.
        PendingReplace = b'E',
        /// Trade (FIX 4.4 and later fills).
        Trade = b'F',
    }
}

impl ExecType {
    /// Returns true for execution types that carry fill quantities.
    #[must_use]
    pub const fn is_fill(self) -> bool {
        matches!(self, Self::PartialFill | Self::Fill | Self::Trade)
    }
}

char_code_enum! {
    /// Order status (tag 39).
    OrdStatus {
        /// New.
        New = b'0',
        /// Partially filled.
        PartiallyFilled = b'1',
        /// Filled.
        Filled = b'2',
        /// Done for day.
        DoneForDay = b'3',
        /// Canceled.
        Canceled = b'4',
        /// Replaced.
        Replaced = b'5',
        /// Pending cancel.
        PendingCancel = b'6',
        /// Stopped.
        Stopped = b'7',
        /// Rejected.
        Rejected = b'8',
        /// Suspended.
        Suspended = b'9',
        /// Pending new.
        PendingNew = b'A',
        /// Calculated.
        Calculated = b'B',
        /// Expired.
        Expired = b'C',
        /// Accepted for bidding.
        AcceptedForBidding = b'D',
        /// Pending replace.
        PendingReplace = b'E',
    }
}

impl OrdStatus {
    /// Returns true if no further executions can occur.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Filled | Self::Canceled | Self::Rejected | Self::Expired
        )
    }
}

char_code_enum! {
    /// Request type an OrderCancelReject answers (tag 434).
    CxlRejResponseTo {
        /// OrderCancelRequest (F).
        CancelRequest = b'1',
        /// OrderCancelReplaceRequest (G).
        CancelReplaceRequest = b'2',
    }
}
