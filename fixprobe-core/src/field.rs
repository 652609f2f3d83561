/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Field types for FIX protocol messages.
//!
//! This module provides:
//! - [`tags`]: Tag numbers used by the session and order-entry layers
//! - [`Field`]: One owned `tag=value` pair with typed accessors

use crate::error::DecodeError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tag numbers used by the harness.
pub mod tags {
    /// AvgPx.
    pub const AVG_PX: u32 = 6;
    /// BeginString.
    pub const BEGIN_STRING: u32 = 8;
    /// BodyLength.
    pub const BODY_LENGTH: u32 = 9;
    /// CheckSum.
    pub const CHECKSUM: u32 = 10;
    /// ClOrdID.
    pub const CL_ORD_ID: u32 = 11;
    /// CumQty.
    pub const CUM_QTY: u32 = 14;
    /// ExecID.
    pub const EXEC_ID: u32 = 17;
    /// LastPx.
    pub const LAST_PX: u32 = 31;
    /// LastQty.
    pub const LAST_QTY: u32 = 32;
    /// MsgSeqNum.
    pub const MSG_SEQ_NUM: u32 = 34;
    /// MsgType.
    pub const MSG_TYPE: u32 = 35;
    /// OrderID.
    pub const ORDER_ID: u32 = 37;
    /// OrderQty.
    pub const ORDER_QTY: u32 = 38;
    /// OrdStatus.
    pub const ORD_STATUS: u32 = 39;
    /// OrdType.
    pub const ORD_TYPE: u32 = 40;
    /// OrigClOrdID.
    pub const ORIG_CL_ORD_ID: u32 = 41;
    /// Price.
    pub const PRICE: u32 = 44;
    /// RefSeqNum.
    pub const REF_SEQ_NUM: u32 = 45;
    /// SenderCompID.
    pub const SENDER_COMP_ID: u32 = 49;
    /// SenderSubID.
    pub const SENDER_SUB_ID: u32 = 50;
    /// SendingTime.
    pub const SENDING_TIME: u32 = 52;
    /// Side.
    pub const SIDE: u32 = 54;
    /// Symbol.
    pub const SYMBOL: u32 = 55;
    /// TargetCompID.
    pub const TARGET_COMP_ID: u32 = 56;
    /// TargetSubID.
    pub const TARGET_SUB_ID: u32 = 57;
    /// Text.
    pub const TEXT: u32 = 58;
    /// TimeInForce.
    pub const TIME_IN_FORCE: u32 = 59;
    /// TransactTime.
    pub const TRANSACT_TIME: u32 = 60;
    /// EncryptMethod.
    pub const ENCRYPT_METHOD: u32 = 98;
    /// CxlRejReason.
    pub const CXL_REJ_REASON: u32 = 102;
    /// HeartBtInt.
    pub const HEART_BT_INT: u32 = 108;
    /// TestReqID.
    pub const TEST_REQ_ID: u32 = 112;
    /// ExecType.
    pub const EXEC_TYPE: u32 = 150;
    /// LeavesQty.
    pub const LEAVES_QTY: u32 = 151;
    /// RefTagID.
    pub const REF_TAG_ID: u32 = 371;
    /// RefMsgType.
    pub const REF_MSG_TYPE: u32 = 372;
    /// SessionRejectReason.
    pub const SESSION_REJECT_REASON: u32 = 373;
    /// CxlRejResponseTo.
    pub const CXL_REJ_RESPONSE_TO: u32 = 434;

    /// Standard header tags in the order they are written after BodyLength.
    pub const HEADER_ORDER: [u32; 7] = [
        MSG_TYPE,
        SENDER_COMP_ID,
        TARGET_COMP_ID,
        MSG_SEQ_NUM,
        SENDING_TIME,
        SENDER_SUB_ID,
        TARGET_SUB_ID,
    ];

    /// Header tags every decoded message must carry beyond 8, 9 and 35.
    pub const REQUIRED_HEADER: [u32; 4] =
        [SENDER_COMP_ID, TARGET_COMP_ID, MSG_SEQ_NUM, SENDING_TIME];

    /// Returns true for tags placed in the standard header.
    #[inline]
    #[must_use]
    pub const fn is_header(tag: u32) -> bool {
        matches!(
            tag,
            BEGIN_STRING
                | BODY_LENGTH
                | MSG_TYPE
                | SENDER_COMP_ID
                | TARGET_COMP_ID
                | MSG_SEQ_NUM
                | SENDING_TIME
                | SENDER_SUB_ID
                | TARGET_SUB_ID
        )
    }
}

/// One owned `tag=value` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    /// The field tag number.
    pub tag: u32,
    /// The field value, without delimiters.
    pub value: String,
}

impl Field {
    /// Creates a new field.
    ///
    /// # Arguments
    /// * `tag` - The tag number
    /// * `value` - The field value
    #[inline]
    #[must_use]
    pub fn new(tag: u32, value: impl Into<String>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }

    /// Returns the value as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Parses the value as the specified type.
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidFieldValue` if parsing fails.
    pub fn parse<T: FromStr>(&self) -> Result<T, DecodeError> {
        parse_value(self.tag, &self.value)
    }

    /// Returns the value as a u64.
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidFieldValue` if the value is not a valid integer.
    pub fn as_u64(&self) -> Result<u64, DecodeError> {
        self.parse()
    }

    /// Returns the value as a Decimal.
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidFieldValue` if the value is not a valid decimal.
    pub fn as_decimal(&self) -> Result<Decimal, DecodeError> {
        self.parse()
    }

    /// Returns the value as a single character.
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidFieldValue` if the value is not a single ASCII character.
    pub fn as_char(&self) -> Result<char, DecodeError> {
        let bytes = self.value.as_bytes();
        if bytes.len() == 1 && bytes[0].is_ascii() {
            Ok(bytes[0] as char)
        } else {
            Err(DecodeError::InvalidFieldValue {
                tag: self.tag,
                reason: "expected single ASCII character".to_string(),
            })
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.tag, self.value)
    }
}

/// Parses a raw field value, reporting the tag on failure.
///
/// # Errors
/// Returns `DecodeError::InvalidFieldValue` if parsing fails.
pub fn parse_value<T: FromStr>(tag: u32, value: &str) -> Result<T, DecodeError> {
    value.parse().map_err(|_| DecodeError::InvalidFieldValue {
        tag,
        reason: format!(
            "failed to parse '{}' as {}",
            value,
            std::any::type_name::<T>()
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_parse() {
        let field = Field::new(tags::ORDER_QTY, "100");
        assert_eq!(field.as_u64().unwrap(), 100);

        let price = Field::new(tags::PRICE, "100.50");
        assert_eq!(price.as_decimal().unwrap(), Decimal::new(10050, 2));
    }

    #[test]
    fn test_field_parse_failure_reports_tag() {
        let field = Field::new(tags::MSG_SEQ_NUM, "abc");
        let err = field.as_u64().unwrap_err();
        assert!(matches!(err, DecodeError::InvalidFieldValue { tag: 34, .. }));
    }

    #[test]
    fn test_field_as_char() {
        assert_eq!(Field::new(tags::SIDE, "1").as_char().unwrap(), '1');
        assert!(Field::new(tags::SIDE, "12").as_char().is_err());
    }

    #[test]
    fn test_field_display() {
        assert_eq!(Field::new(tags::SYMBOL, "AAPL").to_string(), "55=AAPL");
    }

    #[test]
    fn test_header_classification() {
        assert!(tags::is_header(tags::SENDER_SUB_ID));
        assert!(!tags::is_header(tags::CL_ORD_ID));
        assert!(!tags::is_header(tags::CHECKSUM));
    }
}
