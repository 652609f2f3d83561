/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FIX message encoder.
//!
//! [`Encoder`] appends `tag=value` fields and frames them with BeginString,
//! BodyLength and Checksum. [`encode`] writes a [`Message`] in canonical order:
//! standard header first, business fields in insertion order, trailer last.
//! A value the decoder would not read back unchanged is refused instead of
//! being written.

use crate::checksum::{calculate_checksum, format_checksum};
use bytes::{BufMut, BytesMut};
use fixprobe_core::{BuildError, Message, SOH, tags};
use memchr::memchr;
use rust_decimal::Decimal;

/// Checks that every value of `msg` survives the wire unchanged.
///
/// # Errors
/// Returns `BuildError::InvalidFieldValue` for tag 0, an empty value or a
/// value containing SOH.
pub fn check_values(msg: &Message) -> Result<(), BuildError> {
    check_value(tags::BEGIN_STRING, msg.begin_string())?;
    msg.fields()
        .filter(|f| f.tag != tags::BODY_LENGTH && f.tag != tags::CHECKSUM)
        .try_for_each(|f| check_value(f.tag, &f.value))
}

fn check_value(tag: u32, value: &str) -> Result<(), BuildError> {
    let reason = if tag == 0 {
        "tag must be positive"
    } else if value.is_empty() {
        "empty value"
    } else if memchr(SOH, value.as_bytes()).is_some() {
        "value contains SOH"
    } else {
        return Ok(());
    };
    Err(BuildError::InvalidFieldValue {
        tag,
        reason: reason.to_string(),
    })
}

/// Encodes a message to its wire form.
///
/// BodyLength and Checksum are computed; any 8, 9 or 10 stored as a field is ignored.
///
/// # Errors
/// Fails as [`check_values`] does; nothing is written for such a message.
///
/// # Example
/// ```
/// use fixprobe_core::{Message, MsgType};
/// use fixprobe_tagvalue::encode;
///
/// let msg = Message::new("FIX.4.4", MsgType::Heartbeat);
/// let wire = encode(&msg).unwrap();
/// assert!(wire.starts_with(b"8=FIX.4.4\x019=5\x0135=0\x01"));
/// ```
pub fn encode(msg: &Message) -> Result<BytesMut, BuildError> {
    check_values(msg)?;
    let mut encoder = Encoder::new(msg.begin_string());
    for tag in tags::HEADER_ORDER {
        if let Some(value) = msg.get(tag) {
            encoder.put_str(tag, value);
        }
    }
    for field in msg
        .fields()
        .filter(|f| !tags::is_header(f.tag) && f.tag != tags::CHECKSUM)
    {
        encoder.put_str(field.tag, &field.value);
    }
    Ok(encoder.finish())
}

/// FIX message encoder.
///
/// The encoder builds FIX messages by appending fields in tag=value format.
/// It handles BeginString, BodyLength, and Checksum fields automatically.
#[derive(Debug)]
pub struct Encoder<'a> {
    /// Buffer for the message body (between BodyLength and Checksum).
    body: BytesMut,
    /// The BeginString value (e.g., "FIX.4.4").
    begin_string: &'a str,
}

impl<'a> Encoder<'a> {
    /// Creates a new encoder with the specified BeginString.
    #[must_use]
    pub fn new(begin_string: &'a str) -> Self {
        Self {
            body: BytesMut::with_capacity(256),
            begin_string,
        }
    }

    /// Appends a field with a string value.
    #[inline]
    pub fn put_str(&mut self, tag: u32, value: &str) {
        self.put_raw(tag, value.as_bytes());
    }

    /// Appends a field with an unsigned integer value.
    #[inline]
    pub fn put_uint(&mut self, tag: u32, value: u64) {
        let mut buf = itoa::Buffer::new();
        self.put_raw(tag, buf.format(value).as_bytes());
    }

    /// Appends a field with a single character value.
    #[inline]
    pub fn put_char(&mut self, tag: u32, value: char) {
        let mut buf = [0u8; 4];
        self.put_raw(tag, value.encode_utf8(&mut buf).as_bytes());
    }

    /// Appends a field with a decimal value.
    #[inline]
    pub fn put_decimal(&mut self, tag: u32, value: &Decimal) {
        self.put_str(tag, &value.to_string());
    }

    /// Appends a field with raw bytes.
    ///
    /// # Arguments
    /// * `tag` - The field tag number
    /// * `value` - The field value bytes, which must not contain SOH
    #[inline]
    pub fn put_raw(&mut self, tag: u32, value: &[u8]) {
        let mut tag_buf = itoa::Buffer::new();
        self.body.put_slice(tag_buf.format(tag).as_bytes());
        self.body.put_u8(b'=');
        self.body.put_slice(value);
        self.body.put_u8(SOH);
    }

    /// Finalizes the message and returns the complete encoded bytes.
    ///
    /// Prepends BeginString (8) and BodyLength (9), then appends Checksum (10).
    #[must_use]
    pub fn finish(self) -> BytesMut {
        let body_len = self.body.len();
        let mut len_buf = itoa::Buffer::new();
        let len_str = len_buf.format(body_len);

        let mut message =
            BytesMut::with_capacity(self.begin_string.len() + len_str.len() + body_len + 16);
        message.put_slice(b"8=");
        message.put_slice(self.begin_string.as_bytes());
        message.put_u8(SOH);
        message.put_slice(b"9=");
        message.put_slice(len_str.as_bytes());
        message.put_u8(SOH);
        message.put_slice(&self.body);

        let checksum = calculate_checksum(&message);
        message.put_slice(b"10=");
        message.put_slice(&format_checksum(checksum));
        message.put_u8(SOH);

        message
    }

    /// Returns the current body length.
    #[inline]
    #[must_use]
    pub fn body_len(&self) -> usize {
        self.body.len()
    }
}
