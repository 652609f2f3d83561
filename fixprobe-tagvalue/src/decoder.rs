/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Validating FIX message decoder.
//!
//! [`Decoder`] walks `tag=value<SOH>` fields with `memchr`. [`decode`] turns
//! one complete frame into a [`Message`], rejecting anything structurally
//! invalid, any BodyLength or Checksum mismatch, trailing bytes, and frames
//! missing a required header or trailer tag.

use crate::checksum::{calculate_checksum, parse_checksum};
use fixprobe_core::error::DecodeError;
use fixprobe_core::{Field, Message, SOH, WireInfo, tags};
use memchr::memchr;

/// Equals sign delimiter between tag and value.
pub const EQUALS: u8 = b'=';

/// One field borrowed from the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawField<'a> {
    /// The field tag number.
    pub tag: u32,
    /// The value bytes, without delimiters.
    pub value: &'a [u8],
    /// Offset of the first tag byte in the input.
    pub offset: usize,
}

impl RawField<'_> {
    fn to_field(self) -> Result<Field, DecodeError> {
        let value = std::str::from_utf8(self.value)?;
        Ok(Field::new(self.tag, value))
    }
}

/// Field-level FIX decoder.
#[derive(Debug)]
pub struct Decoder<'a> {
    input: &'a [u8],
    offset: usize,
}

impl<'a> Decoder<'a> {
    /// Creates a new decoder for the given input buffer.
    #[inline]
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self { input, offset: 0 }
    }

    /// Parses the next field from the buffer.
    ///
    /// # Returns
    /// `Ok(None)` once the buffer is exhausted.
    ///
    /// # Errors
    /// Returns `DecodeError` if the next field is not a well-formed `tag=value<SOH>`.
    pub fn next_field(&mut self) -> Result<Option<RawField<'a>>, DecodeError> {
        if self.offset >= self.input.len() {
            return Ok(None);
        }

        let start = self.offset;
        let remaining = &self.input[start..];

        let eq_pos = memchr(EQUALS, remaining).ok_or(DecodeError::InvalidFieldStructure {
            offset: start,
            reason: "missing '=' separator",
        })?;
        let tag_bytes = &remaining[..eq_pos];
        let tag = parse_tag(tag_bytes)
            .ok_or_else(|| DecodeError::InvalidTag(String::from_utf8_lossy(tag_bytes).into()))?;

        let value_start = eq_pos + 1;
        let soh_pos =
            memchr(SOH, &remaining[value_start..]).ok_or(DecodeError::InvalidFieldStructure {
                offset: start,
                reason: "missing SOH delimiter",
            })?;
        if soh_pos == 0 {
            return Err(DecodeError::InvalidFieldStructure {
                offset: start,
                reason: "empty value",
            });
        }
        let value = &remaining[value_start..value_start + soh_pos];

        self.offset += value_start + soh_pos + 1;
        Ok(Some(RawField {
            tag,
            value,
            offset: start,
        }))
    }

    /// Returns the current offset in the buffer.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Returns true if the buffer has been fully consumed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offset >= self.input.len()
    }
}

/// Decodes exactly one complete FIX message.
///
/// # Errors
/// Returns `DecodeError` if:
/// - the field structure is invalid or bytes follow the checksum field
/// - the first three tags are not 8, 9 and 35
/// - BodyLength does not match the observed span
/// - Checksum is not three digits or does not match
/// - a required header tag (49, 56, 34, 52) or the trailer (10) is absent
pub fn decode(input: &[u8]) -> Result<Message, DecodeError> {
    if input.is_empty() {
        return Err(DecodeError::Empty);
    }
    let mut decoder = Decoder::new(input);

    let begin_string = match decoder.next_field()? {
        Some(field) if field.tag == tags::BEGIN_STRING && field.value.starts_with(b"FIX") => {
            std::str::from_utf8(field.value)?.to_string()
        }
        _ => return Err(DecodeError::InvalidBeginString),
    };

    let declared_len = match decoder.next_field()? {
        Some(field) if field.tag == tags::BODY_LENGTH => parse_body_length(field.value)?,
        _ => return Err(DecodeError::MissingBodyLength),
    };
    let body_start = decoder.offset();

    let mut fields: Vec<Field> = Vec::with_capacity(16);
    let trailer = loop {
        let Some(field) = decoder.next_field()? else {
            return Err(DecodeError::MissingChecksum);
        };
        if fields.is_empty() && field.tag != tags::MSG_TYPE {
            return Err(DecodeError::MissingMsgType);
        }
        if field.tag == tags::CHECKSUM {
            break field;
        }
        if field.tag == tags::BEGIN_STRING
            || field.tag == tags::BODY_LENGTH
            || fields.iter().any(|f| f.tag == field.tag)
        {
            return Err(DecodeError::InvalidFieldStructure {
                offset: field.offset,
                reason: "duplicate tag",
            });
        }
        fields.push(field.to_field()?);
    };

    let actual_len = trailer.offset - body_start;
    if actual_len != declared_len {
        return Err(DecodeError::BodyLengthMismatch {
            declared: declared_len,
            actual: actual_len,
        });
    }

    let declared = parse_checksum(trailer.value).ok_or_else(|| {
        DecodeError::InvalidChecksum(String::from_utf8_lossy(trailer.value).into())
    })?;
    let calculated = calculate_checksum(&input[..trailer.offset]);
    if calculated != declared {
        return Err(DecodeError::ChecksumMismatch {
            calculated,
            declared,
        });
    }

    if !decoder.is_empty() {
        return Err(DecodeError::TrailingData(input.len() - decoder.offset()));
    }

    for tag in tags::REQUIRED_HEADER {
        if !fields.iter().any(|f| f.tag == tag) {
            return Err(DecodeError::MissingRequiredField { tag });
        }
    }

    Ok(Message::from_parts(
        begin_string,
        fields,
        Some(WireInfo {
            body_length: declared_len,
            checksum: declared,
        }),
    ))
}

fn parse_body_length(value: &[u8]) -> Result<usize, DecodeError> {
    if !value.iter().all(u8::is_ascii_digit) {
        return Err(DecodeError::InvalidBodyLength);
    }
    std::str::from_utf8(value)?
        .parse()
        .map_err(|_| DecodeError::InvalidBodyLength)
}

/// Parses a tag number from ASCII bytes.
///
/// # Returns
/// The parsed tag number, or `None` if empty, non-numeric, zero or overflowing.
#[inline]
fn parse_tag(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || bytes.len() > 10 {
        return None;
    }

    let mut result: u32 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        result = result.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
    }

    (result > 0).then_some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode;
    use fixprobe_core::MsgType;

    fn sample() -> Message {
        Message::new("FIX.4.4", MsgType::NewOrderSingle)
            .with(tags::SENDER_COMP_ID, "CLIENT")
            .with(tags::TARGET_COMP_ID, "EXCH")
            .with(tags::MSG_SEQ_NUM, "2")
            .with(tags::SENDING_TIME, "20260101-12:00:00.000")
            .with(tags::CL_ORD_ID, "C1")
            .with(tags::SYMBOL, "AAPL")
            .with(tags::SIDE, "1")
            .with(tags::ORDER_QTY, "100")
            .with(tags::ORD_TYPE, "2")
            .with(tags::PRICE, "100.50")
    }

    #[test]
    fn test_parse_tag() {
        assert_eq!(parse_tag(b"8"), Some(8));
        assert_eq!(parse_tag(b"12345"), Some(12345));
        assert_eq!(parse_tag(b""), None);
        assert_eq!(parse_tag(b"0"), None);
        assert_eq!(parse_tag(b"12a"), None);
    }

    #[test]
    fn test_next_field() {
        let mut decoder = Decoder::new(b"8=FIX.4.4\x019=5\x01");
        let first = decoder.next_field().unwrap().unwrap();
        assert_eq!((first.tag, first.value, first.offset), (8, &b"FIX.4.4"[..], 0));
        let second = decoder.next_field().unwrap().unwrap();
        assert_eq!((second.tag, second.offset), (9, 10));
        assert!(decoder.next_field().unwrap().is_none());
    }

    #[test]
    fn test_next_field_structure_errors() {
        assert!(matches!(
            Decoder::new(b"8FIX\x01").next_field(),
            Err(DecodeError::InvalidFieldStructure { .. })
        ));
        assert!(matches!(
            Decoder::new(b"8=FIX.4.4").next_field(),
            Err(DecodeError::InvalidFieldStructure { .. })
        ));
        assert!(matches!(
            Decoder::new(b"x=1\x01").next_field(),
            Err(DecodeError::InvalidTag(_))
        ));
    }

    #[test]
    fn test_decode_carries_wire_info() {
        let wire = encode(&sample()).unwrap();
        let decoded = decode(&wire).unwrap();

        assert_eq!(decoded, sample());
        assert_eq!(decoded.msg_type(), MsgType::NewOrderSingle);
        let body_start = wire.iter().position(|&b| b == SOH).unwrap() + 1;
        let body_start = body_start + wire[body_start..].iter().position(|&b| b == SOH).unwrap() + 1;
        assert_eq!(decoded.body_length(), Some(wire.len() - 7 - body_start));
        assert_eq!(
            decoded.checksum(),
            Some(calculate_checksum(&wire[..wire.len() - 7]))
        );
    }

    #[test]
    fn test_decode_rejects_every_single_byte_corruption() {
        let wire = encode(&sample()).unwrap();
        for i in 0..wire.len() {
            let mut corrupted = wire.to_vec();
            corrupted[i] ^= 0x20;
            assert!(decode(&corrupted).is_err(), "corruption at byte {i} accepted");
        }
    }

    #[test]
    fn test_decode_rejects_body_length_mismatch() {
        let text = String::from_utf8(encode(&sample()).unwrap().to_vec()).unwrap();
        let tampered = text.replacen("\x019=", "\x019=1", 1);
        let tampered = recompute_checksum(tampered.as_bytes());
        assert!(matches!(
            decode(&tampered),
            Err(DecodeError::BodyLengthMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_missing_header_tag() {
        let mut msg = sample();
        msg.remove(tags::SENDING_TIME);
        assert_eq!(
            decode(&encode(&msg).unwrap()),
            Err(DecodeError::MissingRequiredField { tag: 52 })
        );
    }

    #[test]
    fn test_decode_rejects_wrong_leading_tags() {
        assert_eq!(decode(b""), Err(DecodeError::Empty));
        assert_eq!(
            decode(b"9=5\x018=FIX.4.4\x01"),
            Err(DecodeError::InvalidBeginString)
        );
        let wire = recompute_checksum(b"8=FIX.4.4\x019=6\x0149=A\x01");
        assert_eq!(decode(&wire), Err(DecodeError::MissingMsgType));
    }

    #[test]
    fn test_decode_rejects_missing_trailer_and_trailing_bytes() {
        let wire = encode(&sample()).unwrap();
        let truncated = &wire[..wire.len() - 7];
        assert_eq!(decode(truncated), Err(DecodeError::MissingChecksum));

        let mut extended = wire.to_vec();
        extended.extend_from_slice(b"58=x\x01");
        assert_eq!(decode(&extended), Err(DecodeError::TrailingData(5)));
    }

    #[test]
    fn test_decode_rejects_short_checksum() {
        let wire = encode(&sample()).unwrap();
        let mut short = wire[..wire.len() - 4].to_vec();
        short.extend_from_slice(b"12\x01");
        assert!(matches!(
            decode(&short),
            Err(DecodeError::InvalidChecksum(_))
        ));
    }

    fn recompute_checksum(without_trailer: &[u8]) -> Vec<u8> {
        let mut body = without_trailer.to_vec();
        if let Some(pos) = find_trailer(&body) {
            body.truncate(pos);
        }
        let checksum = calculate_checksum(&body);
        body.extend_from_slice(format!("10={checksum:03}\x01").as_bytes());
        body
    }

    fn find_trailer(bytes: &[u8]) -> Option<usize> {
        bytes
            .windows(4)
            .rposition(|w| w == b"\x0110=")
            .map(|pos| pos + 1)
    }
}
