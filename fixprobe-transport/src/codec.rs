/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Tokio codec for FIX message framing.
//!
//! The codec cuts the byte stream into frames using BodyLength. It only
//! rejects input that makes framing impossible; those errors are fatal to the
//! connection. Checksum and content validation happen per frame in
//! [`fixprobe_tagvalue::decode`], so one corrupt frame does not desynchronize
//! the stream.

use bytes::{BufMut, BytesMut};
use fixprobe_core::{BuildError, Message, SOH};
use memchr::memchr;
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

/// Default maximum frame size in bytes.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Length of `10=NNN<SOH>`.
const TRAILER_LEN: usize = 7;

/// Errors that make the stream impossible to frame.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Stream does not start with `8=`.
    #[error("invalid begin string: frame must start with 8=")]
    InvalidBeginString,

    /// Second field is not BodyLength.
    #[error("missing body length field (tag 9)")]
    MissingBodyLength,

    /// BodyLength value is not numeric.
    #[error("invalid body length value")]
    InvalidBodyLength,

    /// The bytes where the trailer should start are not `10=`.
    #[error("frame trailer not found at declared body length")]
    MissingTrailer,

    /// Frame exceeds maximum size.
    #[error("message too large: {size} bytes exceeds maximum {max_size}")]
    MessageTooLarge {
        /// Declared frame size.
        size: usize,
        /// Maximum allowed size.
        max_size: usize,
    },

    /// An outbound message carries a value that cannot be framed.
    #[error("unencodable message: {0}")]
    Unencodable(#[from] BuildError),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Tokio codec for FIX message framing.
#[derive(Debug, Clone)]
pub struct FixCodec {
    /// Maximum frame size in bytes.
    max_message_size: usize,
}

impl FixCodec {
    /// Creates a new codec with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }

    /// Sets the maximum frame size.
    #[must_use]
    pub const fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }
}

impl Default for FixCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FixCodec {
    type Item = BytesMut;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < 2 {
            return Ok(None);
        }
        if &src[0..2] != b"8=" {
            return Err(CodecError::InvalidBeginString);
        }

        let Some(first_soh) = memchr(SOH, src) else {
            return self.check_partial(src);
        };

        let body_len_start = first_soh + 1;
        if src.len() < body_len_start + 2 {
            return Ok(None);
        }
        if &src[body_len_start..body_len_start + 2] != b"9=" {
            return Err(CodecError::MissingBodyLength);
        }

        let Some(pos) = memchr(SOH, &src[body_len_start..]) else {
            return self.check_partial(src);
        };
        let body_len_soh = body_len_start + pos;

        let digits = &src[body_len_start + 2..body_len_soh];
        if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
            return Err(CodecError::InvalidBodyLength);
        }
        let body_length: usize = std::str::from_utf8(digits)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(CodecError::InvalidBodyLength)?;

        let total_length = body_len_soh + 1 + body_length + TRAILER_LEN;
        if total_length > self.max_message_size {
            return Err(CodecError::MessageTooLarge {
                size: total_length,
                max_size: self.max_message_size,
            });
        }

        if src.len() < total_length {
            src.reserve(total_length - src.len());
            return Ok(None);
        }

        let trailer_start = total_length - TRAILER_LEN;
        if &src[trailer_start..trailer_start + 3] != b"10=" || src[total_length - 1] != SOH {
            return Err(CodecError::MissingTrailer);
        }

        Ok(Some(src.split_to(total_length)))
    }
}

impl FixCodec {
    fn check_partial(&self, src: &BytesMut) -> Result<Option<BytesMut>, CodecError> {
        if src.len() > self.max_message_size {
            return Err(CodecError::MessageTooLarge {
                size: src.len(),
                max_size: self.max_message_size,
            });
        }
        Ok(None)
    }
}

impl Encoder<BytesMut> for FixCodec {
    type Error = CodecError;

    fn encode(&mut self, item: BytesMut, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len());
        dst.put_slice(&item);
        Ok(())
    }
}

impl Encoder<&Message> for FixCodec {
    type Error = CodecError;

    fn encode(&mut self, item: &Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let wire = fixprobe_tagvalue::encode(item)?;
        dst.reserve(wire.len());
        dst.put_slice(&wire);
        Ok(())
    }
}
