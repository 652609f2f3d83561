/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixprobe Transport
//!
//! Network transport layer for fixprobe.
//!
//! This crate provides:
//! - **Codec**: Tokio codec for FIX message framing
//! - **TCP transport**: Connect and accept helpers returning framed read/write halves

pub mod codec;
pub mod tcp;

pub use codec::{CodecError, DEFAULT_MAX_MESSAGE_SIZE, FixCodec};
pub use tcp::{FixReader, FixWriter, accept, connect, split};
