/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixprobe Core
//!
//! Core types and error definitions shared by every fixprobe crate:
//! - **Error types**: One `thiserror` enum per layer, unified under [`FixError`]
//! - **Field types**: [`Field`] and the [`tags`] constants
//! - **Message types**: [`Message`] and [`MsgType`]
//! - **Core types**: [`SeqNum`], [`Timestamp`], [`CompId`] and the order code sets

pub mod error;
pub mod field;
pub mod message;
pub mod types;

pub use error::{
    BuildError, ConfigError, DecodeError, FixError, Result, SessionError, TrackerError,
};
pub use field::{Field, tags};
pub use message::{Message, MsgType, WireInfo};
pub use types::{
    CompId, CxlRejResponseTo, ExecType, OrdStatus, OrdType, SeqNum, Side, Timestamp, UnknownCode,
};

/// SOH field delimiter.
pub const SOH: u8 = 0x01;
