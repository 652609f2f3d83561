/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixprobe Tag-Value
//!
//! FIX tag=value encoding and decoding for fixprobe.
//!
//! ## Features
//!
//! - **Canonical encoding**: Header first, business fields in insertion order, computed trailer
//! - **Validating decoding**: Structure, BodyLength, Checksum and required header tags
//! - **Typed views**: Order-entry and administrative messages with required-tag checks
//! - **SIMD-accelerated**: Uses `memchr` for delimiter search

pub mod checksum;
pub mod decoder;
pub mod encoder;
pub mod messages;

pub use checksum::calculate_checksum;
pub use decoder::{Decoder, decode};
pub use encoder::{Encoder, check_values, encode};
pub use messages::{
    DEFAULT_BEGIN_STRING, ExecutionReport, Heartbeat, Logon, Logout, MessageBuilder,
    NewOrderSingle, OrderCancelReject, OrderCancelReplaceRequest, OrderCancelRequest, Reject,
    TestRequest, TypedMessage,
};
