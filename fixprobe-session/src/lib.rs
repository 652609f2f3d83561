/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixprobe Session
//!
//! Sans-IO FIX session layer for the fixprobe engine.
//!
//! This crate provides:
//! - **State machine**: `Disconnected -> Connecting -> LogonPending -> Active`
//! - **Sequence management**: strict inbound sequencing, no resend recovery
//! - **Heartbeat handling**: Heartbeat/TestRequest/timeout decisions
//! - **Session core**: header stamping and inbound classification
//! - **Configuration**: Session configuration options

pub mod config;
pub mod heartbeat;
pub mod sequence;
pub mod session;
pub mod state;

pub use config::{SessionConfig, SessionConfigBuilder};
pub use heartbeat::{HeartbeatAction, HeartbeatManager, MAX_HEARTBEAT_INTERVAL};
pub use sequence::SequenceManager;
pub use session::{Inbound, Session};
pub use state::SessionState;
