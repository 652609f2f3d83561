/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixprobe Tracker
//!
//! Order lifecycle tracking for FIX integration tests.
//!
//! ## Components
//!
//! - **State machine**: [`OrderState`] and [`OrderAction`] with a fixed transition table
//! - **Tracker**: [`OrderTracker`], a fluent per-order state holder with history
//! - **Verification**: [`Expectation`] compared against the tracked order
//! - **Session binding**: [`TrackedOrder`] sends requests and awaits their reports

pub mod expectation;
pub mod order;
pub mod state;
pub mod tracked;
pub mod tracker;

pub use expectation::Expectation;
pub use order::{Amendment, HistoryEntry, Order};
pub use state::{OrderAction, OrderState};
pub use tracked::{DEFAULT_ACK_TIMEOUT, TrackedOrder};
pub use tracker::OrderTracker;
