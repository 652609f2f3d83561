/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixprobe
//!
//! A FIX 4.x test harness: a session engine speaking tag=value over TCP, a
//! fluent order lifecycle tracker, a deterministic exchange simulator and a
//! concurrent stress driver.
//!
//! ## Quick Start
//!
//! ```no_run
//! use fixprobe::prelude::*;
//! use rust_decimal::Decimal;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<()> {
//! // Start a simulated exchange.
//! let server = FixServer::bind(
//!     ServerConfig::new("127.0.0.1:9878", CompId::new("EXCH").unwrap()),
//!     Arc::new(ExchangeSimulator::new(SimulatorConfig::new())),
//! )
//! .await?;
//! let shutdown = CancellationToken::new();
//! tokio::spawn(server.serve(shutdown.clone()));
//!
//! // Log on and walk an order through its lifecycle.
//! let session = SessionConfigBuilder::new()
//!     .sender_comp_id("TRADER")
//!     .target_comp_id("EXCH")
//!     .build()?;
//! let client = FixClient::connect(ClientConfig::new("127.0.0.1:9878", session)).await?;
//! client.logon(Duration::from_secs(5)).await?;
//!
//! let order = Order::new("ORDER-1", "AAPL", Side::Buy, Decimal::from(100))
//!     .with_price(Decimal::from(10));
//! TrackedOrder::new(client, order)
//!     .submit()
//!     .await?
//!     .await_ack()
//!     .await?
//!     .cancel()
//!     .await?
//!     .await_canceled()
//!     .await?
//!     .verify(&Expectation::new(OrderState::Canceled))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: Messages, FIX code sets and error definitions
//! - [`tagvalue`]: Tag=value encoding, decoding and typed message builders
//! - [`session`]: Sans-IO session state machine
//! - [`transport`]: Frame codec and TCP helpers
//! - [`engine`]: Async initiator and acceptor
//! - [`simulator`]: Deterministic exchange simulator
//! - [`tracker`]: Order lifecycle tracking and verification
//! - [`stress`]: Concurrent stress driver

pub mod core {
    //! Messages, FIX code sets and error definitions.
    pub use fixprobe_core::*;
}

pub mod tagvalue {
    //! Tag=value encoding, decoding and typed message builders.
    pub use fixprobe_tagvalue::*;
}

pub mod session {
    //! Sans-IO session state machine.
    pub use fixprobe_session::*;
}

pub mod transport {
    //! Frame codec and TCP helpers.
    pub use fixprobe_transport::*;
}

pub mod engine {
    //! Async initiator and acceptor.
    pub use fixprobe_engine::*;
}

pub mod simulator {
    //! Deterministic exchange simulator.
    pub use fixprobe_simulator::*;
}

pub mod tracker {
    //! Order lifecycle tracking and verification.
    pub use fixprobe_tracker::*;
}

pub mod stress {
    //! Concurrent stress driver.
    pub use fixprobe_stress::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Core types
    pub use fixprobe_core::{
        CompId, ExecType, FixError, Message, MsgType, OrdStatus, OrdType, Result, SeqNum,
        SessionError, Side, TrackerError, tags,
    };

    // Tag-value encoding
    pub use fixprobe_tagvalue::{ExecutionReport, MessageBuilder, NewOrderSingle, decode, encode};

    // Session
    pub use fixprobe_session::{SessionConfig, SessionConfigBuilder, SessionState};

    // Engine
    pub use fixprobe_engine::{
        Application, CancellationToken, ClientConfig, FixClient, FixServer, ServerConfig,
    };

    // Simulator
    pub use fixprobe_simulator::{ExchangeSimulator, SimulatorConfig};

    // Tracker
    pub use fixprobe_tracker::{Expectation, Order, OrderState, OrderTracker, TrackedOrder};

    // Stress
    pub use fixprobe_stress::{StressConfig, StressDriver, StressReport};
}
