/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixprobe Simulator
//!
//! A deterministic exchange stub that answers order-entry traffic.
//!
//! [`ExchangeSimulator`] implements the engine's
//! [`Application`](fixprobe_engine::Application) trait and keeps an explicit
//! order book keyed by OrderID. It acknowledges, rejects, cancels, replaces
//! and fills orders, and can push unsolicited fills to the connection that
//! owns an order.
//!
//! ## Example
//!
//! ```rust,ignore
//! use fixprobe_simulator::{ExchangeSimulator, SimulatorConfig};
//!
//! let simulator = Arc::new(ExchangeSimulator::new(SimulatorConfig::new().with_auto_fill(true)));
//! let server = FixServer::bind(server_config, simulator).await?;
//! ```

pub mod book;
pub mod config;
pub mod error;
pub mod simulator;

pub use book::SimulatedOrder;
pub use config::SimulatorConfig;
pub use error::SimulatorError;
pub use simulator::ExchangeSimulator;
