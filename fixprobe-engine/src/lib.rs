/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixprobe Engine
//!
//! Async FIX engine built on the sans-IO session core.
//!
//! This crate provides:
//! - **Initiator**: [`FixClient`] with logon, send/receive and execution-report waits
//! - **Acceptor**: [`FixServer`] validating Logons and dispatching to an application
//! - **Application trait**: Callback interface for answering business messages
//! - **Report routing**: ClOrdID-keyed delivery of execution reports to waiting tasks

pub mod application;
pub mod client;
pub mod connection;
pub mod router;
pub mod server;

pub use application::{Application, NoOpApplication, RejectReason, SessionId};
pub use client::{ClientConfig, FixClient};
pub use connection::Connection;
pub use router::{ExecutionReportRouter, ReportMatch, ReportWaiter};
pub use server::{FixServer, ServerConfig};
pub use tokio_util::sync::CancellationToken;
