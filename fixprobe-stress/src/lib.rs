/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixprobe Stress
//!
//! Concurrent load generator for FIX acceptors.
//!
//! Each worker opens its own session (SenderSubID `W<index>`), sends
//! NewOrderSingles on an absolute rate schedule and counts the
//! acknowledgments. One send in every `sample_every` is timed from write to
//! ack. Per-worker results are merged into a [`StressReport`] with totals,
//! throughput and latency percentiles.
//!
//! ```no_run
//! use fixprobe_engine::CancellationToken;
//! use fixprobe_stress::{StressConfig, StressDriver};
//!
//! # async fn example() -> Result<(), fixprobe_stress::StressError> {
//! let config = StressConfig::new("127.0.0.1:9878", "LOAD", "EXCH")
//!     .with_workers(4)
//!     .with_latency_sampling(10);
//! let report = StressDriver::new(config)?.run(CancellationToken::new()).await?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod report;
pub mod schedule;
pub mod worker;

pub use config::{Scheduling, StressConfig};
pub use driver::StressDriver;
pub use error::StressError;
pub use report::{LatencyStats, StressReport, WorkerResult, WorkerStats};
pub use schedule::RateSchedule;
pub use worker::run_worker;
