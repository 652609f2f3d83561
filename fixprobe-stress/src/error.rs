/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Errors that end a stress run.
//!
//! Per-message failures never surface here; workers record them as counts.

use fixprobe_core::ConfigError;
use thiserror::Error;

/// Failure of the run as a whole.
#[derive(Debug, Error)]
pub enum StressError {
    /// The configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Latency histograms could not be created or merged.
    #[error("latency histogram error: {0}")]
    Histogram(String),

    /// A worker task panicked or was aborted.
    #[error("worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    /// The async runtime could not be built.
    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

impl From<hdrhistogram::CreationError> for StressError {
    fn from(e: hdrhistogram::CreationError) -> Self {
        Self::Histogram(e.to_string())
    }
}

impl From<hdrhistogram::AdditionError> for StressError {
    fn from(e: hdrhistogram::AdditionError) -> Self {
        Self::Histogram(e.to_string())
    }
}
