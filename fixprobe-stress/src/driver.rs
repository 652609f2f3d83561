/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Stress run orchestration.

use crate::config::{Scheduling, StressConfig};
use crate::error::StressError;
use crate::report::StressReport;
use crate::worker::run_worker;
use fixprobe_engine::CancellationToken;
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};
use tokio::time::Instant;
use tracing::info;

/// Drives a configured number of concurrent sessions against one acceptor.
#[derive(Debug, Clone)]
pub struct StressDriver {
    config: Arc<StressConfig>,
}

impl StressDriver {
    /// Validates `config` and creates a driver.
    ///
    /// # Errors
    /// Returns `StressError::Config` if the configuration is invalid.
    pub fn new(config: StressConfig) -> Result<Self, StressError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// The run configuration.
    #[must_use]
    pub fn config(&self) -> &StressConfig {
        &self.config
    }

    /// Runs all workers on the current runtime and aggregates their results.
    ///
    /// Cancelling `cancel` stops new sends; workers then wait up to the
    /// grace period for outstanding acks and close their sessions. The
    /// report covers whatever was done up to that point.
    ///
    /// # Errors
    /// Returns `StressError::Worker` if a worker task panics and
    /// `StressError::Histogram` if latency samples cannot be merged.
    pub async fn run(&self, cancel: CancellationToken) -> Result<StressReport, StressError> {
        let config = &self.config;
        info!(
            endpoint = %config.endpoint,
            workers = config.workers,
            messages_per_worker = config.messages_per_worker,
            rate_per_worker = config.rate_per_worker,
            tag = ?config.tag,
            "stress run starting"
        );

        let started = Instant::now();
        let handles: Vec<_> = (0..config.workers)
            .map(|index| tokio::spawn(run_worker(index, Arc::clone(config), cancel.child_token())))
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.await??);
        }

        let report = StressReport::aggregate(config, results, started.elapsed())?;
        info!(%report, "stress run finished");
        Ok(report)
    }

    /// Builds a runtime of the configured [`Scheduling`] shape.
    ///
    /// # Errors
    /// Returns `StressError::Runtime` if the runtime cannot be built.
    pub fn runtime(&self) -> Result<Runtime, StressError> {
        let mut builder = match self.config.scheduling {
            Scheduling::Parallel => Builder::new_multi_thread(),
            Scheduling::Cooperative => Builder::new_current_thread(),
        };
        Ok(builder.enable_all().build()?)
    }

    /// Runs on a fresh runtime of the configured shape, blocking the caller.
    ///
    /// Must not be called from within an async context.
    ///
    /// # Errors
    /// Returns `StressError::Runtime` if the runtime cannot be built, or any
    /// error of [`StressDriver::run`].
    pub fn run_blocking(&self, cancel: CancellationToken) -> Result<StressReport, StressError> {
        self.runtime()?.block_on(self.run(cancel))
    }
}
