/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Per-worker results and their aggregation.
//!
//! Each worker owns its [`WorkerResult`] for the whole run. The driver merges
//! them once, after every worker has finished.

use crate::config::StressConfig;
use crate::error::StressError;
use hdrhistogram::Histogram;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Significant figures kept by latency histograms.
pub const LATENCY_SIGFIG: u8 = 3;

/// Creates an empty, auto-resizing latency histogram in microseconds.
///
/// # Errors
/// Returns `StressError::Histogram` if the histogram cannot be allocated.
pub fn latency_histogram() -> Result<Histogram<u64>, StressError> {
    Ok(Histogram::<u64>::new(LATENCY_SIGFIG)?)
}

/// Counters and latency samples collected by one worker.
#[derive(Debug, Clone)]
pub struct WorkerResult {
    /// Worker index.
    pub worker: usize,
    /// NewOrderSingles written to the session.
    pub sent: u64,
    /// New acknowledgments received.
    pub acks: u64,
    /// Rejected reports received.
    pub rejects: u64,
    /// Failed sends plus sampled acks that timed out or were abandoned.
    pub errors: u64,
    /// The worker never reached an active session.
    pub logon_failed: bool,
    /// Time from the first scheduled send until the worker stopped waiting.
    pub elapsed: Duration,
    /// Ack latency of sampled sends, in microseconds.
    pub latency: Histogram<u64>,
}

impl WorkerResult {
    /// Creates an empty result for `worker`.
    ///
    /// # Errors
    /// Returns `StressError::Histogram` if the histogram cannot be allocated.
    pub fn new(worker: usize) -> Result<Self, StressError> {
        Ok(Self {
            worker,
            sent: 0,
            acks: 0,
            rejects: 0,
            errors: 0,
            logon_failed: false,
            elapsed: Duration::ZERO,
            latency: latency_histogram()?,
        })
    }

    /// Records one ack latency sample.
    pub fn record_latency(&mut self, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.latency.saturating_record(micros);
    }

    /// Sends that have neither been acknowledged nor rejected yet.
    #[must_use]
    pub const fn unanswered(&self) -> u64 {
        self.sent.saturating_sub(self.acks + self.rejects)
    }
}

/// Latency distribution in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencyStats {
    /// Number of samples.
    pub samples: u64,
    /// Smallest sample.
    pub min_us: u64,
    /// Largest sample.
    pub max_us: u64,
    /// Arithmetic mean.
    pub mean_us: f64,
    /// Median.
    pub p50_us: u64,
    /// 90th percentile.
    pub p90_us: u64,
    /// 95th percentile.
    pub p95_us: u64,
    /// 99th percentile.
    pub p99_us: u64,
}

impl LatencyStats {
    /// Summarizes `histogram`, or returns `None` if it holds no samples.
    #[must_use]
    pub fn from_histogram(histogram: &Histogram<u64>) -> Option<Self> {
        if histogram.is_empty() {
            return None;
        }
        Some(Self {
            samples: histogram.len(),
            min_us: histogram.min(),
            max_us: histogram.max(),
            mean_us: histogram.mean(),
            p50_us: histogram.value_at_quantile(0.50),
            p90_us: histogram.value_at_quantile(0.90),
            p95_us: histogram.value_at_quantile(0.95),
            p99_us: histogram.value_at_quantile(0.99),
        })
    }
}

/// Summary of one worker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerStats {
    /// Worker index.
    pub worker: usize,
    /// NewOrderSingles sent.
    pub sent: u64,
    /// New acknowledgments received.
    pub acks: u64,
    /// Rejected reports received.
    pub rejects: u64,
    /// Per-message errors.
    pub errors: u64,
    /// Logon failed and the worker sent nothing.
    pub logon_failed: bool,
    /// Worker run time in seconds.
    pub elapsed_secs: f64,
    /// Sends per second over the worker run time.
    pub throughput: f64,
    /// Ack latency of this worker's samples.
    pub latency: Option<LatencyStats>,
}

impl From<&WorkerResult> for WorkerStats {
    fn from(result: &WorkerResult) -> Self {
        let elapsed_secs = result.elapsed.as_secs_f64();
        Self {
            worker: result.worker,
            sent: result.sent,
            acks: result.acks,
            rejects: result.rejects,
            errors: result.errors,
            logon_failed: result.logon_failed,
            elapsed_secs,
            throughput: rate(result.sent, elapsed_secs),
            latency: LatencyStats::from_histogram(&result.latency),
        }
    }
}

/// Aggregate outcome of a stress run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StressReport {
    /// Run tag from the configuration.
    pub tag: Option<String>,
    /// Configured worker count.
    pub workers: usize,
    /// Configured messages per worker.
    pub messages_per_worker: u64,
    /// Configured rate per worker.
    pub rate_per_worker: f64,
    /// NewOrderSingles sent by all workers.
    pub sent: u64,
    /// New acknowledgments received by all workers.
    pub acks: u64,
    /// Rejected reports received by all workers.
    pub rejects: u64,
    /// Per-message errors across all workers.
    pub errors: u64,
    /// Workers that failed to log on.
    pub logon_failures: u64,
    /// Wall-clock run time in seconds.
    pub elapsed_secs: f64,
    /// Sends per second over the wall-clock run time.
    pub throughput: f64,
    /// Ack latency over the merged samples of all workers.
    pub latency: Option<LatencyStats>,
    /// Per-worker breakdown, ordered by worker index.
    pub per_worker: Vec<WorkerStats>,
}

impl StressReport {
    /// Merges worker results into one report.
    ///
    /// # Errors
    /// Returns `StressError::Histogram` if the latency histograms cannot be merged.
    pub fn aggregate(
        config: &StressConfig,
        mut results: Vec<WorkerResult>,
        elapsed: Duration,
    ) -> Result<Self, StressError> {
        results.sort_by_key(|r| r.worker);

        let mut merged = latency_histogram()?;
        let (mut sent, mut acks, mut rejects, mut errors, mut logon_failures) = (0, 0, 0, 0, 0);
        for result in &results {
            sent += result.sent;
            acks += result.acks;
            rejects += result.rejects;
            errors += result.errors;
            logon_failures += u64::from(result.logon_failed);
            merged.add(&result.latency)?;
        }

        let elapsed_secs = elapsed.as_secs_f64();
        Ok(Self {
            tag: config.tag.clone(),
            workers: config.workers,
            messages_per_worker: config.messages_per_worker,
            rate_per_worker: config.rate_per_worker,
            sent,
            acks,
            rejects,
            errors,
            logon_failures,
            elapsed_secs,
            throughput: rate(sent, elapsed_secs),
            latency: LatencyStats::from_histogram(&merged),
            per_worker: results.iter().map(WorkerStats::from).collect(),
        })
    }

    /// Returns true if every worker logged on.
    #[must_use]
    pub const fn all_logged_on(&self) -> bool {
        self.logon_failures == 0
    }
}

impl fmt::Display for StressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sent={} acks={} rejects={} errors={} logon_failures={} elapsed={:.3}s rate={:.1}/s",
            self.sent,
            self.acks,
            self.rejects,
            self.errors,
            self.logon_failures,
            self.elapsed_secs,
            self.throughput
        )?;
        if let Some(l) = &self.latency {
            write!(
                f,
                " latency_us[n={} p50={} p95={} p99={} max={}]",
                l.samples, l.p50_us, l.p95_us, l.p99_us, l.max_us
            )?;
        }
        Ok(())
    }
}

#[allow(clippy::cast_precision_loss)]
fn rate(count: u64, secs: f64) -> f64 {
    if secs > 0.0 { count as f64 / secs } else { 0.0 }
}
