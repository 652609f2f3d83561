/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Stress run configuration.
//!
//! Durations are carried as milliseconds so the structure maps one to one
//! onto JSON files and environment variables.

use fixprobe_core::{CompId, ConfigError, Side};
use fixprobe_tagvalue::DEFAULT_BEGIN_STRING;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How worker tasks are multiplexed onto threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheduling {
    /// One task per worker on a multi-thread runtime.
    #[default]
    Parallel,
    /// All workers on a single-thread runtime.
    Cooperative,
}

/// Parameters of one stress run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressConfig {
    /// Acceptor address as `host:port`.
    pub endpoint: String,
    /// SenderCompID (49) shared by all workers.
    pub sender_comp_id: String,
    /// TargetCompID (56).
    pub target_comp_id: String,
    /// BeginString (8).
    pub begin_string: String,
    /// Number of concurrent sessions.
    pub workers: usize,
    /// NewOrderSingles sent by each worker.
    pub messages_per_worker: u64,
    /// Target send rate per worker in messages per second; 0 sends as fast as possible.
    pub rate_per_worker: f64,
    /// Sample one send in every `sample_every` for latency.
    pub sample_every: u64,
    /// Wait for the ack of sampled sends and record their latency.
    pub measure_latency: bool,
    /// Wait for each sampled ack, in milliseconds.
    pub ack_timeout_ms: u64,
    /// HeartBtInt in milliseconds; sent on the wire in whole seconds.
    pub heartbeat_interval_ms: u64,
    /// Wait for the Logon answer, in milliseconds.
    pub logon_timeout_ms: u64,
    /// Time allowed after the last send for outstanding acks, in milliseconds.
    pub grace_period_ms: u64,
    /// Symbol (55).
    pub symbol: String,
    /// Side (54).
    pub side: Side,
    /// OrderQty (38).
    pub qty: Decimal,
    /// Price (44); orders are Market when absent.
    pub price: Option<Decimal>,
    /// Runtime shape used by [`crate::StressDriver::run_blocking`].
    pub scheduling: Scheduling,
    /// Free-form label copied into the report.
    pub tag: Option<String>,
}

impl StressConfig {
    /// Creates a configuration with the default load profile.
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        sender_comp_id: impl Into<String>,
        target_comp_id: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            sender_comp_id: sender_comp_id.into(),
            target_comp_id: target_comp_id.into(),
            ..Self::default()
        }
    }

    /// Sets the number of workers.
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the number of messages per worker.
    #[must_use]
    pub const fn with_messages_per_worker(mut self, messages: u64) -> Self {
        self.messages_per_worker = messages;
        self
    }

    /// Sets the per-worker rate; 0 disables pacing.
    #[must_use]
    pub const fn with_rate_per_worker(mut self, rate: f64) -> Self {
        self.rate_per_worker = rate;
        self
    }

    /// Enables latency sampling of one send in every `every`.
    #[must_use]
    pub const fn with_latency_sampling(mut self, every: u64) -> Self {
        self.measure_latency = true;
        self.sample_every = every;
        self
    }

    /// Sets the ack timeout.
    #[must_use]
    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout_ms = duration_ms(timeout);
        self
    }

    /// Sets the heartbeat interval.
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval_ms = duration_ms(interval);
        self
    }

    /// Sets the logon timeout.
    #[must_use]
    pub fn with_logon_timeout(mut self, timeout: Duration) -> Self {
        self.logon_timeout_ms = duration_ms(timeout);
        self
    }

    /// Sets the grace period.
    #[must_use]
    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace_period_ms = duration_ms(grace);
        self
    }

    /// Sets the order terms.
    #[must_use]
    pub fn with_order(
        mut self,
        symbol: impl Into<String>,
        side: Side,
        qty: Decimal,
        price: Option<Decimal>,
    ) -> Self {
        self.symbol = symbol.into();
        self.side = side;
        self.qty = qty;
        self.price = price;
        self
    }

    /// Sets the runtime shape.
    #[must_use]
    pub const fn with_scheduling(mut self, scheduling: Scheduling) -> Self {
        self.scheduling = scheduling;
        self
    }

    /// Sets the run tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Ack timeout as a [`Duration`].
    #[must_use]
    pub const fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }

    /// Heartbeat interval as a [`Duration`].
    #[must_use]
    pub const fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// Logon timeout as a [`Duration`].
    #[must_use]
    pub const fn logon_timeout(&self) -> Duration {
        Duration::from_millis(self.logon_timeout_ms)
    }

    /// Grace period as a [`Duration`].
    #[must_use]
    pub const fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    /// Returns true if send `index` of a worker is sampled for latency.
    #[must_use]
    pub const fn is_sampled(&self, index: u64) -> bool {
        self.measure_latency && self.sample_every > 0 && index % self.sample_every == 0
    }

    /// Parsed SenderCompID.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` if the value is empty or too long.
    pub fn sender(&self) -> Result<CompId, ConfigError> {
        comp_id("sender_comp_id", &self.sender_comp_id)
    }

    /// Parsed TargetCompID.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` if the value is empty or too long.
    pub fn target(&self) -> Result<CompId, ConfigError> {
        comp_id("target_comp_id", &self.target_comp_id)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    /// Returns `ConfigError::Missing` for an empty endpoint or symbol and
    /// `ConfigError::Invalid` for out-of-range values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.is_empty() {
            return Err(ConfigError::Missing("endpoint"));
        }
        if self.symbol.is_empty() {
            return Err(ConfigError::Missing("symbol"));
        }
        self.sender()?;
        self.target()?;
        if self.workers == 0 {
            return Err(invalid("workers", "must be at least 1"));
        }
        if self.sample_every == 0 {
            return Err(invalid("sample_every", "must be at least 1"));
        }
        if !self.rate_per_worker.is_finite() || self.rate_per_worker < 0.0 {
            return Err(invalid("rate_per_worker", "must be zero or a positive number"));
        }
        if self.ack_timeout_ms == 0 {
            return Err(invalid("ack_timeout_ms", "must be greater than zero"));
        }
        if self.logon_timeout_ms == 0 {
            return Err(invalid("logon_timeout_ms", "must be greater than zero"));
        }
        if self.heartbeat_interval_ms < 1000 {
            return Err(invalid("heartbeat_interval_ms", "must be at least one second"));
        }
        if self.qty <= Decimal::ZERO {
            return Err(invalid("qty", "must be positive"));
        }
        if self.price.is_some_and(|px| px <= Decimal::ZERO) {
            return Err(invalid("price", "must be positive"));
        }
        Ok(())
    }
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            endpoint: "127.0.0.1:9878".to_string(),
            sender_comp_id: "CLIENT".to_string(),
            target_comp_id: "EXCH".to_string(),
            begin_string: DEFAULT_BEGIN_STRING.to_string(),
            workers: 8,
            messages_per_worker: 1000,
            rate_per_worker: 100.0,
            sample_every: 1,
            measure_latency: false,
            ack_timeout_ms: 5_000,
            heartbeat_interval_ms: 30_000,
            logon_timeout_ms: 10_000,
            grace_period_ms: 5_000,
            symbol: "AAPL".to_string(),
            side: Side::Buy,
            qty: Decimal::ONE_HUNDRED,
            price: None,
            scheduling: Scheduling::Parallel,
            tag: None,
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn comp_id(field: &'static str, value: &str) -> Result<CompId, ConfigError> {
    CompId::new(value).ok_or_else(|| ConfigError::Invalid {
        field,
        reason: format!("{value:?} is not a valid CompID"),
    })
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = StressConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.workers, 8);
        assert_eq!(config.messages_per_worker, 1000);
        assert_eq!(config.ack_timeout(), Duration::from_secs(5));
        assert_eq!(config.scheduling, Scheduling::Parallel);
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let base = StressConfig::new("127.0.0.1:1", "C", "S");
        assert!(matches!(
            base.clone().with_workers(0).validate(),
            Err(ConfigError::Invalid { field: "workers", .. })
        ));
        assert!(matches!(
            base.clone().with_latency_sampling(0).validate(),
            Err(ConfigError::Invalid { field: "sample_every", .. })
        ));
        assert!(matches!(
            base.clone().with_rate_per_worker(-1.0).validate(),
            Err(ConfigError::Invalid { field: "rate_per_worker", .. })
        ));
        assert!(matches!(
            base.clone().with_ack_timeout(Duration::ZERO).validate(),
            Err(ConfigError::Invalid { field: "ack_timeout_ms", .. })
        ));
        assert!(matches!(
            StressConfig::new("", "C", "S").validate(),
            Err(ConfigError::Missing("endpoint"))
        ));
        assert!(matches!(
            StressConfig::new("127.0.0.1:1", "", "S").validate(),
            Err(ConfigError::Invalid { field: "sender_comp_id", .. })
        ));
    }

    #[test]
    fn test_sampling_stride() {
        let config = StressConfig::default().with_latency_sampling(10);
        assert!(config.is_sampled(0));
        assert!(!config.is_sampled(5));
        assert!(config.is_sampled(20));

        let off = StressConfig::default();
        assert!(!off.is_sampled(0));
    }

    #[test]
    fn test_deserialize_partial_json() {
        let config: StressConfig = serde_json::from_str(
            r#"{"endpoint":"10.0.0.1:5001","workers":2,"rate_per_worker":0,
                "scheduling":"cooperative","price":"101.25","tag":"nightly"}"#,
        )
        .unwrap();
        assert_eq!(config.endpoint, "10.0.0.1:5001");
        assert_eq!(config.workers, 2);
        assert_eq!(config.rate_per_worker, 0.0);
        assert_eq!(config.scheduling, Scheduling::Cooperative);
        assert_eq!(config.price, Some(Decimal::new(10125, 2)));
        assert_eq!(config.tag.as_deref(), Some("nightly"));
        assert_eq!(config.messages_per_worker, 1000);
    }
}
