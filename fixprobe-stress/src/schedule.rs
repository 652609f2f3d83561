/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Absolute send pacing.
//!
//! Send `i` is due at `start + i / rate`. Deadlines are derived from the
//! fixed start instead of sleeping a constant interval after each send, so a
//! slow send delays only itself and the schedule catches up afterwards.
//! Offsets too large to represent saturate at [`NEVER`].

use std::time::Duration;
use tokio::time::{Instant, sleep_until};

/// Offset used for sends so far out they will not come due in any run.
pub const NEVER: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Send times of one worker.
#[derive(Debug, Clone, Copy)]
pub struct RateSchedule {
    start: Instant,
    rate: Option<f64>,
}

impl RateSchedule {
    /// Creates a schedule of `rate` sends per second starting at `start`.
    ///
    /// A rate of zero, or any value that is not a positive number, yields an
    /// unpaced schedule.
    #[must_use]
    pub fn new(start: Instant, rate: f64) -> Self {
        let rate = (rate.is_finite() && rate > 0.0).then_some(rate);
        Self { start, rate }
    }

    /// Due time of send `index`, or `None` when unpaced.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn deadline(&self, index: u64) -> Option<Instant> {
        self.rate.map(|rate| self.start + offset(index as f64 / rate))
    }

    /// Sleeps until send `index` is due. Returns at once when it already is.
    pub async fn wait(&self, index: u64) {
        if let Some(deadline) = self.deadline(index) {
            sleep_until(deadline).await;
        }
    }
}

fn offset(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).map_or(NEVER, |d| d.min(NEVER))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadlines_are_anchored_at_start() {
        let start = Instant::now();
        let schedule = RateSchedule::new(start, 100.0);

        assert_eq!(schedule.deadline(1), Some(start + Duration::from_millis(10)));
        assert_eq!(schedule.deadline(0), Some(start));
        assert_eq!(schedule.deadline(250), Some(start + Duration::from_millis(2500)));
    }

    #[test]
    fn test_zero_rate_is_unpaced() {
        let start = Instant::now();
        assert_eq!(RateSchedule::new(start, 0.0).deadline(10), None);
        assert_eq!(RateSchedule::new(start, f64::NAN).deadline(1), None);
        assert_eq!(RateSchedule::new(start, -5.0).deadline(1), None);
    }

    #[test]
    fn test_tiny_rate_saturates_instead_of_overflowing() {
        let start = Instant::now();
        let schedule = RateSchedule::new(start, 1e-300);

        assert_eq!(schedule.deadline(0), Some(start));
        assert_eq!(schedule.deadline(1), Some(start + NEVER));
        assert_eq!(schedule.deadline(u64::MAX), Some(start + NEVER));
    }

    #[tokio::test(start_paused = true)]
    async fn test_paced_run_sends_at_target_rate() {
        let start = Instant::now();
        let schedule = RateSchedule::new(start, 100.0);
        let window = start + Duration::from_secs(2);
        let interval = Duration::from_millis(10);

        let mut sent = 0u64;
        let mut max_drift = Duration::ZERO;
        loop {
            let due = schedule.deadline(sent).unwrap();
            if due >= window {
                break;
            }
            schedule.wait(sent).await;
            max_drift = max_drift.max(Instant::now() - due);
            // Every tenth send is slow; later sends must not inherit the delay.
            if sent % 10 == 0 {
                tokio::time::sleep(Duration::from_millis(15)).await;
            }
            sent += 1;
        }

        assert!((190..=210).contains(&sent), "sent {sent}");
        assert!(max_drift < interval, "drift {max_drift:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_overdue_send_is_not_delayed() {
        let start = Instant::now();
        let schedule = RateSchedule::new(start, 10.0);
        tokio::time::advance(Duration::from_secs(1)).await;

        let before = Instant::now();
        schedule.wait(3).await;
        assert_eq!(Instant::now(), before);
    }
}
