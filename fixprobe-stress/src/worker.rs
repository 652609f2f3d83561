/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! One stress worker: a session, a paced send loop and an ack drain.
//!
//! The send loop owns the [`WorkerResult`]. The drain task and the sampled
//! ack waits report back over a channel that the loop consumes between
//! sends, so no counter is shared across tasks.

use crate::config::StressConfig;
use crate::error::StressError;
use crate::report::WorkerResult;
use crate::schedule::RateSchedule;
use fixprobe_core::{BuildError, ExecType, FixError, Message, MsgType, OrdType, tags};
use fixprobe_engine::{CancellationToken, ClientConfig, FixClient};
use fixprobe_session::SessionConfig;
use fixprobe_tagvalue::{MessageBuilder, NewOrderSingle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How an inbound report answers a NewOrderSingle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Answer {
    Ack,
    Reject,
    Other,
}

impl Answer {
    fn of(msg: &Message) -> Option<Self> {
        if !msg.is(&MsgType::ExecutionReport) {
            return None;
        }
        Some(match msg.get_opt::<ExecType>(tags::EXEC_TYPE).ok().flatten() {
            Some(ExecType::New) => Self::Ack,
            Some(ExecType::Rejected) => Self::Reject,
            _ => Self::Other,
        })
    }
}

#[derive(Debug)]
enum Event {
    /// A report nobody waited for.
    Report(Answer),
    /// A sampled wait ended with a report after `latency`.
    Sampled(Answer, Duration),
    /// A sampled wait timed out or its session ended.
    SampleFailed,
}

/// Mutable state of the send loop.
struct Progress {
    result: WorkerResult,
    samples_in_flight: u64,
}

impl Progress {
    fn apply(&mut self, event: Event) {
        match event {
            Event::Report(answer) => self.count(answer),
            Event::Sampled(answer, latency) => {
                self.samples_in_flight = self.samples_in_flight.saturating_sub(1);
                self.count(answer);
                if answer == Answer::Ack {
                    self.result.record_latency(latency);
                }
            }
            Event::SampleFailed => {
                self.samples_in_flight = self.samples_in_flight.saturating_sub(1);
                self.result.errors += 1;
            }
        }
    }

    fn count(&mut self, answer: Answer) {
        match answer {
            Answer::Ack => self.result.acks += 1,
            Answer::Reject => self.result.rejects += 1,
            Answer::Other => {}
        }
    }

    fn settled(&self) -> bool {
        self.samples_in_flight == 0 && self.result.unanswered() == 0
    }
}

/// Runs worker `index` to completion or cancellation.
///
/// A failed logon ends the worker early with `logon_failed` set; every other
/// failure is counted in the result.
///
/// # Errors
/// Returns `StressError::Histogram` if the latency histogram cannot be allocated.
pub async fn run_worker(
    index: usize,
    config: Arc<StressConfig>,
    cancel: CancellationToken,
) -> Result<WorkerResult, StressError> {
    let mut progress = Progress {
        result: WorkerResult::new(index)?,
        samples_in_flight: 0,
    };

    let client = match open_session(index, &config).await {
        Ok(client) => client,
        Err(e) => {
            warn!(worker = index, error = %e, "logon failed, worker aborted");
            progress.result.logon_failed = true;
            return Ok(progress.result);
        }
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let drain = tokio::spawn(drain(client.clone(), tx.clone()));
    let mut samples = JoinSet::new();
    let started = Instant::now();
    let schedule = RateSchedule::new(started, config.rate_per_worker);

    for i in 0..config.messages_per_worker {
        let ready = loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break false,
                Some(event) = rx.recv() => progress.apply(event),
                () = schedule.wait(i) => break true,
            }
        };
        if !ready {
            break;
        }

        let cl_ord_id = cl_ord_id(&config, index, i);
        let msg = match new_order(&config, client.begin_string(), &cl_ord_id) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(worker = index, %cl_ord_id, error = %e, "order not built");
                progress.result.errors += 1;
                continue;
            }
        };

        let waiter = config
            .is_sampled(i)
            .then(|| client.expect_execution_report(cl_ord_id.as_str(), None));
        let sent_at = Instant::now();
        match client.send(msg).await {
            Ok(_) => {
                progress.result.sent += 1;
                if let Some(waiter) = waiter {
                    progress.samples_in_flight += 1;
                    let tx = tx.clone();
                    let timeout = config.ack_timeout();
                    samples.spawn(async move {
                        let event = match waiter.wait(timeout).await {
                            Ok(report) => match Answer::of(&report) {
                                Some(answer) => Event::Sampled(answer, sent_at.elapsed()),
                                None => Event::SampleFailed,
                            },
                            Err(e) => {
                                debug!(error = %e, "sampled ack missed");
                                Event::SampleFailed
                            }
                        };
                        let _ = tx.send(event);
                    });
                }
            }
            Err(e) => {
                debug!(worker = index, %cl_ord_id, error = %e, "send failed");
                progress.result.errors += 1;
            }
        }
    }

    let grace = sleep(config.grace_period());
    tokio::pin!(grace);
    while !progress.settled() {
        tokio::select! {
            biased;
            Some(event) = rx.recv() => progress.apply(event),
            () = &mut grace => break,
        }
    }

    if progress.samples_in_flight > 0 {
        warn!(
            worker = index,
            pending = progress.samples_in_flight,
            "grace period over, abandoning sampled acks"
        );
        progress.result.errors += progress.samples_in_flight;
    }
    samples.abort_all();
    progress.result.elapsed = started.elapsed();

    if cancel.is_cancelled() {
        client.disconnect().await;
    } else if let Err(e) = client.logout().await {
        debug!(worker = index, error = %e, "logout failed");
    }
    drain.abort();

    let result = progress.result;
    info!(
        worker = index,
        sent = result.sent,
        acks = result.acks,
        rejects = result.rejects,
        errors = result.errors,
        "worker finished"
    );
    Ok(result)
}

async fn open_session(index: usize, config: &StressConfig) -> Result<FixClient, FixError> {
    let session = SessionConfig::new(config.sender()?, config.target()?, config.begin_string.as_str())
        .with_heartbeat_interval(config.heartbeat_interval())
        .with_logon_timeout(config.logon_timeout())
        .with_sender_sub_id(format!("W{index}"));
    let client = FixClient::connect(ClientConfig::new(config.endpoint.as_str(), session)).await?;
    client.logon(config.logon_timeout()).await?;
    Ok(client)
}

/// Forwards every unclaimed ExecutionReport until the session ends.
async fn drain(client: FixClient, tx: mpsc::UnboundedSender<Event>) {
    while let Ok(msg) = client.receive().await {
        if let Some(answer) = Answer::of(&msg)
            && tx.send(Event::Report(answer)).is_err()
        {
            break;
        }
    }
}

fn cl_ord_id(config: &StressConfig, worker: usize, index: u64) -> String {
    let mut nonce = Uuid::new_v4().simple().to_string();
    nonce.truncate(8);
    format!("{}-{worker}-{index}-{nonce}", config.sender_comp_id)
}

fn new_order(config: &StressConfig, begin_string: &str, cl_ord_id: &str) -> Result<Message, BuildError> {
    let builder = MessageBuilder::<NewOrderSingle>::with_begin_string(begin_string)
        .cl_ord_id(cl_ord_id)
        .symbol(config.symbol.as_str())
        .side(config.side)
        .order_qty(config.qty);
    let builder = match config.price {
        Some(px) => builder.ord_type(OrdType::Limit).price(px),
        None => builder.ord_type(OrdType::Market),
    };
    Ok(builder.build()?.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn report(exec_type: ExecType) -> Message {
        Message::new("FIX.4.4", MsgType::ExecutionReport)
            .with(tags::EXEC_TYPE, exec_type.as_char().to_string())
    }

    #[test]
    fn test_answer_classification() {
        assert_eq!(Answer::of(&report(ExecType::New)), Some(Answer::Ack));
        assert_eq!(Answer::of(&report(ExecType::Rejected)), Some(Answer::Reject));
        assert_eq!(Answer::of(&report(ExecType::Fill)), Some(Answer::Other));
        assert_eq!(
            Answer::of(&Message::new("FIX.4.4", MsgType::Heartbeat)),
            None
        );
    }

    #[test]
    fn test_progress_settles_once_every_send_is_answered() {
        let mut progress = Progress {
            result: WorkerResult::new(0).unwrap(),
            samples_in_flight: 1,
        };
        progress.result.sent = 2;

        progress.apply(Event::Report(Answer::Ack));
        assert!(!progress.settled());
        progress.apply(Event::Sampled(Answer::Ack, Duration::from_micros(250)));
        assert!(progress.settled());
        assert_eq!(progress.result.acks, 2);
        assert_eq!(progress.result.latency.len(), 1);

        progress.samples_in_flight = 1;
        progress.apply(Event::SampleFailed);
        assert_eq!(progress.result.errors, 1);
        assert_eq!(progress.samples_in_flight, 0);
    }

    #[test]
    fn test_order_terms_and_id_format() {
        let config = StressConfig::new("127.0.0.1:1", "LOAD", "EXCH").with_order(
            "MSFT",
            fixprobe_core::Side::Sell,
            Decimal::from(5),
            None,
        );
        let id = cl_ord_id(&config, 3, 17);
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(&parts[..3], &["LOAD", "3", "17"]);
        assert_eq!(parts[3].len(), 8);
        assert_ne!(id, cl_ord_id(&config, 3, 17));

        let msg = new_order(&config, "FIX.4.4", &id).unwrap();
        assert_eq!(msg.get(tags::SYMBOL), Some("MSFT"));
        assert_eq!(msg.get(tags::SIDE), Some("2"));
        assert_eq!(msg.get(tags::ORD_TYPE), Some("1"));
        assert!(!msg.contains(tags::PRICE));
    }
}
