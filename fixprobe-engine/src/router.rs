/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Delivery of inbound business messages to waiting callers.
//!
//! Every delivered message is offered first to registered report waiters,
//! then queued in a backlog that feeds sequential `receive` calls. A waiter
//! registered after its report arrived still finds it in the backlog.

use fixprobe_core::{Message, MsgType, OrdStatus, SessionError, tags};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, oneshot};

/// Criteria a report must meet to satisfy a waiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportMatch {
    /// ClOrdID compared against tags 11 and 41.
    pub cl_ord_id: String,
    /// Required OrdStatus (39), if any.
    pub status: Option<OrdStatus>,
}

impl ReportMatch {
    /// Returns true if `msg` is an ExecutionReport or OrderCancelReject for
    /// this ClOrdID with the expected status.
    #[must_use]
    pub fn matches(&self, msg: &Message) -> bool {
        if !matches!(
            msg.msg_type(),
            MsgType::ExecutionReport | MsgType::OrderCancelReject
        ) {
            return false;
        }
        let id = self.cl_ord_id.as_str();
        if msg.cl_ord_id() != Some(id) && msg.orig_cl_ord_id() != Some(id) {
            return false;
        }
        match self.status {
            Some(status) => msg
                .get(tags::ORD_STATUS)
                .and_then(|v| v.chars().next())
                .and_then(OrdStatus::from_char)
                == Some(status),
            None => true,
        }
    }
}

struct Waiter {
    id: u64,
    criteria: ReportMatch,
    tx: oneshot::Sender<Message>,
}

#[derive(Default)]
struct RouterState {
    waiters: Vec<Waiter>,
    backlog: VecDeque<Message>,
    closed: Option<SessionError>,
    next_waiter_id: u64,
}

/// Routes delivered messages to report waiters and receivers.
#[derive(Default)]
pub struct ExecutionReportRouter {
    state: parking_lot::Mutex<RouterState>,
    notify: Notify,
}

impl std::fmt::Debug for ExecutionReportRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ExecutionReportRouter")
            .field("waiters", &state.waiters.len())
            .field("backlog", &state.backlog.len())
            .field("closed", &state.closed)
            .finish()
    }
}

impl ExecutionReportRouter {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands a delivered message to the oldest matching waiter, or queues it.
    pub fn dispatch(&self, msg: Message) {
        let mut state = self.state.lock();
        let mut msg = msg;
        while let Some(pos) = state.waiters.iter().position(|w| w.criteria.matches(&msg)) {
            let waiter = state.waiters.remove(pos);
            match waiter.tx.send(msg) {
                Ok(()) => return,
                // Receiver gave up; offer the report to the next waiter.
                Err(returned) => msg = returned,
            }
        }
        state.backlog.push_back(msg);
        drop(state);
        self.notify.notify_waiters();
    }

    /// Registers interest in a report before it can arrive.
    ///
    /// A report already sitting in the backlog satisfies the waiter at once.
    pub fn expect(self: &Arc<Self>, criteria: ReportMatch) -> ReportWaiter {
        let (tx, rx) = oneshot::channel();
        let mut state = self.state.lock();
        let id = state.next_waiter_id;
        state.next_waiter_id += 1;

        if let Some(pos) = state.backlog.iter().position(|m| criteria.matches(m)) {
            if let Some(msg) = state.backlog.remove(pos) {
                let _ = tx.send(msg);
            }
        } else if state.closed.is_none() {
            state.waiters.push(Waiter {
                id,
                criteria: criteria.clone(),
                tx,
            });
        }

        ReportWaiter {
            id,
            cl_ord_id: criteria.cl_ord_id,
            router: Arc::clone(self),
            rx,
        }
    }

    /// Returns the next queued message, waiting for one if necessary.
    ///
    /// # Errors
    /// Returns the close reason once the router is closed and drained.
    pub async fn next(&self) -> Result<Message, SessionError> {
        loop {
            let notified = self.notify.notified();
            {
                let mut state = self.state.lock();
                if let Some(msg) = state.backlog.pop_front() {
                    return Ok(msg);
                }
                if let Some(reason) = &state.closed {
                    return Err(reason.clone());
                }
            }
            notified.await;
        }
    }

    /// Fails all waiters and pending receivers with `reason`.
    pub fn close(&self, reason: SessionError) {
        let mut state = self.state.lock();
        if state.closed.is_none() {
            state.closed = Some(reason);
        }
        state.waiters.clear();
        drop(state);
        self.notify.notify_waiters();
    }

    /// Number of queued, unclaimed messages.
    #[must_use]
    pub fn backlog_len(&self) -> usize {
        self.state.lock().backlog.len()
    }

    fn close_reason(&self) -> SessionError {
        self.state
            .lock()
            .closed
            .clone()
            .unwrap_or(SessionError::Disconnected)
    }

    fn cancel(&self, id: u64) {
        self.state.lock().waiters.retain(|w| w.id != id);
    }
}

/// A registered wait for one report.
///
/// Dropping it withdraws the registration.
#[derive(Debug)]
pub struct ReportWaiter {
    id: u64,
    cl_ord_id: String,
    router: Arc<ExecutionReportRouter>,
    rx: oneshot::Receiver<Message>,
}

impl ReportWaiter {
    /// ClOrdID this waiter matches.
    #[must_use]
    pub fn cl_ord_id(&self) -> &str {
        &self.cl_ord_id
    }

    /// Waits for the matching report.
    ///
    /// # Errors
    /// Returns `SessionError::AckTimeout` when `timeout` elapses, or the
    /// connection's close reason if it ends first.
    pub async fn wait(mut self, timeout: Duration) -> Result<Message, SessionError> {
        match tokio::time::timeout(timeout, &mut self.rx).await {
            Ok(Ok(msg)) => Ok(msg),
            Ok(Err(_)) => Err(self.router.close_reason()),
            Err(_) => Err(SessionError::AckTimeout {
                cl_ord_id: self.cl_ord_id.clone(),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

impl Drop for ReportWaiter {
    fn drop(&mut self) {
        self.router.cancel(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(cl_ord_id: &str, status: OrdStatus) -> Message {
        Message::new("FIX.4.4", MsgType::ExecutionReport)
            .with(tags::CL_ORD_ID, cl_ord_id)
            .with(tags::ORD_STATUS, status.as_char().to_string())
    }

    fn criteria(cl_ord_id: &str, status: Option<OrdStatus>) -> ReportMatch {
        ReportMatch {
            cl_ord_id: cl_ord_id.to_string(),
            status,
        }
    }

    #[test]
    fn test_match_on_orig_cl_ord_id_and_status() {
        let msg = report("CXL_A", OrdStatus::Canceled).with(tags::ORIG_CL_ORD_ID, "A");
        assert!(criteria("A", None).matches(&msg));
        assert!(criteria("CXL_A", Some(OrdStatus::Canceled)).matches(&msg));
        assert!(!criteria("A", Some(OrdStatus::New)).matches(&msg));
        assert!(!criteria("B", None).matches(&msg));

        let heartbeat = Message::new("FIX.4.4", MsgType::Heartbeat).with(tags::CL_ORD_ID, "A");
        assert!(!criteria("A", None).matches(&heartbeat));
    }

    #[tokio::test]
    async fn test_waiter_receives_dispatched_report() {
        let router = Arc::new(ExecutionReportRouter::new());
        let waiter = router.expect(criteria("A", Some(OrdStatus::Filled)));

        router.dispatch(report("A", OrdStatus::New));
        router.dispatch(report("A", OrdStatus::Filled));

        let msg = waiter.wait(Duration::from_secs(1)).await.unwrap();
        assert_eq!(msg.get(tags::ORD_STATUS), Some("2"));
        // The New report was not claimed and remains for receivers.
        assert_eq!(router.backlog_len(), 1);
        assert_eq!(router.next().await.unwrap().get(tags::ORD_STATUS), Some("0"));
    }

    #[tokio::test]
    async fn test_backlog_satisfies_late_waiter() {
        let router = Arc::new(ExecutionReportRouter::new());
        router.dispatch(report("A", OrdStatus::New));

        let msg = router
            .expect(criteria("A", None))
            .wait(Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(msg.cl_ord_id(), Some("A"));
        assert_eq!(router.backlog_len(), 0);
    }

    #[tokio::test]
    async fn test_timed_out_waiter_is_withdrawn() {
        let router = Arc::new(ExecutionReportRouter::new());
        let err = router
            .expect(criteria("A", None))
            .wait(Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::AckTimeout { ref cl_ord_id, timeout_ms: 20 } if cl_ord_id == "A"));
        assert!(err.is_timeout());

        router.dispatch(report("A", OrdStatus::New));
        assert_eq!(router.backlog_len(), 1);
    }

    #[tokio::test]
    async fn test_close_fails_waiters_and_receivers() {
        let router = Arc::new(ExecutionReportRouter::new());
        let waiter = router.expect(criteria("A", None));

        let receiver = {
            let router = Arc::clone(&router);
            tokio::spawn(async move { router.next().await })
        };
        tokio::task::yield_now().await;

        router.close(SessionError::Connection("reset".to_string()));

        let err = waiter.wait(Duration::from_secs(1)).await.unwrap_err();
        assert!(err.is_connection_error());
        let err = receiver.await.unwrap().unwrap_err();
        assert_eq!(err, SessionError::Connection("reset".to_string()));
    }
}
