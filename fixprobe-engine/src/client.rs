/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FIX initiator.
//!
//! [`FixClient`] connects to an acceptor, performs the Logon exchange and
//! exposes send, receive and execution-report waits. All waits suspend only
//! the calling task.

use crate::connection::{Connection, Event, Handler};
use crate::router::{ExecutionReportRouter, ReportMatch, ReportWaiter};
use async_trait::async_trait;
use fixprobe_core::{FixError, Message, OrdStatus, SeqNum, SessionError, tags};
use fixprobe_session::{Session, SessionConfig, SessionState};
use fixprobe_transport::{FixCodec, connect, split};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// Connection settings for an initiator.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Acceptor address as `host:port`.
    pub addr: String,
    /// Session identity and timers.
    pub session: SessionConfig,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
}

impl ClientConfig {
    /// Creates a configuration with a 5 second connect timeout.
    #[must_use]
    pub fn new(addr: impl Into<String>, session: SessionConfig) -> Self {
        Self {
            addr: addr.into(),
            session,
            connect_timeout: Duration::from_secs(5),
        }
    }

    /// Sets the TCP connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[derive(Debug, Clone)]
enum LogonStatus {
    Pending,
    Accepted,
    Rejected(String),
    Closed(SessionError),
}

struct ClientHandler {
    router: Arc<ExecutionReportRouter>,
    logon_tx: watch::Sender<LogonStatus>,
    logout_sent: Arc<AtomicBool>,
}

#[async_trait]
impl Handler for ClientHandler {
    async fn handle(&mut self, conn: &Connection, event: Event) -> Result<(), SessionError> {
        match event {
            Event::LogonAccepted { heart_bt_int } => {
                info!(session = %conn.label(), heart_bt_int, "logon accepted");
                self.logon_tx.send_replace(LogonStatus::Accepted);
            }
            Event::Deliver(msg) => self.router.dispatch(msg),
            Event::Logout(msg) => {
                let text = msg.get(tags::TEXT).unwrap_or_default().to_string();
                info!(session = %conn.label(), %text, "logout received");
                if matches!(*self.logon_tx.borrow(), LogonStatus::Pending) {
                    self.logon_tx.send_replace(LogonStatus::Rejected(text));
                }
                if !self.logout_sent.swap(true, Ordering::SeqCst) {
                    let reply = conn.with_session(|s| s.logout_message(None));
                    conn.send(reply).await?;
                }
                conn.close();
            }
        }
        Ok(())
    }

    async fn on_closed(&mut self, conn: &Connection) {
        let reason = conn.close_reason();
        self.router.close(reason.clone());
        self.logon_tx.send_if_modified(|status| {
            if matches!(status, LogonStatus::Pending) {
                *status = LogonStatus::Closed(reason);
                true
            } else {
                false
            }
        });
    }
}

/// FIX initiator bound to one connection.
///
/// Cloning is cheap and every clone drives the same session, so one task
/// can send while others await reports.
#[derive(Debug, Clone)]
pub struct FixClient {
    config: Arc<ClientConfig>,
    conn: Connection,
    router: Arc<ExecutionReportRouter>,
    logon_rx: watch::Receiver<LogonStatus>,
    logout_sent: Arc<AtomicBool>,
}

impl FixClient {
    /// Opens the TCP connection and starts the session tasks.
    ///
    /// The session is left in `LogonPending`; call [`FixClient::logon`] next.
    ///
    /// # Errors
    /// Returns `FixError::Config` for an invalid session configuration and
    /// `FixError::Io` if the connection cannot be established.
    pub async fn connect(config: ClientConfig) -> Result<Self, FixError> {
        config.session.validate()?;

        let mut session = Session::new(config.session.clone());
        session.on_connecting()?;
        let stream = connect(config.addr.as_str(), config.connect_timeout).await?;
        session.on_connected()?;

        let codec = FixCodec::new().with_max_message_size(config.session.max_message_size);
        let (reader, writer) = split(stream, codec);
        let conn = Connection::new(session, writer);

        let router = Arc::new(ExecutionReportRouter::new());
        let (logon_tx, logon_rx) = watch::channel(LogonStatus::Pending);
        let logout_sent = Arc::new(AtomicBool::new(false));
        conn.spawn(
            reader,
            ClientHandler {
                router: Arc::clone(&router),
                logon_tx,
                logout_sent: Arc::clone(&logout_sent),
            },
            None,
        );
        info!(session = %conn.label(), addr = %config.addr, "connected");

        Ok(Self {
            config: Arc::new(config),
            conn,
            router,
            logon_rx,
            logout_sent,
        })
    }

    /// Sends Logon and waits for the acceptor's Logon.
    ///
    /// # Errors
    /// - `SessionError::LogonTimeout` if no acknowledgment arrives in time;
    ///   the connection is closed
    /// - `SessionError::LogonRejected` if the acceptor answers with Logout
    /// - the close reason if the connection ends first
    pub async fn logon(&self, timeout: Duration) -> Result<(), FixError> {
        let logon = self.conn.with_session(|s| s.logon_message());
        self.conn.send(logon).await?;

        let mut rx = self.logon_rx.clone();
        let status = match tokio::time::timeout(
            timeout,
            rx.wait_for(|s| !matches!(s, LogonStatus::Pending)),
        )
        .await
        {
            Err(_) => None,
            Ok(Err(_)) => Some(LogonStatus::Closed(SessionError::Disconnected)),
            Ok(Ok(status)) => Some(status.clone()),
        };

        match status {
            Some(LogonStatus::Accepted) => Ok(()),
            Some(LogonStatus::Rejected(reason)) => {
                self.conn.shutdown().await;
                Err(SessionError::LogonRejected { reason }.into())
            }
            Some(LogonStatus::Closed(e)) => Err(e.into()),
            Some(LogonStatus::Pending) | None => {
                warn!(session = %self.conn.label(), ?timeout, "logon timed out");
                self.conn.shutdown().await;
                Err(SessionError::LogonTimeout {
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                }
                .into())
            }
        }
    }

    /// Stamps and sends a business message.
    ///
    /// # Errors
    /// Returns `SessionError::InvalidState` unless the session is Active, or
    /// a connection error if the write fails.
    pub async fn send(&self, msg: Message) -> Result<SeqNum, FixError> {
        Ok(self.conn.send(msg).await?)
    }

    /// Returns the next delivered message that no report waiter claimed.
    ///
    /// # Errors
    /// Returns the close reason once the connection has ended.
    pub async fn receive(&self) -> Result<Message, FixError> {
        Ok(self.router.next().await?)
    }

    /// Like [`FixClient::receive`], returning `Ok(None)` if nothing arrives in time.
    ///
    /// # Errors
    /// Returns the close reason once the connection has ended.
    pub async fn receive_timeout(&self, timeout: Duration) -> Result<Option<Message>, FixError> {
        match tokio::time::timeout(timeout, self.router.next()).await {
            Ok(msg) => Ok(Some(msg?)),
            Err(_) => Ok(None),
        }
    }

    /// Registers a wait for an ExecutionReport before the triggering request
    /// is sent, so no concurrent receiver can claim it first.
    #[must_use]
    pub fn expect_execution_report(
        &self,
        cl_ord_id: impl Into<String>,
        expected_status: Option<OrdStatus>,
    ) -> ReportWaiter {
        self.router.expect(ReportMatch {
            cl_ord_id: cl_ord_id.into(),
            status: expected_status,
        })
    }

    /// Waits for an ExecutionReport whose ClOrdID (11) or OrigClOrdID (41)
    /// equals `cl_ord_id` and whose OrdStatus equals `expected_status`.
    ///
    /// Reports that arrived before the call and were not yet claimed are
    /// considered too.
    ///
    /// # Errors
    /// Returns `SessionError::AckTimeout` on expiry or the close reason if
    /// the connection ends first.
    pub async fn wait_for_execution_report(
        &self,
        cl_ord_id: &str,
        expected_status: Option<OrdStatus>,
        timeout: Duration,
    ) -> Result<Message, FixError> {
        Ok(self
            .expect_execution_report(cl_ord_id, expected_status)
            .wait(timeout)
            .await?)
    }

    /// Sends Logout, waits up to the logon timeout for the acceptor's
    /// answer and closes the connection.
    ///
    /// # Errors
    /// Returns an error if the Logout cannot be sent.
    pub async fn logout(&self) -> Result<(), FixError> {
        if self.logout_sent.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let logout = self.conn.with_session(|s| s.logout_message(None));
        let sent = self.conn.send(logout).await;
        if sent.is_ok()
            && tokio::time::timeout(self.config.session.logon_timeout, self.conn.closed())
                .await
                .is_err()
        {
            warn!(session = %self.conn.label(), "no logout answer, closing");
        }
        self.conn.shutdown().await;
        sent.map(|_| ()).map_err(FixError::from)
    }

    /// Closes the connection without a Logout exchange.
    pub async fn disconnect(&self) {
        self.conn.shutdown().await;
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.conn.state()
    }

    /// Returns true once the connection has ended.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.conn.is_closed()
    }

    /// The underlying connection.
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// The configuration this client was built from.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// BeginString used for outbound messages.
    #[must_use]
    pub fn begin_string(&self) -> &str {
        &self.config.session.begin_string
    }
}
