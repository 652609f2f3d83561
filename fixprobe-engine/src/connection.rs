/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Connection I/O shared by the initiator and the acceptor.
//!
//! A [`Connection`] couples one [`Session`] with the write half of its
//! socket. Each connection runs one reader task and one heartbeat task.
//! Writes go through an async mutex that also covers header stamping, so
//! wire order always equals MsgSeqNum order.

use crate::application::SessionId;
use async_trait::async_trait;
use fixprobe_core::{Message, SeqNum, SessionError};
use fixprobe_session::{HeartbeatAction, Inbound, Session, SessionState};
use fixprobe_tagvalue::{check_values, decode};
use fixprobe_transport::{FixReader, FixWriter};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Session events surfaced to the role-specific handler.
#[derive(Debug)]
pub(crate) enum Event {
    LogonAccepted { heart_bt_int: u64 },
    Deliver(Message),
    Logout(Message),
}

/// Role-specific reaction to session events.
#[async_trait]
pub(crate) trait Handler: Send + 'static {
    /// Reacts to one event; an error ends the connection.
    async fn handle(&mut self, connection: &Connection, event: Event)
    -> Result<(), SessionError>;

    /// Called once after the connection has been closed.
    async fn on_closed(&mut self, connection: &Connection);
}

struct Shared {
    id: u64,
    session_id: SessionId,
    label: String,
    session: parking_lot::Mutex<Session>,
    writer: tokio::sync::Mutex<FixWriter>,
    cancel: CancellationToken,
    close_reason: parking_lot::Mutex<Option<SessionError>>,
}

/// Handle to one live FIX connection.
///
/// Cloning is cheap; every clone refers to the same session.
#[derive(Clone)]
pub struct Connection {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.shared.id)
            .field("session", &self.shared.label)
            .field("state", &self.state())
            .finish()
    }
}

impl Connection {
    pub(crate) fn new(session: Session, writer: FixWriter) -> Self {
        let session_id = SessionId::from(session.config());
        let label = session.id().to_string();
        Self {
            shared: Arc::new(Shared {
                id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
                session_id,
                label,
                session: parking_lot::Mutex::new(session),
                writer: tokio::sync::Mutex::new(writer),
                cancel: CancellationToken::new(),
                close_reason: parking_lot::Mutex::new(None),
            }),
        }
    }

    /// Process-unique connection number.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// Identity of the session carried by this connection.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.shared.session_id
    }

    /// Label used in log fields.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.shared.label
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.shared.session.lock().state()
    }

    /// Returns true once the connection has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    /// Completes when the connection closes.
    pub async fn closed(&self) {
        self.shared.cancel.cancelled().await;
    }

    /// Why the connection closed; `Disconnected` for a local or orderly close.
    #[must_use]
    pub fn close_reason(&self) -> SessionError {
        self.shared
            .close_reason
            .lock()
            .clone()
            .unwrap_or(SessionError::Disconnected)
    }

    /// Stamps `msg` with the next MsgSeqNum and writes it.
    ///
    /// # Errors
    /// Returns `SessionError::Unencodable` for a value the wire cannot carry,
    /// leaving the session untouched, `SessionError::InvalidState` if the
    /// session cannot send the message, the close reason if the connection is
    /// gone, or `SessionError::Connection` if the write fails.
    pub async fn send(&self, msg: Message) -> Result<SeqNum, SessionError> {
        if self.is_closed() {
            return Err(self.close_reason());
        }
        check_values(&msg)?;

        let mut writer = self.shared.writer.lock().await;
        let stamped = self.shared.session.lock().stamp(msg)?;
        let seq = SeqNum::new(stamped.msg_seq_num().unwrap_or_default());

        if let Err(e) = writer.send(&stamped).await {
            drop(writer);
            let err = SessionError::Connection(e.to_string());
            self.fail(err.clone());
            return Err(err);
        }
        Ok(seq)
    }

    /// Closes the connection without recording a fault.
    pub fn close(&self) {
        self.shared.session.lock().disconnect();
        self.shared.cancel.cancel();
    }

    /// Closes the connection and flushes and shuts down the write half.
    pub async fn shutdown(&self) {
        self.close();
        let mut writer = self.shared.writer.lock().await;
        if let Err(e) = SinkExt::<&Message>::close(&mut *writer).await {
            debug!(session = %self.shared.label, error = %e, "write half already closed");
        }
    }

    pub(crate) fn fail(&self, err: SessionError) {
        {
            let mut reason = self.shared.close_reason.lock();
            if reason.is_none() {
                *reason = Some(err);
            }
        }
        self.close();
    }

    pub(crate) fn with_session<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        f(&mut self.shared.session.lock())
    }

    /// Starts the reader and heartbeat tasks.
    ///
    /// `first` is processed before anything is read from the socket; the
    /// acceptor uses it for the Logon it already consumed.
    pub(crate) fn spawn<H: Handler>(&self, reader: FixReader, handler: H, first: Option<Message>) {
        tokio::spawn(read_loop(self.clone(), reader, handler, first));
        tokio::spawn(heartbeat_loop(self.clone()));
    }
}

async fn read_loop<H: Handler>(
    conn: Connection,
    mut reader: FixReader,
    mut handler: H,
    first: Option<Message>,
) {
    let mut pending = first;

    let fault = loop {
        let msg = match pending.take() {
            Some(msg) => msg,
            None => {
                let frame = tokio::select! {
                    () = conn.shared.cancel.cancelled() => None,
                    frame = reader.next() => Some(frame),
                };
                match frame {
                    None => break None,
                    Some(None) => {
                        break Some(SessionError::Connection(
                            "connection closed by peer".to_string(),
                        ));
                    }
                    Some(Some(Err(e))) => {
                        error!(session = %conn.label(), error = %e, "framing error");
                        break Some(SessionError::Connection(e.to_string()));
                    }
                    Some(Some(Ok(frame))) => match decode(&frame) {
                        Ok(msg) => msg,
                        Err(e) => {
                            warn!(session = %conn.label(), error = %e, "rejected malformed message");
                            continue;
                        }
                    },
                }
            }
        };

        let inbound = conn.shared.session.lock().on_inbound(&msg);
        let event = match inbound {
            Err(e) => break Some(e),
            Ok(Inbound::Admin { reply: None }) => continue,
            Ok(Inbound::Admin { reply: Some(reply) }) => {
                if let Err(e) = conn.send(reply).await {
                    break Some(e);
                }
                continue;
            }
            Ok(Inbound::LogonAccepted { heart_bt_int }) => Event::LogonAccepted { heart_bt_int },
            Ok(Inbound::Logout) => Event::Logout(msg),
            Ok(Inbound::Deliver) => Event::Deliver(msg),
        };

        if let Err(e) = handler.handle(&conn, event).await {
            break Some(e);
        }
        if conn.is_closed() {
            break None;
        }
    };

    match fault {
        Some(e) => {
            if !conn.is_closed() {
                error!(session = %conn.label(), error = %e, "session terminated");
            }
            conn.fail(e);
        }
        None => conn.close(),
    }
    handler.on_closed(&conn).await;
    conn.shutdown().await;
    info!(session = %conn.label(), "connection closed");
}

async fn heartbeat_loop(conn: Connection) {
    loop {
        let pause = conn
            .with_session(|s| s.heartbeat_interval() / 4)
            .clamp(Duration::from_millis(10), Duration::from_secs(1));
        tokio::select! {
            () = conn.shared.cancel.cancelled() => return,
            () = tokio::time::sleep(pause) => {}
        }

        let (action, msg) = conn.with_session(|s| {
            let action = s.poll_heartbeat(Instant::now());
            let msg = action.as_ref().and_then(|a| s.liveness_message(a));
            (action, msg)
        });

        if let Some(HeartbeatAction::TimedOut { elapsed }) = action {
            conn.fail(SessionError::HeartbeatTimeout {
                elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            });
            return;
        }
        if let Some(msg) = msg
            && let Err(e) = conn.send(msg).await
        {
            debug!(session = %conn.label(), error = %e, "heartbeat not sent");
            return;
        }
    }
}
