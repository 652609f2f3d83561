/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FIX acceptor.
//!
//! [`FixServer`] accepts connections concurrently, validates the opening
//! Logon against its own identity and hands business messages to an
//! [`Application`].

use crate::application::{Application, RejectReason};
use crate::connection::{Connection, Event, Handler};
use async_trait::async_trait;
use fixprobe_core::{CompId, FixError, Message, MsgType, SessionError, tags};
use fixprobe_session::{Session, SessionConfig};
use fixprobe_tagvalue::{Reject, decode};
use fixprobe_transport::{DEFAULT_MAX_MESSAGE_SIZE, FixCodec, accept, split};
use futures::StreamExt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Acceptor settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address as `host:port`; port 0 picks a free port.
    pub bind_addr: String,
    /// The acceptor's CompID, expected in the client's TargetCompID (56).
    pub comp_id: CompId,
    /// When set, the only SenderCompID (49) accepted from clients.
    pub expected_client_comp_id: Option<CompId>,
    /// Heartbeat interval used until a client announces its own.
    pub heartbeat_interval: Duration,
    /// Time a new connection has to deliver its Logon.
    pub logon_timeout: Duration,
    /// Maximum frame size in bytes.
    pub max_message_size: usize,
}

impl ServerConfig {
    /// Creates a configuration with default timers.
    #[must_use]
    pub fn new(bind_addr: impl Into<String>, comp_id: CompId) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            comp_id,
            expected_client_comp_id: None,
            heartbeat_interval: Duration::from_secs(30),
            logon_timeout: Duration::from_secs(10),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }

    /// Only accept Logons whose SenderCompID equals `comp_id`.
    #[must_use]
    pub fn with_expected_client(mut self, comp_id: CompId) -> Self {
        self.expected_client_comp_id = Some(comp_id);
        self
    }

    /// Sets the heartbeat interval.
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets the logon timeout.
    #[must_use]
    pub fn with_logon_timeout(mut self, timeout: Duration) -> Self {
        self.logon_timeout = timeout;
        self
    }

    /// Sets the maximum message size.
    #[must_use]
    pub const fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }
}

/// FIX acceptor serving one [`Application`].
#[derive(Debug)]
pub struct FixServer<A: Application> {
    listener: TcpListener,
    config: Arc<ServerConfig>,
    app: Arc<A>,
}

impl<A: Application> FixServer<A> {
    /// Binds the listener.
    ///
    /// # Errors
    /// Returns an I/O error if the address cannot be bound.
    pub async fn bind(config: ServerConfig, app: Arc<A>) -> std::io::Result<Self> {
        let listener = TcpListener::bind(&config.bind_addr).await?;
        info!(addr = ?listener.local_addr().ok(), comp_id = %config.comp_id, "acceptor listening");
        Ok(Self {
            listener,
            config: Arc::new(config),
            app,
        })
    }

    /// Address the listener is bound to.
    ///
    /// # Errors
    /// Returns an I/O error if the socket address cannot be read.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The application answering business messages.
    #[must_use]
    pub fn application(&self) -> Arc<A> {
        Arc::clone(&self.app)
    }

    /// Accepts connections until `cancel` fires; every live connection is
    /// closed when it does.
    ///
    /// # Errors
    /// Currently never fails; accept errors are logged and skipped.
    pub async fn serve(self, cancel: CancellationToken) -> std::io::Result<()> {
        loop {
            let accepted = tokio::select! {
                () = cancel.cancelled() => {
                    info!("acceptor shutting down");
                    return Ok(());
                }
                accepted = accept(&self.listener) => accepted,
            };
            let (stream, peer) = match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    continue;
                }
            };

            let config = Arc::clone(&self.config);
            let app = Arc::clone(&self.app);
            let token = cancel.child_token();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, peer, config, app, token).await {
                    if e.is_protocol_violation() {
                        error!(%peer, error = %e, "protocol violation, dropping connection");
                    } else {
                        warn!(%peer, error = %e, "connection dropped before logon");
                    }
                }
            });
        }
    }
}

async fn handle_connection<A: Application>(
    stream: TcpStream,
    peer: SocketAddr,
    config: Arc<ServerConfig>,
    app: Arc<A>,
    token: CancellationToken,
) -> Result<(), FixError> {
    let codec = FixCodec::new().with_max_message_size(config.max_message_size);
    let (mut reader, writer) = split(stream, codec);

    let first = match tokio::time::timeout(config.logon_timeout, reader.next()).await {
        Err(_) => {
            return Err(SessionError::LogonTimeout {
                timeout_ms: u64::try_from(config.logon_timeout.as_millis()).unwrap_or(u64::MAX),
            }
            .into());
        }
        Ok(None) => return Err(SessionError::Disconnected.into()),
        Ok(Some(Err(e))) => return Err(SessionError::Connection(e.to_string()).into()),
        Ok(Some(Ok(frame))) => decode(&frame)?,
    };

    let client = validate_logon(&first, &config)?;
    let mut session_config = SessionConfig::new(
        config.comp_id.clone(),
        client,
        first.begin_string(),
    )
    .with_heartbeat_interval(config.heartbeat_interval)
    .with_logon_timeout(config.logon_timeout)
    .with_max_message_size(config.max_message_size);
    session_config.target_sub_id = first.get(tags::SENDER_SUB_ID).map(str::to_string);

    let mut session = Session::new(session_config);
    session.on_connecting()?;
    session.on_connected()?;
    let conn = Connection::new(session, writer);
    info!(session = %conn.label(), %peer, "accepted connection");

    conn.spawn(
        reader,
        ServerHandler {
            app,
            logged_on: false,
        },
        Some(first),
    );

    tokio::select! {
        () = token.cancelled() => conn.shutdown().await,
        () = conn.closed() => {}
    }
    Ok(())
}

/// Checks that the opening message is a Logon addressed to this acceptor.
fn validate_logon(msg: &Message, config: &ServerConfig) -> Result<CompId, SessionError> {
    let msg_type = msg.msg_type();
    if msg_type != MsgType::Logon {
        return Err(SessionError::InvalidState {
            expected: "Logon as first message".to_string(),
            current: format!("received MsgType {msg_type}"),
        });
    }

    let target = msg.target_comp_id().unwrap_or_default();
    if target != config.comp_id.as_str() {
        return Err(SessionError::CompIdMismatch {
            tag: tags::TARGET_COMP_ID,
            expected: config.comp_id.to_string(),
            received: target.to_string(),
        });
    }

    let sender = msg.sender_comp_id().unwrap_or_default();
    if let Some(expected) = &config.expected_client_comp_id
        && sender != expected.as_str()
    {
        return Err(SessionError::CompIdMismatch {
            tag: tags::SENDER_COMP_ID,
            expected: expected.to_string(),
            received: sender.to_string(),
        });
    }

    CompId::new(sender).ok_or_else(|| SessionError::CompIdMismatch {
        tag: tags::SENDER_COMP_ID,
        expected: "a CompID of 1 to 32 characters".to_string(),
        received: sender.to_string(),
    })
}

/// Builds the session Reject answering `msg`.
fn reject_for(msg: &Message, reason: &RejectReason) -> Message {
    let mut reject = Message::new(msg.begin_string(), MsgType::Reject)
        .with(
            tags::REF_SEQ_NUM,
            msg.msg_seq_num().unwrap_or_default().to_string(),
        )
        .with(tags::REF_MSG_TYPE, msg.msg_type().as_str())
        .with(tags::SESSION_REJECT_REASON, reason.code.to_string());
    reject.set_opt(tags::TEXT, Some(reason.text.as_str()).filter(|t| !t.is_empty()));
    reject.set_opt(tags::REF_TAG_ID, reason.ref_tag.map(|t| t.to_string()));
    reject
}

struct ServerHandler<A> {
    app: Arc<A>,
    logged_on: bool,
}

#[async_trait]
impl<A: Application> Handler for ServerHandler<A> {
    async fn handle(&mut self, conn: &Connection, event: Event) -> Result<(), SessionError> {
        match event {
            Event::LogonAccepted { heart_bt_int } => {
                let begin_string = conn.session_id().begin_string.clone();
                let reply = Message::new(begin_string, MsgType::Logon)
                    .with(tags::ENCRYPT_METHOD, "0")
                    .with(tags::HEART_BT_INT, heart_bt_int.to_string());
                conn.send(reply).await?;
                self.logged_on = true;
                info!(session = %conn.label(), heart_bt_int, "client logged on");
                self.app.on_logon(conn).await;
            }
            Event::Deliver(msg) => {
                let result = match msg.msg_type() {
                    MsgType::Custom(other) => Err(RejectReason::new(
                        Reject::REASON_INVALID_MSG_TYPE,
                        format!("unsupported MsgType {other}"),
                    )
                    .with_ref_tag(tags::MSG_TYPE)),
                    _ => self.app.on_message(&msg, conn).await,
                };
                match result {
                    Ok(responses) => {
                        for response in responses {
                            conn.send(response).await?;
                        }
                    }
                    Err(reason) => {
                        warn!(session = %conn.label(), code = reason.code, text = %reason.text, "rejecting message");
                        conn.send(reject_for(&msg, &reason)).await?;
                    }
                }
            }
            Event::Logout(_) => {
                debug!(session = %conn.label(), "answering logout");
                let reply = conn.with_session(|s| s.logout_message(None));
                conn.send(reply).await?;
                conn.close();
            }
        }
        Ok(())
    }

    async fn on_closed(&mut self, conn: &Connection) {
        if self.logged_on {
            self.app.on_logout(conn).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientConfig, FixClient};
    use fixprobe_core::{ExecType, OrdStatus, OrdType, Side};
    use fixprobe_session::{SessionConfigBuilder, SessionState};
    use fixprobe_tagvalue::{ExecutionReport, NewOrderSingle, encode};
    use fixprobe_transport::FixWriter;
    use futures::SinkExt;
    use rust_decimal::Decimal;

    struct AckApp;

    #[async_trait]
    impl Application for AckApp {
        async fn on_message(
            &self,
            message: &Message,
            _connection: &Connection,
        ) -> Result<Vec<Message>, RejectReason> {
            let order = NewOrderSingle::try_from(message.clone())
                .map_err(|e| RejectReason::new(Reject::REASON_INVALID_MSG_TYPE, e.to_string()))?;
            let report = ExecutionReport::builder()
                .order_id("O1")
                .exec_id("E1")
                .cl_ord_id(order.cl_ord_id())
                .exec_type(ExecType::New)
                .ord_status(OrdStatus::New)
                .symbol(order.symbol())
                .side(order.side())
                .leaves_qty(order.order_qty())
                .cum_qty(Decimal::ZERO)
                .avg_px(Decimal::ZERO)
                .build()
                .map_err(|e| RejectReason::new(5, e.to_string()))?;
            Ok(vec![report.into()])
        }
    }

    async fn start_server(config: ServerConfig) -> (SocketAddr, CancellationToken) {
        let server = FixServer::bind(config, Arc::new(AckApp)).await.unwrap();
        let addr = server.local_addr().unwrap();
        let cancel = CancellationToken::new();
        tokio::spawn(server.serve(cancel.clone()));
        (addr, cancel)
    }

    fn server_config() -> ServerConfig {
        ServerConfig::new("127.0.0.1:0", CompId::new("SERVER").unwrap())
    }

    fn client_config(addr: SocketAddr, sender: &str, target: &str) -> ClientConfig {
        let session = SessionConfigBuilder::new()
            .sender_comp_id(sender)
            .target_comp_id(target)
            .heartbeat_interval(Duration::from_secs(5))
            .build()
            .unwrap();
        ClientConfig::new(addr.to_string(), session)
    }

    fn order(cl_ord_id: &str) -> Message {
        NewOrderSingle::builder()
            .cl_ord_id(cl_ord_id)
            .symbol("AAPL")
            .side(Side::Buy)
            .ord_type(OrdType::Limit)
            .order_qty(Decimal::from(100))
            .price(Decimal::new(10050, 2))
            .build()
            .unwrap()
            .into()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_logon_and_order_ack() {
        let (addr, cancel) = start_server(server_config()).await;
        let client = FixClient::connect(client_config(addr, "CLIENT", "SERVER"))
            .await
            .unwrap();
        assert_eq!(client.state(), SessionState::LogonPending);

        client.logon(Duration::from_secs(2)).await.unwrap();
        assert_eq!(client.state(), SessionState::Active);

        let seq = client.send(order("A1")).await.unwrap();
        assert_eq!(seq.value(), 2);

        let report = client
            .wait_for_execution_report("A1", Some(OrdStatus::New), Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(report.get(tags::EXEC_TYPE), Some("0"));
        assert_eq!(report.sender_comp_id(), Some("SERVER"));
        assert_eq!(report.target_comp_id(), Some("CLIENT"));
        assert_eq!(report.msg_seq_num(), Some(2));

        client.logout().await.unwrap();
        assert_eq!(client.state(), SessionState::Disconnected);
        assert!(client.receive().await.is_err());
        cancel.cancel();
    }

    #[tokio::test]
    async fn test_unknown_msg_type_rejected_and_session_stays_active() {
        let (addr, cancel) = start_server(server_config()).await;
        let client = FixClient::connect(client_config(addr, "CLIENT", "SERVER"))
            .await
            .unwrap();
        client.logon(Duration::from_secs(2)).await.unwrap();

        let seq = client
            .send(Message::new("FIX.4.4", MsgType::Custom("ZZ".to_string())))
            .await
            .unwrap();
        let reject = client
            .receive_timeout(Duration::from_secs(2))
            .await
            .unwrap()
            .expect("reject");
        assert_eq!(reject.msg_type(), MsgType::Reject);
        assert_eq!(reject.get(tags::REF_MSG_TYPE), Some("ZZ"));
        assert_eq!(reject.get(tags::SESSION_REJECT_REASON), Some("11"));
        assert_eq!(reject.get(tags::REF_SEQ_NUM), Some(seq.to_string().as_str()));
        assert_eq!(client.state(), SessionState::Active);

        client.send(order("A2")).await.unwrap();
        client
            .wait_for_execution_report("A2", None, Duration::from_secs(2))
            .await
            .unwrap();
        cancel.cancel();
    }

    #[tokio::test]
    async fn test_logon_with_wrong_comp_ids_is_dropped() {
        let (addr, cancel) = start_server(server_config()).await;
        let client = FixClient::connect(client_config(addr, "CLIENT", "NOT_SERVER"))
            .await
            .unwrap();
        let err = client.logon(Duration::from_secs(2)).await.unwrap_err();
        assert!(err.is_connection_error(), "{err}");
        cancel.cancel();

        let (addr, cancel) =
            start_server(server_config().with_expected_client(CompId::new("ALLOWED").unwrap()))
                .await;
        let client = FixClient::connect(client_config(addr, "CLIENT", "SERVER"))
            .await
            .unwrap();
        let err = client.logon(Duration::from_secs(2)).await.unwrap_err();
        assert!(err.is_connection_error(), "{err}");
        cancel.cancel();
    }

    #[tokio::test]
    async fn test_logon_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let silent = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
            drop(stream);
        });

        let client = FixClient::connect(client_config(addr, "CLIENT", "SERVER"))
            .await
            .unwrap();
        let err = client
            .logon(Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(client.is_closed());
        silent.abort();
    }

    #[tokio::test]
    async fn test_unanswered_test_request_disconnects() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let mute = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (mut reader, mut writer): (_, FixWriter) = split(stream, FixCodec::new());
            let logon = decode(&reader.next().await.unwrap().unwrap()).unwrap();
            assert_eq!(logon.msg_type(), MsgType::Logon);

            let reply = Message::new("FIX.4.4", MsgType::Logon)
                .with(tags::SENDER_COMP_ID, "SERVER")
                .with(tags::TARGET_COMP_ID, "CLIENT")
                .with(tags::MSG_SEQ_NUM, "1")
                .with(tags::SENDING_TIME, "20260127-10:00:00.000")
                .with(tags::ENCRYPT_METHOD, "0")
                .with(tags::HEART_BT_INT, "0");
            writer.send(encode(&reply).unwrap()).await.unwrap();

            // Keep reading so the client never sees a closed socket.
            while let Some(Ok(_)) = reader.next().await {}
        });

        let mut config = client_config(addr, "CLIENT", "SERVER");
        config.session.heartbeat_interval = Duration::from_millis(100);
        let client = FixClient::connect(config).await.unwrap();
        client.logon(Duration::from_secs(1)).await.unwrap();

        let err = tokio::time::timeout(Duration::from_secs(3), client.receive())
            .await
            .expect("session should end")
            .unwrap_err();
        assert!(err.is_protocol_violation(), "{err}");
        assert_eq!(client.state(), SessionState::Disconnected);
        mute.abort();
    }

    #[tokio::test]
    async fn test_unencodable_order_is_refused_without_using_a_seq_num() {
        let (addr, cancel) = start_server(server_config()).await;
        let client = FixClient::connect(client_config(addr, "CLIENT", "SERVER"))
            .await
            .unwrap();
        client.logon(Duration::from_secs(2)).await.unwrap();

        let smuggled = order("A3").with(tags::TEXT, "note\x01100=INJECTED");
        let err = client.send(smuggled).await.unwrap_err();
        assert!(
            matches!(err, FixError::Session(SessionError::Unencodable(_))),
            "{err}"
        );
        assert_eq!(client.state(), SessionState::Active);

        let seq = client.send(order("A4")).await.unwrap();
        assert_eq!(seq.value(), 2);
        client
            .wait_for_execution_report("A4", Some(OrdStatus::New), Duration::from_secs(2))
            .await
            .unwrap();
        cancel.cancel();
    }

    #[tokio::test]
    async fn test_disconnect_closes_the_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let peer = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (mut reader, _writer): (_, FixWriter) = split(stream, FixCodec::new());
            let mut frames = 0;
            while let Some(Ok(_)) = reader.next().await {
                frames += 1;
            }
            frames
        });

        let client = FixClient::connect(client_config(addr, "CLIENT", "SERVER"))
            .await
            .unwrap();
        client.disconnect().await;
        assert!(client.is_closed());

        let frames = tokio::time::timeout(Duration::from_secs(2), peer)
            .await
            .expect("peer should see end of stream")
            .unwrap();
        assert_eq!(frames, 0);
    }
}
