/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Exchange simulator application.
//!
//! Every request is answered synchronously under the book lock, so the
//! reports for one connection leave in the order its requests arrived.

use crate::book::{IdSequence, OrderBook, SimulatedOrder};
use crate::config::SimulatorConfig;
use crate::error::SimulatorError;
use async_trait::async_trait;
use fixprobe_core::{
    BuildError, CxlRejResponseTo, ExecType, Message, MsgType, OrdStatus, SeqNum, tags,
};
use fixprobe_engine::{Application, Connection, RejectReason};
use fixprobe_tagvalue::{
    ExecutionReport, MessageBuilder, NewOrderSingle, OrderCancelReject,
    OrderCancelReplaceRequest, OrderCancelRequest, Reject,
};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

/// CxlRejReason (102) for a request that arrived after the order closed.
const CXL_REJ_TOO_LATE: &str = "0";
/// CxlRejReason (102) for an order the simulator does not know.
const CXL_REJ_UNKNOWN_ORDER: &str = "1";
/// CxlRejReason (102) for any other refusal.
const CXL_REJ_OTHER: &str = "99";

#[derive(Default)]
struct State {
    book: OrderBook,
    ids: IdSequence,
}

/// Deterministic exchange stub answering order-entry requests.
///
/// The simulator is an explicit object handed to the acceptor; it keeps no
/// global state, so several can run side by side in one process.
pub struct ExchangeSimulator {
    config: SimulatorConfig,
    state: Mutex<State>,
}

impl std::fmt::Debug for ExchangeSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeSimulator")
            .field("config", &self.config)
            .field("open_orders", &self.open_orders())
            .finish()
    }
}

impl ExchangeSimulator {
    /// Creates a simulator with an empty book.
    #[must_use]
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config,
            state: Mutex::new(State::default()),
        }
    }

    /// Behaviour switches.
    #[must_use]
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Snapshot of an order by OrderID.
    #[must_use]
    pub fn order(&self, order_id: &str) -> Option<SimulatedOrder> {
        self.state.lock().book.get(order_id).cloned()
    }

    /// Number of orders that can still trade.
    #[must_use]
    pub fn open_orders(&self) -> usize {
        self.state.lock().book.open_count()
    }

    /// Executes `qty` of an open order at `px` and pushes the report to the
    /// connection that owns the order.
    ///
    /// The report is a partial fill while quantity remains open and a fill
    /// once the order is complete.
    ///
    /// # Errors
    /// - `SimulatorError::UnknownOrder` if the OrderID is not in the book
    /// - `SimulatorError::OrderClosed` if the order is terminal
    /// - `SimulatorError::InvalidFillQty` if `qty` is not positive or exceeds
    ///   the open quantity
    /// - `SimulatorError::Session` if the owning connection cannot send
    pub async fn fill(
        &self,
        order_id: &str,
        qty: Decimal,
        px: Decimal,
    ) -> Result<SeqNum, SimulatorError> {
        let (report, owner) = {
            let mut guard = self.state.lock();
            let State { book, ids } = &mut *guard;
            let entry = book
                .entry_mut(order_id)
                .ok_or_else(|| SimulatorError::UnknownOrder(order_id.to_string()))?;
            if !entry.order.is_open() {
                return Err(SimulatorError::OrderClosed {
                    order_id: order_id.to_string(),
                    status: entry.order.status,
                });
            }
            let leaves = entry.order.leaves_qty();
            if qty <= Decimal::ZERO || qty > leaves {
                return Err(SimulatorError::InvalidFillQty {
                    order_id: order_id.to_string(),
                    qty,
                    leaves,
                });
            }

            entry.order.execute(qty, px);
            let exec_type = if entry.order.is_open() {
                ExecType::PartialFill
            } else {
                ExecType::Fill
            };
            let report = execution_report(
                &entry.owner.session_id().begin_string,
                &entry.order,
                ids.next_exec_id(),
                exec_type,
                entry.order.status,
            )
            .last_qty(qty)
            .last_px(px)
            .build()?;
            (Message::from(report), entry.owner.clone())
        };

        info!(session = %owner.label(), order_id, %qty, %px, "unsolicited fill");
        Ok(owner.send(report).await?)
    }

    fn on_new_order(&self, msg: &Message, conn: &Connection) -> Result<Vec<Message>, RejectReason> {
        let request = NewOrderSingle::try_from(msg.clone()).map_err(invalid_request)?;
        let begin_string = msg.begin_string();
        let conn_id = conn.id();

        let mut guard = self.state.lock();
        let State { book, ids } = &mut *guard;

        let mut order = SimulatedOrder {
            order_id: ids.next_order_id(),
            cl_ord_id: request.cl_ord_id().to_string(),
            symbol: request.symbol().to_string(),
            side: request.side(),
            ord_type: request.ord_type(),
            order_qty: request.order_qty(),
            price: request.price(),
            cum_qty: Decimal::ZERO,
            avg_px: Decimal::ZERO,
            status: OrdStatus::New,
        };

        let refusal = if book.has_open(conn_id, &order.cl_ord_id) {
            Some("duplicate ClOrdID")
        } else if self.config.reject_new_orders {
            Some(self.config.reject_text.as_str())
        } else {
            None
        };
        if let Some(text) = refusal {
            order.status = OrdStatus::Rejected;
            let report = execution_report(
                begin_string,
                &order,
                ids.next_exec_id(),
                ExecType::Rejected,
                OrdStatus::Rejected,
            )
            .text(text)
            .build()
            .map_err(internal)?;
            warn!(session = %conn.label(), cl_ord_id = %order.cl_ord_id, %text, "order rejected");
            return Ok(vec![report.into()]);
        }

        let mut responses = Vec::with_capacity(2);
        let ack = execution_report(
            begin_string,
            &order,
            ids.next_exec_id(),
            ExecType::New,
            OrdStatus::New,
        )
        .build()
        .map_err(internal)?;
        responses.push(ack.into());
        debug!(session = %conn.label(), cl_ord_id = %order.cl_ord_id, order_id = %order.order_id, "order acknowledged");

        if self.config.auto_fill {
            let qty = order.order_qty;
            let px = order.price.unwrap_or_default();
            order.execute(qty, px);
            let fill = execution_report(
                begin_string,
                &order,
                ids.next_exec_id(),
                ExecType::Fill,
                OrdStatus::Filled,
            )
            .last_qty(qty)
            .last_px(px)
            .build()
            .map_err(internal)?;
            responses.push(fill.into());
            debug!(session = %conn.label(), cl_ord_id = %order.cl_ord_id, "order filled");
        }

        book.insert(order, conn.clone());
        Ok(responses)
    }

    fn on_cancel(&self, msg: &Message, conn: &Connection) -> Result<Vec<Message>, RejectReason> {
        let request = OrderCancelRequest::try_from(msg.clone()).map_err(invalid_request)?;
        let begin_string = msg.begin_string();

        let mut guard = self.state.lock();
        let State { book, ids } = &mut *guard;

        let response = match book.find_mut(conn.id(), request.order_id(), request.orig_cl_ord_id())
        {
            Some(order) if order.is_open() => {
                let orig_cl_ord_id = order.cl_ord_id.clone();
                order.status = OrdStatus::Canceled;
                debug!(session = %conn.label(), order_id = %order.order_id, "order canceled");
                execution_report(
                    begin_string,
                    order,
                    ids.next_exec_id(),
                    ExecType::Canceled,
                    OrdStatus::Canceled,
                )
                .cl_ord_id(request.cl_ord_id())
                .orig_cl_ord_id(orig_cl_ord_id)
                .build()
                .map(Message::from)
            }
            Some(order) => cancel_reject(
                begin_string,
                Some(&*order),
                request.cl_ord_id(),
                request.orig_cl_ord_id(),
                CxlRejResponseTo::CancelRequest,
                CXL_REJ_TOO_LATE,
                "order is closed",
            ),
            None => cancel_reject(
                begin_string,
                None,
                request.cl_ord_id(),
                request.orig_cl_ord_id(),
                CxlRejResponseTo::CancelRequest,
                CXL_REJ_UNKNOWN_ORDER,
                "unknown order",
            ),
        };
        Ok(vec![response.map_err(internal)?])
    }

    fn on_replace(&self, msg: &Message, conn: &Connection) -> Result<Vec<Message>, RejectReason> {
        let request = OrderCancelReplaceRequest::try_from(msg.clone()).map_err(invalid_request)?;
        let begin_string = msg.begin_string();
        let conn_id = conn.id();

        let mut guard = self.state.lock();
        let State { book, ids } = &mut *guard;

        let mut rekey = None;
        let response = match book.find_mut(conn_id, None, request.orig_cl_ord_id()) {
            Some(order) if order.is_open() && request.order_qty() > order.cum_qty => {
                let orig_cl_ord_id = std::mem::replace(
                    &mut order.cl_ord_id,
                    request.cl_ord_id().to_string(),
                );
                order.order_qty = request.order_qty();
                order.ord_type = request.ord_type();
                if let Some(px) = request.price() {
                    order.price = Some(px);
                }
                rekey = Some(order.order_id.clone());
                debug!(session = %conn.label(), order_id = %order.order_id, qty = %order.order_qty, "order replaced");
                execution_report(
                    begin_string,
                    order,
                    ids.next_exec_id(),
                    ExecType::Replaced,
                    OrdStatus::Replaced,
                )
                .orig_cl_ord_id(orig_cl_ord_id)
                .build()
                .map(Message::from)
            }
            Some(order) if order.is_open() => cancel_reject(
                begin_string,
                Some(&*order),
                request.cl_ord_id(),
                request.orig_cl_ord_id(),
                CxlRejResponseTo::CancelReplaceRequest,
                CXL_REJ_OTHER,
                "quantity not above executed quantity",
            ),
            Some(order) => cancel_reject(
                begin_string,
                Some(&*order),
                request.cl_ord_id(),
                request.orig_cl_ord_id(),
                CxlRejResponseTo::CancelReplaceRequest,
                CXL_REJ_TOO_LATE,
                "order is closed",
            ),
            None => cancel_reject(
                begin_string,
                None,
                request.cl_ord_id(),
                request.orig_cl_ord_id(),
                CxlRejResponseTo::CancelReplaceRequest,
                CXL_REJ_UNKNOWN_ORDER,
                "unknown order",
            ),
        };

        if let Some(order_id) = rekey {
            book.rekey(conn_id, &order_id, request.cl_ord_id());
        }
        Ok(vec![response.map_err(internal)?])
    }
}

#[async_trait]
impl Application for ExchangeSimulator {
    async fn on_logon(&self, connection: &Connection) {
        info!(session = %connection.label(), "simulator session opened");
    }

    async fn on_logout(&self, connection: &Connection) {
        let removed = self.state.lock().book.remove_connection(connection.id());
        info!(session = %connection.label(), removed, "simulator session closed");
    }

    async fn on_message(
        &self,
        message: &Message,
        connection: &Connection,
    ) -> Result<Vec<Message>, RejectReason> {
        match message.msg_type() {
            MsgType::NewOrderSingle => self.on_new_order(message, connection),
            MsgType::OrderCancelRequest => self.on_cancel(message, connection),
            MsgType::OrderCancelReplaceRequest => self.on_replace(message, connection),
            MsgType::Reject => {
                warn!(session = %connection.label(), text = message.get(tags::TEXT).unwrap_or_default(), "counterparty rejected a report");
                Ok(Vec::new())
            }
            other => Err(RejectReason::new(
                Reject::REASON_INVALID_MSG_TYPE,
                format!("simulator does not accept MsgType {other}"),
            )
            .with_ref_tag(tags::MSG_TYPE)),
        }
    }
}

/// Starts an ExecutionReport describing `order` after the event.
fn execution_report(
    begin_string: &str,
    order: &SimulatedOrder,
    exec_id: String,
    exec_type: ExecType,
    ord_status: OrdStatus,
) -> MessageBuilder<ExecutionReport> {
    let builder = MessageBuilder::<ExecutionReport>::with_begin_string(begin_string)
        .order_id(order.order_id.as_str())
        .exec_id(exec_id)
        .cl_ord_id(order.cl_ord_id.as_str())
        .exec_type(exec_type)
        .ord_status(ord_status)
        .symbol(order.symbol.as_str())
        .side(order.side)
        .ord_type(order.ord_type)
        .order_qty(order.order_qty)
        .leaves_qty(order.leaves_qty())
        .cum_qty(order.cum_qty)
        .avg_px(order.avg_px);
    match order.price {
        Some(px) => builder.price(px),
        None => builder,
    }
}

fn cancel_reject(
    begin_string: &str,
    order: Option<&SimulatedOrder>,
    cl_ord_id: &str,
    orig_cl_ord_id: &str,
    response_to: CxlRejResponseTo,
    reason: &str,
    text: &str,
) -> Result<Message, BuildError> {
    let (order_id, status) = order.map_or(("NONE".to_string(), OrdStatus::Rejected), |o| {
        (o.order_id.clone(), o.status)
    });
    MessageBuilder::<OrderCancelReject>::with_begin_string(begin_string)
        .order_id(order_id)
        .cl_ord_id(cl_ord_id)
        .orig_cl_ord_id(orig_cl_ord_id)
        .ord_status(status)
        .cxl_rej_response_to(response_to)
        .field(tags::CXL_REJ_REASON, reason)
        .text(text)
        .build()
        .map(Message::from)
}

/// Maps a request that fails its typed view to a session Reject.
fn invalid_request(err: BuildError) -> RejectReason {
    match &err {
        BuildError::MissingRequiredField { tag, .. } => {
            RejectReason::new(Reject::REASON_REQUIRED_TAG_MISSING, err.to_string())
                .with_ref_tag(*tag)
        }
        BuildError::InvalidFieldValue { tag, .. } => {
            RejectReason::new(Reject::REASON_VALUE_INCORRECT, err.to_string()).with_ref_tag(*tag)
        }
        BuildError::WrongMsgType { .. } => {
            RejectReason::new(Reject::REASON_INVALID_MSG_TYPE, err.to_string())
        }
    }
}

fn internal(err: BuildError) -> RejectReason {
    warn!(error = %err, "simulator failed to build a report");
    RejectReason::new(99, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixprobe_core::{CompId, OrdType, Side};
    use fixprobe_engine::{CancellationToken, ClientConfig, FixClient, FixServer, ServerConfig};
    use fixprobe_session::SessionConfigBuilder;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(2);

    async fn start(config: SimulatorConfig) -> (SocketAddr, CancellationToken, Arc<ExchangeSimulator>) {
        let simulator = Arc::new(ExchangeSimulator::new(config));
        let server = FixServer::bind(
            ServerConfig::new("127.0.0.1:0", CompId::new("EXCH").unwrap()),
            Arc::clone(&simulator),
        )
        .await
        .unwrap();
        let addr = server.local_addr().unwrap();
        let cancel = CancellationToken::new();
        tokio::spawn(server.serve(cancel.clone()));
        (addr, cancel, simulator)
    }

    async fn client(addr: SocketAddr) -> FixClient {
        let session = SessionConfigBuilder::new()
            .sender_comp_id("CLIENT")
            .target_comp_id("EXCH")
            .build()
            .unwrap();
        let client = FixClient::connect(ClientConfig::new(addr.to_string(), session))
            .await
            .unwrap();
        client.logon(WAIT).await.unwrap();
        client
    }

    fn limit_order(cl_ord_id: &str, qty: i64, px: Decimal) -> Message {
        NewOrderSingle::builder()
            .cl_ord_id(cl_ord_id)
            .symbol("AAPL")
            .side(Side::Buy)
            .ord_type(OrdType::Limit)
            .order_qty(Decimal::from(qty))
            .price(px)
            .build()
            .unwrap()
            .into()
    }

    fn decimal(msg: &Message, tag: u32) -> Decimal {
        msg.get_as(tag).unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_auto_fill_follows_new_ack() {
        let (addr, cancel, simulator) = start(SimulatorConfig::new().with_auto_fill(true)).await;
        let client = client(addr).await;

        client
            .send(limit_order("C1", 100, Decimal::new(10050, 2)))
            .await
            .unwrap();

        let ack = client
            .wait_for_execution_report("C1", Some(OrdStatus::New), WAIT)
            .await
            .unwrap();
        assert_eq!(ack.get(tags::EXEC_TYPE), Some("0"));
        assert_eq!(ack.get(tags::ORDER_ID), Some("ORD00000001"));
        assert_eq!(ack.get(tags::SYMBOL), Some("AAPL"));
        assert_eq!(ack.get(tags::SIDE), Some("1"));
        assert_eq!(decimal(&ack, tags::ORDER_QTY), Decimal::from(100));
        assert_eq!(decimal(&ack, tags::PRICE), Decimal::new(10050, 2));
        assert_eq!(decimal(&ack, tags::LEAVES_QTY), Decimal::from(100));
        assert_eq!(decimal(&ack, tags::CUM_QTY), Decimal::ZERO);
        assert_eq!(decimal(&ack, tags::AVG_PX), Decimal::ZERO);

        let fill = client
            .wait_for_execution_report("C1", Some(OrdStatus::Filled), WAIT)
            .await
            .unwrap();
        assert_eq!(fill.get(tags::EXEC_TYPE), Some("2"));
        assert_eq!(decimal(&fill, tags::CUM_QTY), Decimal::from(100));
        assert_eq!(decimal(&fill, tags::LEAVES_QTY), Decimal::ZERO);
        assert_eq!(decimal(&fill, tags::AVG_PX), Decimal::new(10050, 2));
        assert_eq!(decimal(&fill, tags::LAST_QTY), Decimal::from(100));
        assert_eq!(decimal(&fill, tags::LAST_PX), Decimal::new(10050, 2));
        assert!(fill.msg_seq_num() > ack.msg_seq_num());
        assert_ne!(fill.get(tags::EXEC_ID), ack.get(tags::EXEC_ID));
        assert_eq!(simulator.open_orders(), 0);

        cancel.cancel();
    }

    #[tokio::test]
    async fn test_reject_mode() {
        let (addr, cancel, simulator) = start(
            SimulatorConfig::new()
                .with_reject_new_orders(true)
                .with_reject_text("market closed"),
        )
        .await;
        let client = client(addr).await;

        client
            .send(limit_order("R1", 10, Decimal::ONE))
            .await
            .unwrap();
        let report = client
            .wait_for_execution_report("R1", Some(OrdStatus::Rejected), WAIT)
            .await
            .unwrap();
        assert_eq!(report.get(tags::EXEC_TYPE), Some("8"));
        assert_eq!(report.get(tags::TEXT), Some("market closed"));
        assert_eq!(decimal(&report, tags::LEAVES_QTY), Decimal::ZERO);
        assert_eq!(simulator.open_orders(), 0);

        cancel.cancel();
    }

    #[tokio::test]
    async fn test_cancel_open_then_closed_order() {
        let (addr, cancel, _simulator) = start(SimulatorConfig::new()).await;
        let client = client(addr).await;

        client
            .send(limit_order("C1", 100, Decimal::TEN))
            .await
            .unwrap();
        client
            .wait_for_execution_report("C1", Some(OrdStatus::New), WAIT)
            .await
            .unwrap();

        let cancel_request = |cl_ord_id: &str| -> Message {
            OrderCancelRequest::builder()
                .orig_cl_ord_id("C1")
                .cl_ord_id(cl_ord_id)
                .symbol("AAPL")
                .side(Side::Buy)
                .build()
                .unwrap()
                .into()
        };

        client.send(cancel_request("CXL_C1")).await.unwrap();
        let canceled = client
            .wait_for_execution_report("CXL_C1", Some(OrdStatus::Canceled), WAIT)
            .await
            .unwrap();
        assert_eq!(canceled.get(tags::EXEC_TYPE), Some("4"));
        assert_eq!(canceled.get(tags::ORIG_CL_ORD_ID), Some("C1"));
        assert_eq!(decimal(&canceled, tags::LEAVES_QTY), Decimal::ZERO);

        client.send(cancel_request("CXL2_C1")).await.unwrap();
        let reject = client
            .wait_for_execution_report("CXL2_C1", None, WAIT)
            .await
            .unwrap();
        assert_eq!(reject.msg_type(), MsgType::OrderCancelReject);
        assert_eq!(reject.get(tags::CXL_REJ_RESPONSE_TO), Some("1"));
        assert_eq!(reject.get(tags::ORD_STATUS), Some("4"));
        assert_eq!(reject.get(tags::CXL_REJ_REASON), Some(CXL_REJ_TOO_LATE));

        cancel.cancel();
    }

    #[tokio::test]
    async fn test_cancel_unknown_order() {
        let (addr, cancel, _simulator) = start(SimulatorConfig::new()).await;
        let client = client(addr).await;

        let request: Message = OrderCancelRequest::builder()
            .orig_cl_ord_id("NOPE")
            .cl_ord_id("CXL_NOPE")
            .symbol("AAPL")
            .side(Side::Sell)
            .build()
            .unwrap()
            .into();
        client.send(request).await.unwrap();

        let reject = client
            .wait_for_execution_report("CXL_NOPE", None, WAIT)
            .await
            .unwrap();
        assert_eq!(reject.msg_type(), MsgType::OrderCancelReject);
        assert_eq!(reject.get(tags::ORDER_ID), Some("NONE"));
        assert_eq!(reject.get(tags::CXL_REJ_RESPONSE_TO), Some("1"));
        assert_eq!(reject.get(tags::CXL_REJ_REASON), Some(CXL_REJ_UNKNOWN_ORDER));

        cancel.cancel();
    }

    #[tokio::test]
    async fn test_replace_updates_quantity_and_price() {
        let (addr, cancel, simulator) = start(SimulatorConfig::new()).await;
        let client = client(addr).await;

        client
            .send(limit_order("C1", 100, Decimal::TEN))
            .await
            .unwrap();
        let ack = client
            .wait_for_execution_report("C1", Some(OrdStatus::New), WAIT)
            .await
            .unwrap();
        let order_id = ack.get(tags::ORDER_ID).unwrap().to_string();

        let replace = |orig: &str, cl_ord_id: &str| -> Message {
            OrderCancelReplaceRequest::builder()
                .orig_cl_ord_id(orig)
                .cl_ord_id(cl_ord_id)
                .symbol("AAPL")
                .side(Side::Buy)
                .ord_type(OrdType::Limit)
                .order_qty(Decimal::from(50))
                .price(Decimal::new(1100, 2))
                .build()
                .unwrap()
                .into()
        };

        client.send(replace("C1", "MOD_C1")).await.unwrap();
        let replaced = client
            .wait_for_execution_report("MOD_C1", Some(OrdStatus::Replaced), WAIT)
            .await
            .unwrap();
        assert_eq!(replaced.get(tags::EXEC_TYPE), Some("5"));
        assert_eq!(replaced.get(tags::ORIG_CL_ORD_ID), Some("C1"));
        assert_eq!(replaced.get(tags::ORDER_ID), Some(order_id.as_str()));
        assert_eq!(decimal(&replaced, tags::ORDER_QTY), Decimal::from(50));
        assert_eq!(decimal(&replaced, tags::PRICE), Decimal::new(1100, 2));
        assert_eq!(decimal(&replaced, tags::LEAVES_QTY), Decimal::from(50));

        let resting = simulator.order(&order_id).unwrap();
        assert_eq!(resting.cl_ord_id, "MOD_C1");
        assert_eq!(resting.status, OrdStatus::New);

        client.send(replace("GONE", "MOD_GONE")).await.unwrap();
        let reject = client
            .wait_for_execution_report("MOD_GONE", None, WAIT)
            .await
            .unwrap();
        assert_eq!(reject.msg_type(), MsgType::OrderCancelReject);
        assert_eq!(reject.get(tags::CXL_REJ_RESPONSE_TO), Some("2"));

        cancel.cancel();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unsolicited_partial_then_full_fill() {
        let (addr, cancel, simulator) = start(SimulatorConfig::new()).await;
        let client = client(addr).await;

        client
            .send(limit_order("C1", 100, Decimal::TEN))
            .await
            .unwrap();
        let ack = client
            .wait_for_execution_report("C1", Some(OrdStatus::New), WAIT)
            .await
            .unwrap();
        let order_id = ack.get(tags::ORDER_ID).unwrap().to_string();

        simulator
            .fill(&order_id, Decimal::from(40), Decimal::TEN)
            .await
            .unwrap();
        let partial = client
            .wait_for_execution_report("C1", Some(OrdStatus::PartiallyFilled), WAIT)
            .await
            .unwrap();
        assert_eq!(partial.get(tags::EXEC_TYPE), Some("1"));
        assert_eq!(decimal(&partial, tags::CUM_QTY), Decimal::from(40));
        assert_eq!(decimal(&partial, tags::LEAVES_QTY), Decimal::from(60));

        let err = simulator
            .fill(&order_id, Decimal::from(61), Decimal::TEN)
            .await
            .unwrap_err();
        assert!(matches!(err, SimulatorError::InvalidFillQty { .. }));

        simulator
            .fill(&order_id, Decimal::from(60), Decimal::TEN)
            .await
            .unwrap();
        let full = client
            .wait_for_execution_report("C1", Some(OrdStatus::Filled), WAIT)
            .await
            .unwrap();
        assert_eq!(decimal(&full, tags::CUM_QTY), Decimal::from(100));

        let err = simulator
            .fill(&order_id, Decimal::ONE, Decimal::TEN)
            .await
            .unwrap_err();
        assert!(matches!(err, SimulatorError::OrderClosed { .. }));
        let err = simulator
            .fill("ORD99999999", Decimal::ONE, Decimal::TEN)
            .await
            .unwrap_err();
        assert_eq!(err, SimulatorError::UnknownOrder("ORD99999999".to_string()));

        cancel.cancel();
    }

    #[tokio::test]
    async fn test_invalid_and_unsupported_messages_rejected() {
        let (addr, cancel, _simulator) = start(SimulatorConfig::new()).await;
        let client = client(addr).await;

        let missing_symbol = Message::new("FIX.4.4", MsgType::NewOrderSingle)
            .with(tags::CL_ORD_ID, "X1")
            .with(tags::SIDE, "1")
            .with(tags::ORDER_QTY, "100")
            .with(tags::ORD_TYPE, "1");
        client.send(missing_symbol).await.unwrap();
        let reject = client.receive_timeout(WAIT).await.unwrap().expect("reject");
        assert_eq!(reject.msg_type(), MsgType::Reject);
        assert_eq!(reject.get(tags::SESSION_REJECT_REASON), Some("1"));
        assert_eq!(reject.get(tags::REF_TAG_ID), Some("55"));

        let report = Message::new("FIX.4.4", MsgType::ExecutionReport).with(tags::CL_ORD_ID, "X2");
        client.send(report).await.unwrap();
        let reject = client.receive_timeout(WAIT).await.unwrap().expect("reject");
        assert_eq!(reject.get(tags::REF_MSG_TYPE), Some("8"));
        assert_eq!(reject.get(tags::SESSION_REJECT_REASON), Some("11"));

        cancel.cancel();
    }
}
