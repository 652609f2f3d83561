/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Session-bound order driver.
//!
//! [`TrackedOrder`] sends order-entry requests through a [`FixClient`] and
//! moves its [`OrderTracker`] as the matching reports arrive. Waits go
//! through [`FixClient::wait_for_execution_report`], so only the calling
//! task is suspended.
//!
//! ```rust,ignore
//! let mut order = TrackedOrder::new(client, Order::new("C1", "AAPL", Side::Buy, qty).with_price(px));
//! order
//!     .submit().await?
//!     .await_ack().await?
//!     .cancel().await?
//!     .await_canceled().await?
//!     .verify(&Expectation::new(OrderState::Canceled))?;
//! ```

use crate::expectation::Expectation;
use crate::order::{Amendment, Order};
use crate::state::OrderState;
use crate::tracker::OrderTracker;
use fixprobe_core::{ExecType, FixError, Message, MsgType, OrdStatus, TrackerError, tags};
use fixprobe_engine::FixClient;
use fixprobe_tagvalue::{
    MessageBuilder, NewOrderSingle, OrderCancelReplaceRequest, OrderCancelRequest,
};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::info;

/// Default wait for each acknowledgment.
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(5);

/// An order driven over a live session.
#[derive(Debug)]
pub struct TrackedOrder {
    client: FixClient,
    tracker: OrderTracker,
    timeout: Duration,
}

impl TrackedOrder {
    /// Binds an unsent order to `client`.
    #[must_use]
    pub fn new(client: FixClient, order: Order) -> Self {
        Self {
            client,
            tracker: OrderTracker::new(order),
            timeout: DEFAULT_ACK_TIMEOUT,
        }
    }

    /// Sets how long each `await_*` call waits.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The underlying tracker.
    #[must_use]
    pub const fn tracker(&self) -> &OrderTracker {
        &self.tracker
    }

    /// The tracked order.
    #[must_use]
    pub const fn order(&self) -> &Order {
        self.tracker.order()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> OrderState {
        self.tracker.state()
    }

    /// The session this order is sent on.
    #[must_use]
    pub const fn client(&self) -> &FixClient {
        &self.client
    }

    /// Sends the NewOrderSingle.
    ///
    /// # Errors
    /// Returns a tracker error if the order was already sent, a build error
    /// if the order is incomplete, or the session error if sending fails.
    pub async fn submit(&mut self) -> Result<&mut Self, FixError> {
        let order = self.tracker.order();
        let mut builder = MessageBuilder::<NewOrderSingle>::with_begin_string(self.client.begin_string())
            .cl_ord_id(order.cl_ord_id.as_str())
            .symbol(order.symbol.as_str())
            .side(order.side)
            .ord_type(order.ord_type)
            .order_qty(order.order_qty);
        if let Some(px) = order.price {
            builder = builder.price(px);
        }
        let msg: Message = builder.build()?.into();

        self.tracker.issue_new()?;
        self.client.send(msg).await?;
        info!(cl_ord_id = %self.order().cl_ord_id, "order submitted");
        Ok(self)
    }

    /// Waits for the New acknowledgment.
    ///
    /// # Errors
    /// Returns `SessionError::AckTimeout` if no acknowledgment arrives in
    /// time, or a tracker error if the report does not fit the order.
    pub async fn await_ack(&mut self) -> Result<&mut Self, FixError> {
        let id = self.tracker.order().cl_ord_id.clone();
        self.await_report(&id, Some(OrdStatus::New)).await
    }

    /// Waits for the refusal of the pending request: a Rejected report for
    /// a New, or an OrderCancelReject for a cancel or replace.
    ///
    /// # Errors
    /// Returns `TrackerError::UnusableReport` if the next report for the
    /// pending request is not a refusal, or `SessionError::AckTimeout`.
    pub async fn await_reject(&mut self) -> Result<&mut Self, FixError> {
        let id = self.pending_cl_ord_id();
        let report = self
            .client
            .wait_for_execution_report(&id, None, self.timeout)
            .await?;
        let refused = report.is(&MsgType::OrderCancelReject)
            || exec_type(&report) == Some(ExecType::Rejected);
        if !refused {
            return Err(TrackerError::UnusableReport(format!(
                "expected a reject for {id}, received MsgType {} ExecType {}",
                report.msg_type(),
                report.get(tags::EXEC_TYPE).unwrap_or("none"),
            ))
            .into());
        }
        self.tracker.apply_report(&report)?;
        Ok(self)
    }

    /// Sends an OrderCancelRequest under ClOrdID `CXL_<ClOrdID>`.
    ///
    /// # Errors
    /// Returns a tracker error unless the order is working, or the session
    /// error if sending fails.
    pub async fn cancel(&mut self) -> Result<&mut Self, FixError> {
        let order = self.tracker.order();
        let cancel_id = format!("CXL_{}", order.cl_ord_id);
        let mut builder =
            MessageBuilder::<OrderCancelRequest>::with_begin_string(self.client.begin_string())
                .orig_cl_ord_id(order.cl_ord_id.as_str())
                .cl_ord_id(cancel_id.as_str())
                .symbol(order.symbol.as_str())
                .side(order.side);
        if let Some(order_id) = &order.order_id {
            builder = builder.order_id(order_id.as_str());
        }
        let msg: Message = builder.build()?.into();

        self.tracker.issue_cancel(cancel_id)?;
        self.client.send(msg).await?;
        Ok(self)
    }

    /// Waits for the cancel confirmation.
    ///
    /// # Errors
    /// Returns `SessionError::AckTimeout` or a tracker error.
    pub async fn await_canceled(&mut self) -> Result<&mut Self, FixError> {
        let id = self.pending_cl_ord_id();
        self.await_report(&id, Some(OrdStatus::Canceled)).await
    }

    /// Sends an OrderCancelReplaceRequest under ClOrdID `MOD_<ClOrdID>`.
    ///
    /// `price` of `None` keeps the current price.
    ///
    /// # Errors
    /// Returns a tracker error unless the order is working, or the session
    /// error if sending fails.
    pub async fn replace(
        &mut self,
        order_qty: Decimal,
        price: Option<Decimal>,
    ) -> Result<&mut Self, FixError> {
        let order = self.tracker.order();
        let replace_id = format!("MOD_{}", order.cl_ord_id);
        let mut builder = MessageBuilder::<OrderCancelReplaceRequest>::with_begin_string(
            self.client.begin_string(),
        )
        .orig_cl_ord_id(order.cl_ord_id.as_str())
        .cl_ord_id(replace_id.as_str())
        .symbol(order.symbol.as_str())
        .side(order.side)
        .ord_type(order.ord_type)
        .order_qty(order_qty);
        if let Some(px) = price.or(order.price) {
            builder = builder.price(px);
        }
        if let Some(order_id) = &order.order_id {
            builder = builder.order_id(order_id.as_str());
        }
        let msg: Message = builder.build()?.into();

        self.tracker.issue_replace(Amendment {
            cl_ord_id: replace_id,
            order_qty,
            price,
        })?;
        self.client.send(msg).await?;
        Ok(self)
    }

    /// Waits for the replace confirmation.
    ///
    /// # Errors
    /// Returns `SessionError::AckTimeout` or a tracker error.
    pub async fn await_replaced(&mut self) -> Result<&mut Self, FixError> {
        let id = self.pending_cl_ord_id();
        self.await_report(&id, Some(OrdStatus::Replaced)).await
    }

    /// Waits for the next execution and applies it.
    ///
    /// # Errors
    /// Returns `TrackerError::UnusableReport` if the next report for the
    /// order is not an execution, or `SessionError::AckTimeout`.
    pub async fn await_fill(&mut self) -> Result<&mut Self, FixError> {
        let id = self.tracker.order().cl_ord_id.clone();
        let report = self
            .client
            .wait_for_execution_report(&id, None, self.timeout)
            .await?;
        let is_fill = exec_type(&report).is_some_and(ExecType::is_fill);
        if !is_fill {
            return Err(TrackerError::UnusableReport(format!(
                "expected an execution for {id}, received ExecType {}",
                report.get(tags::EXEC_TYPE).unwrap_or("none"),
            ))
            .into());
        }
        self.tracker.apply_report(&report)?;
        Ok(self)
    }

    /// Compares the order against `expectation` without changing it.
    ///
    /// # Errors
    /// Returns `TrackerError::VerificationFailed` on the first mismatch.
    pub fn verify(&mut self, expectation: &Expectation) -> Result<&mut Self, FixError> {
        self.tracker.verify(expectation)?;
        Ok(self)
    }

    async fn await_report(
        &mut self,
        cl_ord_id: &str,
        status: Option<OrdStatus>,
    ) -> Result<&mut Self, FixError> {
        let report = self
            .client
            .wait_for_execution_report(cl_ord_id, status, self.timeout)
            .await?;
        self.tracker.apply_report(&report)?;
        Ok(self)
    }

    /// ClOrdID of the request awaiting acknowledgment.
    fn pending_cl_ord_id(&self) -> String {
        let order = self.tracker.order();
        match order.state {
            OrderState::PendingCancel => order.cancel_cl_ord_id.clone(),
            OrderState::PendingReplace => {
                order.pending_amendment.as_ref().map(|a| a.cl_ord_id.clone())
            }
            _ => None,
        }
        .unwrap_or_else(|| order.cl_ord_id.clone())
    }
}

fn exec_type(report: &Message) -> Option<ExecType> {
    report.get_opt(tags::EXEC_TYPE).ok().flatten()
}
