/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Order lifecycle tracker.
//!
//! [`OrderTracker`] owns one [`Order`] and moves it through the transition
//! table in [`crate::state`]. Every operation takes `&mut self` and returns
//! the tracker again so calls can be chained with `?`.

use crate::expectation::Expectation;
use crate::order::{Amendment, HistoryEntry, Order};
use crate::state::{OrderAction, OrderState};
use fixprobe_core::{ExecType, Message, MsgType, TrackerError};
use fixprobe_tagvalue::ExecutionReport;
use rust_decimal::Decimal;
use tracing::debug;

/// Tracks the lifecycle of a single order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTracker {
    order: Order,
}

impl OrderTracker {
    /// Starts tracking an unsent order.
    #[must_use]
    pub const fn new(order: Order) -> Self {
        Self { order }
    }

    /// The tracked order.
    #[must_use]
    pub const fn order(&self) -> &Order {
        &self.order
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> OrderState {
        self.order.state
    }

    /// Every applied action in order.
    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.order.history
    }

    /// Records that the NewOrderSingle was sent.
    ///
    /// # Errors
    /// Returns `TrackerError::InvalidTransition` unless the order is unsent.
    pub fn issue_new(&mut self) -> Result<&mut Self, TrackerError> {
        self.apply(OrderAction::IssueNew)?;
        Ok(self)
    }

    /// Records the exchange acknowledgment and adopts its OrderID.
    ///
    /// # Errors
    /// Returns `TrackerError::InvalidTransition` unless a New is pending.
    pub fn ack_new(&mut self, order_id: Option<&str>) -> Result<&mut Self, TrackerError> {
        self.apply(OrderAction::AckNew)?;
        if let Some(id) = order_id {
            self.order.order_id = Some(id.to_string());
        }
        Ok(self)
    }

    /// Records a refusal of the pending request.
    ///
    /// A refused New rejects the order; a refused cancel or replace leaves
    /// the order working and unchanged.
    ///
    /// # Errors
    /// Returns `TrackerError::InvalidTransition` unless a request is pending.
    pub fn ack_reject(&mut self) -> Result<&mut Self, TrackerError> {
        self.apply(OrderAction::AckReject)?;
        self.order.cancel_cl_ord_id = None;
        self.order.pending_amendment = None;
        Ok(self)
    }

    /// Records that an OrderCancelRequest was sent under `cl_ord_id`.
    ///
    /// # Errors
    /// Returns `TrackerError::InvalidTransition` unless the order is working.
    pub fn issue_cancel(&mut self, cl_ord_id: impl Into<String>) -> Result<&mut Self, TrackerError> {
        self.apply(OrderAction::IssueCancel)?;
        self.order.cancel_cl_ord_id = Some(cl_ord_id.into());
        Ok(self)
    }

    /// Records the cancel confirmation.
    ///
    /// # Errors
    /// Returns `TrackerError::InvalidTransition` unless a cancel is pending.
    pub fn ack_canceled(&mut self) -> Result<&mut Self, TrackerError> {
        self.apply(OrderAction::AckCanceled)?;
        Ok(self)
    }

    /// Records that an OrderCancelReplaceRequest was sent.
    ///
    /// # Errors
    /// Returns `TrackerError::InvalidTransition` unless the order is working.
    pub fn issue_replace(&mut self, amendment: Amendment) -> Result<&mut Self, TrackerError> {
        self.apply(OrderAction::IssueReplace)?;
        self.order.pending_amendment = Some(amendment);
        Ok(self)
    }

    /// Records the replace confirmation and applies the amendment.
    ///
    /// # Errors
    /// Returns `TrackerError::InvalidTransition` unless a replace is pending.
    pub fn ack_replaced(&mut self) -> Result<&mut Self, TrackerError> {
        self.apply(OrderAction::AckReplaced)?;
        if let Some(amendment) = self.order.pending_amendment.take() {
            self.order.cl_ord_id = amendment.cl_ord_id;
            self.order.order_qty = amendment.order_qty;
            if amendment.price.is_some() {
                self.order.price = amendment.price;
            }
        }
        Ok(self)
    }

    /// Records an execution of `qty` at `px`.
    ///
    /// The action is a full fill when `qty` completes the order and a partial
    /// fill otherwise.
    ///
    /// # Errors
    /// - `TrackerError::InvalidTransition` unless the order is working
    /// - `TrackerError::UnusableReport` if `qty` is not positive or exceeds
    ///   the open quantity
    pub fn fill(&mut self, qty: Decimal, px: Decimal) -> Result<&mut Self, TrackerError> {
        let leaves = self.order.leaves_qty();
        let action = if qty >= leaves {
            OrderAction::FullFill
        } else {
            OrderAction::PartialFill
        };
        let next = self.order.state.transition(action)?;
        if qty <= Decimal::ZERO || qty > leaves {
            return Err(TrackerError::UnusableReport(format!(
                "fill of {qty} against open quantity {leaves}"
            )));
        }

        let filled = self.order.cum_qty + qty;
        self.order.avg_px = if self.order.cum_qty.is_zero() {
            px
        } else {
            (self.order.avg_px * self.order.cum_qty + px * qty) / filled
        };
        self.order.cum_qty = filled;
        self.record(action, next);
        Ok(self)
    }

    /// Applies an inbound ExecutionReport or OrderCancelReject.
    ///
    /// | Report                         | Action        |
    /// |--------------------------------|---------------|
    /// | ExecType New                   | ack New       |
    /// | ExecType Rejected              | ack Reject    |
    /// | OrderCancelReject              | ack Reject    |
    /// | ExecType Canceled              | ack Canceled  |
    /// | ExecType Replaced              | ack Replaced  |
    /// | ExecType PartialFill/Fill/Trade| fill          |
    ///
    /// Pending-status reports are informational and leave the order as is.
    ///
    /// # Errors
    /// - `TrackerError::UnusableReport` for other messages or malformed reports
    /// - `TrackerError::InvalidTransition` if the report does not fit the state
    pub fn apply_report(&mut self, msg: &Message) -> Result<&mut Self, TrackerError> {
        match msg.msg_type() {
            MsgType::OrderCancelReject => self.ack_reject(),
            MsgType::ExecutionReport => {
                let report = ExecutionReport::try_from(msg.clone())
                    .map_err(|e| TrackerError::UnusableReport(e.to_string()))?;
                match report.exec_type() {
                    ExecType::New => self.ack_new(Some(report.order_id())),
                    ExecType::Rejected => self.ack_reject(),
                    ExecType::Canceled => self.ack_canceled(),
                    ExecType::Replaced => {
                        self.ack_replaced()?;
                        if let Some(qty) = report.order_qty() {
                            self.order.order_qty = qty;
                        }
                        if let Some(px) = report.price() {
                            self.order.price = Some(px);
                        }
                        Ok(self)
                    }
                    ExecType::PartialFill | ExecType::Fill | ExecType::Trade => {
                        let qty = report.last_qty().ok_or_else(|| {
                            TrackerError::UnusableReport("fill report without LastQty".to_string())
                        })?;
                        let px = report.last_px().unwrap_or_else(|| report.avg_px());
                        self.fill(qty, px)
                    }
                    ExecType::PendingNew | ExecType::PendingCancel | ExecType::PendingReplace => {
                        debug!(cl_ord_id = %self.order.cl_ord_id, exec_type = %report.exec_type(), "pending report ignored");
                        Ok(self)
                    }
                    other => Err(TrackerError::UnusableReport(format!(
                        "unsupported ExecType {other}"
                    ))),
                }
            }
            other => Err(TrackerError::UnusableReport(format!(
                "MsgType {other} is not an order report"
            ))),
        }
    }

    /// Compares the order against `expectation` without changing it.
    ///
    /// # Errors
    /// Returns `TrackerError::VerificationFailed` on the first mismatch.
    pub fn verify(&self, expectation: &Expectation) -> Result<&Self, TrackerError> {
        expectation.check(&self.order)?;
        Ok(self)
    }

    fn apply(&mut self, action: OrderAction) -> Result<OrderState, TrackerError> {
        let next = self.order.state.transition(action)?;
        self.record(action, next);
        Ok(next)
    }

    fn record(&mut self, action: OrderAction, next: OrderState) {
        debug!(cl_ord_id = %self.order.cl_ord_id, %action, from = %self.order.state, to = %next, "order transition");
        self.order.record(action, next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixprobe_core::{CxlRejResponseTo, OrdStatus, OrdType, Side, tags};
    use fixprobe_tagvalue::{MessageBuilder, OrderCancelReject};

    fn tracker() -> OrderTracker {
        OrderTracker::new(
            Order::new("C1", "AAPL", Side::Sell, Decimal::from(100)).with_price(Decimal::TEN),
        )
    }

    fn working() -> OrderTracker {
        let mut t = tracker();
        t.issue_new().unwrap().ack_new(Some("ORD1")).unwrap();
        t
    }

    fn report(exec_type: ExecType, status: OrdStatus) -> MessageBuilder<ExecutionReport> {
        ExecutionReport::builder()
            .order_id("ORD1")
            .exec_id("E1")
            .cl_ord_id("C1")
            .exec_type(exec_type)
            .ord_status(status)
            .symbol("AAPL")
            .side(Side::Sell)
            .leaves_qty(Decimal::ZERO)
            .cum_qty(Decimal::ZERO)
            .avg_px(Decimal::ZERO)
    }

    #[test]
    fn test_new_cancel_happy_path() {
        let mut t = tracker();
        t.issue_new()
            .unwrap()
            .ack_new(Some("ORD1"))
            .unwrap()
            .issue_cancel("CXL_C1")
            .unwrap()
            .ack_canceled()
            .unwrap()
            .verify(&Expectation::new(OrderState::Canceled).with_leaves_qty(Decimal::ZERO))
            .unwrap();

        assert_eq!(t.order().order_id.as_deref(), Some("ORD1"));
        let states: Vec<_> = t.history().iter().map(|h| h.state).collect();
        assert_eq!(
            states,
            [
                OrderState::PendingNew,
                OrderState::New,
                OrderState::PendingCancel,
                OrderState::Canceled
            ]
        );
    }

    #[test]
    fn test_replace_updates_qty_and_price() {
        let mut t = working();
        t.issue_replace(Amendment {
            cl_ord_id: "MOD_C1".to_string(),
            order_qty: Decimal::from(50),
            price: Some(Decimal::new(1100, 2)),
        })
        .unwrap()
        .verify(&Expectation::new(OrderState::PendingReplace).with_order_qty(Decimal::from(100)))
        .unwrap();

        t.ack_replaced()
            .unwrap()
            .verify(
                &Expectation::new(OrderState::New)
                    .with_order_qty(Decimal::from(50))
                    .with_price(Decimal::new(1100, 2)),
            )
            .unwrap();
        assert_eq!(t.order().cl_ord_id, "MOD_C1");
        assert!(t.order().pending_amendment.is_none());
    }

    #[test]
    fn test_reject_on_cancel_returns_to_new_unchanged() {
        let mut t = working();
        let before = t.order().clone();
        t.issue_cancel("CXL_C1").unwrap().ack_reject().unwrap();

        assert_eq!(t.state(), OrderState::New);
        assert_eq!(t.order().order_qty, before.order_qty);
        assert_eq!(t.order().price, before.price);
        assert_eq!(t.order().cl_ord_id, before.cl_ord_id);
        assert!(t.order().cancel_cl_ord_id.is_none());
    }

    #[test]
    fn test_reject_on_replace_keeps_terms() {
        let mut t = working();
        t.issue_replace(Amendment {
            cl_ord_id: "MOD_C1".to_string(),
            order_qty: Decimal::from(50),
            price: None,
        })
        .unwrap()
        .ack_reject()
        .unwrap()
        .verify(&Expectation::new(OrderState::New).with_order_qty(Decimal::from(100)))
        .unwrap();
        assert_eq!(t.order().cl_ord_id, "C1");
    }

    #[test]
    fn test_partial_then_full_fill() {
        let mut t = working();
        t.fill(Decimal::from(60), Decimal::TEN)
            .unwrap()
            .verify(
                &Expectation::new(OrderState::New)
                    .with_cum_qty(Decimal::from(60))
                    .with_leaves_qty(Decimal::from(40)),
            )
            .unwrap();

        t.fill(Decimal::from(40), Decimal::from(20))
            .unwrap()
            .verify(
                &Expectation::new(OrderState::Filled)
                    .with_cum_qty(Decimal::from(100))
                    .with_leaves_qty(Decimal::ZERO)
                    .with_avg_px(Decimal::from(14)),
            )
            .unwrap();

        let err = t.fill(Decimal::ONE, Decimal::TEN).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidTransition { ref state, .. } if state == "FILLED"));
    }

    #[test]
    fn test_overfill_is_unusable() {
        let mut t = working();
        let err = t.fill(Decimal::from(101), Decimal::TEN).unwrap_err();
        assert!(matches!(err, TrackerError::UnusableReport(_)));
        assert_eq!(t.state(), OrderState::New);
        assert_eq!(t.order().cum_qty, Decimal::ZERO);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut t = tracker();
        let err = t.ack_new(None).unwrap_err();
        assert_eq!(
            err,
            TrackerError::InvalidTransition {
                action: "ack New".to_string(),
                state: "UNSENT".to_string(),
            }
        );

        t.issue_new().unwrap();
        assert!(t.issue_cancel("CXL_C1").is_err());
        assert!(t.issue_new().is_err());
        assert_eq!(t.history().len(), 1);
    }

    #[test]
    fn test_verify_is_read_only() {
        let t = working();
        let before = t.clone();
        assert!(t.verify(&Expectation::new(OrderState::Filled)).is_err());
        assert_eq!(t, before);
    }

    #[test]
    fn test_apply_reports() {
        let mut t = tracker();
        t.issue_new().unwrap();
        let ack: Message = report(ExecType::New, OrdStatus::New).build().unwrap().into();
        t.apply_report(&ack).unwrap();
        assert_eq!(t.state(), OrderState::New);
        assert_eq!(t.order().order_id.as_deref(), Some("ORD1"));

        let fill: Message = report(ExecType::Fill, OrdStatus::Filled)
            .last_qty(Decimal::from(100))
            .last_px(Decimal::new(1005, 2))
            .build()
            .unwrap()
            .into();
        t.apply_report(&fill).unwrap();
        assert_eq!(t.state(), OrderState::Filled);
        assert_eq!(t.order().avg_px, Decimal::new(1005, 2));
    }

    #[test]
    fn test_apply_cancel_reject_and_replaced() {
        let mut t = working();
        t.issue_cancel("CXL_C1").unwrap();
        let cxl_reject: Message = OrderCancelReject::builder()
            .order_id("ORD1")
            .cl_ord_id("CXL_C1")
            .orig_cl_ord_id("C1")
            .ord_status(OrdStatus::New)
            .cxl_rej_response_to(CxlRejResponseTo::CancelRequest)
            .build()
            .unwrap()
            .into();
        t.apply_report(&cxl_reject).unwrap();
        assert_eq!(t.state(), OrderState::New);

        t.issue_replace(Amendment {
            cl_ord_id: "MOD_C1".to_string(),
            order_qty: Decimal::from(50),
            price: Some(Decimal::new(1100, 2)),
        })
        .unwrap();
        let replaced: Message = report(ExecType::Replaced, OrdStatus::Replaced)
            .cl_ord_id("MOD_C1")
            .order_qty(Decimal::from(50))
            .price(Decimal::new(1100, 2))
            .ord_type(OrdType::Limit)
            .build()
            .unwrap()
            .into();
        t.apply_report(&replaced).unwrap();
        assert_eq!(t.order().order_qty, Decimal::from(50));
        assert_eq!(t.order().cl_ord_id, "MOD_C1");
    }

    #[test]
    fn test_apply_unusable_messages() {
        let mut t = working();
        let heartbeat = Message::new("FIX.4.4", MsgType::Heartbeat);
        assert!(matches!(
            t.apply_report(&heartbeat),
            Err(TrackerError::UnusableReport(_))
        ));

        let fill_without_last_qty: Message =
            report(ExecType::Fill, OrdStatus::Filled).build().unwrap().into();
        assert!(t.apply_report(&fill_without_last_qty).is_err());

        let mut truncated = fill_without_last_qty.clone();
        truncated.remove(tags::EXEC_ID);
        assert!(matches!(
            t.apply_report(&truncated),
            Err(TrackerError::UnusableReport(_))
        ));
        assert_eq!(t.state(), OrderState::New);
    }
}
