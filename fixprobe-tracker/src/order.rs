/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Tracked order data.

use crate::state::{OrderAction, OrderState};
use fixprobe_core::{OrdType, Side};
use rust_decimal::Decimal;

/// One applied action and the state it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry {
    /// The applied action.
    pub action: OrderAction,
    /// State after the action.
    pub state: OrderState,
}

/// Amendment sent in an OrderCancelReplaceRequest, applied on acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amendment {
    /// ClOrdID of the replace request.
    pub cl_ord_id: String,
    /// Requested OrderQty.
    pub order_qty: Decimal,
    /// Requested Price; `None` keeps the current price.
    pub price: Option<Decimal>,
}

/// An order as the test client believes it to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Current ClOrdID (11); changes when a replace is acknowledged.
    pub cl_ord_id: String,
    /// ClOrdID of the pending cancel request, if any.
    pub cancel_cl_ord_id: Option<String>,
    /// Symbol (55).
    pub symbol: String,
    /// Side (54).
    pub side: Side,
    /// OrdType (40).
    pub ord_type: OrdType,
    /// OrderQty (38).
    pub order_qty: Decimal,
    /// Price (44).
    pub price: Option<Decimal>,
    /// Exchange OrderID (37) once acknowledged.
    pub order_id: Option<String>,
    /// Current state.
    pub state: OrderState,
    /// CumQty.
    pub cum_qty: Decimal,
    /// AvgPx.
    pub avg_px: Decimal,
    /// Replace awaiting acknowledgment.
    pub pending_amendment: Option<Amendment>,
    /// Every applied action in order.
    pub history: Vec<HistoryEntry>,
}

impl Order {
    /// Creates an unsent market order.
    #[must_use]
    pub fn new(
        cl_ord_id: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        order_qty: Decimal,
    ) -> Self {
        Self {
            cl_ord_id: cl_ord_id.into(),
            cancel_cl_ord_id: None,
            symbol: symbol.into(),
            side,
            ord_type: OrdType::Market,
            order_qty,
            price: None,
            order_id: None,
            state: OrderState::Unsent,
            cum_qty: Decimal::ZERO,
            avg_px: Decimal::ZERO,
            pending_amendment: None,
            history: Vec::new(),
        }
    }

    /// Makes this a limit order at `price`.
    #[must_use]
    pub fn with_price(mut self, price: Decimal) -> Self {
        self.ord_type = OrdType::Limit;
        self.price = Some(price);
        self
    }

    /// Open quantity; zero once terminal.
    #[must_use]
    pub fn leaves_qty(&self) -> Decimal {
        if self.state.is_terminal() {
            Decimal::ZERO
        } else {
            self.order_qty - self.cum_qty
        }
    }

    pub(crate) fn record(&mut self, action: OrderAction, state: OrderState) {
        self.state = state;
        self.history.push(HistoryEntry { action, state });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_order_defaults() {
        let order = Order::new("C1", "AAPL", Side::Buy, Decimal::from(100));
        assert_eq!(order.state, OrderState::Unsent);
        assert_eq!(order.ord_type, OrdType::Market);
        assert_eq!(order.leaves_qty(), Decimal::from(100));
        assert!(order.history.is_empty());

        let limit = order.with_price(Decimal::new(10125, 2));
        assert_eq!(limit.ord_type, OrdType::Limit);
        assert_eq!(limit.price, Some(Decimal::new(10125, 2)));
    }
}
