/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Simulated order book.
//!
//! Orders are keyed by the OrderID the simulator assigns. A secondary index
//! maps `(connection, ClOrdID)` to the OrderID so cancel and replace
//! requests that only carry OrigClOrdID can find their order.

use fixprobe_core::{OrdStatus, OrdType, Side};
use fixprobe_engine::Connection;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// An order resting in the simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedOrder {
    /// Exchange-assigned OrderID (37).
    pub order_id: String,
    /// Current ClOrdID (11); changes on replace.
    pub cl_ord_id: String,
    /// Symbol (55).
    pub symbol: String,
    /// Side (54).
    pub side: Side,
    /// OrdType (40).
    pub ord_type: OrdType,
    /// OrderQty (38).
    pub order_qty: Decimal,
    /// Price (44), absent for market orders.
    pub price: Option<Decimal>,
    /// CumQty (14).
    pub cum_qty: Decimal,
    /// AvgPx (6).
    pub avg_px: Decimal,
    /// OrdStatus (39).
    pub status: OrdStatus,
}

impl SimulatedOrder {
    /// Open quantity.
    #[must_use]
    pub fn leaves_qty(&self) -> Decimal {
        if self.status.is_terminal() {
            Decimal::ZERO
        } else {
            self.order_qty - self.cum_qty
        }
    }

    /// Returns true while the order can still be cancelled, replaced or filled.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Applies an execution of `qty` at `px`, updating CumQty, AvgPx and status.
    pub(crate) fn execute(&mut self, qty: Decimal, px: Decimal) {
        let filled = self.cum_qty + qty;
        self.avg_px = if self.cum_qty.is_zero() {
            px
        } else {
            (self.avg_px * self.cum_qty + px * qty) / filled
        };
        self.cum_qty = filled;
        self.status = if filled >= self.order_qty {
            OrdStatus::Filled
        } else {
            OrdStatus::PartiallyFilled
        };
    }
}

pub(crate) struct BookEntry {
    pub(crate) order: SimulatedOrder,
    pub(crate) owner: Connection,
}

/// Counters behind OrderID and ExecID.
#[derive(Debug, Default)]
pub(crate) struct IdSequence {
    order: u64,
    exec: u64,
}

impl IdSequence {
    pub(crate) fn next_order_id(&mut self) -> String {
        self.order += 1;
        format!("ORD{:08}", self.order)
    }

    pub(crate) fn next_exec_id(&mut self) -> String {
        self.exec += 1;
        format!("EXEC{:08}", self.exec)
    }
}

#[derive(Default)]
pub(crate) struct OrderBook {
    orders: HashMap<String, BookEntry>,
    by_cl_ord_id: HashMap<(u64, String), String>,
}

impl OrderBook {
    pub(crate) fn insert(&mut self, order: SimulatedOrder, owner: Connection) {
        self.by_cl_ord_id
            .insert((owner.id(), order.cl_ord_id.clone()), order.order_id.clone());
        self.orders
            .insert(order.order_id.clone(), BookEntry { order, owner });
    }

    /// Returns true if `cl_ord_id` names an open order of this connection.
    pub(crate) fn has_open(&self, conn_id: u64, cl_ord_id: &str) -> bool {
        self.by_cl_ord_id
            .get(&(conn_id, cl_ord_id.to_string()))
            .and_then(|id| self.orders.get(id))
            .is_some_and(|e| e.order.is_open())
    }

    /// Finds an order by OrderID when given, else by the connection's ClOrdID.
    pub(crate) fn find_mut(
        &mut self,
        conn_id: u64,
        order_id: Option<&str>,
        orig_cl_ord_id: &str,
    ) -> Option<&mut SimulatedOrder> {
        let key = match order_id.filter(|id| self.orders.contains_key(*id)) {
            Some(id) => id.to_string(),
            None => self
                .by_cl_ord_id
                .get(&(conn_id, orig_cl_ord_id.to_string()))?
                .clone(),
        };
        self.orders
            .get_mut(&key)
            .filter(|e| e.owner.id() == conn_id)
            .map(|e| &mut e.order)
    }

    pub(crate) fn entry_mut(&mut self, order_id: &str) -> Option<&mut BookEntry> {
        self.orders.get_mut(order_id)
    }

    pub(crate) fn get(&self, order_id: &str) -> Option<&SimulatedOrder> {
        self.orders.get(order_id).map(|e| &e.order)
    }

    pub(crate) fn open_count(&self) -> usize {
        self.orders.values().filter(|e| e.order.is_open()).count()
    }

    /// Indexes the order under a new ClOrdID after a replace.
    pub(crate) fn rekey(&mut self, conn_id: u64, order_id: &str, new_cl_ord_id: &str) {
        self.by_cl_ord_id
            .insert((conn_id, new_cl_ord_id.to_string()), order_id.to_string());
    }

    /// Drops every order owned by `conn_id`, returning how many were removed.
    pub(crate) fn remove_connection(&mut self, conn_id: u64) -> usize {
        let before = self.orders.len();
        self.orders.retain(|_, e| e.owner.id() != conn_id);
        self.by_cl_ord_id.retain(|(id, _), _| *id != conn_id);
        before - self.orders.len()
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(qty: i64) -> SimulatedOrder {
        SimulatedOrder {
            order_id: "ORD00000001".to_string(),
            cl_ord_id: "C1".to_string(),
            symbol: "AAPL".to_string(),
            side: Side::Buy,
            ord_type: OrdType::Limit,
            order_qty: Decimal::from(qty),
            price: Some(Decimal::new(10050, 2)),
            cum_qty: Decimal::ZERO,
            avg_px: Decimal::ZERO,
            status: OrdStatus::New,
        }
    }

    #[test]
    fn test_ids_are_sequential_and_padded() {
        let mut ids = IdSequence::default();
        assert_eq!(ids.next_order_id(), "ORD00000001");
        assert_eq!(ids.next_order_id(), "ORD00000002");
        assert_eq!(ids.next_exec_id(), "EXEC00000001");
    }

    #[test]
    fn test_execute_tracks_average_price() {
        let mut o = order(100);
        o.execute(Decimal::from(40), Decimal::from(10));
        assert_eq!(o.status, OrdStatus::PartiallyFilled);
        assert_eq!(o.leaves_qty(), Decimal::from(60));

        o.execute(Decimal::from(60), Decimal::from(20));
        assert_eq!(o.status, OrdStatus::Filled);
        assert_eq!(o.cum_qty, Decimal::from(100));
        assert_eq!(o.avg_px, Decimal::from(16));
        assert_eq!(o.leaves_qty(), Decimal::ZERO);
        assert!(!o.is_open());
    }

    #[test]
    fn test_terminal_order_has_no_leaves() {
        let mut o = order(100);
        o.status = OrdStatus::Canceled;
        assert_eq!(o.leaves_qty(), Decimal::ZERO);
    }
}
