/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Errors raised by operations driven from outside a session.

use fixprobe_core::{BuildError, OrdStatus, SessionError};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors returned by [`ExchangeSimulator::fill`](crate::ExchangeSimulator::fill).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimulatorError {
    /// No order with this OrderID is in the book.
    #[error("unknown order {0}")]
    UnknownOrder(String),

    /// The order is in a terminal state.
    #[error("order {order_id} is closed with status {status}")]
    OrderClosed {
        /// The order.
        order_id: String,
        /// Its terminal status.
        status: OrdStatus,
    },

    /// The fill quantity is not positive or exceeds the open quantity.
    #[error("invalid fill quantity {qty} for order {order_id} with {leaves} open")]
    InvalidFillQty {
        /// The order.
        order_id: String,
        /// Requested fill quantity.
        qty: Decimal,
        /// Open quantity at the time of the request.
        leaves: Decimal,
    },

    /// The report could not be built.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// The owning connection refused the report.
    #[error(transparent)]
    Session(#[from] SessionError),
}
