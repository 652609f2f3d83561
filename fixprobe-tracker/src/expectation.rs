/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Expected order attributes for verification.

use crate::order::Order;
use crate::state::OrderState;
use fixprobe_core::TrackerError;
use rust_decimal::Decimal;

/// What a test expects a tracked order to look like.
///
/// The state is always compared; the numeric attributes only when set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    /// Expected state.
    pub state: OrderState,
    /// Expected OrderQty.
    pub order_qty: Option<Decimal>,
    /// Expected Price.
    pub price: Option<Decimal>,
    /// Expected CumQty.
    pub cum_qty: Option<Decimal>,
    /// Expected LeavesQty.
    pub leaves_qty: Option<Decimal>,
    /// Expected AvgPx.
    pub avg_px: Option<Decimal>,
}

impl Expectation {
    /// Expects `state` and nothing else.
    #[must_use]
    pub const fn new(state: OrderState) -> Self {
        Self {
            state,
            order_qty: None,
            price: None,
            cum_qty: None,
            leaves_qty: None,
            avg_px: None,
        }
    }

    /// Also expects OrderQty.
    #[must_use]
    pub const fn with_order_qty(mut self, qty: Decimal) -> Self {
        self.order_qty = Some(qty);
        self
    }

    /// Also expects Price.
    #[must_use]
    pub const fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    /// Also expects CumQty.
    #[must_use]
    pub const fn with_cum_qty(mut self, qty: Decimal) -> Self {
        self.cum_qty = Some(qty);
        self
    }

    /// Also expects LeavesQty.
    #[must_use]
    pub const fn with_leaves_qty(mut self, qty: Decimal) -> Self {
        self.leaves_qty = Some(qty);
        self
    }

    /// Also expects AvgPx.
    #[must_use]
    pub const fn with_avg_px(mut self, px: Decimal) -> Self {
        self.avg_px = Some(px);
        self
    }

    /// Compares the expectation against `order`.
    ///
    /// # Errors
    /// Returns `TrackerError::VerificationFailed` for the first attribute
    /// that differs.
    pub fn check(&self, order: &Order) -> Result<(), TrackerError> {
        if self.state != order.state {
            return Err(mismatch("state", self.state, order.state));
        }
        let numeric = [
            ("order_qty", self.order_qty, Some(order.order_qty)),
            ("price", self.price, order.price),
            ("cum_qty", self.cum_qty, Some(order.cum_qty)),
            ("leaves_qty", self.leaves_qty, Some(order.leaves_qty())),
            ("avg_px", self.avg_px, Some(order.avg_px)),
        ];
        for (field, expected, actual) in numeric {
            let Some(expected) = expected else { continue };
            if actual != Some(expected) {
                return Err(mismatch(field, expected, display_opt(actual)));
            }
        }
        Ok(())
    }
}

fn mismatch(
    field: &'static str,
    expected: impl ToString,
    actual: impl ToString,
) -> TrackerError {
    TrackerError::VerificationFailed {
        field,
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

fn display_opt(value: Option<Decimal>) -> String {
    value.map_or_else(|| "none".to_string(), |v| v.to_string())
}
