//! Order lifecycle walkthrough
//!
//! Logs on to an acceptor (for instance `exchange_server`), then drives one
//! order through New, Replace and Cancel, verifying the tracked state after
//! every acknowledgment.

use fixprobe::engine::{ClientConfig, FixClient};
use fixprobe::tracker::{Expectation, Order, OrderState, TrackedOrder};
use fixprobe_example::{client_session, endpoint, init_logging, order_terms};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let addr = endpoint()?;
    let session = client_session("TRADER")?;
    let logon_timeout = session.logon_timeout;
    info!(%addr, session = %session.session_id(), "connecting");

    let client = FixClient::connect(ClientConfig::new(addr, session)).await?;
    client.logon(logon_timeout).await?;

    let (symbol, side, qty, price) = order_terms()?;
    let price = price.unwrap_or(Decimal::new(10050, 2));
    let cl_ord_id = format!("LIFECYCLE-{}", std::process::id());
    let mut order = TrackedOrder::new(
        client.clone(),
        Order::new(cl_ord_id, symbol, side, qty).with_price(price),
    )
    .with_timeout(Duration::from_secs(5));

    let half = qty / Decimal::TWO;
    order
        .submit()
        .await?
        .await_ack()
        .await?
        .verify(&Expectation::new(OrderState::New).with_leaves_qty(qty))?
        .replace(half, Some(price))
        .await?
        .await_replaced()
        .await?
        .verify(&Expectation::new(OrderState::New).with_order_qty(half))?
        .cancel()
        .await?
        .await_canceled()
        .await?
        .verify(&Expectation::new(OrderState::Canceled))?;

    for entry in order.tracker().history() {
        info!(action = %entry.action, state = %entry.state, "history");
    }
    client.logout().await?;
    Ok(())
}
