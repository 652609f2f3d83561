//! Simulated exchange
//!
//! Accepts FIX sessions and answers orders with the deterministic simulator.
//! Stop with Ctrl-C.

use fixprobe::engine::{CancellationToken, FixServer};
use fixprobe::simulator::ExchangeSimulator;
use fixprobe_example::{exchange_config, init_logging};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let (server_config, simulator_config) = exchange_config()?;
    info!(
        addr = %server_config.bind_addr,
        comp_id = %server_config.comp_id,
        auto_fill = simulator_config.auto_fill,
        reject = simulator_config.reject_new_orders,
        "starting simulated exchange"
    );

    let simulator = Arc::new(ExchangeSimulator::new(simulator_config));
    let server = FixServer::bind(server_config, Arc::clone(&simulator)).await?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
        }
        on_signal.cancel();
    });

    server.serve(cancel).await?;
    info!(open_orders = simulator.open_orders(), "exchange stopped");
    Ok(())
}
