//! Stress client
//!
//! Drives `FIX_WORKERS` concurrent sessions against an acceptor and prints
//! the JSON report on stdout. Exits non-zero if any worker failed to log on.

use fixprobe::engine::CancellationToken;
use fixprobe::stress::StressDriver;
use fixprobe_example::{init_logging, stress_config};
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    init_logging();
    let config = stress_config()?;
    let driver = StressDriver::new(config)?;
    let runtime = driver.runtime()?;

    let cancel = CancellationToken::new();
    let report = runtime.block_on(async {
        let on_signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, stopping sends");
                on_signal.cancel();
            }
        });
        driver.run(cancel).await
    })?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.all_logged_on() {
        error!(
            logon_failures = report.logon_failures,
            workers = report.workers,
            "some workers never logged on"
        );
        anyhow::bail!("{} of {} workers failed to log on", report.logon_failures, report.workers);
    }
    Ok(())
}
