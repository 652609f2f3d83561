/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Common utilities shared across examples.
//!
//! Settings are read from `FIX_*` environment variables:
//!
//! | Variable | Used by | Default |
//! |---|---|---|
//! | `FIX_HOST`, `FIX_PORT` | all | `127.0.0.1`, `9878` |
//! | `FIX_SENDER`, `FIX_TARGET` | all | per example |
//! | `FIX_HEARTBEAT` | all | `30` seconds |
//! | `FIX_AUTO_FILL`, `FIX_REJECT` | exchange_server | off |
//! | `FIX_CONFIG` | stress_client | JSON `StressConfig` file, overridden by the variables below |
//! | `FIX_WORKERS`, `FIX_MESSAGES`, `FIX_RATE` | stress_client | `8`, `1000`, `100` |
//! | `FIX_SYMBOL`, `FIX_SIDE`, `FIX_QTY`, `FIX_PRICE` | stress_client, order_lifecycle | `AAPL`, `1`, `100`, none |
//! | `FIX_MEASURE_LATENCY`, `FIX_SAMPLE_EVERY`, `FIX_ACK_TIMEOUT` | stress_client | off, `1`, `5` seconds |
//! | `FIX_GRACE`, `FIX_SCHEDULING`, `FIX_TAG` | stress_client | `5` seconds, `parallel`, none |

use anyhow::{Context, anyhow};
use fixprobe::core::{CompId, Side};
use fixprobe::engine::ServerConfig;
use fixprobe::session::SessionConfig;
use fixprobe::simulator::SimulatorConfig;
use fixprobe::stress::{Scheduling, StressConfig};
use fixprobe::tagvalue::DEFAULT_BEGIN_STRING;
use rust_decimal::Decimal;
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

/// Default server port.
pub const DEFAULT_PORT: u16 = 9878;

/// Default server host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Initializes logging for examples.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init();
}

/// Returns `FIX_HOST:FIX_PORT`.
///
/// # Errors
/// Returns an error if `FIX_PORT` is not a port number.
pub fn endpoint() -> anyhow::Result<String> {
    let host = var("FIX_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = parsed("FIX_PORT")?.unwrap_or(DEFAULT_PORT);
    Ok(format!("{host}:{port}"))
}

/// Acceptor and simulator settings for the exchange server.
///
/// # Errors
/// Returns an error if a variable holds an invalid value.
pub fn exchange_config() -> anyhow::Result<(ServerConfig, SimulatorConfig)> {
    let comp_id = comp_id("FIX_SENDER", "EXCH")?;
    let mut server = ServerConfig::new(endpoint()?, comp_id).with_heartbeat_interval(heartbeat()?);
    if let Some(client) = var("FIX_TARGET") {
        server = server.with_expected_client(
            CompId::new(&client).ok_or_else(|| anyhow!("FIX_TARGET={client:?} is not a CompID"))?,
        );
    }

    let mut simulator = SimulatorConfig::new()
        .with_auto_fill(flag("FIX_AUTO_FILL")?)
        .with_reject_new_orders(flag("FIX_REJECT")?);
    if let Some(text) = var("FIX_REJECT_TEXT") {
        simulator = simulator.with_reject_text(text);
    }
    Ok((server, simulator))
}

/// Initiator session settings.
///
/// # Errors
/// Returns an error if a variable holds an invalid value.
pub fn client_session(default_sender: &str) -> anyhow::Result<SessionConfig> {
    let session = SessionConfig::new(
        comp_id("FIX_SENDER", default_sender)?,
        comp_id("FIX_TARGET", "EXCH")?,
        DEFAULT_BEGIN_STRING,
    )
    .with_heartbeat_interval(heartbeat()?);
    session.validate()?;
    Ok(session)
}

/// Order terms shared by the client examples.
///
/// # Errors
/// Returns an error if a variable holds an invalid value.
pub fn order_terms() -> anyhow::Result<(String, Side, Decimal, Option<Decimal>)> {
    let symbol = var("FIX_SYMBOL").unwrap_or_else(|| "AAPL".to_string());
    let side = parsed("FIX_SIDE")?.unwrap_or(Side::Buy);
    let qty = parsed("FIX_QTY")?.unwrap_or(Decimal::ONE_HUNDRED);
    let price = parsed("FIX_PRICE")?;
    Ok((symbol, side, qty, price))
}

/// Stress run settings: `FIX_CONFIG` if set, then individual variables.
///
/// # Errors
/// Returns an error if the file cannot be read, a variable holds an
/// invalid value or the result fails validation.
pub fn stress_config() -> anyhow::Result<StressConfig> {
    let mut config = match var("FIX_CONFIG") {
        Some(path) => {
            let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?
        }
        None => StressConfig::default(),
    };

    if var("FIX_HOST").is_some() || var("FIX_PORT").is_some() || var("FIX_CONFIG").is_none() {
        config.endpoint = endpoint()?;
    }
    if let Some(sender) = var("FIX_SENDER") {
        config.sender_comp_id = sender;
    }
    if let Some(target) = var("FIX_TARGET") {
        config.target_comp_id = target;
    }
    if let Some(workers) = parsed("FIX_WORKERS")? {
        config.workers = workers;
    }
    if let Some(messages) = parsed("FIX_MESSAGES")? {
        config.messages_per_worker = messages;
    }
    if let Some(rate) = parsed("FIX_RATE")? {
        config.rate_per_worker = rate;
    }
    if let Some(symbol) = var("FIX_SYMBOL") {
        config.symbol = symbol;
    }
    if let Some(side) = parsed("FIX_SIDE")? {
        config.side = side;
    }
    if let Some(qty) = parsed("FIX_QTY")? {
        config.qty = qty;
    }
    if let Some(price) = parsed("FIX_PRICE")? {
        config.price = Some(price);
    }
    if var("FIX_HEARTBEAT").is_some() {
        config = config.with_heartbeat_interval(heartbeat()?);
    }
    if var("FIX_MEASURE_LATENCY").is_some() {
        config.measure_latency = flag("FIX_MEASURE_LATENCY")?;
    }
    if let Some(every) = parsed("FIX_SAMPLE_EVERY")? {
        config.sample_every = every;
    }
    if let Some(secs) = parsed::<f64>("FIX_ACK_TIMEOUT")? {
        config = config.with_ack_timeout(seconds("FIX_ACK_TIMEOUT", secs)?);
    }
    if let Some(secs) = parsed::<f64>("FIX_GRACE")? {
        config = config.with_grace_period(seconds("FIX_GRACE", secs)?);
    }
    if let Some(scheduling) = var("FIX_SCHEDULING") {
        config.scheduling = match scheduling.to_ascii_lowercase().as_str() {
            "parallel" => Scheduling::Parallel,
            "cooperative" => Scheduling::Cooperative,
            other => return Err(anyhow!("FIX_SCHEDULING={other:?} is not parallel or cooperative")),
        };
    }
    if let Some(tag) = var("FIX_TAG") {
        config.tag = Some(tag);
    }

    config.validate()?;
    Ok(config)
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn parsed<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    var(name)
        .map(|v| v.parse().map_err(|e| anyhow!("{name}={v:?}: {e}")))
        .transpose()
}

fn flag(name: &str) -> anyhow::Result<bool> {
    match var(name).as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("0" | "false" | "no" | "off") => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some(other) => Err(anyhow!("{name}={other:?} is not a boolean")),
    }
}

fn comp_id(name: &str, default: &str) -> anyhow::Result<CompId> {
    let value = var(name).unwrap_or_else(|| default.to_string());
    CompId::new(&value).ok_or_else(|| anyhow!("{name}={value:?} is not a CompID"))
}

fn heartbeat() -> anyhow::Result<Duration> {
    Ok(Duration::from_secs(parsed("FIX_HEARTBEAT")?.unwrap_or(30)))
}

fn seconds(name: &str, secs: f64) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|e| anyhow!("{name}={secs}: {e}"))
}
