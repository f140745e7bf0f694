use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::Context;
use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use common::journal::{PRICE_LOG, SIGNAL_LOG};
use common::Config;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber: console output filtered by `RUST_LOG`
/// (default `info`), plus the price and signal journals when `journals` is
/// given.
pub fn init(journals: Option<&Config>) -> anyhow::Result<()> {
    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let mut layers: Vec<BoxedLayer> = vec![fmt::layer().with_filter(console_filter).boxed()];

    if let Some(cfg) = journals {
        layers.push(journal(&cfg.price_log_path, PRICE_LOG)?);
        layers.push(journal(&cfg.signal_log_path, SIGNAL_LOG)?);
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context("failed to install tracing subscriber")
}

/// Append-only, timestamped text file receiving only `target` events.
fn journal(path: &str, target: &'static str) -> anyhow::Result<BoxedLayer> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open journal '{path}'"))?;

    Ok(fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_filter(Targets::new().with_target(target, Level::INFO))
        .boxed())
}
