use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use common::journal::{PRICE_LOG, SIGNAL_LOG};
use common::{MarketData, Result};
use strategy::{build_rows, IndicatorRow, SignalEngine, SignalEvent, StrategyFileConfig};

use crate::alert::AlertDispatcher;

/// Result of a single poll cycle.
#[derive(Debug, Default)]
pub struct PollOutcome {
    /// Indicator row of the most recent candle.
    pub latest: Option<IndicatorRow>,
    pub signal: Option<SignalEvent>,
    /// Detached notification tasks spawned for `signal`.
    pub deliveries: Vec<JoinHandle<()>>,
}

/// Polls recent candles on a fixed interval and raises crossover alerts.
pub struct LiveMonitor {
    source: Arc<dyn MarketData>,
    signals: SignalEngine,
    alerts: AlertDispatcher,
    interval: String,
    window: usize,
    poll_interval: Duration,
}

impl LiveMonitor {
    pub fn new(source: Arc<dyn MarketData>, cfg: &StrategyFileConfig, alerts: AlertDispatcher) -> Self {
        Self {
            source,
            signals: SignalEngine::new(cfg.symbol.clone(), &cfg.live),
            alerts,
            interval: cfg.interval.clone(),
            window: cfg.live.window,
            poll_interval: Duration::from_millis(cfg.live.poll_interval_ms),
        }
    }

    pub fn signals(&self) -> &SignalEngine {
        &self.signals
    }

    /// Fetch, compute, log the snapshot and emit at most one signal.
    pub async fn poll_once(&mut self) -> Result<PollOutcome> {
        let symbol = self.signals.symbol().to_string();
        let candles = self
            .source
            .fetch_candles(&symbol, &self.interval, self.window)
            .await?;
        info!(target: PRICE_LOG, symbol = %symbol, candles = candles.len(), "Fetched price data.");

        let spec = self.signals.row_spec();
        let rows = build_rows(&candles, spec);
        info!(target: PRICE_LOG, "Calculated indicators (SMA, LMA, RSI).");

        let Some(latest) = rows.last().cloned() else {
            warn!(symbol = %symbol, "No candles returned, skipping cycle");
            return Ok(PollOutcome::default());
        };

        info!(target: PRICE_LOG, "Current {symbol} Price: ${:.2}", latest.close);
        info!(
            target: PRICE_LOG,
            "SMA ({}): {}, LMA ({}): {}, RSI ({}): {}",
            spec.short_window,
            fmt_price(latest.sma_short),
            spec.long_window,
            fmt_price(latest.sma_long),
            spec.rsi_period,
            fmt_value(latest.rsi),
        );

        let signal = self.signals.evaluate(&rows);
        let deliveries = match &signal {
            Some(event) => self.emit(event),
            None => Vec::new(),
        };

        Ok(PollOutcome {
            latest: Some(latest),
            signal,
            deliveries,
        })
    }

    fn emit(&self, event: &SignalEvent) -> Vec<JoinHandle<()>> {
        let message = event.message();
        let deliveries = self.alerts.dispatch(&message);
        info!(target: SIGNAL_LOG, "Notification sent: {message}");
        info!(target: SIGNAL_LOG, side = %event.side, price = event.price, "{message}");
        deliveries
    }

    /// Poll until the task is dropped. A failed cycle is logged and retried
    /// on the next tick.
    pub async fn run(mut self) {
        info!(
            symbol = %self.signals.symbol(),
            interval = %self.interval,
            window = self.window,
            poll = ?self.poll_interval,
            alert_channels = self.alerts.len(),
            "Live monitor running"
        );
        loop {
            if let Err(e) = self.poll_once().await {
                warn!(symbol = %self.signals.symbol(), error = %e, "Poll cycle failed, retrying next interval");
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

fn fmt_price(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("${v:.2}"))
}

fn fmt_value(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}
