use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use common::{is_valid_interval, AccountingMode, Error, Result};

/// Top-level strategy config file (TOML). Every field has a default, so an
/// empty file is valid.
///
/// Example `config/strategy.toml`:
/// ```toml
/// symbol = "BTCUSDT"
/// interval = "15m"
///
/// [backtest]
/// history = 10000
/// short_window = 15
/// long_window = 55
/// initial_balance = 10000.0
/// leverage = 1.0
/// accounting = "legacy"
///
/// [live]
/// window = 500
/// short_window = 10
/// long_window = 50
/// rsi_period = 14
/// overbought = 70.0
/// oversold = 30.0
/// poll_interval_ms = 1500
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StrategyFileConfig {
    /// Trading pair, e.g. "BTCUSDT".
    pub symbol: String,
    /// Kline interval in exchange notation, e.g. "15m".
    pub interval: String,
    pub backtest: BacktestConfig,
    pub live: LiveConfig,
}

impl Default for StrategyFileConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            interval: "15m".to_string(),
            backtest: BacktestConfig::default(),
            live: LiveConfig::default(),
        }
    }
}

/// EMA crossover backtest parameters.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Number of candles to replay.
    pub history: usize,
    pub short_window: usize,
    pub long_window: usize,
    pub initial_balance: f64,
    pub leverage: f64,
    pub accounting: AccountingMode,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            history: 10_000,
            short_window: 15,
            long_window: 55,
            initial_balance: 10_000.0,
            leverage: 1.0,
            accounting: AccountingMode::Legacy,
        }
    }
}

/// SMA crossover + RSI filter parameters for the live monitor.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Number of most recent candles fetched each cycle.
    pub window: usize,
    pub short_window: usize,
    pub long_window: usize,
    pub rsi_period: usize,
    /// Buys are suppressed at or above this RSI.
    pub overbought: f64,
    /// Sells are suppressed at or below this RSI.
    pub oversold: f64,
    pub poll_interval_ms: u64,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            window: 500,
            short_window: 10,
            long_window: 50,
            rsi_period: 14,
            overbought: 70.0,
            oversold: 30.0,
            poll_interval_ms: 1_500,
        }
    }
}

impl StrategyFileConfig {
    /// Load from a TOML file. A missing file yields the defaults; a file that
    /// exists but does not parse is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "Strategy config not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reject parameter combinations the engines cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(Error::Config("symbol must not be empty".into()));
        }
        if !is_valid_interval(&self.interval) {
            return Err(Error::Config(format!("unknown kline interval '{}'", self.interval)));
        }
        self.backtest.validate()?;
        self.live.validate()
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.short_window == 0 || self.long_window == 0 {
            return Err(Error::Config("backtest windows must be at least 1".into()));
        }
        if !(self.leverage.is_finite() && self.leverage > 0.0) {
            return Err(Error::Config(format!(
                "leverage must be positive, got {}",
                self.leverage
            )));
        }
        if !(self.initial_balance.is_finite() && self.initial_balance > 0.0) {
            return Err(Error::Config(format!(
                "initial balance must be positive, got {}",
                self.initial_balance
            )));
        }
        Ok(())
    }
}

impl LiveConfig {
    pub fn validate(&self) -> Result<()> {
        if self.short_window == 0 || self.long_window == 0 || self.rsi_period == 0 {
            return Err(Error::Config("live windows and RSI period must be at least 1".into()));
        }
        if self.window < 2 {
            return Err(Error::Config("live window must hold at least 2 candles".into()));
        }
        if self.oversold >= self.overbought {
            return Err(Error::Config(format!(
                "oversold ({}) must be below overbought ({})",
                self.oversold, self.overbought
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll interval must be positive".into()));
        }
        Ok(())
    }
}
