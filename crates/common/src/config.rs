use crate::{Error, Result};

const DEFAULT_BINANCE_BASE_URL: &str = "https://api.binance.com";

/// Infrastructure settings loaded from environment variables at startup.
/// Every variable is optional; malformed values are rejected.
#[derive(Debug, Clone)]
pub struct Config {
    // Strategy config file path
    pub strategy_config_path: String,

    // Exchange
    pub binance_base_url: String,

    // Journals
    pub price_log_path: String,
    pub signal_log_path: String,

    // Telegram
    pub telegram_token: Option<String>,
    pub telegram_chat_ids: Vec<i64>,

    // Local alerts, e.g. `notify-send "Crypto Trading Signal" {message}`
    pub notify_command: Option<String>,
    pub sound_command: Option<String>,
    pub alert_timeout_secs: u64,
}

impl Config {
    /// Load configuration from the environment, reading `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let telegram_chat_ids = match optional_env("TELEGRAM_CHAT_IDS") {
            Some(raw) => parse_chat_ids(&raw)?,
            None => Vec::new(),
        };

        let alert_timeout_secs = match optional_env("ALERT_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                Error::Config(format!("ALERT_TIMEOUT_SECS must be a whole number, got '{raw}'"))
            })?,
            None => 10,
        };

        Ok(Config {
            strategy_config_path: optional_env("STRATEGY_CONFIG_PATH")
                .unwrap_or_else(|| "config/strategy.toml".to_string()),
            binance_base_url: optional_env("BINANCE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BINANCE_BASE_URL.to_string()),
            price_log_path: optional_env("PRICE_LOG_PATH")
                .unwrap_or_else(|| "price_indicator_log.txt".to_string()),
            signal_log_path: optional_env("SIGNAL_LOG_PATH")
                .unwrap_or_else(|| "trade_signal_log.txt".to_string()),
            telegram_token: optional_env("TELEGRAM_TOKEN"),
            telegram_chat_ids,
            notify_command: optional_env("NOTIFY_COMMAND"),
            sound_command: optional_env("SOUND_COMMAND"),
            alert_timeout_secs,
        })
    }
}

/// Parse a comma-separated list of Telegram chat ids.
pub fn parse_chat_ids(raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>().map_err(|_| {
                Error::Config(format!("TELEGRAM_CHAT_IDS contains non-numeric ID: '{s}'"))
            })
        })
        .collect()
}

/// Treats empty values as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
