use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV candle as returned by the exchange, oldest-first in a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    /// Latest trade price while the candle is still forming.
    pub close: f64,
    pub volume: f64,
    pub close_time: DateTime<Utc>,
}

impl Candle {
    /// Candle with only open/close populated; high/low span the body.
    pub fn from_open_close(open_time: DateTime<Utc>, open: f64, close: f64) -> Self {
        Self {
            open_time,
            open,
            high: open.max(close),
            low: open.min(close),
            close,
            volume: 0.0,
            close_time: open_time,
        }
    }
}

/// Close prices of a candle series, in order.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// Direction of a simulated position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

impl std::fmt::Display for PositionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionSide::Long => write!(f, "LONG"),
            PositionSide::Short => write!(f, "SHORT"),
        }
    }
}

/// Side of a live trade signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalSide {
    Buy,
    Sell,
}

impl std::fmt::Display for SignalSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalSide::Buy => write!(f, "BUY"),
            SignalSide::Sell => write!(f, "SELL"),
        }
    }
}

/// How the backtester books capital when positions open and close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountingMode {
    /// Long entries zero the balance while short entries subtract the
    /// notional, and every exit restores `entry × size + profit`. With
    /// leverage above 1 this returns leveraged principal on exit.
    #[default]
    Legacy,
    /// Both sides lock the balance as margin and return `margin + profit`.
    Margin,
}

impl std::fmt::Display for AccountingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountingMode::Legacy => write!(f, "legacy"),
            AccountingMode::Margin => write!(f, "margin"),
        }
    }
}

impl std::str::FromStr for AccountingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "legacy" => Ok(AccountingMode::Legacy),
            "margin" => Ok(AccountingMode::Margin),
            other => Err(format!("accounting mode must be 'legacy' or 'margin', got '{other}'")),
        }
    }
}

/// Kline intervals accepted by the exchange.
pub const INTERVALS: &[&str] = &[
    "1s", "1m", "3m", "5m", "15m", "30m", "1h", "2h", "4h", "6h", "8h", "12h", "1d", "3d", "1w",
    "1M",
];

pub fn is_valid_interval(interval: &str) -> bool {
    INTERVALS.contains(&interval)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_validation_is_case_sensitive() {
        assert!(is_valid_interval("15m"));
        assert!(is_valid_interval("1M"));
        assert!(!is_valid_interval("15M"));
        assert!(!is_valid_interval("7m"));
    }

    #[test]
    fn accounting_mode_parses_and_displays() {
        assert_eq!("Margin".parse::<AccountingMode>().unwrap(), AccountingMode::Margin);
        assert_eq!(AccountingMode::default().to_string(), "legacy");
        assert!("fifo".parse::<AccountingMode>().is_err());
    }
}
