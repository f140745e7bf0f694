use chrono::{DateTime, Utc};

use common::Candle;

use crate::indicators::{rolling_rsi, rolling_sma};

/// One candle of a live window together with the indicators computed at it.
/// `None` marks an indicator that is not yet available at this position.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    pub open_time: DateTime<Utc>,
    pub close: f64,
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,
    pub rsi: Option<f64>,
}

impl IndicatorRow {
    /// Both moving averages, if both are available.
    pub fn averages(&self) -> Option<(f64, f64)> {
        Some((self.sma_short?, self.sma_long?))
    }
}

/// Window sizes used to build indicator rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSpec {
    pub short_window: usize,
    pub long_window: usize,
    pub rsi_period: usize,
}

/// Run the rolling SMA and RSI passes over `candles` and zip them into rows.
pub fn build_rows(candles: &[Candle], spec: RowSpec) -> Vec<IndicatorRow> {
    let closes = common::closes(candles);
    let short = rolling_sma(&closes, spec.short_window);
    let long = rolling_sma(&closes, spec.long_window);
    let rsi = rolling_rsi(&closes, spec.rsi_period);

    candles
        .iter()
        .zip(short)
        .zip(long)
        .zip(rsi)
        .map(|(((candle, sma_short), sma_long), rsi)| IndicatorRow {
            open_time: candle.open_time,
            close: candle.close,
            sma_short,
            sma_long,
            rsi,
        })
        .collect()
}
