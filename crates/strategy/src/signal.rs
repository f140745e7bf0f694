use tracing::debug;

use common::SignalSide;

use crate::config::LiveConfig;
use crate::rows::{IndicatorRow, RowSpec};

/// RSI filter applied to crossover edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsiFilter {
    pub overbought: f64,
    pub oversold: f64,
}

/// Raw edge detected between the last two rows, before alternation gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Crossover {
    pub buy: bool,
    pub sell: bool,
}

/// A signal that passed the alternation gate.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalEvent {
    pub side: SignalSide,
    pub symbol: String,
    pub price: f64,
}

impl SignalEvent {
    pub fn message(&self) -> String {
        format!("{} SIGNAL for {} at ${:.2}", self.side, self.symbol, self.price)
    }
}

/// Detect a crossover edge between the last two rows that carry both moving
/// averages. Fewer than two such rows yields no edge. A missing RSI fails
/// the filter.
pub fn detect_crossover(rows: &[IndicatorRow], filter: RsiFilter) -> Crossover {
    let mut valid = rows.iter().rev().filter_map(|r| r.averages().map(|a| (a, r.rsi)));
    let (Some(((short_now, long_now), rsi)), Some(((short_prev, long_prev), _))) =
        (valid.next(), valid.next())
    else {
        return Crossover::default();
    };

    let buy = short_prev < long_prev
        && short_now > long_now
        && rsi.is_some_and(|r| r < filter.overbought);
    let sell = short_prev > long_prev
        && short_now < long_now
        && rsi.is_some_and(|r| r > filter.oversold);

    Crossover { buy, sell }
}

/// SMA crossover signal generator with RSI filter and buy/sell alternation.
///
/// Owns the last emitted side so that a repeated condition on the same side
/// never re-notifies. The memory starts empty and is never reset.
#[derive(Debug, Clone)]
pub struct SignalEngine {
    symbol: String,
    spec: RowSpec,
    filter: RsiFilter,
    last_trade: Option<SignalSide>,
}

impl SignalEngine {
    pub fn new(symbol: impl Into<String>, cfg: &LiveConfig) -> Self {
        Self {
            symbol: symbol.into(),
            spec: RowSpec {
                short_window: cfg.short_window,
                long_window: cfg.long_window,
                rsi_period: cfg.rsi_period,
            },
            filter: RsiFilter {
                overbought: cfg.overbought,
                oversold: cfg.oversold,
            },
            last_trade: None,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn row_spec(&self) -> RowSpec {
        self.spec
    }

    pub fn last_trade(&self) -> Option<SignalSide> {
        self.last_trade
    }

    /// Evaluate one poll cycle's rows. Returns the signal to emit, if any,
    /// and records it as the last trade.
    pub fn evaluate(&mut self, rows: &[IndicatorRow]) -> Option<SignalEvent> {
        let edge = detect_crossover(rows, self.filter);
        let side = self.gate(edge)?;
        let price = rows.last()?.close;

        self.last_trade = Some(side);
        debug!(symbol = %self.symbol, side = %side, price, "Signal passed alternation gate");
        Some(SignalEvent {
            side,
            symbol: self.symbol.clone(),
            price,
        })
    }

    fn gate(&self, edge: Crossover) -> Option<SignalSide> {
        if edge.buy && self.last_trade != Some(SignalSide::Buy) {
            Some(SignalSide::Buy)
        } else if edge.sell && self.last_trade != Some(SignalSide::Sell) {
            Some(SignalSide::Sell)
        } else {
            None
        }
    }
}
