//! EMA crossover backtester.
//!
//! Replays a close-price series once, holding at most one leveraged position.
//! At step `i` the short and long EMAs are computed over `closes[..i]` only,
//! and any resulting trade fills at `closes[i]`. Whatever is still open after
//! the last candle is closed at the final close.

pub mod event;
pub mod position;

pub use event::TradeEvent;
pub use position::{Account, Position};

use tracing::{debug, info, warn};

use common::{AccountingMode, PositionSide};
use strategy::indicators::Ema;
use strategy::BacktestConfig;

/// Summary of a finished run. Individual trades are only surfaced through
/// the event callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestOutcome {
    pub initial_balance: f64,
    pub final_balance: f64,
    /// Candles whose crossover state was evaluated.
    pub steps: usize,
    pub closed_trades: usize,
    pub winning_trades: usize,
}

impl BacktestOutcome {
    pub fn total_return_pct(&self) -> f64 {
        if self.initial_balance == 0.0 {
            return 0.0;
        }
        (self.final_balance - self.initial_balance) / self.initial_balance * 100.0
    }
}

/// Runs the crossover strategy over historical closes.
#[derive(Debug, Clone)]
pub struct Backtester {
    cfg: BacktestConfig,
}

impl Backtester {
    pub fn new(cfg: BacktestConfig) -> Self {
        Self { cfg }
    }

    /// Replay `closes` and return the final balance and trade counters.
    /// `on_event` sees every entry and exit in order.
    pub fn run<F>(&self, closes: &[f64], mut on_event: F) -> BacktestOutcome
    where
        F: FnMut(&TradeEvent),
    {
        let mut sim = Simulation::new(&self.cfg);
        let mut short_ema = Ema::new(self.cfg.short_window);
        let mut long_ema = Ema::new(self.cfg.long_window);

        for (i, &price) in closes.iter().enumerate() {
            if i >= self.cfg.long_window {
                if let (Some(short_ma), Some(long_ma)) = (short_ema.value(), long_ema.value()) {
                    sim.step(i, price, short_ma, long_ma, &mut on_event);
                }
            }
            short_ema.update(price);
            long_ema.update(price);
        }

        match closes.last() {
            Some(&last) => sim.finish(closes.len() - 1, last, &mut on_event),
            None => debug!("Empty price series, nothing to replay"),
        }

        let outcome = BacktestOutcome {
            initial_balance: self.cfg.initial_balance,
            final_balance: sim.account.balance,
            steps: sim.steps,
            closed_trades: sim.closed_trades,
            winning_trades: sim.winning_trades,
        };
        info!(
            candles = closes.len(),
            steps = outcome.steps,
            trades = outcome.closed_trades,
            final_balance = outcome.final_balance,
            "Backtest finished"
        );
        outcome
    }
}

/// Position/account state machine driven by crossover observations.
#[derive(Debug, Clone)]
pub struct Simulation {
    position: Position,
    account: Account,
    leverage: f64,
    accounting: AccountingMode,
    steps: usize,
    closed_trades: usize,
    winning_trades: usize,
}

impl Simulation {
    pub fn new(cfg: &BacktestConfig) -> Self {
        Self {
            position: Position::Flat,
            account: Account::new(cfg.initial_balance),
            leverage: cfg.leverage,
            accounting: cfg.accounting,
            steps: 0,
            closed_trades: 0,
            winning_trades: 0,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn account(&self) -> Account {
        self.account
    }

    /// Apply one crossover observation at candle `index` filling at `price`.
    /// Equal averages leave the position unchanged.
    pub fn step<F>(&mut self, index: usize, price: f64, short_ma: f64, long_ma: f64, on_event: &mut F)
    where
        F: FnMut(&TradeEvent),
    {
        self.steps += 1;
        let target = if short_ma > long_ma && self.position.side() != Some(PositionSide::Long) {
            PositionSide::Long
        } else if short_ma < long_ma && self.position.side() != Some(PositionSide::Short) {
            PositionSide::Short
        } else {
            return;
        };

        if !self.position.is_flat() {
            self.close(index, price, false, on_event);
        }
        self.open(target, index, price, on_event);
    }

    /// Force-close any open position at the last candle.
    pub fn finish<F>(&mut self, index: usize, price: f64, on_event: &mut F)
    where
        F: FnMut(&TradeEvent),
    {
        if !self.position.is_flat() {
            self.close(index, price, true, on_event);
        }
    }

    fn open<F>(&mut self, side: PositionSide, index: usize, price: f64, on_event: &mut F)
    where
        F: FnMut(&TradeEvent),
    {
        let notional = self.account.balance * self.leverage;
        let size = notional / price;
        if !(size.is_finite() && size > 0.0) {
            warn!(
                index,
                price,
                balance = self.account.balance,
                side = %side,
                "Skipping entry, notional is not positive"
            );
            return;
        }

        match (self.accounting, side) {
            (AccountingMode::Legacy, PositionSide::Long) => self.account.balance = 0.0,
            (AccountingMode::Legacy, PositionSide::Short) => {
                self.account.balance -= size * price;
            }
            (AccountingMode::Margin, _) => {
                self.account.margin = self.account.balance;
                self.account.balance = 0.0;
            }
        }
        self.position = Position::open(side, price, size);

        let event = TradeEvent::Enter {
            index,
            side,
            price,
            size,
            balance: self.account.balance,
        };
        debug!(%event, "Entered position");
        on_event(&event);
    }

    fn close<F>(&mut self, index: usize, price: f64, forced: bool, on_event: &mut F)
    where
        F: FnMut(&TradeEvent),
    {
        let (Some(side), Some((entry_price, size))) = (self.position.side(), self.position.entry())
        else {
            return;
        };
        let profit = self.position.profit_at(price);

        self.account.balance = match self.accounting {
            AccountingMode::Legacy => entry_price * size + profit,
            AccountingMode::Margin => self.account.margin + profit,
        };
        self.account.margin = 0.0;
        self.position = Position::Flat;

        self.closed_trades += 1;
        if profit > 0.0 {
            self.winning_trades += 1;
        }

        let event = TradeEvent::Exit {
            index,
            side,
            price,
            profit,
            balance: self.account.balance,
            forced,
        };
        debug!(%event, "Exited position");
        on_event(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLOSES: [f64; 8] = [10.0, 11.0, 9.0, 12.0, 8.0, 13.0, 7.0, 14.0];

    fn config(leverage: f64, accounting: AccountingMode) -> BacktestConfig {
        BacktestConfig {
            history: CLOSES.len(),
            short_window: 2,
            long_window: 3,
            initial_balance: 1000.0,
            leverage,
            accounting,
        }
    }

    fn run(cfg: BacktestConfig, closes: &[f64]) -> (BacktestOutcome, Vec<TradeEvent>) {
        let mut events = Vec::new();
        let outcome = Backtester::new(cfg).run(closes, |e| events.push(e.clone()));
        (outcome, events)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * b.abs().max(1.0)
    }

    /// (kind, index, side, price) with kind 'E' for entries and 'X' for exits.
    fn summary(events: &[TradeEvent]) -> Vec<(char, usize, PositionSide, f64)> {
        events
            .iter()
            .map(|e| match *e {
                TradeEvent::Enter { index, side, price, .. } => ('E', index, side, price),
                TradeEvent::Exit { index, side, price, .. } => ('X', index, side, price),
            })
            .collect()
    }

    #[test]
    fn hand_computed_crossovers() {
        // EMA(2) vs EMA(3) over the prefix before each step:
        //   i=3: 9.5556 < 9.75      -> short @12
        //   i=4: 11.1852 > 10.875   -> cover @8, long @8
        //   i=5: 9.0617 < 9.4375    -> sell @13, short @13
        //   i=6: 11.6872 > 11.21875 -> cover @7, long @7
        //   i=7: 8.5624 < 9.1094    -> sell @14, short @14
        //   end: forced cover @14
        let (outcome, events) = run(config(1.0, AccountingMode::Legacy), &CLOSES);

        use PositionSide::{Long, Short};
        assert_eq!(
            summary(&events),
            vec![
                ('E', 3, Short, 12.0),
                ('X', 4, Short, 8.0),
                ('E', 4, Long, 8.0),
                ('X', 5, Long, 13.0),
                ('E', 5, Short, 13.0),
                ('X', 6, Short, 7.0),
                ('E', 6, Long, 7.0),
                ('X', 7, Long, 14.0),
                ('E', 7, Short, 14.0),
                ('X', 7, Short, 14.0),
            ]
        );

        let profits: Vec<f64> = events
            .iter()
            .filter_map(|e| match e {
                TradeEvent::Exit { profit, .. } => Some(*profit),
                _ => None,
            })
            .collect();
        let expected = [1000.0 / 3.0, 2500.0 / 3.0, 1000.0, 9500.0 / 3.0, 0.0];
        for (got, want) in profits.iter().zip(expected) {
            assert!(approx(*got, want), "profit {got} != {want}");
        }

        assert!(matches!(events.last(), Some(TradeEvent::Exit { forced: true, .. })));
        assert!(approx(outcome.final_balance, 19_000.0 / 3.0), "{}", outcome.final_balance);
        assert_eq!(outcome.closed_trades, 5);
        assert_eq!(outcome.winning_trades, 4);
        assert_eq!(outcome.steps, 5);
    }

    #[test]
    fn legacy_short_entry_subtracts_notional_under_leverage() {
        let (outcome, events) = run(config(2.0, AccountingMode::Legacy), &CLOSES[..5]);
        // short @12: size 2000/12, balance 1000 - 2000 = -1000
        assert!(approx(events[0].balance(), -1000.0));
        // cover @8: balance = 12 * 166.67 + 666.67
        assert!(approx(events[1].balance(), 8000.0 / 3.0));
        // long @8 then forced exit @8 returns leveraged principal
        assert!(approx(outcome.final_balance, 16_000.0 / 3.0), "{}", outcome.final_balance);
    }

    #[test]
    fn margin_accounting_returns_margin_plus_profit() {
        let (outcome, events) = run(config(2.0, AccountingMode::Margin), &CLOSES[..5]);
        assert_eq!(events[0].balance(), 0.0);
        assert!(approx(events[1].balance(), 5000.0 / 3.0));
        assert!(approx(outcome.final_balance, 5000.0 / 3.0), "{}", outcome.final_balance);
    }

    #[test]
    fn margin_and_legacy_agree_without_leverage() {
        let (legacy, _) = run(config(1.0, AccountingMode::Legacy), &CLOSES);
        let (margin, _) = run(config(1.0, AccountingMode::Margin), &CLOSES);
        assert!(approx(legacy.final_balance, margin.final_balance));
    }

    #[test]
    fn series_of_long_window_length_keeps_initial_balance() {
        let (outcome, events) = run(config(1.0, AccountingMode::Legacy), &CLOSES[..3]);
        assert!(events.is_empty());
        assert_eq!(outcome.final_balance, 1000.0);
        assert_eq!(outcome.steps, 0);
    }

    #[test]
    fn empty_series_is_a_no_op() {
        let (outcome, events) = run(config(1.0, AccountingMode::Legacy), &[]);
        assert!(events.is_empty());
        assert_eq!(outcome.final_balance, 1000.0);
        assert_eq!(outcome.total_return_pct(), 0.0);
    }

    #[test]
    fn flat_prices_never_trade() {
        let (outcome, events) = run(config(1.0, AccountingMode::Legacy), &[5.0; 20]);
        assert!(events.is_empty());
        assert_eq!(outcome.final_balance, 1000.0);
        assert_eq!(outcome.steps, 17);
    }

    #[test]
    fn short_window_longer_than_history_skips_steps() {
        let mut cfg = config(1.0, AccountingMode::Legacy);
        cfg.short_window = 10;
        let (outcome, events) = run(cfg, &CLOSES);
        assert!(events.is_empty());
        assert_eq!(outcome.steps, 0);
    }

    #[test]
    fn depleted_account_stays_flat() {
        let mut sim = Simulation::new(&config(1.0, AccountingMode::Legacy));
        let mut events = Vec::new();
        let mut sink = |e: &TradeEvent| events.push(e.clone());

        // Short at 10, then price explodes past twice the entry.
        sim.step(3, 10.0, 1.0, 2.0, &mut sink);
        sim.step(4, 30.0, 2.0, 1.0, &mut sink);
        // cover: 10 * 100 + (10 - 30) * 100 = -1000, long entry skipped
        assert!(sim.position().is_flat());
        assert_eq!(sim.account().balance, -1000.0);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn total_return_reflects_final_balance() {
        let outcome = BacktestOutcome {
            initial_balance: 1000.0,
            final_balance: 1250.0,
            steps: 1,
            closed_trades: 1,
            winning_trades: 1,
        };
        assert_eq!(outcome.total_return_pct(), 25.0);
    }
}
