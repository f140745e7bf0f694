use backtest::{Backtester, TradeEvent};
use common::{AccountingMode, PositionSide};
use proptest::prelude::*;
use strategy::BacktestConfig;

fn accounting() -> impl Strategy<Value = AccountingMode> {
    prop_oneof![Just(AccountingMode::Legacy), Just(AccountingMode::Margin)]
}

fn config(short: usize, long: usize, leverage: f64, accounting: AccountingMode) -> BacktestConfig {
    BacktestConfig {
        history: 0,
        short_window: short,
        long_window: long,
        initial_balance: 10_000.0,
        leverage,
        accounting,
    }
}

fn collect(bt: &Backtester, closes: &[f64]) -> (backtest::BacktestOutcome, Vec<TradeEvent>) {
    let mut events = Vec::new();
    let outcome = bt.run(closes, |e| events.push(e.clone()));
    (outcome, events)
}

proptest! {
    /// Entries only happen from flat, exits only close the side that is open,
    /// and every open position has a positive size.
    #[test]
    fn single_position_state_machine(
        closes in prop::collection::vec(50.0f64..150.0, 0..200),
        short in 1usize..10,
        extra in 0usize..20,
        leverage in 0.5f64..3.0,
        mode in accounting(),
    ) {
        let bt = Backtester::new(config(short, short + extra, leverage, mode));
        let (outcome, events) = collect(&bt, &closes);

        let mut open: Option<PositionSide> = None;
        let mut exits = 0;
        for event in &events {
            match *event {
                TradeEvent::Enter { side, size, .. } => {
                    prop_assert!(open.is_none(), "entered while {:?} was open", open);
                    prop_assert!(size > 0.0 && size.is_finite());
                    open = Some(side);
                }
                TradeEvent::Exit { side, .. } => {
                    prop_assert_eq!(open, Some(side));
                    open = None;
                    exits += 1;
                }
            }
        }
        // The run always ends flat.
        prop_assert!(open.is_none());
        prop_assert_eq!(outcome.closed_trades, exits);
        prop_assert!(outcome.winning_trades <= outcome.closed_trades);
        if let Some(last) = events.last() {
            prop_assert_eq!(last.balance(), outcome.final_balance);
        } else {
            prop_assert_eq!(outcome.final_balance, 10_000.0);
        }
    }

    /// Same input, same parameters: same events and same final balance.
    #[test]
    fn replay_is_deterministic(
        closes in prop::collection::vec(50.0f64..150.0, 0..150),
        short in 1usize..8,
        extra in 0usize..12,
        mode in accounting(),
    ) {
        let bt = Backtester::new(config(short, short + extra, 2.0, mode));
        let (first_outcome, first_events) = collect(&bt, &closes);
        let (second_outcome, second_events) = collect(&bt, &closes);
        prop_assert_eq!(first_outcome, second_outcome);
        prop_assert_eq!(first_events, second_events);
    }

    /// A series no longer than the long window never trades.
    #[test]
    fn too_short_history_keeps_initial_balance(
        long in 1usize..40,
        closes in prop::collection::vec(0.5f64..500.0, 0..40),
    ) {
        prop_assume!(closes.len() <= long);
        let bt = Backtester::new(config(1, long, 1.0, AccountingMode::Legacy));
        let (outcome, events) = collect(&bt, &closes);
        prop_assert!(events.is_empty());
        prop_assert_eq!(outcome.final_balance, 10_000.0);
    }
}
