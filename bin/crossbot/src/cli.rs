use clap::{Args, Parser, Subcommand};

use common::AccountingMode;
use strategy::StrategyFileConfig;

#[derive(Parser)]
#[command(
    name = "crossbot",
    version,
    about = "Moving-average crossover backtester and live signal monitor",
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Replay history through the EMA crossover strategy
    Backtest(BacktestArgs),
    /// Poll live candles and alert on SMA crossovers
    Monitor(MonitorArgs),
}

/// Flags shared by both subcommands. Unset flags fall back to the strategy
/// config file, then to built-in defaults.
#[derive(Args)]
pub struct MarketArgs {
    /// Trading pair, e.g. BTCUSDT
    #[arg(long)]
    pub symbol: Option<String>,

    /// Kline interval, e.g. 15m
    #[arg(long)]
    pub interval: Option<String>,
}

#[derive(Args)]
pub struct BacktestArgs {
    #[command(flatten)]
    pub market: MarketArgs,

    /// Number of candles to replay
    #[arg(long)]
    pub history: Option<usize>,

    /// Short EMA window
    #[arg(long)]
    pub short_window: Option<usize>,

    /// Long EMA window
    #[arg(long)]
    pub long_window: Option<usize>,

    /// Starting balance in quote currency
    #[arg(long)]
    pub initial_balance: Option<f64>,

    /// Notional multiplier applied to the balance on every entry
    #[arg(long)]
    pub leverage: Option<f64>,

    /// Balance bookkeeping: legacy or margin
    #[arg(long)]
    pub accounting: Option<AccountingMode>,
}

#[derive(Args)]
pub struct MonitorArgs {
    #[command(flatten)]
    pub market: MarketArgs,

    /// Candles fetched per poll
    #[arg(long)]
    pub window: Option<usize>,

    /// Short SMA window
    #[arg(long)]
    pub short_window: Option<usize>,

    /// Long SMA window
    #[arg(long)]
    pub long_window: Option<usize>,

    /// RSI lookback period
    #[arg(long)]
    pub rsi_period: Option<usize>,

    /// Buys are suppressed at or above this RSI
    #[arg(long)]
    pub overbought: Option<f64>,

    /// Sells are suppressed at or below this RSI
    #[arg(long)]
    pub oversold: Option<f64>,

    /// Delay between polls in milliseconds
    #[arg(long = "poll-ms")]
    pub poll_interval_ms: Option<u64>,
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *target = v;
    }
}

impl MarketArgs {
    fn apply(self, cfg: &mut StrategyFileConfig) {
        set(&mut cfg.symbol, self.symbol.map(|s| s.to_uppercase()));
        set(&mut cfg.interval, self.interval);
    }
}

impl BacktestArgs {
    pub fn apply(self, cfg: &mut StrategyFileConfig) {
        self.market.apply(cfg);
        let bt = &mut cfg.backtest;
        set(&mut bt.history, self.history);
        set(&mut bt.short_window, self.short_window);
        set(&mut bt.long_window, self.long_window);
        set(&mut bt.initial_balance, self.initial_balance);
        set(&mut bt.leverage, self.leverage);
        set(&mut bt.accounting, self.accounting);
    }
}

impl MonitorArgs {
    pub fn apply(self, cfg: &mut StrategyFileConfig) {
        self.market.apply(cfg);
        let live = &mut cfg.live;
        set(&mut live.window, self.window);
        set(&mut live.short_window, self.short_window);
        set(&mut live.long_window, self.long_window);
        set(&mut live.rsi_period, self.rsi_period);
        set(&mut live.overbought, self.overbought);
        set(&mut live.oversold, self.oversold);
        set(&mut live.poll_interval_ms, self.poll_interval_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn backtest_flags_override_file_values() {
        let cli = Cli::parse_from([
            "crossbot",
            "backtest",
            "--symbol",
            "ethusdt",
            "--leverage",
            "2",
            "--accounting",
            "margin",
        ]);
        let Command::Backtest(args) = cli.command else {
            panic!("expected backtest subcommand");
        };
        let mut cfg = StrategyFileConfig::default();
        args.apply(&mut cfg);
        assert_eq!(cfg.symbol, "ETHUSDT");
        assert_eq!(cfg.backtest.leverage, 2.0);
        assert_eq!(cfg.backtest.accounting, AccountingMode::Margin);
        assert_eq!(cfg.backtest.long_window, 55);
    }

    #[test]
    fn monitor_flags_override_file_values() {
        let cli = Cli::parse_from(["crossbot", "monitor", "--rsi-period", "7", "--poll-ms", "5000"]);
        let Command::Monitor(args) = cli.command else {
            panic!("expected monitor subcommand");
        };
        let mut cfg = StrategyFileConfig::default();
        args.apply(&mut cfg);
        assert_eq!(cfg.live.rsi_period, 7);
        assert_eq!(cfg.live.poll_interval_ms, 5000);
        assert_eq!(cfg.live.short_window, 10);
        assert_eq!(cfg.symbol, "BTCUSDT");
    }
}
