mod cli;
mod logging;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};

use backtest::{Backtester, TradeEvent};
use common::{closes, Config, Error, MarketData};
use engine::{AlertDispatcher, BinanceClient, CommandNotifier, LiveMonitor};
use strategy::StrategyFileConfig;
use telegram_alert::TelegramNotifier;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env().context("invalid environment configuration")?;

    // ── Logging ───────────────────────────────────────────────────────────────
    // Journals are only written by the live monitor.
    let journals = matches!(cli.command, Command::Monitor(_)).then_some(&cfg);
    logging::init(journals)?;

    let mut strategy_file = StrategyFileConfig::load(&cfg.strategy_config_path)
        .with_context(|| format!("failed to load {}", cfg.strategy_config_path))?;

    match cli.command {
        Command::Backtest(args) => {
            args.apply(&mut strategy_file);
            strategy_file.validate().context("invalid strategy configuration")?;
            let client = BinanceClient::new(&cfg.binance_base_url)?;
            run_backtest(&client, &strategy_file, &mut std::io::stdout()).await
        }
        Command::Monitor(args) => {
            args.apply(&mut strategy_file);
            strategy_file.validate().context("invalid strategy configuration")?;
            run_monitor(&cfg, &strategy_file).await
        }
    }
}

/// Replay `history` candles from `source` and write the trade narration to
/// `out`. A failed or empty fetch prints `No data available.` and succeeds.
async fn run_backtest(
    source: &dyn MarketData,
    strategy_file: &StrategyFileConfig,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let bt = &strategy_file.backtest;
    info!(
        symbol = %strategy_file.symbol,
        interval = %strategy_file.interval,
        history = bt.history,
        short = bt.short_window,
        long = bt.long_window,
        leverage = bt.leverage,
        accounting = %bt.accounting,
        "Backtest starting"
    );

    let candles = match source
        .fetch_candles(&strategy_file.symbol, &strategy_file.interval, bt.history)
        .await
    {
        Ok(candles) => candles,
        Err(e) => {
            error!(symbol = %strategy_file.symbol, error = %e, "Failed to fetch historical data");
            Vec::new()
        }
    };

    if candles.is_empty() {
        writeln!(out, "No data available.")?;
        return Ok(());
    }

    let mut events = Vec::new();
    let outcome = Backtester::new(bt.clone()).run(&closes(&candles), |event| events.push(event.clone()));

    for event in &events {
        writeln!(out, "{event}")?;
        // The closing trade at the last candle is reported without a balance line.
        if !matches!(event, TradeEvent::Exit { forced: true, .. }) {
            writeln!(out, "BALANCE is {}", event.balance())?;
        }
    }

    writeln!(out, "FINAL BALANCE: ${:.2}", outcome.final_balance)?;
    writeln!(out, "{}", "-".repeat(62))?;
    writeln!(
        out,
        "Trades: {} ({} winning) over {} candles, return {:+.2}%",
        outcome.closed_trades,
        outcome.winning_trades,
        candles.len(),
        outcome.total_return_pct()
    )?;
    Ok(())
}

async fn run_monitor(cfg: &Config, strategy_file: &StrategyFileConfig) -> anyhow::Result<()> {
    let client = BinanceClient::new(&cfg.binance_base_url)?;

    match client.validate_symbol(&strategy_file.symbol).await {
        Ok(()) => {}
        Err(e @ Error::InvalidSymbol(_)) => return Err(e.into()),
        Err(e) => warn!(symbol = %strategy_file.symbol, error = %e, "Could not validate symbol, continuing"),
    }

    // ── Alert channels ────────────────────────────────────────────────────────
    let mut alerts = AlertDispatcher::new(Duration::from_secs(cfg.alert_timeout_secs));
    if let Some(command) = &cfg.notify_command {
        alerts = alerts.with(Arc::new(CommandNotifier::parse("desktop", command)?));
    }
    if let Some(command) = &cfg.sound_command {
        alerts = alerts.with(Arc::new(CommandNotifier::parse("sound", command)?));
    }
    match &cfg.telegram_token {
        Some(token) if !cfg.telegram_chat_ids.is_empty() => {
            alerts = alerts.with(Arc::new(TelegramNotifier::new(token.clone(), &cfg.telegram_chat_ids)?));
        }
        Some(_) => warn!("TELEGRAM_TOKEN set without TELEGRAM_CHAT_IDS, Telegram alerts disabled"),
        None => {}
    }
    if alerts.is_empty() {
        info!("No alert channels configured, signals will only be journaled");
    }

    let source: Arc<dyn MarketData> = Arc::new(client);
    let monitor = LiveMonitor::new(source, strategy_file, alerts);

    tokio::select! {
        _ = monitor.run() => {}
        res = tokio::signal::ctrl_c() => {
            res.context("failed to listen for shutdown signal")?;
            info!("Shutdown signal received. Exiting.");
        }
    }
    Ok(())
}
