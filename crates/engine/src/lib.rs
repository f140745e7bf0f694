pub mod alert;
pub mod binance;
pub mod monitor;

pub use alert::{AlertDispatcher, CommandNotifier};
pub use binance::BinanceClient;
pub use monitor::{LiveMonitor, PollOutcome};
