pub mod config;
pub mod indicators;
pub mod rows;
pub mod signal;

pub use config::{BacktestConfig, LiveConfig, StrategyFileConfig};
pub use rows::{build_rows, IndicatorRow, RowSpec};
pub use signal::{detect_crossover, Crossover, RsiFilter, SignalEngine, SignalEvent};
