//! Tracing targets for the two append-only journals.
//!
//! The binary routes each target to its own file; library code only needs to
//! log with `target: PRICE_LOG` or `target: SIGNAL_LOG`.

/// Periodic price and indicator snapshots.
pub const PRICE_LOG: &str = "price_indicator";

/// Emitted trade signals and notification receipts.
pub const SIGNAL_LOG: &str = "trade_signal";
