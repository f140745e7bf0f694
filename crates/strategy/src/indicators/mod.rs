//! Stateless indicator math over close-price slices (oldest first).
//!
//! Every function returns `None` while there is not enough history, which is
//! the expected state during warm-up rather than an error.

pub mod ema;
pub mod rsi;
pub mod sma;

pub use ema::{exponential_moving_average, Ema};
pub use rsi::{relative_strength_index, rolling_rsi};
pub use sma::{rolling_sma, simple_moving_average};
