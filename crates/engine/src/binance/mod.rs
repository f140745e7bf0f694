pub mod rest;

pub use rest::{BinanceClient, MAX_KLINES_PER_REQUEST};
