use async_trait::async_trait;

use crate::{Candle, Result};

/// Source of historical candles.
///
/// `BinanceClient` implements this against the public REST API. Tests use
/// in-memory fakes.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Fetch the most recent `limit` candles for `symbol`, oldest first.
    async fn fetch_candles(&self, symbol: &str, interval: &str, limit: usize)
        -> Result<Vec<Candle>>;

    /// Check that `symbol` is tradable. Sources without a symbol catalogue
    /// accept everything.
    async fn validate_symbol(&self, _symbol: &str) -> Result<()> {
        Ok(())
    }
}
