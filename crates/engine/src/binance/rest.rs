use std::future::Future;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use serde::de::IgnoredAny;
use serde::Deserialize;
use tracing::debug;

use common::{Candle, Error, MarketData, Result};

/// Binance caps `/api/v3/klines` at this many rows per request.
pub const MAX_KLINES_PER_REQUEST: usize = 1000;

/// Binance error code for an unknown trading pair.
const INVALID_SYMBOL_CODE: i64 = -1121;

/// Public (unsigned) REST client for Binance market data.
pub struct BinanceClient {
    base_url: String,
    http: Client,
}

impl BinanceClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn get(&self, path: &str, query: &str, symbol: &str) -> Result<String> {
        let url = format!("{}{path}?{query}", self.base_url);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(api_error(status, &body, symbol));
        }
        Ok(body)
    }

    /// One page of klines ending at `end_time` (inclusive, ms) or at now.
    async fn fetch_page(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
        end_time: Option<i64>,
    ) -> Result<Vec<Candle>> {
        let mut query = format!("symbol={symbol}&interval={interval}&limit={limit}");
        if let Some(end) = end_time {
            query.push_str(&format!("&endTime={end}"));
        }
        debug!(symbol, interval, limit, ?end_time, "Requesting klines");
        let body = self.get("/api/v3/klines", &query, symbol).await?;
        parse_klines(&body)
    }
}

#[async_trait]
impl MarketData for BinanceClient {
    async fn fetch_candles(&self, symbol: &str, interval: &str, limit: usize) -> Result<Vec<Candle>> {
        paginate(limit, |want, end_time| self.fetch_page(symbol, interval, want, end_time)).await
    }

    async fn validate_symbol(&self, symbol: &str) -> Result<()> {
        let body = self
            .get("/api/v3/exchangeInfo", &format!("symbol={symbol}"), symbol)
            .await?;
        let info: ExchangeInfo = serde_json::from_str(&body)?;
        if info.symbols.iter().any(|s| s.symbol == symbol) {
            Ok(())
        } else {
            Err(Error::InvalidSymbol(symbol.to_string()))
        }
    }
}

/// Collect the most recent `limit` candles by walking backwards in pages of at
/// most [`MAX_KLINES_PER_REQUEST`]. `fetch_page(want, end_time)` must return
/// candles oldest first. Stops early once the exchange runs out of history.
pub async fn paginate<F, Fut>(limit: usize, mut fetch_page: F) -> Result<Vec<Candle>>
where
    F: FnMut(usize, Option<i64>) -> Fut,
    Fut: Future<Output = Result<Vec<Candle>>>,
{
    let mut candles: Vec<Candle> = Vec::with_capacity(limit);
    let mut end_time = None;

    while candles.len() < limit {
        let want = (limit - candles.len()).min(MAX_KLINES_PER_REQUEST);
        let mut page = fetch_page(want, end_time).await?;
        let Some(first) = page.first() else {
            break;
        };
        end_time = Some(first.open_time.timestamp_millis() - 1);

        let received = page.len();
        if received > want {
            page.drain(..received - want);
        }
        page.append(&mut candles);
        candles = page;

        if received < want {
            break;
        }
    }
    Ok(candles)
}

/// Parse a `/api/v3/klines` response body.
pub fn parse_klines(body: &str) -> Result<Vec<Candle>> {
    let rows: Vec<RawKline> = serde_json::from_str(body)?;
    rows.into_iter().map(Candle::try_from).collect()
}

fn api_error(status: StatusCode, body: &str, symbol: &str) -> Error {
    match serde_json::from_str::<ApiError>(body) {
        Ok(err) if err.code == INVALID_SYMBOL_CODE => Error::InvalidSymbol(symbol.to_string()),
        Ok(err) => Error::Exchange(format!("HTTP {status}: {} (code {})", err.msg, err.code)),
        Err(_) => Error::Exchange(format!("HTTP {status}: {body}")),
    }
}

fn parse_price(field: &str, raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|e| Error::Exchange(format!("bad kline {field} '{raw}': {e}")))
}

fn parse_millis(ms: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| Error::Exchange(format!("bad kline timestamp {ms}")))
}

// ─── Response types ───────────────────────────────────────────────────────────

/// `[openTime, open, high, low, close, volume, closeTime, quoteVolume,
/// trades, takerBase, takerQuote, ignore]`
#[derive(Deserialize)]
struct RawKline(
    i64,
    String,
    String,
    String,
    String,
    String,
    i64,
    IgnoredAny,
    IgnoredAny,
    IgnoredAny,
    IgnoredAny,
    IgnoredAny,
);

impl TryFrom<RawKline> for Candle {
    type Error = Error;

    fn try_from(k: RawKline) -> Result<Self> {
        Ok(Candle {
            open_time: parse_millis(k.0)?,
            open: parse_price("open", &k.1)?,
            high: parse_price("high", &k.2)?,
            low: parse_price("low", &k.3)?,
            close: parse_price("close", &k.4)?,
            volume: parse_price("volume", &k.5)?,
            close_time: parse_millis(k.6)?,
        })
    }
}

#[derive(Deserialize)]
struct ApiError {
    code: i64,
    msg: String,
}

#[derive(Deserialize)]
struct ExchangeInfo {
    symbols: Vec<SymbolInfo>,
}

#[derive(Deserialize)]
struct SymbolInfo {
    symbol: String,
}
