use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::{config::Settings, error::AlarmError, models::MarketSegment};

/// Cap on symbol search results.
pub const MAX_SYMBOL_RESULTS: usize = 20;

#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn get_price(&self, symbol: &str, market: MarketSegment) -> Result<f64, AlarmError>;
}

/// Read-only market data behind the symbol search and chart endpoints.
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn symbols(&self, market: MarketSegment) -> Result<Vec<ExchangeSymbol>, AlarmError>;

    async fn candles(
        &self,
        symbol: &str,
        market: MarketSegment,
        interval: &str,
        limit: u32,
    ) -> Result<Vec<Candle>, AlarmError>;
}

#[derive(Debug, Error)]
pub enum PriceError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("access restricted ({0})")]
    Restricted(StatusCode),

    #[error("price lookup failed: {status} {body}")]
    Status { status: StatusCode, body: String },

    #[error("unparseable price {0:?}")]
    BadPrice(String),

    #[error("malformed kline row: {0}")]
    BadKline(String),
}

impl PriceError {
    fn is_restricted(&self) -> bool {
        matches!(self, PriceError::Restricted(_))
    }
}

#[derive(Debug, Deserialize)]
pub struct TickerPrice {
    pub symbol: String,
    // Binance quotes prices as decimal strings
    pub price: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeInfo {
    #[serde(default)]
    pub symbols: Vec<ExchangeSymbol>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeSymbol {
    pub symbol: String,
    pub status: String,
    #[serde(default)]
    pub base_asset: Option<String>,
    #[serde(default)]
    pub quote_asset: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolInfo {
    pub symbol: String,
    pub base: Option<String>,
    pub quote: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candle {
    // seconds since epoch
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Trading symbols whose name or base asset contains `query`, at most
/// `MAX_SYMBOL_RESULTS` of them.
pub fn search_symbols(symbols: Vec<ExchangeSymbol>, query: &str) -> Vec<SymbolInfo> {
    let query = query.trim().to_uppercase();

    symbols
        .into_iter()
        .filter(|s| s.status == "TRADING")
        .filter(|s| {
            query.is_empty()
                || s.symbol.contains(&query)
                || s.base_asset.as_deref().is_some_and(|b| b.contains(&query))
        })
        .take(MAX_SYMBOL_RESULTS)
        .map(|s| SymbolInfo {
            symbol: s.symbol,
            base: s.base_asset,
            quote: s.quote_asset,
        })
        .collect()
}

fn decimal(v: &serde_json::Value) -> Option<f64> {
    v.as_str()?.trim().parse().ok()
}

// [openTime, open, high, low, close, volume, closeTime, ...]
fn parse_kline(row: &[serde_json::Value]) -> Result<Candle, PriceError> {
    let bad = || PriceError::BadKline(serde_json::Value::from(row.to_vec()).to_string());

    let open_ms = row.first().and_then(serde_json::Value::as_i64).ok_or_else(bad)?;
    let field = |i: usize| row.get(i).and_then(decimal).ok_or_else(bad);

    Ok(Candle {
        time: open_ms / 1000,
        open: field(1)?,
        high: field(2)?,
        low: field(3)?,
        close: field(4)?,
    })
}

#[derive(Clone, Copy)]
enum Endpoint {
    Ticker,
    ExchangeInfo,
    Klines,
}

impl Endpoint {
    fn path(self, market: MarketSegment) -> &'static str {
        match (market, self) {
            (MarketSegment::Spot, Endpoint::Ticker) => "/api/v3/ticker/price",
            (MarketSegment::Spot, Endpoint::ExchangeInfo) => "/api/v3/exchangeInfo",
            (MarketSegment::Spot, Endpoint::Klines) => "/api/v3/klines",
            (MarketSegment::Futures, Endpoint::Ticker) => "/fapi/v1/ticker/price",
            (MarketSegment::Futures, Endpoint::ExchangeInfo) => "/fapi/v1/exchangeInfo",
            (MarketSegment::Futures, Endpoint::Klines) => "/fapi/v1/klines",
        }
    }
}

#[derive(Clone)]
pub struct BinanceClient {
    http: Client,
    spot_url: String,
    futures_url: String,
    spot_fallback_url: Option<String>,
    futures_fallback_url: Option<String>,
}

impl BinanceClient {
    pub fn new(
        spot_url: String,
        futures_url: String,
        spot_fallback_url: Option<String>,
        futures_fallback_url: Option<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            spot_url,
            futures_url,
            spot_fallback_url,
            futures_fallback_url,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.binance_spot_url.clone(),
            settings.binance_futures_url.clone(),
            settings.binance_spot_fallback_url.clone(),
            settings.binance_futures_fallback_url.clone(),
        )
    }

    fn hosts(&self, market: MarketSegment) -> (&str, Option<&str>) {
        match market {
            MarketSegment::Spot => (self.spot_url.as_str(), self.spot_fallback_url.as_deref()),
            MarketSegment::Futures => (
                self.futures_url.as_str(),
                self.futures_fallback_url.as_deref(),
            ),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        base: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, PriceError> {
        let url = format!("{}{}", base.trim_end_matches('/'), path);
        let res = self.http.get(url).query(query).send().await?;

        let status = res.status();
        if status == StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS || status == StatusCode::FORBIDDEN {
            return Err(PriceError::Restricted(status));
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(PriceError::Status { status, body });
        }

        Ok(res.json::<T>().await?)
    }

    /// GETs `endpoint` from the market's primary host. A region/access
    /// restriction is retried once against the fallback host, if configured.
    async fn fetch<T: DeserializeOwned>(
        &self,
        market: MarketSegment,
        endpoint: Endpoint,
        query: &[(&str, String)],
    ) -> Result<T, PriceError> {
        let (primary, fallback) = self.hosts(market);
        let path = endpoint.path(market);

        match self.get_json(primary, path, query).await {
            Err(e) if e.is_restricted() => match fallback {
                Some(alt) => {
                    tracing::debug!(path, %market, "primary market data source restricted, using fallback");
                    self.get_json(alt, path, query).await
                }
                None => Err(e),
            },
            other => other,
        }
    }

    /// Last traded price.
    pub async fn price(&self, symbol: &str, market: MarketSegment) -> Result<f64, PriceError> {
        let ticker: TickerPrice = self
            .fetch(market, Endpoint::Ticker, &[("symbol", symbol.to_string())])
            .await?;

        ticker
            .price
            .trim()
            .parse::<f64>()
            .map_err(|_| PriceError::BadPrice(ticker.price.clone()))
    }

    pub async fn exchange_info(&self, market: MarketSegment) -> Result<ExchangeInfo, PriceError> {
        self.fetch(market, Endpoint::ExchangeInfo, &[]).await
    }

    pub async fn klines(
        &self,
        symbol: &str,
        market: MarketSegment,
        interval: &str,
        limit: u32,
    ) -> Result<Vec<Candle>, PriceError> {
        let rows: Vec<Vec<serde_json::Value>> = self
            .fetch(
                market,
                Endpoint::Klines,
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", interval.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        rows.iter().map(|r| parse_kline(r)).collect()
    }
}

#[async_trait]
impl PriceOracle for BinanceClient {
    async fn get_price(&self, symbol: &str, market: MarketSegment) -> Result<f64, AlarmError> {
        self.price(symbol, market)
            .await
            .map_err(|e| AlarmError::PriceResolution(e.to_string()))
    }
}

#[async_trait]
impl MarketData for BinanceClient {
    async fn symbols(&self, market: MarketSegment) -> Result<Vec<ExchangeSymbol>, AlarmError> {
        self.exchange_info(market)
            .await
            .map(|info| info.symbols)
            .map_err(|e| AlarmError::PriceResolution(e.to_string()))
    }

    async fn candles(
        &self,
        symbol: &str,
        market: MarketSegment,
        interval: &str,
        limit: u32,
    ) -> Result<Vec<Candle>, AlarmError> {
        self.klines(symbol, market, interval, limit)
            .await
            .map_err(|e| AlarmError::PriceResolution(e.to_string()))
    }
}
