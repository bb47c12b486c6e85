use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    controllers::price_controller::{bad_request, symbol_re},
    error::AlarmError,
    models::MarketSegment,
    services::binance::search_symbols,
    AppState,
};

const INTERVALS: &[&str] = &[
    "1s", "1m", "3m", "5m", "15m", "30m", "1h", "2h", "4h", "6h", "8h", "12h", "1d", "3d", "1w",
    "1M",
];

#[derive(Deserialize)]
pub struct SymbolsQuery {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub market: Option<String>,
}

#[derive(Deserialize)]
pub struct CandlesQuery {
    pub symbol: Option<String>,
    #[serde(rename = "type")]
    pub market: Option<String>,
    pub interval: Option<String>,
    pub limit: Option<String>,
}

fn upstream_error(e: AlarmError) -> Response {
    tracing::warn!("market data lookup failed: {e}");
    (StatusCode::BAD_GATEWAY, Json(json!({ "error": e.reason() }))).into_response()
}

// GET /api/symbols?q=BTC&type=spot
pub async fn get_symbols(State(state): State<AppState>, Query(query): Query<SymbolsQuery>) -> Response {
    // unknown market types degrade to spot
    let market = query
        .market
        .as_deref()
        .and_then(MarketSegment::parse)
        .unwrap_or(MarketSegment::Spot);

    match state.market_data.symbols(market).await {
        Ok(all) => {
            let symbols = search_symbols(all, query.q.as_deref().unwrap_or_default());
            Json(json!({ "symbols": symbols, "marketType": market })).into_response()
        }
        Err(e) => upstream_error(e),
    }
}

// GET /api/candles?symbol=BTCUSDT&type=spot&interval=1m&limit=120
pub async fn get_candles(State(state): State<AppState>, Query(query): Query<CandlesQuery>) -> Response {
    let sym = query.symbol.unwrap_or_default().trim().to_uppercase();
    if !symbol_re().is_match(&sym) {
        return bad_request("symbol is required");
    }

    let market = match query.market.as_deref() {
        None | Some("") => MarketSegment::Spot,
        Some(raw) => match MarketSegment::parse(raw) {
            Some(m) => m,
            None => return bad_request("type must be spot or futures"),
        },
    };

    let interval = query.interval.unwrap_or_else(|| "1m".to_string());
    if !INTERVALS.contains(&interval.as_str()) {
        return bad_request("unsupported interval");
    }

    let limit = match query.limit.as_deref().map(str::trim) {
        None | Some("") => 120,
        Some(raw) => match raw.parse::<u32>() {
            Ok(n) if (1..=500).contains(&n) => n,
            _ => return bad_request("limit must be between 1 and 500"),
        },
    };

    match state.market_data.candles(&sym, market, &interval, limit).await {
        Ok(candles) => {
            Json(json!({ "symbol": sym, "marketType": market, "candles": candles })).into_response()
        }
        Err(e) => upstream_error(e),
    }
}
