use std::sync::OnceLock;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use regex::Regex;
use serde::Deserialize;
use serde_json::json;

use crate::{models::MarketSegment, AppState};

#[derive(Deserialize)]
pub struct PriceQuery {
    pub symbol: Option<String>,
    #[serde(rename = "type")]
    pub market: Option<String>,
}

pub(crate) fn symbol_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z0-9]{2,30}$").expect("static regex"))
}

pub(crate) fn bad_request(msg: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
}

// GET /api/price?symbol=BTCUSDT&type=spot
pub async fn get_price(State(state): State<AppState>, Query(query): Query<PriceQuery>) -> Response {
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

    match state.prices.get_price(&sym, market).await {
        Ok(price) => Json(json!({ "symbol": sym, "marketType": market, "price": price })).into_response(),
        Err(e) => e.into_response(),
    }
}
