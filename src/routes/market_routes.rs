use axum::{Router, routing::get};
use crate::{AppState, controllers::market_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/api/symbols", get(market_controller::get_symbols))
        .route("/api/candles", get(market_controller::get_candles))
}
