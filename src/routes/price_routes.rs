use axum::{Router, routing::get};
use crate::{AppState, controllers::price_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router.route("/api/price", get(price_controller::get_price))
}
