use axum::{Router, routing::post};
use crate::{AppState, controllers::telegram_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router.route("/api/telegram/webhook", post(telegram_controller::post_webhook))
}
