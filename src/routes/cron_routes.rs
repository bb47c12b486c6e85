use axum::{Router, routing::get};
use crate::{AppState, controllers::cron_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router.route(
        "/api/cron/check-alarms",
        get(cron_controller::check_alarms).post(cron_controller::check_alarms),
    )
}
