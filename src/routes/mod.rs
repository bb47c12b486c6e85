use axum::Router;

use crate::{AppState, controllers::home_controller};

pub mod home_routes;
pub mod cron_routes;
pub mod price_routes;
pub mod market_routes;
pub mod telegram_routes;

pub fn app(state: AppState) -> Router {
    let router = Router::<AppState>::new();

    let router = home_routes::add_routes(router);
    let router = cron_routes::add_routes(router);
    let router = price_routes::add_routes(router);
    let router = market_routes::add_routes(router);
    let router = telegram_routes::add_routes(router);

    router
        .fallback(home_controller::not_found)
        .with_state(state)
}
