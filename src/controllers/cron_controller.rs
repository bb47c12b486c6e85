use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::{services::alarm_cycle, AppState};

#[derive(Deserialize)]
pub struct CronQuery {
    pub secret: Option<String>,
}

fn supplied_secret(query: &CronQuery, headers: &HeaderMap) -> Option<String> {
    // an empty `?secret=` falls through to the header
    query
        .secret
        .clone()
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-cron-secret")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .filter(|s| !s.is_empty())
        })
}

// POST|GET /api/cron/check-alarms
pub async fn check_alarms(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CronQuery>,
) -> Response {
    let secret = supplied_secret(&query, &headers);

    match alarm_cycle::run_cycle(&state, secret.as_deref()).await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => {
            tracing::error!("check-alarms rejected: {e}");
            e.into_response()
        }
    }
}
