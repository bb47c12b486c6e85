use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Everything that can go wrong during an evaluation cycle.
///
/// `Configuration`, `Authorization` and `Store` reject the whole cycle before
/// any watch is touched. The other kinds are scoped to one instrument group or
/// one watch and end up inside that watch's outcome record.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum AlarmError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unauthorized: {0}")]
    Authorization(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("price resolution failed: {0}")]
    PriceResolution(String),

    #[error("persistence failed: {0}")]
    Persistence(String),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

impl AlarmError {
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AlarmError::Configuration(_) | AlarmError::Authorization(_) | AlarmError::Store(_)
        )
    }

    pub fn reason(&self) -> &str {
        match self {
            AlarmError::Configuration(r)
            | AlarmError::Authorization(r)
            | AlarmError::Store(r)
            | AlarmError::PriceResolution(r)
            | AlarmError::Persistence(r)
            | AlarmError::Delivery(r) => r,
        }
    }
}

impl IntoResponse for AlarmError {
    fn into_response(self) -> Response {
        let status = match &self {
            AlarmError::Authorization(_) => StatusCode::UNAUTHORIZED,
            AlarmError::PriceResolution(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
