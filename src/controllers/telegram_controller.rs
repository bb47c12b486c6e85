use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    pub chat: TelegramChat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

fn secret_ok(expected: Option<&str>, headers: &HeaderMap) -> bool {
    let Some(expected) = expected else {
        return true;
    };

    headers
        .get("x-telegram-bot-api-secret-token")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == expected)
        .unwrap_or(false)
}

fn reply_for(chat_id: &str, text: &str) -> String {
    if text.starts_with("/start") {
        format!("Connected to the price alarm bot.\nPaste this chat id into the app:\n{chat_id}")
    } else {
        "Alarms are managed from the web app.".to_string()
    }
}

// POST /api/telegram/webhook
pub async fn post_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !state.settings.telegram_configured() {
        return (
            StatusCode::NOT_IMPLEMENTED,
            Json(json!({ "error": "Telegram not configured" })),
        )
            .into_response();
    }

    if !secret_ok(state.settings.telegram_webhook_secret.as_deref(), &headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "invalid secret" }))).into_response();
    }

    let update = match serde_json::from_slice::<TelegramUpdate>(&body) {
        Ok(u) => u,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response();
        }
    };

    let Some(message) = update.message else {
        return Json(json!({ "ok": true })).into_response();
    };

    let chat_id = message.chat.id.to_string();
    let reply = reply_for(&chat_id, message.text.as_deref().unwrap_or_default());

    if let Err(e) = state.notifier.send(&chat_id, &reply).await {
        tracing::warn!(chat_id = %chat_id, "webhook reply failed: {e}");
    }

    Json(json!({ "ok": true })).into_response()
}
