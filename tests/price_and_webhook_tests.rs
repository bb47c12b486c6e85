mod common;

use axum::http::{header, Request, StatusCode};
use common::{harness, harness_with, test_settings};
use http_body_util::BodyExt;
use pricewatch::{models::MarketSegment, routes};
use tower::ServiceExt;

async fn response_json(res: axum::response::Response) -> serde_json::Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<axum::body::Body> {
    Request::builder().uri(uri).body(axum::body::Body::empty()).unwrap()
}

fn webhook(body: &str) -> Request<axum::body::Body> {
    Request::builder()
        .method("POST")
        .uri("/api/telegram/webhook")
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn price_lookup_defaults_to_spot() {
    let h = harness(vec![], vec![]);
    h.oracle.set("BTCUSDT", MarketSegment::Spot, 64000.5);

    let res = routes::app(h.state.clone())
        .oneshot(get("/api/price?symbol=btcusdt"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = response_json(res).await;
    assert_eq!(body["symbol"], "BTCUSDT");
    assert_eq!(body["marketType"], "spot");
    assert!(body.get("type").is_none());
    assert_eq!(body["price"], 64000.5);
}

#[tokio::test]
async fn price_lookup_for_futures() {
    let h = harness(vec![], vec![]);
    h.oracle.set("ETHUSDT", MarketSegment::Futures, 3100.0);

    let res = routes::app(h.state.clone())
        .oneshot(get("/api/price?symbol=ETHUSDT&type=futures"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(response_json(res).await["marketType"], "futures");
}

#[tokio::test]
async fn price_lookup_rejects_bad_input() {
    let h = harness(vec![], vec![]);

    let res = routes::app(h.state.clone())
        .oneshot(get("/api/price"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = routes::app(h.state.clone())
        .oneshot(get("/api/price?symbol=BTCUSDT&type=options"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn price_lookup_failure_is_bad_gateway() {
    let h = harness(vec![], vec![]);
    h.oracle.fail("BTCUSDT", MarketSegment::Spot, "451 restricted");

    let res = routes::app(h.state.clone())
        .oneshot(get("/api/price?symbol=BTCUSDT"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn webhook_start_replies_with_chat_id() {
    let h = harness(vec![], vec![]);

    let res = routes::app(h.state.clone())
        .oneshot(webhook(r#"{"message":{"chat":{"id":4242},"text":"/start"}}"#))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(response_json(res).await["ok"], true);

    let replies = h.notifier.sent_to("4242");
    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("4242"));
}

#[tokio::test]
async fn webhook_other_text_gets_hint() {
    let h = harness(vec![], vec![]);

    routes::app(h.state.clone())
        .oneshot(webhook(r#"{"message":{"chat":{"id":7},"text":"hello"}}"#))
        .await
        .unwrap();

    let replies = h.notifier.sent_to("7");
    assert_eq!(replies, vec!["Alarms are managed from the web app.".to_string()]);
}

#[tokio::test]
async fn webhook_without_message_is_acknowledged() {
    let h = harness(vec![], vec![]);

    let res = routes::app(h.state.clone())
        .oneshot(webhook(r#"{"update_id":1}"#))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(h.notifier.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn webhook_checks_secret_token() {
    let mut settings = test_settings();
    settings.telegram_webhook_secret = Some("hook".to_string());
    let h = harness_with(settings, vec![], vec![]);

    let res = routes::app(h.state.clone())
        .oneshot(webhook(r#"{"message":{"chat":{"id":1},"text":"/start"}}"#))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let mut req = webhook(r#"{"message":{"chat":{"id":1},"text":"/start"}}"#);
    req.headers_mut()
        .insert("x-telegram-bot-api-secret-token", "hook".parse().unwrap());
    let res = routes::app(h.state.clone()).oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn webhook_without_bot_token_is_501() {
    let mut settings = test_settings();
    settings.telegram_bot_token = String::new();
    let h = harness_with(settings, vec![], vec![]);

    let res = routes::app(h.state.clone())
        .oneshot(webhook(r#"{"message":{"chat":{"id":1},"text":"/start"}}"#))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn malformed_webhook_body_is_rejected_after_guards() {
    let garbage = "{not json";

    let mut settings = test_settings();
    settings.telegram_bot_token = String::new();
    let h = harness_with(settings, vec![], vec![]);
    let res = routes::app(h.state.clone()).oneshot(webhook(garbage)).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_IMPLEMENTED);

    let mut settings = test_settings();
    settings.telegram_webhook_secret = Some("hook".to_string());
    let h = harness_with(settings, vec![], vec![]);
    let res = routes::app(h.state.clone()).oneshot(webhook(garbage)).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let mut req = webhook(garbage);
    req.headers_mut()
        .insert("x-telegram-bot-api-secret-token", "hook".parse().unwrap());
    let res = routes::app(h.state.clone()).oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(response_json(res).await["error"].is_string());
    assert!(h.notifier.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn health_is_ok() {
    let h = harness(vec![], vec![]);

    let res = routes::app(h.state.clone()).oneshot(get("/health")).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}
