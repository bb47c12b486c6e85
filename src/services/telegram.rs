use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::error::AlarmError;

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, address: &str, text: &str) -> Result<(), AlarmError>;
}

#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    bot_token: String,
    api_url: String,
}

impl TelegramClient {
    pub fn new(bot_token: String) -> Self {
        Self::with_api_url(bot_token, "https://api.telegram.org".to_string())
    }

    pub fn with_api_url(bot_token: String, api_url: String) -> Self {
        Self {
            http: Client::new(),
            bot_token,
            api_url,
        }
    }

    fn has_token(&self) -> bool {
        !self.bot_token.trim().is_empty()
    }
}

#[async_trait]
impl NotificationChannel for TelegramClient {
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), AlarmError> {
        if !self.has_token() {
            return Err(AlarmError::Delivery("TELEGRAM_BOT_TOKEN is not set".to_string()));
        }

        let url = format!(
            "{}/bot{}/sendMessage",
            self.api_url.trim_end_matches('/'),
            self.bot_token
        );
        let res = self
            .http
            .post(url)
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await
            .map_err(|e| AlarmError::Delivery(e.without_url().to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(AlarmError::Delivery(format!("telegram sendMessage failed: {status} {body}")));
        }

        Ok(())
    }
}
