use std::{env, time::Duration};

#[derive(Debug, Clone)]
pub struct Settings {
    pub mongodb_uri: String,
    pub mongodb_db: String,
    pub host: String,
    pub port: u16,

    // shared secret the scheduler must present; unchecked when None
    pub cron_secret: Option<String>,

    pub telegram_bot_token: String,
    pub telegram_demo_chat_id: Option<String>,
    pub telegram_webhook_secret: Option<String>,

    pub binance_spot_url: String,
    pub binance_futures_url: String,
    pub binance_spot_fallback_url: Option<String>,
    pub binance_futures_fallback_url: Option<String>,

    pub price_timeout_ms: u64,
    pub send_timeout_ms: u64,
    // watches persisted/dispatched at once; keeps Telegram under its rate limit
    pub dispatch_concurrency: usize,

    // 0 disables the in-process scheduler
    pub monitor_interval_secs: u64,
}

impl Settings {
    /// Names of the settings a cycle cannot run without.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.mongodb_uri.trim().is_empty() {
            missing.push("MONGODB_URI");
        }
        if self.telegram_bot_token.trim().is_empty() {
            missing.push("TELEGRAM_BOT_TOKEN");
        }
        missing
    }

    pub fn telegram_configured(&self) -> bool {
        !self.telegram_bot_token.trim().is_empty()
    }

    pub fn price_timeout(&self) -> Duration {
        Duration::from_millis(self.price_timeout_ms)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn dispatch_concurrency(&self) -> usize {
        self.dispatch_concurrency.max(1)
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn number<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse::<T>().ok())
        .unwrap_or(default)
}

pub fn load() -> Settings {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    let mongodb_uri = env::var("MONGODB_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

    let mongodb_db = env::var("MONGODB_DB")
        .unwrap_or_else(|_| "pricewatch".to_string());

    let host = env::var("HOST")
        .unwrap_or_else(|_| "127.0.0.1".to_string());

    let binance_spot_url = env::var("BINANCE_SPOT_URL")
        .unwrap_or_else(|_| "https://api.binance.com".to_string());
    let binance_futures_url = env::var("BINANCE_FUTURES_URL")
        .unwrap_or_else(|_| "https://fapi.binance.com".to_string());

    // binance.vision mirrors spot market data outside the geo-blocked hosts
    let binance_spot_fallback_url = optional("BINANCE_SPOT_FALLBACK_URL")
        .or_else(|| Some("https://data-api.binance.vision".to_string()));

    Settings {
        mongodb_uri,
        mongodb_db,
        host,
        port: number("PORT", 3000),
        cron_secret: optional("CRON_SECRET"),
        telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
        telegram_demo_chat_id: optional("TELEGRAM_DEMO_CHAT_ID"),
        telegram_webhook_secret: optional("TELEGRAM_WEBHOOK_SECRET"),
        binance_spot_url,
        binance_futures_url,
        binance_spot_fallback_url,
        binance_futures_fallback_url: optional("BINANCE_FUTURES_FALLBACK_URL"),
        price_timeout_ms: number("PRICE_TIMEOUT_MS", 5_000),
        send_timeout_ms: number("SEND_TIMEOUT_MS", 5_000),
        dispatch_concurrency: number("DISPATCH_CONCURRENCY", 8),
        monitor_interval_secs: number("MONITOR_INTERVAL_SECS", 0),
    }
}
