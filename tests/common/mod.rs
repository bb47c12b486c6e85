#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use pricewatch::{
    config,
    error::AlarmError,
    models::{Direction, MarketSegment, TelegramLink, Watch, WatchUpdate},
    services::{
        binance::{BinanceClient, PriceOracle}, destination_directory::DestinationDirectory,
        telegram::NotificationChannel, watch_repository::WatchRepository,
    },
    AppState,
};

pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn watch(symbol: &str, market: MarketSegment, direction: Direction, target: f64) -> Watch {
    Watch {
        id: ObjectId::new(),
        user_id: ObjectId::new(),
        symbol: symbol.to_string(),
        market_type: market,
        direction,
        target_price: target,
        repeat: false,
        note: None,
        active: true,
        created_at: 1_700_000_000,
        fired_at: None,
        last_price: None,
    }
}

pub fn seeded(mut w: Watch, last_price: f64) -> Watch {
    w.last_price = Some(last_price);
    w
}

pub fn repeating(mut w: Watch) -> Watch {
    w.repeat = true;
    w
}

// ---------------- Watch store ----------------

#[derive(Default)]
pub struct FakeWatchRepo {
    watches: Mutex<Vec<Watch>>,
    failing: Mutex<HashSet<ObjectId>>,
    pub list_fails: Mutex<bool>,
    pub writes: Mutex<Vec<(ObjectId, WatchUpdate)>>,
    journal: Journal,
}

impl FakeWatchRepo {
    pub fn new(watches: Vec<Watch>, journal: Journal) -> Arc<Self> {
        Arc::new(Self {
            watches: Mutex::new(watches),
            journal,
            ..Default::default()
        })
    }

    pub fn fail_updates_for(&self, id: ObjectId) {
        self.failing.lock().unwrap().insert(id);
    }

    pub fn get(&self, id: ObjectId) -> Watch {
        self.watches
            .lock()
            .unwrap()
            .iter()
            .find(|w| w.id == id)
            .cloned()
            .expect("watch exists")
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }
}

#[async_trait]
impl WatchRepository for FakeWatchRepo {
    async fn list_active(&self) -> Result<Vec<Watch>, AlarmError> {
        if *self.list_fails.lock().unwrap() {
            return Err(AlarmError::Store("connection refused".to_string()));
        }
        Ok(self
            .watches
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.active)
            .cloned()
            .collect())
    }

    async fn update_one(&self, id: ObjectId, update: &WatchUpdate) -> Result<(), AlarmError> {
        if self.failing.lock().unwrap().contains(&id) {
            return Err(AlarmError::Persistence("write conflict".to_string()));
        }

        let mut watches = self.watches.lock().unwrap();
        let w = watches
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| AlarmError::Persistence("not found".to_string()))?;

        w.last_price = Some(update.last_price);
        if let Some(at) = update.fired_at {
            w.fired_at = Some(at);
        }
        if let Some(active) = update.active {
            w.active = active;
        }

        self.writes.lock().unwrap().push((id, update.clone()));
        self.journal.lock().unwrap().push(format!("persist:{}", id.to_hex()));
        Ok(())
    }
}

// ---------------- Price oracle ----------------

#[derive(Default)]
pub struct FakeOracle {
    prices: Mutex<HashMap<(String, MarketSegment), Result<f64, String>>>,
    pub calls: Mutex<Vec<(String, MarketSegment)>>,
    pub delay: Mutex<Option<Duration>>,
}

impl FakeOracle {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, symbol: &str, market: MarketSegment, price: f64) {
        self.prices
            .lock()
            .unwrap()
            .insert((symbol.to_string(), market), Ok(price));
    }

    pub fn fail(&self, symbol: &str, market: MarketSegment, reason: &str) {
        self.prices
            .lock()
            .unwrap()
            .insert((symbol.to_string(), market), Err(reason.to_string()));
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PriceOracle for FakeOracle {
    async fn get_price(&self, symbol: &str, market: MarketSegment) -> Result<f64, AlarmError> {
        self.calls.lock().unwrap().push((symbol.to_string(), market));

        let delay = *self.delay.lock().unwrap();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }

        let res = self
            .prices
            .lock()
            .unwrap()
            .get(&(symbol.to_string(), market))
            .cloned();
        match res {
            Some(Ok(p)) => Ok(p),
            Some(Err(reason)) => Err(AlarmError::PriceResolution(reason)),
            None => Err(AlarmError::PriceResolution(format!("unknown symbol {symbol}"))),
        }
    }
}

// ---------------- Destinations ----------------

#[derive(Default)]
pub struct FakeDirectory {
    pub links: Mutex<Vec<TelegramLink>>,
}

impl FakeDirectory {
    pub fn new(links: Vec<TelegramLink>) -> Arc<Self> {
        Arc::new(Self {
            links: Mutex::new(links),
        })
    }
}

#[async_trait]
impl DestinationDirectory for FakeDirectory {
    async fn verified_links(&self) -> Result<Vec<TelegramLink>, AlarmError> {
        Ok(self.links.lock().unwrap().clone())
    }
}

pub fn link(user_id: ObjectId, chat_id: &str) -> TelegramLink {
    TelegramLink {
        user_id,
        chat_id: chat_id.to_string(),
        verified: Some(true),
    }
}

// ---------------- Notification channel ----------------

#[derive(Default)]
pub struct FakeNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
    pub delay: Mutex<Option<Duration>>,
    failing: Mutex<HashSet<String>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    journal: Journal,
}

impl FakeNotifier {
    pub fn new(journal: Journal) -> Arc<Self> {
        Arc::new(Self {
            journal,
            ..Default::default()
        })
    }

    pub fn fail_for(&self, chat_id: &str) {
        self.failing.lock().unwrap().insert(chat_id.to_string());
    }

    pub fn sent_to(&self, chat_id: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| c == chat_id)
            .map(|(_, t)| t.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationChannel for FakeNotifier {
    async fn send(&self, address: &str, text: &str) -> Result<(), AlarmError> {
        self.journal.lock().unwrap().push(format!("send:{address}"));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.lock().unwrap().contains(address) {
            return Err(AlarmError::Delivery("chat not found".to_string()));
        }

        self.sent
            .lock()
            .unwrap()
            .push((address.to_string(), text.to_string()));
        Ok(())
    }
}

// ---------------- State ----------------

pub struct Harness {
    pub state: AppState,
    pub repo: Arc<FakeWatchRepo>,
    pub oracle: Arc<FakeOracle>,
    pub directory: Arc<FakeDirectory>,
    pub notifier: Arc<FakeNotifier>,
    pub journal: Journal,
}

pub fn test_settings() -> config::Settings {
    let mut settings = config::load();
    settings.mongodb_uri = "mongodb://localhost:27017".to_string();
    settings.cron_secret = None;
    settings.telegram_bot_token = "test-token".to_string();
    settings.telegram_demo_chat_id = None;
    settings.telegram_webhook_secret = None;
    settings.price_timeout_ms = 1_000;
    settings.send_timeout_ms = 1_000;
    settings.monitor_interval_secs = 0;
    settings
}

pub fn harness(watches: Vec<Watch>, links: Vec<TelegramLink>) -> Harness {
    harness_with(test_settings(), watches, links)
}

pub fn harness_with(settings: config::Settings, watches: Vec<Watch>, links: Vec<TelegramLink>) -> Harness {
    let journal: Journal = Arc::new(Mutex::new(Vec::new()));
    let repo = FakeWatchRepo::new(watches, journal.clone());
    let oracle = FakeOracle::new();
    let directory = FakeDirectory::new(links);
    let notifier = FakeNotifier::new(journal.clone());

    let state = AppState {
        settings,
        watches: repo.clone(),
        destinations: directory.clone(),
        prices: oracle.clone(),
        // nothing listens here; market data tests swap in a local upstream
        market_data: Arc::new(BinanceClient::new(
            "http://127.0.0.1:9".to_string(),
            "http://127.0.0.1:9".to_string(),
            None,
            None,
        )),
        notifier: notifier.clone(),
    };

    Harness {
        state,
        repo,
        oracle,
        directory,
        notifier,
        journal,
    }
}
