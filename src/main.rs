use std::{net::SocketAddr, sync::Arc};

use mongodb::Client;
use tracing_subscriber::EnvFilter;

use pricewatch::{
    config,
    routes,
    services::{
        alert_monitor, binance::BinanceClient, db_init,
        destination_directory::MongoDestinationDirectory, telegram::TelegramClient,
        watch_repository::MongoWatchRepository,
    },
    AppState,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,pricewatch=debug")),
        )
        .init();

    let settings = config::load();

    let missing = settings.missing_required();
    if !missing.is_empty() {
        tracing::warn!("missing env {:?}; alarm cycles will be rejected until set", missing);
    }

    // Mongo connection
    let client = Client::with_uri_str(&settings.mongodb_uri)
        .await
        .expect("Failed to connect to MongoDB");
    let db = client.database(&settings.mongodb_db);

    if let Err(e) = db_init::ensure_indexes(&db).await {
        tracing::warn!("index setup failed: {e}");
    }

    let binance = Arc::new(BinanceClient::from_settings(&settings));
    let state = AppState {
        watches: Arc::new(MongoWatchRepository::new(&db)),
        destinations: Arc::new(MongoDestinationDirectory::new(&db)),
        prices: binance.clone(),
        market_data: binance,
        notifier: Arc::new(TelegramClient::new(settings.telegram_bot_token.clone())),
        settings: settings.clone(),
    };

    alert_monitor::spawn_alarm_monitor(state.clone());

    let app = routes::app(state);

    let ip = settings
        .host
        .parse::<std::net::IpAddr>()
        .expect("HOST must be an IP address");
    let addr = SocketAddr::from((ip, settings.port));
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.expect("bind listener");
    axum::serve(listener, app).await.expect("server error");
}
