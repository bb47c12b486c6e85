//! Library entrypoint for PriceWatch.
//!
//! Integration tests under `tests/` build an `AppState` from in-memory
//! collaborators and drive the cycle and routers directly.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod models;

pub mod services;

pub mod controllers;
pub mod routes;

use services::{
    binance::{MarketData, PriceOracle}, destination_directory::DestinationDirectory,
    telegram::NotificationChannel, watch_repository::WatchRepository,
};

#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub watches: Arc<dyn WatchRepository>,
    pub destinations: Arc<dyn DestinationDirectory>,
    pub prices: Arc<dyn PriceOracle>,
    pub market_data: Arc<dyn MarketData>,
    pub notifier: Arc<dyn NotificationChannel>,
}
