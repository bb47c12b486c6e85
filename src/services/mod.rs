pub mod db_init;
pub mod alert_monitor;

pub mod binance;
pub mod telegram;
pub mod watch_repository;
pub mod destination_directory;

pub mod crossing;
pub mod price_resolver;
pub mod state_updater;
pub mod dispatch_service;
pub mod alarm_cycle;
