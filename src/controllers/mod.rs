pub mod home_controller;
pub mod cron_controller;
pub mod price_controller;
pub mod market_controller;
pub mod telegram_controller;
