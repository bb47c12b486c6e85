use std::time::Duration;

use serde::Serialize;
use tokio::time;

use crate::{
    error::AlarmError,
    models::Watch,
    services::{destination_directory::DestinationBook, telegram::NotificationChannel},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    NoPriceAvailable,
    NotTriggered,
    PersistFailed,
    NoDestination,
    Sent,
    NotSent,
}

/// What happened to one watch during a cycle.
#[derive(Debug, Clone, Serialize)]
pub struct WatchOutcome {
    pub id: String,
    pub user_id: String,
    pub symbol: String,
    pub market_type: String,
    pub direction: String,
    pub target_price: f64,
    pub price: Option<f64>,
    pub triggered: bool,
    pub persisted: bool,
    pub sent: bool,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<AlarmError>,
}

impl WatchOutcome {
    pub fn new(watch: &Watch, price: Option<f64>, status: OutcomeStatus) -> Self {
        Self {
            id: watch.id.to_hex(),
            user_id: watch.user_id.to_hex(),
            symbol: watch.symbol.clone(),
            market_type: watch.market_type.to_string(),
            direction: watch.direction.as_str().to_string(),
            target_price: watch.target_price,
            price,
            triggered: false,
            persisted: false,
            sent: false,
            status,
            error: None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        self.error.as_ref().map(AlarmError::reason)
    }

    pub fn with_error(mut self, error: AlarmError) -> Self {
        self.error = Some(error);
        self
    }
}

pub fn compose_message(watch: &Watch, current: f64) -> String {
    let mut text = format!(
        "[Price alarm] {}\n- {} ({})\n- Target: {}\n- Current: {}\n",
        watch.direction.label(),
        watch.symbol,
        watch.market_type,
        watch.target_price,
        current,
    );

    if let Some(note) = watch.note_text() {
        text.push_str(&format!("\nNote: {note}"));
    }

    text
}

/// Sends the notification for a watch whose fire is already persisted.
/// Exactly one attempt; failures only change the outcome record.
pub async fn dispatch(
    channel: &dyn NotificationChannel,
    book: &DestinationBook,
    watch: &Watch,
    current: f64,
    timeout: Duration,
) -> WatchOutcome {
    let mut outcome = WatchOutcome::new(watch, Some(current), OutcomeStatus::NotSent);
    outcome.triggered = true;
    outcome.persisted = true;

    let Some(chat_id) = book.lookup(&watch.user_id) else {
        tracing::info!(id = %watch.id, "fired but no destination is linked");
        outcome.status = OutcomeStatus::NoDestination;
        return outcome;
    };

    let text = compose_message(watch, current);

    match time::timeout(timeout, channel.send(chat_id, &text)).await {
        Ok(Ok(())) => {
            tracing::info!(id = %watch.id, symbol = %watch.symbol, price = current, "alarm sent");
            outcome.sent = true;
            outcome.status = OutcomeStatus::Sent;
            outcome
        }
        Ok(Err(e)) => {
            tracing::warn!(id = %watch.id, "alarm delivery failed: {e}");
            outcome.with_error(e)
        }
        Err(_) => {
            tracing::warn!(id = %watch.id, "alarm delivery timed out");
            outcome.with_error(AlarmError::Delivery(format!(
                "timed out after {}ms",
                timeout.as_millis()
            )))
        }
    }
}
