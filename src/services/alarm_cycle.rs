use std::collections::BTreeMap;

use chrono::Utc;
use futures_util::{stream, StreamExt};
use serde::Serialize;

use crate::{
    error::AlarmError,
    models::Watch,
    services::{
        destination_directory::DestinationBook,
        dispatch_service::{self, OutcomeStatus, WatchOutcome},
        price_resolver::{self, ResolvedPrices},
        state_updater,
    },
    AppState,
};

/// Result of one evaluation cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleSummary {
    pub checked: usize,
    pub outcomes: Vec<WatchOutcome>,
    /// Resolved price per `SYMBOL:market` group.
    pub prices: BTreeMap<String, f64>,
    pub price_errors: BTreeMap<String, String>,
}

impl CycleSummary {
    pub fn fired(&self) -> usize {
        self.outcomes.iter().filter(|o| o.triggered).count()
    }

    pub fn sent(&self) -> usize {
        self.outcomes.iter().filter(|o| o.sent).count()
    }

    pub fn outcome(&self, id: &str) -> Option<&WatchOutcome> {
        self.outcomes.iter().find(|o| o.id == id)
    }
}

pub fn authorize(expected: Option<&str>, supplied: Option<&str>) -> Result<(), AlarmError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    match supplied {
        Some(s) if s == expected => Ok(()),
        Some(_) => Err(AlarmError::Authorization("cron secret mismatch".to_string())),
        None => Err(AlarmError::Authorization("cron secret missing".to_string())),
    }
}

/// Entry point for the scheduler. Rejects the cycle outright on a bad secret
/// or missing configuration; otherwise always returns a summary.
pub async fn run_cycle(state: &AppState, secret: Option<&str>) -> Result<CycleSummary, AlarmError> {
    authorize(state.settings.cron_secret.as_deref(), secret)?;

    let missing = state.settings.missing_required();
    if !missing.is_empty() {
        return Err(AlarmError::Configuration(format!(
            "missing env: {}",
            missing.join(", ")
        )));
    }

    let (watches, links) = tokio::try_join!(
        state.watches.list_active(),
        state.destinations.verified_links(),
    )?;

    if watches.is_empty() {
        return Ok(CycleSummary::default());
    }

    let book = DestinationBook::build(links, state.settings.telegram_demo_chat_id.clone());
    let summary = evaluate_batch(state, &book, &watches).await;

    tracing::info!(
        checked = summary.checked,
        groups = summary.prices.len() + summary.price_errors.len(),
        fired = summary.fired(),
        sent = summary.sent(),
        "alarm cycle finished"
    );

    Ok(summary)
}

async fn evaluate_batch(state: &AppState, book: &DestinationBook, watches: &[Watch]) -> CycleSummary {
    let resolved =
        price_resolver::resolve_prices(state.prices.as_ref(), watches, state.settings.price_timeout())
            .await;

    let now = Utc::now().timestamp();
    // bounded so a large fire batch does not trip the channel's rate limit;
    // `buffered` keeps outcomes in load order
    let outcomes: Vec<WatchOutcome> = stream::iter(watches)
        .map(|w| process_watch(state, book, &resolved, w, now))
        .boxed()
        .buffered(state.settings.dispatch_concurrency())
        .collect()
        .await;

    let mut prices = BTreeMap::new();
    let mut price_errors = BTreeMap::new();
    for (key, res) in resolved {
        match res {
            Ok(p) => {
                prices.insert(key.to_string(), p);
            }
            Err(e) => {
                price_errors.insert(key.to_string(), e.reason().to_string());
            }
        }
    }

    CycleSummary {
        checked: watches.len(),
        outcomes,
        prices,
        price_errors,
    }
}

async fn process_watch(
    state: &AppState,
    book: &DestinationBook,
    resolved: &ResolvedPrices,
    watch: &Watch,
    now: i64,
) -> WatchOutcome {
    let current = match resolved.get(&watch.group_key()) {
        Some(Ok(p)) => *p,
        Some(Err(e)) => {
            return WatchOutcome::new(watch, None, OutcomeStatus::NoPriceAvailable)
                .with_error(e.clone());
        }
        None => return WatchOutcome::new(watch, None, OutcomeStatus::NoPriceAvailable),
    };

    let applied = state_updater::apply(state.watches.as_ref(), watch, current, now).await;

    match (applied.triggered, applied.persisted) {
        (triggered, Err(e)) => {
            let mut outcome = WatchOutcome::new(watch, Some(current), OutcomeStatus::PersistFailed);
            outcome.triggered = triggered;
            outcome.with_error(e)
        }
        (false, Ok(())) => {
            let mut outcome = WatchOutcome::new(watch, Some(current), OutcomeStatus::NotTriggered);
            outcome.persisted = true;
            outcome
        }
        // state is durable before anything is sent
        (true, Ok(())) => {
            dispatch_service::dispatch(
                state.notifier.as_ref(),
                book,
                watch,
                current,
                state.settings.send_timeout(),
            )
            .await
        }
    }
}
