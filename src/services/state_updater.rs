use crate::{
    error::AlarmError,
    models::{Watch, WatchUpdate},
    services::{crossing, watch_repository::WatchRepository},
};

/// Verdict for one watch plus the write it implies.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub triggered: bool,
    pub update: WatchUpdate,
}

/// Stages the single update a watch receives this cycle.
///
/// `last_price` is always refreshed so the next tick has a baseline. A fire
/// stamps `fired_at`; one-shot watches also switch themselves off.
pub fn evaluate(watch: &Watch, current: f64, now: i64) -> Evaluation {
    let triggered = crossing::decide(watch.direction, watch.target_price, watch.last_price, current);

    let update = if triggered {
        WatchUpdate {
            last_price: current,
            fired_at: Some(now),
            active: (!watch.repeat).then_some(false),
        }
    } else {
        WatchUpdate {
            last_price: current,
            fired_at: None,
            active: None,
        }
    };

    Evaluation { triggered, update }
}

#[derive(Debug)]
pub struct Applied {
    pub triggered: bool,
    pub persisted: Result<(), AlarmError>,
}

/// Evaluates and persists one watch. Persistence failures are returned to the
/// caller, never retried here.
pub async fn apply(repo: &dyn WatchRepository, watch: &Watch, current: f64, now: i64) -> Applied {
    let Evaluation { triggered, update } = evaluate(watch, current, now);

    let persisted = repo.update_one(watch.id, &update).await.map_err(|e| match e {
        AlarmError::Persistence(_) => e,
        other => AlarmError::Persistence(other.reason().to_string()),
    });

    if let Err(e) = &persisted {
        tracing::warn!(id = %watch.id, triggered, "watch update failed: {e}");
    }

    Applied { triggered, persisted }
}
