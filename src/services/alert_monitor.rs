use std::time::Duration;

use tokio::time;

use crate::{services::alarm_cycle, AppState};

/// Runs the evaluation cycle on a fixed interval inside this process.
/// Does nothing when `MONITOR_INTERVAL_SECS` is 0 (external scheduler only).
pub fn spawn_alarm_monitor(state: AppState) -> Option<tokio::task::JoinHandle<()>> {
    let secs = state.settings.monitor_interval_secs;
    if secs == 0 {
        return None;
    }

    tracing::info!("alarm monitor ticking every {secs}s");

    Some(tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(secs));
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            let secret = state.settings.cron_secret.clone();
            if let Err(e) = alarm_cycle::run_cycle(&state, secret.as_deref()).await {
                tracing::error!("[alarm-monitor] tick error: {e}");
            }
        }
    }))
}
