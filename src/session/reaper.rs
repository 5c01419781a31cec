//! Idle session reaper.

use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;

use super::SessionRegistry;

/// Periodically terminate sessions idle for longer than `idle_timeout`.
///
/// Runs until the process exits; spawn it on its own task.
pub async fn run(registry: Arc<SessionRegistry>, interval: Duration, idle_timeout: Duration) {
    info!(
        "Idle reaper running every {}s (timeout {}s)",
        interval.as_secs(),
        idle_timeout.as_secs()
    );
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick fires immediately; skip it so a fresh boot never reaps
    // sessions that have not had a chance to see traffic.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let reaped = registry.terminate_inactive(idle_timeout).await;
        if reaped.is_empty() {
            debug!("Idle reaper found nothing to do");
        } else {
            info!("Idle reaper terminated {} session(s): {:?}", reaped.len(), reaped);
        }
    }
}
