//! Periodic manifest refresh.

use std::sync::Arc;
use std::time::Duration;

use gunsmith_manifest::{Refresher, SharedState};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

const SECONDS_PER_HOUR: u64 = 60 * 60;

/// Interval between refreshes; zero hours is treated as one.
#[must_use]
pub fn interval_from_hours(hours: u64) -> Duration {
    Duration::from_secs(hours.max(1).saturating_mul(SECONDS_PER_HOUR))
}

/// One scheduled tick: delete superseded manifests, then refresh.
///
/// Errors are logged and swallowed so the loop keeps going.
pub async fn tick(refresher: &Refresher, state: &SharedState) {
    let purged = state.write().await.purge_old();
    if purged > 0 {
        log::info!("Removed {purged} old manifest(s)");
    }

    if let Err(e) = refresher.run().await {
        if e.is_transient() {
            log::warn!("Manifest refresh failed, will retry next tick: {e}");
        } else {
            log::error!("Manifest refresh failed: {e}");
        }
    }
}

/// Spawn the refresh loop. The first refresh runs one `every` from now;
/// startup has already loaded a manifest.
pub fn spawn(refresher: Arc<Refresher>, state: SharedState, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            log::info!("Scheduled manifest refresh");
            tick(&refresher, &state).await;
        }
    })
}
