use crate::registry::MatchRegistry;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;

/// One janitor pass: mark stale waiting/playing matches finished in the
/// repository, then stop their actors. Returns how many were swept.
pub async fn sweep(registry: &MatchRegistry) -> usize {
    let config = registry.config();
    let stale = registry
        .repo()
        .cleanup_stale_matches(config.waiting_max_age, config.playing_max_age);

    for &match_id in &stale {
        if let Some(handle) = registry.lookup(match_id).await {
            handle.force_finish().await;
        }
        if let Err(error) = registry.stop(match_id).await {
            tracing::warn!(match_id, %error, "stale match had no live actor");
        }
    }

    if !stale.is_empty() {
        tracing::info!(count = stale.len(), "janitor swept stale matches");
    }
    stale.len()
}

/// Spawn the periodic janitor task.
pub fn spawn_janitor(registry: Arc<MatchRegistry>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(registry.config().janitor_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // Consume the immediate first tick so the first sweep happens one
        // full interval after startup.
        interval.tick().await;

        loop {
            interval.tick().await;
            sweep(&registry).await;
        }
    })
}
