use crate::match_handle::MatchHandle;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

/// Drive one match actor from spawn to retirement. The loop idles through
/// the waiting lobby, paces the simulation at the match's tick rate while
/// it plays, and after a natural finish keeps the actor open briefly so
/// subscribers can drain the game-over broadcast.
///
/// The timer only paces the loop; a delayed or skipped firing never slows
/// the game clock, since `step_one_tick` derives dt from the monotonic
/// clock instead of counting timer firings.
pub async fn run_match_actor(handle: MatchHandle, finished_linger: Duration) {
    let pace = Duration::from_secs_f64(1.0 / handle.tick_hz() as f64);
    let mut timer = interval(pace);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        timer.tick().await;

        if handle.should_shutdown() {
            // Polite stop: an abandoned lobby, the janitor, or registry
            // teardown. Any game-over broadcast already went out, so the
            // actor retires without a linger.
            return;
        }
        if handle.step_one_tick().await {
            break;
        }
    }

    // Clock ran out. Hold the actor so late subscribers still see the
    // game-over broadcast; with nobody seated there is nothing to drain.
    if handle.info().await.player_count > 0 {
        tokio::time::sleep(finished_linger).await;
    }
}
