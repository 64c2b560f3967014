//! Headless arena demo: spins up a registry, runs one match with bot
//! players wandering and shooting, and prints the event stream.

use arena_core::{ArenaConfig, InputState, MatchPhase};
use arena_server::{
    janitor, InMemoryRepository, MatchHandle, MatchOptions, MatchRegistry, ServerConfig,
    ServerMessage, UserProfile,
};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "arena-demo")]
#[command(about = "Run one headless territory-control match")]
struct Args {
    /// Map seed; omit for a random map.
    #[arg(long)]
    seed: Option<u64>,

    /// Match length in seconds.
    #[arg(long, default_value = "20")]
    duration_secs: u64,

    /// Run a single-player match instead of two bots.
    #[arg(long)]
    solo: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config = ServerConfig {
        arena: ArenaConfig {
            match_duration_ms: args.duration_secs * 1000,
            ..ArenaConfig::default()
        },
        ..ServerConfig::default()
    };
    let repo = Arc::new(InMemoryRepository::new());
    let registry = Arc::new(MatchRegistry::new(config, repo));
    let janitor_task = janitor::spawn_janitor(Arc::clone(&registry));

    let host = bot_profile("ada");
    let handle = registry
        .create_match(
            &host,
            MatchOptions {
                is_public: true,
                is_solo: args.solo,
            },
            args.seed,
        )
        .await
        .expect("create match");
    let match_id = handle.match_id();

    let state = handle.join(&host).await.expect("host join");
    println!(
        "match {} (code {}): {} capturable tiles",
        match_id,
        state.code,
        state.tile_owners.len()
    );

    if !args.solo {
        handle.join(&bot_profile("grace")).await.expect("guest join");
    }

    let printer = tokio::spawn(print_events(handle.clone()));

    handle.start_game("ada").await.expect("start");

    let bots = if args.solo {
        vec![tokio::spawn(run_bot(handle.clone(), "ada"))]
    } else {
        vec![
            tokio::spawn(run_bot(handle.clone(), "ada")),
            tokio::spawn(run_bot(handle.clone(), "grace")),
        ]
    };

    // Solo matches have no clock, so end them ourselves.
    if args.solo {
        sleep(Duration::from_secs(args.duration_secs)).await;
        handle.force_finish().await;
    }
    while handle.phase().await != MatchPhase::Finished {
        sleep(Duration::from_millis(250)).await;
    }

    for bot in bots {
        bot.abort();
    }
    printer.abort();

    let final_state = handle.full_state().await;
    println!("\n=== final standings ===");
    let mut owned: Vec<(String, usize)> = final_state
        .players
        .keys()
        .map(|uid| {
            let count = final_state
                .tile_owners
                .values()
                .filter(|owner| owner.as_deref() == Some(uid))
                .count();
            (uid.clone(), count)
        })
        .collect();
    owned.sort_by(|a, b| b.1.cmp(&a.1));
    for (uid, count) in owned {
        println!("{uid:>8}: {count} tiles");
    }

    janitor_task.abort();
    registry.shutdown().await;
}

fn bot_profile(name: &str) -> UserProfile {
    UserProfile {
        user_id: name.to_string(),
        display_name: name.to_uppercase(),
        avatar_url: None,
    }
}

/// Simple bot: wander in a rotating direction, shoot every second.
async fn run_bot(handle: MatchHandle, user_id: &'static str) {
    let headings = [
        (InputState { w: false, a: false, s: false, d: true }, (1.0, 0.0)),
        (InputState { w: false, a: false, s: true, d: false }, (0.0, 1.0)),
        (InputState { w: false, a: true, s: false, d: false }, (-1.0, 0.0)),
        (InputState { w: true, a: false, s: false, d: false }, (0.0, -1.0)),
    ];

    let mut step = 0usize;
    loop {
        let (input, (dx, dy)) = headings[step % headings.len()];
        handle.set_input(user_id, input).await;
        handle.shoot(user_id, dx, dy).await;
        step += 1;
        sleep(Duration::from_secs(1)).await;
    }
}

async fn print_events(handle: MatchHandle) {
    use tokio::sync::broadcast::error::RecvError;

    let mut rx = handle.subscribe().await;
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        };
        match &event.message {
            ServerMessage::GameStarted { time_remaining_ms } => {
                println!("[{:>5}] game started ({time_remaining_ms:?} ms)", event.tick);
            }
            ServerMessage::BeamFired { beam } => {
                println!(
                    "[{:>5}] {} fired a beam at ({:.1}, {:.1})",
                    event.tick, beam.owner_id, beam.x, beam.y
                );
            }
            ServerMessage::CoinTelegraph { drop } => {
                println!(
                    "[{:>5}] {} coin telegraphed at ({:.1}, {:.1})",
                    event.tick, drop.kind, drop.x, drop.y
                );
            }
            ServerMessage::CoinCollected {
                user_id, amount, ..
            } => {
                println!("[{:>5}] {user_id} collected {amount:.1} coins", event.tick);
            }
            ServerMessage::PowerupPurchased { user_id, kind } => {
                println!("[{:>5}] {user_id} bought {kind}", event.tick);
            }
            ServerMessage::GameEnded { winner_id, scores, .. } => {
                println!(
                    "[{:>5}] game over, winner: {} scores: {scores:?}",
                    event.tick,
                    winner_id.as_deref().unwrap_or("nobody")
                );
            }
            // Per-tick deltas and the remaining events are too chatty to
            // print.
            _ => {}
        }
    }
}
