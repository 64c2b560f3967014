//! Headless simulation runner: steps one match as fast as possible with
//! scripted players, no runtime and no network. Useful for soak-testing the
//! engine and eyeballing balance numbers.
//!
//! Usage: headless_sim [seed] [ticks]

use arena_core::{
    mapgen, sim, ArenaConfig, GameEvent, InputState, MatchPhase, MatchState,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let seed: u64 = args.get(1).and_then(|a| a.parse().ok()).unwrap_or(12345);
    let max_ticks: u64 = args.get(2).and_then(|a| a.parse().ok()).unwrap_or(3600);

    let config = ArenaConfig::default();
    let dt = config.nominal_dt();

    let mut rng = StdRng::seed_from_u64(seed);
    let map = mapgen::generate(config.grid_size, &mut rng);
    let mut state = MatchState::new(
        1,
        "HEADLS".to_string(),
        "bot-0".to_string(),
        false,
        false,
        map,
        config,
    );

    for i in 0..4 {
        state.add_player(format!("bot-{i}"), format!("Bot {i}"), None);
    }
    state.begin();

    println!("=== Arena Simulation ===");
    println!("seed: {seed}, ticks: {max_ticks}, players: 4");
    println!("capturable tiles: {}", state.capturable_total());

    let started = Instant::now();
    let mut events = Vec::new();
    let mut all_events = Vec::new();

    while state.tick < max_ticks && state.phase == MatchPhase::Playing {
        if state.tick % 10 == 0 {
            scramble_inputs(&mut state, &mut rng);
        }
        if state.tick % 25 == 0 {
            let ids = state.player_ids_in_join_order();
            for user_id in ids {
                let dx = rng.gen_range(-1.0..=1.0);
                let dy = rng.gen_range(-1.0..=1.0);
                sim::handle_shoot(&mut state, &user_id, dx, dy, &mut events);
            }
        }

        sim::step(&mut state, dt, &mut rng, &mut events);
        all_events.append(&mut events);
    }

    let elapsed = started.elapsed();
    println!(
        "\nsimulated {} ticks in {:.1} ms ({:.0} ticks/s)",
        state.tick,
        elapsed.as_secs_f64() * 1000.0,
        state.tick as f64 / elapsed.as_secs_f64().max(1e-9)
    );

    println!("\n=== Standings ===");
    for (user_id, score) in sim::scores(&state) {
        println!(
            "{user_id:>8}: {score:>5.1}% ({} tiles, {:.0} coins)",
            state.owned_count(&user_id),
            state.players[&user_id].coins
        );
    }

    print_event_summary(&all_events);
}

fn scramble_inputs(state: &mut MatchState, rng: &mut StdRng) {
    let ids = state.player_ids_in_join_order();
    for user_id in ids {
        let input = InputState {
            w: rng.gen_bool(0.4),
            a: rng.gen_bool(0.4),
            s: rng.gen_bool(0.4),
            d: rng.gen_bool(0.4),
        };
        sim::handle_input(state, &user_id, input);
    }
}

fn print_event_summary(events: &[GameEvent]) {
    let mut beams_fired = 0;
    let mut beams_ended = 0;
    let mut drops_telegraphed = 0;
    let mut drops_spawned = 0;
    let mut pickups = 0;

    for event in events {
        match event {
            GameEvent::BeamFired { .. } => beams_fired += 1,
            GameEvent::BeamEnded { .. } => beams_ended += 1,
            GameEvent::CoinTelegraph { .. } => drops_telegraphed += 1,
            GameEvent::CoinSpawned { .. } => drops_spawned += 1,
            GameEvent::CoinCollected { .. } => pickups += 1,
            GameEvent::GameEnded { .. } => {}
        }
    }

    println!("\n=== Event Summary ===");
    println!("beams fired: {beams_fired}");
    println!("beams ended: {beams_ended}");
    println!("drops telegraphed: {drops_telegraphed}");
    println!("drops spawned: {drops_spawned}");
    println!("pickup events: {pickups}");
}
