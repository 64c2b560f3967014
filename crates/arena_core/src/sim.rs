use crate::beam;
use crate::events::GameEvent;
use crate::player::InputState;
use crate::shop::{self, PowerUp, PurchaseError};
use crate::state::{MatchPhase, MatchState};
use crate::systems;
use crate::types::{TilePos, UserId};
use rand::rngs::StdRng;
use slotmap::Key;
use std::collections::HashMap;

/// Tile-ownership changes produced by one tick, for the delta broadcast.
#[derive(Clone, Debug, Default)]
pub struct TickDelta {
    pub changed_tiles: Vec<(TilePos, Option<UserId>)>,
}

/// Merge a player's held-key state. Dropped silently unless the match is
/// playing and the player is seated.
pub fn handle_input(state: &mut MatchState, user_id: &str, input: InputState) {
    if state.phase != MatchPhase::Playing {
        return;
    }
    if let Some(player) = state.players.get_mut(user_id) {
        player.input = input;
    }
}

/// Handle a shot request. Energy is debited before the muzzle check, so
/// firing point-blank into a wall still costs energy and emits nothing.
pub fn handle_shoot(
    state: &mut MatchState,
    user_id: &str,
    dir_x: f64,
    dir_y: f64,
    out_events: &mut Vec<GameEvent>,
) {
    if state.phase != MatchPhase::Playing {
        return;
    }
    let shot_cost = state.config.shot_cost;
    let (px, py, color, multishot, speed) = {
        let Some(player) = state.players.get_mut(user_id) else {
            return;
        };
        if player.energy < shot_cost {
            return;
        }
        player.energy -= shot_cost;
        let speed = if player.has_beam_speed {
            state.config.beam_speed_boosted
        } else {
            state.config.beam_speed
        };
        (
            player.x,
            player.y,
            player.color.to_string(),
            player.has_multishot,
            speed,
        )
    };

    let owner: UserId = user_id.to_string();
    for (dx, dy) in beam::spread_directions(dir_x, dir_y, multishot) {
        if let Some(new_beam) = beam::spawn_beam(&state.grid, &owner, &color, px, py, dx, dy, speed)
        {
            let id = state.beams.insert(new_beam.clone());
            out_events.push(GameEvent::BeamFired {
                id: id.data().as_ffi(),
                beam: new_beam,
            });
        }
    }
}

/// Purchase a power-up for a seated player. Synchronous and atomic against
/// the player record.
pub fn buy_powerup(
    state: &mut MatchState,
    user_id: &str,
    power: PowerUp,
) -> Result<u32, PurchaseError> {
    if state.phase != MatchPhase::Playing {
        return Err(PurchaseError::GameNotPlaying);
    }
    let player = state
        .players
        .get_mut(user_id)
        .ok_or(PurchaseError::NotInGame)?;
    shop::purchase(player, power)
}

/// Advance the match by one tick. Returns the ownership delta, or `None`
/// when the match is not playing or just finished (the game-over event
/// replaces the delta for that tick).
pub fn step(
    state: &mut MatchState,
    dt: f64,
    rng: &mut StdRng,
    out_events: &mut Vec<GameEvent>,
) -> Option<TickDelta> {
    if state.phase != MatchPhase::Playing {
        return None;
    }

    state.tick += 1;

    if let Some(remaining) = state.time_remaining_ms {
        let remaining = remaining.saturating_sub(state.config.tick_interval_ms());
        state.time_remaining_ms = Some(remaining);
        if remaining == 0 {
            finish(state, out_events);
            return None;
        }
    }

    let snapshot = state.owners.clone();

    systems::move_players(state, dt);
    systems::apply_glow(state);
    systems::update_beams(state, dt, out_events);
    systems::apply_income(state, dt);
    systems::spawn_drops(state, rng, out_events);
    systems::collect_pickups(state, out_events);

    let changed_tiles = diff_ownership(&snapshot, &state.owners);
    Some(TickDelta { changed_tiles })
}

fn diff_ownership(
    before: &HashMap<TilePos, Option<UserId>>,
    after: &HashMap<TilePos, Option<UserId>>,
) -> Vec<(TilePos, Option<UserId>)> {
    after
        .iter()
        .filter(|(pos, owner)| before.get(*pos) != Some(*owner))
        .map(|(pos, owner)| (*pos, owner.clone()))
        .collect()
}

/// Percentage of capturable tiles held, rounded to one decimal, in join
/// order.
pub fn scores(state: &MatchState) -> Vec<(UserId, f64)> {
    let total = state.capturable_total().max(1) as f64;
    state
        .player_ids_in_join_order()
        .into_iter()
        .map(|user_id| {
            let owned = state.owned_count(&user_id) as f64;
            let score = (100.0 * owned / total * 10.0).round() / 10.0;
            (user_id, score)
        })
        .collect()
}

/// End the match: compute scores, pick the winner (ties go to the earliest
/// joiner), emit the game-over event.
pub fn finish(state: &mut MatchState, out_events: &mut Vec<GameEvent>) {
    state.phase = MatchPhase::Finished;
    let scores = scores(state);
    let mut winner_id: Option<UserId> = None;
    let mut best = f64::NEG_INFINITY;
    for (user_id, score) in &scores {
        if *score > best {
            best = *score;
            winner_id = Some(user_id.clone());
        }
    }
    out_events.push(GameEvent::GameEnded { winner_id, scores });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArenaConfig;
    use crate::mapgen::GeneratedMap;
    use crate::tile::{TileGrid, TileKind};
    use rand::SeedableRng;

    fn playing_state(players: &[&str]) -> MatchState {
        let grid = TileGrid::new(30, 30);
        let map = GeneratedMap {
            grid,
            generators: vec![],
            spawn_points: vec![(5, 5), (24, 5), (5, 24), (24, 24)],
        };
        let mut state = MatchState::new(
            1,
            "TESTBB".to_string(),
            players.first().copied().unwrap_or("host").to_string(),
            false,
            true,
            map,
            ArenaConfig::default(),
        );
        for (i, uid) in players.iter().enumerate() {
            state.add_player(uid.to_string(), format!("P{i}"), None);
        }
        state.begin();
        state
    }

    #[test]
    fn shooting_costs_energy_and_spawns_a_beam() {
        let mut state = playing_state(&["p0", "p1"]);
        let mut events = Vec::new();
        handle_shoot(&mut state, "p0", 1.0, 0.0, &mut events);
        assert_eq!(state.players["p0"].energy, 80.0);
        assert_eq!(state.beams.len(), 1);
        assert!(matches!(events[0], GameEvent::BeamFired { .. }));
    }

    #[test]
    fn muzzle_blocked_shot_still_drains_energy() {
        let mut state = playing_state(&["p0", "p1"]);
        // Wall directly in front of the shooter's muzzle.
        let (px, py) = (state.players["p0"].x, state.players["p0"].y);
        state
            .grid
            .set(crate::tile::tile_index(px + 1.0), crate::tile::tile_index(py), TileKind::Wall);
        let mut events = Vec::new();
        handle_shoot(&mut state, "p0", 1.0, 0.0, &mut events);
        assert_eq!(state.players["p0"].energy, 80.0);
        assert!(state.beams.is_empty());
        assert!(events.is_empty());
    }

    #[test]
    fn exhausted_players_cannot_shoot() {
        let mut state = playing_state(&["p0", "p1"]);
        state.players.get_mut("p0").unwrap().energy = 10.0;
        let mut events = Vec::new();
        handle_shoot(&mut state, "p0", 1.0, 0.0, &mut events);
        assert_eq!(state.players["p0"].energy, 10.0);
        assert!(state.beams.is_empty());
    }

    #[test]
    fn multishot_spawns_three_beams() {
        let mut state = playing_state(&["p0", "p1"]);
        state.players.get_mut("p0").unwrap().has_multishot = true;
        let mut events = Vec::new();
        handle_shoot(&mut state, "p0", 0.0, 1.0, &mut events);
        assert_eq!(state.beams.len(), 3);
    }

    #[test]
    fn buying_requires_a_playing_match() {
        let mut state = playing_state(&["p0", "p1"]);
        state.phase = MatchPhase::Waiting;
        assert_eq!(
            buy_powerup(&mut state, "p0", PowerUp::Speed),
            Err(PurchaseError::GameNotPlaying)
        );
        state.begin();
        assert_eq!(
            buy_powerup(&mut state, "ghost", PowerUp::Speed),
            Err(PurchaseError::NotInGame)
        );
    }

    #[test]
    fn step_reports_glow_captures_in_the_delta() {
        let mut state = playing_state(&["p0", "p1"]);
        let mut rng = StdRng::seed_from_u64(0);
        let mut events = Vec::new();
        let delta = step(&mut state, 0.05, &mut rng, &mut events).expect("delta");
        // Both players glow-capture around their spawns on the first tick.
        assert!(delta
            .changed_tiles
            .iter()
            .any(|(pos, owner)| *pos == (5, 5) && owner.as_deref() == Some("p0")));
        assert!(!delta.changed_tiles.is_empty());

        // A second tick with no movement changes nothing.
        let delta = step(&mut state, 0.05, &mut rng, &mut events).expect("delta");
        assert!(delta.changed_tiles.is_empty());
    }

    #[test]
    fn clock_expiry_finishes_the_match_with_scores() {
        let mut state = playing_state(&["p0", "p1"]);
        state.time_remaining_ms = Some(50);
        // Hand p0 a lead before the clock runs out.
        state.owners.insert((8, 8), Some("p0".to_string()));

        let mut rng = StdRng::seed_from_u64(0);
        let mut events = Vec::new();
        let delta = step(&mut state, 0.05, &mut rng, &mut events);
        assert!(delta.is_none());
        assert_eq!(state.phase, MatchPhase::Finished);

        let Some(GameEvent::GameEnded { winner_id, scores }) = events.last() else {
            panic!("expected a game-ended event");
        };
        assert_eq!(winner_id.as_deref(), Some("p0"));
        assert_eq!(scores.len(), 2);
    }

    #[test]
    fn solo_matches_never_time_out() {
        let grid = TileGrid::new(30, 30);
        let map = GeneratedMap {
            grid,
            generators: vec![],
            spawn_points: vec![(5, 5), (24, 5), (5, 24), (24, 24)],
        };
        let mut state = MatchState::new(
            2,
            "SOLOYY".to_string(),
            "p0".to_string(),
            true,
            false,
            map,
            ArenaConfig::default(),
        );
        state.add_player("p0".to_string(), "P0".to_string(), None);
        state.begin();

        let mut rng = StdRng::seed_from_u64(0);
        let mut events = Vec::new();
        for _ in 0..100 {
            assert!(step(&mut state, 0.05, &mut rng, &mut events).is_some());
        }
        assert_eq!(state.phase, MatchPhase::Playing);
        assert_eq!(state.time_remaining_ms, None);
    }

    #[test]
    fn scores_round_to_one_decimal() {
        let mut state = playing_state(&["p0", "p1", "p2", "p3"]);
        // 30×30 open grid: 900 capturable tiles.
        assert_eq!(state.capturable_total(), 900);
        let positions: Vec<TilePos> = state.owners.keys().copied().collect();
        let (mut a, mut b, mut c) = (120, 80, 50);
        for pos in positions {
            let owner = if a > 0 {
                a -= 1;
                Some("p0")
            } else if b > 0 {
                b -= 1;
                Some("p1")
            } else if c > 0 {
                c -= 1;
                Some("p2")
            } else {
                None
            };
            if let Some(owner) = owner {
                state.owners.insert(pos, Some(owner.to_string()));
            }
        }

        let scores = scores(&state);
        let lookup: HashMap<_, _> = scores.iter().cloned().collect();
        assert_eq!(lookup["p0"], 13.3);
        assert_eq!(lookup["p1"], 8.9);
        assert_eq!(lookup["p2"], 5.6);
        assert_eq!(lookup["p3"], 0.0);

        let mut events = Vec::new();
        finish(&mut state, &mut events);
        let Some(GameEvent::GameEnded { winner_id, .. }) = events.last() else {
            panic!("expected a game-ended event");
        };
        assert_eq!(winner_id.as_deref(), Some("p0"));
    }
}
