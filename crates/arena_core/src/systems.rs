use crate::beam::{self, BeamId};
use crate::events::GameEvent;
use crate::state::{CoinDrop, CoinKind, DropId, MatchState};
use rand::rngs::StdRng;
use rand::Rng;
use slotmap::Key;

/// Move every player and regenerate energy.
pub fn move_players(state: &mut MatchState, dt: f64) {
    let grid = &state.grid;
    let base_speed = state.config.base_speed;
    for player in state.players.values_mut() {
        crate::movement::move_player(player, grid, base_speed, dt);
        player.energy = (player.energy + player.energy_regen() * dt).min(player.max_energy());
    }
}

/// Passive capture around each player. Players are processed in join order,
/// so a tile inside two glows ends up with the later-joined owner.
pub fn apply_glow(state: &mut MatchState) {
    for user_id in state.player_ids_in_join_order() {
        let Some(player) = state.players.get(&user_id) else {
            continue;
        };
        let radius = player.glow_radius();
        let range = radius.ceil() as i16;
        let cx = player.x.floor() as i16;
        let cy = player.y.floor() as i16;

        for dy in -range..=range {
            for dx in -range..=range {
                let dist = ((dx as f64).powi(2) + (dy as f64).powi(2)).sqrt();
                if dist > radius {
                    continue;
                }
                if let Some(owner) = state.owners.get_mut(&(cx + dx, cy + dy)) {
                    *owner = Some(user_id.clone());
                }
            }
        }
    }
}

/// Advance every live beam; captures are applied immediately per beam, so a
/// tile crossed by two beams in one tick belongs to the last one processed.
/// Inactive beams are removed and reported.
pub fn update_beams(state: &mut MatchState, dt: f64, out_events: &mut Vec<GameEvent>) {
    let keys: Vec<BeamId> = state.beams.keys().collect();
    let max_age = state.config.beam_max_age;

    for key in keys {
        let owner = state.beams[key].owner.clone();
        let owner_piercing = state
            .players
            .get(&owner)
            .map(|p| p.has_piercing)
            .unwrap_or(false);

        let outcome = beam::update_beam(&mut state.beams[key], &state.grid, dt, owner_piercing, max_age);

        for pos in outcome.captured {
            if let Some(slot) = state.owners.get_mut(&pos) {
                *slot = Some(owner.clone());
            }
        }

        if outcome.ended {
            state.beams.remove(key);
            out_events.push(GameEvent::BeamEnded {
                id: key.data().as_ffi(),
            });
        }
    }
}

/// Coins per tick: a passive trickle plus generator income, clamped to the
/// coin cap.
pub fn apply_income(state: &mut MatchState, dt: f64) {
    let passive = state.config.passive_income;
    let per_generator = state.config.generator_income;
    let cap = state.config.coin_cap;

    let mut generator_counts: Vec<(String, usize)> = Vec::with_capacity(state.players.len());
    for user_id in state.players.keys() {
        let owned = state
            .generators
            .iter()
            .filter(|g| state.owners.get(*g).map(|o| o.as_deref()) == Some(Some(user_id.as_str())))
            .count();
        generator_counts.push((user_id.clone(), owned));
    }

    for (user_id, owned) in generator_counts {
        if let Some(player) = state.players.get_mut(&user_id) {
            let income = (passive + per_generator * owned as f64) * dt;
            player.coins = (player.coins + income).min(cap);
        }
    }
}

/// Flip telegraphs whose spawn tick arrived, then roll for a new drop.
pub fn spawn_drops(state: &mut MatchState, rng: &mut StdRng, out_events: &mut Vec<GameEvent>) {
    let tick = state.tick;
    for (id, drop) in state.drops.iter_mut() {
        if !drop.spawned && tick >= drop.spawn_at_tick {
            drop.spawned = true;
            out_events.push(GameEvent::CoinSpawned {
                id: id.data().as_ffi(),
            });
        }
    }

    if state.drops.len() >= state.config.max_drops {
        return;
    }
    let per_tick_chance = state.config.drop_spawn_rate / state.config.tick_hz as f64;
    if !rng.gen_bool(per_tick_chance) {
        return;
    }

    let roll: f64 = rng.gen();
    let kind = if roll < 0.6 {
        CoinKind::Bronze
    } else if roll < 0.9 {
        CoinKind::Silver
    } else {
        CoinKind::Gold
    };

    let lo = 10.0;
    let hi = (state.config.grid_size - 11) as f64;
    let drop = CoinDrop {
        kind,
        x: rng.gen_range(lo..=hi),
        y: rng.gen_range(lo..=hi),
        spawn_at_tick: tick + (kind.telegraph_secs() * state.config.tick_hz as f64) as u64,
        spawned: false,
        collected: false,
    };
    let id = state.drops.insert(drop.clone());
    out_events.push(GameEvent::CoinTelegraph {
        id: id.data().as_ffi(),
        drop,
    });
}

/// Award spawned drops to every player in pickup range, splitting the value
/// evenly, then remove the drop.
pub fn collect_pickups(state: &mut MatchState, out_events: &mut Vec<GameEvent>) {
    let radius = state.config.pickup_radius;
    let cap = state.config.coin_cap;
    let order = state.player_ids_in_join_order();

    let ready: Vec<DropId> = state
        .drops
        .iter()
        .filter(|(_, d)| d.spawned && !d.collected)
        .map(|(id, _)| id)
        .collect();

    for id in ready {
        let (dx, dy, value) = {
            let drop = &state.drops[id];
            (drop.x, drop.y, drop.kind.value())
        };

        let collectors: Vec<String> = order
            .iter()
            .filter(|uid| {
                state.players.get(*uid).is_some_and(|p| {
                    let ddx = p.x - dx;
                    let ddy = p.y - dy;
                    (ddx * ddx + ddy * ddy).sqrt() <= radius
                })
            })
            .cloned()
            .collect();

        if collectors.is_empty() {
            continue;
        }

        let share = value / collectors.len() as f64;
        for user_id in collectors {
            if let Some(player) = state.players.get_mut(&user_id) {
                player.coins = (player.coins + share).min(cap);
            }
            out_events.push(GameEvent::CoinCollected {
                id: id.data().as_ffi(),
                user_id,
                amount: share,
            });
        }

        state.drops.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArenaConfig;
    use crate::mapgen::GeneratedMap;
    use crate::state::MatchState;
    use crate::tile::{TileGrid, TileKind};
    use rand::SeedableRng;

    /// A bare arena: open grid, one generator at (5,5), spawns in corners.
    fn bare_state() -> MatchState {
        let mut grid = TileGrid::new(20, 20);
        grid.set(5, 5, TileKind::Generator);
        let map = GeneratedMap {
            grid,
            generators: vec![(5, 5)],
            spawn_points: vec![(2, 2), (17, 2), (2, 17), (17, 17)],
        };
        let mut state = MatchState::new(
            1,
            "TESTAA".to_string(),
            "p0".to_string(),
            false,
            true,
            map,
            ArenaConfig::default(),
        );
        state.phase = crate::state::MatchPhase::Playing;
        state
    }

    #[test]
    fn glow_captures_tiles_within_radius() {
        let mut state = bare_state();
        state.add_player("p0".to_string(), "P0".to_string(), None);
        {
            let player = state.players.get_mut("p0").unwrap();
            player.x = 10.0;
            player.y = 10.0;
        }
        apply_glow(&mut state);
        assert_eq!(
            state.owners[&(10, 10)].as_deref(),
            Some("p0"),
            "own tile captured"
        );
        assert_eq!(state.owners[&(11, 10)].as_deref(), Some("p0"));
        assert_eq!(state.owners[&(10, 9)].as_deref(), Some("p0"));
        // (11,11) is √2 ≈ 1.41 away, inside the default 1.5 radius.
        assert_eq!(state.owners[&(11, 11)].as_deref(), Some("p0"));
        // Two tiles straight out is 2.0 away, outside.
        assert_eq!(state.owners[&(12, 10)], None);
    }

    #[test]
    fn later_joined_player_wins_contested_glow() {
        let mut state = bare_state();
        state.add_player("p0".to_string(), "P0".to_string(), None);
        state.add_player("p1".to_string(), "P1".to_string(), None);
        for uid in ["p0", "p1"] {
            let player = state.players.get_mut(uid).unwrap();
            player.x = 10.0;
            player.y = 10.0;
        }
        apply_glow(&mut state);
        assert_eq!(state.owners[&(10, 10)].as_deref(), Some("p1"));
    }

    #[test]
    fn generator_income_stacks_on_passive() {
        let mut state = bare_state();
        state.add_player("p0".to_string(), "P0".to_string(), None);
        state.owners.insert((5, 5), Some("p0".to_string()));
        apply_income(&mut state, 1.0);
        let coins = state.players["p0"].coins;
        assert!((coins - 4.0).abs() < 1e-9, "1 passive + 3 generator, got {coins}");
    }

    #[test]
    fn coins_clamp_at_the_cap() {
        let mut state = bare_state();
        state.add_player("p0".to_string(), "P0".to_string(), None);
        state.players.get_mut("p0").unwrap().coins = 299.9;
        apply_income(&mut state, 1.0);
        assert_eq!(state.players["p0"].coins, 300.0);
    }

    #[test]
    fn gold_drop_splits_between_two_players() {
        let mut state = bare_state();
        state.add_player("p0".to_string(), "P0".to_string(), None);
        state.add_player("p1".to_string(), "P1".to_string(), None);
        {
            let p0 = state.players.get_mut("p0").unwrap();
            p0.x = 10.3;
            p0.y = 10.0;
        }
        {
            let p1 = state.players.get_mut("p1").unwrap();
            p1.x = 9.8;
            p1.y = 10.2;
        }
        state.drops.insert(CoinDrop {
            kind: CoinKind::Gold,
            x: 10.0,
            y: 10.0,
            spawn_at_tick: 0,
            spawned: true,
            collected: false,
        });

        let mut events = Vec::new();
        collect_pickups(&mut state, &mut events);

        assert_eq!(state.players["p0"].coins, 25.0);
        assert_eq!(state.players["p1"].coins, 25.0);
        assert!(state.drops.is_empty());
        let pickups = events
            .iter()
            .filter(|e| matches!(e, GameEvent::CoinCollected { .. }))
            .count();
        assert_eq!(pickups, 2);
    }

    #[test]
    fn unspawned_drops_are_not_collectable() {
        let mut state = bare_state();
        state.add_player("p0".to_string(), "P0".to_string(), None);
        {
            let p0 = state.players.get_mut("p0").unwrap();
            p0.x = 10.0;
            p0.y = 10.0;
        }
        state.drops.insert(CoinDrop {
            kind: CoinKind::Bronze,
            x: 10.0,
            y: 10.0,
            spawn_at_tick: 100,
            spawned: false,
            collected: false,
        });
        let mut events = Vec::new();
        collect_pickups(&mut state, &mut events);
        assert_eq!(state.players["p0"].coins, 0.0);
        assert_eq!(state.drops.len(), 1);
    }

    #[test]
    fn telegraphs_flip_to_spawned_at_their_tick() {
        let mut state = bare_state();
        let id = state.drops.insert(CoinDrop {
            kind: CoinKind::Silver,
            x: 12.0,
            y: 12.0,
            spawn_at_tick: 5,
            spawned: false,
            collected: false,
        });
        let mut rng = StdRng::seed_from_u64(0);
        let mut events = Vec::new();

        state.tick = 4;
        spawn_drops(&mut state, &mut rng, &mut events);
        assert!(!state.drops[id].spawned);

        state.tick = 5;
        spawn_drops(&mut state, &mut rng, &mut events);
        assert!(state.drops[id].spawned);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::CoinSpawned { .. })));
    }

    #[test]
    fn drop_cap_blocks_new_spawns() {
        let mut state = bare_state();
        for _ in 0..state.config.max_drops {
            state.drops.insert(CoinDrop {
                kind: CoinKind::Bronze,
                x: 12.0,
                y: 12.0,
                spawn_at_tick: 0,
                spawned: true,
                collected: false,
            });
        }
        let mut rng = StdRng::seed_from_u64(0);
        let mut events = Vec::new();
        for _ in 0..10_000 {
            state.tick += 1;
            spawn_drops(&mut state, &mut rng, &mut events);
        }
        assert_eq!(state.drops.len(), state.config.max_drops);
        assert!(!events
            .iter()
            .any(|e| matches!(e, GameEvent::CoinTelegraph { .. })));
    }

    #[test]
    fn dead_beams_are_removed_and_reported() {
        let mut state = bare_state();
        state.add_player("p0".to_string(), "P0".to_string(), None);
        let beam = crate::beam::spawn_beam(
            &state.grid,
            &"p0".to_string(),
            "#EF4444",
            10.0,
            10.0,
            1.0,
            0.0,
            15.0,
        )
        .unwrap();
        let mut stale = beam.clone();
        stale.time_alive = 9.99;
        state.beams.insert(stale);

        let mut events = Vec::new();
        update_beams(&mut state, 0.05, &mut events);
        assert!(state.beams.is_empty());
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::BeamEnded { .. })));
    }

    #[test]
    fn beam_capture_tags_the_owner() {
        let mut state = bare_state();
        state.add_player("p0".to_string(), "P0".to_string(), None);
        let beam = crate::beam::spawn_beam(
            &state.grid,
            &"p0".to_string(),
            "#EF4444",
            8.0,
            8.0,
            1.0,
            0.0,
            15.0,
        )
        .unwrap();
        state.beams.insert(beam);

        let mut events = Vec::new();
        update_beams(&mut state, 0.1, &mut events);
        // 1.5 tiles of travel: the beam crossed (8,8) and (9,8).
        assert_eq!(state.owners[&(8, 8)].as_deref(), Some("p0"));
        assert_eq!(state.owners[&(9, 8)].as_deref(), Some("p0"));
    }
}
