use crate::beam::{Beam, BeamId};
use crate::config::ArenaConfig;
use crate::mapgen::GeneratedMap;
use crate::player::Player;
use crate::tile::TileGrid;
use crate::types::{MatchId, Tick, TilePos, UserId};
use slotmap::{new_key_type, SlotMap};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchPhase {
    Waiting,
    Playing,
    Finished,
}

impl MatchPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchPhase::Waiting => "waiting",
            MatchPhase::Playing => "playing",
            MatchPhase::Finished => "finished",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoinKind {
    Bronze,
    Silver,
    Gold,
}

impl CoinKind {
    pub fn value(self) -> f64 {
        match self {
            CoinKind::Bronze => 10.0,
            CoinKind::Silver => 25.0,
            CoinKind::Gold => 50.0,
        }
    }

    /// Seconds between the telegraph announcement and availability.
    pub fn telegraph_secs(self) -> f64 {
        match self {
            CoinKind::Bronze => 3.0,
            CoinKind::Silver => 5.0,
            CoinKind::Gold => 7.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CoinKind::Bronze => "bronze",
            CoinKind::Silver => "silver",
            CoinKind::Gold => "gold",
        }
    }
}

new_key_type! { pub struct DropId; }

#[derive(Clone, Debug)]
pub struct CoinDrop {
    pub kind: CoinKind,
    pub x: f64,
    pub y: f64,
    pub spawn_at_tick: Tick,
    pub spawned: bool,
    pub collected: bool,
}

/// Root state of one match. Owned exclusively by the match actor; nothing
/// else mutates it.
#[derive(Clone, Debug)]
pub struct MatchState {
    pub config: ArenaConfig,
    pub match_id: MatchId,
    pub code: String,
    pub phase: MatchPhase,
    pub host_id: UserId,
    pub is_solo: bool,
    pub is_public: bool,

    pub grid: TileGrid,
    pub generators: Vec<TilePos>,
    pub spawn_points: Vec<TilePos>,
    /// Every capturable tile, mapped to its current owner. Keys are fixed at
    /// generation time and never include blocking tiles.
    pub owners: HashMap<TilePos, Option<UserId>>,

    pub players: HashMap<UserId, Player>,
    pub beams: SlotMap<BeamId, Beam>,
    pub drops: SlotMap<DropId, CoinDrop>,

    pub tick: Tick,
    /// `None` means no clock (solo matches run forever).
    pub time_remaining_ms: Option<u64>,

    next_join_index: usize,
}

impl MatchState {
    pub fn new(
        match_id: MatchId,
        code: String,
        host_id: UserId,
        is_solo: bool,
        is_public: bool,
        map: GeneratedMap,
        config: ArenaConfig,
    ) -> Self {
        let owners = map
            .grid
            .capturable_positions()
            .map(|pos| (pos, None))
            .collect();
        let time_remaining_ms = if is_solo {
            None
        } else {
            Some(config.match_duration_ms)
        };
        Self {
            config,
            match_id,
            code,
            phase: MatchPhase::Waiting,
            host_id,
            is_solo,
            is_public,
            grid: map.grid,
            generators: map.generators,
            spawn_points: map.spawn_points,
            owners,
            players: HashMap::new(),
            beams: SlotMap::with_key(),
            drops: SlotMap::with_key(),
            tick: 0,
            time_remaining_ms,
            next_join_index: 0,
        }
    }

    /// Seat a new player at the spawn point for their join order. Callers
    /// enforce capacity and phase rules.
    pub fn add_player(
        &mut self,
        user_id: UserId,
        display_name: String,
        avatar_url: Option<String>,
    ) -> &Player {
        let join_index = self.next_join_index;
        self.next_join_index += 1;
        let spawn = self.spawn_points[join_index % self.spawn_points.len()];
        let player = Player::new(user_id.clone(), display_name, avatar_url, join_index, spawn);
        self.players.entry(user_id).or_insert(player)
    }

    pub fn remove_player(&mut self, user_id: &str) -> Option<Player> {
        self.players.remove(user_id)
    }

    /// Transition to `Playing`; the caller has already validated host and
    /// player-count rules.
    pub fn begin(&mut self) {
        self.phase = MatchPhase::Playing;
    }

    /// Player ids ordered by join index, the deterministic processing order
    /// for glow capture and pickups.
    pub fn player_ids_in_join_order(&self) -> Vec<UserId> {
        let mut ids: Vec<(usize, UserId)> = self
            .players
            .values()
            .map(|p| (p.join_index, p.user_id.clone()))
            .collect();
        ids.sort_by_key(|(index, _)| *index);
        ids.into_iter().map(|(_, id)| id).collect()
    }

    pub fn capturable_total(&self) -> usize {
        self.owners.len()
    }

    pub fn owned_count(&self, user_id: &str) -> usize {
        self.owners
            .values()
            .filter(|owner| owner.as_deref() == Some(user_id))
            .count()
    }
}
