//! Wire payloads for the per-match channel protocol. Coordinates serialize
//! with 2-decimal precision and directions with 3-decimal; tile-keyed maps
//! use `"x,y"` string keys for client compatibility.

use arena_core::{Beam, CoinDrop, MatchState, Player, TickDelta, TilePos};
use serde::{Deserialize, Serialize};
use slotmap::Key;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

pub fn tile_key(pos: TilePos) -> String {
    format!("{},{}", pos.0, pos.1)
}

/// Wall-clock milliseconds stamped on deltas and join payloads.
pub fn server_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradeStacks {
    pub speed: u32,
    pub radius: u32,
    pub energy: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradeFlags {
    pub multishot: bool,
    pub piercing: bool,
    pub beam_speed: bool,
}

/// Full player record, sent on join and in membership events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerPayload {
    pub user_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub color: String,
    pub x: f64,
    pub y: f64,
    pub energy: f64,
    pub coins: f64,
    pub max_energy: f64,
    pub glow_radius: f64,
    pub stacks: UpgradeStacks,
    pub flags: UpgradeFlags,
}

impl PlayerPayload {
    pub fn from_player(player: &Player) -> Self {
        Self {
            user_id: player.user_id.clone(),
            display_name: player.display_name.clone(),
            avatar_url: player.avatar_url.clone(),
            color: player.color.to_string(),
            x: round2(player.x),
            y: round2(player.y),
            energy: round2(player.energy),
            coins: round2(player.coins),
            max_energy: player.max_energy(),
            glow_radius: player.glow_radius(),
            stacks: UpgradeStacks {
                speed: player.speed_stacks,
                radius: player.radius_stacks,
                energy: player.energy_stacks,
            },
            flags: UpgradeFlags {
                multishot: player.has_multishot,
                piercing: player.has_piercing,
                beam_speed: player.has_beam_speed,
            },
        }
    }
}

/// Per-tick player fields inside a state delta.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerDelta {
    pub x: f64,
    pub y: f64,
    pub energy: f64,
    pub coins: f64,
    pub max_energy: f64,
    pub glow_radius: f64,
    pub stacks: UpgradeStacks,
    pub flags: UpgradeFlags,
}

impl PlayerDelta {
    fn from_player(player: &Player) -> Self {
        Self {
            x: round2(player.x),
            y: round2(player.y),
            energy: round2(player.energy),
            coins: round2(player.coins),
            max_energy: player.max_energy(),
            glow_radius: player.glow_radius(),
            stacks: UpgradeStacks {
                speed: player.speed_stacks,
                radius: player.radius_stacks,
                energy: player.energy_stacks,
            },
            flags: UpgradeFlags {
                multishot: player.has_multishot,
                piercing: player.has_piercing,
                beam_speed: player.has_beam_speed,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeamPayload {
    pub id: u64,
    pub owner_id: String,
    pub color: String,
    pub x: f64,
    pub y: f64,
    pub dir_x: f64,
    pub dir_y: f64,
    pub speed: f64,
}

impl BeamPayload {
    pub fn from_beam(id: u64, beam: &Beam) -> Self {
        Self {
            id,
            owner_id: beam.owner.clone(),
            color: beam.color.clone(),
            x: round2(beam.x),
            y: round2(beam.y),
            dir_x: round3(beam.dir_x),
            dir_y: round3(beam.dir_y),
            speed: beam.speed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DropPayload {
    pub id: u64,
    pub kind: String,
    pub value: f64,
    pub x: f64,
    pub y: f64,
    pub spawn_at_tick: u64,
    pub spawned: bool,
}

impl DropPayload {
    pub fn from_drop(id: u64, drop: &CoinDrop) -> Self {
        Self {
            id,
            kind: drop.kind.as_str().to_string(),
            value: drop.kind.value(),
            x: round2(drop.x),
            y: round2(drop.y),
            spawn_at_tick: drop.spawn_at_tick,
            spawned: drop.spawned,
        }
    }
}

/// Full state handed to a client on (re-)join.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JoinPayload {
    pub match_id: u64,
    pub code: String,
    pub status: String,
    pub host_id: String,
    pub is_public: bool,
    pub is_solo: bool,
    pub grid_size: i16,
    pub map_tiles: HashMap<String, String>,
    pub tile_owners: HashMap<String, Option<String>>,
    pub generators: Vec<String>,
    pub spawn_points: Vec<String>,
    pub players: HashMap<String, PlayerPayload>,
    pub beams: Vec<BeamPayload>,
    pub coin_drops: Vec<DropPayload>,
    pub tick: u64,
    pub time_remaining_ms: Option<u64>,
    pub server_timestamp_ms: u64,
}

pub fn join_payload(state: &MatchState) -> JoinPayload {
    JoinPayload {
        match_id: state.match_id,
        code: state.code.clone(),
        status: state.phase.as_str().to_string(),
        host_id: state.host_id.clone(),
        is_public: state.is_public,
        is_solo: state.is_solo,
        grid_size: state.grid.width(),
        map_tiles: state
            .grid
            .positions()
            .map(|pos| {
                (
                    tile_key(pos),
                    state.grid.get(pos.0, pos.1).as_str().to_string(),
                )
            })
            .collect(),
        tile_owners: state
            .owners
            .iter()
            .map(|(pos, owner)| (tile_key(*pos), owner.clone()))
            .collect(),
        generators: state.generators.iter().map(|&pos| tile_key(pos)).collect(),
        spawn_points: state.spawn_points.iter().map(|&pos| tile_key(pos)).collect(),
        players: state
            .players
            .iter()
            .map(|(id, player)| (id.clone(), PlayerPayload::from_player(player)))
            .collect(),
        beams: state
            .beams
            .iter()
            .map(|(id, beam)| BeamPayload::from_beam(id.data().as_ffi(), beam))
            .collect(),
        coin_drops: state
            .drops
            .iter()
            .map(|(id, drop)| DropPayload::from_drop(id.data().as_ffi(), drop))
            .collect(),
        tick: state.tick,
        time_remaining_ms: state.time_remaining_ms,
        server_timestamp_ms: server_timestamp_ms(),
    }
}

/// Minimal per-tick broadcast: every player and live beam, but only the
/// tiles whose owner changed this tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeltaPayload {
    pub tick: u64,
    pub server_timestamp_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_remaining_ms: Option<u64>,
    pub players: HashMap<String, PlayerDelta>,
    pub beams: Vec<BeamPayload>,
    pub tiles: HashMap<String, Option<String>>,
}

pub fn delta_payload(state: &MatchState, delta: &TickDelta) -> DeltaPayload {
    DeltaPayload {
        tick: state.tick,
        server_timestamp_ms: server_timestamp_ms(),
        time_remaining_ms: state.time_remaining_ms,
        players: state
            .players
            .iter()
            .map(|(id, player)| (id.clone(), PlayerDelta::from_player(player)))
            .collect(),
        beams: state
            .beams
            .iter()
            .map(|(id, beam)| BeamPayload::from_beam(id.data().as_ffi(), beam))
            .collect(),
        tiles: delta
            .changed_tiles
            .iter()
            .map(|(pos, owner)| (tile_key(*pos), owner.clone()))
            .collect(),
    }
}

/// Server-to-client messages on a match topic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    PlayerJoined {
        player: PlayerPayload,
    },
    PlayerLeft {
        user_id: String,
    },
    GameStarted {
        time_remaining_ms: Option<u64>,
    },
    StateDelta(DeltaPayload),
    BeamFired {
        beam: BeamPayload,
    },
    BeamEnded {
        id: u64,
    },
    CoinTelegraph {
        drop: DropPayload,
    },
    CoinSpawned {
        id: u64,
    },
    CoinCollected {
        id: u64,
        user_id: String,
        amount: f64,
    },
    PowerupPurchased {
        user_id: String,
        #[serde(rename = "type")]
        kind: String,
    },
    GameEnded {
        winner_id: Option<String>,
        scores: HashMap<String, f64>,
        players: HashMap<String, PlayerPayload>,
    },
}

/// Client-to-server messages on a match topic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    Input {
        w: bool,
        a: bool,
        s: bool,
        d: bool,
    },
    Shoot {
        direction_x: f64,
        direction_y: f64,
    },
    BuyPowerup {
        #[serde(rename = "type")]
        kind: String,
    },
    StartGame {},
}
