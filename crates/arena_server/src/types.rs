use crate::protocol::ServerMessage;
use arena_core::{ArenaConfig, MatchId, MatchPhase, Tick, UserId};
use std::time::Duration;

/// Identity handed to `join` by the (out-of-scope) auth layer.
#[derive(Clone, Debug)]
pub struct UserProfile {
    pub user_id: UserId,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// Options for creating a match.
#[derive(Clone, Copy, Debug, Default)]
pub struct MatchOptions {
    pub is_public: bool,
    pub is_solo: bool,
}

/// Snapshot of a match for listings.
#[derive(Clone, Debug)]
pub struct MatchInfo {
    pub match_id: MatchId,
    pub code: String,
    pub phase: MatchPhase,
    pub player_count: usize,
    pub current_tick: Tick,
    pub is_public: bool,
    pub is_solo: bool,
}

/// A message on a match topic, stamped so subscribers can observe the
/// actor's total order.
#[derive(Clone, Debug)]
pub struct ServerEvent {
    pub sequence: u64,
    pub tick: Tick,
    pub message: ServerMessage,
}

/// Configuration for the registry and its background tasks.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub arena: ArenaConfig,
    /// Maximum number of concurrent matches.
    pub max_matches: usize,
    /// How long a finished match actor lingers before retiring, so late
    /// subscribers still see the game-over broadcast.
    pub finished_linger: Duration,
    /// Time between janitor sweeps.
    pub janitor_interval: Duration,
    /// Waiting matches older than this are swept.
    pub waiting_max_age: Duration,
    /// Playing matches older than this are swept.
    pub playing_max_age: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            arena: ArenaConfig::default(),
            max_matches: 100,
            finished_linger: Duration::from_secs(60),
            janitor_interval: Duration::from_secs(300),
            waiting_max_age: Duration::from_secs(30 * 60),
            playing_max_age: Duration::from_secs(60 * 60),
        }
    }
}
