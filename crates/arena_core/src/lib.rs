pub mod beam;
pub mod config;
pub mod events;
pub mod mapgen;
pub mod movement;
pub mod player;
pub mod shop;
pub mod sim;
pub mod state;
pub mod systems;
pub mod tile;
pub mod types;

pub use beam::{Beam, BeamId};
pub use config::ArenaConfig;
pub use events::GameEvent;
pub use mapgen::GeneratedMap;
pub use player::{InputState, Player};
pub use shop::{PowerUp, PurchaseError};
pub use sim::TickDelta;
pub use state::{CoinDrop, CoinKind, DropId, MatchPhase, MatchState};
pub use tile::{TileGrid, TileKind};
pub use types::{MatchId, Tick, TilePos, UserId};
