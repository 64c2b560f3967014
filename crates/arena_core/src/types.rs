/// Stable identity of a player, assigned by the (out-of-scope) auth layer.
pub type UserId = String;

/// Identifies a match within the running process.
pub type MatchId = u64;

/// Monotonic simulation tick counter.
pub type Tick = u64;

/// Integer tile coordinate. Tile centers lie on integer coordinates; each
/// tile spans half a unit to every side of its center.
pub type TilePos = (i16, i16);

/// Player colors, assigned by join order mod 4.
pub const PLAYER_COLORS: [&str; 4] = ["#EF4444", "#3B82F6", "#22C55E", "#F59E0B"];
