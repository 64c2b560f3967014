/// Gameplay tunables for one match. Geometry constants that are part of the
/// physics contract (collision radius, muzzle offset, reflection offsets)
/// live next to the code that uses them.
#[derive(Clone, Debug)]
pub struct ArenaConfig {
    /// Side length of the square tile grid.
    pub grid_size: i16,
    /// Simulation rate in ticks per second.
    pub tick_hz: u32,
    /// Initial match clock for multiplayer matches; solo matches run forever.
    pub match_duration_ms: u64,
    /// Seats per match.
    pub max_players: usize,
    /// Energy debited per shot request.
    pub shot_cost: f64,
    /// Movement speed before upgrade multipliers, tiles per second.
    pub base_speed: f64,
    /// Hard cap on a player's coin balance.
    pub coin_cap: f64,
    /// Coins per second regardless of territory.
    pub passive_income: f64,
    /// Coins per second per owned generator tile.
    pub generator_income: f64,
    /// Expected coin-drop spawns per second.
    pub drop_spawn_rate: f64,
    /// Soft cap on live coin drops, checked at spawn.
    pub max_drops: usize,
    /// Euclidean radius within which a spawned drop is collected.
    pub pickup_radius: f64,
    /// Beam travel speed, tiles per second.
    pub beam_speed: f64,
    /// Beam travel speed with the beam_speed upgrade.
    pub beam_speed_boosted: f64,
    /// Beams retire after this many seconds.
    pub beam_max_age: f64,
}

impl ArenaConfig {
    pub fn tick_interval_ms(&self) -> u64 {
        1000 / self.tick_hz as u64
    }

    /// Nominal seconds per tick; the actor recomputes actual dt from the
    /// monotonic clock.
    pub fn nominal_dt(&self) -> f64 {
        1.0 / self.tick_hz as f64
    }

    pub fn min_players(&self, is_solo: bool) -> usize {
        if is_solo {
            1
        } else {
            2
        }
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            grid_size: 50,
            tick_hz: 20,
            match_duration_ms: 180_000,
            max_players: 4,
            shot_cost: 20.0,
            base_speed: 5.0,
            coin_cap: 300.0,
            passive_income: 1.0,
            generator_income: 3.0,
            drop_spawn_rate: 0.05,
            max_drops: 10,
            pickup_radius: 1.0,
            beam_speed: 15.0,
            beam_speed_boosted: 30.0,
            beam_max_age: 10.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_interval_at_20hz() {
        let config = ArenaConfig::default();
        assert_eq!(config.tick_interval_ms(), 50);
        assert!((config.nominal_dt() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn min_players_by_mode() {
        let config = ArenaConfig::default();
        assert_eq!(config.min_players(true), 1);
        assert_eq!(config.min_players(false), 2);
    }
}
