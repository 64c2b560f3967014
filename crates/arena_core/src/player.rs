use crate::types::{TilePos, UserId, PLAYER_COLORS};

/// Radius of the player's collision circle, in tiles.
pub const PLAYER_RADIUS: f64 = 0.4;

/// Last-known held-key state; newer inputs overwrite without replay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputState {
    pub w: bool,
    pub a: bool,
    pub s: bool,
    pub d: bool,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub user_id: UserId,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub color: &'static str,
    /// Order the player joined in; drives color, spawn point, and the
    /// deterministic per-tick processing order.
    pub join_index: usize,

    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,

    pub energy: f64,
    pub coins: f64,

    pub speed_stacks: u32,
    pub radius_stacks: u32,
    pub energy_stacks: u32,
    pub has_multishot: bool,
    pub has_piercing: bool,
    pub has_beam_speed: bool,

    pub input: InputState,
}

impl Player {
    pub fn new(
        user_id: UserId,
        display_name: String,
        avatar_url: Option<String>,
        join_index: usize,
        spawn: TilePos,
    ) -> Self {
        let mut player = Self {
            user_id,
            display_name,
            avatar_url,
            color: PLAYER_COLORS[join_index % PLAYER_COLORS.len()],
            join_index,
            x: spawn.0 as f64,
            y: spawn.1 as f64,
            vx: 0.0,
            vy: 0.0,
            energy: 0.0,
            coins: 0.0,
            speed_stacks: 0,
            radius_stacks: 0,
            energy_stacks: 0,
            has_multishot: false,
            has_piercing: false,
            has_beam_speed: false,
            input: InputState::default(),
        };
        player.energy = player.max_energy();
        player
    }

    pub fn speed_multiplier(&self) -> f64 {
        1.0 + 0.15 * self.speed_stacks as f64
    }

    pub fn max_energy(&self) -> f64 {
        100.0 + 25.0 * self.energy_stacks as f64
    }

    /// Energy regained per second.
    pub fn energy_regen(&self) -> f64 {
        10.0 + 2.5 * self.energy_stacks as f64
    }

    /// Euclidean radius of passive tile capture.
    pub fn glow_radius(&self) -> f64 {
        1.5 + 0.25 * self.radius_stacks as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player_at(join_index: usize) -> Player {
        Player::new(
            format!("user-{join_index}"),
            "Tester".to_string(),
            None,
            join_index,
            (10, 10),
        )
    }

    #[test]
    fn colors_cycle_by_join_order() {
        assert_eq!(player_at(0).color, "#EF4444");
        assert_eq!(player_at(1).color, "#3B82F6");
        assert_eq!(player_at(2).color, "#22C55E");
        assert_eq!(player_at(3).color, "#F59E0B");
        assert_eq!(player_at(4).color, "#EF4444");
    }

    #[test]
    fn derived_stats_follow_stacks() {
        let mut player = player_at(0);
        assert_eq!(player.speed_multiplier(), 1.0);
        assert_eq!(player.max_energy(), 100.0);
        assert_eq!(player.energy_regen(), 10.0);
        assert_eq!(player.glow_radius(), 1.5);

        player.speed_stacks = 2;
        player.energy_stacks = 3;
        player.radius_stacks = 4;
        assert!((player.speed_multiplier() - 1.3).abs() < 1e-12);
        assert_eq!(player.max_energy(), 175.0);
        assert_eq!(player.energy_regen(), 17.5);
        assert_eq!(player.glow_radius(), 2.5);
    }

    #[test]
    fn spawns_with_full_energy() {
        let player = player_at(0);
        assert_eq!(player.energy, player.max_energy());
        assert_eq!(player.coins, 0.0);
    }
}
