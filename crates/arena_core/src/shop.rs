use crate::player::Player;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerUp {
    Speed,
    Radius,
    Energy,
    Multishot,
    Piercing,
    BeamSpeed,
}

impl PowerUp {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "speed" => Some(PowerUp::Speed),
            "radius" => Some(PowerUp::Radius),
            "energy" => Some(PowerUp::Energy),
            "multishot" => Some(PowerUp::Multishot),
            "piercing" => Some(PowerUp::Piercing),
            "beam_speed" => Some(PowerUp::BeamSpeed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PowerUp::Speed => "speed",
            PowerUp::Radius => "radius",
            PowerUp::Energy => "energy",
            PowerUp::Multishot => "multishot",
            PowerUp::Piercing => "piercing",
            PowerUp::BeamSpeed => "beam_speed",
        }
    }

    pub fn stackable(self) -> bool {
        matches!(self, PowerUp::Speed | PowerUp::Radius | PowerUp::Energy)
    }

    /// Price at the player's current stack count. One-shot items are flat.
    pub fn cost_for(self, player: &Player) -> u32 {
        match self {
            PowerUp::Speed => 15 + 10 * player.speed_stacks,
            PowerUp::Radius => 20 + 10 * player.radius_stacks,
            PowerUp::Energy => 20 + 10 * player.energy_stacks,
            PowerUp::Multishot => 40,
            PowerUp::Piercing => 35,
            PowerUp::BeamSpeed => 30,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PurchaseError {
    NotEnoughCoins,
    AlreadyOwned,
    InvalidPowerup,
    NotInGame,
    GameNotPlaying,
}

impl PurchaseError {
    /// Wire code shown to clients.
    pub fn reason(self) -> &'static str {
        match self {
            PurchaseError::NotEnoughCoins => "not_enough_coins",
            PurchaseError::AlreadyOwned => "already_owned",
            PurchaseError::InvalidPowerup => "invalid_powerup",
            PurchaseError::NotInGame => "not_in_game",
            PurchaseError::GameNotPlaying => "game_not_playing",
        }
    }
}

impl fmt::Display for PurchaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurchaseError::NotEnoughCoins => write!(f, "not enough coins"),
            PurchaseError::AlreadyOwned => write!(f, "power-up already owned"),
            PurchaseError::InvalidPowerup => write!(f, "unknown power-up"),
            PurchaseError::NotInGame => write!(f, "player is not in this match"),
            PurchaseError::GameNotPlaying => write!(f, "match is not in progress"),
        }
    }
}

impl std::error::Error for PurchaseError {}

/// Apply a purchase to the player record: check ownership and price, debit
/// coins, bump the stack or set the flag. Returns the price paid.
pub fn purchase(player: &mut Player, power: PowerUp) -> Result<u32, PurchaseError> {
    let owned = match power {
        PowerUp::Multishot => player.has_multishot,
        PowerUp::Piercing => player.has_piercing,
        PowerUp::BeamSpeed => player.has_beam_speed,
        _ => false,
    };
    if owned {
        return Err(PurchaseError::AlreadyOwned);
    }

    let cost = power.cost_for(player);
    if player.coins < cost as f64 {
        return Err(PurchaseError::NotEnoughCoins);
    }
    player.coins -= cost as f64;

    match power {
        PowerUp::Speed => player.speed_stacks += 1,
        PowerUp::Radius => player.radius_stacks += 1,
        PowerUp::Energy => player.energy_stacks += 1,
        PowerUp::Multishot => player.has_multishot = true,
        PowerUp::Piercing => player.has_piercing = true,
        PowerUp::BeamSpeed => player.has_beam_speed = true,
    }

    Ok(cost)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rich_player(coins: f64) -> Player {
        let mut player = Player::new("p1".to_string(), "P1".to_string(), None, 0, (10, 10));
        player.coins = coins;
        player
    }

    #[test]
    fn speed_cost_schedule() {
        let mut player = rich_player(1000.0);
        for expected in [15, 25, 35, 45] {
            assert_eq!(PowerUp::Speed.cost_for(&player), expected);
            purchase(&mut player, PowerUp::Speed).unwrap();
        }
    }

    #[test]
    fn radius_and_energy_cost_schedules() {
        let mut player = rich_player(1000.0);
        for expected in [20, 30, 40] {
            assert_eq!(PowerUp::Radius.cost_for(&player), expected);
            purchase(&mut player, PowerUp::Radius).unwrap();
        }
        for expected in [20, 30, 40] {
            assert_eq!(PowerUp::Energy.cost_for(&player), expected);
            purchase(&mut player, PowerUp::Energy).unwrap();
        }
    }

    #[test]
    fn fifty_five_coins_buys_two_speeds_then_stalls() {
        let mut player = rich_player(55.0);
        purchase(&mut player, PowerUp::Speed).unwrap();
        purchase(&mut player, PowerUp::Speed).unwrap();
        assert_eq!(player.coins, 15.0);
        assert_eq!(
            purchase(&mut player, PowerUp::Speed),
            Err(PurchaseError::NotEnoughCoins)
        );
        assert_eq!(
            purchase(&mut player, PowerUp::Radius),
            Err(PurchaseError::NotEnoughCoins)
        );
        assert_eq!(player.coins, 15.0);
        assert_eq!(player.speed_stacks, 2);
    }

    #[test]
    fn one_shot_items_cannot_repeat() {
        let mut player = rich_player(200.0);
        purchase(&mut player, PowerUp::Multishot).unwrap();
        assert_eq!(
            purchase(&mut player, PowerUp::Multishot),
            Err(PurchaseError::AlreadyOwned)
        );
        purchase(&mut player, PowerUp::Piercing).unwrap();
        purchase(&mut player, PowerUp::BeamSpeed).unwrap();
        assert_eq!(player.coins, 200.0 - 40.0 - 35.0 - 30.0);
        assert!(player.has_multishot && player.has_piercing && player.has_beam_speed);
    }

    #[test]
    fn energy_purchase_raises_cap_not_current_energy() {
        let mut player = rich_player(100.0);
        let before = player.energy;
        purchase(&mut player, PowerUp::Energy).unwrap();
        assert_eq!(player.energy, before);
        assert_eq!(player.max_energy(), 125.0);
        assert_eq!(player.energy_regen(), 12.5);
    }

    #[test]
    fn parse_rejects_unknown_kinds() {
        assert_eq!(PowerUp::parse("beam_speed"), Some(PowerUp::BeamSpeed));
        assert_eq!(PowerUp::parse("laser"), None);
    }

    #[test]
    fn only_stat_upgrades_stack() {
        assert!(PowerUp::Speed.stackable());
        assert!(PowerUp::Radius.stackable());
        assert!(PowerUp::Energy.stackable());
        assert!(!PowerUp::Multishot.stackable());
        assert!(!PowerUp::Piercing.stackable());
        assert!(!PowerUp::BeamSpeed.stackable());
    }
}
