use crate::beam::Beam;
use crate::state::CoinDrop;
use crate::types::UserId;

/// Events produced inside the simulation (shoot handling and the tick step).
/// Join/leave/start/purchase notifications originate in the actor layer,
/// which also turns these into wire messages.
#[derive(Clone, Debug)]
pub enum GameEvent {
    BeamFired { id: u64, beam: Beam },
    BeamEnded { id: u64 },
    CoinTelegraph { id: u64, drop: CoinDrop },
    CoinSpawned { id: u64 },
    CoinCollected { id: u64, user_id: UserId, amount: f64 },
    GameEnded {
        winner_id: Option<UserId>,
        scores: Vec<(UserId, f64)>,
    },
}
