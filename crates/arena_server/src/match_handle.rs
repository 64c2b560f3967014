use crate::errors::{JoinError, LeaveError, StartError};
use crate::protocol::{self, ClientMessage, JoinPayload, PlayerPayload, ServerMessage};
use crate::repository::MatchRepository;
use crate::topic::MatchTopic;
use crate::types::{MatchInfo, ServerEvent, UserProfile};
use arena_core::{sim, GameEvent, InputState, MatchId, MatchPhase, MatchState, PurchaseError};
use rand::rngs::StdRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, Mutex};

/// Mutable state of one match actor. Lives behind the handle's mutex, which
/// serializes every handler and the tick step; that mutex is the only
/// mutual exclusion the state needs.
struct MatchInner {
    state: MatchState,
    rng: StdRng,
    repo: Arc<dyn MatchRepository>,
    topic: MatchTopic,
    sequence: u64,
    last_tick_at: Option<Instant>,
}

impl MatchInner {
    fn publish(&mut self, message: ServerMessage) {
        self.sequence += 1;
        self.topic.publish(ServerEvent {
            sequence: self.sequence,
            tick: self.state.tick,
            message,
        });
    }

    fn publish_game_events(&mut self, events: Vec<GameEvent>) {
        for event in events {
            let message = self.convert(event);
            self.publish(message);
        }
    }

    fn convert(&self, event: GameEvent) -> ServerMessage {
        match event {
            GameEvent::BeamFired { id, beam } => ServerMessage::BeamFired {
                beam: protocol::BeamPayload::from_beam(id, &beam),
            },
            GameEvent::BeamEnded { id } => ServerMessage::BeamEnded { id },
            GameEvent::CoinTelegraph { id, drop } => ServerMessage::CoinTelegraph {
                drop: protocol::DropPayload::from_drop(id, &drop),
            },
            GameEvent::CoinSpawned { id } => ServerMessage::CoinSpawned { id },
            GameEvent::CoinCollected {
                id,
                user_id,
                amount,
            } => ServerMessage::CoinCollected {
                id,
                user_id,
                amount,
            },
            GameEvent::GameEnded { winner_id, scores } => ServerMessage::GameEnded {
                winner_id,
                scores: scores.into_iter().collect(),
                players: self
                    .state
                    .players
                    .iter()
                    .map(|(id, player)| (id.clone(), PlayerPayload::from_player(player)))
                    .collect(),
            },
        }
    }

    /// Persist the finished match. Called before the game-over broadcast so
    /// subscribers never observe an unfinished repository row after the end.
    fn persist_finish(&mut self, events: &[GameEvent]) {
        let (winner_id, scores) = events
            .iter()
            .rev()
            .find_map(|event| match event {
                GameEvent::GameEnded { winner_id, scores } => {
                    Some((winner_id.clone(), scores.clone()))
                }
                _ => None,
            })
            .unwrap_or((None, Vec::new()));

        let final_state = serde_json::to_value(protocol::join_payload(&self.state))
            .unwrap_or(serde_json::Value::Null);
        if let Err(error) = self.repo.finish_match(
            self.state.match_id,
            winner_id.as_deref(),
            final_state,
            &scores,
        ) {
            tracing::error!(match_id = self.state.match_id, %error, "failed to persist match finish");
        }
    }
}

/// Cloneable handle to a match actor.
#[derive(Clone)]
pub struct MatchHandle {
    inner: Arc<Mutex<MatchInner>>,
    shutdown: Arc<AtomicBool>,
    match_id: MatchId,
    tick_hz: u32,
}

impl MatchHandle {
    pub fn new(state: MatchState, rng: StdRng, repo: Arc<dyn MatchRepository>) -> Self {
        let match_id = state.match_id;
        let tick_hz = state.config.tick_hz;
        Self {
            inner: Arc::new(Mutex::new(MatchInner {
                state,
                rng,
                repo,
                topic: MatchTopic::new(),
                sequence: 0,
                last_tick_at: None,
            })),
            shutdown: Arc::new(AtomicBool::new(false)),
            match_id,
            tick_hz,
        }
    }

    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    pub fn tick_hz(&self) -> u32 {
        self.tick_hz
    }

    pub fn should_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Subscribe to this match's event topic.
    pub async fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        let inner = self.inner.lock().await;
        inner.topic.subscribe()
    }

    /// Seat a player and return the full state. Re-joining is idempotent:
    /// an already-seated player gets the current state back with no side
    /// effects, even mid-game.
    pub async fn join(&self, profile: &UserProfile) -> Result<JoinPayload, JoinError> {
        let mut inner = self.inner.lock().await;

        if inner.state.players.contains_key(&profile.user_id) {
            return Ok(protocol::join_payload(&inner.state));
        }

        match inner.state.phase {
            MatchPhase::Waiting => {}
            MatchPhase::Playing | MatchPhase::Finished => {
                return Err(JoinError::GameInProgress);
            }
        }
        if inner.state.players.len() >= inner.state.config.max_players {
            return Err(JoinError::MatchFull);
        }

        let color = {
            let player = inner.state.add_player(
                profile.user_id.clone(),
                profile.display_name.clone(),
                profile.avatar_url.clone(),
            );
            player.color.to_string()
        };

        if let Err(error) = inner
            .repo
            .add_player(self.match_id, &profile.user_id, &color)
        {
            tracing::error!(match_id = self.match_id, %error, "failed to persist player join");
            self.request_shutdown();
            return Err(JoinError::MatchNotFound);
        }

        let payload = PlayerPayload::from_player(&inner.state.players[&profile.user_id]);
        inner.publish(ServerMessage::PlayerJoined { player: payload });

        Ok(protocol::join_payload(&inner.state))
    }

    /// Remove a player. The last player leaving a waiting match finishes it
    /// in the repository and shuts the actor down.
    pub async fn leave(&self, user_id: &str) -> Result<(), LeaveError> {
        let mut inner = self.inner.lock().await;

        if inner.state.remove_player(user_id).is_none() {
            return Err(LeaveError::NotInGame);
        }
        inner.publish(ServerMessage::PlayerLeft {
            user_id: user_id.to_string(),
        });

        if inner.state.phase == MatchPhase::Waiting && inner.state.players.is_empty() {
            inner.state.phase = MatchPhase::Finished;
            let final_state = serde_json::to_value(protocol::join_payload(&inner.state))
                .unwrap_or(serde_json::Value::Null);
            if let Err(error) =
                inner
                    .repo
                    .finish_match(self.match_id, None, final_state, &[])
            {
                tracing::error!(match_id = self.match_id, %error, "failed to persist abandoned match");
            }
            tracing::info!(match_id = self.match_id, "last player left while waiting; match closed");
            self.request_shutdown();
        }

        Ok(())
    }

    /// Host-only transition to `Playing`. The status is persisted before the
    /// start broadcast and the first tick.
    pub async fn start_game(&self, user_id: &str) -> Result<(), StartError> {
        let mut inner = self.inner.lock().await;

        if inner.state.phase != MatchPhase::Waiting {
            return Err(StartError::GameAlreadyStarted);
        }
        if inner.state.host_id != user_id {
            return Err(StartError::NotHost);
        }
        let min_players = inner.state.config.min_players(inner.state.is_solo);
        if inner.state.players.len() < min_players {
            return Err(StartError::NotEnoughPlayers);
        }

        if let Err(error) = inner.repo.update_status(self.match_id, MatchPhase::Playing) {
            tracing::error!(match_id = self.match_id, %error, "failed to persist match start");
            self.request_shutdown();
            return Err(StartError::MatchNotFound);
        }

        inner.state.begin();
        inner.last_tick_at = Some(Instant::now());
        let time_remaining_ms = inner.state.time_remaining_ms;
        inner.publish(ServerMessage::GameStarted { time_remaining_ms });
        tracing::info!(match_id = self.match_id, "match started");

        Ok(())
    }

    /// Fire-and-forget input merge.
    pub async fn set_input(&self, user_id: &str, input: InputState) {
        let mut inner = self.inner.lock().await;
        sim::handle_input(&mut inner.state, user_id, input);
    }

    /// Fire-and-forget shot request.
    pub async fn shoot(&self, user_id: &str, direction_x: f64, direction_y: f64) {
        let mut inner = self.inner.lock().await;
        let mut events = Vec::new();
        sim::handle_shoot(&mut inner.state, user_id, direction_x, direction_y, &mut events);
        inner.publish_game_events(events);
    }

    /// Purchase a power-up by its wire name.
    pub async fn buy_powerup(&self, user_id: &str, kind: &str) -> Result<(), PurchaseError> {
        let power = arena_core::PowerUp::parse(kind).ok_or(PurchaseError::InvalidPowerup)?;
        let mut inner = self.inner.lock().await;
        sim::buy_powerup(&mut inner.state, user_id, power)?;
        inner.publish(ServerMessage::PowerupPurchased {
            user_id: user_id.to_string(),
            kind: power.as_str().to_string(),
        });
        Ok(())
    }

    /// Route an inbound channel message to its handler. Fire-and-forget
    /// messages always report ok; reply-bearing ones surface their wire
    /// reason code.
    pub async fn handle_client_message(
        &self,
        user_id: &str,
        message: ClientMessage,
    ) -> Result<(), &'static str> {
        match message {
            ClientMessage::Input { w, a, s, d } => {
                self.set_input(user_id, InputState { w, a, s, d }).await;
                Ok(())
            }
            ClientMessage::Shoot {
                direction_x,
                direction_y,
            } => {
                self.shoot(user_id, direction_x, direction_y).await;
                Ok(())
            }
            ClientMessage::BuyPowerup { kind } => self
                .buy_powerup(user_id, &kind)
                .await
                .map_err(|error| error.reason()),
            ClientMessage::StartGame {} => self
                .start_game(user_id)
                .await
                .map_err(|error| error.reason()),
        }
    }

    /// Current full state, as handed to joining clients.
    pub async fn full_state(&self) -> JoinPayload {
        let inner = self.inner.lock().await;
        protocol::join_payload(&inner.state)
    }

    pub async fn phase(&self) -> MatchPhase {
        let inner = self.inner.lock().await;
        inner.state.phase
    }

    pub async fn info(&self) -> MatchInfo {
        let inner = self.inner.lock().await;
        MatchInfo {
            match_id: self.match_id,
            code: inner.state.code.clone(),
            phase: inner.state.phase,
            player_count: inner.state.players.len(),
            current_tick: inner.state.tick,
            is_public: inner.state.is_public,
            is_solo: inner.state.is_solo,
        }
    }

    /// Advance one tick. dt comes from the actual monotonic delta, so a
    /// delayed timer does not slow the simulation down.
    /// Returns true when the match is finished.
    pub async fn step_one_tick(&self) -> bool {
        let mut inner = self.inner.lock().await;

        if inner.state.phase != MatchPhase::Playing {
            return inner.state.phase == MatchPhase::Finished;
        }

        let now = Instant::now();
        let dt = inner
            .last_tick_at
            .map(|last| (now - last).as_secs_f64())
            .unwrap_or_else(|| inner.state.config.nominal_dt());
        inner.last_tick_at = Some(now);

        let mut events = Vec::new();
        let delta = {
            let MatchInner {
                ref mut state,
                ref mut rng,
                ..
            } = *inner;
            sim::step(state, dt, rng, &mut events)
        };

        let finished = inner.state.phase == MatchPhase::Finished;
        if finished {
            inner.persist_finish(&events);
        }

        inner.publish_game_events(events);

        if let Some(delta) = delta {
            let payload = protocol::delta_payload(&inner.state, &delta);
            inner.publish(ServerMessage::StateDelta(payload));
        }

        if finished {
            tracing::info!(match_id = self.match_id, "match finished");
        }
        finished
    }

    /// Janitor path: finish the match now, persist, broadcast game over, and
    /// request shutdown. A no-op beyond shutdown if already finished.
    pub async fn force_finish(&self) {
        let mut inner = self.inner.lock().await;

        if inner.state.phase != MatchPhase::Finished {
            let mut events = Vec::new();
            sim::finish(&mut inner.state, &mut events);
            inner.persist_finish(&events);
            inner.publish_game_events(events);
        }
        self.request_shutdown();
    }
}
