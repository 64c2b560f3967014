use crate::errors::{CreateMatchError, JoinError, MatchError};
use crate::match_handle::MatchHandle;
use crate::protocol::JoinPayload;
use crate::actor::run_match_actor;
use crate::repository::{MatchRecord, MatchRepository};
use crate::types::{MatchInfo, MatchOptions, ServerConfig, UserProfile};
use arena_core::{mapgen, ArenaConfig, MatchId, MatchPhase, MatchState};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

struct MatchEntry {
    handle: MatchHandle,
    task: JoinHandle<()>,
}

type MatchMap = Arc<RwLock<HashMap<MatchId, MatchEntry>>>;

/// Process-wide match registry: the only cross-match mutable state besides
/// the repository. Exactly one live actor exists per match id.
pub struct MatchRegistry {
    config: ServerConfig,
    repo: Arc<dyn MatchRepository>,
    matches: MatchMap,
}

impl MatchRegistry {
    pub fn new(config: ServerConfig, repo: Arc<dyn MatchRepository>) -> Self {
        Self {
            config,
            repo,
            matches: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn repo(&self) -> &Arc<dyn MatchRepository> {
        &self.repo
    }

    /// Shut down every match actor and drain the map.
    pub async fn shutdown(&self) {
        let mut matches = self.matches.write().await;

        for (_, entry) in matches.drain() {
            entry.handle.request_shutdown();
            entry.task.abort();
            let _ = entry.task.await;
        }
    }

    /// Create a match row and spawn its actor. The seed drives map
    /// generation and all in-match randomness; omit it for a random map.
    pub async fn create_match(
        &self,
        host: &UserProfile,
        options: MatchOptions,
        seed: Option<u64>,
    ) -> Result<MatchHandle, CreateMatchError> {
        {
            let matches = self.matches.read().await;
            if matches.len() >= self.config.max_matches {
                return Err(CreateMatchError::TooManyMatches);
            }
        }

        let record = self
            .repo
            .create_match(&host.user_id, options.is_public, options.is_solo);
        let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
        tracing::info!(match_id = record.id, code = %record.code, "match created");

        Ok(self.spawn_entry(record, seed).await)
    }

    /// Ensure a live actor exists for an already-persisted match. Starting a
    /// match that is already live returns the existing handle.
    pub async fn start(&self, match_id: MatchId) -> Result<MatchHandle, MatchError> {
        if let Some(handle) = self.lookup(match_id).await {
            return Ok(handle);
        }

        let record = self.repo.get(match_id).ok_or(MatchError::NotFound)?;
        if record.status == MatchPhase::Finished {
            return Err(MatchError::NotFound);
        }

        let seed = rand::thread_rng().gen();
        Ok(self.spawn_entry(record, seed).await)
    }

    async fn spawn_entry(&self, record: MatchRecord, seed: u64) -> MatchHandle {
        let match_id = record.id;
        let mut rng = StdRng::seed_from_u64(seed);
        let arena: ArenaConfig = self.config.arena.clone();
        let map = mapgen::generate(arena.grid_size, &mut rng);
        let state = MatchState::new(
            match_id,
            record.code,
            record.host_id,
            record.is_solo,
            record.is_public,
            map,
            arena,
        );
        let handle = MatchHandle::new(state, rng, Arc::clone(&self.repo));

        let task = {
            let actor = handle.clone();
            let matches = Arc::clone(&self.matches);
            let finished_linger = self.config.finished_linger;
            tokio::spawn(async move {
                run_match_actor(actor, finished_linger).await;
                matches.write().await.remove(&match_id);
            })
        };

        let mut matches = self.matches.write().await;
        match matches.entry(match_id) {
            std::collections::hash_map::Entry::Occupied(existing) => {
                // Lost a start race; keep the live actor and drop ours.
                task.abort();
                handle.request_shutdown();
                existing.get().handle.clone()
            }
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(MatchEntry {
                    handle: handle.clone(),
                    task,
                });
                handle
            }
        }
    }

    pub async fn lookup(&self, match_id: MatchId) -> Option<MatchHandle> {
        let matches = self.matches.read().await;
        matches.get(&match_id).map(|entry| entry.handle.clone())
    }

    pub async fn exists(&self, match_id: MatchId) -> bool {
        let matches = self.matches.read().await;
        matches.contains_key(&match_id)
    }

    /// Stop a match actor and remove it from the registry.
    pub async fn stop(&self, match_id: MatchId) -> Result<(), MatchError> {
        let entry = {
            let mut matches = self.matches.write().await;
            matches.remove(&match_id).ok_or(MatchError::NotFound)?
        };
        entry.handle.request_shutdown();
        entry.task.abort();
        Ok(())
    }

    /// Join a player to a live match.
    pub async fn join(
        &self,
        match_id: MatchId,
        profile: &UserProfile,
    ) -> Result<JoinPayload, JoinError> {
        let handle = self
            .lookup(match_id)
            .await
            .ok_or(JoinError::MatchNotFound)?;
        handle.join(profile).await
    }

    pub async fn list(&self) -> Vec<MatchInfo> {
        let handles: Vec<MatchHandle> = {
            let matches = self.matches.read().await;
            matches.values().map(|entry| entry.handle.clone()).collect()
        };

        let mut infos = Vec::with_capacity(handles.len());
        for handle in handles {
            infos.push(handle.info().await);
        }
        infos
    }
}
