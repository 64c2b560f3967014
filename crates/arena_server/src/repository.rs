use crate::errors::RepoError;
use arena_core::{MatchId, MatchPhase, UserId};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

/// Persisted match row. `final_state` is an opaque blob handed over at
/// finish time.
#[derive(Clone, Debug)]
pub struct MatchRecord {
    pub id: MatchId,
    pub code: String,
    pub host_id: UserId,
    pub status: MatchPhase,
    pub is_public: bool,
    pub is_solo: bool,
    pub winner_id: Option<UserId>,
    pub final_state: Option<serde_json::Value>,
    pub inserted_at: SystemTime,
    pub updated_at: SystemTime,
}

/// Persisted per-player row, unique on `(match_id, user_id)`.
#[derive(Clone, Debug)]
pub struct MatchPlayerRecord {
    pub match_id: MatchId,
    pub user_id: UserId,
    pub color: String,
    /// Final territory share as an integer percentage.
    pub score: i32,
    pub joined_at: SystemTime,
}

/// Storage seam for match metadata. Each match actor writes only to its own
/// rows; implementations must be safe for concurrent use.
pub trait MatchRepository: Send + Sync {
    fn create_match(&self, host_id: &str, is_public: bool, is_solo: bool) -> MatchRecord;

    /// Insert a player row; inserting the same `(match_id, user_id)` again
    /// returns the existing row.
    fn add_player(
        &self,
        match_id: MatchId,
        user_id: &str,
        color: &str,
    ) -> Result<MatchPlayerRecord, RepoError>;

    fn get(&self, match_id: MatchId) -> Option<MatchRecord>;

    fn update_status(&self, match_id: MatchId, status: MatchPhase) -> Result<(), RepoError>;

    /// Mark a match finished with its winner, final state blob, and scores.
    fn finish_match(
        &self,
        match_id: MatchId,
        winner_id: Option<&str>,
        final_state: serde_json::Value,
        scores: &[(UserId, f64)],
    ) -> Result<(), RepoError>;

    /// Waiting, public, non-solo matches with at least one seated player.
    fn list_available(&self) -> Vec<MatchRecord>;

    /// Mark stale waiting/playing matches finished; returns the affected ids.
    fn cleanup_stale_matches(
        &self,
        waiting_max_age: Duration,
        playing_max_age: Duration,
    ) -> Vec<MatchId>;
}

#[derive(Default)]
struct RepoInner {
    matches: HashMap<MatchId, MatchRecord>,
    players: Vec<MatchPlayerRecord>,
    next_id: MatchId,
}

/// In-memory repository adapter; the durable store behind this interface is
/// out of scope.
#[derive(Default)]
pub struct InMemoryRepository {
    inner: Mutex<RepoInner>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn players_of(&self, match_id: MatchId) -> Vec<MatchPlayerRecord> {
        let inner = self.inner.lock().expect("repository lock");
        inner
            .players
            .iter()
            .filter(|p| p.match_id == match_id)
            .cloned()
            .collect()
    }
}

fn random_code() -> String {
    let mut rng = rand::thread_rng();
    (0..6).map(|_| rng.gen_range(b'A'..=b'Z') as char).collect()
}

impl MatchRepository for InMemoryRepository {
    fn create_match(&self, host_id: &str, is_public: bool, is_solo: bool) -> MatchRecord {
        let mut inner = self.inner.lock().expect("repository lock");
        inner.next_id += 1;
        let id = inner.next_id;

        // Codes are unique among non-finished matches; retry on collision.
        let code = loop {
            let candidate = random_code();
            let taken = inner
                .matches
                .values()
                .any(|m| m.status != MatchPhase::Finished && m.code == candidate);
            if !taken {
                break candidate;
            }
        };

        let now = SystemTime::now();
        let record = MatchRecord {
            id,
            code,
            host_id: host_id.to_string(),
            status: MatchPhase::Waiting,
            is_public,
            is_solo,
            winner_id: None,
            final_state: None,
            inserted_at: now,
            updated_at: now,
        };
        inner.matches.insert(id, record.clone());
        record
    }

    fn add_player(
        &self,
        match_id: MatchId,
        user_id: &str,
        color: &str,
    ) -> Result<MatchPlayerRecord, RepoError> {
        let mut inner = self.inner.lock().expect("repository lock");
        if !inner.matches.contains_key(&match_id) {
            return Err(RepoError::NotFound);
        }
        if let Some(existing) = inner
            .players
            .iter()
            .find(|p| p.match_id == match_id && p.user_id == user_id)
        {
            return Ok(existing.clone());
        }
        let record = MatchPlayerRecord {
            match_id,
            user_id: user_id.to_string(),
            color: color.to_string(),
            score: 0,
            joined_at: SystemTime::now(),
        };
        inner.players.push(record.clone());
        Ok(record)
    }

    fn get(&self, match_id: MatchId) -> Option<MatchRecord> {
        let inner = self.inner.lock().expect("repository lock");
        inner.matches.get(&match_id).cloned()
    }

    fn update_status(&self, match_id: MatchId, status: MatchPhase) -> Result<(), RepoError> {
        let mut inner = self.inner.lock().expect("repository lock");
        let record = inner.matches.get_mut(&match_id).ok_or(RepoError::NotFound)?;
        record.status = status;
        record.updated_at = SystemTime::now();
        Ok(())
    }

    fn finish_match(
        &self,
        match_id: MatchId,
        winner_id: Option<&str>,
        final_state: serde_json::Value,
        scores: &[(UserId, f64)],
    ) -> Result<(), RepoError> {
        let mut inner = self.inner.lock().expect("repository lock");
        let record = inner.matches.get_mut(&match_id).ok_or(RepoError::NotFound)?;
        record.status = MatchPhase::Finished;
        record.winner_id = winner_id.map(str::to_string);
        record.final_state = Some(final_state);
        record.updated_at = SystemTime::now();

        for (user_id, score) in scores {
            if let Some(row) = inner
                .players
                .iter_mut()
                .find(|p| p.match_id == match_id && &p.user_id == user_id)
            {
                row.score = score.round() as i32;
            }
        }
        Ok(())
    }

    fn list_available(&self) -> Vec<MatchRecord> {
        let inner = self.inner.lock().expect("repository lock");
        inner
            .matches
            .values()
            .filter(|m| m.status == MatchPhase::Waiting && m.is_public && !m.is_solo)
            .filter(|m| {
                inner
                    .players
                    .iter()
                    .any(|p| p.match_id == m.id)
            })
            .cloned()
            .collect()
    }

    fn cleanup_stale_matches(
        &self,
        waiting_max_age: Duration,
        playing_max_age: Duration,
    ) -> Vec<MatchId> {
        let mut inner = self.inner.lock().expect("repository lock");
        let now = SystemTime::now();
        let mut swept = Vec::new();

        for record in inner.matches.values_mut() {
            let age = now
                .duration_since(record.inserted_at)
                .unwrap_or(Duration::ZERO);
            let stale = match record.status {
                MatchPhase::Waiting => age > waiting_max_age,
                MatchPhase::Playing => age > playing_max_age,
                MatchPhase::Finished => false,
            };
            if stale {
                record.status = MatchPhase::Finished;
                record.updated_at = now;
                swept.push(record.id);
            }
        }

        swept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_six_uppercase_letters() {
        let repo = InMemoryRepository::new();
        let record = repo.create_match("host", true, false);
        assert_eq!(record.code.len(), 6);
        assert!(record.code.chars().all(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn adding_the_same_player_twice_returns_the_existing_row() {
        let repo = InMemoryRepository::new();
        let record = repo.create_match("host", true, false);
        let first = repo.add_player(record.id, "host", "#EF4444").unwrap();
        let second = repo.add_player(record.id, "host", "#3B82F6").unwrap();
        assert_eq!(second.color, first.color);
        assert_eq!(repo.players_of(record.id).len(), 1);
    }

    #[test]
    fn list_available_filters_private_solo_and_empty() {
        let repo = InMemoryRepository::new();
        let public = repo.create_match("a", true, false);
        repo.add_player(public.id, "a", "#EF4444").unwrap();
        let private = repo.create_match("b", false, false);
        repo.add_player(private.id, "b", "#EF4444").unwrap();
        let solo = repo.create_match("c", true, true);
        repo.add_player(solo.id, "c", "#EF4444").unwrap();
        let empty = repo.create_match("d", true, false);

        let available = repo.list_available();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, public.id);
        assert_ne!(available[0].id, empty.id);
    }

    #[test]
    fn finish_match_records_winner_and_scores() {
        let repo = InMemoryRepository::new();
        let record = repo.create_match("a", true, false);
        repo.add_player(record.id, "a", "#EF4444").unwrap();
        repo.add_player(record.id, "b", "#3B82F6").unwrap();

        repo.finish_match(
            record.id,
            Some("a"),
            serde_json::json!({"tick": 120}),
            &[("a".to_string(), 12.0), ("b".to_string(), 8.4)],
        )
        .unwrap();

        let stored = repo.get(record.id).unwrap();
        assert_eq!(stored.status, MatchPhase::Finished);
        assert_eq!(stored.winner_id.as_deref(), Some("a"));
        let players = repo.players_of(record.id);
        assert_eq!(players.iter().find(|p| p.user_id == "a").unwrap().score, 12);
        assert_eq!(players.iter().find(|p| p.user_id == "b").unwrap().score, 8);
    }

    #[test]
    fn cleanup_only_touches_stale_rows() {
        let repo = InMemoryRepository::new();
        let fresh = repo.create_match("a", true, false);
        let swept = repo.cleanup_stale_matches(Duration::from_secs(1800), Duration::from_secs(3600));
        assert!(swept.is_empty());

        // A zero threshold makes every waiting match stale.
        let swept = repo.cleanup_stale_matches(Duration::ZERO, Duration::ZERO);
        assert_eq!(swept, vec![fresh.id]);
        assert_eq!(repo.get(fresh.id).unwrap().status, MatchPhase::Finished);

        // Finished matches are never swept again.
        let swept = repo.cleanup_stale_matches(Duration::ZERO, Duration::ZERO);
        assert!(swept.is_empty());
    }
}
