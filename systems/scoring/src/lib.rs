#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Leaderboard and high score persistence.
//!
//! [`ScoreStore`] reads and writes the persisted leaderboard and high score
//! on every call; it keeps no copy of either. [`Scoring`] is the system that
//! feeds it from `Event::GameEnded`.

use disaster_survival_core::{Event, SessionId};
use disaster_survival_storage::{
    keys, read_json_or_default, write_json, KeyValueStore, StorageError,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Final score of one game as stored in the leaderboard.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Identity that played the game.
    pub username: String,
    /// Final score of the game.
    pub score: u32,
}

impl ScoreEntry {
    /// Creates a new leaderboard entry.
    #[must_use]
    pub fn new(username: impl Into<String>, score: u32) -> Self {
        Self {
            username: username.into(),
            score,
        }
    }
}

/// Leaderboard and high score backed by a persisted store.
#[derive(Debug)]
pub struct ScoreStore<S> {
    store: S,
}

impl<S> ScoreStore<S>
where
    S: KeyValueStore,
{
    /// Wraps the provided store.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Appends a score to the leaderboard. Players may appear any number of times.
    pub fn record_score(&mut self, username: &str, score: u32) -> Result<(), StorageError> {
        let mut entries: Vec<ScoreEntry> = read_json_or_default(&self.store, keys::LEADERBOARD);
        entries.push(ScoreEntry::new(username, score));
        write_json(&mut self.store, keys::LEADERBOARD, &entries)
    }

    /// Every recorded score, highest first; equal scores keep insertion order.
    #[must_use]
    pub fn leaderboard(&self) -> Vec<ScoreEntry> {
        let mut entries: Vec<ScoreEntry> = read_json_or_default(&self.store, keys::LEADERBOARD);
        entries.sort_by(|left, right| right.score.cmp(&left.score));
        entries
    }

    /// Highest score recorded so far, zero when none was.
    #[must_use]
    pub fn high_score(&self) -> u32 {
        read_json_or_default(&self.store, keys::HIGH_SCORE)
    }

    /// Replaces the high score when `score` beats it; returns whether it did.
    pub fn update_high_score(&mut self, score: u32) -> Result<bool, StorageError> {
        if score <= self.high_score() {
            return Ok(false);
        }
        write_json(&mut self.store, keys::HIGH_SCORE, &score)?;
        Ok(true)
    }

    /// Sets the high score back to zero.
    pub fn reset_high_score(&mut self) -> Result<(), StorageError> {
        write_json(&mut self.store, keys::HIGH_SCORE, &0_u32)
    }

    /// Releases the wrapped store.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.store
    }
}

/// Outcome of the most recently recorded game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameResult {
    /// Session that ended.
    pub session: SessionId,
    /// Identity that played the game.
    pub username: String,
    /// Final score of the game.
    pub score: u32,
    /// High score after recording the game.
    pub high_score: u32,
    /// Whether the game set a new high score.
    pub new_high_score: bool,
}

/// System that records every finished game exactly once.
#[derive(Debug, Default)]
pub struct Scoring {
    last_recorded: Option<SessionId>,
    last_result: Option<GameResult>,
}

impl Scoring {
    /// Creates a scoring system that has not recorded anything yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcome of the last recorded game, if any.
    #[must_use]
    pub fn last_result(&self) -> Option<&GameResult> {
        self.last_result.as_ref()
    }

    /// Persists the score of every `Event::GameEnded` in `events`.
    ///
    /// A session is recorded at most once even if its end is reported again.
    pub fn handle<S>(
        &mut self,
        events: &[Event],
        scores: &mut ScoreStore<S>,
    ) -> Result<(), StorageError>
    where
        S: KeyValueStore,
    {
        for event in events {
            let Event::GameEnded {
                session,
                username,
                score,
                ..
            } = event
            else {
                continue;
            };

            if self.last_recorded == Some(*session) {
                continue;
            }

            scores.record_score(username, *score)?;
            let new_high_score = scores.update_high_score(*score)?;
            let high_score = scores.high_score();
            self.last_recorded = Some(*session);
            info!(
                username = %username,
                score = *score,
                high_score,
                new_high_score,
                "score recorded"
            );

            self.last_result = Some(GameResult {
                session: *session,
                username: username.clone(),
                score: *score,
                high_score,
                new_high_score,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use disaster_survival_storage::MemoryStore;
    use std::{io, path::PathBuf};

    /// Memory store whose writes fail while `offline` is set.
    #[derive(Debug, Default)]
    struct FlakyStore {
        inner: MemoryStore,
        offline: bool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
            if self.offline {
                return Err(StorageError::Io {
                    path: PathBuf::from("offline.json"),
                    source: io::Error::new(io::ErrorKind::Other, "store offline"),
                });
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn leaderboard_sort_is_stable_for_ties() {
        let mut scores = ScoreStore::new(MemoryStore::new());
        scores.record_score("admin", 20).expect("record");
        scores.record_score("player1", 40).expect("record");
        scores.record_score("player2", 20).expect("record");
        scores.record_score("admin", 40).expect("record");

        assert_eq!(
            scores.leaderboard(),
            vec![
                ScoreEntry::new("player1", 40),
                ScoreEntry::new("admin", 40),
                ScoreEntry::new("admin", 20),
                ScoreEntry::new("player2", 20),
            ]
        );
    }

    #[test]
    fn stored_order_remains_insertion_order() {
        let mut scores = ScoreStore::new(MemoryStore::new());
        scores.record_score("admin", 10).expect("record");
        scores.record_score("player1", 30).expect("record");
        let _ = scores.leaderboard();

        let raw = scores
            .into_inner()
            .get(keys::LEADERBOARD)
            .expect("read")
            .expect("leaderboard persisted");
        assert_eq!(
            raw,
            r#"[{"username":"admin","score":10},{"username":"player1","score":30}]"#
        );
    }

    #[test]
    fn high_score_only_increases() {
        let mut scores = ScoreStore::new(MemoryStore::new());
        assert_eq!(scores.high_score(), 0);

        assert!(scores.update_high_score(50).expect("update"));
        assert!(!scores.update_high_score(30).expect("update"));
        assert_eq!(scores.high_score(), 50);

        assert!(scores.update_high_score(80).expect("update"));
        assert_eq!(scores.high_score(), 80);
    }

    #[test]
    fn reset_high_score_sets_zero() {
        let mut scores = ScoreStore::new(MemoryStore::new());
        let _ = scores.update_high_score(70).expect("update");
        scores.reset_high_score().expect("reset");
        assert_eq!(scores.high_score(), 0);
        assert!(scores.update_high_score(10).expect("update"));
    }

    #[test]
    fn repeated_game_end_is_recorded_once() {
        let mut scores = ScoreStore::new(MemoryStore::new());
        let mut scoring = Scoring::new();
        let ended = Event::GameEnded {
            session: SessionId::new(4),
            username: "player2".to_owned(),
            score: 30,
            reason: disaster_survival_core::GameOverReason::TimeUp,
        };

        scoring
            .handle(&[ended.clone(), ended], &mut scores)
            .expect("handle");

        assert_eq!(scores.leaderboard(), vec![ScoreEntry::new("player2", 30)]);
        let result = scoring.last_result().expect("result recorded");
        assert!(result.new_high_score);
        assert_eq!(result.high_score, 30);
    }

    #[test]
    fn failed_write_leaves_game_unrecorded_until_retried() {
        let mut scores = ScoreStore::new(FlakyStore {
            offline: true,
            ..FlakyStore::default()
        });
        let mut scoring = Scoring::new();
        let ended = Event::GameEnded {
            session: SessionId::new(7),
            username: "admin".to_owned(),
            score: 20,
            reason: disaster_survival_core::GameOverReason::Forfeited,
        };

        assert!(scoring
            .handle(std::slice::from_ref(&ended), &mut scores)
            .is_err());
        assert!(scoring.last_result().is_none());
        assert!(scores.leaderboard().is_empty());

        scores.store.offline = false;
        scoring
            .handle(std::slice::from_ref(&ended), &mut scores)
            .expect("retry succeeds");

        assert_eq!(scores.leaderboard(), vec![ScoreEntry::new("admin", 20)]);
        assert_eq!(scores.high_score(), 20);
    }
}
