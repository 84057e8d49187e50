#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Active player registry driven by heartbeats.
//!
//! Presence is a liveness approximation over the shared store, not a presence
//! protocol: a player counts as active while their last heartbeat is younger
//! than the staleness threshold, and a separate sweep drops older entries.
//! Clock skew between processes and lost sweeps are tolerated, not corrected.

use disaster_survival_storage::{
    keys, read_json_or_default, write_json, KeyValueStore, StorageError,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Whole seconds since the Unix epoch.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Creates a timestamp from whole seconds.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Retrieves the number of seconds.
    #[must_use]
    pub const fn as_secs(&self) -> u64 {
        self.0
    }
}

/// Configuration parameters required to construct the presence registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    stale_after_secs: u64,
}

impl Config {
    /// Creates a configuration treating heartbeats older than `stale_after_secs` as stale.
    #[must_use]
    pub const fn new(stale_after_secs: u64) -> Self {
        Self { stale_after_secs }
    }

    /// Age in seconds after which a heartbeat is stale.
    #[must_use]
    pub const fn stale_after_secs(&self) -> u64 {
        self.stale_after_secs
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(30)
    }
}

/// Last heartbeat seen from a player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPresence {
    /// Identity of the player.
    pub username: String,
    /// Time of the most recent heartbeat.
    pub last_active: Timestamp,
}

/// Heartbeat registry stored under the `activePlayers` key.
#[derive(Debug)]
pub struct Presence<S> {
    store: S,
    stale_after_secs: u64,
}

impl<S> Presence<S>
where
    S: KeyValueStore,
{
    /// Creates a registry over `store`.
    #[must_use]
    pub fn new(store: S, config: Config) -> Self {
        Self {
            store,
            stale_after_secs: config.stale_after_secs(),
        }
    }

    /// Registers or refreshes `username` as active at `now`.
    pub fn heartbeat(&mut self, username: &str, now: Timestamp) -> Result<(), StorageError> {
        let mut players = self.load();
        match players.iter_mut().find(|player| player.username == username) {
            Some(player) => player.last_active = now,
            None => players.push(PlayerPresence {
                username: username.to_owned(),
                last_active: now,
            }),
        }
        write_json(&mut self.store, keys::ACTIVE_PLAYERS, &players)
    }

    /// Drops every entry that went stale by `now`, returning the removed usernames.
    pub fn sweep(&mut self, now: Timestamp) -> Result<Vec<String>, StorageError> {
        let stale_after = self.stale_after_secs;
        let (active, stale): (Vec<PlayerPresence>, Vec<PlayerPresence>) = self
            .load()
            .into_iter()
            .partition(|player| {
                now.as_secs().saturating_sub(player.last_active.as_secs()) <= stale_after
            });

        if stale.is_empty() {
            return Ok(Vec::new());
        }

        write_json(&mut self.store, keys::ACTIVE_PLAYERS, &active)?;
        let removed: Vec<String> = stale.into_iter().map(|player| player.username).collect();
        debug!(?removed, "swept stale players");
        Ok(removed)
    }

    /// Removes `username` immediately, e.g. on logout.
    pub fn depart(&mut self, username: &str) -> Result<(), StorageError> {
        let mut players = self.load();
        let before = players.len();
        players.retain(|player| player.username != username);
        if players.len() == before {
            return Ok(());
        }
        write_json(&mut self.store, keys::ACTIVE_PLAYERS, &players)
    }

    /// Entries currently stored, in registration order.
    #[must_use]
    pub fn active_players(&self) -> Vec<PlayerPresence> {
        self.load()
    }

    fn load(&self) -> Vec<PlayerPresence> {
        read_json_or_default(&self.store, keys::ACTIVE_PLAYERS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use disaster_survival_storage::MemoryStore;

    fn usernames<S: KeyValueStore>(presence: &Presence<S>) -> Vec<String> {
        presence
            .active_players()
            .into_iter()
            .map(|player| player.username)
            .collect()
    }

    #[test]
    fn heartbeat_registers_once_and_refreshes() {
        let mut presence = Presence::new(MemoryStore::new(), Config::default());
        presence.heartbeat("admin", Timestamp::from_secs(10)).expect("heartbeat");
        presence.heartbeat("player1", Timestamp::from_secs(11)).expect("heartbeat");
        presence.heartbeat("admin", Timestamp::from_secs(15)).expect("heartbeat");

        let players = presence.active_players();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].username, "admin");
        assert_eq!(players[0].last_active, Timestamp::from_secs(15));
    }

    #[test]
    fn sweep_removes_entries_past_threshold() {
        let mut presence = Presence::new(MemoryStore::new(), Config::default());
        presence.heartbeat("admin", Timestamp::from_secs(100)).expect("heartbeat");
        presence.heartbeat("player1", Timestamp::from_secs(120)).expect("heartbeat");

        assert!(presence.sweep(Timestamp::from_secs(130)).expect("sweep").is_empty());

        let removed = presence.sweep(Timestamp::from_secs(131)).expect("sweep");
        assert_eq!(removed, vec!["admin".to_owned()]);
        assert_eq!(usernames(&presence), vec!["player1".to_owned()]);
    }

    #[test]
    fn depart_removes_player() {
        let mut presence = Presence::new(MemoryStore::new(), Config::new(5));
        presence.heartbeat("admin", Timestamp::from_secs(1)).expect("heartbeat");
        presence.depart("admin").expect("depart");
        presence.depart("nobody").expect("absent player is fine");
        assert!(presence.active_players().is_empty());
    }

    #[test]
    fn entries_serialize_with_last_active_field() {
        let mut store = MemoryStore::new();
        {
            let mut presence = Presence::new(&mut store, Config::default());
            presence.heartbeat("player2", Timestamp::from_secs(42)).expect("heartbeat");
        }
        let raw = store
            .get(keys::ACTIVE_PLAYERS)
            .expect("read")
            .expect("persisted");
        assert_eq!(raw, r#"[{"username":"player2","lastActive":42}]"#);
    }
}
