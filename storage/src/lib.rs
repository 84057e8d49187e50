#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Persisted key-value store shared by the Disaster Survival systems.
//!
//! The store mirrors a browser's local storage: string keys map to JSON
//! encoded string values, there is no in-memory cache above it, and readers
//! must tolerate absent or unreadable values by falling back to defaults.
//! Systems receive the store explicitly so tests can substitute a
//! [`MemoryStore`].

mod file;
mod memory;

use std::{io, path::PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Keys used by the persisted game data.
pub mod keys {
    /// Highest score ever recorded (integer).
    pub const HIGH_SCORE: &str = "highScore";
    /// Every recorded game as a list of `{username, score}` entries.
    pub const LEADERBOARD: &str = "leaderboard";
    /// Identity of the logged in player as `{username}`.
    pub const CURRENT_USER: &str = "currentUser";
    /// Presence heartbeats as a list of `{username, lastActive}` entries.
    pub const ACTIVE_PLAYERS: &str = "activePlayers";
}

/// String-keyed store holding JSON encoded string values.
pub trait KeyValueStore {
    /// Reads the raw value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replaces the raw value stored under `key`.
    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError>;

    /// Deletes the value stored under `key`. Removing an absent key succeeds.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

impl<S> KeyValueStore for &mut S
where
    S: KeyValueStore + ?Sized,
{
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Errors raised while accessing a persisted store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backing file could not be read or written.
    #[error("failed to access store at {}: {source}", path.display())]
    Io {
        /// Location of the backing file.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },
    /// The backing file does not contain a valid store document.
    #[error("store document at {} is not valid JSON: {source}", path.display())]
    Decode {
        /// Location of the backing file.
        path: PathBuf,
        /// Underlying parse failure.
        source: serde_json::Error,
    },
    /// A value could not be encoded before being written.
    #[error("failed to encode value for key `{key}`: {source}")]
    Encode {
        /// Key the value was destined for.
        key: String,
        /// Underlying serialization failure.
        source: serde_json::Error,
    },
}

/// Reads and decodes the value under `key`.
///
/// Absent keys, read failures and undecodable values all yield `None`; the
/// latter two are logged.
pub fn read_json<T, S>(store: &S, key: &str) -> Option<T>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let raw = match store.get(key) {
        Ok(raw) => raw?,
        Err(error) => {
            warn!(key, %error, "store read failed; using default");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(key, %error, "stored value is malformed; using default");
            None
        }
    }
}

/// Reads and decodes the value under `key`, falling back to `T::default()`.
pub fn read_json_or_default<T, S>(store: &S, key: &str) -> T
where
    T: DeserializeOwned + Default,
    S: KeyValueStore + ?Sized,
{
    read_json(store, key).unwrap_or_default()
}

/// Encodes `value` as JSON and stores it under `key`.
pub fn write_json<T, S>(store: &mut S, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let encoded = serde_json::to_string(value).map_err(|source| StorageError::Encode {
        key: key.to_owned(),
        source,
    })?;
    store.set(key, encoded)
}
