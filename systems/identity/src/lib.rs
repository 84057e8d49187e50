#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Login against a credential directory and the persisted current user.
//!
//! Identity is only ever handed to the game as an opaque username; nothing
//! here authenticates beyond matching the configured credential list.

use disaster_survival_storage::{keys, read_json, write_json, KeyValueStore, StorageError};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Username and password accepted by the directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Login name.
    pub username: String,
    /// Plain-text password.
    pub password: String,
}

impl Credentials {
    /// Creates a credential pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Fixed list of accounts allowed to log in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialDirectory {
    accounts: Vec<Credentials>,
}

impl CredentialDirectory {
    /// Creates a directory holding exactly `accounts`.
    #[must_use]
    pub fn new(accounts: Vec<Credentials>) -> Self {
        Self { accounts }
    }

    /// Accounts known to the directory.
    #[must_use]
    pub fn accounts(&self) -> &[Credentials] {
        &self.accounts
    }

    fn verify(&self, username: &str, password: &str) -> Result<(), IdentityError> {
        let account = self
            .accounts
            .iter()
            .find(|account| account.username == username)
            .ok_or(IdentityError::InvalidCredentials)?;
        if account.password != password {
            return Err(IdentityError::InvalidCredentials);
        }
        Ok(())
    }
}

impl Default for CredentialDirectory {
    fn default() -> Self {
        Self::new(vec![
            Credentials::new("admin", "admin123"),
            Credentials::new("player1", "player123"),
            Credentials::new("player2", "player456"),
        ])
    }
}

/// Logged in player as stored under the `currentUser` key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Identity of the player.
    pub username: String,
}

/// Reasons a login attempt fails.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The username was blank.
    #[error("username must not be empty")]
    EmptyUsername,
    /// The password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
    /// No account matches the username and password.
    #[error("invalid username or password")]
    InvalidCredentials,
    /// The login could not be persisted.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Session manager persisting the logged in player.
#[derive(Debug)]
pub struct Identity<S> {
    store: S,
    directory: CredentialDirectory,
}

impl<S> Identity<S>
where
    S: KeyValueStore,
{
    /// Creates a session manager over `store` accepting `directory`'s accounts.
    #[must_use]
    pub fn new(store: S, directory: CredentialDirectory) -> Self {
        Self { store, directory }
    }

    /// Checks the credentials and records the player as the current user.
    pub fn login(&mut self, username: &str, password: &str) -> Result<CurrentUser, IdentityError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(IdentityError::EmptyUsername);
        }
        if password.is_empty() {
            return Err(IdentityError::EmptyPassword);
        }

        self.directory.verify(username, password)?;

        let user = CurrentUser {
            username: username.to_owned(),
        };
        write_json(&mut self.store, keys::CURRENT_USER, &user)?;
        info!(username = %user.username, "player logged in");
        Ok(user)
    }

    /// Player recorded by the last login, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<CurrentUser> {
        read_json(&self.store, keys::CURRENT_USER)
    }

    /// Forgets the current user.
    pub fn logout(&mut self) -> Result<(), StorageError> {
        self.store.remove(keys::CURRENT_USER)
    }
}
