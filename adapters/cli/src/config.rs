//! TOML configuration for the command-line adapter.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use disaster_survival_system_clock as clock;
use disaster_survival_system_identity::{CredentialDirectory, Credentials};
use disaster_survival_system_presence as presence;
use serde::Deserialize;

const DEFAULT_STORE_PATH: &str = "disaster-survival.json";

/// Settings read from the optional configuration file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct AppConfig {
    pub(crate) store_path: PathBuf,
    pub(crate) clock: ClockSection,
    pub(crate) presence: PresenceSection,
    pub(crate) users: Vec<Credentials>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ClockSection {
    pub(crate) tick_period_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PresenceSection {
    pub(crate) stale_after_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            clock: ClockSection::default(),
            presence: PresenceSection::default(),
            users: CredentialDirectory::default().accounts().to_vec(),
        }
    }
}

impl Default for ClockSection {
    fn default() -> Self {
        Self {
            tick_period_ms: 1_000,
        }
    }
}

impl Default for PresenceSection {
    fn default() -> Self {
        Self {
            stale_after_secs: presence::Config::default().stale_after_secs(),
        }
    }
}

impl AppConfig {
    /// Loads the file at `path`, or the defaults when no path was given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).context("failed to parse config toml contents")?;
        if config.clock.tick_period_ms == 0 {
            bail!("clock.tick_period_ms must be greater than zero");
        }
        if config.users.is_empty() {
            bail!("at least one [[users]] entry is required");
        }
        Ok(config)
    }

    pub(crate) fn tick_period(&self) -> Duration {
        Duration::from_millis(self.clock.tick_period_ms)
    }

    pub(crate) fn clock(&self) -> clock::Config {
        clock::Config::new(self.tick_period())
    }

    pub(crate) fn presence(&self) -> presence::Config {
        presence::Config::new(self.presence.stale_after_secs)
    }

    pub(crate) fn directory(&self) -> CredentialDirectory {
        CredentialDirectory::new(self.users.clone())
    }
}
