#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Disaster Survival engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to. Systems consume event streams, query immutable snapshots, and
//! respond exclusively with new command batches.

use std::{error::Error, fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Disaster Survival Simulator";

/// Upper bound shared by every gauge.
pub const GAUGE_MAX: u8 = 100;

/// Health a fresh game starts with.
pub const INITIAL_HEALTH: Gauge = Gauge::new(100);

/// Resources a fresh game starts with.
pub const INITIAL_RESOURCES: Gauge = Gauge::new(50);

/// Health lost on every depletion tick.
pub const HEALTH_DRAIN_PER_TICK: u8 = 1;

/// Resources lost on every depletion tick.
pub const RESOURCE_DRAIN_PER_TICK: u8 = 2;

/// Length of the countdown window started by a disaster, in ticks.
pub const COUNTDOWN_TICKS: u32 = 30;

/// Points awarded by a single score accrual.
pub const SCORE_PER_ACCRUAL: u32 = 10;

/// Health restored alongside a score accrual.
pub const ACCRUAL_HEALTH_BONUS: u8 = 10;

/// Resources restored alongside a score accrual.
pub const ACCRUAL_RESOURCE_BONUS: u8 = 5;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Starts the first game for the provided player identity.
    StartGame {
        /// Opaque identity used when recording the final score.
        username: String,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Drains both gauges by one depletion step.
    DepleteGauges {
        /// Session the originating timer was scheduled for.
        session: SessionId,
    },
    /// Decrements the active countdown by a single tick.
    TickCountdown {
        /// Session the originating timer was scheduled for.
        session: SessionId,
    },
    /// Strikes the world with the provided disaster.
    SelectDisaster {
        /// Disaster selected by the player.
        kind: DisasterKind,
    },
    /// Performs a restorative survival action.
    ApplyAction {
        /// Action chosen by the player.
        action: SurvivalAction,
    },
    /// Awards survival points together with a small gauge bonus.
    AccrueScore,
    /// Ends the running game with the provided reason.
    EndGame {
        /// Reason reported to the player.
        reason: GameOverReason,
    },
    /// Discards the current game and starts a fresh one for the same player.
    Restart,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that a fresh game began.
    GameStarted {
        /// Session allocated to the new game.
        session: SessionId,
        /// Identity playing the game.
        username: String,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Reports the gauge levels after any mutation.
    GaugesChanged {
        /// Gauge levels after the mutation.
        gauges: GaugePair,
    },
    /// Confirms that a disaster was applied to the gauges.
    DisasterStruck {
        /// Session affected by the disaster.
        session: SessionId,
        /// Disaster that was applied.
        kind: DisasterKind,
    },
    /// Announces that the countdown was (re)started.
    CountdownStarted {
        /// Session owning the countdown.
        session: SessionId,
        /// Ticks remaining before the countdown expires.
        ticks: u32,
    },
    /// Reports the countdown value after a decrement.
    CountdownAdvanced {
        /// Ticks remaining before the countdown expires.
        time_left: u32,
    },
    /// Reports the score after an accrual.
    ScoreAccrued {
        /// Total score of the running game.
        score: u32,
    },
    /// Announces the single terminal transition of a game.
    GameEnded {
        /// Session that ended.
        session: SessionId,
        /// Identity that played the game.
        username: String,
        /// Final score of the game.
        score: u32,
        /// Reason the game ended.
        reason: GameOverReason,
    },
}

/// Bounded integer level kept within `0..=100`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gauge(u8);

impl Gauge {
    /// Creates a gauge, clamping the value to [`GAUGE_MAX`].
    #[must_use]
    pub const fn new(value: u8) -> Self {
        if value > GAUGE_MAX {
            Self(GAUGE_MAX)
        } else {
            Self(value)
        }
    }

    /// Retrieves the current level.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Lowers the level, flooring at zero.
    #[must_use]
    pub const fn drained(self, amount: u8) -> Self {
        Self(self.0.saturating_sub(amount))
    }

    /// Raises the level, capping at [`GAUGE_MAX`].
    #[must_use]
    pub const fn restored(self, amount: u8) -> Self {
        Self::new(self.0.saturating_add(amount))
    }

    /// Reports whether the gauge reached zero.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.0 == 0
    }
}

/// Health and resources tracked for a single game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GaugePair {
    health: Gauge,
    resources: Gauge,
}

impl GaugePair {
    /// Creates a gauge pair from explicit levels.
    #[must_use]
    pub const fn new(health: Gauge, resources: Gauge) -> Self {
        Self { health, resources }
    }

    /// Levels every game starts with.
    #[must_use]
    pub const fn initial() -> Self {
        Self::new(INITIAL_HEALTH, INITIAL_RESOURCES)
    }

    /// Current health level.
    #[must_use]
    pub const fn health(&self) -> Gauge {
        self.health
    }

    /// Current resource level.
    #[must_use]
    pub const fn resources(&self) -> Gauge {
        self.resources
    }

    /// Lowers both gauges, each flooring at zero.
    #[must_use]
    pub const fn drained(self, health: u8, resources: u8) -> Self {
        Self::new(self.health.drained(health), self.resources.drained(resources))
    }

    /// Raises both gauges, each capping at [`GAUGE_MAX`].
    #[must_use]
    pub const fn restored(self, health: u8, resources: u8) -> Self {
        Self::new(
            self.health.restored(health),
            self.resources.restored(resources),
        )
    }

    /// Reports which gauge ran out, preferring health when both did.
    #[must_use]
    pub const fn depletion(&self) -> Option<GameOverReason> {
        if self.health.is_depleted() {
            Some(GameOverReason::HealthDepleted)
        } else if self.resources.is_depleted() {
            Some(GameOverReason::ResourcesDepleted)
        } else {
            None
        }
    }
}

impl Default for GaugePair {
    fn default() -> Self {
        Self::initial()
    }
}

/// Disasters a player may trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisasterKind {
    /// Heavy health damage, moderate resource loss.
    Earthquake,
    /// Balanced damage to both gauges.
    Flood,
    /// Severe health damage, light resource loss.
    Fire,
}

impl DisasterKind {
    /// Every disaster kind in presentation order.
    pub const ALL: [DisasterKind; 3] = [Self::Earthquake, Self::Flood, Self::Fire];

    /// Identifier used by adapters and persisted cues.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Earthquake => "earthquake",
            Self::Flood => "flood",
            Self::Fire => "fire",
        }
    }

    /// Returns the fixed effect applied when this disaster strikes.
    #[must_use]
    pub const fn effect(self) -> DisasterEffect {
        match self {
            Self::Earthquake => DisasterEffect::new(self, 20, 10),
            Self::Flood => DisasterEffect::new(self, 15, 15),
            Self::Fire => DisasterEffect::new(self, 25, 5),
        }
    }
}

impl fmt::Display for DisasterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DisasterKind {
    type Err = UnknownDisaster;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| UnknownDisaster(value.trim().to_owned()))
    }
}

/// Reported when a disaster name does not match any known kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownDisaster(pub String);

impl fmt::Display for UnknownDisaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown disaster '{}'", self.0)
    }
}

impl Error for UnknownDisaster {}

/// Gauge losses applied once per disaster selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DisasterEffect {
    /// Disaster the effect belongs to.
    pub kind: DisasterKind,
    /// Health removed by the disaster.
    pub health_loss: u8,
    /// Resources removed by the disaster.
    pub resource_loss: u8,
}

impl DisasterEffect {
    const fn new(kind: DisasterKind, health_loss: u8, resource_loss: u8) -> Self {
        Self {
            kind,
            health_loss,
            resource_loss,
        }
    }
}

/// Restorative actions available while playing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurvivalAction {
    /// Restores 15 health.
    FindShelter,
    /// Restores 20 resources.
    CollectWater,
    /// Restores 25 health.
    UseFirstAid,
}

impl SurvivalAction {
    /// Every survival action in presentation order.
    pub const ALL: [SurvivalAction; 3] = [Self::FindShelter, Self::CollectWater, Self::UseFirstAid];

    /// Human readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FindShelter => "Find Shelter",
            Self::CollectWater => "Collect Water",
            Self::UseFirstAid => "Use First Aid",
        }
    }

    /// Short keyword adapters accept for the action.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::FindShelter => "shelter",
            Self::CollectWater => "water",
            Self::UseFirstAid => "aid",
        }
    }

    /// Health restored by the action.
    #[must_use]
    pub const fn health_gain(self) -> u8 {
        match self {
            Self::FindShelter => 15,
            Self::CollectWater => 0,
            Self::UseFirstAid => 25,
        }
    }

    /// Resources restored by the action.
    #[must_use]
    pub const fn resource_gain(self) -> u8 {
        match self {
            Self::CollectWater => 20,
            Self::FindShelter | Self::UseFirstAid => 0,
        }
    }
}

impl FromStr for SurvivalAction {
    type Err = UnknownAction;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "shelter" | "find-shelter" => Ok(Self::FindShelter),
            "water" | "collect-water" => Ok(Self::CollectWater),
            "aid" | "first-aid" | "use-first-aid" => Ok(Self::UseFirstAid),
            _ => Err(UnknownAction(value.trim().to_owned())),
        }
    }
}

/// Reported when an action keyword does not match any known action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl fmt::Display for UnknownAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown survival action '{}'", self.0)
    }
}

impl Error for UnknownAction {}

/// Reasons a game may end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOverReason {
    /// Health reached zero.
    HealthDepleted,
    /// Resources reached zero.
    ResourcesDepleted,
    /// The disaster countdown expired.
    TimeUp,
    /// The player gave up.
    Forfeited,
}

impl GameOverReason {
    /// Message shown to the player.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::HealthDepleted => "Health Depleted",
            Self::ResourcesDepleted => "Resources Depleted",
            Self::TimeUp => "Time is Up",
            Self::Forfeited => "Player Forfeited",
        }
    }
}

impl fmt::Display for GameOverReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Lifecycle phase of the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// No game has been started yet.
    Idle,
    /// A game is running and accepts gameplay commands.
    Playing,
    /// The game ended; only a restart is accepted.
    GameOver,
}

/// Identifier of a single game lifetime, increased on every (re)start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SessionId(u32);

impl SessionId {
    /// Creates a new session identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Identifier following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Immutable representation of the game state used by renderers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameSnapshot {
    /// Current lifecycle phase.
    pub phase: Phase,
    /// Session of the current (or last) game.
    pub session: SessionId,
    /// Identity playing the game.
    pub username: String,
    /// Gauge levels.
    pub gauges: GaugePair,
    /// Accumulated score.
    pub score: u32,
    /// Ticks left on the countdown.
    pub time_left: u32,
    /// Whether a countdown is running.
    pub countdown_active: bool,
    /// Most recent disaster, if any struck this game.
    pub disaster: Option<DisasterKind>,
    /// Reason the game ended, once it has.
    pub reason: Option<GameOverReason>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gauge_construction_clamps_to_maximum() {
        assert_eq!(Gauge::new(250).get(), GAUGE_MAX);
        assert_eq!(Gauge::new(42).get(), 42);
    }

    #[test]
    fn gauge_drain_floors_at_zero() {
        let gauge = Gauge::new(3).drained(10);
        assert_eq!(gauge.get(), 0);
        assert!(gauge.is_depleted());
    }

    #[test]
    fn gauge_restore_caps_at_maximum() {
        assert_eq!(Gauge::new(95).restored(25).get(), 100);
        assert_eq!(Gauge::new(255).restored(255).get(), 100);
    }

    #[test]
    fn depletion_prefers_health_when_both_gauges_empty() {
        let pair = GaugePair::new(Gauge::new(0), Gauge::new(0));
        assert_eq!(pair.depletion(), Some(GameOverReason::HealthDepleted));

        let pair = GaugePair::new(Gauge::new(4), Gauge::new(0));
        assert_eq!(pair.depletion(), Some(GameOverReason::ResourcesDepleted));

        assert_eq!(GaugePair::initial().depletion(), None);
    }

    #[test]
    fn disaster_table_matches_rules() {
        let earthquake = DisasterKind::Earthquake.effect();
        assert_eq!((earthquake.health_loss, earthquake.resource_loss), (20, 10));
        let flood = DisasterKind::Flood.effect();
        assert_eq!((flood.health_loss, flood.resource_loss), (15, 15));
        let fire = DisasterKind::Fire.effect();
        assert_eq!((fire.health_loss, fire.resource_loss), (25, 5));
    }

    #[test]
    fn disaster_parsing_is_case_insensitive_and_rejects_unknown_kinds() {
        assert_eq!(" Flood ".parse::<DisasterKind>(), Ok(DisasterKind::Flood));
        assert_eq!(
            "volcano".parse::<DisasterKind>(),
            Err(UnknownDisaster("volcano".to_owned()))
        );
    }

    #[test]
    fn action_keywords_parse_back_to_actions() {
        for action in SurvivalAction::ALL {
            assert_eq!(action.keyword().parse::<SurvivalAction>(), Ok(action));
        }
        assert!("dance".parse::<SurvivalAction>().is_err());
    }

    #[test]
    fn disaster_kind_serializes_as_lowercase_name() {
        let json = serde_json::to_string(&DisasterKind::Earthquake).expect("serialize");
        assert_eq!(json, "\"earthquake\"");
    }

    #[test]
    fn reason_messages_match_player_facing_text() {
        assert_eq!(GameOverReason::HealthDepleted.to_string(), "Health Depleted");
        assert_eq!(GameOverReason::ResourcesDepleted.to_string(), "Resources Depleted");
        assert_eq!(GameOverReason::TimeUp.to_string(), "Time is Up");
    }
}
