#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative game state management for Disaster Survival.

mod countdown;

use disaster_survival_core::{
    Command, DisasterKind, Event, GameOverReason, GaugePair, Phase, SessionId, SurvivalAction,
    ACCRUAL_HEALTH_BONUS, ACCRUAL_RESOURCE_BONUS, HEALTH_DRAIN_PER_TICK, RESOURCE_DRAIN_PER_TICK,
    SCORE_PER_ACCRUAL, WELCOME_BANNER,
};
use tracing::debug;

use crate::countdown::Countdown;

/// Represents the authoritative Disaster Survival world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    phase: Phase,
    session: SessionId,
    username: String,
    gauges: GaugePair,
    score: u32,
    countdown: Countdown,
    disaster: Option<DisasterKind>,
    reason: Option<GameOverReason>,
}

impl World {
    /// Creates an idle world that waits for a `StartGame` command.
    #[must_use]
    pub fn new() -> Self {
        Self {
            banner: WELCOME_BANNER,
            phase: Phase::Idle,
            session: SessionId::default(),
            username: String::new(),
            gauges: GaugePair::initial(),
            score: 0,
            countdown: Countdown::new(),
            disaster: None,
            reason: None,
        }
    }

    fn begin_session(&mut self, out_events: &mut Vec<Event>) {
        self.session = self.session.next();
        self.phase = Phase::Playing;
        self.gauges = GaugePair::initial();
        self.score = 0;
        self.countdown = Countdown::new();
        self.disaster = None;
        self.reason = None;

        debug!(session = self.session.get(), username = %self.username, "game started");
        out_events.push(Event::GameStarted {
            session: self.session,
            username: self.username.clone(),
        });
        out_events.push(Event::GaugesChanged {
            gauges: self.gauges,
        });
    }

    fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }

    /// Timer-driven commands only land on the session they were scheduled for.
    fn accepts(&self, session: SessionId) -> bool {
        self.is_playing() && self.session == session
    }

    fn set_gauges(&mut self, gauges: GaugePair, out_events: &mut Vec<Event>) {
        self.gauges = gauges;
        out_events.push(Event::GaugesChanged { gauges });
    }

    fn end_if_depleted(&mut self, out_events: &mut Vec<Event>) {
        if let Some(reason) = self.gauges.depletion() {
            self.end_game(reason, out_events);
        }
    }

    fn strike(&mut self, kind: DisasterKind, out_events: &mut Vec<Event>) {
        let effect = kind.effect();
        self.disaster = Some(kind);
        debug!(session = self.session.get(), disaster = %kind, "disaster struck");
        out_events.push(Event::DisasterStruck {
            session: self.session,
            kind,
        });

        let drained = self
            .gauges
            .drained(effect.health_loss, effect.resource_loss);
        self.set_gauges(drained, out_events);

        self.countdown.start();
        out_events.push(Event::CountdownStarted {
            session: self.session,
            ticks: self.countdown.time_left(),
        });

        self.end_if_depleted(out_events);
    }

    fn restore(&mut self, action: SurvivalAction, out_events: &mut Vec<Event>) {
        let restored = self
            .gauges
            .restored(action.health_gain(), action.resource_gain());
        self.set_gauges(restored, out_events);
    }

    fn accrue_score(&mut self, out_events: &mut Vec<Event>) {
        self.score = self.score.saturating_add(SCORE_PER_ACCRUAL);
        out_events.push(Event::ScoreAccrued { score: self.score });

        let restored = self
            .gauges
            .restored(ACCRUAL_HEALTH_BONUS, ACCRUAL_RESOURCE_BONUS);
        self.set_gauges(restored, out_events);
    }

    /// Transitions to game over at most once per session.
    fn end_game(&mut self, reason: GameOverReason, out_events: &mut Vec<Event>) {
        if !self.is_playing() {
            return;
        }

        self.phase = Phase::GameOver;
        self.reason = Some(reason);
        self.countdown.stop();

        debug!(
            session = self.session.get(),
            score = self.score,
            %reason,
            "game over"
        );
        out_events.push(Event::GameEnded {
            session: self.session,
            username: self.username.clone(),
            score: self.score,
            reason,
        });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Commands that are not valid in the current phase are ignored without
/// emitting events.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::StartGame { username } => {
            world.username = username;
            world.begin_session(out_events);
        }
        Command::Restart => {
            if world.phase != Phase::Idle {
                world.begin_session(out_events);
            }
        }
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::DepleteGauges { session } => {
            if !world.accepts(session) {
                return;
            }

            let drained = world
                .gauges
                .drained(HEALTH_DRAIN_PER_TICK, RESOURCE_DRAIN_PER_TICK);
            world.set_gauges(drained, out_events);
            world.end_if_depleted(out_events);
        }
        Command::TickCountdown { session } => {
            if !world.accepts(session) || !world.countdown.is_active() {
                return;
            }

            let expired = world.countdown.advance();
            out_events.push(Event::CountdownAdvanced {
                time_left: world.countdown.time_left(),
            });
            if expired {
                world.end_game(GameOverReason::TimeUp, out_events);
            }
        }
        Command::SelectDisaster { kind } => {
            if world.is_playing() {
                world.strike(kind, out_events);
            }
        }
        Command::ApplyAction { action } => {
            if world.is_playing() {
                world.restore(action, out_events);
            }
        }
        Command::AccrueScore => {
            if world.is_playing() {
                world.accrue_score(out_events);
            }
        }
        Command::EndGame { reason } => {
            world.end_game(reason, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use disaster_survival_core::{GameSnapshot, GaugePair, Phase, SessionId};

    use super::World;

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Reports the current lifecycle phase.
    #[must_use]
    pub fn phase(world: &World) -> Phase {
        world.phase
    }

    /// Session of the current (or last) game.
    #[must_use]
    pub fn session(world: &World) -> SessionId {
        world.session
    }

    /// Current gauge levels.
    #[must_use]
    pub fn gauges(world: &World) -> GaugePair {
        world.gauges
    }

    /// Current score.
    #[must_use]
    pub fn score(world: &World) -> u32 {
        world.score
    }

    /// Ticks left on the countdown.
    #[must_use]
    pub fn time_left(world: &World) -> u32 {
        world.countdown.time_left()
    }

    /// Captures everything a renderer needs to draw a frame.
    #[must_use]
    pub fn snapshot(world: &World) -> GameSnapshot {
        GameSnapshot {
            phase: world.phase,
            session: world.session,
            username: world.username.clone(),
            gauges: world.gauges,
            score: world.score,
            time_left: world.countdown.time_left(),
            countdown_active: world.countdown.is_active(),
            disaster: world.disaster,
            reason: world.reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use disaster_survival_core::{Gauge, COUNTDOWN_TICKS};

    fn started_world() -> (World, SessionId) {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::StartGame {
                username: "player1".to_owned(),
            },
            &mut events,
        );
        let session = query::session(&world);
        (world, session)
    }

    fn ended_events(events: &[Event]) -> usize {
        events
            .iter()
            .filter(|event| matches!(event, Event::GameEnded { .. }))
            .count()
    }

    #[test]
    fn new_world_is_idle_and_ignores_gameplay() {
        let mut world = World::new();
        let mut events = Vec::new();

        apply(&mut world, Command::AccrueScore, &mut events);
        apply(&mut world, Command::Restart, &mut events);
        apply(
            &mut world,
            Command::SelectDisaster {
                kind: DisasterKind::Fire,
            },
            &mut events,
        );

        assert_eq!(query::phase(&world), Phase::Idle);
        assert!(events.is_empty());
        assert_eq!(query::welcome_banner(&world), WELCOME_BANNER);
    }

    #[test]
    fn start_game_initializes_gauges_and_announces_session() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::StartGame {
                username: "admin".to_owned(),
            },
            &mut events,
        );

        let snapshot = query::snapshot(&world);
        assert_eq!(snapshot.phase, Phase::Playing);
        assert_eq!(snapshot.gauges, GaugePair::new(Gauge::new(100), Gauge::new(50)));
        assert_eq!(snapshot.score, 0);
        assert!(!snapshot.countdown_active);
        assert_eq!(
            events.first(),
            Some(&Event::GameStarted {
                session: SessionId::new(1),
                username: "admin".to_owned(),
            })
        );
    }

    #[test]
    fn earthquake_drains_gauges_and_starts_countdown() {
        let (mut world, session) = started_world();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::SelectDisaster {
                kind: DisasterKind::Earthquake,
            },
            &mut events,
        );

        let snapshot = query::snapshot(&world);
        assert_eq!(snapshot.gauges.health().get(), 80);
        assert_eq!(snapshot.gauges.resources().get(), 40);
        assert_eq!(snapshot.time_left, COUNTDOWN_TICKS);
        assert!(snapshot.countdown_active);
        assert_eq!(snapshot.disaster, Some(DisasterKind::Earthquake));
        assert!(events.contains(&Event::CountdownStarted {
            session,
            ticks: COUNTDOWN_TICKS,
        }));
    }

    #[test]
    fn resources_run_out_before_countdown_after_earthquake() {
        let (mut world, session) = started_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SelectDisaster {
                kind: DisasterKind::Earthquake,
            },
            &mut events,
        );

        let mut ended_at = None;
        for tick in 1..=30 {
            let mut tick_events = Vec::new();
            apply(&mut world, Command::DepleteGauges { session }, &mut tick_events);
            apply(&mut world, Command::TickCountdown { session }, &mut tick_events);
            if ended_at.is_none() && ended_events(&tick_events) == 1 {
                ended_at = Some(tick);
            }
        }

        assert_eq!(ended_at, Some(20));
        let snapshot = query::snapshot(&world);
        assert_eq!(snapshot.reason, Some(GameOverReason::ResourcesDepleted));
        assert_eq!(snapshot.gauges.resources().get(), 0);
        assert_eq!(snapshot.gauges.health().get(), 60);
        assert_eq!(snapshot.time_left, COUNTDOWN_TICKS - 19);
    }

    #[test]
    fn countdown_expiry_ends_game_with_time_up() {
        let (mut world, session) = started_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SelectDisaster {
                kind: DisasterKind::Flood,
            },
            &mut events,
        );

        events.clear();
        for _ in 0..COUNTDOWN_TICKS {
            apply(&mut world, Command::TickCountdown { session }, &mut events);
        }

        assert_eq!(query::phase(&world), Phase::GameOver);
        assert_eq!(query::snapshot(&world).reason, Some(GameOverReason::TimeUp));
        assert_eq!(ended_events(&events), 1);
    }

    #[test]
    fn countdown_ticks_are_ignored_until_a_disaster_strikes() {
        let (mut world, session) = started_world();
        let mut events = Vec::new();
        apply(&mut world, Command::TickCountdown { session }, &mut events);

        assert!(events.is_empty());
        assert_eq!(query::time_left(&world), COUNTDOWN_TICKS);
    }

    #[test]
    fn simultaneous_depletion_reports_health_first() {
        let (mut world, session) = started_world();
        world.gauges = GaugePair::new(Gauge::new(1), Gauge::new(2));

        let mut events = Vec::new();
        apply(&mut world, Command::DepleteGauges { session }, &mut events);

        assert_eq!(
            query::snapshot(&world).reason,
            Some(GameOverReason::HealthDepleted)
        );
    }

    #[test]
    fn lethal_disaster_ends_game_immediately() {
        let (mut world, _) = started_world();
        world.gauges = GaugePair::new(Gauge::new(10), Gauge::new(50));

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SelectDisaster {
                kind: DisasterKind::Fire,
            },
            &mut events,
        );

        assert_eq!(query::phase(&world), Phase::GameOver);
        assert_eq!(query::gauges(&world).health().get(), 0);
        assert!(matches!(
            events.last(),
            Some(Event::GameEnded {
                reason: GameOverReason::HealthDepleted,
                ..
            })
        ));
    }

    #[test]
    fn actions_restore_gauges_up_to_cap() {
        let (mut world, _) = started_world();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::ApplyAction {
                action: SurvivalAction::FindShelter,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::ApplyAction {
                action: SurvivalAction::CollectWater,
            },
            &mut events,
        );

        let gauges = query::gauges(&world);
        assert_eq!(gauges.health().get(), 100);
        assert_eq!(gauges.resources().get(), 70);

        world.gauges = GaugePair::new(Gauge::new(60), Gauge::new(70));
        apply(
            &mut world,
            Command::ApplyAction {
                action: SurvivalAction::UseFirstAid,
            },
            &mut events,
        );
        assert_eq!(query::gauges(&world).health().get(), 85);
    }

    #[test]
    fn accruing_score_awards_points_and_bonus() {
        let (mut world, _) = started_world();
        world.gauges = GaugePair::new(Gauge::new(95), Gauge::new(40));

        let mut events = Vec::new();
        apply(&mut world, Command::AccrueScore, &mut events);

        assert_eq!(query::score(&world), 10);
        let gauges = query::gauges(&world);
        assert_eq!(gauges.health().get(), 100);
        assert_eq!(gauges.resources().get(), 45);
        assert!(events.contains(&Event::ScoreAccrued { score: 10 }));
    }

    #[test]
    fn game_over_is_announced_once() {
        let (mut world, _) = started_world();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::EndGame {
                reason: GameOverReason::Forfeited,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::EndGame {
                reason: GameOverReason::TimeUp,
            },
            &mut events,
        );

        assert_eq!(ended_events(&events), 1);
        assert_eq!(
            query::snapshot(&world).reason,
            Some(GameOverReason::Forfeited)
        );
    }

    #[test]
    fn game_over_freezes_state() {
        let (mut world, session) = started_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::EndGame {
                reason: GameOverReason::Forfeited,
            },
            &mut events,
        );
        let frozen = query::snapshot(&world);

        events.clear();
        apply(&mut world, Command::AccrueScore, &mut events);
        apply(&mut world, Command::DepleteGauges { session }, &mut events);
        apply(
            &mut world,
            Command::SelectDisaster {
                kind: DisasterKind::Earthquake,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::ApplyAction {
                action: SurvivalAction::CollectWater,
            },
            &mut events,
        );

        assert!(events.is_empty());
        assert_eq!(query::snapshot(&world), frozen);
    }

    #[test]
    fn restart_resets_state_and_advances_session() {
        let (mut world, first_session) = started_world();
        let mut events = Vec::new();
        apply(&mut world, Command::AccrueScore, &mut events);
        apply(
            &mut world,
            Command::SelectDisaster {
                kind: DisasterKind::Fire,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::EndGame {
                reason: GameOverReason::Forfeited,
            },
            &mut events,
        );

        apply(&mut world, Command::Restart, &mut events);

        let snapshot = query::snapshot(&world);
        assert_eq!(snapshot.phase, Phase::Playing);
        assert_eq!(snapshot.score, 0);
        assert_eq!(snapshot.gauges, GaugePair::initial());
        assert_eq!(snapshot.time_left, COUNTDOWN_TICKS);
        assert!(!snapshot.countdown_active);
        assert_eq!(snapshot.disaster, None);
        assert_eq!(snapshot.reason, None);
        assert_eq!(snapshot.username, "player1");
        assert_eq!(snapshot.session, first_session.next());
    }

    #[test]
    fn stale_session_commands_cannot_touch_restarted_game() {
        let (mut world, stale) = started_world();
        let mut events = Vec::new();
        apply(&mut world, Command::Restart, &mut events);
        apply(
            &mut world,
            Command::SelectDisaster {
                kind: DisasterKind::Earthquake,
            },
            &mut events,
        );
        let before = query::snapshot(&world);

        events.clear();
        apply(&mut world, Command::DepleteGauges { session: stale }, &mut events);
        apply(&mut world, Command::TickCountdown { session: stale }, &mut events);

        assert!(events.is_empty());
        assert_eq!(query::snapshot(&world), before);
    }
}
