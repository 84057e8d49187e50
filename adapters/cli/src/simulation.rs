//! Wires the world to its systems and pumps commands to quiescence.

use std::collections::VecDeque;

use anyhow::{Context, Result};
use disaster_survival_core::{Command, GameSnapshot};
use disaster_survival_storage::KeyValueStore;
use disaster_survival_system_clock::{self as clock, Clock};
use disaster_survival_system_feedback::{Cue, Feedback};
use disaster_survival_system_scoring::{GameResult, ScoreStore, Scoring};
use disaster_survival_world::{self as world, query, World};

/// World plus every system that reacts to its events.
#[derive(Debug)]
pub(crate) struct Simulation<S> {
    world: World,
    clock: Clock,
    scoring: Scoring,
    feedback: Feedback,
    scores: ScoreStore<S>,
}

impl<S> Simulation<S>
where
    S: KeyValueStore,
{
    pub(crate) fn new(store: S, clock: clock::Config) -> Self {
        Self {
            world: World::new(),
            clock: Clock::new(clock),
            scoring: Scoring::new(),
            feedback: Feedback::new(),
            scores: ScoreStore::new(store),
        }
    }

    /// Applies `command` and every command the systems issue in response,
    /// returning the cues raised along the way.
    pub(crate) fn submit(&mut self, command: Command) -> Result<Vec<Cue>> {
        let mut cues = Vec::new();
        let mut pending = VecDeque::from([command]);
        while let Some(command) = pending.pop_front() {
            let mut events = Vec::new();
            world::apply(&mut self.world, command, &mut events);

            self.scoring
                .handle(&events, &mut self.scores)
                .context("failed to record final score")?;
            self.feedback.handle(&events, &mut cues);

            let mut commands = Vec::new();
            self.clock.handle(&events, &mut commands);
            pending.extend(commands);
        }
        Ok(cues)
    }

    pub(crate) fn welcome_banner(&self) -> &'static str {
        query::welcome_banner(&self.world)
    }

    pub(crate) fn snapshot(&self) -> GameSnapshot {
        query::snapshot(&self.world)
    }

    pub(crate) fn high_score(&self) -> u32 {
        self.scores.high_score()
    }

    pub(crate) fn last_result(&self) -> Option<&GameResult> {
        self.scoring.last_result()
    }
}
