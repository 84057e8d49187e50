#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Periodic tick sources driving gauge depletion and the disaster countdown.
//!
//! The clock owns one timer per concern. Each timer is bound to the session it
//! was scheduled for and accumulates `Event::TimeAdvanced` deltas, emitting a
//! session-tagged command every time a full period elapses. Timers are
//! cancelled through the [`TimerHandle`] returned when they were scheduled,
//! and the clock cancels a session's timers itself when the game ends or
//! restarts.

use std::{collections::BTreeMap, time::Duration};

use disaster_survival_core::{Command, Event, SessionId};
use tracing::debug;

/// Most periods a single timer replays after a stalled tick; older ones are dropped.
pub const MAX_CATCH_UP_PERIODS: u32 = 128;

/// Configuration parameters required to construct the clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    period: Duration,
}

impl Config {
    /// Creates a configuration firing every `period` of simulated time.
    #[must_use]
    pub const fn new(period: Duration) -> Self {
        Self { period }
    }

    /// Simulated time between two firings of a timer.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

/// Concern a timer drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKind {
    /// Emits `Command::DepleteGauges` every period.
    Depletion,
    /// Emits `Command::TickCountdown` every period.
    Countdown,
}

impl TimerKind {
    fn command(self, session: SessionId) -> Command {
        match self {
            Self::Depletion => Command::DepleteGauges { session },
            Self::Countdown => Command::TickCountdown { session },
        }
    }
}

/// Unique identifier assigned to a scheduled timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u32);

impl TimerId {
    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Handle returned when a timer is scheduled; pass it to [`Clock::cancel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    id: TimerId,
    kind: TimerKind,
    session: SessionId,
}

impl TimerHandle {
    /// Identifier of the timer.
    #[must_use]
    pub const fn id(&self) -> TimerId {
        self.id
    }

    /// Concern the timer drives.
    #[must_use]
    pub const fn kind(&self) -> TimerKind {
        self.kind
    }

    /// Session the timer was scheduled for.
    #[must_use]
    pub const fn session(&self) -> SessionId {
        self.session
    }
}

#[derive(Clone, Copy, Debug)]
struct Timer {
    kind: TimerKind,
    session: SessionId,
    accumulator: Duration,
}

/// Pure system that converts elapsed time into session-tagged tick commands.
#[derive(Debug)]
pub struct Clock {
    period: Duration,
    timers: BTreeMap<TimerId, Timer>,
    next_timer_id: u32,
}

impl Clock {
    /// Creates a clock without any scheduled timers.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            period: config.period(),
            timers: BTreeMap::new(),
            next_timer_id: 0,
        }
    }

    /// Schedules a new periodic timer for `session`.
    pub fn schedule(&mut self, kind: TimerKind, session: SessionId) -> TimerHandle {
        let id = TimerId(self.next_timer_id);
        self.next_timer_id = self.next_timer_id.wrapping_add(1);
        let _ = self.timers.insert(
            id,
            Timer {
                kind,
                session,
                accumulator: Duration::ZERO,
            },
        );
        debug!(timer = id.get(), ?kind, session = session.get(), "timer scheduled");
        TimerHandle { id, kind, session }
    }

    /// Cancels the timer behind `handle`, returning `false` if it was already gone.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let removed = self.timers.remove(&handle.id).is_some();
        if removed {
            debug!(timer = handle.id.get(), kind = ?handle.kind, "timer cancelled");
        }
        removed
    }

    /// Cancels every timer scheduled for `session`, returning how many were removed.
    pub fn cancel_session(&mut self, session: SessionId) -> usize {
        self.cancel_matching(|timer| timer.session == session)
    }

    /// Cancels every scheduled timer.
    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    /// Reports whether the timer behind `handle` is still scheduled.
    #[must_use]
    pub fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.timers.contains_key(&handle.id)
    }

    /// Handles of every scheduled timer in scheduling order.
    #[must_use]
    pub fn scheduled(&self) -> Vec<TimerHandle> {
        self.timers
            .iter()
            .map(|(id, timer)| TimerHandle {
                id: *id,
                kind: timer.kind,
                session: timer.session,
            })
            .collect()
    }

    /// Consumes world events, maintains timers and emits tick commands.
    ///
    /// A game start replaces every timer with a fresh depletion timer, a
    /// countdown start replaces the session's countdown timer, and a game end
    /// cancels all of the session's timers. Elapsed time spanning several
    /// periods emits one command per period, depletion ahead of countdown
    /// within each period.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::GameStarted { session, .. } => {
                    self.cancel_all();
                    let _ = self.schedule(TimerKind::Depletion, *session);
                }
                Event::CountdownStarted { session, .. } => {
                    let session = *session;
                    let _ = self.cancel_matching(|timer| {
                        timer.session == session && timer.kind == TimerKind::Countdown
                    });
                    let _ = self.schedule(TimerKind::Countdown, session);
                }
                Event::GameEnded { session, .. } => {
                    let _ = self.cancel_session(*session);
                }
                Event::TimeAdvanced { dt } => self.advance(*dt, out),
                _ => {}
            }
        }
    }

    fn cancel_matching<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&Timer) -> bool,
    {
        let before = self.timers.len();
        self.timers.retain(|_, timer| !predicate(timer));
        before - self.timers.len()
    }

    fn advance(&mut self, dt: Duration, out: &mut Vec<Command>) {
        if self.period.is_zero() || dt.is_zero() {
            return;
        }

        let mut due: Vec<(TimerKind, TimerId, SessionId, u32)> = Vec::new();
        for (id, timer) in self.timers.iter_mut() {
            let accumulated = timer.accumulator.saturating_add(dt).as_nanos();
            let period = self.period.as_nanos();
            let elapsed_periods = accumulated / period;
            timer.accumulator =
                u64::try_from(accumulated % period).map_or(Duration::ZERO, Duration::from_nanos);
            let catch_up = u128::from(MAX_CATCH_UP_PERIODS);
            if elapsed_periods > catch_up {
                debug!(
                    timer = id.get(),
                    missed = %elapsed_periods,
                    "clock fell behind; dropping periods beyond catch-up limit"
                );
            }
            let fires =
                u32::try_from(elapsed_periods.min(catch_up)).unwrap_or(MAX_CATCH_UP_PERIODS);
            if fires > 0 {
                due.push((timer.kind, *id, timer.session, fires));
            }
        }

        due.sort_by_key(|(kind, id, _, _)| (*kind, *id));
        let rounds = due.iter().map(|(_, _, _, fires)| *fires).max().unwrap_or(0);
        for round in 0..rounds {
            for (kind, _, session, fires) in &due {
                if round < *fires {
                    out.push(kind.command(*session));
                }
            }
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
