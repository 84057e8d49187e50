#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Translates world events into symbolic audio cues.

use disaster_survival_core::{DisasterKind, Event};

/// Sound played when a game ends.
pub const GAME_OVER_SOUND: &str = "game-over.mp3";

/// Request handed to an external audio player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cue {
    /// Plays the sound associated with a disaster.
    Disaster(DisasterKind),
    /// Plays the game over sound.
    GameOver,
    /// Stops any playback in progress.
    Silence,
}

impl Cue {
    /// Sound asset to play for the cue, `None` when playback should stop.
    #[must_use]
    pub const fn sound_file(self) -> Option<&'static str> {
        match self {
            Self::Disaster(DisasterKind::Earthquake) => Some("earthquake.mp3"),
            Self::Disaster(DisasterKind::Flood) => Some("flood.mp3"),
            Self::Disaster(DisasterKind::Fire) => Some("fire.mp3"),
            Self::GameOver => Some(GAME_OVER_SOUND),
            Self::Silence => None,
        }
    }
}

/// Stateless system mapping events to cues.
#[derive(Debug, Default)]
pub struct Feedback;

impl Feedback {
    /// Creates the feedback system.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Appends a cue for every event that warrants one.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Cue>) {
        for event in events {
            let cue = match event {
                Event::GameStarted { .. } => Cue::Silence,
                Event::DisasterStruck { kind, .. } => Cue::Disaster(*kind),
                Event::GameEnded { .. } => Cue::GameOver,
                _ => continue,
            };
            out.push(cue);
        }
    }
}
