//! Player input read from stdin on a background thread.

use std::{
    io::{self, BufRead},
    sync::mpsc::{self, Receiver},
    thread,
};

use disaster_survival_core::{Command, DisasterKind, SurvivalAction};
use rand::seq::SliceRandom;

/// Words understood by [`parse`], printed as a hint.
pub(crate) const HELP: &str =
    "earthquake | flood | fire | random | shelter | water | aid | survive | restart | quit";

/// A single line of player input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Input {
    Play(Command),
    Quit,
    Help,
}

/// Interprets a line typed by the player; `None` for anything unrecognised.
pub(crate) fn parse(line: &str) -> Option<Input> {
    let word = line.trim().to_ascii_lowercase();
    let command = match word.as_str() {
        "quit" | "exit" => return Some(Input::Quit),
        "help" | "?" => return Some(Input::Help),
        "random" => {
            let kind = DisasterKind::ALL.choose(&mut rand::thread_rng()).copied()?;
            Command::SelectDisaster { kind }
        }
        "survive" => Command::AccrueScore,
        "restart" => Command::Restart,
        _ => {
            if let Ok(kind) = word.parse::<DisasterKind>() {
                Command::SelectDisaster { kind }
            } else {
                let action = word.parse::<SurvivalAction>().ok()?;
                Command::ApplyAction { action }
            }
        }
    };
    Some(Input::Play(command))
}

/// Forwards stdin lines to the returned channel until stdin closes.
pub(crate) fn spawn_reader() -> Receiver<String> {
    let (sender, receiver) = mpsc::channel();
    let _ = thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if sender.send(line).is_err() {
                break;
            }
        }
    });
    receiver
}
