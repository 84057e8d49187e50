//! Plain-text presentation of game state for the terminal.

use std::fmt::Write as _;

use disaster_survival_core::{GameSnapshot, Phase};
use disaster_survival_system_feedback::Cue;
use disaster_survival_system_presence::PlayerPresence;
use disaster_survival_system_scoring::{GameResult, ScoreEntry};

/// Remaining countdown ticks at or below which the timer is flagged.
const RED_ALERT_TICKS: u32 = 10;

/// One-line summary of a running game.
pub(crate) fn status(snapshot: &GameSnapshot) -> String {
    let time = if snapshot.countdown_active && snapshot.time_left <= RED_ALERT_TICKS {
        format!("{:>2} RED ALERT", snapshot.time_left)
    } else if snapshot.countdown_active {
        format!("{:>2}", snapshot.time_left)
    } else {
        "--".to_owned()
    };
    let disaster = snapshot.disaster.map_or("none", |kind| kind.name());
    format!(
        "{} | health {:>3} | resources {:>3} | score {:>4} | time {} | disaster {}",
        snapshot.username,
        snapshot.gauges.health().get(),
        snapshot.gauges.resources().get(),
        snapshot.score,
        time,
        disaster,
    )
}

/// Game over notice, including the persisted outcome once recorded.
pub(crate) fn game_over(snapshot: &GameSnapshot, result: Option<&GameResult>) -> String {
    let reason = snapshot.reason.map_or("Game Over", |reason| reason.message());
    let mut text = format!("GAME OVER: {reason}. Final score {}.", snapshot.score);
    if let Some(result) = result.filter(|result| result.session == snapshot.session) {
        if result.new_high_score {
            text.push_str(" New high score!");
        } else {
            let _ = write!(text, " High score {}.", result.high_score);
        }
    }
    text.push_str(" Type `restart` to play again or `quit` to leave.");
    text
}

/// Describes a cue for a terminal without audio.
pub(crate) fn cue(cue: Cue) -> String {
    match cue.sound_file() {
        Some(file) => format!("[sound] {file}"),
        None => "[sound] stop".to_owned(),
    }
}

/// Ranked leaderboard followed by the high score.
pub(crate) fn leaderboard(entries: &[ScoreEntry], high_score: u32) -> String {
    let mut text = String::new();
    if entries.is_empty() {
        text.push_str("No games recorded yet.\n");
    }
    for (rank, entry) in entries.iter().enumerate() {
        let _ = writeln!(text, "{:>3}. {:<16} {:>5}", rank + 1, entry.username, entry.score);
    }
    let _ = write!(text, "High score: {high_score}");
    text
}

/// Active players, one per line.
pub(crate) fn players(players: &[PlayerPresence]) -> String {
    if players.is_empty() {
        return "No active players.".to_owned();
    }
    players
        .iter()
        .map(|player| {
            format!(
                "{} (last active {})",
                player.username,
                player.last_active.as_secs()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether `snapshot` should be reported with [`game_over`].
pub(crate) fn is_game_over(snapshot: &GameSnapshot) -> bool {
    snapshot.phase == Phase::GameOver
}
