#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the Disaster Survival Simulator in a terminal.

mod config;
mod input;
mod render;
mod simulation;

use std::{
    path::PathBuf,
    sync::mpsc::RecvTimeoutError,
    time::{Instant, SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use disaster_survival_core::{Command, GameOverReason, GameSnapshot};
use disaster_survival_storage::{FileStore, KeyValueStore};
use disaster_survival_system_feedback::Cue;
use disaster_survival_system_identity::Identity;
use disaster_survival_system_presence::{Presence, Timestamp};
use disaster_survival_system_scoring::ScoreStore;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use input::Input;
use simulation::Simulation;

#[derive(Debug, Parser)]
#[command(
    name = "disaster-survival",
    version,
    about = "Survive disasters by keeping health and resources above zero"
)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// JSON store, overriding `store_path` from the configuration.
    #[arg(long, global = true, value_name = "PATH")]
    store: Option<PathBuf>,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Log in and play a game in real time.
    Play {
        /// Account to log in with.
        #[arg(long)]
        username: String,
        /// Password for the account.
        #[arg(long)]
        password: String,
    },
    /// Print every recorded score, highest first.
    Leaderboard,
    /// Reset the persisted high score to zero.
    ResetHighScore,
    /// Drop stale players and list the remaining active ones.
    Players,
}

/// Entry point for the Disaster Survival command-line interface.
fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    let store = FileStore::new(cli.store.unwrap_or_else(|| config.store_path.clone()));
    debug!(path = %store.path().display(), "using store");

    match cli.command {
        CliCommand::Play { username, password } => play(&config, &store, &username, &password),
        CliCommand::Leaderboard => {
            let scores = ScoreStore::new(store);
            println!(
                "{}",
                render::leaderboard(&scores.leaderboard(), scores.high_score())
            );
            Ok(())
        }
        CliCommand::ResetHighScore => {
            ScoreStore::new(store)
                .reset_high_score()
                .context("failed to reset the high score")?;
            println!("High score reset to 0.");
            Ok(())
        }
        CliCommand::Players => {
            let mut presence = Presence::new(store, config.presence());
            let removed = presence
                .sweep(unix_now())
                .context("failed to sweep stale players")?;
            if !removed.is_empty() {
                info!(?removed, "dropped stale players");
            }
            println!("{}", render::players(&presence.active_players()));
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn play(config: &AppConfig, store: &FileStore, username: &str, password: &str) -> Result<()> {
    let mut identity = Identity::new(store.clone(), config.directory());
    let user = identity.login(username, password).context("login failed")?;
    let mut presence = Presence::new(store.clone(), config.presence());

    let outcome = run_session(config, store, &user.username, &mut presence);
    finish_session(&mut identity, &mut presence, &user.username, outcome)
}

fn run_session<S: KeyValueStore>(
    config: &AppConfig,
    store: &FileStore,
    username: &str,
    presence: &mut Presence<S>,
) -> Result<()> {
    let mut simulation = Simulation::new(store.clone(), config.clock());

    println!("{}", simulation.welcome_banner());
    println!(
        "Welcome, {}! High score: {}",
        username,
        simulation.high_score()
    );
    println!("Commands: {}", input::HELP);

    presence
        .heartbeat(username, unix_now())
        .context("failed to register presence")?;
    announce(simulation.submit(Command::StartGame {
        username: username.to_owned(),
    })?);

    let lines = input::spawn_reader();
    let period = config.tick_period();
    let mut last_tick = Instant::now();
    let mut shown = None;
    render_if_changed(&simulation, &mut shown);

    loop {
        let timeout = period.saturating_sub(last_tick.elapsed());
        match lines.recv_timeout(timeout) {
            Ok(line) => match input::parse(&line) {
                Some(Input::Quit) => break,
                Some(Input::Help) => println!("Commands: {}", input::HELP),
                Some(Input::Play(command)) => announce(simulation.submit(command)?),
                None => println!("Unknown command `{}`. Try: {}", line.trim(), input::HELP),
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if last_tick.elapsed() >= period {
            let now = Instant::now();
            let dt = now.duration_since(last_tick);
            last_tick = now;
            announce(simulation.submit(Command::Tick { dt })?);
            presence
                .heartbeat(username, unix_now())
                .context("failed to refresh presence")?;
        }

        render_if_changed(&simulation, &mut shown);
    }

    announce(simulation.submit(Command::EndGame {
        reason: GameOverReason::Forfeited,
    })?);
    render_if_changed(&simulation, &mut shown);
    Ok(())
}

/// Unregisters the player whether or not the session ended cleanly.
///
/// The session's own error takes precedence over cleanup failures.
fn finish_session<I, P>(
    identity: &mut Identity<I>,
    presence: &mut Presence<P>,
    username: &str,
    outcome: Result<()>,
) -> Result<()>
where
    I: KeyValueStore,
    P: KeyValueStore,
{
    let departed = presence
        .depart(username)
        .context("failed to unregister presence");
    let logged_out = identity.logout().context("failed to log out");
    info!(username, "player left");
    outcome.and(departed).and(logged_out)
}

fn announce(cues: Vec<Cue>) {
    for cue in cues {
        println!("{}", render::cue(cue));
    }
}

fn render_if_changed<S: KeyValueStore>(
    simulation: &Simulation<S>,
    shown: &mut Option<GameSnapshot>,
) {
    let snapshot = simulation.snapshot();
    if shown.as_ref() == Some(&snapshot) {
        return;
    }
    if render::is_game_over(&snapshot) {
        println!(
            "{}",
            render::game_over(&snapshot, simulation.last_result())
        );
    } else {
        println!("{}", render::status(&snapshot));
    }
    *shown = Some(snapshot);
}

fn unix_now() -> Timestamp {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    Timestamp::from_secs(elapsed.as_secs())
}
