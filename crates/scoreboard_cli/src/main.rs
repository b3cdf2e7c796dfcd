//! Scoreboard CLI
//!
//! Controller and display front-ends sharing one file-backed store.
//! Separate processes have no in-process bus, so displays follow the
//! controller through the mailbox and the persisted match-state key.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::filter::EnvFilter;

use scoreboard_core::interpolator::{format_clock, format_split};
use scoreboard_core::models::{LastEvent, MatchSetup};
use scoreboard_core::store::save_setup;
use scoreboard_core::sync::Envelope;
use scoreboard_core::{
    Command, FileStore, KeyValueStore, MatchController, ScoreboardConfig, ScoreboardReader,
    Snapshot, SystemClock, TimeSource,
};

/// Controller input is checked this often while idle
const CONTROLLER_TICK: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "scoreboard")]
#[command(about = "Live match scoreboard: one controller, many displays", long_about = None)]
struct Cli {
    /// Directory of the shared store
    #[arg(long, global = true, default_value = ".scoreboard")]
    store: PathBuf,

    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save the operator setup consumed when the controller starts
    Setup {
        #[arg(long, default_value = "local")]
        match_id: String,

        #[arg(long, default_value = "Team A")]
        home: String,

        #[arg(long, default_value = "Team B")]
        away: String,

        /// Full match length in minutes
        #[arg(long, default_value = "90")]
        duration: u32,
    },

    /// Run the authoritative controller, reading commands from stdin
    Controller {
        #[arg(long, default_value = "local")]
        match_id: String,

        /// Kick off immediately if the match has not started
        #[arg(long, default_value = "false")]
        auto_start: bool,
    },

    /// Follow a match and print the scoreboard
    Display {
        #[arg(long, default_value = "local")]
        match_id: String,

        /// Print the current state once and exit
        #[arg(long, default_value = "false")]
        once: bool,
    },

    /// Print the JSON schema of the sync envelope
    Schema,
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ScoreboardConfig> {
    match path {
        Some(path) => ScoreboardConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(ScoreboardConfig::default()),
    }
}

fn open_store(dir: &Path) -> Result<Arc<dyn KeyValueStore>> {
    let store = FileStore::open(dir)
        .with_context(|| format!("Failed to open store at {}", dir.display()))?;
    Ok(Arc::new(store))
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Setup { match_id, home, away, duration } => {
            let setup = MatchSetup::new(home, away, duration).checked()?;
            let store = open_store(&cli.store)?;
            save_setup(store.as_ref(), &match_id, &setup)?;
            println!(
                "✅ Setup saved for {}: {} vs {} ({} min)",
                match_id, setup.team_a.name, setup.team_b.name, setup.match_duration
            );
        }

        Commands::Controller { match_id, auto_start } => {
            let config = load_config(cli.config.as_deref())?;
            let store = open_store(&cli.store)?;
            run_controller(&match_id, &config, store, auto_start)?;
        }

        Commands::Display { match_id, once } => {
            let config = load_config(cli.config.as_deref())?;
            let store = open_store(&cli.store)?;
            run_display(&match_id, &config, store, once)?;
        }

        Commands::Schema => {
            let schema = Envelope::wire_schema();
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }

    Ok(())
}

fn status_line(snapshot: &Snapshot) -> String {
    let record = &snapshot.record;
    let derived = &snapshot.derived;
    format!(
        "{} {} - {} {} | {} | {}{}",
        record.teams.home.name,
        record.score.home,
        record.score.away,
        record.teams.away.name,
        record.period.label(),
        format_split(derived.main_elapsed, derived.extra_elapsed),
        if record.timer.running { "" } else { " (paused)" },
    )
}

fn run_controller(
    match_id: &str,
    config: &ScoreboardConfig,
    store: Arc<dyn KeyValueStore>,
    auto_start: bool,
) -> Result<()> {
    let time: Arc<dyn TimeSource> = Arc::new(SystemClock);
    let mut controller = MatchController::start(match_id, config, time, store, None)?;
    if auto_start {
        controller.execute(Command::AutoStart);
    }
    println!("{}", status_line(&controller.snapshot()));

    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    loop {
        match rx.recv_timeout(CONTROLLER_TICK) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if matches!(line, "quit" | "exit") {
                    break;
                }
                if controller.execute_line(line) {
                    println!("{}", status_line(&controller.snapshot()));
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if let Some(period) = controller.tick() {
            println!("⏱  {} | {}", period.label(), status_line(&controller.snapshot()));
        }
    }

    controller.close();
    Ok(())
}

fn run_display(
    match_id: &str,
    config: &ScoreboardConfig,
    store: Arc<dyn KeyValueStore>,
    once: bool,
) -> Result<()> {
    let time: Arc<dyn TimeSource> = Arc::new(SystemClock);
    let mut reader = ScoreboardReader::open(match_id, config, time, None, Some(store))?;

    if once {
        match reader.snapshot() {
            Some(snapshot) => println!("{}", status_line(snapshot)),
            None => println!("No state for match {}", match_id),
        }
        reader.close();
        return Ok(());
    }

    let interval = Duration::from_millis(config.display.render_interval_ms.max(1));
    let mut last_line = String::new();
    loop {
        let update = reader.tick();

        if let Some(event) = update.new_event {
            match event {
                LastEvent::Goal(goal) => {
                    println!("⚽ GOAL {} {}' {}", goal.side, goal.minute, goal.scorer)
                }
                LastEvent::Sub(sub) => println!(
                    "🔁 SUB {} {} {}' {} / {}",
                    sub.side,
                    sub.kind,
                    sub.minute,
                    sub.in_name.as_deref().unwrap_or("-"),
                    sub.out_name.as_deref().unwrap_or("-"),
                ),
            }
        }
        if let Some(milestone) = update.milestone {
            println!("⏰ {} reached {}", milestone.period.label(), format_clock(milestone.target_ms));
        }

        if let (Some(frame), Some(snapshot)) = (update.frame, reader.snapshot()) {
            let record = &snapshot.record;
            let line = format!(
                "{} {} - {} {} | {} | {}",
                record.teams.home.name,
                record.score.home,
                record.score.away,
                record.teams.away.name,
                frame.period.label(),
                frame.display,
            );
            if line != last_line {
                println!("{}", line);
                last_line = line;
            }
        }

        thread::sleep(interval);
    }
}
