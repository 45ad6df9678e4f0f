//! replaycast CLI
//!
//! Plans broadcast camera scripts from replay events and plays them back
//! against a live replay.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use cast_events::{parse_game_time, GameSeconds};

mod commands;

/// replaycast - automated camera direction for game replays
#[derive(Parser)]
#[command(name = "replaycast")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prioritize replay events and compile a camera script
    Plan {
        /// Event file (.jsonl or .json); other formats fall back to synthetic events
        #[arg(short, long)]
        events: PathBuf,

        /// Replay length, in seconds or M:SS
        #[arg(short, long, value_parser = parse_duration)]
        duration: GameSeconds,

        /// Player name, repeat once per player
        #[arg(short, long = "player")]
        players: Vec<String>,

        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        out: PathBuf,
    },

    /// Print a camera script
    Show {
        /// Script file (JSON)
        #[arg(short, long)]
        script: PathBuf,
    },

    /// Run a camera script against a live replay
    Run {
        /// Script file (JSON)
        #[arg(short, long)]
        script: PathBuf,

        /// Replay length, in seconds or M:SS; defaults to the script's
        #[arg(short, long, value_parser = parse_duration)]
        duration: Option<GameSeconds>,

        /// File holding the latest recognized timer text
        #[arg(short, long)]
        timer_file: PathBuf,

        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Playback speed multiplier
        #[arg(long)]
        speed: Option<f64>,
    },

    /// Print the default configuration
    Config,
}

fn parse_duration(s: &str) -> Result<GameSeconds, String> {
    if let Ok(seconds) = s.parse::<GameSeconds>() {
        return Ok(seconds);
    }
    parse_game_time(s).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Plan {
            events,
            duration,
            players,
            config,
            out,
        } => commands::plan::run(&events, duration, &players, config.as_deref(), &out),
        Commands::Show { script } => commands::show::run(&script),
        Commands::Run {
            script,
            duration,
            timer_file,
            config,
            speed,
        } => {
            commands::live::run(&script, duration, &timer_file, config.as_deref(), speed).await
        }
        Commands::Config => {
            print!("{}", director::default_config_toml());
            Ok(())
        }
    }
}
