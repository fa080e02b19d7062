//! Geotrail CLI - Command-line interface
//!
//! Runs the adaptive location tracker against a recorded track, either live
//! against a remote endpoint or as an instant dry run, and manages the
//! persisted statistics and configuration.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::common::{load_config, resolve_config_path};
use commands::config::ConfigCommands;
use commands::run::RunArgs;
use commands::simulate::SimulateArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "geotrail", version, about = "Adaptive location tracking client")]
struct Cli {
    /// Config file to use instead of ~/.config/geotrail/config.ini
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Replay a track against the remote store in real time
    Run {
        /// JSON-lines track file (one sample or `null` per line)
        #[arg(long)]
        track: PathBuf,

        /// Remote store base URL (overrides remote.endpoint)
        #[arg(long)]
        endpoint: Option<String>,

        /// Bearer token (overrides remote.token)
        #[arg(long)]
        token: Option<String>,

        /// Stamp samples with the current time instead of the recorded one
        #[arg(long)]
        live: bool,
    },

    /// Dry-run a track against an in-memory store without waiting
    Simulate {
        /// JSON-lines track file (one sample or `null` per line)
        #[arg(long)]
        track: PathBuf,

        /// Store availability per tick: `o` = up, `x` = down (e.g. "ooxxxo")
        #[arg(long, default_value = "")]
        fail: String,
    },

    /// Show the persisted tracking statistics
    Stats {
        /// Reset all counters to zero
        #[arg(long)]
        reset: bool,
    },

    /// View or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = dispatch(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn dispatch(cli: Cli) -> Result<(), CliError> {
    let config_path = resolve_config_path(cli.config.as_deref())?;

    match cli.command {
        Commands::Config { command } => commands::config::run(command, &config_path),
        Commands::Stats { reset } => {
            let config = load_config(&config_path)?;
            commands::stats::run(reset, &config)
        }
        Commands::Run {
            track,
            endpoint,
            token,
            live,
        } => {
            let config = load_config(&config_path)?;
            commands::run::run(
                RunArgs {
                    track,
                    endpoint,
                    token,
                    live,
                },
                &config,
            )
        }
        Commands::Simulate { track, fail } => {
            let config = load_config(&config_path)?;
            commands::simulate::run(SimulateArgs { track, fail }, &config)
        }
    }
}
