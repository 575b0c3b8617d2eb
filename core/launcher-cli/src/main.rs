//! game-launcher: find, start and stop local games.
//!
//! ## Subcommands
//!
//! - `scan`: list the games found in a directory
//! - `launch`: start one game and follow it until it exits
//! - `shell`: interactive console front end
//! - `config`: show (or initialize) the configuration

mod config_cmd;
mod launch;
mod logging;
mod scan;
mod shell;

use clap::{Parser, Subcommand};
use launcher_core::{load_config, LauncherConfig, StorageConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "game-launcher")]
#[command(about = "Find, start and stop local games")]
#[command(version)]
struct Cli {
    /// Data directory for configuration and logs (default: ~/.game-launcher)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List games found under a directory
    Scan {
        /// Games directory (default: games_dir from config)
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Launch one game and wait for it to exit
    Launch {
        /// Game name (case-insensitive)
        #[arg(value_name = "NAME")]
        name: String,

        /// Games directory (default: games_dir from config)
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Close the game after this many seconds
        #[arg(long, value_name = "SECS")]
        close_after: Option<u64>,
    },

    /// Interactive console launcher
    Shell {
        /// Games directory (default: games_dir from config)
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Show the effective configuration
    Config {
        /// Write the default configuration if none exists
        #[arg(long)]
        init: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let storage = cli
        .data_dir
        .map(StorageConfig::with_root)
        .unwrap_or_default();
    let _logging_guard = logging::init(&storage.logs_dir());
    let config = load_config(&storage);

    let result = match cli.command {
        Commands::Scan { dir, json } => scan::run(dir, json, &config),
        Commands::Launch {
            name,
            dir,
            close_after,
        } => launch::run(&name, dir, close_after, &config),
        Commands::Shell { dir } => shell::run(dir, &config),
        Commands::Config { init } => config_cmd::run(&storage, &config, init),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "game-launcher failed");
        std::process::exit(1);
    }
}

/// Directory from the command line, falling back to the configured one.
fn resolve_games_dir(dir: Option<PathBuf>, config: &LauncherConfig) -> Result<PathBuf, String> {
    dir.or_else(|| config.games_dir.clone()).ok_or_else(|| {
        "No games directory given and games_dir is not set in config.json".to_string()
    })
}
