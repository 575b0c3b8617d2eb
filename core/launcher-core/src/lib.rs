//! # launcher-core
//!
//! Core library for the game launcher: finds games in a directory tree,
//! starts them, watches them, and tears down their whole process tree on
//! request.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime. Every operation blocks its caller;
//!   front ends that need a responsive UI run them on a worker thread.
//! - **Thread-safe manager**: [`GameManager`] guards its tracked collection with
//!   a mutex, so a UI thread and the [`reconciler`] can share it via `Arc`.
//! - **Graceful degradation**: A missing games directory yields an empty list;
//!   failed launches and closes return `false` after logging.
//! - **No global logger**: The library only emits `tracing` events; the
//!   binary decides where they go.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use launcher_core::{load_config, scan_games_directory, GameManager, StorageConfig};
//!
//! let config = load_config(&StorageConfig::default());
//! let games = scan_games_directory(games_dir, &config.scan_options());
//! let manager = GameManager::new(config.manager_settings());
//! manager.launch(&games[0]);
//! ```

pub mod config;
pub mod error;
pub mod manager;
pub mod process;
pub mod reconciler;
pub mod scanner;
pub mod storage;
pub mod types;

pub use config::{load_config, read_config, save_config, LauncherConfig};
pub use error::{LauncherError, Result};
pub use manager::{CloseOutcome, GameManager, LaunchOutcome, ManagerSettings};
pub use process::TerminationReport;
pub use reconciler::{spawn_reconciler, ReconcilerHandle};
pub use scanner::{find_artwork, scan_games_directory, ScanOptions};
pub use storage::StorageConfig;
pub use types::{LaunchKind, LaunchTarget, RunState, RunningGame};
