//! Logging setup for the game-launcher binary.
//!
//! Two sinks: the console (stderr, `info` unless `RUST_LOG` says otherwise)
//! and a per-run file under `<data dir>/logs/` that always records `debug`.
//! `GAME_LAUNCHER_DEBUG_LOG=1` raises the console to `debug` as well.

use chrono::Local;
use fs_err as fs;
use std::env;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEBUG_ENV: &str = "GAME_LAUNCHER_DEBUG_LOG";

/// Installs the global subscriber. Keep the returned guard alive for the
/// whole run or buffered file output is lost.
pub fn init(logs_dir: &Path) -> Option<WorkerGuard> {
    let console_filter = if debug_enabled() {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let (file_layer, guard, file_error) = match fs::create_dir_all(logs_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::never(logs_dir, log_file_name());
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard), None)
        }
        Err(err) => (None, None, Some(err)),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    match file_error {
        Some(err) => {
            tracing::warn!(error = %err, "File logging disabled");
        }
        None => {
            tracing::debug!(dir = %logs_dir.display(), "Logger initialized");
        }
    }

    guard
}

fn debug_enabled() -> bool {
    env::var(DEBUG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false)
}

fn log_file_name() -> String {
    format!("launcher_{}.log", Local::now().format("%Y%m%d_%H%M%S"))
}
