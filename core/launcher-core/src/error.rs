//! Error types for launcher-core operations.
//!
//! The lifecycle manager's boolean API never lets these escape; they exist so
//! the typed API (`try_launch`, `try_close`) and the configuration layer can
//! report exactly what went wrong.

use std::path::PathBuf;

/// All errors that can occur in launcher-core operations.
#[derive(Debug, thiserror::Error)]
pub enum LauncherError {
    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Failed to start {name} ({path}): {source}")]
    Spawn {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{name} exited during startup with {status}")]
    EarlyExit { name: String, status: String },

    #[error("{name} is already running from {running}; cannot start {requested}")]
    NameConflict {
        name: String,
        running: PathBuf,
        requested: PathBuf,
    },

    #[error("Liveness check failed for {name} (pid {pid}): {source}")]
    LivenessCheck {
        name: String,
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot close {name} (pid {pid}): {source}")]
    CloseAttempt {
        name: String,
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results using LauncherError.
pub type Result<T> = std::result::Result<T, LauncherError>;

impl From<LauncherError> for String {
    fn from(err: LauncherError) -> String {
        err.to_string()
    }
}
