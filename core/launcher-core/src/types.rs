//! Core types shared by the scanner, the lifecycle manager and every front end.
//!
//! Identity ([`LaunchTarget`]) is kept apart from runtime state ([`RunState`]):
//! a target is plain data that front ends can clone freely, while the live
//! process handle stays owned by the manager.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ═══════════════════════════════════════════════════════════════════════════════
// Launch Targets
// ═══════════════════════════════════════════════════════════════════════════════

/// A named reference to a game's executable artifact and optional artwork.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchTarget {
    /// Unique name within a collection; used as the lookup key.
    pub name: String,
    /// Executable, script or shortcut artifact.
    pub path: PathBuf,
    /// Artwork image, if one was found next to the target.
    pub artwork: Option<PathBuf>,
}

impl LaunchTarget {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            artwork: None,
        }
    }

    pub fn with_artwork(mut self, artwork: impl Into<PathBuf>) -> Self {
        self.artwork = Some(artwork.into());
        self
    }

    /// Directory the game is started from, so relative asset paths resolve.
    pub fn working_dir(&self) -> Option<&Path> {
        self.path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
    }
}

impl fmt::Display for LaunchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.path.display())
    }
}

pub(crate) fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Launch Kind
// ═══════════════════════════════════════════════════════════════════════════════

/// How a target is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchKind {
    /// Spawned as a process of its own.
    Direct,
    /// Not directly executable; handed to the platform opener.
    ///
    /// The tracked handle is the opener, not the game. Once the opener hands
    /// off and exits, the next reconcile pass drops the record even though the
    /// game itself may still be running.
    Shortcut,
}

impl LaunchKind {
    /// Classifies a path by its extension (case-insensitive).
    pub fn classify(path: &Path, shortcut_extensions: &[String]) -> Self {
        match lowercase_extension(path) {
            Some(ext)
                if shortcut_extensions
                    .iter()
                    .any(|candidate| candidate.eq_ignore_ascii_case(&ext)) =>
            {
                LaunchKind::Shortcut
            }
            _ => LaunchKind::Direct,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runtime State
// ═══════════════════════════════════════════════════════════════════════════════

/// Last-known runtime state of a game, as seen by the lifecycle manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    NotRunning,
    Running {
        pid: u32,
        kind: LaunchKind,
        launched_at: DateTime<Utc>,
    },
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running { .. })
    }

    pub fn pid(&self) -> Option<u32> {
        match self {
            RunState::Running { pid, .. } => Some(*pid),
            RunState::NotRunning => None,
        }
    }
}

/// Snapshot of one tracked game, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunningGame {
    pub name: String,
    pub path: PathBuf,
    pub pid: u32,
    pub kind: LaunchKind,
    pub launched_at: DateTime<Utc>,
}
