//! Game process lifecycle: launch, close, reconcile.
//!
//! [`GameManager`] owns the tracked collection, a map from game name to the
//! live process it spawned. A name is in the map exactly when the game is
//! believed to be running, so "running without a handle" cannot be expressed.
//!
//! ```text
//!              launch                close / exit seen by reconcile
//! NotRunning ─────────▶ Running ─────────────────────────────────▶ NotRunning
//! ```
//!
//! Every operation is synchronous and runs on the caller's thread. Launch,
//! reconcile and the queries hold the map's mutex for their whole run. Close
//! takes the game out of the map first and waits for the process tree without
//! the lock, so queries about other games stay responsive; while a close is in
//! progress the game reads as not running but cannot be launched again.
//!
//! The boolean methods ([`GameManager::launch`], [`GameManager::close`]) log and
//! swallow every failure; the `try_` variants expose the typed outcome.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::io;
use std::process::{Child, Command, Stdio};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use crate::config::{DEFAULT_CLOSE_TIMEOUT_MS, DEFAULT_LAUNCH_SETTLE_MS};
use crate::error::{LauncherError, Result};
use crate::process::{terminate_tree, TerminationReport};
use crate::types::{LaunchKind, LaunchTarget, RunState, RunningGame};

const DEFAULT_EXIT_POLL_MS: u64 = 100;

/// Timing and launch policy for [`GameManager`].
#[derive(Debug, Clone)]
pub struct ManagerSettings {
    /// Pause after spawning so immediate failures surface as failed launches.
    pub launch_settle: Duration,
    /// Grace period between the termination request and the forced kill.
    pub close_timeout: Duration,
    /// Poll step while waiting for processes to exit.
    pub exit_poll: Duration,
    /// Extensions launched through the platform opener.
    pub shortcut_extensions: Vec<String>,
    /// Opener override; the shortcut path is appended as the last argument.
    pub shortcut_opener: Option<Vec<String>>,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            launch_settle: Duration::from_millis(DEFAULT_LAUNCH_SETTLE_MS),
            close_timeout: Duration::from_millis(DEFAULT_CLOSE_TIMEOUT_MS),
            exit_poll: Duration::from_millis(DEFAULT_EXIT_POLL_MS),
            shortcut_extensions: crate::config::LauncherConfig::default().shortcut_extensions,
            shortcut_opener: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    Launched { pid: u32, kind: LaunchKind },
    AlreadyRunning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed(TerminationReport),
    NotRunning,
}

struct TrackedGame {
    target: LaunchTarget,
    child: Child,
    kind: LaunchKind,
    launched_at: DateTime<Utc>,
}

impl TrackedGame {
    fn pid(&self) -> u32 {
        self.child.id()
    }

    fn run_state(&self) -> RunState {
        RunState::Running {
            pid: self.pid(),
            kind: self.kind,
            launched_at: self.launched_at,
        }
    }

    fn snapshot(&self) -> RunningGame {
        RunningGame {
            name: self.target.name.clone(),
            path: self.target.path.clone(),
            pid: self.pid(),
            kind: self.kind,
            launched_at: self.launched_at,
        }
    }
}

#[derive(Default)]
struct Tracked {
    games: HashMap<String, TrackedGame>,
    /// Names whose close is in flight, outside the lock.
    closing: HashSet<String>,
}

pub struct GameManager {
    settings: ManagerSettings,
    running: Mutex<Tracked>,
}

impl Default for GameManager {
    fn default() -> Self {
        Self::new(ManagerSettings::default())
    }
}

impl GameManager {
    pub fn new(settings: ManagerSettings) -> Self {
        Self {
            settings,
            running: Mutex::new(Tracked::default()),
        }
    }

    // Recover from poisoning: a panic elsewhere must not wedge every game as
    // "running" forever.
    fn tracked(&self) -> MutexGuard<'_, Tracked> {
        self.running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Launch
    // ─────────────────────────────────────────────────────────────────────────

    /// Starts a game. Returns false if it is already running or fails to start.
    pub fn launch(&self, target: &LaunchTarget) -> bool {
        match self.try_launch(target) {
            Ok(LaunchOutcome::Launched { .. }) => true,
            Ok(LaunchOutcome::AlreadyRunning) => false,
            Err(err) => {
                tracing::error!(
                    game = %target.name,
                    path = %target.path.display(),
                    error = %err,
                    error_debug = ?err,
                    "Failed to launch game"
                );
                false
            }
        }
    }

    /// Names are the tracking key: a different game under a name that is
    /// already running is refused with [`LauncherError::NameConflict`].
    pub fn try_launch(&self, target: &LaunchTarget) -> Result<LaunchOutcome> {
        let mut tracked = self.tracked();
        if let Some(game) = tracked.games.get(&target.name) {
            if game.target.path != target.path {
                return Err(LauncherError::NameConflict {
                    name: target.name.clone(),
                    running: game.target.path.clone(),
                    requested: target.path.clone(),
                });
            }
            tracing::info!(game = %target.name, "Game is already running");
            return Ok(LaunchOutcome::AlreadyRunning);
        }
        if tracked.closing.contains(&target.name) {
            tracing::info!(game = %target.name, "Game is still closing");
            return Ok(LaunchOutcome::AlreadyRunning);
        }

        let kind = LaunchKind::classify(&target.path, &self.settings.shortcut_extensions);
        let mut child = self
            .build_command(target, kind)
            .and_then(|mut command| command.spawn())
            .map_err(|source| LauncherError::Spawn {
                name: target.name.clone(),
                path: target.path.clone(),
                source,
            })?;
        let pid = child.id();

        thread::sleep(self.settings.launch_settle);

        match child.try_wait() {
            Ok(None) => {}
            Ok(Some(status)) if !status.success() => {
                return Err(LauncherError::EarlyExit {
                    name: target.name.clone(),
                    status: status.to_string(),
                });
            }
            Ok(Some(status)) => {
                // Typical for shortcuts: the opener hands off and quits. The
                // game is no longer observable and the next reconcile drops it.
                tracing::debug!(
                    game = %target.name,
                    pid,
                    kind = ?kind,
                    status = %status,
                    "Launched process exited during startup"
                );
            }
            Err(err) => {
                tracing::warn!(game = %target.name, pid, error = %err, "Could not query new process");
            }
        }

        tracing::info!(game = %target.name, pid, kind = ?kind, "Game launched");
        tracked.games.insert(
            target.name.clone(),
            TrackedGame {
                target: target.clone(),
                child,
                kind,
                launched_at: Utc::now(),
            },
        );
        Ok(LaunchOutcome::Launched { pid, kind })
    }

    fn build_command(&self, target: &LaunchTarget, kind: LaunchKind) -> io::Result<Command> {
        let mut command = match kind {
            LaunchKind::Direct => Command::new(&target.path),
            LaunchKind::Shortcut => self.opener_command(target)?,
        };
        if let Some(dir) = target.working_dir() {
            command.current_dir(dir);
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        Ok(command)
    }

    fn opener_command(&self, target: &LaunchTarget) -> io::Result<Command> {
        if let Some((program, args)) = self
            .settings
            .shortcut_opener
            .as_deref()
            .and_then(<[String]>::split_first)
        {
            let mut command = Command::new(program);
            command.args(args).arg(&target.path);
            return Ok(command);
        }

        open::commands(&target.path)
            .into_iter()
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::Unsupported,
                    "no platform opener available for shortcuts",
                )
            })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Close
    // ─────────────────────────────────────────────────────────────────────────

    /// Terminates a game and its descendants. Returns false if it was not
    /// running or its process could not be queried.
    pub fn close(&self, name: &str) -> bool {
        match self.try_close(name) {
            Ok(CloseOutcome::Closed(_)) => true,
            Ok(CloseOutcome::NotRunning) => false,
            Err(err) => {
                tracing::error!(game = %name, error = %err, error_debug = ?err, "Failed to close game");
                false
            }
        }
    }

    /// On failure the game stays tracked, exactly as before the call.
    pub fn try_close(&self, name: &str) -> Result<CloseOutcome> {
        let mut game = {
            let mut tracked = self.tracked();
            let Some(game) = tracked.games.remove(name) else {
                tracing::info!(game = %name, "Game is not running");
                return Ok(CloseOutcome::NotRunning);
            };
            tracked.closing.insert(name.to_string());
            game
        };

        let pid = game.pid();
        let result = terminate_tree(
            &mut game.child,
            self.settings.close_timeout,
            self.settings.exit_poll,
        );

        let mut tracked = self.tracked();
        tracked.closing.remove(name);
        let report = match result {
            Ok(report) => report,
            Err(source) => {
                // Launch refuses closing names, so the slot is still free.
                tracked.games.insert(name.to_string(), game);
                return Err(LauncherError::CloseAttempt {
                    name: name.to_string(),
                    pid,
                    source,
                });
            }
        };

        tracing::info!(
            game = %name,
            pid,
            descendants = report.descendants,
            forced = report.forced,
            already_exited = report.root_already_exited,
            "Game closed"
        );
        Ok(CloseOutcome::Closed(report))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reconcile
    // ─────────────────────────────────────────────────────────────────────────

    /// Drops every tracked game whose process has exited and returns their
    /// names, sorted.
    ///
    /// This is the only place exits that bypass [`GameManager::close`] (crash,
    /// window closed, external kill) are noticed; callers run it on a timer.
    /// A game whose liveness cannot be determined is dropped as well.
    ///
    /// Shortcut launches are tracked through the opener process, which usually
    /// exits right away; such games are dropped on the first pass even if the
    /// game itself keeps running.
    pub fn reconcile(&self) -> Vec<String> {
        let mut tracked = self.tracked();
        let mut exited = Vec::new();

        tracked.games.retain(|name, game| match game.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                tracing::info!(
                    game = %name,
                    pid = game.pid(),
                    status = %status,
                    kind = ?game.kind,
                    "Game exited"
                );
                if game.kind == LaunchKind::Shortcut {
                    tracing::debug!(
                        game = %name,
                        "Shortcut opener exited; the game itself is not tracked"
                    );
                }
                exited.push(name.clone());
                false
            }
            Err(source) => {
                let err = LauncherError::LivenessCheck {
                    name: name.clone(),
                    pid: game.pid(),
                    source,
                };
                tracing::warn!(error = %err, "Treating game as exited");
                exited.push(name.clone());
                false
            }
        });

        exited.sort();
        exited
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub fn is_running(&self, name: &str) -> bool {
        self.tracked().games.contains_key(name)
    }

    pub fn state_of(&self, name: &str) -> RunState {
        self.tracked()
            .games
            .get(name)
            .map(TrackedGame::run_state)
            .unwrap_or(RunState::NotRunning)
    }

    /// Every tracked game, sorted by name.
    pub fn running_games(&self) -> Vec<RunningGame> {
        let mut games: Vec<_> = self
            .tracked()
            .games
            .values()
            .map(TrackedGame::snapshot)
            .collect();
        games.sort_by(|a, b| a.name.cmp(&b.name));
        games
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fast_settings() -> ManagerSettings {
        ManagerSettings {
            launch_settle: Duration::from_millis(50),
            close_timeout: Duration::from_millis(500),
            ..ManagerSettings::default()
        }
    }

    #[test]
    fn test_launch_missing_executable_fails_without_tracking() {
        let manager = GameManager::new(fast_settings());
        let target = LaunchTarget::new("Ghost", "/definitely/not/here/ghost.exe");

        assert!(!manager.launch(&target));
        assert!(!manager.is_running("Ghost"));
        assert!(matches!(
            manager.try_launch(&target),
            Err(LauncherError::Spawn { .. })
        ));
    }

    #[test]
    fn test_close_untracked_game_is_noop() {
        let manager = GameManager::new(fast_settings());
        assert!(!manager.close("Solitaire"));
        assert!(matches!(
            manager.try_close("Solitaire"),
            Ok(CloseOutcome::NotRunning)
        ));
    }

    #[test]
    fn test_reconcile_on_empty_collection() {
        let manager = GameManager::new(fast_settings());
        assert!(manager.reconcile().is_empty());
        assert!(manager.running_games().is_empty());
        assert_eq!(manager.state_of("Solitaire"), RunState::NotRunning);
    }

    #[test]
    fn test_opener_override_appends_path() {
        let manager = GameManager::new(ManagerSettings {
            shortcut_opener: Some(vec!["gio".to_string(), "open".to_string()]),
            ..fast_settings()
        });
        let target = LaunchTarget::new("Quake", PathBuf::from("/games/quake/Quake.desktop"));

        let command = manager.build_command(&target, LaunchKind::Shortcut).unwrap();
        let args: Vec<_> = command.get_args().map(|a| a.to_os_string()).collect();

        assert_eq!(command.get_program(), "gio");
        assert_eq!(args, vec!["open", "/games/quake/Quake.desktop"]);
        assert_eq!(
            command.get_current_dir(),
            Some(std::path::Path::new("/games/quake"))
        );
    }

    #[test]
    fn test_direct_command_runs_from_game_directory() {
        let manager = GameManager::new(fast_settings());
        let target = LaunchTarget::new("Doom", "/games/doom/doom.exe");

        let command = manager.build_command(&target, LaunchKind::Direct).unwrap();
        assert_eq!(command.get_program(), "/games/doom/doom.exe");
        assert_eq!(
            command.get_current_dir(),
            Some(std::path::Path::new("/games/doom"))
        );
    }
}
