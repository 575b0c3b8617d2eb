//! Launcher configuration loading and saving.
//!
//! Missing files fall back to defaults; a malformed file is reported with a
//! warning and also falls back to defaults, so a bad edit never stops the
//! launcher from starting.

use crate::error::{LauncherError, Result};
use crate::manager::ManagerSettings;
use crate::scanner::ScanOptions;
use crate::storage::StorageConfig;
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
pub const DEFAULT_LAUNCH_SETTLE_MS: u64 = 500;
pub const DEFAULT_CLOSE_TIMEOUT_MS: u64 = 5_000;
/// Floor for `poll_interval_ms`; anything lower would spin on the manager lock.
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

pub(crate) const DEFAULT_EXECUTABLE_EXTENSIONS: &[&str] =
    &["exe", "lnk", "bat", "cmd", "sh", "desktop", "url"];
const DEFAULT_SHORTCUT_EXTENSIONS: &[&str] = &["lnk", "url", "desktop"];

/// User preferences, stored as JSON in `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Directory scanned when no directory is given on the command line.
    pub games_dir: Option<PathBuf>,
    /// Reconcile cadence.
    pub poll_interval_ms: u64,
    /// Delay after spawning before a launch is reported.
    pub launch_settle_ms: u64,
    /// How long close waits for graceful exit before killing.
    pub close_timeout_ms: u64,
    /// Extensions (without dot) the scanner treats as games.
    pub executable_extensions: Vec<String>,
    /// Extensions started through the platform opener.
    pub shortcut_extensions: Vec<String>,
    /// Program (plus leading arguments) used to open shortcuts instead of the
    /// platform default. The shortcut path is appended as the last argument.
    pub shortcut_opener: Option<Vec<String>>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            games_dir: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            launch_settle_ms: DEFAULT_LAUNCH_SETTLE_MS,
            close_timeout_ms: DEFAULT_CLOSE_TIMEOUT_MS,
            executable_extensions: to_strings(DEFAULT_EXECUTABLE_EXTENSIONS),
            shortcut_extensions: to_strings(DEFAULT_SHORTCUT_EXTENSIONS),
            shortcut_opener: None,
        }
    }
}

impl LauncherConfig {
    pub fn poll_interval(&self) -> Duration {
        if self.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            tracing::warn!(
                configured_ms = self.poll_interval_ms,
                using_ms = MIN_POLL_INTERVAL_MS,
                "poll_interval_ms too small"
            );
        }
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }

    /// Settings for [`crate::GameManager`].
    pub fn manager_settings(&self) -> ManagerSettings {
        ManagerSettings {
            launch_settle: Duration::from_millis(self.launch_settle_ms),
            close_timeout: Duration::from_millis(self.close_timeout_ms),
            shortcut_extensions: self.shortcut_extensions.clone(),
            shortcut_opener: self
                .shortcut_opener
                .clone()
                .filter(|argv| !argv.is_empty()),
            ..ManagerSettings::default()
        }
    }

    /// Options for [`crate::scan_games_directory`].
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            executable_extensions: self.executable_extensions.clone(),
            ..ScanOptions::default()
        }
    }
}

pub(crate) fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// Loads the configuration, returning defaults if the file is missing or unreadable.
pub fn load_config(storage: &StorageConfig) -> LauncherConfig {
    let path = storage.config_file();
    match read_config(&path) {
        Ok(Some(config)) => config,
        Ok(None) => LauncherConfig::default(),
        Err(err) => {
            tracing::warn!(error = %err, path = %path.display(), "Using default configuration");
            LauncherConfig::default()
        }
    }
}

/// Reads a configuration file. `Ok(None)` means the file does not exist.
pub fn read_config(path: &Path) -> Result<Option<LauncherConfig>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(LauncherError::Io {
                context: "reading configuration".to_string(),
                source,
            })
        }
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|err| LauncherError::ConfigMalformed {
            path: path.to_path_buf(),
            details: err.to_string(),
        })
}

/// Saves the configuration to disk atomically (write to tmp, then rename).
pub fn save_config(storage: &StorageConfig, config: &LauncherConfig) -> Result<()> {
    let path = storage.config_file();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| LauncherError::Io {
            context: "creating data directory".to_string(),
            source,
        })?;
    }

    let payload = serde_json::to_string_pretty(config).map_err(|source| LauncherError::Json {
        context: "serializing configuration".to_string(),
        source,
    })?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, payload).map_err(|source| LauncherError::Io {
        context: "writing configuration".to_string(),
        source,
    })?;
    fs::rename(&tmp_path, &path).map_err(|source| LauncherError::Io {
        context: "committing configuration".to_string(),
        source,
    })
}
