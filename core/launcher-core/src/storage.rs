//! Storage configuration and path management for the launcher.
//!
//! All on-disk locations are resolved here so tests can point the whole
//! launcher at a temp directory with [`StorageConfig::with_root`].
//!
//! ```text
//! ~/.game-launcher/
//! ├── config.json    # LauncherConfig
//! └── logs/          # launcher_YYYYmmdd_HHMMSS.log, one per run
//! ```

use std::path::{Path, PathBuf};

const DATA_DIR_NAME: &str = ".game-launcher";

/// Central configuration for launcher storage paths.
///
/// Production code uses `StorageConfig::default()` which points to
/// `~/.game-launcher/`. Tests use `StorageConfig::with_root(temp_dir)`.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
        Self {
            root: home.join(DATA_DIR_NAME),
        }
    }
}

impl StorageConfig {
    /// Creates a StorageConfig with a custom root directory.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// Returns the root directory for launcher data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to config.json (launcher preferences).
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Path to logs/ directory.
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }
}
