//! Game discovery.
//!
//! Walks a directory tree and turns every file with a recognized executable
//! extension into a [`LaunchTarget`], pairing it with artwork found by name
//! convention:
//!
//! 1. `<dir>/<stem>.<img>`
//! 2. `<dir>/images/<stem>.<img>`
//! 3. `<dir>/{icon,logo,cover}.<img>`
//!
//! A missing directory is not an error for callers: it is logged and yields an
//! empty list.

use crate::config::{to_strings, DEFAULT_EXECUTABLE_EXTENSIONS};
use crate::types::{lowercase_extension, LaunchTarget};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "ico", "bmp"];
const DEFAULT_ARTWORK_NAMES: &[&str] = &["icon", "logo", "cover"];
const ARTWORK_SUBDIR: &str = "images";

/// What the scanner considers a game and where it looks for artwork.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub executable_extensions: Vec<String>,
    pub image_extensions: Vec<String>,
    pub artwork_names: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            executable_extensions: to_strings(DEFAULT_EXECUTABLE_EXTENSIONS),
            image_extensions: to_strings(DEFAULT_IMAGE_EXTENSIONS),
            artwork_names: to_strings(DEFAULT_ARTWORK_NAMES),
        }
    }
}

impl ScanOptions {
    fn is_executable(&self, path: &Path) -> bool {
        lowercase_extension(path).is_some_and(|ext| {
            self.executable_extensions
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(&ext))
        })
    }
}

/// Scans `root` recursively for games, sorted case-insensitively by name.
pub fn scan_games_directory(root: &Path, options: &ScanOptions) -> Vec<LaunchTarget> {
    if !root.is_dir() {
        tracing::error!(path = %root.display(), "Games directory does not exist");
        return Vec::new();
    }

    let mut games = Vec::new();
    let mut taken_names = HashSet::new();

    // Symlinked executables count; walkdir reports link loops as errors.
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(error = %err, "Skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() || !options.is_executable(entry.path()) {
            continue;
        }

        let path = entry.path();
        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
            continue;
        };

        let name = unique_name(&stem, path, &mut taken_names);
        let mut target = LaunchTarget::new(name, path);
        if let Some(dir) = path.parent() {
            target.artwork = find_artwork(dir, &stem, options);
        }
        games.push(target);
    }

    games.sort_by_cached_key(|game| game.name.to_lowercase());

    tracing::info!(count = games.len(), path = %root.display(), "Games found");
    games
}

/// Looks for artwork next to a game, in precedence order.
pub fn find_artwork(dir: &Path, stem: &str, options: &ScanOptions) -> Option<PathBuf> {
    find_image(dir, stem, options)
        .or_else(|| {
            let images_dir = dir.join(ARTWORK_SUBDIR);
            images_dir
                .is_dir()
                .then(|| find_image(&images_dir, stem, options))
                .flatten()
        })
        .or_else(|| {
            options
                .artwork_names
                .iter()
                .find_map(|name| find_image(dir, name, options))
        })
}

fn find_image(dir: &Path, stem: &str, options: &ScanOptions) -> Option<PathBuf> {
    options
        .image_extensions
        .iter()
        .map(|ext| dir.join(format!("{}.{}", stem, ext)))
        .find(|candidate| candidate.is_file())
}

/// Names are lookup keys, so a second `game.exe` in another folder gets the
/// folder name appended, then a counter if that is still taken.
fn unique_name(stem: &str, path: &Path, taken: &mut HashSet<String>) -> String {
    let mut name = stem.to_string();

    if taken.contains(&name.to_lowercase()) {
        let parent = path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string());
        if let Some(parent) = parent {
            name = format!("{} ({})", stem, parent);
        }
        let mut counter = 2;
        while taken.contains(&name.to_lowercase()) {
            name = format!("{} ({})", stem, counter);
            counter += 1;
        }
        tracing::warn!(
            original = %stem,
            renamed = %name,
            path = %path.display(),
            "Duplicate game name"
        );
    }

    taken.insert(name.to_lowercase());
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    /// Collects formatted log output for the duration of `f`.
    fn capture_logs(f: impl FnOnce()) -> String {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let writer = Arc::clone(&buffer);
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || CaptureWriter(Arc::clone(&writer)))
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buffer.lock().unwrap().clone();
        String::from_utf8_lossy(&bytes).to_string()
    }

    struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_missing_directory_returns_empty_and_logs_error() {
        let temp = tempdir().unwrap();
        let missing = temp.path().join("nope");

        let mut games = vec![LaunchTarget::new("placeholder", "/x")];
        let logs = capture_logs(|| {
            games = scan_games_directory(&missing, &ScanOptions::default());
        });

        assert!(games.is_empty());
        assert!(logs.contains("ERROR"), "logs: {}", logs);
        assert!(logs.contains("Games directory does not exist"), "logs: {}", logs);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_executable_is_found() {
        let temp = tempdir().unwrap();
        let store = temp.path().join("store");
        let games_dir = temp.path().join("games");
        touch(&store.join("doom.sh"));
        fs::create_dir_all(&games_dir).unwrap();
        std::os::unix::fs::symlink(store.join("doom.sh"), games_dir.join("doom.sh")).unwrap();

        let games = scan_games_directory(&games_dir, &ScanOptions::default());
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].name, "doom");
        assert_eq!(games[0].path, games_dir.join("doom.sh"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_does_not_hang() {
        let temp = tempdir().unwrap();
        touch(&temp.path().join("a").join("game.sh"));
        std::os::unix::fs::symlink(temp.path(), temp.path().join("a").join("loop")).unwrap();

        let games = scan_games_directory(temp.path(), &ScanOptions::default());
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].name, "game");
    }

    #[test]
    fn test_file_instead_of_directory_returns_empty() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("game.exe");
        touch(&file);
        assert!(scan_games_directory(&file, &ScanOptions::default()).is_empty());
    }

    #[test]
    fn test_finds_games_recursively_and_sorts_case_insensitively() {
        let temp = tempdir().unwrap();
        touch(&temp.path().join("zork/Zork.exe"));
        touch(&temp.path().join("alpha/alpha.BAT"));
        touch(&temp.path().join("deep/nested/Beta.lnk"));
        touch(&temp.path().join("readme.txt"));

        let games = scan_games_directory(temp.path(), &ScanOptions::default());
        let names: Vec<_> = games.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "Beta", "Zork"]);
        assert!(games[1].path.ends_with("deep/nested/Beta.lnk"));
    }

    #[test]
    fn test_respects_configured_extensions() {
        let temp = tempdir().unwrap();
        touch(&temp.path().join("a.exe"));
        touch(&temp.path().join("b.sh"));
        let options = ScanOptions {
            executable_extensions: vec!["sh".to_string()],
            ..ScanOptions::default()
        };

        let games = scan_games_directory(temp.path(), &options);
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].name, "b");
    }

    #[test]
    fn test_artwork_same_name_wins() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("doom");
        touch(&dir.join("doom.exe"));
        touch(&dir.join("doom.jpg"));
        touch(&dir.join("images/doom.png"));
        touch(&dir.join("cover.png"));

        let games = scan_games_directory(temp.path(), &ScanOptions::default());
        assert_eq!(games[0].artwork, Some(dir.join("doom.jpg")));
    }

    #[test]
    fn test_artwork_images_subfolder_before_conventional_names() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("doom");
        touch(&dir.join("doom.exe"));
        touch(&dir.join("images/doom.bmp"));
        touch(&dir.join("logo.png"));

        let games = scan_games_directory(temp.path(), &ScanOptions::default());
        assert_eq!(games[0].artwork, Some(dir.join("images/doom.bmp")));
    }

    #[test]
    fn test_artwork_conventional_names_in_order() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("doom");
        touch(&dir.join("doom.exe"));
        touch(&dir.join("cover.png"));
        touch(&dir.join("logo.ico"));

        let games = scan_games_directory(temp.path(), &ScanOptions::default());
        assert_eq!(games[0].artwork, Some(dir.join("logo.ico")));
    }

    #[test]
    fn test_no_artwork() {
        let temp = tempdir().unwrap();
        touch(&temp.path().join("doom/doom.exe"));

        let games = scan_games_directory(temp.path(), &ScanOptions::default());
        assert_eq!(games[0].artwork, None);
    }

    #[test]
    fn test_duplicate_names_are_disambiguated() {
        let temp = tempdir().unwrap();
        touch(&temp.path().join("a/game.exe"));
        touch(&temp.path().join("b/game.exe"));
        touch(&temp.path().join("c/b/game.exe"));

        let games = scan_games_directory(temp.path(), &ScanOptions::default());
        let names: HashSet<_> = games.iter().map(|g| g.name.clone()).collect();
        assert_eq!(games.len(), 3);
        assert_eq!(names.len(), 3);
        assert!(names.contains("game"));
        assert!(names.contains("game (b)"));
        assert!(names.contains("game (2)"));
    }
}
