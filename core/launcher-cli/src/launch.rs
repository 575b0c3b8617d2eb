//! `launch`: start one game and stay attached until it exits.
//!
//! With `--close-after`, the game's whole process tree is closed once the
//! deadline passes. Otherwise the command returns when reconcile notices the
//! game is gone.

use launcher_core::{
    scan_games_directory, GameManager, LaunchOutcome, LaunchTarget, LauncherConfig,
};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

pub fn run(
    name: &str,
    dir: Option<PathBuf>,
    close_after: Option<u64>,
    config: &LauncherConfig,
) -> Result<(), String> {
    let root = crate::resolve_games_dir(dir, config)?;
    let games = scan_games_directory(&root, &config.scan_options());
    let target = find_by_name(&games, name)
        .ok_or_else(|| format!("No game named '{}' under {}", name, root.display()))?;

    let manager = GameManager::new(config.manager_settings());
    let pid = match manager.try_launch(target).map_err(String::from)? {
        LaunchOutcome::Launched { pid, .. } => pid,
        LaunchOutcome::AlreadyRunning => {
            return Err(format!("{} is already running", target.name));
        }
    };
    println!("Launched {} (pid {})", target.name, pid);

    let deadline = close_after.map(|secs| Instant::now() + Duration::from_secs(secs));
    let poll = config.poll_interval();

    loop {
        if !manager.reconcile().is_empty() {
            println!("{} exited", target.name);
            return Ok(());
        }
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                println!("Closing {}", target.name);
                manager.try_close(&target.name).map_err(String::from)?;
                println!("{} closed", target.name);
                return Ok(());
            }
            thread::sleep(poll.min(deadline.saturating_duration_since(Instant::now())));
        } else {
            thread::sleep(poll);
        }
    }
}

/// Exact name first, then a case-insensitive match.
pub(crate) fn find_by_name<'a>(games: &'a [LaunchTarget], name: &str) -> Option<&'a LaunchTarget> {
    games.iter().find(|game| game.name == name).or_else(|| {
        let lowered = name.to_lowercase();
        games.iter().find(|game| game.name.to_lowercase() == lowered)
    })
}
