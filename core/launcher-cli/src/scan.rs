//! `scan`: print the games found under a directory.

use launcher_core::{scan_games_directory, LaunchTarget, LauncherConfig};
use std::path::PathBuf;

pub fn run(dir: Option<PathBuf>, json: bool, config: &LauncherConfig) -> Result<(), String> {
    let root = crate::resolve_games_dir(dir, config)?;
    if !root.is_dir() {
        return Err(launcher_core::LauncherError::DirectoryNotFound(root).into());
    }

    let games = scan_games_directory(&root, &config.scan_options());

    if json {
        let payload = serde_json::to_string_pretty(&games)
            .map_err(|e| format!("Failed to serialize scan results: {}", e))?;
        println!("{}", payload);
    } else {
        print!("{}", render_table(&games));
    }
    Ok(())
}

pub(crate) fn render_table(games: &[LaunchTarget]) -> String {
    if games.is_empty() {
        return "No games found.\n".to_string();
    }

    let width = games
        .iter()
        .map(|game| game.name.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for (index, game) in games.iter().enumerate() {
        let art = game
            .artwork
            .as_ref()
            .map(|path| format!("  [art: {}]", path.display()))
            .unwrap_or_default();
        out.push_str(&format!(
            "{:>3}. {:<width$}  {}{}\n",
            index + 1,
            game.name,
            game.path.display(),
            art,
            width = width
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_table_empty() {
        assert_eq!(render_table(&[]), "No games found.\n");
    }

    #[test]
    fn test_render_table_numbers_rows_and_shows_artwork() {
        let games = vec![
            LaunchTarget::new("Doom", "/g/doom/doom.exe").with_artwork("/g/doom/doom.png"),
            LaunchTarget::new("Quake", "/g/quake/quake.exe"),
        ];
        let table = render_table(&games);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "  1. Doom   /g/doom/doom.exe  [art: /g/doom/doom.png]");
        assert_eq!(lines[1], "  2. Quake  /g/quake/quake.exe");
    }
}
