//! `shell`: a line-oriented console front end.
//!
//! Three producers feed one channel: a stdin reader thread, the reconciler,
//! and short-lived worker threads that run launch/close (which can block for
//! seconds). The main thread is the only one that prints the game list or
//! touches shell state.

use launcher_core::{
    scan_games_directory, spawn_reconciler, GameManager, LaunchTarget, LauncherConfig,
    ScanOptions,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;

const HELP: &str = "\
Commands:
  list              show games and their state
  launch <game>     start a game (name or list number)
  close <game>      close a running game and its helpers
  refresh           rescan the current directory
  dir <path>        scan another directory
  help              show this help
  quit              leave the shell (running games keep running)
";

/// Everything the main loop reacts to.
#[derive(Debug)]
enum UiEvent {
    Line(String),
    Exited(Vec<String>),
    Message(String),
    InputClosed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ShellCommand {
    List,
    Launch(String),
    Close(String),
    Refresh,
    Dir(PathBuf),
    Help,
    Quit,
    Empty,
    Invalid(String),
}

impl ShellCommand {
    pub(crate) fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ShellCommand::Empty;
        }
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match (verb.to_lowercase().as_str(), rest.is_empty()) {
            ("list" | "ls", _) => ShellCommand::List,
            ("refresh", _) => ShellCommand::Refresh,
            ("help" | "?", _) => ShellCommand::Help,
            ("quit" | "exit" | "q", _) => ShellCommand::Quit,
            ("launch" | "start", false) => ShellCommand::Launch(rest.to_string()),
            ("close" | "stop", false) => ShellCommand::Close(rest.to_string()),
            ("dir" | "cd", false) => ShellCommand::Dir(PathBuf::from(rest)),
            ("launch" | "start" | "close" | "stop" | "dir" | "cd", true) => {
                ShellCommand::Invalid(format!("'{}' needs an argument", verb))
            }
            _ => ShellCommand::Invalid(format!("Unknown command '{}' (try 'help')", verb)),
        }
    }
}

struct Shell {
    manager: Arc<GameManager>,
    scan_options: ScanOptions,
    games: Vec<LaunchTarget>,
    current_dir: Option<PathBuf>,
    events: Sender<UiEvent>,
}

pub fn run(dir: Option<PathBuf>, config: &LauncherConfig) -> Result<(), String> {
    let manager = Arc::new(GameManager::new(config.manager_settings()));
    let (tx, rx) = mpsc::channel();

    let reconciler_tx = tx.clone();
    let reconciler = spawn_reconciler(Arc::clone(&manager), config.poll_interval(), move |names| {
        let _ = reconciler_tx.send(UiEvent::Exited(names));
    })
    .map_err(String::from)?;

    spawn_stdin_reader(tx.clone()).map_err(|e| format!("Failed to start input thread: {}", e))?;

    let mut shell = Shell {
        manager,
        scan_options: config.scan_options(),
        games: Vec::new(),
        current_dir: None,
        events: tx,
    };

    match dir.or_else(|| config.games_dir.clone()) {
        Some(dir) => shell.load_games(dir),
        None => println!("No games directory yet. Use 'dir <path>'."),
    }
    print!("{}", HELP);
    prompt();

    while let Ok(event) = rx.recv() {
        match event {
            UiEvent::Line(line) => {
                if !shell.handle(ShellCommand::parse(&line)) {
                    break;
                }
            }
            UiEvent::Exited(names) => {
                for name in names {
                    println!("\n{} exited", name);
                }
            }
            UiEvent::Message(message) => println!("\n{}", message),
            UiEvent::InputClosed => break,
        }
        prompt();
    }

    reconciler.stop();
    let still_running = shell.manager.running_games();
    if !still_running.is_empty() {
        tracing::info!(count = still_running.len(), "Leaving games running");
    }
    Ok(())
}

impl Shell {
    /// Returns false when the shell should exit.
    fn handle(&mut self, command: ShellCommand) -> bool {
        match command {
            ShellCommand::List => print!("{}", self.render_list()),
            ShellCommand::Launch(query) => self.launch(&query),
            ShellCommand::Close(query) => self.close(&query),
            ShellCommand::Refresh => self.refresh(),
            ShellCommand::Dir(path) => self.load_games(path),
            ShellCommand::Help => print!("{}", HELP),
            ShellCommand::Quit => return false,
            ShellCommand::Empty => {}
            ShellCommand::Invalid(message) => println!("{}", message),
        }
        true
    }

    fn load_games(&mut self, dir: PathBuf) {
        if !dir.is_dir() {
            println!("Not a directory: {}", dir.display());
            return;
        }
        self.games = scan_games_directory(&dir, &self.scan_options);
        println!("{} game(s) in {}", self.games.len(), dir.display());
        self.current_dir = Some(dir);
        print!("{}", self.render_list());
    }

    fn refresh(&mut self) {
        match self.current_dir.clone() {
            Some(dir) => self.load_games(dir),
            None => println!("Select a games directory first with 'dir <path>'."),
        }
    }

    fn launch(&self, query: &str) {
        let Some(target) = resolve(&self.games, query).cloned() else {
            println!("No game matching '{}'", query);
            return;
        };
        let manager = Arc::clone(&self.manager);
        let events = self.events.clone();
        println!("Launching {}...", target.name);
        self.spawn_worker(move || {
            let message = match manager.try_launch(&target) {
                Ok(launcher_core::LaunchOutcome::Launched { pid, .. }) => {
                    format!("{} running (pid {})", target.name, pid)
                }
                Ok(launcher_core::LaunchOutcome::AlreadyRunning) => {
                    format!("{} is already running", target.name)
                }
                Err(err) => format!("Launch failed: {}", err),
            };
            let _ = events.send(UiEvent::Message(message));
        });
    }

    fn close(&self, query: &str) {
        let name = match resolve(&self.games, query) {
            Some(target) => target.name.clone(),
            None => query.to_string(),
        };
        let manager = Arc::clone(&self.manager);
        let events = self.events.clone();
        println!("Closing {}...", name);
        self.spawn_worker(move || {
            let message = match manager.try_close(&name) {
                Ok(launcher_core::CloseOutcome::Closed(report)) => {
                    format!("{} closed ({} helper process(es))", name, report.descendants)
                }
                Ok(launcher_core::CloseOutcome::NotRunning) => {
                    format!("{} is not running", name)
                }
                Err(err) => format!("Close failed: {}", err),
            };
            let _ = events.send(UiEvent::Message(message));
        });
    }

    fn spawn_worker<F>(&self, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Err(err) = thread::Builder::new().name("shell-worker".to_string()).spawn(work) {
            println!("Could not start worker thread: {}", err);
        }
    }

    fn render_list(&self) -> String {
        if self.games.is_empty() {
            return "No games found.\n".to_string();
        }
        let mut out = String::new();
        for (index, game) in self.games.iter().enumerate() {
            let state = match self.manager.state_of(&game.name).pid() {
                Some(pid) => format!("running, pid {}", pid),
                None => "stopped".to_string(),
            };
            out.push_str(&format!("{:>3}. {} [{}]\n", index + 1, game.name, state));
        }
        out
    }
}

/// Name (exact, then case-insensitive) or 1-based list number.
pub(crate) fn resolve<'a>(games: &'a [LaunchTarget], query: &str) -> Option<&'a LaunchTarget> {
    crate::launch::find_by_name(games, query).or_else(|| {
        query
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| games.get(index))
    })
}

fn spawn_stdin_reader(events: Sender<UiEvent>) -> io::Result<()> {
    thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if events.send(UiEvent::Line(line)).is_err() {
                            return;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "Failed to read stdin");
                        break;
                    }
                }
            }
            let _ = events.send(UiEvent::InputClosed);
        })
        .map(|_| ())
}

fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_verbs() {
        assert_eq!(ShellCommand::parse("list"), ShellCommand::List);
        assert_eq!(ShellCommand::parse("  LS  "), ShellCommand::List);
        assert_eq!(ShellCommand::parse("refresh"), ShellCommand::Refresh);
        assert_eq!(ShellCommand::parse("help"), ShellCommand::Help);
        assert_eq!(ShellCommand::parse("quit"), ShellCommand::Quit);
        assert_eq!(ShellCommand::parse(""), ShellCommand::Empty);
    }

    #[test]
    fn test_parse_keeps_spaces_in_arguments() {
        assert_eq!(
            ShellCommand::parse("launch Half Life 2"),
            ShellCommand::Launch("Half Life 2".to_string())
        );
        assert_eq!(
            ShellCommand::parse("close   Doom "),
            ShellCommand::Close("Doom".to_string())
        );
        assert_eq!(
            ShellCommand::parse("dir /mnt/My Games"),
            ShellCommand::Dir(PathBuf::from("/mnt/My Games"))
        );
    }

    #[test]
    fn test_parse_rejects_missing_argument_and_unknown_verbs() {
        assert!(matches!(ShellCommand::parse("launch"), ShellCommand::Invalid(_)));
        assert!(matches!(ShellCommand::parse("dance"), ShellCommand::Invalid(_)));
    }

    #[test]
    fn test_resolve_by_name_or_number() {
        let games = vec![
            LaunchTarget::new("Doom", "/g/doom.exe"),
            LaunchTarget::new("Quake", "/g/quake.exe"),
        ];
        assert_eq!(resolve(&games, "quake").unwrap().name, "Quake");
        assert_eq!(resolve(&games, "1").unwrap().name, "Doom");
        assert!(resolve(&games, "0").is_none());
        assert!(resolve(&games, "3").is_none());
        assert!(resolve(&games, "Heretic").is_none());
    }

    #[test]
    fn test_numeric_game_name_beats_index() {
        let games = vec![
            LaunchTarget::new("Doom", "/g/doom.exe"),
            LaunchTarget::new("2", "/g/2.exe"),
            LaunchTarget::new("Quake", "/g/quake.exe"),
        ];
        assert_eq!(resolve(&games, "2").unwrap().path, PathBuf::from("/g/2.exe"));
    }
}
