//! Graceful-then-forced termination of a spawned process and its descendants.

use std::io;
use std::process::Child;
use std::thread;
use std::time::{Duration, Instant};
use sysinfo::{Pid, Signal, System};

use super::tree::{refresh_alive, ProcessTable};

const REAP_TIMEOUT: Duration = Duration::from_secs(1);
const REAP_POLL: Duration = Duration::from_millis(20);

/// Result of delivering one signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOutcome {
    Delivered,
    /// The process exited before the signal could reach it.
    AlreadyGone,
    /// The platform has no way to deliver this kind of request.
    Unsupported,
}

/// What [`terminate_tree`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminationReport {
    /// The root had exited before termination started.
    pub root_already_exited: bool,
    /// Descendants found at close time.
    pub descendants: usize,
    /// Processes (root included) that needed a forced kill.
    pub forced: usize,
}

/// Ask a process to exit (SIGTERM on Unix, `taskkill` without `/F` on Windows).
pub fn request_termination(table: &System, pid: u32) -> SignalOutcome {
    let Some(process) = table.process(Pid::from(pid as usize)) else {
        return SignalOutcome::AlreadyGone;
    };
    match process.kill_with(Signal::Term) {
        Some(true) => SignalOutcome::Delivered,
        Some(false) => SignalOutcome::AlreadyGone,
        None => request_termination_fallback(pid),
    }
}

#[cfg(windows)]
fn request_termination_fallback(pid: u32) -> SignalOutcome {
    use std::process::{Command, Stdio};

    match Command::new("taskkill")
        .args(["/PID", &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(status) if status.success() => SignalOutcome::Delivered,
        Ok(_) => SignalOutcome::AlreadyGone,
        Err(err) => {
            tracing::debug!(pid, error = %err, "taskkill unavailable");
            SignalOutcome::Unsupported
        }
    }
}

#[cfg(not(windows))]
fn request_termination_fallback(_pid: u32) -> SignalOutcome {
    SignalOutcome::Unsupported
}

/// Kill a process outright (SIGKILL / TerminateProcess).
pub fn force_kill(table: &System, pid: u32) -> SignalOutcome {
    match table.process(Pid::from(pid as usize)) {
        Some(process) if process.kill() => SignalOutcome::Delivered,
        _ => SignalOutcome::AlreadyGone,
    }
}

/// Terminates `root` and every process below it.
///
/// Returns an error only when the root handle cannot be queried at all, in
/// which case nothing has been signalled.
pub fn terminate_tree(
    root: &mut Child,
    timeout: Duration,
    poll: Duration,
) -> io::Result<TerminationReport> {
    let root_pid = root.id();

    if let Some(status) = root.try_wait()? {
        tracing::debug!(pid = root_pid, status = %status, "Root already exited");
        return Ok(TerminationReport {
            root_already_exited: true,
            ..TerminationReport::default()
        });
    }

    let table = ProcessTable::snapshot();
    let descendants = table.descendants(root_pid);
    tracing::debug!(pid = root_pid, descendants = ?descendants, "Terminating process tree");

    for pid in &descendants {
        let outcome = request_termination(table.system(), *pid);
        tracing::trace!(pid, outcome = ?outcome, "Descendant termination requested");
    }
    let root_outcome = request_termination(table.system(), root_pid);
    tracing::trace!(pid = root_pid, outcome = ?root_outcome, "Root termination requested");

    let mut sys = System::new();
    let survivors = wait_for_exit(root, &descendants, &mut sys, timeout, poll);

    let mut forced = 0;
    if !survivors.is_empty() {
        let table = ProcessTable::snapshot();
        for pid in &survivors {
            if force_kill(table.system(), *pid) == SignalOutcome::Delivered {
                forced += 1;
            }
        }
    }
    if !root_exited(root) {
        tracing::debug!(pid = root_pid, "Root ignored termination request; killing");
        if root.kill().is_ok() {
            forced += 1;
        }
        reap(root);
    }

    Ok(TerminationReport {
        root_already_exited: false,
        descendants: descendants.len(),
        forced,
    })
}

/// Polls until the root and all descendants have exited or `timeout` elapses.
/// Returns the descendants still alive.
fn wait_for_exit(
    root: &mut Child,
    descendants: &[u32],
    sys: &mut System,
    timeout: Duration,
    poll: Duration,
) -> Vec<u32> {
    let deadline = Instant::now() + timeout;
    let mut remaining: Vec<u32> = descendants.to_vec();

    loop {
        remaining.retain(|pid| refresh_alive(sys, *pid));
        if root_exited(root) && remaining.is_empty() {
            return remaining;
        }
        let now = Instant::now();
        if now >= deadline {
            return remaining;
        }
        thread::sleep(poll.min(deadline - now));
    }
}

/// An unqueryable root is treated as gone; the forced kill that follows is
/// best-effort either way.
fn root_exited(root: &mut Child) -> bool {
    !matches!(root.try_wait(), Ok(None))
}

fn reap(root: &mut Child) {
    let deadline = Instant::now() + REAP_TIMEOUT;
    while Instant::now() < deadline {
        match root.try_wait() {
            Ok(None) => thread::sleep(REAP_POLL),
            _ => return,
        }
    }
    tracing::warn!(pid = root.id(), "Process did not exit after kill");
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::process::tree::is_pid_alive;
    use std::process::{Command, Stdio};

    const TIMEOUT: Duration = Duration::from_secs(5);
    const POLL: Duration = Duration::from_millis(50);

    fn spawn_sh(script: &str) -> Child {
        Command::new("sh")
            .args(["-c", script])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap()
    }

    #[test]
    fn test_exited_root_is_already_closed() {
        let mut child = spawn_sh("exit 0");
        thread::sleep(Duration::from_millis(200));

        let report = terminate_tree(&mut child, TIMEOUT, POLL).unwrap();
        assert!(report.root_already_exited);
        assert_eq!(report.descendants, 0);
    }

    #[test]
    fn test_graceful_termination_needs_no_force() {
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        let pid = child.id();

        let report = terminate_tree(&mut child, TIMEOUT, POLL).unwrap();
        assert!(!report.root_already_exited);
        assert_eq!(report.forced, 0);
        assert!(!is_pid_alive(pid));
    }

    #[test]
    fn test_term_ignoring_root_is_killed_after_timeout() {
        let mut child = spawn_sh("trap '' TERM; while true; do sleep 1; done");
        thread::sleep(Duration::from_millis(200));
        let pid = child.id();

        let started = Instant::now();
        let report = terminate_tree(&mut child, Duration::from_millis(500), POLL).unwrap();

        assert!(started.elapsed() >= Duration::from_millis(500));
        assert!(report.forced >= 1);
        assert!(!is_pid_alive(pid));
    }

    #[test]
    fn test_signalling_gone_process_is_reported_not_raised() {
        let table = ProcessTable::snapshot();
        assert_eq!(
            request_termination(table.system(), 99_999_999),
            SignalOutcome::AlreadyGone
        );
        assert_eq!(force_kill(table.system(), 99_999_999), SignalOutcome::AlreadyGone);
    }
}
