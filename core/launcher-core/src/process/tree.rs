//! Process table snapshots backed by `sysinfo`.

use std::collections::{HashMap, HashSet, VecDeque};
use sysinfo::{Pid, ProcessRefreshKind, ProcessStatus, System};

/// A point-in-time view of every process on the machine.
pub struct ProcessTable {
    sys: System,
}

impl ProcessTable {
    /// Captures the current process table (pid, parent, status only).
    pub fn snapshot() -> Self {
        let mut sys = System::new();
        sys.refresh_processes_specifics(ProcessRefreshKind::new());
        Self { sys }
    }

    /// All processes below `root`, breadth-first, excluding `root` itself.
    ///
    /// On Linux the table also lists every thread as an entry whose parent is
    /// the owning process; those are not separate processes and are skipped.
    pub fn descendants(&self, root: u32) -> Vec<u32> {
        let mut children: HashMap<Pid, Vec<Pid>> = HashMap::new();
        for (pid, process) in self.sys.processes() {
            if process.thread_kind().is_some() {
                continue;
            }
            if let Some(parent) = process.parent() {
                children.entry(parent).or_default().push(*pid);
            }
        }

        let root_pid = Pid::from(root as usize);
        let mut seen: HashSet<Pid> = HashSet::from([root_pid]);
        let mut queue: VecDeque<Pid> = VecDeque::from([root_pid]);
        let mut found = Vec::new();

        while let Some(current) = queue.pop_front() {
            let Some(kids) = children.get(&current) else {
                continue;
            };
            for kid in kids {
                if seen.insert(*kid) {
                    found.push(kid.as_u32());
                    queue.push_back(*kid);
                }
            }
        }

        found
    }

    pub(crate) fn system(&self) -> &System {
        &self.sys
    }
}

/// Snapshot the table and return the descendants of `root`.
pub fn descendants_of(root: u32) -> Vec<u32> {
    ProcessTable::snapshot().descendants(root)
}

/// Returns true if `pid` exists and has not exited.
///
/// Zombies count as exited: they are waiting to be reaped by a parent we do
/// not control and will never run again.
pub fn is_pid_alive(pid: u32) -> bool {
    let mut sys = System::new();
    refresh_alive(&mut sys, pid)
}

/// Per-PID refresh, reusing `sys` across calls in a polling loop.
pub(crate) fn refresh_alive(sys: &mut System, pid: u32) -> bool {
    let sysinfo_pid = Pid::from(pid as usize);
    if !sys.refresh_process_specifics(sysinfo_pid, ProcessRefreshKind::new()) {
        return false;
    }
    sys.process(sysinfo_pid)
        .map(|process| !matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_process_is_alive() {
        assert!(is_pid_alive(std::process::id()));
    }

    #[test]
    fn test_nonexistent_pid_is_not_alive() {
        assert!(!is_pid_alive(99_999_999));
    }

    #[test]
    fn test_nonexistent_pid_has_no_descendants() {
        assert!(descendants_of(99_999_999).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_spawned_child_is_a_descendant() {
        use std::process::{Command, Stdio};

        let mut child = Command::new("sleep")
            .arg("5")
            .stdout(Stdio::null())
            .spawn()
            .unwrap();

        let found = descendants_of(std::process::id());
        let _ = child.kill();
        let _ = child.wait();

        assert!(found.contains(&child.id()));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_threads_are_not_descendants() {
        use std::sync::mpsc;
        use std::thread;

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let stop_rx = std::sync::Arc::new(std::sync::Mutex::new(stop_rx));
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let stop_rx = std::sync::Arc::clone(&stop_rx);
                thread::spawn(move || {
                    let _ = stop_rx.lock().unwrap().recv();
                })
            })
            .collect();

        let task_ids: Vec<u32> = std::fs::read_dir("/proc/self/task")
            .unwrap()
            .filter_map(|entry| entry.ok()?.file_name().to_str()?.parse().ok())
            .filter(|tid| *tid != std::process::id())
            .collect();
        let found = descendants_of(std::process::id());

        drop(stop_tx);
        for worker in workers {
            worker.join().unwrap();
        }

        assert!(task_ids.len() >= 4);
        for tid in task_ids {
            assert!(!found.contains(&tid), "Thread {} listed as a descendant", tid);
        }
    }
}
