//! Background thread that keeps the tracked collection in sync with reality.
//!
//! The manager has no timer of its own. Front ends start one reconciler for the
//! lifetime of the application and receive the names of games that exited.
//! The callback runs on the reconciler thread, so it should only forward the
//! names to the UI's own context (a channel, an event loop proxy) rather than
//! touch UI state directly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::{LauncherError, Result};
use crate::manager::GameManager;

const STOP_CHECK_SLICE: Duration = Duration::from_millis(50);

/// Owns the reconciler thread; stopping or dropping it ends the loop.
pub struct ReconcilerHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ReconcilerHandle {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("Reconciler thread panicked");
            }
        }
    }
}

impl Drop for ReconcilerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Runs `manager.reconcile()` every `interval`, passing each non-empty list of
/// exited games to `on_exit`.
pub fn spawn_reconciler<F>(
    manager: Arc<GameManager>,
    interval: Duration,
    mut on_exit: F,
) -> Result<ReconcilerHandle>
where
    F: FnMut(Vec<String>) + Send + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));
    let thread_stop = Arc::clone(&stop);

    let thread = thread::Builder::new()
        .name("reconciler".to_string())
        .spawn(move || {
            tracing::debug!(interval_ms = interval.as_millis() as u64, "Reconciler started");
            while !thread_stop.load(Ordering::SeqCst) {
                let exited = manager.reconcile();
                if !exited.is_empty() {
                    tracing::debug!(exited = ?exited, "Reconcile pass evicted games");
                    on_exit(exited);
                }
                sleep_unless_stopped(&thread_stop, interval);
            }
            tracing::debug!("Reconciler stopped");
        })
        .map_err(|source| LauncherError::Io {
            context: "spawning reconciler thread".to_string(),
            source,
        })?;

    Ok(ReconcilerHandle {
        stop,
        thread: Some(thread),
    })
}

fn sleep_unless_stopped(stop: &AtomicBool, interval: Duration) {
    let deadline = Instant::now() + interval;
    loop {
        if stop.load(Ordering::SeqCst) {
            return;
        }
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        thread::sleep(STOP_CHECK_SLICE.min(deadline - now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::ManagerSettings;

    #[test]
    fn test_stop_is_prompt_even_with_long_interval() {
        let manager = Arc::new(GameManager::new(ManagerSettings::default()));
        let handle = spawn_reconciler(manager, Duration::from_secs(60), |_| {}).unwrap();

        let started = Instant::now();
        handle.stop();
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_no_callback_when_nothing_exits() {
        let manager = Arc::new(GameManager::new(ManagerSettings::default()));
        let (tx, rx) = std::sync::mpsc::channel();
        let handle = spawn_reconciler(manager, Duration::from_millis(20), move |names| {
            let _ = tx.send(names);
        })
        .unwrap();

        thread::sleep(Duration::from_millis(150));
        drop(handle);
        assert!(rx.try_recv().is_err());
    }
}
