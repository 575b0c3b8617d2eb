//! Process-table queries and process-tree termination.
//!
//! # Termination Protocol
//!
//! Games and their launchers routinely spawn helpers (anti-cheat, updaters,
//! render processes), so killing only the spawned process leaves orphans.
//! [`terminate_tree`] therefore works on the whole subtree:
//!
//! 1. Enumerate the root's descendants at close time (children may appear
//!    long after launch). A root that already exited counts as closed.
//! 2. Ask every descendant, then the root, to terminate gracefully.
//! 3. Wait up to the timeout for all of them to exit.
//! 4. Force-kill whatever is still alive.
//!
//! Signalling a process that exited in the meantime is expected and never
//! reported as an error.
//!
//! # Module Structure
//!
//! - [`tree`]: process table snapshots, descendant enumeration, liveness
//! - [`terminate`]: graceful/forced signals and the escalation protocol

pub mod terminate;
pub mod tree;

pub use terminate::{terminate_tree, SignalOutcome, TerminationReport};
pub use tree::{descendants_of, is_pid_alive, ProcessTable};
