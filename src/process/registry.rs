//! Registry of live helper processes.
//!
//! Every helper spawn is tracked from reservation until the process is known
//! to have exited. The registry is the only shared mutable structure in the
//! crate: the normal invocation path and the emergency shutdown path both go
//! through the same mutex.
//!
//! Entries are owned by a [`ProcessTicket`]. When a ticket is dropped before
//! its process is known to have exited (timeout kill failure, cancellation)
//! the entry is kept as an orphan; the next [`ProcessRegistry::sweep`]
//! terminates it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use sysinfo::{Pid, ProcessStatus, System};

/// Liveness of an operating system process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// The process is running.
    Running,
    /// The process has exited but not been reaped.
    Zombie,
    /// No such process.
    Gone,
}

/// Abstraction over process inspection and termination.
pub trait ProcessControl: Send + Sync {
    /// Returns the current state of `pid`.
    fn state(&self, pid: u32) -> ProcessState;

    /// Requests termination of `pid`. Returns true if the request was
    /// delivered.
    fn terminate(&self, pid: u32) -> bool;
}

/// [`ProcessControl`] backed by `sysinfo`.
pub struct SysinfoProcessControl {
    system: Mutex<System>,
}

impl SysinfoProcessControl {
    /// Creates a controller with an empty process table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }

    fn system(&self) -> MutexGuard<'_, System> {
        self.system.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SysinfoProcessControl {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SysinfoProcessControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SysinfoProcessControl").finish_non_exhaustive()
    }
}

impl ProcessControl for SysinfoProcessControl {
    fn state(&self, pid: u32) -> ProcessState {
        let pid = Pid::from_u32(pid);
        let mut system = self.system();
        if !system.refresh_process(pid) {
            return ProcessState::Gone;
        }
        match system.process(pid).map(sysinfo::Process::status) {
            None | Some(ProcessStatus::Dead) => ProcessState::Gone,
            Some(ProcessStatus::Zombie) => ProcessState::Zombie,
            Some(_) => ProcessState::Running,
        }
    }

    fn terminate(&self, pid: u32) -> bool {
        let pid = Pid::from_u32(pid);
        let mut system = self.system();
        system.refresh_process(pid);
        system.process(pid).is_some_and(sysinfo::Process::kill)
    }
}

#[derive(Debug)]
struct Entry {
    label: String,
    pid: Option<u32>,
    orphaned: bool,
}

#[derive(Debug, Default)]
struct Entries {
    next_id: u64,
    live: HashMap<u64, Entry>,
}

type SharedEntries = Arc<Mutex<Entries>>;

fn lock(entries: &SharedEntries) -> MutexGuard<'_, Entries> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Tracks every helper process this host has spawned and not yet reaped.
///
/// Cloning is cheap; clones share the same table.
#[derive(Clone)]
pub struct ProcessRegistry {
    entries: SharedEntries,
    control: Arc<dyn ProcessControl>,
}

impl std::fmt::Debug for ProcessRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessRegistry")
            .field("live", &self.len())
            .finish_non_exhaustive()
    }
}

impl Default for ProcessRegistry {
    fn default() -> Self {
        Self::new(Arc::new(SysinfoProcessControl::new()))
    }
}

/// Polling interval while waiting for a terminated process to disappear.
const TERMINATE_POLL: Duration = Duration::from_millis(50);

impl ProcessRegistry {
    /// Creates an empty registry using `control` for liveness and termination.
    #[must_use]
    pub fn new(control: Arc<dyn ProcessControl>) -> Self {
        Self {
            entries: SharedEntries::default(),
            control,
        }
    }

    /// Reserves an entry for a process about to be spawned.
    #[must_use]
    pub fn reserve(&self, label: impl Into<String>) -> ProcessTicket {
        let mut entries = lock(&self.entries);
        let id = entries.next_id;
        entries.next_id += 1;
        entries.live.insert(
            id,
            Entry {
                label: label.into(),
                pid: None,
                orphaned: false,
            },
        );
        ProcessTicket {
            entries: Arc::clone(&self.entries),
            id,
            exited: false,
        }
    }

    /// Number of tracked entries, including orphans.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.entries).live.len()
    }

    /// Returns true if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Process ids of all tracked entries that have one.
    #[must_use]
    pub fn pids(&self) -> Vec<u32> {
        lock(&self.entries)
            .live
            .values()
            .filter_map(|e| e.pid)
            .collect()
    }

    /// Reaps dead and zombie entries and terminates orphans.
    ///
    /// Entries still waiting for a pid are left alone. Returns the number of
    /// entries removed.
    pub fn sweep(&self) -> usize {
        let mut entries = lock(&self.entries);
        let before = entries.live.len();

        entries.live.retain(|_, entry| {
            let Some(pid) = entry.pid else {
                return true;
            };
            match self.control.state(pid) {
                ProcessState::Gone | ProcessState::Zombie => {
                    tracing::debug!(pid, label = %entry.label, "Reaped helper process");
                    false
                }
                ProcessState::Running if entry.orphaned => {
                    let terminated = self.control.terminate(pid);
                    tracing::warn!(pid, label = %entry.label, terminated, "Terminated orphaned helper process");
                    !terminated
                }
                ProcessState::Running => true,
            }
        });

        before - entries.live.len()
    }

    /// Terminates every tracked process, waiting up to `per_process_wait`
    /// for each to disappear, then clears the table.
    ///
    /// Returns the number of processes a termination request was sent to.
    pub async fn terminate_all(&self, per_process_wait: Duration) -> usize {
        let targets: Vec<(u32, String)> = {
            let entries = lock(&self.entries);
            entries
                .live
                .values()
                .filter_map(|e| e.pid.map(|pid| (pid, e.label.clone())))
                .collect()
        };

        let mut terminated = 0;
        for (pid, label) in targets {
            if self.control.state(pid) == ProcessState::Gone {
                continue;
            }
            if self.control.terminate(pid) {
                terminated += 1;
            }
            if !self.wait_gone(pid, per_process_wait).await {
                tracing::error!(pid, label = %label, "Helper process survived termination");
            }
        }

        lock(&self.entries).live.clear();
        terminated
    }

    async fn wait_gone(&self, pid: u32, limit: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + limit;
        loop {
            if self.control.state(pid) != ProcessState::Running {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(TERMINATE_POLL).await;
        }
    }
}

/// Ownership handle for one registry entry.
///
/// Dropping the ticket removes the entry if its process was marked exited
/// (or never started); otherwise the entry becomes an orphan.
#[derive(Debug)]
pub struct ProcessTicket {
    entries: SharedEntries,
    id: u64,
    exited: bool,
}

impl ProcessTicket {
    /// Records the spawned process id.
    pub fn attach(&self, pid: u32) {
        if let Some(entry) = lock(&self.entries).live.get_mut(&self.id) {
            entry.pid = Some(pid);
        }
    }

    /// Records that the process has been waited for and is gone.
    pub const fn mark_exited(&mut self) {
        self.exited = true;
    }
}

impl Drop for ProcessTicket {
    fn drop(&mut self) {
        let mut entries = lock(&self.entries);
        let keep_as_orphan = !self.exited
            && entries
                .live
                .get(&self.id)
                .is_some_and(|entry| entry.pid.is_some());

        if keep_as_orphan {
            if let Some(entry) = entries.live.get_mut(&self.id) {
                entry.orphaned = true;
            }
        } else {
            entries.live.remove(&self.id);
        }
    }
}


#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
