//! Resource guard around every helper invocation.
//!
//! The guard enforces a ceiling on resident memory growth of the host
//! process and keeps the [`ProcessRegistry`] clean:
//!
//! - Before each invocation: check memory growth (reclaim once, then refuse
//!   with [`OutcomeStatus::ResourceExhausted`] without spawning), then sweep
//!   dead and orphaned entries.
//! - After each invocation, whatever the outcome: release the ticket and
//!   sweep again.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use sysinfo::{Pid, System};

use super::command::{CommandOutcome, HelperCommand, OutcomeStatus};
use super::executor::{CommandRunner, TokioCommandRunner};
use super::registry::ProcessRegistry;

/// Something that can run helper commands.
///
/// This is the seam every component above the process layer depends on,
/// which lets tests script helper output without spawning anything.
pub trait Helper: Send + Sync {
    /// Runs `command` and reports how it ended.
    fn invoke(
        &self,
        command: &HelperCommand,
    ) -> impl std::future::Future<Output = CommandOutcome> + Send;
}

impl<T: Helper> Helper for Arc<T> {
    fn invoke(
        &self,
        command: &HelperCommand,
    ) -> impl std::future::Future<Output = CommandOutcome> + Send {
        (**self).invoke(command)
    }
}

/// Reports the resident memory of the host process.
pub trait MemoryProbe: Send + Sync {
    /// Resident set size in bytes, or `None` if it cannot be read.
    fn resident_bytes(&self) -> Option<u64>;
}

/// [`MemoryProbe`] backed by `sysinfo`.
pub struct SysinfoMemoryProbe {
    system: Mutex<System>,
    pid: Option<Pid>,
}

impl SysinfoMemoryProbe {
    /// Creates a probe for the current process.
    #[must_use]
    pub fn new() -> Self {
        let pid = sysinfo::get_current_pid()
            .inspect_err(|e| tracing::warn!("Cannot determine own pid, memory guard disabled: {e}"))
            .ok();
        Self {
            system: Mutex::new(System::new()),
            pid,
        }
    }
}

impl Default for SysinfoMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SysinfoMemoryProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SysinfoMemoryProbe")
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

impl MemoryProbe for SysinfoMemoryProbe {
    fn resident_bytes(&self) -> Option<u64> {
        let pid = self.pid?;
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        system.refresh_process(pid);
        system.process(pid).map(sysinfo::Process::memory)
    }
}

/// Limits applied by a [`ResourceGuard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardLimits {
    /// Default helper timeout.
    pub timeout: Duration,
    /// Maximum resident memory growth over the baseline, in bytes.
    pub memory_ceiling_bytes: u64,
}

/// Wraps a [`CommandRunner`] with memory and orphan-process hygiene.
///
/// # Type Parameters
///
/// - `R`: The command runner (defaults to [`TokioCommandRunner`])
/// - `P`: The memory probe (defaults to [`SysinfoMemoryProbe`])
#[derive(Debug)]
pub struct ResourceGuard<R = TokioCommandRunner, P = SysinfoMemoryProbe> {
    runner: R,
    probe: P,
    registry: ProcessRegistry,
    limits: GuardLimits,
    baseline: Option<u64>,
}

impl<R: CommandRunner, P: MemoryProbe> ResourceGuard<R, P> {
    /// Creates a guard, sampling the memory baseline immediately.
    pub fn new(runner: R, probe: P, registry: ProcessRegistry, limits: GuardLimits) -> Self {
        let baseline = probe.resident_bytes();
        tracing::debug!(
            baseline_bytes = baseline,
            ceiling_bytes = limits.memory_ceiling_bytes,
            "Resource guard initialised"
        );
        Self {
            runner,
            probe,
            registry,
            limits,
            baseline,
        }
    }

    /// The registry this guard tracks helpers in.
    #[must_use]
    pub const fn registry(&self) -> &ProcessRegistry {
        &self.registry
    }

    /// Current memory growth over the baseline, if both samples exist.
    fn growth(&self) -> Option<u64> {
        let baseline = self.baseline?;
        let now = self.probe.resident_bytes()?;
        Some(now.saturating_sub(baseline))
    }

    /// Returns the growth if it exceeds the ceiling after one reclamation
    /// pass.
    fn over_ceiling(&self) -> Option<u64> {
        let ceiling = self.limits.memory_ceiling_bytes;
        let growth = self.growth().filter(|g| *g > ceiling)?;

        tracing::warn!(
            growth_bytes = growth,
            ceiling_bytes = ceiling,
            "Memory growth over ceiling, reclaiming"
        );
        self.registry.sweep();

        self.growth().filter(|g| *g > ceiling)
    }

    async fn run_guarded(&self, command: &HelperCommand) -> CommandOutcome {
        if let Some(growth_bytes) = self.over_ceiling() {
            tracing::error!(
                command = %command.program(),
                growth_bytes,
                "Refusing helper invocation, memory ceiling exceeded"
            );
            return CommandOutcome::bare(OutcomeStatus::ResourceExhausted {
                growth_bytes,
                ceiling_bytes: self.limits.memory_ceiling_bytes,
            });
        }

        self.registry.sweep();

        let timeout = command.timeout().unwrap_or(self.limits.timeout);
        tracing::debug!(command = %command, timeout_ms = timeout.as_millis(), "Invoking helper");

        let mut ticket = self.registry.reserve(command.program());
        let outcome = self.runner.run(command, timeout, &mut ticket).await;
        drop(ticket);

        let reaped = self.registry.sweep();
        if reaped > 0 {
            tracing::debug!(reaped, "Reaped helper processes after invocation");
        }

        outcome
    }
}

impl<R: CommandRunner, P: MemoryProbe> Helper for ResourceGuard<R, P> {
    fn invoke(
        &self,
        command: &HelperCommand,
    ) -> impl std::future::Future<Output = CommandOutcome> + Send {
        self.run_guarded(command)
    }
}


#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;
