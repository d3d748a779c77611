//! Tests for the resource guard.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use super::*;
use crate::process::ProcessTicket;
use crate::process::registry::ProcessState;
use crate::process::registry::mock::FakeProcesses;

const MIB: u64 = 1024 * 1024;

/// Probe returning a settable value.
#[derive(Debug, Default)]
struct FixedProbe {
    bytes: AtomicU64,
}

impl FixedProbe {
    fn at(bytes: u64) -> Arc<Self> {
        Arc::new(Self {
            bytes: AtomicU64::new(bytes),
        })
    }

    fn set(&self, bytes: u64) {
        self.bytes.store(bytes, Ordering::SeqCst);
    }
}

impl MemoryProbe for Arc<FixedProbe> {
    fn resident_bytes(&self) -> Option<u64> {
        Some(self.bytes.load(Ordering::SeqCst))
    }
}

/// Runner that pretends to spawn a process with the given pid.
#[derive(Debug, Default)]
struct FakeRunner {
    spawned: AtomicUsize,
    pid: u32,
    finish: bool,
    timeouts: Mutex<Vec<Duration>>,
}

impl FakeRunner {
    fn exiting(pid: u32) -> Arc<Self> {
        Arc::new(Self {
            pid,
            finish: true,
            ..Self::default()
        })
    }

    fn hanging(pid: u32) -> Arc<Self> {
        Arc::new(Self {
            pid,
            finish: false,
            ..Self::default()
        })
    }
}

impl CommandRunner for Arc<FakeRunner> {
    async fn run(
        &self,
        _command: &HelperCommand,
        timeout: Duration,
        ticket: &mut ProcessTicket,
    ) -> CommandOutcome {
        self.spawned.fetch_add(1, Ordering::SeqCst);
        self.timeouts.lock().unwrap().push(timeout);
        ticket.attach(self.pid);
        if self.finish {
            ticket.mark_exited();
            CommandOutcome::ok("done")
        } else {
            CommandOutcome::bare(OutcomeStatus::TimedOut { after: timeout })
        }
    }
}

struct Fixture {
    guard: ResourceGuard<Arc<FakeRunner>, Arc<FixedProbe>>,
    runner: Arc<FakeRunner>,
    probe: Arc<FixedProbe>,
    processes: Arc<FakeProcesses>,
}

fn fixture(runner: Arc<FakeRunner>) -> Fixture {
    let processes = Arc::new(FakeProcesses::default());
    let probe = FixedProbe::at(50 * MIB);
    let registry = ProcessRegistry::new(processes.clone());
    let guard = ResourceGuard::new(
        runner.clone(),
        probe.clone(),
        registry,
        GuardLimits {
            timeout: Duration::from_secs(15),
            memory_ceiling_bytes: 100 * MIB,
        },
    );
    Fixture {
        guard,
        runner,
        probe,
        processes,
    }
}

mod memory_ceiling {
    use super::*;

    #[tokio::test]
    async fn over_ceiling_refuses_without_spawning() {
        let f = fixture(FakeRunner::exiting(1));
        f.probe.set(200 * MIB);

        let outcome = f.guard.invoke(&HelperCommand::new("netsh")).await;

        assert_eq!(
            outcome.status,
            OutcomeStatus::ResourceExhausted {
                growth_bytes: 150 * MIB,
                ceiling_bytes: 100 * MIB,
            }
        );
        assert_eq!(f.runner.spawned.load(Ordering::SeqCst), 0);
        assert!(f.guard.registry().is_empty());
    }

    #[tokio::test]
    async fn growth_at_ceiling_is_allowed() {
        let f = fixture(FakeRunner::exiting(1));
        f.probe.set(150 * MIB);

        let outcome = f.guard.invoke(&HelperCommand::new("netsh")).await;

        assert!(outcome.is_success());
        assert_eq!(f.runner.spawned.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn shrinking_below_baseline_is_not_growth() {
        let f = fixture(FakeRunner::exiting(1));
        f.probe.set(10 * MIB);

        assert!(f.guard.invoke(&HelperCommand::new("netsh")).await.is_success());
    }
}

mod hygiene {
    use super::*;

    #[tokio::test]
    async fn finished_invocation_leaves_registry_empty() {
        let f = fixture(FakeRunner::exiting(7));
        f.processes.set(7, ProcessState::Running);

        f.guard.invoke(&HelperCommand::new("getmac")).await;

        assert!(f.guard.registry().is_empty());
    }

    #[tokio::test]
    async fn unreaped_helper_is_terminated_by_post_sweep() {
        let f = fixture(FakeRunner::hanging(8));
        f.processes.set(8, ProcessState::Running);

        let outcome = f.guard.invoke(&HelperCommand::new("powershell")).await;

        assert!(matches!(outcome.status, OutcomeStatus::TimedOut { .. }));
        assert_eq!(f.processes.terminated(), vec![8]);
        assert!(f.guard.registry().is_empty());
    }

    #[tokio::test]
    async fn pre_sweep_reaps_dead_entries() {
        let f = fixture(FakeRunner::exiting(1));
        let stale = f.guard.registry().reserve("stale");
        stale.attach(99);

        f.guard.invoke(&HelperCommand::new("netsh")).await;

        assert!(f.guard.registry().is_empty());
        drop(stale);
    }
}

mod timeouts {
    use super::*;

    #[tokio::test]
    async fn default_timeout_applies() {
        let f = fixture(FakeRunner::exiting(1));
        f.guard.invoke(&HelperCommand::new("netsh")).await;

        assert_eq!(
            *f.runner.timeouts.lock().unwrap(),
            vec![Duration::from_secs(15)]
        );
    }

    #[tokio::test]
    async fn command_override_wins() {
        let f = fixture(FakeRunner::exiting(1));
        f.guard
            .invoke(&HelperCommand::new("netsh").with_timeout(Duration::from_secs(3)))
            .await;

        assert_eq!(
            *f.runner.timeouts.lock().unwrap(),
            vec![Duration::from_secs(3)]
        );
    }
}

mod scripted {
    use super::mock::ScriptedHelper;
    use super::*;

    #[tokio::test]
    async fn first_matching_rule_wins_and_calls_are_recorded() {
        let helper = ScriptedHelper::new()
            .on("netsh", CommandOutcome::ok("table"))
            .on("net", CommandOutcome::ok("other"));

        let outcome = helper.invoke(&HelperCommand::new("netsh")).await;
        assert_eq!(outcome.stdout, "table");

        let unmatched = helper.invoke(&HelperCommand::new("ipconfig")).await;
        assert!(!unmatched.is_success());

        assert_eq!(helper.calls(), vec!["netsh", "ipconfig"]);
        assert_eq!(helper.count("netsh"), 1);
    }
}
