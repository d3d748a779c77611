//! Helper process execution with timeout and guaranteed kill.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};

use super::command::{CommandOutcome, HelperCommand, OutcomeStatus};
use super::registry::ProcessTicket;

/// Runs a helper command to completion or timeout.
///
/// Implementations never fail: every way a run can end is reported through
/// [`CommandOutcome`]. The spawned process id must be attached to `ticket`,
/// and [`ProcessTicket::mark_exited`] called once the process has been
/// waited for.
pub trait CommandRunner: Send + Sync {
    /// Runs `command`, killing it if it outlives `timeout`.
    fn run(
        &self,
        command: &HelperCommand,
        timeout: Duration,
        ticket: &mut ProcessTicket,
    ) -> impl std::future::Future<Output = CommandOutcome> + Send;
}

/// Production [`CommandRunner`] using `tokio::process`.
///
/// Stdout and stderr are drained concurrently with the wait, so a chatty
/// helper cannot block on a full pipe. On timeout the child is killed and
/// waited for at most `kill_wait`.
#[derive(Debug, Clone, Copy)]
pub struct TokioCommandRunner {
    kill_wait: Duration,
}

impl TokioCommandRunner {
    /// Creates a runner that waits at most `kill_wait` for a killed child.
    #[must_use]
    pub const fn new(kill_wait: Duration) -> Self {
        Self { kill_wait }
    }
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl CommandRunner for TokioCommandRunner {
    async fn run(
        &self,
        command: &HelperCommand,
        timeout: Duration,
        ticket: &mut ProcessTicket,
    ) -> CommandOutcome {
        let mut cmd = tokio::process::Command::new(command.program());
        cmd.args(command.arguments())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        hide_console_window(&mut cmd);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(program = command.program(), "Failed to spawn helper: {e}");
                return CommandOutcome::bare(OutcomeStatus::SpawnFailed {
                    reason: e.to_string(),
                });
            }
        };

        if let Some(pid) = child.id() {
            ticket.attach(pid);
        }

        let mut stdout_handle = child.stdout.take();
        let mut stderr_handle = child.stderr.take();

        tokio::select! {
            (status, stdout, stderr) = async {
                tokio::join!(
                    child.wait(),
                    drain(stdout_handle.as_mut()),
                    drain(stderr_handle.as_mut()),
                )
            } => {
                ticket.mark_exited();
                let status = match status {
                    Ok(status) => OutcomeStatus::Exited {
                        code: status.code(),
                        success: status.success(),
                    },
                    Err(e) => OutcomeStatus::SpawnFailed {
                        reason: format!("wait failed: {e}"),
                    },
                };
                CommandOutcome {
                    status,
                    stdout: String::from_utf8_lossy(&stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&stderr).into_owned(),
                }
            }
            () = tokio::time::sleep(timeout) => {
                tracing::warn!(
                    program = command.program(),
                    "Helper timed out after {}ms, killing",
                    timeout.as_millis()
                );
                if let Err(e) = child.start_kill() {
                    tracing::warn!("Failed to kill helper: {e}");
                }
                match tokio::time::timeout(self.kill_wait, child.wait()).await {
                    Ok(Ok(_)) => ticket.mark_exited(),
                    Ok(Err(e)) => tracing::warn!("Failed to reap killed helper: {e}"),
                    Err(_) => tracing::warn!("Killed helper did not exit within {}ms", self.kill_wait.as_millis()),
                }
                CommandOutcome::bare(OutcomeStatus::TimedOut { after: timeout })
            }
        }
    }
}

async fn drain<R: AsyncRead + Unpin>(handle: Option<&mut R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(handle) = handle {
        let _ = handle.read_to_end(&mut buf).await;
    }
    buf
}

#[cfg(windows)]
fn hide_console_window(cmd: &mut tokio::process::Command) {
    use windows::Win32::System::Threading::CREATE_NO_WINDOW;
    cmd.creation_flags(CREATE_NO_WINDOW.0);
}

#[cfg(not(windows))]
const fn hide_console_window(_cmd: &mut tokio::process::Command) {}
