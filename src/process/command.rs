//! Helper command description and structured outcome.

use std::fmt;
use std::time::Duration;

/// A helper command to run: program, arguments and an optional timeout
/// override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperCommand {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl HelperCommand {
    /// Creates a command for `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    /// Creates a non-interactive `PowerShell` invocation of `script`.
    ///
    /// Output is forced to UTF-8 so that localized tool output survives
    /// decoding. The profile is skipped and execution policy bypassed.
    #[must_use]
    pub fn powershell(script: impl AsRef<str>) -> Self {
        let script = format!(
            "[Console]::OutputEncoding = [System.Text.Encoding]::UTF8; {}",
            script.as_ref()
        );
        Self::new("powershell").args([
            "-NoProfile",
            "-NonInteractive",
            "-ExecutionPolicy",
            "Bypass",
            "-Command",
            &script,
        ])
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Overrides the executor's default timeout for this command.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The program to run.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The arguments, in order.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// The timeout override, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl fmt::Display for HelperCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Quotes `value` as a `PowerShell` single-quoted string literal.
///
/// Embedded single quotes are doubled, so the result is always one literal.
#[must_use]
pub fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// How a helper invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// The process ran to completion.
    Exited {
        /// Exit code, if the platform reported one.
        code: Option<i32>,
        /// Whether the platform considers the exit successful.
        success: bool,
    },

    /// The process exceeded its timeout and was killed.
    TimedOut {
        /// The timeout that was exceeded.
        after: Duration,
    },

    /// The process could not be started.
    SpawnFailed {
        /// Description of the spawn error.
        reason: String,
    },

    /// The invocation was refused before spawning because the host process
    /// exceeded its memory ceiling.
    ResourceExhausted {
        /// Resident memory growth over the baseline, in bytes.
        growth_bytes: u64,
        /// Configured ceiling, in bytes.
        ceiling_bytes: u64,
    },
}

/// Result of one helper invocation. Never an error: every way a helper can
/// end is represented in [`OutcomeStatus`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    /// How the invocation ended.
    pub status: OutcomeStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

impl CommandOutcome {
    /// An outcome for a process that exited with `code`.
    #[must_use]
    pub fn exited(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Exited {
                code: Some(code),
                success: code == 0,
            },
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// A successful outcome with the given stdout.
    #[must_use]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self::exited(0, stdout, "")
    }

    /// An outcome with no captured output.
    #[must_use]
    pub const fn bare(status: OutcomeStatus) -> Self {
        Self {
            status,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// Returns true if the process exited successfully.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Exited { success: true, .. })
    }

    /// Returns true if the invocation was refused for resource reasons.
    #[must_use]
    pub const fn is_resource_exhausted(&self) -> bool {
        matches!(self.status, OutcomeStatus::ResourceExhausted { .. })
    }

    /// Returns the trimmed stdout if the process exited successfully.
    #[must_use]
    pub fn success_output(&self) -> Option<&str> {
        self.is_success().then(|| self.stdout.trim())
    }

    /// Short human readable description of why the invocation did not
    /// succeed.
    #[must_use]
    pub fn failure_detail(&self) -> String {
        match &self.status {
            OutcomeStatus::Exited { code, .. } => {
                let stderr = self.stderr.trim();
                let code = code.map_or_else(|| "none".to_string(), |c| c.to_string());
                if stderr.is_empty() {
                    format!("exit code {code}")
                } else {
                    format!("exit code {code}: {}", first_line(stderr))
                }
            }
            OutcomeStatus::TimedOut { after } => {
                format!("timed out after {}ms", after.as_millis())
            }
            OutcomeStatus::SpawnFailed { reason } => format!("failed to start: {reason}"),
            OutcomeStatus::ResourceExhausted {
                growth_bytes,
                ceiling_bytes,
            } => format!(
                "memory growth {} MB exceeds ceiling {} MB",
                growth_bytes / MIB,
                ceiling_bytes / MIB
            ),
        }
    }
}

const MIB: u64 = 1024 * 1024;

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or(text).trim()
}
