//! Application execution logic.
//!
//! This module runs the selected action against the platform service and
//! renders the result as text or JSON.

use std::fmt::Write as _;

use serde::Serialize;
use thiserror::Error;

use adapterctl::config::{Action, ValidatedConfig};
use adapterctl::management::ManagementError;
use adapterctl::mutation::{AttemptOutcome, MutationResult, ReadError};
use adapterctl::network::{AdapterIdentity, MacAddress, ResolvedStatus, decode_legacy_code};
use adapterctl::process::shutdown::{shutdown_channel, shutdown_signal, spawn_emergency_cleanup};
use adapterctl::service::{InitError, PlatformService, ServiceSettings, StatusReport};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// The platform service could not be built.
    #[error("Failed to initialise adapter service: {0}")]
    Init(#[source] InitError),

    /// The current address could not be read.
    #[error("Failed to read address: {0}")]
    Read(#[source] ReadError),

    /// The burned-in address could not be read.
    #[error("Failed to read hardware address: {0}")]
    Management(#[source] ManagementError),

    /// A termination signal arrived before the operation finished.
    #[error("Interrupted; helper processes were terminated")]
    Interrupted,

    /// The result could not be serialized.
    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Result of one action, ready for rendering.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Outcome {
    Status {
        adapter: String,
        #[serde(flatten)]
        report: StatusReport,
    },
    Address {
        adapter: String,
        address: Option<MacAddress>,
        permanent: bool,
    },
    Mutation {
        adapter: String,
        #[serde(flatten)]
        result: MutationResult,
    },
    Decoded {
        code: u32,
        status: ResolvedStatus,
    },
}

impl Outcome {
    /// Whether the process should exit successfully.
    const fn is_success(&self) -> bool {
        match self {
            Self::Mutation { result, .. } => result.success,
            Self::Status { .. } | Self::Address { .. } | Self::Decoded { .. } => true,
        }
    }

    fn render_text(&self) -> String {
        match self {
            Self::Status { adapter, report } => format!(
                "{adapter}: {} (enabled: {}, connected: {})",
                report.status.label,
                yes_no(report.status.is_enabled),
                yes_no(report.status.is_connected),
            ),
            Self::Address {
                adapter,
                address,
                permanent,
            } => {
                let kind = if *permanent { "hardware address" } else { "address" };
                address.map_or_else(
                    || format!("{adapter}: {kind} unknown"),
                    |address| format!("{adapter}: {kind} {address}"),
                )
            }
            Self::Mutation { adapter, result } => render_mutation(adapter, result),
            Self::Decoded { code, status } => format!(
                "{code}: {} (enabled: {}, connected: {})",
                status.label,
                yes_no(status.is_enabled),
                yes_no(status.is_connected),
            ),
        }
    }

    fn render(&self, json: bool) -> Result<String, RunError> {
        if json {
            Ok(serde_json::to_string_pretty(self)?)
        } else {
            Ok(self.render_text())
        }
    }
}

const fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn render_mutation(adapter: &str, result: &MutationResult) -> String {
    let mut text = format!("{adapter}: {}", result.message);
    if let Some(original) = result.original_address {
        let _ = write!(text, "\n  previous address: {original}");
    }
    if let Some(new) = result.new_address {
        let _ = write!(text, "\n  new address: {new}");
    }
    if let Some(strategy) = result.strategy_used {
        let _ = write!(text, "\n  strategy: {}", strategy.name());
    }
    let failed = result
        .attempts
        .iter()
        .filter(|a| Some(a.strategy) != result.strategy_used);
    for attempt in failed {
        if let AttemptOutcome::Failure(reason) = &attempt.outcome {
            let _ = write!(text, "\n  {} failed: {reason}", attempt.strategy.name());
        }
    }
    text
}

/// Executes the configured action and prints its result.
///
/// Returns whether the action succeeded. Failures that prevent an action
/// from producing a result are returned as [`RunError`].
///
/// # Errors
///
/// Returns an error if:
/// - The platform service cannot be built
/// - An address read fails
/// - A termination signal interrupts the action
/// - The result cannot be rendered
///
/// # Coverage Note
///
/// This function is excluded from coverage because it requires:
/// - Platform-specific adapter tooling
/// - Real async runtime with signal handling
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig) -> Result<bool, RunError> {
    let outcome = match offline(&config.action) {
        Some(outcome) => outcome,
        None => run_guarded(&config.settings, config.action).await?,
    };

    println!("{}", outcome.render(config.json)?);
    Ok(outcome.is_success())
}

/// Runs an action against the platform service, terminating helpers on
/// a shutdown signal.
///
/// Excluded from coverage - requires platform APIs and signal handling.
#[cfg(not(tarpaulin_include))]
async fn run_guarded(settings: &ServiceSettings, action: Action) -> Result<Outcome, RunError> {
    let service = PlatformService::platform(settings).map_err(RunError::Init)?;

    let (shutdown, token) = shutdown_channel();
    let registry = service.helper().registry().clone();
    let cleanup = spawn_emergency_cleanup(registry, token, settings.kill_wait);

    tokio::select! {
        biased;

        () = shutdown_signal() => {
            tracing::warn!("Shutdown signal received, stopping...");
            shutdown.shutdown();
            match cleanup.await {
                Ok(terminated) => tracing::info!(terminated, "Helper processes terminated"),
                Err(e) => tracing::error!("Emergency cleanup failed: {e}"),
            }
            Err(RunError::Interrupted)
        }

        outcome = perform(&service, action) => {
            cleanup.abort();
            outcome
        }
    }
}

/// Runs one action against an already built service.
#[cfg(not(tarpaulin_include))]
async fn perform(service: &PlatformService, action: Action) -> Result<Outcome, RunError> {
    let outcome = match action {
        Action::Status(identity) => Outcome::Status {
            report: service.status(&identity).await,
            adapter: label(&identity),
        },
        Action::Get {
            identity,
            permanent: false,
        } => Outcome::Address {
            address: Some(
                service
                    .current_address(&identity)
                    .await
                    .map_err(RunError::Read)?,
            ),
            adapter: label(&identity),
            permanent: false,
        },
        Action::Get {
            identity,
            permanent: true,
        } => Outcome::Address {
            address: service
                .hardware_address(&identity)
                .await
                .map_err(RunError::Management)?,
            adapter: label(&identity),
            permanent: true,
        },
        Action::Set { identity, address } => Outcome::Mutation {
            result: service.mutate(&identity, address).await,
            adapter: label(&identity),
        },
        Action::Restore(identity) => Outcome::Mutation {
            result: service.restore(&identity).await,
            adapter: label(&identity),
        },
        Action::Restart(identity) => Outcome::Mutation {
            result: service.restart(&identity).await,
            adapter: label(&identity),
        },
        Action::Decode(code) => decode(code),
    };
    Ok(outcome)
}

/// Answers actions that never touch the platform service.
const fn offline(action: &Action) -> Option<Outcome> {
    match action {
        Action::Decode(code) => Some(decode(*code)),
        Action::Status(_)
        | Action::Get { .. }
        | Action::Set { .. }
        | Action::Restore(_)
        | Action::Restart(_) => None,
    }
}

fn label(identity: &AdapterIdentity) -> String {
    identity.display_name.clone()
}

const fn decode(code: u32) -> Outcome {
    Outcome::Decoded {
        code,
        status: decode_legacy_code(code),
    }
}
