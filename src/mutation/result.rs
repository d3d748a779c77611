//! Outcome types for address mutation.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::network::MacAddress;
use crate::process::{CommandOutcome, OutcomeStatus};

/// The backend mechanisms, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Direct edit of the device store override value.
    Registry,
    /// `NetAdapter` cmdlet run through `PowerShell`.
    #[serde(rename = "powershell")]
    PowerShell,
    /// Driver advanced property set through the management interface.
    Management,
    /// External device-control utility writing the override value.
    DeviceUtility,
}

impl StrategyKind {
    /// Stable short name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Registry => "registry",
            Self::PowerShell => "powershell",
            Self::Management => "management",
            Self::DeviceUtility => "device-utility",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a successful strategy did to the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    /// The change is live.
    Immediate,
    /// The change is persisted but needs an adapter restart to take effect.
    RequiresRestart,
    /// Nothing needed changing.
    Unchanged,
}

/// Why a single strategy failed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// No device store entry belongs to the adapter.
    #[error("adapter not found in device store")]
    NotLocated,

    /// The backend is not available on this system.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The device store refused the operation.
    #[error("store error: {0}")]
    Store(String),

    /// The helper ran and reported failure.
    #[error("command failed: {0}")]
    CommandFailed(String),

    /// The helper was killed after its timeout.
    #[error("{0}")]
    Timeout(String),

    /// The helper could not be started.
    #[error("{0}")]
    SpawnFailed(String),

    /// The resource guard refused to run the helper.
    #[error("resources exhausted: {0}")]
    ResourceExhausted(String),
}

impl FailureReason {
    /// Classifies a non-successful helper outcome.
    #[must_use]
    pub fn from_outcome(outcome: &CommandOutcome) -> Self {
        let detail = outcome.failure_detail();
        match outcome.status {
            OutcomeStatus::Exited { .. } => Self::CommandFailed(detail),
            OutcomeStatus::TimedOut { .. } => Self::Timeout(detail),
            OutcomeStatus::SpawnFailed { .. } => Self::SpawnFailed(detail),
            OutcomeStatus::ResourceExhausted { .. } => Self::ResourceExhausted(detail),
        }
    }

    /// Returns true if this failure must stop the strategy chain.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::ResourceExhausted(_))
    }
}

/// Outcome of a single strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The strategy succeeded with the given effect.
    Success(Effect),
    /// The strategy failed.
    Failure(FailureReason),
}

/// One entry of the ordered attempt log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationAttempt {
    /// Which strategy ran.
    pub strategy: StrategyKind,
    /// How it ended.
    pub outcome: AttemptOutcome,
}

/// Whether a successful change is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyState {
    /// The adapter is using the new configuration.
    Active,
    /// The configuration is persisted; the adapter must be restarted.
    PendingRestart,
}

/// Why a mutation request failed as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The request itself was invalid.
    InputInvalid,
    /// The adapter already has the requested address.
    NoOp,
    /// The current address could not be determined.
    ReadFailed,
    /// Every strategy failed.
    AggregateFailure,
    /// The resource guard refused a helper invocation.
    ResourceExhausted,
}

/// The terminal result of a mutate, restore or restart request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationResult {
    /// Whether the request succeeded.
    pub success: bool,
    /// Strategy that succeeded, if any.
    pub strategy_used: Option<StrategyKind>,
    /// Address before the request, when it was read.
    pub original_address: Option<MacAddress>,
    /// Address requested, for successful mutations.
    pub new_address: Option<MacAddress>,
    /// Human readable summary, including restart warnings.
    pub message: String,
    /// Whether a successful change is live.
    pub applied: Option<ApplyState>,
    /// Failure classification, for unsuccessful results.
    pub failure: Option<FailureKind>,
    /// Every strategy tried, in order.
    pub attempts: Vec<MutationAttempt>,
}

impl MutationResult {
    /// A failed result with no attempts.
    #[must_use]
    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            strategy_used: None,
            original_address: None,
            new_address: None,
            message: message.into(),
            applied: None,
            failure: Some(kind),
            attempts: Vec::new(),
        }
    }

    /// A successful result.
    #[must_use]
    pub fn succeeded(
        strategy: Option<StrategyKind>,
        applied: ApplyState,
        message: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            strategy_used: strategy,
            original_address: None,
            new_address: None,
            message: message.into(),
            applied: Some(applied),
            failure: None,
            attempts: Vec::new(),
        }
    }

    /// Sets the address read before the request.
    #[must_use]
    pub const fn with_original(mut self, address: Option<MacAddress>) -> Self {
        self.original_address = address;
        self
    }

    /// Sets the requested address.
    #[must_use]
    pub const fn with_new(mut self, address: MacAddress) -> Self {
        self.new_address = Some(address);
        self
    }

    /// Sets the attempt log.
    #[must_use]
    pub fn with_attempts(mut self, attempts: Vec<MutationAttempt>) -> Self {
        self.attempts = attempts;
        self
    }
}
