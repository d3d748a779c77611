//! Ordered strategy chains for changing and restoring an adapter address.

use std::sync::Arc;
use std::time::Duration;

use crate::network::{AdapterIdentity, MacAddress};
use crate::process::{Helper, HelperCommand, ps_quote};
use crate::time::{Sleeper, TokioSleeper};

use super::reader::{AddressReader, ReadError};
use super::result::{
    ApplyState, AttemptOutcome, Effect, FailureKind, FailureReason, MutationAttempt,
    MutationResult, StrategyKind,
};
use super::strategy::{BoxFuture, ClearStrategy, SetStrategy};

/// Settle delays and switches for the disable/enable restart cycle.
///
/// # Defaults
///
/// - `disable_settle`: 2 seconds
/// - `enable_settle`: 3 seconds
/// - `skip`: false
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartSettings {
    /// Wait after disabling the adapter.
    pub disable_settle: Duration,

    /// Wait after enabling the adapter.
    pub enable_settle: Duration,

    /// Never run the cycle; changes needing it stay pending.
    pub skip: bool,
}

impl RestartSettings {
    /// Default wait after disabling.
    pub const DEFAULT_DISABLE_SETTLE: Duration = Duration::from_secs(2);

    /// Default wait after enabling.
    pub const DEFAULT_ENABLE_SETTLE: Duration = Duration::from_secs(3);

    /// Creates settings with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            disable_settle: Self::DEFAULT_DISABLE_SETTLE,
            enable_settle: Self::DEFAULT_ENABLE_SETTLE,
            skip: false,
        }
    }

    /// Sets both settle delays.
    #[must_use]
    pub const fn with_settle(mut self, disable: Duration, enable: Duration) -> Self {
        self.disable_settle = disable;
        self.enable_settle = enable;
        self
    }

    /// Disables the restart cycle entirely.
    #[must_use]
    pub const fn with_skip(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }
}

impl Default for RestartSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// What the strategy chain produced.
struct ChainOutcome {
    attempts: Vec<MutationAttempt>,
    winner: Option<(StrategyKind, Effect)>,
    terminal: Option<FailureReason>,
}

impl ChainOutcome {
    /// Whether some strategy reported that the adapter does not exist.
    fn never_located(&self) -> bool {
        self.attempts
            .iter()
            .any(|a| matches!(a.outcome, AttemptOutcome::Failure(FailureReason::NotLocated)))
    }
}

/// Runs every strategy of a chain, mutating, restoring and restarting
/// adapters.
///
/// Strategies are tried strictly one at a time in insertion order. The first
/// success ends the chain; a resource refusal ends it with a terminal
/// failure.
///
/// # Type Parameters
///
/// - `R`: how the current address is read
/// - `H`: helper used for the restart cycle
/// - `Z`: sleeper for settle delays (defaults to [`TokioSleeper`])
pub struct MutationEngine<R, H, Z = TokioSleeper> {
    reader: R,
    helper: Arc<H>,
    sleeper: Z,
    restart: RestartSettings,
    setters: Vec<Box<dyn SetStrategy>>,
    clearers: Vec<Box<dyn ClearStrategy>>,
}

impl<R, H> MutationEngine<R, H, TokioSleeper> {
    /// Creates an engine with no strategies and default restart settings.
    #[must_use]
    pub fn new(reader: R, helper: Arc<H>) -> Self {
        Self {
            reader,
            helper,
            sleeper: TokioSleeper,
            restart: RestartSettings::default(),
            setters: Vec::new(),
            clearers: Vec::new(),
        }
    }
}

impl<R, H, Z> MutationEngine<R, H, Z> {
    /// Sets a custom sleeper for settle delays.
    #[must_use]
    pub fn with_sleeper<Z2>(self, sleeper: Z2) -> MutationEngine<R, H, Z2> {
        MutationEngine {
            reader: self.reader,
            helper: self.helper,
            sleeper,
            restart: self.restart,
            setters: self.setters,
            clearers: self.clearers,
        }
    }

    /// Sets the restart cycle behaviour.
    #[must_use]
    pub const fn with_restart(mut self, restart: RestartSettings) -> Self {
        self.restart = restart;
        self
    }

    /// Appends a strategy to the set chain.
    #[must_use]
    pub fn with_set_strategy(mut self, strategy: impl SetStrategy + 'static) -> Self {
        self.setters.push(Box::new(strategy));
        self
    }

    /// Appends a strategy to the clear chain.
    #[must_use]
    pub fn with_clear_strategy(mut self, strategy: impl ClearStrategy + 'static) -> Self {
        self.clearers.push(Box::new(strategy));
        self
    }

    /// Kinds in the set chain, in order.
    #[must_use]
    pub fn set_chain(&self) -> Vec<StrategyKind> {
        self.setters.iter().map(|s| s.kind()).collect()
    }

    /// Kinds in the clear chain, in order.
    #[must_use]
    pub fn clear_chain(&self) -> Vec<StrategyKind> {
        self.clearers.iter().map(|s| s.kind()).collect()
    }

    /// The reader used for current address lookups.
    #[must_use]
    pub const fn reader(&self) -> &R {
        &self.reader
    }
}

impl<R, H, Z> std::fmt::Debug for MutationEngine<R, H, Z> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationEngine")
            .field("restart", &self.restart)
            .field("set_chain", &self.set_chain())
            .field("clear_chain", &self.clear_chain())
            .finish_non_exhaustive()
    }
}

impl<R: AddressReader, H: Helper, Z: Sleeper> MutationEngine<R, H, Z> {
    /// Changes the adapter's address to `address`.
    ///
    /// The current address is read first; a failed read or an unchanged
    /// address ends the request before any strategy runs.
    pub async fn mutate(&self, identity: &AdapterIdentity, address: MacAddress) -> MutationResult {
        let original = match self.reader.current_address(identity).await {
            Ok(mac) => mac,
            Err(ReadError::ResourceExhausted(detail)) => {
                return MutationResult::failed(
                    FailureKind::ResourceExhausted,
                    format!("cannot read current address of {identity}: {detail}"),
                );
            }
            Err(ReadError::NotFound(_)) => {
                return MutationResult::failed(
                    FailureKind::InputInvalid,
                    format!("adapter {identity} not found"),
                );
            }
            Err(e) => {
                return MutationResult::failed(
                    FailureKind::ReadFailed,
                    format!("cannot read current address: {e}"),
                );
            }
        };

        if original == address {
            tracing::info!(adapter = %identity, %address, "Adapter already uses requested address");
            return MutationResult::failed(
                FailureKind::NoOp,
                format!("{identity} already uses {address}"),
            )
            .with_original(Some(original));
        }

        let chain = run_chain(
            identity,
            self.setters
                .iter()
                .map(|s| (s.kind(), s.apply(identity, address))),
        )
        .await;

        let result = match chain.winner {
            Some((strategy, effect)) => {
                let message = format!("changed {identity} from {original} to {address}");
                self.finish(identity, strategy, effect, message)
                    .await
                    .with_new(address)
            }
            None => chain_failure(identity, chain.terminal, "change the address of"),
        };
        result.with_original(Some(original)).with_attempts(chain.attempts)
    }

    /// Clears any address override so the adapter reverts to its hardware
    /// address.
    ///
    /// No prior read happens; an adapter without an override succeeds
    /// without a restart.
    pub async fn restore(&self, identity: &AdapterIdentity) -> MutationResult {
        let chain = run_chain(
            identity,
            self.clearers
                .iter()
                .map(|s| (s.kind(), s.clear(identity))),
        )
        .await;

        let result = match chain.winner {
            Some((strategy, Effect::Unchanged)) => MutationResult::succeeded(
                Some(strategy),
                ApplyState::Active,
                format!("{identity} is already at its hardware address"),
            ),
            Some((strategy, effect)) => {
                let message = format!("restored hardware address of {identity}");
                self.finish(identity, strategy, effect, message).await
            }
            None if chain.terminal.is_none() && chain.never_located() => {
                MutationResult::failed(
                    FailureKind::InputInvalid,
                    format!("adapter {identity} not found"),
                )
            }
            None => chain_failure(identity, chain.terminal, "restore"),
        };
        result.with_attempts(chain.attempts)
    }

    /// Disables and re-enables the adapter.
    pub async fn restart_adapter(&self, identity: &AdapterIdentity) -> MutationResult {
        match self.cycle(identity).await {
            Ok(()) => MutationResult::succeeded(
                None,
                ApplyState::Active,
                format!("restarted {identity}"),
            ),
            Err(reason) if reason.is_terminal() => MutationResult::failed(
                FailureKind::ResourceExhausted,
                format!("cannot restart {identity}: {reason}"),
            ),
            Err(reason) => MutationResult::failed(
                FailureKind::AggregateFailure,
                format!("cannot restart {identity}: {reason}"),
            ),
        }
    }

    /// Builds the success result, running the restart cycle if the effect
    /// needs one.
    async fn finish(
        &self,
        identity: &AdapterIdentity,
        strategy: StrategyKind,
        effect: Effect,
        message: String,
    ) -> MutationResult {
        if effect != Effect::RequiresRestart {
            return MutationResult::succeeded(Some(strategy), ApplyState::Active, message);
        }

        if self.restart.skip {
            return MutationResult::succeeded(
                Some(strategy),
                ApplyState::PendingRestart,
                format!("{message}; restart skipped, change takes effect after the adapter restarts"),
            );
        }

        match self.cycle(identity).await {
            Ok(()) => MutationResult::succeeded(Some(strategy), ApplyState::Active, message),
            Err(reason) => {
                tracing::warn!(adapter = %identity, "Restart cycle failed: {reason}");
                MutationResult::succeeded(
                    Some(strategy),
                    ApplyState::PendingRestart,
                    format!("{message}; warning: adapter restart failed ({reason}), restart it manually"),
                )
            }
        }
    }

    /// Runs disable, settle, enable, settle.
    async fn cycle(&self, identity: &AdapterIdentity) -> Result<(), FailureReason> {
        let name = ps_quote(&identity.display_name);

        tracing::info!(adapter = %identity, "Disabling adapter");
        self.step(format!("Disable-NetAdapter -Name {name} -Confirm:$false"))
            .await?;
        self.sleeper.sleep(self.restart.disable_settle).await;

        tracing::info!(adapter = %identity, "Enabling adapter");
        self.step(format!("Enable-NetAdapter -Name {name} -Confirm:$false"))
            .await?;
        self.sleeper.sleep(self.restart.enable_settle).await;

        Ok(())
    }

    async fn step(&self, script: String) -> Result<(), FailureReason> {
        let outcome = self.helper.invoke(&HelperCommand::powershell(script)).await;
        if outcome.is_success() {
            Ok(())
        } else {
            Err(FailureReason::from_outcome(&outcome))
        }
    }
}

/// Tries each strategy in order until one succeeds or one fails terminally.
async fn run_chain<'a>(
    identity: &AdapterIdentity,
    steps: impl Iterator<Item = (StrategyKind, BoxFuture<'a, AttemptOutcome>)>,
) -> ChainOutcome {
    let mut attempts = Vec::new();

    for (strategy, attempt) in steps {
        let outcome = attempt.await;
        attempts.push(MutationAttempt {
            strategy,
            outcome: outcome.clone(),
        });

        match outcome {
            AttemptOutcome::Success(effect) => {
                tracing::info!(adapter = %identity, strategy = strategy.name(), ?effect, "Strategy succeeded");
                return ChainOutcome {
                    attempts,
                    winner: Some((strategy, effect)),
                    terminal: None,
                };
            }
            AttemptOutcome::Failure(reason) if reason.is_terminal() => {
                tracing::error!(adapter = %identity, strategy = strategy.name(), "Strategy refused: {reason}");
                return ChainOutcome {
                    attempts,
                    winner: None,
                    terminal: Some(reason),
                };
            }
            AttemptOutcome::Failure(reason) => {
                tracing::warn!(adapter = %identity, strategy = strategy.name(), "Strategy failed: {reason}");
            }
        }
    }

    ChainOutcome {
        attempts,
        winner: None,
        terminal: None,
    }
}

fn chain_failure(
    identity: &AdapterIdentity,
    terminal: Option<FailureReason>,
    action: &str,
) -> MutationResult {
    match terminal {
        Some(reason) => MutationResult::failed(
            FailureKind::ResourceExhausted,
            format!("stopped trying to {action} {identity}: {reason}"),
        ),
        None => MutationResult::failed(
            FailureKind::AggregateFailure,
            format!(
                "every strategy failed to {action} {identity}; verify the adapter and driver support a software address"
            ),
        ),
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
