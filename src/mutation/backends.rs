//! Concrete set and clear strategies.
//!
//! | strategy | set | clear | effect |
//! |---|---|---|---|
//! | [`StoreEditStrategy`] | write override value | delete override value | restart needed |
//! | [`ShellCommandStrategy`] | `Set-NetAdapter -MacAddress` | `Reset-NetAdapterAdvancedProperty` | immediate |
//! | [`ManagementStrategy`] | driver advanced property | n/a | immediate |
//! | [`DeviceUtilityStrategy`] | external `reg`-style utility | n/a | restart needed |

use std::sync::Arc;

use crate::management::{ManagementApi, ManagementError};
use crate::network::{AdapterIdentity, MacAddress, MacFormat};
use crate::process::{Helper, HelperCommand, ps_quote};
use crate::store::{
    DeleteOutcome, DeviceStore, IdentityLocator, NETWORK_ADDRESS, StoreError, StoreMatch,
};

use super::result::{AttemptOutcome, Effect, FailureReason, StrategyKind};
use super::strategy::{BoxFuture, ClearStrategy, SetStrategy};

/// Locates the adapter's store entry, mapping every miss to a failure.
async fn located<S: DeviceStore, M: ManagementApi>(
    locator: &IdentityLocator<S, M>,
    identity: &AdapterIdentity,
) -> Result<StoreMatch, FailureReason> {
    match locator.locate(identity).await {
        Ok(Some(found)) => Ok(found),
        Ok(None) => Err(FailureReason::NotLocated),
        Err(StoreError::Refused(detail)) => Err(FailureReason::ResourceExhausted(detail)),
        Err(e) => Err(FailureReason::Store(e.to_string())),
    }
}

/// Runs a helper and maps a non-successful outcome to a failure.
async fn run_helper<H: Helper>(
    helper: &H,
    command: HelperCommand,
    effect: Effect,
) -> AttemptOutcome {
    let outcome = helper.invoke(&command).await;
    if outcome.is_success() {
        AttemptOutcome::Success(effect)
    } else {
        AttemptOutcome::Failure(FailureReason::from_outcome(&outcome))
    }
}

/// Writes or deletes the override value directly in the device store.
#[derive(Debug)]
pub struct StoreEditStrategy<S, M> {
    store: Arc<S>,
    locator: Arc<IdentityLocator<S, M>>,
}

impl<S, M> StoreEditStrategy<S, M> {
    /// Creates the strategy.
    #[must_use]
    pub const fn new(store: Arc<S>, locator: Arc<IdentityLocator<S, M>>) -> Self {
        Self { store, locator }
    }
}

impl<S: DeviceStore, M: ManagementApi> SetStrategy for StoreEditStrategy<S, M> {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Registry
    }

    fn apply<'a>(
        &'a self,
        identity: &'a AdapterIdentity,
        address: MacAddress,
    ) -> BoxFuture<'a, AttemptOutcome> {
        Box::pin(async move {
            let entry = match located(&self.locator, identity).await {
                Ok(entry) => entry,
                Err(reason) => return AttemptOutcome::Failure(reason),
            };
            match self
                .store
                .write_value(&entry.path, NETWORK_ADDRESS, &address.to_store_form())
            {
                Ok(()) => AttemptOutcome::Success(Effect::RequiresRestart),
                Err(e) => AttemptOutcome::Failure(FailureReason::Store(e.to_string())),
            }
        })
    }
}

impl<S: DeviceStore, M: ManagementApi> ClearStrategy for StoreEditStrategy<S, M> {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Registry
    }

    fn clear<'a>(&'a self, identity: &'a AdapterIdentity) -> BoxFuture<'a, AttemptOutcome> {
        Box::pin(async move {
            let entry = match located(&self.locator, identity).await {
                Ok(entry) => entry,
                Err(reason) => return AttemptOutcome::Failure(reason),
            };
            match self.store.delete_value(&entry.path, NETWORK_ADDRESS) {
                Ok(DeleteOutcome::Deleted) => AttemptOutcome::Success(Effect::RequiresRestart),
                Ok(DeleteOutcome::Absent) => AttemptOutcome::Success(Effect::Unchanged),
                Err(e) => AttemptOutcome::Failure(FailureReason::Store(e.to_string())),
            }
        })
    }
}

/// Uses the `NetAdapter` cmdlets, which apply the change and cycle the
/// adapter themselves.
#[derive(Debug)]
pub struct ShellCommandStrategy<H> {
    helper: Arc<H>,
}

impl<H> ShellCommandStrategy<H> {
    /// Creates the strategy.
    #[must_use]
    pub const fn new(helper: Arc<H>) -> Self {
        Self { helper }
    }
}

impl<H: Helper> SetStrategy for ShellCommandStrategy<H> {
    fn kind(&self) -> StrategyKind {
        StrategyKind::PowerShell
    }

    fn apply<'a>(
        &'a self,
        identity: &'a AdapterIdentity,
        address: MacAddress,
    ) -> BoxFuture<'a, AttemptOutcome> {
        let command = HelperCommand::powershell(format!(
            "Set-NetAdapter -Name {} -MacAddress {} -Confirm:$false",
            ps_quote(&identity.display_name),
            ps_quote(&address.format(MacFormat::Dash))
        ));
        Box::pin(run_helper(self.helper.as_ref(), command, Effect::Immediate))
    }
}

impl<H: Helper> ClearStrategy for ShellCommandStrategy<H> {
    fn kind(&self) -> StrategyKind {
        StrategyKind::PowerShell
    }

    fn clear<'a>(&'a self, identity: &'a AdapterIdentity) -> BoxFuture<'a, AttemptOutcome> {
        let command = HelperCommand::powershell(format!(
            "Reset-NetAdapterAdvancedProperty -Name {} -RegistryKeyword {} -Confirm:$false",
            ps_quote(&identity.display_name),
            ps_quote(NETWORK_ADDRESS)
        ));
        Box::pin(run_helper(self.helper.as_ref(), command, Effect::Immediate))
    }
}

/// Sets the driver's advanced property through the management interface.
#[derive(Debug)]
pub struct ManagementStrategy<M> {
    management: Arc<M>,
}

impl<M> ManagementStrategy<M> {
    /// Creates the strategy.
    #[must_use]
    pub const fn new(management: Arc<M>) -> Self {
        Self { management }
    }
}

impl<M: ManagementApi> SetStrategy for ManagementStrategy<M> {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Management
    }

    fn apply<'a>(
        &'a self,
        identity: &'a AdapterIdentity,
        address: MacAddress,
    ) -> BoxFuture<'a, AttemptOutcome> {
        Box::pin(async move {
            match self
                .management
                .set_address(&identity.display_name, address)
                .await
            {
                Ok(()) => AttemptOutcome::Success(Effect::Immediate),
                Err(ManagementError::Unavailable(d)) => {
                    AttemptOutcome::Failure(FailureReason::Unavailable(d))
                }
                Err(ManagementError::Timeout(d)) => AttemptOutcome::Failure(FailureReason::Timeout(d)),
                Err(ManagementError::ResourceExhausted(d)) => {
                    AttemptOutcome::Failure(FailureReason::ResourceExhausted(d))
                }
            }
        })
    }
}

/// Writes the override value with an external device-control utility.
///
/// The utility is invoked as `<program> add HKLM\<entry> /v NetworkAddress
/// /t REG_SZ /d <HEX> /f` against the located store entry.
#[derive(Debug)]
pub struct DeviceUtilityStrategy<H, S, M> {
    helper: Arc<H>,
    locator: Arc<IdentityLocator<S, M>>,
    program: String,
}

impl<H, S, M> DeviceUtilityStrategy<H, S, M> {
    /// Creates the strategy running `program`.
    #[must_use]
    pub fn new(
        helper: Arc<H>,
        locator: Arc<IdentityLocator<S, M>>,
        program: impl Into<String>,
    ) -> Self {
        Self {
            helper,
            locator,
            program: program.into(),
        }
    }
}

impl<H: Helper, S: DeviceStore, M: ManagementApi> SetStrategy for DeviceUtilityStrategy<H, S, M> {
    fn kind(&self) -> StrategyKind {
        StrategyKind::DeviceUtility
    }

    fn apply<'a>(
        &'a self,
        identity: &'a AdapterIdentity,
        address: MacAddress,
    ) -> BoxFuture<'a, AttemptOutcome> {
        Box::pin(async move {
            let entry = match located(&self.locator, identity).await {
                Ok(entry) => entry,
                Err(reason) => return AttemptOutcome::Failure(reason),
            };
            let command = HelperCommand::new(self.program.as_str()).args([
                "add".to_string(),
                format!(r"HKLM\{}", entry.path),
                "/v".to_string(),
                NETWORK_ADDRESS.to_string(),
                "/t".to_string(),
                "REG_SZ".to_string(),
                "/d".to_string(),
                address.to_store_form(),
                "/f".to_string(),
            ]);
            run_helper(self.helper.as_ref(), command, Effect::RequiresRestart).await
        })
    }
}

#[cfg(test)]
#[path = "backends_tests.rs"]
mod tests;
