//! Adapter operations facade.
//!
//! [`AdapterService`] wires the device store, the management interface and
//! the guarded helper layer into the mutation engine and exposes every
//! adapter operation behind one type. [`AdapterService::platform`] builds
//! the production wiring.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::config::defaults;
use crate::management::{CimManagement, ManagementApi, ManagementError};
use crate::mutation::{
    AddressReader, ChainedAddressReader, DeviceUtilityStrategy, ManagementStrategy,
    MutationEngine, MutationResult, ReadError, RestartSettings, ShellCommandStrategy,
    StoreEditStrategy,
};
use crate::network::{
    AdapterIdentity, AdminStatus, LinkStatus, MacAddress, ResolvedStatus, StatusSample,
    parse_interface_table,
};
use crate::process::{GuardLimits, Helper, HelperCommand, ResourceGuard};
use crate::store::platform::PlatformStore;
use crate::store::{DeviceStore, IdentityLocator, StoreError};
use crate::time::{Sleeper, TokioSleeper};

/// Error type for building the production service.
#[derive(Debug, Error)]
pub enum InitError {
    /// This platform has no device store or adapter tooling.
    #[error("adapter management is only supported on Windows")]
    PlatformUnavailable,

    /// The host process memory cannot be sampled, so the guard cannot work.
    #[error("cannot sample process memory; resource guard unavailable")]
    ProbeUnavailable,

    /// The adapter class key cannot be opened.
    #[error("device store unavailable: {0}")]
    Store(#[source] StoreError),
}

/// Tunables for the service wiring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Helper timeout and memory ceiling.
    pub guard: GuardLimits,

    /// Wait after killing a helper, for timeouts and emergency cleanup.
    pub kill_wait: Duration,

    /// Maximum device store entries scanned when locating an adapter.
    pub max_fanout: usize,

    /// Restart cycle behaviour.
    pub restart: RestartSettings,

    /// Device-control utility used by the last set strategy.
    pub device_utility: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            guard: GuardLimits {
                timeout: defaults::timeout(),
                memory_ceiling_bytes: defaults::megabytes(defaults::MEMORY_CEILING_MB),
            },
            kill_wait: defaults::kill_wait(),
            max_fanout: defaults::MAX_FANOUT,
            restart: RestartSettings::new()
                .with_settle(defaults::disable_settle(), defaults::enable_settle()),
            device_utility: defaults::DEVICE_UTILITY.to_string(),
        }
    }
}

/// Status of an adapter together with the signals it was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    /// Administrative state from the interface table.
    pub admin: AdminStatus,
    /// Link state from the interface table.
    pub link: LinkStatus,
    /// Resolved status.
    pub status: ResolvedStatus,
}

/// The helper used in production.
pub type PlatformHelper = ResourceGuard;

/// The service wiring used in production.
pub type PlatformService =
    AdapterService<PlatformHelper, PlatformStore, CimManagement<PlatformHelper>>;

/// Every adapter operation behind one handle.
#[derive(Debug)]
pub struct AdapterService<H, S, M, Z = TokioSleeper> {
    helper: Arc<H>,
    management: Arc<M>,
    engine: MutationEngine<ChainedAddressReader<H, S, M>, H, Z>,
}

impl<H, S, M> AdapterService<H, S, M>
where
    H: Helper + 'static,
    S: DeviceStore + 'static,
    M: ManagementApi + 'static,
{
    /// Wires the collaborators into the strategy chains.
    ///
    /// Set chain: registry, powershell, management, device utility.
    /// Clear chain: registry, powershell.
    #[must_use]
    pub fn new(
        helper: Arc<H>,
        store: Arc<S>,
        management: Arc<M>,
        settings: &ServiceSettings,
    ) -> Self {
        let locator = Arc::new(IdentityLocator::new(
            store.clone(),
            management.clone(),
            settings.max_fanout,
        ));
        let reader = ChainedAddressReader::new(
            helper.clone(),
            store.clone(),
            management.clone(),
            locator.clone(),
        );

        let engine = MutationEngine::new(reader, helper.clone())
            .with_restart(settings.restart)
            .with_set_strategy(StoreEditStrategy::new(store.clone(), locator.clone()))
            .with_set_strategy(ShellCommandStrategy::new(helper.clone()))
            .with_set_strategy(ManagementStrategy::new(management.clone()))
            .with_set_strategy(DeviceUtilityStrategy::new(
                helper.clone(),
                locator.clone(),
                settings.device_utility.as_str(),
            ))
            .with_clear_strategy(StoreEditStrategy::new(store, locator))
            .with_clear_strategy(ShellCommandStrategy::new(helper.clone()));

        Self {
            helper,
            management,
            engine,
        }
    }
}

impl<H, S, M, Z> AdapterService<H, S, M, Z> {
    /// Sets a custom sleeper for settle delays.
    #[must_use]
    pub fn with_sleeper<Z2>(self, sleeper: Z2) -> AdapterService<H, S, M, Z2> {
        AdapterService {
            helper: self.helper,
            management: self.management,
            engine: self.engine.with_sleeper(sleeper),
        }
    }

    /// The helper every invocation goes through.
    #[must_use]
    pub const fn helper(&self) -> &Arc<H> {
        &self.helper
    }

    /// The mutation engine.
    #[must_use]
    pub const fn engine(&self) -> &MutationEngine<ChainedAddressReader<H, S, M>, H, Z> {
        &self.engine
    }
}

impl<H, S, M, Z> AdapterService<H, S, M, Z>
where
    H: Helper,
    S: DeviceStore,
    M: ManagementApi,
    Z: Sleeper,
{
    /// Changes the adapter's address.
    pub async fn mutate(&self, identity: &AdapterIdentity, address: MacAddress) -> MutationResult {
        self.engine.mutate(identity, address).await
    }

    /// Reverts the adapter to its hardware address.
    pub async fn restore(&self, identity: &AdapterIdentity) -> MutationResult {
        self.engine.restore(identity).await
    }

    /// Disables and re-enables the adapter.
    pub async fn restart(&self, identity: &AdapterIdentity) -> MutationResult {
        self.engine.restart_adapter(identity).await
    }

    /// Reads the address the adapter is currently using.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError`] if no source reports an address or a helper
    /// invocation is refused.
    pub async fn current_address(&self, identity: &AdapterIdentity) -> Result<MacAddress, ReadError> {
        self.engine.reader().current_address(identity).await
    }

    /// Reads the adapter's burned-in address.
    ///
    /// # Errors
    ///
    /// Returns [`ManagementError`] if the management interface cannot answer.
    pub async fn hardware_address(
        &self,
        identity: &AdapterIdentity,
    ) -> Result<Option<MacAddress>, ManagementError> {
        self.management.permanent_address(&identity.display_name).await
    }

    /// Resolves the adapter's status.
    ///
    /// The interface table is consulted first. The legacy status code is
    /// only queried when the table reports neither signal.
    pub async fn status(&self, identity: &AdapterIdentity) -> StatusReport {
        let name = identity.display_name.as_str();
        let command = HelperCommand::new("netsh").args(["interface", "show", "interface"]);
        let outcome = self.helper.invoke(&command).await;

        let sample = match outcome.success_output() {
            Some(output) => parse_interface_table(output, name),
            None => {
                tracing::debug!(adapter = %name, "Interface table unavailable: {}", outcome.failure_detail());
                StatusSample::UNKNOWN
            }
        };

        let status = sample
            .resolve_or_else(async {
                tracing::debug!(adapter = %name, "No primary status signal, using legacy code");
                self.management
                    .legacy_status_code(name)
                    .await
                    .inspect_err(|e| tracing::debug!(adapter = %name, "Legacy status unavailable: {e}"))
                    .ok()
                    .flatten()
            })
            .await;

        StatusReport {
            admin: sample.admin,
            link: sample.link,
            status,
        }
    }
}

impl PlatformService {
    /// Builds the production wiring.
    ///
    /// # Errors
    ///
    /// Returns [`InitError`] when the platform has no device store or the
    /// memory probe cannot sample the host process.
    #[cfg(windows)]
    pub fn platform(settings: &ServiceSettings) -> Result<Self, InitError> {
        use crate::process::{
            MemoryProbe, ProcessRegistry, SysinfoMemoryProbe, TokioCommandRunner,
        };
        use crate::store::ADAPTER_CLASS_PATH;

        let probe = SysinfoMemoryProbe::new();
        if probe.resident_bytes().is_none() {
            return Err(InitError::ProbeUnavailable);
        }

        let store = Arc::new(PlatformStore::new());
        store
            .subkeys(ADAPTER_CLASS_PATH, 1)
            .map_err(InitError::Store)?;

        let guard = Arc::new(ResourceGuard::new(
            TokioCommandRunner::new(settings.kill_wait),
            probe,
            ProcessRegistry::default(),
            settings.guard,
        ));
        let management = Arc::new(CimManagement::new(guard.clone()));

        Ok(Self::new(guard, store, management, settings))
    }

    /// Builds the production wiring.
    ///
    /// # Errors
    ///
    /// Always returns [`InitError::PlatformUnavailable`] on this platform.
    #[cfg(not(windows))]
    pub const fn platform(_settings: &ServiceSettings) -> Result<Self, InitError> {
        Err(InitError::PlatformUnavailable)
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
