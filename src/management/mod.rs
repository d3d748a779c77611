//! Management-interface queries for a named adapter.
//!
//! The management interface (CIM/WMI and the `NetAdapter` cmdlets) is
//! reached through `PowerShell` helpers, so every call is subject to the
//! resource guard. It can be entirely unavailable, in which case callers fall
//! back to other sources.

use std::sync::Arc;

use thiserror::Error;

use crate::network::{MacAddress, normalize_guid};
use crate::process::{CommandOutcome, Helper, HelperCommand, OutcomeStatus, ps_quote};
use crate::store::NETWORK_ADDRESS;

/// Error type for management-interface calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManagementError {
    /// The management interface could not be reached or rejected the call.
    #[error("management interface unavailable: {0}")]
    Unavailable(String),

    /// The call was refused by the resource guard.
    #[error("management call refused: {0}")]
    ResourceExhausted(String),

    /// The call did not finish in time.
    #[error("management call timed out: {0}")]
    Timeout(String),
}

impl ManagementError {
    fn from_outcome(outcome: &CommandOutcome) -> Self {
        let detail = outcome.failure_detail();
        match outcome.status {
            OutcomeStatus::ResourceExhausted { .. } => Self::ResourceExhausted(detail),
            OutcomeStatus::TimedOut { .. } => Self::Timeout(detail),
            OutcomeStatus::Exited { .. } | OutcomeStatus::SpawnFailed { .. } => {
                Self::Unavailable(detail)
            }
        }
    }
}

/// Queries about and changes to an adapter through the management interface.
pub trait ManagementApi: Send + Sync {
    /// Configuration instance GUID of the adapter, braces stripped.
    fn adapter_guid(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, ManagementError>> + Send;

    /// Address the adapter currently reports.
    fn current_address(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<MacAddress>, ManagementError>> + Send;

    /// Burned-in address of the adapter.
    fn permanent_address(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<MacAddress>, ManagementError>> + Send;

    /// Legacy numeric connection status code.
    fn legacy_status_code(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<u32>, ManagementError>> + Send;

    /// Sets the address override through the driver's advanced property.
    fn set_address(
        &self,
        name: &str,
        address: MacAddress,
    ) -> impl std::future::Future<Output = Result<(), ManagementError>> + Send;
}

impl<T: ManagementApi> ManagementApi for Arc<T> {
    fn adapter_guid(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, ManagementError>> + Send {
        (**self).adapter_guid(name)
    }

    fn current_address(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<MacAddress>, ManagementError>> + Send {
        (**self).current_address(name)
    }

    fn permanent_address(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<MacAddress>, ManagementError>> + Send {
        (**self).permanent_address(name)
    }

    fn legacy_status_code(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<u32>, ManagementError>> + Send {
        (**self).legacy_status_code(name)
    }

    fn set_address(
        &self,
        name: &str,
        address: MacAddress,
    ) -> impl std::future::Future<Output = Result<(), ManagementError>> + Send {
        (**self).set_address(name, address)
    }
}

/// [`ManagementApi`] over CIM queries and `NetAdapter` cmdlets run as
/// `PowerShell` helpers.
#[derive(Debug)]
pub struct CimManagement<H> {
    helper: Arc<H>,
}

impl<H: Helper> CimManagement<H> {
    /// Creates a management client that runs its queries through `helper`.
    #[must_use]
    pub const fn new(helper: Arc<H>) -> Self {
        Self { helper }
    }

    /// Reads one property of the `Win32_NetworkAdapter` instance whose
    /// connection id is `name`.
    async fn adapter_property(
        &self,
        name: &str,
        property: &str,
    ) -> Result<Option<String>, ManagementError> {
        let script = format!(
            "Get-CimInstance -ClassName Win32_NetworkAdapter | \
             Where-Object {{ $_.NetConnectionID -eq {} }} | \
             Select-Object -First 1 -ExpandProperty {property}",
            ps_quote(name)
        );
        self.query(&script).await
    }

    async fn query(&self, script: &str) -> Result<Option<String>, ManagementError> {
        let outcome = self.helper.invoke(&HelperCommand::powershell(script)).await;
        match outcome.success_output() {
            Some("") => Ok(None),
            Some(text) => Ok(text.lines().next().map(|line| line.trim().to_string())),
            None => Err(ManagementError::from_outcome(&outcome)),
        }
    }
}

impl<H: Helper> ManagementApi for CimManagement<H> {
    async fn adapter_guid(&self, name: &str) -> Result<Option<String>, ManagementError> {
        Ok(self
            .adapter_property(name, "GUID")
            .await?
            .map(|guid| normalize_guid(&guid))
            .filter(|guid| !guid.is_empty()))
    }

    async fn current_address(&self, name: &str) -> Result<Option<MacAddress>, ManagementError> {
        Ok(self
            .adapter_property(name, "MACAddress")
            .await?
            .and_then(|text| text.parse().ok()))
    }

    async fn permanent_address(&self, name: &str) -> Result<Option<MacAddress>, ManagementError> {
        let script = format!(
            "Get-NetAdapter -Name {} | Select-Object -First 1 -ExpandProperty PermanentAddress",
            ps_quote(name)
        );
        Ok(self
            .query(&script)
            .await?
            .and_then(|text| text.parse().ok()))
    }

    async fn legacy_status_code(&self, name: &str) -> Result<Option<u32>, ManagementError> {
        Ok(self
            .adapter_property(name, "NetConnectionStatus")
            .await?
            .and_then(|text| text.parse().ok()))
    }

    async fn set_address(&self, name: &str, address: MacAddress) -> Result<(), ManagementError> {
        let script = format!(
            "Set-NetAdapterAdvancedProperty -Name {} -RegistryKeyword {} -RegistryValue {} -Confirm:$false",
            ps_quote(name),
            ps_quote(NETWORK_ADDRESS),
            ps_quote(&address.to_store_form())
        );
        let outcome = self.helper.invoke(&HelperCommand::powershell(script)).await;
        if outcome.is_success() {
            Ok(())
        } else {
            Err(ManagementError::from_outcome(&outcome))
        }
    }
}
