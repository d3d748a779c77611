//! Current address lookup.
//!
//! Sources are tried in order until one reports an address:
//!
//! 1. The management interface (`Win32_NetworkAdapter.MACAddress`)
//! 2. The override value in the located device store entry
//! 3. `getmac /fo csv /v /nh`, which only lists enabled adapters
//! 4. `Get-NetAdapter`, which also sees disabled adapters
//!
//! A refusal by the resource guard ends the lookup immediately.

use std::sync::Arc;

use thiserror::Error;

use crate::management::{ManagementApi, ManagementError};
use crate::network::{AdapterIdentity, MacAddress};
use crate::process::{Helper, HelperCommand, ps_quote};
use crate::store::{DeviceStore, IdentityLocator, NETWORK_ADDRESS, StoreError};

/// Error type for current address lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    /// No source reported an address.
    #[error("no source reported an address for {0}")]
    NotFound(String),

    /// The adapter is listed but no source reported a usable address.
    #[error("{0} is present but reports no usable address")]
    Unreadable(String),

    /// A helper invocation was refused by the resource guard.
    #[error("resources exhausted: {0}")]
    ResourceExhausted(String),
}

/// Reads the address an adapter is currently using.
pub trait AddressReader: Send + Sync {
    /// Returns the current address of the adapter.
    fn current_address(
        &self,
        identity: &AdapterIdentity,
    ) -> impl std::future::Future<Output = Result<MacAddress, ReadError>> + Send;
}

/// [`AddressReader`] trying every known source in turn.
#[derive(Debug)]
pub struct ChainedAddressReader<H, S, M> {
    helper: Arc<H>,
    store: Arc<S>,
    management: Arc<M>,
    locator: Arc<IdentityLocator<S, M>>,
}

impl<H: Helper, S: DeviceStore, M: ManagementApi> ChainedAddressReader<H, S, M> {
    /// Creates a reader over the given collaborators.
    #[must_use]
    pub const fn new(
        helper: Arc<H>,
        store: Arc<S>,
        management: Arc<M>,
        locator: Arc<IdentityLocator<S, M>>,
    ) -> Self {
        Self {
            helper,
            store,
            management,
            locator,
        }
    }

    async fn from_management(&self, name: &str) -> Result<Option<MacAddress>, ReadError> {
        match self.management.current_address(name).await {
            Ok(found) => Ok(found),
            Err(ManagementError::ResourceExhausted(detail)) => {
                Err(ReadError::ResourceExhausted(detail))
            }
            Err(e) => {
                tracing::debug!(adapter = %name, "Management address lookup failed: {e}");
                Ok(None)
            }
        }
    }

    async fn from_store(&self, identity: &AdapterIdentity) -> Result<Option<MacAddress>, ReadError> {
        let entry = match self.locator.locate(identity).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return Ok(None),
            Err(StoreError::Refused(detail)) => return Err(ReadError::ResourceExhausted(detail)),
            Err(e) => {
                tracing::debug!(adapter = %identity, "Store lookup failed: {e}");
                return Ok(None);
            }
        };
        Ok(self
            .store
            .read_value(&entry.path, NETWORK_ADDRESS)
            .ok()
            .flatten()
            .and_then(|value| value.parse().ok()))
    }

    /// Returns the raw address column of the adapter's `getmac` row.
    async fn from_getmac(&self, name: &str) -> Result<Option<String>, ReadError> {
        let command = HelperCommand::new("getmac").args(["/fo", "csv", "/v", "/nh"]);
        let outcome = self.helper.invoke(&command).await;
        if outcome.is_resource_exhausted() {
            return Err(ReadError::ResourceExhausted(outcome.failure_detail()));
        }
        Ok(outcome
            .success_output()
            .and_then(|output| getmac_column(output, name))
            .map(str::to_string))
    }

    async fn from_net_adapter(&self, name: &str) -> Result<Option<MacAddress>, ReadError> {
        let command = HelperCommand::powershell(format!(
            "Get-NetAdapter -Name {} | Select-Object -First 1 -ExpandProperty MacAddress",
            ps_quote(name)
        ));
        let outcome = self.helper.invoke(&command).await;
        if outcome.is_resource_exhausted() {
            return Err(ReadError::ResourceExhausted(outcome.failure_detail()));
        }
        Ok(outcome
            .success_output()
            .and_then(|output| output.lines().next())
            .and_then(|line| line.trim().parse().ok()))
    }
}

impl<H: Helper, S: DeviceStore, M: ManagementApi> AddressReader for ChainedAddressReader<H, S, M> {
    async fn current_address(&self, identity: &AdapterIdentity) -> Result<MacAddress, ReadError> {
        let name = identity.display_name.as_str();

        if let Some(mac) = self.from_management(name).await? {
            tracing::debug!(adapter = %name, source = "management", %mac, "Read current address");
            return Ok(mac);
        }
        if let Some(mac) = self.from_store(identity).await? {
            tracing::debug!(adapter = %name, source = "store", %mac, "Read current address");
            return Ok(mac);
        }
        let listed = self.from_getmac(name).await?;
        if let Some(mac) = listed.as_deref().and_then(|column| column.parse().ok()) {
            tracing::debug!(adapter = %name, source = "getmac", %mac, "Read current address");
            return Ok(mac);
        }
        if let Some(mac) = self.from_net_adapter(name).await? {
            tracing::debug!(adapter = %name, source = "net-adapter", %mac, "Read current address");
            return Ok(mac);
        }

        if let Some(column) = listed {
            tracing::warn!(adapter = %name, %column, "Adapter listed without a usable address");
            return Err(ReadError::Unreadable(name.to_string()));
        }
        tracing::warn!(adapter = %name, "No source reported a current address");
        Err(ReadError::NotFound(name.to_string()))
    }
}

/// Finds the address of the connection named `name` in `getmac` CSV output.
///
/// Rows look like `"Ethernet","Intel(R) ...","00-1A-2B-3C-4D-5E","\Device\Tcpip_{..}"`.
/// Disabled adapters report `N/A` and are skipped.
#[must_use]
pub fn parse_getmac_csv(output: &str, name: &str) -> Option<MacAddress> {
    getmac_column(output, name).and_then(|address| address.parse().ok())
}

fn getmac_column<'a>(output: &'a str, name: &str) -> Option<&'a str> {
    output.lines().find_map(|line| {
        let fields: Vec<&str> = line
            .trim()
            .split("\",\"")
            .map(|field| field.trim_matches('"'))
            .collect();
        match fields.as_slice() {
            [connection, _, address, ..] if *connection == name => Some(*address),
            _ => None,
        }
    })
}
