//! Mapping an adapter identity to its device store entry.
//!
//! Two phases, always in this order:
//!
//! 1. **Exact**: the hardware identifier is compared against each entry's
//!    instance id. It comes from the identity if present, else from the
//!    store's connection map, else from the management interface.
//! 2. **Heuristic**: if phase one could not run or found nothing, a fixed
//!    list of descriptive fields is searched for the display name.
//!
//! Both phases scan at most `max_fanout` entries and skip non-numeric
//! subkeys such as `Properties`.

use std::sync::Arc;

use serde::Serialize;

use crate::management::{ManagementApi, ManagementError};
use crate::network::{AdapterIdentity, normalize_guid};

use super::{
    ADAPTER_CLASS_PATH, CONNECTION_NAME, DeviceStore, INSTANCE_ID, NETWORK_CONNECTIONS_PATH,
    StoreError, join,
};

/// Descriptive fields searched by the heuristic phase, in priority order.
pub const HEURISTIC_FIELDS: [&str; 4] = ["DriverDesc", "FriendlyName", "DeviceDesc", "ComponentId"];

/// How an entry was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    /// The entry's instance id equals the hardware identifier.
    HardwareId,
    /// A descriptive field contains the display name.
    Heuristic(&'static str),
}

/// A located device store entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreMatch {
    /// Full path of the entry.
    pub path: String,
    /// How it was found.
    pub source: MatchSource,
}

/// Finds the device store entry belonging to an adapter.
#[derive(Debug)]
pub struct IdentityLocator<S, M> {
    store: Arc<S>,
    management: Arc<M>,
    max_fanout: usize,
}

impl<S: DeviceStore, M: ManagementApi> IdentityLocator<S, M> {
    /// Creates a locator scanning at most `max_fanout` entries.
    #[must_use]
    pub const fn new(store: Arc<S>, management: Arc<M>, max_fanout: usize) -> Self {
        Self {
            store,
            management,
            max_fanout,
        }
    }

    /// Locates the entry for `identity`.
    ///
    /// Returns `Ok(None)` when neither phase matches, meaning address
    /// changes through the store are not possible for this adapter.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the adapter class key cannot be enumerated,
    /// or [`StoreError::Refused`] if the resource guard refused the hardware
    /// id lookup. No heuristic match is attempted after a refusal.
    pub async fn locate(
        &self,
        identity: &AdapterIdentity,
    ) -> Result<Option<StoreMatch>, StoreError> {
        let entries = self.entries()?;

        if let Some(guid) = self.hardware_id(identity).await? {
            if let Some(path) = self.match_hardware_id(&entries, &guid) {
                tracing::debug!(adapter = %identity.display_name, path = %path, "Located store entry by hardware id");
                return Ok(Some(StoreMatch {
                    path,
                    source: MatchSource::HardwareId,
                }));
            }
            tracing::debug!(adapter = %identity.display_name, guid = %guid, "No store entry carries hardware id");
        }

        let found = self.match_heuristic(&entries, &identity.display_name);
        match &found {
            Some(m) => {
                if let MatchSource::Heuristic(field) = m.source {
                    tracing::warn!(
                        adapter = %identity.display_name,
                        path = %m.path,
                        field,
                        "Located store entry by name heuristic"
                    );
                }
            }
            None => {
                tracing::warn!(adapter = %identity.display_name, "No store entry found for adapter");
            }
        }
        Ok(found)
    }

    /// Numeric entry paths under the adapter class, bounded by the fan-out.
    fn entries(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .store
            .subkeys(ADAPTER_CLASS_PATH, self.max_fanout)?
            .into_iter()
            .filter(|name| !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()))
            .map(|name| join(ADAPTER_CLASS_PATH, &name))
            .collect())
    }

    async fn hardware_id(&self, identity: &AdapterIdentity) -> Result<Option<String>, StoreError> {
        if let Some(id) = identity.normalized_hardware_id() {
            return Ok(Some(id));
        }
        if let Some(id) = self.connection_guid(&identity.display_name) {
            return Ok(Some(id));
        }
        match self.management.adapter_guid(&identity.display_name).await {
            Ok(guid) => Ok(guid),
            Err(ManagementError::ResourceExhausted(detail)) => {
                tracing::warn!(adapter = %identity.display_name, "Hardware id lookup refused: {detail}");
                Err(StoreError::Refused(detail))
            }
            Err(e) => {
                tracing::debug!(adapter = %identity.display_name, "Hardware id lookup unavailable: {e}");
                Ok(None)
            }
        }
    }

    /// Looks the display name up in the store's connection map.
    fn connection_guid(&self, display_name: &str) -> Option<String> {
        let connections = self
            .store
            .subkeys(NETWORK_CONNECTIONS_PATH, self.max_fanout)
            .inspect_err(|e| tracing::debug!("Connection map unavailable: {e}"))
            .ok()?;

        connections
            .into_iter()
            .filter(|guid| guid.starts_with('{'))
            .find(|guid| {
                let path = join(&join(NETWORK_CONNECTIONS_PATH, guid), "Connection");
                self.read(&path, CONNECTION_NAME)
                    .is_some_and(|name| name == display_name)
            })
            .map(|guid| normalize_guid(&guid))
    }

    fn match_hardware_id(&self, entries: &[String], guid: &str) -> Option<String> {
        entries
            .iter()
            .find(|path| {
                self.read(path, INSTANCE_ID)
                    .is_some_and(|id| normalize_guid(&id).contains(guid))
            })
            .cloned()
    }

    fn match_heuristic(&self, entries: &[String], display_name: &str) -> Option<StoreMatch> {
        let needle = display_name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        entries.iter().find_map(|path| {
            HEURISTIC_FIELDS.iter().find_map(|&field| {
                self.read(path, field)
                    .filter(|value| value.to_lowercase().contains(&needle))
                    .map(|_| StoreMatch {
                        path: path.clone(),
                        source: MatchSource::Heuristic(field),
                    })
            })
        })
    }

    /// Reads a value, treating unreadable entries as empty.
    fn read(&self, path: &str, name: &str) -> Option<String> {
        self.store
            .read_value(path, name)
            .inspect_err(|e| tracing::debug!(path, "Skipping unreadable store entry: {e}"))
            .ok()
            .flatten()
    }
}

#[cfg(test)]
#[path = "locator_tests.rs"]
mod tests;
