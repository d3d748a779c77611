//! Persistent device-configuration store.
//!
//! This module provides:
//! - The store abstraction ([`DeviceStore`]) over keyed string values
//! - The adapter class location and address override value name
//! - Locating the entry that belongs to an adapter ([`IdentityLocator`])
//! - Platform-specific implementations ([`platform`])
//!
//! The store is only ever written under entries that already exist; nothing
//! in this crate creates keys.

mod locator;
pub mod platform;

use thiserror::Error;

pub use locator::{IdentityLocator, MatchSource, StoreMatch};

/// Adapter class subtree, relative to the local machine root.
pub const ADAPTER_CLASS_PATH: &str =
    r"SYSTEM\CurrentControlSet\Control\Class\{4d36e972-e325-11ce-bfc1-08002be10318}";

/// Network connection subtree, one `{GUID}\Connection` key per adapter.
pub const NETWORK_CONNECTIONS_PATH: &str =
    r"SYSTEM\CurrentControlSet\Control\Network\{4D36E972-E325-11CE-BFC1-08002BE10318}";

/// Value holding a connection's display name.
pub const CONNECTION_NAME: &str = "Name";

/// Value holding a software address override (twelve hex digits).
pub const NETWORK_ADDRESS: &str = "NetworkAddress";

/// Value holding an entry's configuration instance GUID.
pub const INSTANCE_ID: &str = "NetCfgInstanceId";

/// Error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key does not exist.
    #[error("store key not found: {path}")]
    KeyNotFound {
        /// Full key path
        path: String,
    },

    /// The caller lacks the privilege for the operation.
    #[error("access denied to store key {path}")]
    AccessDenied {
        /// Full key path
        path: String,
    },

    /// Any other platform error.
    #[error("store operation on {path} failed with code {code}")]
    Os {
        /// Full key path
        path: String,
        /// Platform error code
        code: u32,
    },

    /// No store exists on this platform.
    #[error("device store is not available on this platform")]
    Unsupported,

    /// A lookup needed to pick an entry was refused by the resource guard.
    #[error("entry lookup refused: {0}")]
    Refused(String),
}

/// Result of deleting a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The value existed and was removed.
    Deleted,
    /// The value did not exist.
    Absent,
}

/// Hierarchical key/value store holding per-device configuration.
///
/// Paths are backslash-separated and relative to the store root.
pub trait DeviceStore: Send + Sync {
    /// Lists at most `limit` immediate subkey names of `path`, in store order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if `path` cannot be opened or enumerated.
    fn subkeys(&self, path: &str, limit: usize) -> Result<Vec<String>, StoreError>;

    /// Reads a string value, returning `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if `path` cannot be opened.
    fn read_value(&self, path: &str, name: &str) -> Result<Option<String>, StoreError>;

    /// Writes a string value under an existing key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::KeyNotFound`] if `path` does not exist, or another
    /// [`StoreError`] if the write is refused.
    fn write_value(&self, path: &str, name: &str, value: &str) -> Result<(), StoreError>;

    /// Deletes a value. A missing value is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if `path` cannot be opened or the delete is
    /// refused.
    fn delete_value(&self, path: &str, name: &str) -> Result<DeleteOutcome, StoreError>;
}

impl<T: DeviceStore + ?Sized> DeviceStore for std::sync::Arc<T> {
    fn subkeys(&self, path: &str, limit: usize) -> Result<Vec<String>, StoreError> {
        (**self).subkeys(path, limit)
    }

    fn read_value(&self, path: &str, name: &str) -> Result<Option<String>, StoreError> {
        (**self).read_value(path, name)
    }

    fn write_value(&self, path: &str, name: &str, value: &str) -> Result<(), StoreError> {
        (**self).write_value(path, name, value)
    }

    fn delete_value(&self, path: &str, name: &str) -> Result<DeleteOutcome, StoreError> {
        (**self).delete_value(path, name)
    }
}

/// Joins a parent path and a child name.
#[must_use]
pub fn join(parent: &str, child: &str) -> String {
    format!(r"{parent}\{child}")
}
