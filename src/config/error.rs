//! Error types for configuration parsing and validation.

use std::path::PathBuf;

use thiserror::Error;

use crate::network::MacParseError;

/// Error type for configuration operations.
///
/// Covers errors from parsing, validation, and file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file '{}': {source}", path.display())]
    FileRead {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to write configuration file (for init command).
    #[error("Failed to write config file '{}': {source}", path.display())]
    FileWrite {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid duration value (zero or too large).
    #[error("Invalid duration for {field}: {reason}")]
    InvalidDuration {
        /// Name of the field
        field: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Invalid value for a non-duration field.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Name of the field
        field: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// The requested address cannot be used.
    #[error("Invalid address '{value}': {source}")]
    InvalidAddress {
        /// The address text as given
        value: String,
        /// Why it was rejected
        #[source]
        source: MacParseError,
    },
}

/// Well-known field names used in validation errors.
///
/// Use these constants for compile-time safety when matching field names.
pub mod field {
    /// The helper timeout.
    pub const TIMEOUT: &str = "timeout";
    /// The memory ceiling.
    pub const MEMORY_CEILING: &str = "memory_ceiling_mb";
    /// The kill wait.
    pub const KILL_WAIT: &str = "kill_wait_ms";
    /// The locator fan-out.
    pub const MAX_FANOUT: &str = "max_fanout";
    /// The device-control utility.
    pub const DEVICE_UTILITY: &str = "device_utility";
    /// The adapter display name.
    pub const ADAPTER: &str = "adapter";
    /// The requested address.
    pub const ADDRESS: &str = "address";
    /// The hardware identifier.
    pub const HARDWARE_ID: &str = "hardware_id";
    /// The subcommand.
    pub const COMMAND: &str = "command";
}

impl ConfigError {
    /// Creates an `InvalidValue` error.
    #[must_use]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}
