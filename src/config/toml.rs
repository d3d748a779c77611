//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{ConfigError, defaults};

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Helper execution section
    #[serde(default)]
    pub executor: ExecutorSection,

    /// Restart cycle section
    #[serde(default)]
    pub restart: RestartSection,

    /// Resource guard section
    #[serde(default)]
    pub guard: GuardSection,

    /// Device store locator section
    #[serde(default)]
    pub locator: LocatorSection,

    /// Strategy section
    #[serde(default)]
    pub strategies: StrategiesSection,
}

/// Helper execution section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutorSection {
    /// Helper timeout in seconds
    pub timeout: Option<u64>,
}

/// Restart cycle section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RestartSection {
    /// Wait after disabling, in seconds
    pub disable_settle: Option<u64>,

    /// Wait after enabling, in seconds
    pub enable_settle: Option<u64>,

    /// Never run the disable/enable cycle
    #[serde(default)]
    pub skip: bool,
}

/// Resource guard section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GuardSection {
    /// Resident memory growth ceiling in megabytes
    pub memory_ceiling_mb: Option<u64>,

    /// Per-process wait when killing helpers, in milliseconds
    pub kill_wait_ms: Option<u64>,
}

/// Device store locator section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocatorSection {
    /// Maximum number of entries scanned
    pub max_fanout: Option<usize>,
}

/// Strategy section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrategiesSection {
    /// Device-control utility program
    pub device_utility: Option<String>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Location of the per-user configuration file, if the platform has a
/// configuration directory.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| {
        dir.join(defaults::CONFIG_DIR_NAME)
            .join(defaults::CONFIG_FILE_NAME)
    })
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# adapterctl Configuration File
#
# Values given on the command line override this file.

[executor]
# Helper process timeout in seconds (default: 15)
timeout = 15

[restart]
# Wait after disabling the adapter, in seconds (default: 2)
disable_settle = 2

# Wait after enabling the adapter, in seconds (default: 3)
enable_settle = 3

# Never disable and re-enable the adapter after a change.
# Changes written to the device store then take effect on the next restart.
# skip = false

[guard]
# Refuse to start helpers once our resident memory has grown this much, in MB (default: 100)
memory_ceiling_mb = 100

# Wait per helper process when killing it, in milliseconds (default: 2000)
# kill_wait_ms = 2000

[locator]
# Maximum number of device store entries scanned (default: 50)
# max_fanout = 50

[strategies]
# Device-control utility used as the last resort (default: reg.exe)
# device_utility = "reg.exe"
"#
    .to_string()
}
