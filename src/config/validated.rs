//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::mutation::RestartSettings;
use crate::network::{AdapterIdentity, MacAddress};
use crate::process::GuardLimits;
use crate::service::ServiceSettings;

use super::cli::{Cli, Command};
use super::defaults;
use super::error::{ConfigError, field};
use super::toml::{TomlConfig, default_config_path};

/// The operation selected on the command line, with validated arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Resolve the adapter's status.
    Status(AdapterIdentity),

    /// Read the adapter's current or burned-in address.
    Get {
        /// Target adapter
        identity: AdapterIdentity,
        /// Read the burned-in address instead of the current one
        permanent: bool,
    },

    /// Change the adapter's address.
    Set {
        /// Target adapter
        identity: AdapterIdentity,
        /// Requested address
        address: MacAddress,
    },

    /// Clear the adapter's address override.
    Restore(AdapterIdentity),

    /// Disable and re-enable the adapter.
    Restart(AdapterIdentity),

    /// Decode a legacy status code without touching the system.
    Decode(u32),
}

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// What to do
    pub action: Action,

    /// Service wiring tunables
    pub settings: ServiceSettings,

    /// Print results as JSON
    pub json: bool,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let settings = &self.settings;
        write!(
            f,
            "Config {{ timeout: {}s, memory_ceiling: {}MB, kill_wait: {}ms, settle: {}s/{}s, \
             skip_restart: {}, max_fanout: {}, device_utility: {} }}",
            settings.guard.timeout.as_secs(),
            settings.guard.memory_ceiling_bytes / (1024 * 1024),
            settings.kill_wait.as_millis(),
            settings.restart.disable_settle.as_secs(),
            settings.restart.enable_settle.as_secs(),
            settings.restart.skip,
            settings.max_fanout,
            settings.device_utility,
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The command is `init`, which takes no configuration
    /// - The adapter name or hardware identifier is blank
    /// - The address is malformed or not a usable unicast address
    /// - A duration, ceiling or fan-out is zero
    /// - The device utility is blank
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let action = Self::resolve_action(cli)?;

        let timeout = Self::resolve_timeout(cli, toml)?;
        let memory_ceiling_mb = positive(
            field::MEMORY_CEILING,
            toml.and_then(|t| t.guard.memory_ceiling_mb)
                .unwrap_or(defaults::MEMORY_CEILING_MB),
        )?;
        let kill_wait_ms = toml
            .and_then(|t| t.guard.kill_wait_ms)
            .unwrap_or(defaults::KILL_WAIT_MS);
        if kill_wait_ms == 0 {
            return Err(ConfigError::InvalidDuration {
                field: field::KILL_WAIT,
                reason: "must be greater than 0".to_string(),
            });
        }
        let max_fanout = toml
            .and_then(|t| t.locator.max_fanout)
            .unwrap_or(defaults::MAX_FANOUT);
        if max_fanout == 0 {
            return Err(ConfigError::invalid(field::MAX_FANOUT, "must be greater than 0"));
        }

        let settings = ServiceSettings {
            guard: GuardLimits {
                timeout,
                memory_ceiling_bytes: defaults::megabytes(memory_ceiling_mb),
            },
            kill_wait: Duration::from_millis(kill_wait_ms),
            max_fanout,
            restart: Self::build_restart(cli, toml),
            device_utility: Self::resolve_device_utility(toml)?,
        };

        Ok(Self {
            action,
            settings,
            json: cli.json,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path. Otherwise
    /// the per-user configuration file is used if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let path = cli
            .config
            .clone()
            .or_else(|| default_config_path().filter(|p| p.is_file()));

        let toml = match path {
            Some(ref path) => Some(TomlConfig::load(path)?),
            None => None,
        };

        Self::from_raw(cli, toml.as_ref())
    }

    fn resolve_action(cli: &Cli) -> Result<Action, ConfigError> {
        let identity = |adapter: &str| Self::identity(adapter, cli.hardware_id.as_deref());

        Ok(match &cli.command {
            Command::Status { adapter } => Action::Status(identity(adapter)?),
            Command::Get { adapter, permanent } => Action::Get {
                identity: identity(adapter)?,
                permanent: *permanent,
            },
            Command::Set {
                adapter,
                address,
                random,
            } => Action::Set {
                identity: identity(adapter)?,
                address: resolve_address(address.as_deref(), *random)?,
            },
            Command::Restore { adapter } => Action::Restore(identity(adapter)?),
            Command::Restart { adapter } => Action::Restart(identity(adapter)?),
            Command::Decode { code } => Action::Decode(*code),
            Command::Init { .. } => {
                return Err(ConfigError::invalid(
                    field::COMMAND,
                    "init does not run against an adapter",
                ));
            }
        })
    }

    fn identity(adapter: &str, hardware_id: Option<&str>) -> Result<AdapterIdentity, ConfigError> {
        let name = adapter.trim();
        if name.is_empty() {
            return Err(ConfigError::invalid(field::ADAPTER, "must not be empty"));
        }

        let identity = AdapterIdentity::new(name);
        match hardware_id.map(str::trim) {
            None => Ok(identity),
            Some("") => Err(ConfigError::invalid(field::HARDWARE_ID, "must not be empty")),
            Some(id) => Ok(identity.with_hardware_id(id)),
        }
    }

    fn resolve_timeout(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Duration, ConfigError> {
        // Priority: CLI explicit > TOML > default
        let seconds = cli
            .timeout
            .or_else(|| toml.and_then(|t| t.executor.timeout))
            .unwrap_or(defaults::TIMEOUT_SECS);

        if seconds == 0 {
            return Err(ConfigError::InvalidDuration {
                field: field::TIMEOUT,
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(Duration::from_secs(seconds))
    }

    fn build_restart(cli: &Cli, toml: Option<&TomlConfig>) -> RestartSettings {
        let section = toml.map(|t| &t.restart);
        let disable = section
            .and_then(|s| s.disable_settle)
            .unwrap_or(defaults::DISABLE_SETTLE_SECS);
        let enable = section
            .and_then(|s| s.enable_settle)
            .unwrap_or(defaults::ENABLE_SETTLE_SECS);

        RestartSettings::new()
            .with_settle(Duration::from_secs(disable), Duration::from_secs(enable))
            .with_skip(cli.skip_restart || section.is_some_and(|s| s.skip))
    }

    fn resolve_device_utility(toml: Option<&TomlConfig>) -> Result<String, ConfigError> {
        let program = toml
            .and_then(|t| t.strategies.device_utility.as_deref())
            .unwrap_or(defaults::DEVICE_UTILITY)
            .trim();

        if program.is_empty() {
            return Err(ConfigError::invalid(field::DEVICE_UTILITY, "must not be empty"));
        }

        Ok(program.to_string())
    }
}

fn positive(name: &'static str, value: u64) -> Result<u64, ConfigError> {
    if value == 0 {
        return Err(ConfigError::invalid(name, "must be greater than 0"));
    }
    Ok(value)
}

fn resolve_address(text: Option<&str>, random: bool) -> Result<MacAddress, ConfigError> {
    match text {
        Some(text) => text.parse().map_err(|source| ConfigError::InvalidAddress {
            value: text.to_string(),
            source,
        }),
        None if random => Ok(MacAddress::random_local()),
        None => Err(ConfigError::invalid(
            field::ADDRESS,
            "an address or --random is required",
        )),
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}
