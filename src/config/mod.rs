//! Configuration layer for adapterctl.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`], [`Action`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Configuration values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - Values explicitly passed via command line
//! 2. **TOML config file** - Values from the configuration file
//! 3. **Built-in defaults** - Hardcoded default values
//!
//! Only the helper timeout can be given on both sides. The remaining tunables
//! (settle delays, memory ceiling, kill wait, locator fan-out, device utility)
//! are TOML-only.
//!
//! When no `--config` is given, the per-user file from [`default_config_path`]
//! is read if it exists.
//!
//! # Boolean Flag Semantics
//!
//! `--skip-restart` and `restart.skip` use OR semantics: if either is `true`,
//! the restart cycle is skipped.

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;

#[cfg(test)]
mod validated_tests;

pub use cli::{Cli, Command};
pub use error::{ConfigError, field};
pub use toml::{TomlConfig, default_config_path, default_config_template};
pub use validated::{Action, ValidatedConfig, write_default_config};
