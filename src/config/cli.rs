//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// adapterctl: network adapter address control
///
/// Reads adapter status, changes or restores the link-layer address of a
/// network adapter, and restarts adapters.
#[derive(Debug, Parser)]
#[command(name = "adapterctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Helper timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Hardware identifier (configuration instance GUID) of the adapter
    #[arg(long = "hardware-id", value_name = "GUID", global = true)]
    pub hardware_id: Option<String>,

    /// Never disable and re-enable the adapter after a change
    #[arg(long = "skip-restart", global = true)]
    pub skip_restart: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Subcommands for adapterctl
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the resolved status of an adapter
    Status {
        /// Adapter display name
        adapter: String,
    },

    /// Show the current address of an adapter
    Get {
        /// Adapter display name
        adapter: String,

        /// Show the burned-in address instead
        #[arg(long)]
        permanent: bool,
    },

    /// Change the address of an adapter
    Set {
        /// Adapter display name
        adapter: String,

        /// New address (AA:BB:CC:DD:EE:FF, AA-BB-CC-DD-EE-FF, AABB-CCDD-EEFF or AABBCCDDEEFF)
        #[arg(required_unless_present = "random", conflicts_with = "random")]
        address: Option<String>,

        /// Use a random locally administered address
        #[arg(long)]
        random: bool,
    },

    /// Restore the hardware address of an adapter
    Restore {
        /// Adapter display name
        adapter: String,
    },

    /// Disable and re-enable an adapter
    Restart {
        /// Adapter display name
        adapter: String,
    },

    /// Decode a legacy numeric connection status code
    Decode {
        /// Status code
        code: u32,
    },

    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = "adapterctl.toml")]
        output: PathBuf,
    },
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Parses CLI arguments from an iterator, returning parse errors.
    ///
    /// # Errors
    ///
    /// Returns the clap error for invalid arguments.
    pub fn try_parse_from_iter<I, T>(iter: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Command::Init { .. })
    }

    /// Returns true if the command needs no platform access.
    #[must_use]
    pub const fn is_offline(&self) -> bool {
        matches!(self.command, Command::Init { .. } | Command::Decode { .. })
    }
}
