//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::time::Duration;

/// Default helper timeout in seconds.
pub const TIMEOUT_SECS: u64 = 15;

/// Default wait after disabling an adapter, in seconds.
pub const DISABLE_SETTLE_SECS: u64 = 2;

/// Default wait after enabling an adapter, in seconds.
pub const ENABLE_SETTLE_SECS: u64 = 3;

/// Default resident memory growth ceiling, in megabytes.
pub const MEMORY_CEILING_MB: u64 = 100;

/// Default per-process wait when killing helpers, in milliseconds.
pub const KILL_WAIT_MS: u64 = 2000;

/// Default maximum number of device store entries scanned.
pub const MAX_FANOUT: usize = 50;

/// Default device-control utility.
pub const DEVICE_UTILITY: &str = "reg.exe";

/// Directory under the user configuration directory.
pub const CONFIG_DIR_NAME: &str = "adapterctl";

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "adapterctl.toml";

/// Default helper timeout as Duration.
#[must_use]
pub const fn timeout() -> Duration {
    Duration::from_secs(TIMEOUT_SECS)
}

/// Default disable settle delay as Duration.
#[must_use]
pub const fn disable_settle() -> Duration {
    Duration::from_secs(DISABLE_SETTLE_SECS)
}

/// Default enable settle delay as Duration.
#[must_use]
pub const fn enable_settle() -> Duration {
    Duration::from_secs(ENABLE_SETTLE_SECS)
}

/// Default kill wait as Duration.
#[must_use]
pub const fn kill_wait() -> Duration {
    Duration::from_millis(KILL_WAIT_MS)
}

/// Converts a megabyte count to bytes.
#[must_use]
pub const fn megabytes(mb: u64) -> u64 {
    mb.saturating_mul(1024 * 1024)
}
