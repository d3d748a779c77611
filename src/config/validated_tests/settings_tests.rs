//! Tests for TOML-only tunables.

use std::time::Duration;

use super::*;

fn status_with(content: &str) -> Result<ValidatedConfig, ConfigError> {
    ValidatedConfig::from_raw(&cli(&["status", "Ethernet"]), Some(&toml(content)))
}

mod defaults {
    use super::*;

    #[test]
    fn defaults_without_toml() {
        let config = ValidatedConfig::from_raw(&cli(&["status", "Ethernet"]), None).unwrap();
        let settings = &config.settings;

        assert_eq!(settings.guard.memory_ceiling_bytes, 100 * 1024 * 1024);
        assert_eq!(settings.kill_wait, Duration::from_millis(2000));
        assert_eq!(settings.max_fanout, 50);
        assert_eq!(settings.restart.disable_settle, Duration::from_secs(2));
        assert_eq!(settings.restart.enable_settle, Duration::from_secs(3));
        assert!(!settings.restart.skip);
        assert_eq!(settings.device_utility, "reg.exe");
    }

    #[test]
    fn display_summarises_settings() {
        let config = ValidatedConfig::from_raw(&cli(&["status", "Ethernet"]), None).unwrap();
        let text = config.to_string();

        assert!(text.contains("timeout: 15s"));
        assert!(text.contains("memory_ceiling: 100MB"));
        assert!(text.contains("settle: 2s/3s"));
        assert!(text.contains("device_utility: reg.exe"));
    }
}

mod overrides {
    use super::*;

    #[test]
    fn settle_delays_from_toml() {
        let config = status_with("[restart]\ndisable_settle = 0\nenable_settle = 7\n").unwrap();

        assert_eq!(config.settings.restart.disable_settle, Duration::ZERO);
        assert_eq!(config.settings.restart.enable_settle, Duration::from_secs(7));
    }

    #[test]
    fn guard_values_from_toml() {
        let config = status_with("[guard]\nmemory_ceiling_mb = 8\nkill_wait_ms = 250\n").unwrap();

        assert_eq!(config.settings.guard.memory_ceiling_bytes, 8 * 1024 * 1024);
        assert_eq!(config.settings.kill_wait, Duration::from_millis(250));
    }

    #[test]
    fn fanout_from_toml() {
        let config = status_with("[locator]\nmax_fanout = 12\n").unwrap();
        assert_eq!(config.settings.max_fanout, 12);
    }

    #[test]
    fn device_utility_is_trimmed() {
        let config = status_with("[strategies]\ndevice_utility = \" reg \"\n").unwrap();
        assert_eq!(config.settings.device_utility, "reg");
    }
}

mod validation {
    use super::*;

    #[test]
    fn zero_memory_ceiling_is_rejected() {
        assert!(matches!(
            status_with("[guard]\nmemory_ceiling_mb = 0\n"),
            Err(ConfigError::InvalidValue {
                field: "memory_ceiling_mb",
                ..
            })
        ));
    }

    #[test]
    fn zero_kill_wait_is_rejected() {
        assert!(matches!(
            status_with("[guard]\nkill_wait_ms = 0\n"),
            Err(ConfigError::InvalidDuration {
                field: "kill_wait_ms",
                ..
            })
        ));
    }

    #[test]
    fn zero_fanout_is_rejected() {
        assert!(matches!(
            status_with("[locator]\nmax_fanout = 0\n"),
            Err(ConfigError::InvalidValue {
                field: "max_fanout",
                ..
            })
        ));
    }

    #[test]
    fn blank_device_utility_is_rejected() {
        assert!(matches!(
            status_with("[strategies]\ndevice_utility = \"  \"\n"),
            Err(ConfigError::InvalidValue {
                field: "device_utility",
                ..
            })
        ));
    }
}
