//! Tests for CLI vs TOML precedence rules.

use std::time::Duration;

use super::*;

mod timeout {
    use super::*;

    #[test]
    fn cli_timeout_overrides_toml() {
        let toml = toml("[executor]\ntimeout = 20\n");
        let config =
            ValidatedConfig::from_raw(&cli(&["status", "Ethernet", "--timeout", "5"]), Some(&toml))
                .unwrap();

        assert_eq!(config.settings.guard.timeout, Duration::from_secs(5));
    }

    #[test]
    fn toml_timeout_used_when_cli_absent() {
        let toml = toml("[executor]\ntimeout = 20\n");
        let config = ValidatedConfig::from_raw(&cli(&["status", "Ethernet"]), Some(&toml)).unwrap();

        assert_eq!(config.settings.guard.timeout, Duration::from_secs(20));
    }

    #[test]
    fn default_timeout_without_either() {
        let config = ValidatedConfig::from_raw(&cli(&["status", "Ethernet"]), None).unwrap();

        assert_eq!(config.settings.guard.timeout, Duration::from_secs(15));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let result = ValidatedConfig::from_raw(&cli(&["status", "Ethernet", "--timeout", "0"]), None);

        assert!(matches!(
            result,
            Err(ConfigError::InvalidDuration { field: "timeout", .. })
        ));
    }

    #[test]
    fn zero_toml_timeout_is_rejected() {
        let toml = toml("[executor]\ntimeout = 0\n");
        let result = ValidatedConfig::from_raw(&cli(&["status", "Ethernet"]), Some(&toml));

        assert!(matches!(result, Err(ConfigError::InvalidDuration { .. })));
    }
}

mod skip_restart {
    use super::*;

    #[test]
    fn cli_flag_alone_skips() {
        let config =
            ValidatedConfig::from_raw(&cli(&["restore", "Ethernet", "--skip-restart"]), None)
                .unwrap();

        assert!(config.settings.restart.skip);
    }

    #[test]
    fn toml_flag_alone_skips() {
        let toml = toml("[restart]\nskip = true\n");
        let config = ValidatedConfig::from_raw(&cli(&["restore", "Ethernet"]), Some(&toml)).unwrap();

        assert!(config.settings.restart.skip);
    }

    #[test]
    fn neither_runs_the_cycle() {
        let toml = toml("[restart]\nskip = false\n");
        let config = ValidatedConfig::from_raw(&cli(&["restore", "Ethernet"]), Some(&toml)).unwrap();

        assert!(!config.settings.restart.skip);
    }
}
