//! Tests for status resolution.

use super::*;

const ADMIN: [AdminStatus; 3] = [
    AdminStatus::Enabled,
    AdminStatus::Disabled,
    AdminStatus::Unknown,
];
const LINK: [LinkStatus; 3] = [
    LinkStatus::Connected,
    LinkStatus::Disconnected,
    LinkStatus::Unknown,
];

mod decision_table {
    use super::*;

    #[test]
    fn disabled_wins_over_any_link() {
        for link in LINK {
            let status = resolve(AdminStatus::Disabled, link);
            assert_eq!(status.label, "disabled");
            assert!(!status.is_enabled);
            assert!(!status.is_connected);
        }
    }

    #[test]
    fn enabled_rows() {
        assert_eq!(
            resolve(AdminStatus::Enabled, LinkStatus::Connected),
            ResolvedStatus::new("connected", true, true)
        );
        assert_eq!(
            resolve(AdminStatus::Enabled, LinkStatus::Disconnected),
            ResolvedStatus::new("enabled, no link", true, false)
        );
        assert_eq!(
            resolve(AdminStatus::Enabled, LinkStatus::Unknown),
            ResolvedStatus::new("enabled", true, false)
        );
    }

    #[test]
    fn unknown_admin_rows() {
        assert_eq!(
            resolve(AdminStatus::Unknown, LinkStatus::Connected),
            ResolvedStatus::new("connected", true, true)
        );
        assert_eq!(
            resolve(AdminStatus::Unknown, LinkStatus::Disconnected),
            ResolvedStatus::UNKNOWN
        );
        assert_eq!(
            resolve(AdminStatus::Unknown, LinkStatus::Unknown),
            ResolvedStatus::UNKNOWN
        );
    }

    #[test]
    fn every_combination_is_consistent() {
        for admin in ADMIN {
            for link in LINK {
                let status = resolve(admin, link);
                assert!(!status.label.is_empty());
                if admin == AdminStatus::Disabled {
                    assert!(!status.is_connected, "{admin:?}/{link:?}");
                }
                if status.is_connected {
                    assert!(status.is_enabled, "{admin:?}/{link:?}");
                }
            }
        }
    }
}

mod legacy_codes {
    use super::*;

    #[test]
    fn known_codes_decode() {
        assert_eq!(decode_legacy_code(0).label, "disabled");
        assert_eq!(decode_legacy_code(2), ResolvedStatus::new("connected", true, true));
        assert_eq!(decode_legacy_code(4).label, "disabled");
        assert_eq!(decode_legacy_code(5).label, "hardware disabled");
        assert_eq!(decode_legacy_code(7).label, "media disconnected");
        assert_eq!(decode_legacy_code(11).label, "acquiring address");
    }

    #[test]
    fn enabled_flag_excludes_disabled_codes() {
        for code in 0..=11 {
            let status = decode_legacy_code(code);
            assert_eq!(status.is_enabled, ![0, 4, 5].contains(&code), "code {code}");
            assert_eq!(status.is_connected, code == 2, "code {code}");
        }
    }

    #[test]
    fn unrecognised_code_is_unknown() {
        assert_eq!(decode_legacy_code(12), ResolvedStatus::UNKNOWN);
        assert_eq!(decode_legacy_code(u32::MAX), ResolvedStatus::UNKNOWN);
    }
}

mod fallback {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn legacy_is_not_polled_when_primary_known() {
        let polled = AtomicBool::new(false);
        let sample = StatusSample {
            admin: AdminStatus::Unknown,
            link: LinkStatus::Connected,
        };

        let status = sample
            .resolve_or_else(async {
                polled.store(true, Ordering::SeqCst);
                Some(0)
            })
            .await;

        assert_eq!(status.label, "connected");
        assert!(!polled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn legacy_decides_when_both_unknown() {
        let status = StatusSample::UNKNOWN
            .resolve_or_else(async { Some(7) })
            .await;
        assert_eq!(status.label, "media disconnected");
    }

    #[tokio::test]
    async fn missing_legacy_code_is_unknown() {
        let status = StatusSample::UNKNOWN.resolve_or_else(async { None }).await;
        assert_eq!(status, ResolvedStatus::UNKNOWN);
    }

    #[test]
    fn try_resolve_only_none_when_both_unknown() {
        for admin in ADMIN {
            for link in LINK {
                let sample = StatusSample { admin, link };
                let both_unknown = admin == AdminStatus::Unknown && link == LinkStatus::Unknown;
                assert_eq!(sample.try_resolve().is_none(), both_unknown);
            }
        }
    }
}

mod interface_table {
    use super::*;

    const ENGLISH: &str = "
Admin State    State          Type             Interface Name
-------------------------------------------------------------------------
Enabled        Connected      Dedicated        Ethernet
Disabled       Disconnected   Dedicated        Ethernet 2
Enabled        Disconnected   Dedicated        Wi-Fi
";

    const CHINESE: &str = "
管理员状态     状态           类型             接口名称
-------------------------------------------------------------------------
已启用         已连接         专用             以太网
已禁用         已断开连接     专用             WLAN
";

    #[test]
    fn exact_match_beats_substring() {
        let sample = parse_interface_table(ENGLISH, "Ethernet");
        assert_eq!(sample.admin, AdminStatus::Enabled);
        assert_eq!(sample.link, LinkStatus::Connected);

        let sample = parse_interface_table(ENGLISH, "Ethernet 2");
        assert_eq!(sample.admin, AdminStatus::Disabled);
        assert_eq!(sample.link, LinkStatus::Disconnected);
    }

    #[test]
    fn substring_match_is_fallback() {
        let sample = parse_interface_table(ENGLISH, "Wi");
        assert_eq!(sample.link, LinkStatus::Disconnected);
    }

    #[test]
    fn chinese_state_words_are_understood() {
        let sample = parse_interface_table(CHINESE, "以太网");
        assert_eq!(sample.admin, AdminStatus::Enabled);
        assert_eq!(sample.link, LinkStatus::Connected);

        let sample = parse_interface_table(CHINESE, "WLAN");
        assert_eq!(sample.admin, AdminStatus::Disabled);
        assert_eq!(sample.link, LinkStatus::Disconnected);
    }

    #[test]
    fn two_word_link_state_shifts_columns() {
        let output = "Enabled        Not connected  Dedicated        Bluetooth Network\n";
        let sample = parse_interface_table(output, "Bluetooth Network");
        assert_eq!(sample.admin, AdminStatus::Enabled);
        assert_eq!(sample.link, LinkStatus::Disconnected);
    }

    #[test]
    fn inner_whitespace_of_names_is_kept() {
        let output = concat!(
            "Disabled       Disconnected   Dedicated        Lab NIC\n",
            "Enabled        Connected      Dedicated        Lab  NIC\n",
        );

        let sample = parse_interface_table(output, "Lab  NIC");
        assert_eq!(sample.admin, AdminStatus::Enabled);
        assert_eq!(sample.link, LinkStatus::Connected);

        let sample = parse_interface_table(output, "Lab NIC");
        assert_eq!(sample.admin, AdminStatus::Disabled);
    }

    #[test]
    fn missing_adapter_is_unknown() {
        assert_eq!(parse_interface_table(ENGLISH, "Nope"), StatusSample::UNKNOWN);
        assert_eq!(parse_interface_table("", "Ethernet"), StatusSample::UNKNOWN);
    }
}
