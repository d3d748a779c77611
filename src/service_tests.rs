//! Tests for the service facade.

use super::*;
use crate::management::ManagementError;
use crate::management::mock::MockManagement;
use crate::mutation::{FailureKind, StrategyKind};
use crate::process::{CommandOutcome, ScriptedHelper};
use crate::store::mock::MemoryStore;
use crate::store::{ADAPTER_CLASS_PATH, INSTANCE_ID, NETWORK_ADDRESS, join};
use crate::time::InstantSleeper;

const TABLE: &str = "\
Admin State    State          Type             Interface Name
-------------------------------------------------------------------------
Enabled        Connected      Dedicated        Ethernet
Disabled       Disconnected   Dedicated        Wi-Fi
";

type TestService = AdapterService<ScriptedHelper, MemoryStore, MockManagement, InstantSleeper>;

fn service(
    helper: ScriptedHelper,
    store: MemoryStore,
    management: MockManagement,
) -> (TestService, Arc<ScriptedHelper>, Arc<MemoryStore>, Arc<MockManagement>) {
    let helper = Arc::new(helper);
    let store = Arc::new(store);
    let management = Arc::new(management);
    let service = AdapterService::new(
        helper.clone(),
        store.clone(),
        management.clone(),
        &ServiceSettings::default(),
    )
    .with_sleeper(InstantSleeper::new());
    (service, helper, store, management)
}

mod wiring {
    use super::*;

    #[test]
    fn chains_are_in_fixed_order() {
        let (service, _, _, _) = service(
            ScriptedHelper::new(),
            MemoryStore::new(),
            MockManagement::default(),
        );

        assert_eq!(
            service.engine().set_chain(),
            vec![
                StrategyKind::Registry,
                StrategyKind::PowerShell,
                StrategyKind::Management,
                StrategyKind::DeviceUtility,
            ]
        );
        assert_eq!(
            service.engine().clear_chain(),
            vec![StrategyKind::Registry, StrategyKind::PowerShell]
        );
    }

    #[test]
    fn default_settings() {
        let settings = ServiceSettings::default();
        assert_eq!(settings.guard.timeout, Duration::from_secs(15));
        assert_eq!(settings.guard.memory_ceiling_bytes, 100 * 1024 * 1024);
        assert_eq!(settings.kill_wait, Duration::from_secs(2));
        assert_eq!(settings.max_fanout, 50);
        assert_eq!(settings.restart.disable_settle, Duration::from_secs(2));
        assert_eq!(settings.restart.enable_settle, Duration::from_secs(3));
        assert_eq!(settings.device_utility, "reg.exe");
    }

    #[cfg(not(windows))]
    #[test]
    fn platform_is_unavailable_off_windows() {
        let result = PlatformService::platform(&ServiceSettings::default());
        assert!(matches!(result, Err(InitError::PlatformUnavailable)));
    }
}

mod status {
    use super::*;

    #[tokio::test]
    async fn table_answer_skips_legacy_code() {
        let (service, _, _, management) = service(
            ScriptedHelper::new().on("netsh interface show interface", CommandOutcome::ok(TABLE)),
            MemoryStore::new(),
            MockManagement {
                legacy: Ok(Some(7)),
                ..MockManagement::default()
            },
        );

        let report = service.status(&AdapterIdentity::new("Ethernet")).await;

        assert_eq!(report.admin, AdminStatus::Enabled);
        assert_eq!(report.link, LinkStatus::Connected);
        assert_eq!(report.status.label, "connected");
        assert!(management.calls().is_empty());
    }

    #[tokio::test]
    async fn disabled_row_is_disabled() {
        let (service, _, _, _) = service(
            ScriptedHelper::new().on("netsh", CommandOutcome::ok(TABLE)),
            MemoryStore::new(),
            MockManagement::default(),
        );

        let report = service.status(&AdapterIdentity::new("Wi-Fi")).await;

        assert!(!report.status.is_enabled);
        assert!(!report.status.is_connected);
    }

    #[tokio::test]
    async fn failed_table_falls_back_to_legacy_code() {
        let (service, _, _, management) = service(
            ScriptedHelper::new(),
            MemoryStore::new(),
            MockManagement {
                legacy: Ok(Some(7)),
                ..MockManagement::default()
            },
        );

        let report = service.status(&AdapterIdentity::new("Ethernet")).await;

        assert_eq!(report.status.label, "media disconnected");
        assert!(report.status.is_enabled);
        assert_eq!(management.calls(), vec!["legacy_status_code"]);
    }

    #[tokio::test]
    async fn nothing_known_is_unknown() {
        let (service, _, _, _) = service(
            ScriptedHelper::new().on("netsh", CommandOutcome::ok(TABLE)),
            MemoryStore::new(),
            MockManagement::unavailable(),
        );

        let report = service.status(&AdapterIdentity::new("Bluetooth")).await;

        assert_eq!(report.status, ResolvedStatus::UNKNOWN);
    }
}

mod addresses {
    use super::*;

    const GUID: &str = "{6A1F0C2E-1234-4ABC-9DEF-00112233AABB}";

    fn class_store() -> MemoryStore {
        MemoryStore::new()
            .with_key(ADAPTER_CLASS_PATH, &[])
            .with_key(&join(ADAPTER_CLASS_PATH, "0001"), &[(INSTANCE_ID, GUID)])
    }

    fn restart_helper() -> ScriptedHelper {
        ScriptedHelper::new()
            .on("Disable-NetAdapter", CommandOutcome::ok(""))
            .on("Enable-NetAdapter", CommandOutcome::ok(""))
    }

    #[tokio::test]
    async fn mutate_writes_store_and_restarts() {
        let (service, helper, store, _) = service(
            restart_helper(),
            class_store(),
            MockManagement {
                current: Ok(Some("00:1A:2B:3C:4D:5E".parse().unwrap())),
                ..MockManagement::default()
            },
        );
        let identity = AdapterIdentity::new("Ethernet").with_hardware_id(GUID);
        let target: MacAddress = "02:00:5E:10:00:01".parse().unwrap();

        let result = service.mutate(&identity, target).await;

        assert!(result.success);
        assert_eq!(result.strategy_used, Some(StrategyKind::Registry));
        assert_eq!(
            store.value(&join(ADAPTER_CLASS_PATH, "0001"), NETWORK_ADDRESS).as_deref(),
            Some("02005E100001")
        );
        assert_eq!(helper.count("Disable-NetAdapter"), 1);
    }

    #[tokio::test]
    async fn mutate_to_current_address_is_noop() {
        let current: MacAddress = "00:1A:2B:3C:4D:5E".parse().unwrap();
        let (service, helper, _, _) = service(
            ScriptedHelper::new(),
            class_store(),
            MockManagement {
                current: Ok(Some(current)),
                ..MockManagement::default()
            },
        );

        let result = service.mutate(&AdapterIdentity::new("Ethernet"), current).await;

        assert_eq!(result.failure, Some(FailureKind::NoOp));
        assert!(helper.calls().is_empty());
    }

    #[tokio::test]
    async fn restore_without_override_invokes_nothing() {
        let (service, helper, _, management) =
            service(ScriptedHelper::new(), class_store(), MockManagement::default());

        let result = service
            .restore(&AdapterIdentity::new("Ethernet").with_hardware_id(GUID))
            .await;

        assert!(result.success);
        assert!(helper.calls().is_empty());
        assert!(management.calls().is_empty());
    }

    #[tokio::test]
    async fn mutate_unknown_adapter_is_input_invalid() {
        let (service, helper, _, _) =
            service(ScriptedHelper::new(), class_store(), MockManagement::default());
        let target: MacAddress = "02:00:00:00:00:01".parse().unwrap();

        let result = service
            .mutate(&AdapterIdentity::new("NoSuchAdapter"), target)
            .await;

        assert!(!result.success);
        assert_eq!(result.failure, Some(FailureKind::InputInvalid));
        assert!(result.attempts.is_empty());
        assert_eq!(helper.count("Set-NetAdapter"), 0);
    }

    #[tokio::test]
    async fn restore_unknown_adapter_is_input_invalid() {
        let (service, _, store, _) =
            service(ScriptedHelper::new(), class_store(), MockManagement::default());

        let result = service.restore(&AdapterIdentity::new("NoSuchAdapter")).await;

        assert!(!result.success);
        assert_eq!(result.failure, Some(FailureKind::InputInvalid));
        assert!(!result.message.contains("verify"));
        assert_eq!(result.attempts.len(), 2);
        assert_eq!(
            store.value(&join(ADAPTER_CLASS_PATH, "0001"), INSTANCE_ID).as_deref(),
            Some(GUID)
        );
    }

    #[tokio::test]
    async fn restore_stops_when_guid_lookup_is_refused() {
        let entry = join(ADAPTER_CLASS_PATH, "0001");
        let store = MemoryStore::new()
            .with_key(ADAPTER_CLASS_PATH, &[])
            .with_key(
                &entry,
                &[("DriverDesc", "Ethernet"), (NETWORK_ADDRESS, "02005E100001")],
            );
        let (service, helper, store, _) = service(
            ScriptedHelper::new(),
            store,
            MockManagement {
                guid: Err(ManagementError::ResourceExhausted("memory ceiling".into())),
                ..MockManagement::default()
            },
        );

        let result = service.restore(&AdapterIdentity::new("Ethernet")).await;

        assert!(!result.success);
        assert_eq!(result.failure, Some(FailureKind::ResourceExhausted));
        assert_eq!(result.attempts.len(), 1);
        assert!(helper.calls().is_empty());
        assert_eq!(
            store.value(&entry, NETWORK_ADDRESS).as_deref(),
            Some("02005E100001")
        );
    }

    #[tokio::test]
    async fn hardware_address_comes_from_management() {
        let permanent: MacAddress = "00:1A:2B:3C:4D:5E".parse().unwrap();
        let (service, _, _, _) = service(
            ScriptedHelper::new(),
            MemoryStore::new(),
            MockManagement {
                permanent: Ok(Some(permanent)),
                ..MockManagement::default()
            },
        );

        assert_eq!(
            service.hardware_address(&AdapterIdentity::new("Ethernet")).await,
            Ok(Some(permanent))
        );
    }

    #[tokio::test]
    async fn current_address_uses_reader_chain() {
        let (service, _, _, _) = service(
            ScriptedHelper::new(),
            MemoryStore::new(),
            MockManagement {
                current: Ok(Some("AC:DE:48:00:11:22".parse().unwrap())),
                ..MockManagement::default()
            },
        );

        assert_eq!(
            service.current_address(&AdapterIdentity::new("Wi-Fi")).await,
            Ok("AC:DE:48:00:11:22".parse().unwrap())
        );
    }
}
