//! Tests for the identity locator.

use super::*;
use crate::management::ManagementError;
use crate::management::mock::MockManagement;
use crate::store::mock::MemoryStore;

const GUID: &str = "{6A1F0C2E-1234-4ABC-9DEF-00112233AABB}";

fn entry(index: &str) -> String {
    join(ADAPTER_CLASS_PATH, index)
}

/// A class subtree with a non-numeric key and three adapters.
fn store() -> MemoryStore {
    MemoryStore::new()
        .with_key(ADAPTER_CLASS_PATH, &[])
        .with_key(&entry("0000"), &[("DriverDesc", "WAN Miniport (IP)")])
        .with_key(
            &entry("0001"),
            &[
                ("DriverDesc", "Intel(R) Ethernet Connection I219-V"),
                (INSTANCE_ID, "{00000000-0000-0000-0000-000000000001}"),
            ],
        )
        .with_key(
            &entry("0002"),
            &[
                ("DriverDesc", "Realtek PCIe GbE Family Controller"),
                ("FriendlyName", "Ethernet"),
                (INSTANCE_ID, GUID),
            ],
        )
        .with_key(&entry("Properties"), &[("DriverDesc", "Ethernet")])
}

fn locator(
    store: MemoryStore,
    management: MockManagement,
    fanout: usize,
) -> IdentityLocator<MemoryStore, MockManagement> {
    IdentityLocator::new(Arc::new(store), Arc::new(management), fanout)
}

mod hardware_id {
    use super::*;

    #[tokio::test]
    async fn identity_hardware_id_matches_without_management() {
        let management = MockManagement::default();
        let locator = locator(store(), management, 50);
        let identity = AdapterIdentity::new("Anything").with_hardware_id(GUID.to_lowercase());

        let found = locator.locate(&identity).await.unwrap().unwrap();

        assert_eq!(found.path, entry("0002"));
        assert_eq!(found.source, MatchSource::HardwareId);
        assert!(locator.management.calls().is_empty());
    }

    #[tokio::test]
    async fn connection_map_is_used_before_management() {
        let connection = join(NETWORK_CONNECTIONS_PATH, GUID);
        let store = store()
            .with_key(NETWORK_CONNECTIONS_PATH, &[])
            .with_key(&connection, &[])
            .with_key(&join(&connection, "Connection"), &[(CONNECTION_NAME, "Ethernet 3")]);
        let locator = locator(store, MockManagement::default(), 50);

        let found = locator
            .locate(&AdapterIdentity::new("Ethernet 3"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.path, entry("0002"));
        assert_eq!(found.source, MatchSource::HardwareId);
        assert!(locator.management.calls().is_empty());
    }

    #[tokio::test]
    async fn management_guid_is_used_when_identity_has_none() {
        let management = MockManagement {
            guid: Ok(Some("6A1F0C2E-1234-4ABC-9DEF-00112233AABB".into())),
            ..MockManagement::default()
        };
        let locator = locator(store(), management, 50);

        let found = locator
            .locate(&AdapterIdentity::new("Ethernet 7"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.path, entry("0002"));
        assert_eq!(found.source, MatchSource::HardwareId);
    }

    #[tokio::test]
    async fn refused_guid_lookup_skips_heuristic() {
        let management = MockManagement {
            guid: Err(ManagementError::ResourceExhausted("memory ceiling".into())),
            ..MockManagement::default()
        };
        let locator = locator(store(), management, 50);

        let result = locator.locate(&AdapterIdentity::new("Ethernet")).await;

        assert!(matches!(result, Err(StoreError::Refused(ref detail)) if detail == "memory ceiling"));
    }
}

mod heuristic {
    use super::*;

    #[tokio::test]
    async fn used_when_management_unavailable() {
        let locator = locator(store(), MockManagement::unavailable(), 50);

        let found = locator
            .locate(&AdapterIdentity::new("realtek pcie"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.path, entry("0002"));
        assert_eq!(found.source, MatchSource::Heuristic("DriverDesc"));
    }

    #[tokio::test]
    async fn used_when_guid_matches_nothing() {
        let management = MockManagement {
            guid: Ok(Some("FFFFFFFF-0000-0000-0000-000000000000".into())),
            ..MockManagement::default()
        };
        let locator = locator(store(), management, 50);

        let found = locator
            .locate(&AdapterIdentity::new("Ethernet"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.path, entry("0001"));
        assert_eq!(found.source, MatchSource::Heuristic("DriverDesc"));
    }

    #[tokio::test]
    async fn field_priority_is_respected() {
        let store = MemoryStore::new()
            .with_key(ADAPTER_CLASS_PATH, &[])
            .with_key(
                &entry("0003"),
                &[("DriverDesc", "Generic"), ("FriendlyName", "Lab NIC")],
            );
        let locator = locator(store, MockManagement::unavailable(), 50);

        let found = locator
            .locate(&AdapterIdentity::new("Lab NIC"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.source, MatchSource::Heuristic("FriendlyName"));
    }

    #[tokio::test]
    async fn non_numeric_subkeys_are_skipped() {
        let store = MemoryStore::new()
            .with_key(ADAPTER_CLASS_PATH, &[])
            .with_key(&entry("Properties"), &[("DriverDesc", "Loopback")]);
        let locator = locator(store, MockManagement::unavailable(), 50);

        assert_eq!(
            locator.locate(&AdapterIdentity::new("Loopback")).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn blank_display_name_matches_nothing() {
        let locator = locator(store(), MockManagement::unavailable(), 50);
        assert_eq!(locator.locate(&AdapterIdentity::new("  ")).await.unwrap(), None);
    }
}

mod bounds {
    use super::*;

    #[tokio::test]
    async fn fanout_limits_entries_scanned() {
        let locator = locator(store(), MockManagement::unavailable(), 2);

        let found = locator
            .locate(&AdapterIdentity::new("Realtek"))
            .await
            .unwrap();

        assert_eq!(found, None);
        assert_eq!(locator.store.subkey_reads(), 2);
    }

    #[tokio::test]
    async fn missing_class_key_is_error() {
        let locator = locator(MemoryStore::new(), MockManagement::default(), 50);

        let result = locator.locate(&AdapterIdentity::new("Ethernet")).await;

        assert!(matches!(result, Err(StoreError::KeyNotFound { .. })));
    }

    #[tokio::test]
    async fn unknown_adapter_is_none() {
        let management = MockManagement {
            guid: Err(ManagementError::Timeout("slow".into())),
            ..MockManagement::default()
        };
        let locator = locator(store(), management, 50);

        assert_eq!(
            locator.locate(&AdapterIdentity::new("Bluetooth")).await.unwrap(),
            None
        );
    }
}
