//! Platform-specific device store implementations.
//!
//! # Platform Support
//!
//! - **Windows**: The registry under `HKEY_LOCAL_MACHINE`, via the `windows` crate.
//! - Other platforms have no device store; [`PlatformStore`] refuses every
//!   operation with [`StoreError::Unsupported`](crate::store::StoreError::Unsupported).

#[cfg(windows)]
mod windows;

#[cfg(windows)]
pub use windows::RegistryStore;

#[cfg(windows)]
pub use windows::RegistryStore as PlatformStore;

#[cfg(not(windows))]
pub use unsupported::UnsupportedStore as PlatformStore;

#[cfg(not(windows))]
mod unsupported {
    use crate::store::{DeleteOutcome, DeviceStore, StoreError};

    /// Device store for platforms without one.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct UnsupportedStore;

    impl UnsupportedStore {
        /// Creates the store.
        #[must_use]
        pub const fn new() -> Self {
            Self
        }
    }

    impl DeviceStore for UnsupportedStore {
        fn subkeys(&self, _path: &str, _limit: usize) -> Result<Vec<String>, StoreError> {
            Err(StoreError::Unsupported)
        }

        fn read_value(&self, _path: &str, _name: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unsupported)
        }

        fn write_value(&self, _path: &str, _name: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Unsupported)
        }

        fn delete_value(&self, _path: &str, _name: &str) -> Result<DeleteOutcome, StoreError> {
            Err(StoreError::Unsupported)
        }
    }

}
