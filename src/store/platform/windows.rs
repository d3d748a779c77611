//! Windows registry implementation of [`DeviceStore`].

use crate::store::{DeleteOutcome, DeviceStore, StoreError, join};
use windows::Win32::Foundation::{
    ERROR_ACCESS_DENIED, ERROR_FILE_NOT_FOUND, ERROR_MORE_DATA, ERROR_NO_MORE_ITEMS,
    ERROR_SUCCESS, WIN32_ERROR,
};
use windows::Win32::System::Registry::{
    HKEY, HKEY_LOCAL_MACHINE, KEY_ENUMERATE_SUB_KEYS, KEY_QUERY_VALUE, KEY_SET_VALUE,
    REG_EXPAND_SZ, REG_SAM_FLAGS, REG_SZ, REG_VALUE_TYPE, RegCloseKey, RegDeleteValueW,
    RegEnumKeyExW, RegOpenKeyExW, RegQueryValueExW, RegSetValueExW,
};
use windows::core::{PCWSTR, PWSTR};

/// Longest key name the registry allows, plus the terminator.
const MAX_KEY_NAME: usize = 256;

/// Registry-backed device store rooted at `HKEY_LOCAL_MACHINE`.
///
/// Writes require administrator rights; a non-elevated process gets
/// [`StoreError::AccessDenied`].
#[derive(Debug, Clone, Default)]
pub struct RegistryStore {
    _private: (),
}

impl RegistryStore {
    /// Creates a registry store.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

/// An open registry key, closed on drop.
struct OwnedKey(HKEY);

impl Drop for OwnedKey {
    fn drop(&mut self) {
        // SAFETY: the handle was returned by a successful RegOpenKeyExW and is
        // closed exactly once.
        let _ = unsafe { RegCloseKey(self.0) };
    }
}

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

fn map_error(code: WIN32_ERROR, path: &str) -> StoreError {
    match code {
        ERROR_FILE_NOT_FOUND => StoreError::KeyNotFound {
            path: path.to_string(),
        },
        ERROR_ACCESS_DENIED => StoreError::AccessDenied {
            path: path.to_string(),
        },
        other => StoreError::Os {
            path: path.to_string(),
            code: other.0,
        },
    }
}

fn open(path: &str, access: REG_SAM_FLAGS) -> Result<OwnedKey, StoreError> {
    let subkey = wide(path);
    let mut handle = HKEY::default();

    // SAFETY: `subkey` is a NUL-terminated UTF-16 buffer that outlives the
    // call, and `handle` is a valid out pointer.
    let status = unsafe {
        RegOpenKeyExW(
            HKEY_LOCAL_MACHINE,
            PCWSTR(subkey.as_ptr()),
            None,
            access,
            &raw mut handle,
        )
    };

    if status == ERROR_SUCCESS {
        Ok(OwnedKey(handle))
    } else {
        Err(map_error(status, path))
    }
}

impl DeviceStore for RegistryStore {
    fn subkeys(&self, path: &str, limit: usize) -> Result<Vec<String>, StoreError> {
        let key = open(path, KEY_ENUMERATE_SUB_KEYS)?;
        let mut names = Vec::new();

        for index in 0..limit {
            let Ok(index) = u32::try_from(index) else {
                break;
            };
            let mut buffer = [0u16; MAX_KEY_NAME];
            let mut len = MAX_KEY_NAME as u32;

            // SAFETY: `buffer` holds `len` UTF-16 units and `len` is a valid
            // in/out pointer; optional parameters are omitted.
            let status = unsafe {
                RegEnumKeyExW(
                    key.0,
                    index,
                    Some(PWSTR(buffer.as_mut_ptr())),
                    &raw mut len,
                    None,
                    None,
                    None,
                    None,
                )
            };

            match status {
                ERROR_SUCCESS => {
                    names.push(String::from_utf16_lossy(&buffer[..len as usize]));
                }
                ERROR_NO_MORE_ITEMS => break,
                other => return Err(map_error(other, &join(path, &index.to_string()))),
            }
        }

        Ok(names)
    }

    fn read_value(&self, path: &str, name: &str) -> Result<Option<String>, StoreError> {
        let key = open(path, KEY_QUERY_VALUE)?;
        let value_name = wide(name);
        let mut kind = REG_VALUE_TYPE::default();
        let mut size = 0u32;

        // SAFETY: size query only; no data buffer is passed.
        let status = unsafe {
            RegQueryValueExW(
                key.0,
                PCWSTR(value_name.as_ptr()),
                None,
                Some(&raw mut kind),
                None,
                Some(&raw mut size),
            )
        };
        match status {
            ERROR_SUCCESS | ERROR_MORE_DATA => {}
            ERROR_FILE_NOT_FOUND => return Ok(None),
            other => return Err(map_error(other, path)),
        }
        if kind != REG_SZ && kind != REG_EXPAND_SZ {
            return Ok(None);
        }

        let mut buffer = vec![0u16; (size as usize).div_ceil(2) + 1];
        let mut byte_len = u32::try_from(buffer.len() * 2).unwrap_or(u32::MAX);

        // SAFETY: `buffer` is `byte_len` bytes long and stays alive for the call.
        let status = unsafe {
            RegQueryValueExW(
                key.0,
                PCWSTR(value_name.as_ptr()),
                None,
                None,
                Some(buffer.as_mut_ptr().cast()),
                Some(&raw mut byte_len),
            )
        };
        match status {
            ERROR_SUCCESS => {}
            ERROR_FILE_NOT_FOUND => return Ok(None),
            other => return Err(map_error(other, path)),
        }

        let units = (byte_len as usize / 2).min(buffer.len());
        let text = &buffer[..units];
        let end = text.iter().position(|&c| c == 0).unwrap_or(text.len());
        Ok(Some(String::from_utf16_lossy(&text[..end])))
    }

    fn write_value(&self, path: &str, name: &str, value: &str) -> Result<(), StoreError> {
        let key = open(path, KEY_SET_VALUE)?;
        let value_name = wide(name);
        let data: Vec<u8> = wide(value).iter().flat_map(|u| u.to_le_bytes()).collect();

        // SAFETY: `value_name` is NUL-terminated and `data` is a complete
        // REG_SZ payload including its terminator.
        let status = unsafe {
            RegSetValueExW(
                key.0,
                PCWSTR(value_name.as_ptr()),
                None,
                REG_SZ,
                Some(&data),
            )
        };

        if status == ERROR_SUCCESS {
            Ok(())
        } else {
            Err(map_error(status, path))
        }
    }

    fn delete_value(&self, path: &str, name: &str) -> Result<DeleteOutcome, StoreError> {
        let key = open(path, KEY_SET_VALUE)?;
        let value_name = wide(name);

        // SAFETY: `value_name` is a NUL-terminated UTF-16 buffer.
        let status = unsafe { RegDeleteValueW(key.0, PCWSTR(value_name.as_ptr())) };

        match status {
            ERROR_SUCCESS => Ok(DeleteOutcome::Deleted),
            ERROR_FILE_NOT_FOUND => Ok(DeleteOutcome::Absent),
            other => Err(map_error(other, path)),
        }
    }
}
