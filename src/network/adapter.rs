//! Adapter identity passed into every operation.

use std::fmt;

use serde::Serialize;

/// Identifies the adapter an operation targets.
///
/// The display name is the user-visible connection name (for example
/// `"Ethernet"` or `"Wi-Fi"`). The hardware identifier, when known, is the
/// adapter's configuration instance GUID and is only used to disambiguate
/// device store entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AdapterIdentity {
    /// Connection display name.
    pub display_name: String,
    /// Configuration instance GUID, braces optional.
    pub hardware_id: Option<String>,
}

impl AdapterIdentity {
    /// Creates an identity with no hardware identifier.
    #[must_use]
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            hardware_id: None,
        }
    }

    /// Sets the hardware identifier.
    #[must_use]
    pub fn with_hardware_id(mut self, hardware_id: impl Into<String>) -> Self {
        self.hardware_id = Some(hardware_id.into());
        self
    }

    /// Returns the hardware identifier without braces, uppercased, if present
    /// and non-empty.
    #[must_use]
    pub fn normalized_hardware_id(&self) -> Option<String> {
        self.hardware_id
            .as_deref()
            .map(normalize_guid)
            .filter(|id| !id.is_empty())
    }
}

impl fmt::Display for AdapterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.hardware_id {
            Some(id) => write!(f, "{} ({id})", self.display_name),
            None => f.write_str(&self.display_name),
        }
    }
}

/// Strips surrounding whitespace and braces from a GUID and uppercases it.
#[must_use]
pub fn normalize_guid(guid: &str) -> String {
    guid.trim()
        .trim_start_matches('{')
        .trim_end_matches('}')
        .to_ascii_uppercase()
}
