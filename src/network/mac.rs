//! Link-layer (MAC) address type with checked construction.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// A validated 48-bit link-layer address.
///
/// Every value of this type is unicast and neither all-zero nor broadcast.
/// The only ways to obtain one are [`FromStr`], [`TryFrom<[u8; 6]>`] and
/// [`MacAddress::random_local`].
///
/// # Example
///
/// ```
/// use adapterctl::network::MacAddress;
///
/// let mac: MacAddress = "aa-bb-cc-dd-ee-f0".parse().unwrap();
/// assert_eq!(mac.to_string(), "AA:BB:CC:DD:EE:F0");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; 6]);

/// Reason a string or byte array was rejected as a [`MacAddress`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MacParseError {
    /// The input was empty or only whitespace.
    #[error("address is empty")]
    Empty,

    /// The input does not match any accepted layout.
    #[error(
        "unsupported address layout '{0}': expected AA:BB:CC:DD:EE:FF, AA-BB-CC-DD-EE-FF, AABB-CCDD-EEFF or AABBCCDDEEFF"
    )]
    UnsupportedLayout(String),

    /// The all-zero address.
    #[error("address 00:00:00:00:00:00 is not assignable")]
    AllZero,

    /// The broadcast address.
    #[error("broadcast address FF:FF:FF:FF:FF:FF is not assignable")]
    Broadcast,

    /// The group bit of the first octet is set.
    #[error("multicast address {0} is not assignable")]
    Multicast(String),
}

/// Text layouts a [`MacAddress`] can be rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MacFormat {
    /// `AA:BB:CC:DD:EE:FF`
    #[default]
    Colon,
    /// `AA-BB-CC-DD-EE-FF`
    Dash,
    /// `AABB-CCDD-EEFF`
    Grouped,
    /// `AABBCCDDEEFF`
    Bare,
}

impl MacAddress {
    /// Generates a random locally administered unicast address.
    ///
    /// The locally-administered bit of the first octet is set and the
    /// multicast bit cleared, so the result never collides with a vendor range.
    #[must_use]
    pub fn random_local() -> Self {
        let mut rng = rand::thread_rng();
        loop {
            let mut octets = [0u8; 6];
            rng.fill(&mut octets[..]);
            octets[0] = (octets[0] | 0x02) & 0xFE;
            if let Ok(mac) = Self::try_from(octets) {
                return mac;
            }
        }
    }

    /// Returns the raw octets.
    #[must_use]
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Returns true if the locally-administered bit is set.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        self.0[0] & 0x02 != 0
    }

    /// Renders the address in the requested layout (uppercase hex).
    #[must_use]
    pub fn format(&self, layout: MacFormat) -> String {
        let hex: Vec<String> = self.0.iter().map(|b| format!("{b:02X}")).collect();
        match layout {
            MacFormat::Colon => hex.join(":"),
            MacFormat::Dash => hex.join("-"),
            MacFormat::Grouped => hex
                .chunks(2)
                .map(<[String]>::concat)
                .collect::<Vec<_>>()
                .join("-"),
            MacFormat::Bare => hex.concat(),
        }
    }

    /// Twelve uppercase hex digits, the form the device store expects.
    #[must_use]
    pub fn to_store_form(&self) -> String {
        self.format(MacFormat::Bare)
    }

    fn validate(octets: [u8; 6]) -> Result<Self, MacParseError> {
        if octets == [0; 6] {
            return Err(MacParseError::AllZero);
        }
        if octets == [0xFF; 6] {
            return Err(MacParseError::Broadcast);
        }
        let mac = Self(octets);
        if octets[0] & 0x01 != 0 {
            return Err(MacParseError::Multicast(mac.to_string()));
        }
        Ok(mac)
    }
}

impl TryFrom<[u8; 6]> for MacAddress {
    type Error = MacParseError;

    fn try_from(octets: [u8; 6]) -> Result<Self, Self::Error> {
        Self::validate(octets)
    }
}

impl FromStr for MacAddress {
    type Err = MacParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(MacParseError::Empty);
        }

        let digits = strip_separators(trimmed)
            .ok_or_else(|| MacParseError::UnsupportedLayout(trimmed.to_string()))?;

        let mut octets = [0u8; 6];
        for (slot, pair) in octets.iter_mut().zip(digits.as_bytes().chunks(2)) {
            let text = std::str::from_utf8(pair)
                .map_err(|_| MacParseError::UnsupportedLayout(trimmed.to_string()))?;
            *slot = u8::from_str_radix(text, 16)
                .map_err(|_| MacParseError::UnsupportedLayout(trimmed.to_string()))?;
        }

        Self::validate(octets)
    }
}

/// Removes separators if `s` follows one of the four accepted layouts,
/// returning the twelve hex digits.
fn strip_separators(s: &str) -> Option<String> {
    let is_hex = |part: &str| part.bytes().all(|b| b.is_ascii_hexdigit());

    let groups: Vec<&str> = if s.contains(':') {
        s.split(':').collect()
    } else if s.contains('-') {
        s.split('-').collect()
    } else {
        vec![s]
    };

    let well_formed = match groups.len() {
        6 => groups.iter().all(|g| g.len() == 2),
        3 => !s.contains(':') && groups.iter().all(|g| g.len() == 4),
        1 => s.len() == 12,
        _ => false,
    };

    (well_formed && groups.iter().all(|g| is_hex(g))).then(|| groups.concat())
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(MacFormat::Colon))
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
