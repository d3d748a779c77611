//! Adapter status resolution.
//!
//! The operating system reports two independent signals for an interface:
//! the administrative state (enabled or disabled by the user) and the
//! link state (carrier present or not). Either may be unavailable. This
//! module folds them into a single [`ResolvedStatus`] with a pure decision
//! table, and decodes the legacy numeric connection status used as a
//! fallback when neither signal is available.

use std::fmt;

use serde::Serialize;

/// Administrative state of an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminStatus {
    /// Enabled by the user or system.
    Enabled,
    /// Disabled by the user or system.
    Disabled,
    /// Not reported.
    Unknown,
}

/// Link (carrier) state of an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    /// A link partner is present.
    Connected,
    /// No link partner.
    Disconnected,
    /// Not reported.
    Unknown,
}

/// A single fresh reading of both status signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct StatusSample {
    /// Administrative state.
    pub admin: AdminStatus,
    /// Link state.
    pub link: LinkStatus,
}

/// The user-facing outcome of status resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ResolvedStatus {
    /// Human readable label.
    pub label: &'static str,
    /// Whether the interface is administratively usable.
    pub is_enabled: bool,
    /// Whether the interface has a working link.
    pub is_connected: bool,
}

impl ResolvedStatus {
    const fn new(label: &'static str, is_enabled: bool, is_connected: bool) -> Self {
        Self {
            label,
            is_enabled,
            is_connected,
        }
    }

    /// The status used when nothing is known about the interface.
    pub const UNKNOWN: Self = Self::new("unknown", false, false);
}

impl fmt::Display for ResolvedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label)
    }
}

/// Folds an administrative and a link signal into a [`ResolvedStatus`].
///
/// Total over every combination. A disabled interface is never reported
/// as connected, and a connected interface is always reported as enabled.
#[must_use]
pub const fn resolve(admin: AdminStatus, link: LinkStatus) -> ResolvedStatus {
    match (admin, link) {
        (AdminStatus::Disabled, _) => ResolvedStatus::new("disabled", false, false),
        (AdminStatus::Enabled | AdminStatus::Unknown, LinkStatus::Connected) => {
            ResolvedStatus::new("connected", true, true)
        }
        (AdminStatus::Enabled, LinkStatus::Disconnected) => {
            ResolvedStatus::new("enabled, no link", true, false)
        }
        (AdminStatus::Enabled, LinkStatus::Unknown) => ResolvedStatus::new("enabled", true, false),
        (AdminStatus::Unknown, LinkStatus::Disconnected | LinkStatus::Unknown) => {
            ResolvedStatus::UNKNOWN
        }
    }
}

/// Decodes a legacy `NetConnectionStatus` code.
///
/// Unrecognised codes map to [`ResolvedStatus::UNKNOWN`].
#[must_use]
pub const fn decode_legacy_code(code: u32) -> ResolvedStatus {
    match code {
        0 | 4 => ResolvedStatus::new("disabled", false, false),
        1 => ResolvedStatus::new("connecting", true, false),
        2 => ResolvedStatus::new("connected", true, true),
        3 => ResolvedStatus::new("disconnecting", true, false),
        5 => ResolvedStatus::new("hardware disabled", false, false),
        6 => ResolvedStatus::new("hardware malfunction", true, false),
        7 => ResolvedStatus::new("media disconnected", true, false),
        8 => ResolvedStatus::new("authenticating", true, false),
        9 => ResolvedStatus::new("authentication failed", true, false),
        10 => ResolvedStatus::new("authentication succeeded", true, false),
        11 => ResolvedStatus::new("acquiring address", true, false),
        _ => ResolvedStatus::UNKNOWN,
    }
}

impl StatusSample {
    /// A sample where neither signal is known.
    pub const UNKNOWN: Self = Self {
        admin: AdminStatus::Unknown,
        link: LinkStatus::Unknown,
    };

    /// Returns true if at least one primary signal is known.
    #[must_use]
    pub const fn is_informative(&self) -> bool {
        !matches!(
            (self.admin, self.link),
            (AdminStatus::Unknown, LinkStatus::Unknown)
        )
    }

    /// Resolves from the primary signals, or `None` if both are unknown.
    #[must_use]
    pub const fn try_resolve(&self) -> Option<ResolvedStatus> {
        if self.is_informative() {
            Some(resolve(self.admin, self.link))
        } else {
            None
        }
    }

    /// Resolves from the primary signals, consulting `legacy` only when both
    /// are unknown.
    ///
    /// `legacy` is awaited lazily; it is never polled when a primary signal is
    /// available. A `None` legacy code yields [`ResolvedStatus::UNKNOWN`].
    pub async fn resolve_or_else<F>(self, legacy: F) -> ResolvedStatus
    where
        F: std::future::Future<Output = Option<u32>>,
    {
        match self.try_resolve() {
            Some(status) => status,
            None => legacy
                .await
                .map_or(ResolvedStatus::UNKNOWN, decode_legacy_code),
        }
    }
}

/// Parses the table printed by `netsh interface show interface`.
///
/// Rows look like `Enabled  Connected  Dedicated  Ethernet 2`; the
/// interface name is everything from the fourth column on. English and
/// Chinese state words are understood. An exact name match wins over a
/// substring match. Returns [`StatusSample::UNKNOWN`] if no row matches.
#[must_use]
pub fn parse_interface_table(output: &str, adapter_name: &str) -> StatusSample {
    let rows: Vec<(StatusSample, String)> = output.lines().filter_map(parse_row).collect();

    rows.iter()
        .find(|(_, name)| name == adapter_name)
        .or_else(|| rows.iter().find(|(_, name)| name.contains(adapter_name)))
        .map_or(StatusSample::UNKNOWN, |(sample, _)| *sample)
}

fn parse_row(line: &str) -> Option<(StatusSample, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with("---") || is_header(line) {
        return None;
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let admin = parse_admin(tokens.first()?);

    // "Not connected" spans two columns in some locales.
    let (link, type_index) = match tokens.get(1..3) {
        Some([first, second])
            if first.eq_ignore_ascii_case("not") && second.eq_ignore_ascii_case("connected") =>
        {
            (LinkStatus::Disconnected, 3)
        }
        _ => (parse_link(tokens.get(1)?), 2),
    };

    let name = columns_after(line, type_index + 1);
    if name.is_empty() {
        return None;
    }

    Some((StatusSample { admin, link }, name.to_string()))
}

/// The remainder of `line` after its first `skip` columns, with inner
/// whitespace kept as printed.
fn columns_after(line: &str, skip: usize) -> &str {
    let mut rest = line;
    for _ in 0..skip {
        rest = rest.trim_start();
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        rest = &rest[end..];
    }
    rest.trim()
}

fn is_header(line: &str) -> bool {
    line.contains("Admin State") || line.contains("管理员状态") || line.contains("管理状态")
}

fn parse_admin(token: &str) -> AdminStatus {
    match token {
        t if t.eq_ignore_ascii_case("enabled") || t == "已启用" => AdminStatus::Enabled,
        t if t.eq_ignore_ascii_case("disabled") || t == "已禁用" => AdminStatus::Disabled,
        _ => AdminStatus::Unknown,
    }
}

fn parse_link(token: &str) -> LinkStatus {
    match token {
        t if t.eq_ignore_ascii_case("connected") || t == "已连接" => LinkStatus::Connected,
        t if t.eq_ignore_ascii_case("disconnected") || t == "已断开连接" || t == "未连接" => {
            LinkStatus::Disconnected
        }
        _ => LinkStatus::Unknown,
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
