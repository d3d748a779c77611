//! Network adapter domain types.
//!
//! This module provides:
//! - Adapter identity passed to every operation ([`AdapterIdentity`])
//! - Validated link-layer addresses ([`MacAddress`])
//! - Status resolution from admin and link signals ([`resolve`], [`decode_legacy_code`])

mod adapter;
mod mac;
mod status;

pub use adapter::{AdapterIdentity, normalize_guid};
pub use mac::{MacAddress, MacFormat, MacParseError};
pub use status::{
    AdminStatus, LinkStatus, ResolvedStatus, StatusSample, decode_legacy_code,
    parse_interface_table, resolve,
};
