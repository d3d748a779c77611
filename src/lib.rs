//! adapterctl: network adapter address control
//!
//! A library for resolving network adapter status and changing or
//! restoring an adapter's link-layer (MAC) address through an ordered
//! chain of platform strategies, with every helper process run under a
//! resource guard.

pub mod config;
pub mod management;
pub mod mutation;
pub mod network;
pub mod process;
pub mod service;
pub mod store;
pub mod time;
