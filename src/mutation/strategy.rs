//! Strategy seams for setting and clearing the address override.
//!
//! Strategies are held in ordered lists of trait objects, so their async
//! methods return boxed futures.

use std::future::Future;
use std::pin::Pin;

use crate::network::{AdapterIdentity, MacAddress};

use super::result::{AttemptOutcome, StrategyKind};

/// A boxed, sendable future borrowed for `'a`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A mechanism that sets an adapter's address override.
pub trait SetStrategy: Send + Sync {
    /// Which mechanism this is.
    fn kind(&self) -> StrategyKind;

    /// Applies `address` to the adapter.
    fn apply<'a>(
        &'a self,
        identity: &'a AdapterIdentity,
        address: MacAddress,
    ) -> BoxFuture<'a, AttemptOutcome>;
}

/// A mechanism that removes an adapter's address override.
pub trait ClearStrategy: Send + Sync {
    /// Which mechanism this is.
    fn kind(&self) -> StrategyKind;

    /// Clears the override so the adapter reverts to its hardware address.
    fn clear<'a>(&'a self, identity: &'a AdapterIdentity) -> BoxFuture<'a, AttemptOutcome>;
}
