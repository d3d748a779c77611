//! Address mutation engine.
//!
//! This module provides:
//! - Result and failure types returned to callers ([`MutationResult`])
//! - The strategy seams ([`SetStrategy`], [`ClearStrategy`]) and the four
//!   concrete backends ([`backends`])
//! - Current address lookup ([`AddressReader`])
//! - The ordered chains with restart handling ([`MutationEngine`])

pub mod backends;
mod engine;
mod reader;
mod result;
mod strategy;

pub use backends::{
    DeviceUtilityStrategy, ManagementStrategy, ShellCommandStrategy, StoreEditStrategy,
};
pub use engine::{MutationEngine, RestartSettings};
pub use reader::{AddressReader, ChainedAddressReader, ReadError, parse_getmac_csv};
pub use result::{
    ApplyState, AttemptOutcome, Effect, FailureKind, FailureReason, MutationAttempt,
    MutationResult, StrategyKind,
};
pub use strategy::{BoxFuture, ClearStrategy, SetStrategy};
