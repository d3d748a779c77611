//! Helper process layer.
//!
//! This module provides:
//! - Helper command description and outcomes ([`HelperCommand`], [`CommandOutcome`])
//! - Timeout-bounded execution ([`CommandRunner`], [`TokioCommandRunner`])
//! - Live helper tracking ([`ProcessRegistry`], [`ProcessTicket`])
//! - Memory ceiling and orphan reaping around every call ([`ResourceGuard`])
//! - Emergency cleanup on termination signals ([`shutdown`])
//!
//! Everything above this layer talks to helpers through the [`Helper`] trait.

mod command;
mod executor;
mod guard;
mod registry;
pub mod shutdown;

pub use command::{CommandOutcome, HelperCommand, OutcomeStatus, ps_quote};
pub use executor::{CommandRunner, TokioCommandRunner};
pub use guard::{GuardLimits, Helper, MemoryProbe, ResourceGuard, SysinfoMemoryProbe};
pub use registry::{
    ProcessControl, ProcessRegistry, ProcessState, ProcessTicket, SysinfoProcessControl,
};

#[cfg(test)]
pub use guard::mock::ScriptedHelper;
