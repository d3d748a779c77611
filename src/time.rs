//! Sleep abstraction for testability.
//!
//! Settle delays around an adapter restart go through a [`Sleeper`] so
//! that tests can observe the requested durations without waiting.

use std::time::Duration;

/// Abstraction over async sleeping.
///
/// # Example
///
/// ```
/// use adapterctl::time::{Sleeper, TokioSleeper};
/// use std::time::Duration;
///
/// # async fn demo() {
/// TokioSleeper.sleep(Duration::from_millis(1)).await;
/// # }
/// ```
pub trait Sleeper: Send + Sync {
    /// Suspends the current task for `duration`.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}

/// Production sleeper backed by [`tokio::time::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sleeper that returns immediately and records every requested duration.
///
/// Intended for tests; the recording makes settle behaviour assertable.
#[derive(Debug, Clone, Default)]
pub struct InstantSleeper {
    requested: std::sync::Arc<std::sync::Mutex<Vec<Duration>>>,
}

impl InstantSleeper {
    /// Creates a new instant sleeper with an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the durations requested so far, in call order.
    #[must_use]
    pub fn requested(&self) -> Vec<Duration> {
        self.requested
            .lock()
            .map_or_else(|poisoned| poisoned.into_inner().clone(), |guard| guard.clone())
    }
}

impl Sleeper for InstantSleeper {
    async fn sleep(&self, duration: Duration) {
        match self.requested.lock() {
            Ok(mut guard) => guard.push(duration),
            Err(poisoned) => poisoned.into_inner().push(duration),
        }
    }
}
