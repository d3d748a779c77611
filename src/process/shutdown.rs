//! Shutdown signalling and emergency helper cleanup.
//!
//! A termination signal is turned into a message on a watch channel; a
//! subscriber task terminates every registered helper process. The handler
//! only sends a message, so it never contends with the invocation path for
//! anything other than the registry mutex.

use std::time::Duration;

use tokio::signal;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::registry::ProcessRegistry;

/// Receiving side of a shutdown channel.
#[derive(Debug, Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    /// Returns true if shutdown was requested.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Waits until shutdown is requested.
    ///
    /// Returns immediately if it already was. If the sender is dropped
    /// without requesting shutdown, never returns.
    pub async fn wait(&mut self) {
        let observed = self.rx.wait_for(|requested| *requested).await.map(|_| ());
        if observed.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Sending side of a shutdown channel.
#[derive(Debug)]
pub struct ShutdownSender {
    tx: watch::Sender<bool>,
}

impl ShutdownSender {
    /// Requests shutdown.
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    /// Creates another token subscribed to this sender.
    #[must_use]
    pub fn subscribe(&self) -> ShutdownToken {
        ShutdownToken {
            rx: self.tx.subscribe(),
        }
    }
}

/// Creates a shutdown channel.
#[must_use]
pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender { tx }, ShutdownToken { rx })
}

/// Spawns the emergency cleanup subscriber.
///
/// When `token` fires, every process in `registry` is terminated with at most
/// `per_process_wait` per process. The task yields the number of processes a
/// termination request was sent to.
pub fn spawn_emergency_cleanup(
    registry: ProcessRegistry,
    mut token: ShutdownToken,
    per_process_wait: Duration,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        token.wait().await;
        let live = registry.len();
        if live > 0 {
            tracing::error!(live, "Shutdown requested, terminating helper processes");
        }
        registry.terminate_all(per_process_wait).await
    })
}

/// Completes when the process receives Ctrl+C or, on Unix, SIGTERM.
///
/// If a handler cannot be installed the corresponding branch never fires.
///
/// Excluded from coverage - requires OS signal handling.
#[cfg(not(tarpaulin_include))]
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
