//! Process-wide shutdown coordination.
//!
//! A single [`CancellationToken`] is shared by every pipeline stage. Each
//! stage observes it at its delay points via [`ShutdownCoordinator::sleep_or_shutdown`],
//! so an idle wait of a minute never delays termination by a minute.

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[cfg(test)]
#[path = "shutdown_tests.rs"]
mod tests;

/// Shared cancellation handle for the pipeline stages.
#[derive(Debug, Clone, Default)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal every stage to stop at its next suspension point.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until shutdown is triggered.
    pub async fn triggered(&self) {
        self.token.cancelled().await;
    }

    /// Sleep for `duration`, aborting early on shutdown. Returns `false`
    /// when shutdown was triggered during (or before) the sleep.
    pub async fn sleep_or_shutdown(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.token.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}

/// Trigger the coordinator on SIGINT or SIGTERM.
pub fn install_signal_handlers(coordinator: ShutdownCoordinator) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                tracing::error!(%error, "Failed to listen for SIGINT");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(error) => {
                    tracing::error!(%error, "Failed to listen for SIGTERM");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("Received SIGINT; shutting down"),
            _ = terminate => info!("Received SIGTERM; shutting down"),
        }
        coordinator.trigger();
    });
}
