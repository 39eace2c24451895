//! Runtime lifecycle: access to the ready services and graceful shutdown.

use crate::{config::AppConfig, services::ExplorerServices};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, error, info, warn};

use super::builder::ExplorerRuntimeBuilder;

/// A started explorer runtime.
///
/// Every gated cell has been published at least once by the time a value of this type
/// exists. Dropping it closes the shutdown channel, so the workers stop on their own
/// unless a [`shutdown_sender`](Self::shutdown_sender) clone is still alive. Call
/// [`shutdown`](Self::shutdown) to wait for them to finish.
pub struct ExplorerRuntime {
    services: ExplorerServices,
    config: Arc<AppConfig>,
    shutdown_tx: broadcast::Sender<()>,
    tasks: Vec<JoinHandle<()>>,
    shutdown_initiated: Arc<AtomicBool>,
}

impl ExplorerRuntime {
    #[must_use]
    pub fn builder() -> ExplorerRuntimeBuilder {
        ExplorerRuntimeBuilder::new()
    }

    pub(super) fn new(
        services: ExplorerServices,
        config: Arc<AppConfig>,
        shutdown_tx: broadcast::Sender<()>,
        tasks: Vec<JoinHandle<()>>,
    ) -> Self {
        let shutdown_initiated = Arc::new(AtomicBool::new(false));
        Self { services, config, shutdown_tx, tasks, shutdown_initiated }
    }

    /// Read handle for request handlers. Clone it freely.
    #[must_use]
    pub fn services(&self) -> &ExplorerServices {
        &self.services
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Number of worker tasks still owned by the runtime.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.tasks.len()
    }

    /// Creates a new shutdown receiver for external shutdown coordination.
    #[must_use]
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signals every worker to stop and waits for all of them to finish.
    ///
    /// Idempotent: later calls return immediately. Published snapshots stay readable
    /// through [`services`](Self::services) afterwards.
    pub async fn shutdown(&mut self) {
        if self
            .shutdown_initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Shutdown already initiated, ignoring duplicate call");
            return;
        }

        info!(workers = self.tasks.len(), "Initiating explorer runtime shutdown");
        if let Err(e) = self.shutdown_tx.send(()) {
            warn!(error = %e, "Failed to send shutdown signal (no receivers)");
        }

        for task in std::mem::take(&mut self.tasks) {
            match task.await {
                Ok(()) => debug!("Worker task completed"),
                Err(e) if e.is_cancelled() => debug!("Worker task cancelled"),
                Err(e) => error!(error = %e, "Worker task failed"),
            }
        }

        info!("Explorer runtime shutdown complete");
    }

    /// Waits for a shutdown signal from any holder of a
    /// [`shutdown_receiver`](Self::shutdown_receiver) sender, then shuts down.
    pub async fn wait_for_shutdown(mut self) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let _ = shutdown_rx.recv().await;
        info!("Shutdown signal received, runtime terminating");
        self.shutdown().await;
    }

    /// Sender half of the shutdown channel, for signal handlers.
    #[must_use]
    pub fn shutdown_sender(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }
}
