//! Builder that wires the refresh workers and runs initialization.

use crate::{
    config::AppConfig,
    repository::IndexRepository,
    services::{
        spawn_refresh_task, ChainHeadPoller, ChartsUpdater, ExplorerServices, HeadQuery,
        HeadTarget, IndexSnapshotBuilder, StatsUpdater,
    },
    snapshot::ReadinessBarrier,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, info};

use super::lifecycle::ExplorerRuntime;

/// Workers that must publish once before [`ExplorerRuntimeBuilder::start`] returns: the
/// three head pollers and the index builder.
pub const GATED_WORKERS: usize = 4;

/// Errors that can occur during runtime initialization.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ConfigValidation(String),

    #[error("No index repository provided")]
    MissingRepository,
}

#[derive(Clone)]
struct RuntimeOptions {
    enable_secondary_updaters: Option<bool>,
    shutdown_channel_capacity: usize,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self { enable_secondary_updaters: None, shutdown_channel_capacity: 16 }
    }
}

/// Builder for [`ExplorerRuntime`].
///
/// ```no_run
/// # use explorer_core::{config::AppConfig, repository::PgRepository, runtime::ExplorerRuntime};
/// # use std::sync::Arc;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AppConfig::load()?;
/// let repository = PgRepository::connect(&config.database).await?;
///
/// let runtime = ExplorerRuntime::builder()
///     .with_config(config)
///     .with_repository(Arc::new(repository))
///     .start()
///     .await?;
///
/// let epoch = runtime.services().latest_epoch()?;
/// # Ok(())
/// # }
/// ```
pub struct ExplorerRuntimeBuilder {
    config: Option<AppConfig>,
    repository: Option<Arc<dyn IndexRepository>>,
    options: RuntimeOptions,
}

impl Default for ExplorerRuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExplorerRuntimeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self { config: None, repository: None, options: RuntimeOptions::default() }
    }

    #[must_use]
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn with_repository(mut self, repository: Arc<dyn IndexRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Starts the charts and stats updaters after readiness, overriding
    /// `services.enable_secondary_updaters`.
    #[must_use]
    pub fn enable_secondary_updaters(mut self) -> Self {
        self.options.enable_secondary_updaters = Some(true);
        self
    }

    #[must_use]
    pub fn disable_secondary_updaters(mut self) -> Self {
        self.options.enable_secondary_updaters = Some(false);
        self
    }

    /// Sets custom shutdown channel capacity (default: 16).
    #[must_use]
    pub fn with_shutdown_channel_capacity(mut self, capacity: usize) -> Self {
        self.options.shutdown_channel_capacity = capacity.max(1);
        self
    }

    /// Spawns the gated workers, waits until each has published once, then spawns the
    /// secondary updaters.
    ///
    /// If a gated worker never succeeds this future never completes. Callers that need a
    /// bound should wrap it in `tokio::time::timeout`.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError` if the configuration is missing or invalid, or no repository
    /// was provided.
    pub async fn start(self) -> Result<ExplorerRuntime, RuntimeError> {
        let config = self.config.ok_or_else(|| {
            RuntimeError::ConfigValidation("No configuration provided".to_string())
        })?;
        config.validate().map_err(RuntimeError::ConfigValidation)?;
        let repository = self.repository.ok_or(RuntimeError::MissingRepository)?;

        let secondary_enabled = self
            .options
            .enable_secondary_updaters
            .unwrap_or(config.services.enable_secondary_updaters);

        info!(
            genesis_timestamp = config.chain.genesis_timestamp,
            head_poll_interval_ms = config.services.head_poll_interval().as_millis(),
            index_refresh_interval_ms = config.services.index_refresh_interval().as_millis(),
            secondary_updaters_enabled = secondary_enabled,
            "Initializing explorer runtime"
        );

        let config = Arc::new(config);
        let services = ExplorerServices::new(config.clone());
        let (shutdown_tx, _) = broadcast::channel::<()>(self.options.shutdown_channel_capacity);
        let barrier = ReadinessBarrier::new(GATED_WORKERS);

        let mut tasks = Self::spawn_gated(&services, &repository, &barrier, &shutdown_tx);
        debug!(workers = tasks.len(), "gated workers started");

        barrier.wait().await;
        info!("All gated workers published, explorer services ready");

        if secondary_enabled {
            tasks.extend(Self::spawn_secondary(&services, &repository, &shutdown_tx));
            debug!("Secondary updaters started");
        }

        Ok(ExplorerRuntime::new(services, config, shutdown_tx, tasks))
    }

    fn spawn_gated(
        services: &ExplorerServices,
        repository: &Arc<dyn IndexRepository>,
        barrier: &Arc<ReadinessBarrier>,
        shutdown_tx: &broadcast::Sender<()>,
    ) -> Vec<JoinHandle<()>> {
        let config = services.config();
        let clock = *services.clock();
        let head_interval = config.services.head_poll_interval();
        let cutoff_buffer = config.services.slot_cutoff_buffer();

        let epoch_poller = ChainHeadPoller::new("epoch", repository.clone(), clock, head_interval)
            .with_target(HeadTarget::non_gating(
                HeadQuery::LatestFinalizedEpoch,
                services.latest_finalized_epoch.clone(),
            ))
            .with_target(HeadTarget::new(HeadQuery::LatestEpoch, services.latest_epoch.clone()))
            .with_readiness(barrier.signal("epoch"));

        let slot_poller = ChainHeadPoller::new("slot", repository.clone(), clock, head_interval)
            .with_cutoff_buffer(cutoff_buffer)
            .with_target(HeadTarget::new(HeadQuery::LatestSlot, services.latest_slot.clone()))
            .with_readiness(barrier.signal("slot"));

        let proposed_poller =
            ChainHeadPoller::new("proposed_slot", repository.clone(), clock, head_interval)
                .with_target(HeadTarget::new(
                    HeadQuery::LatestProposedSlot,
                    services.latest_proposed_slot.clone(),
                ))
                .with_readiness(barrier.signal("proposed_slot"));

        let index_builder =
            IndexSnapshotBuilder::new(repository.clone(), config, services.index.clone())
                .with_readiness(barrier.signal("index"));

        vec![
            spawn_refresh_task(epoch_poller, shutdown_tx.subscribe()),
            spawn_refresh_task(slot_poller, shutdown_tx.subscribe()),
            spawn_refresh_task(proposed_poller, shutdown_tx.subscribe()),
            spawn_refresh_task(index_builder, shutdown_tx.subscribe()),
        ]
    }

    fn spawn_secondary(
        services: &ExplorerServices,
        repository: &Arc<dyn IndexRepository>,
        shutdown_tx: &broadcast::Sender<()>,
    ) -> Vec<JoinHandle<()>> {
        let config = services.config();

        let charts = ChartsUpdater::new(
            repository.clone(),
            *services.clock(),
            config.services.charts_refresh_interval(),
            services.charts.clone(),
        );
        let stats = StatsUpdater::new(
            repository.clone(),
            config.services.stats_refresh_interval(),
            services.stats.clone(),
        );

        vec![
            spawn_refresh_task(charts, shutdown_tx.subscribe()),
            spawn_refresh_task(stats, shutdown_tx.subscribe()),
        ]
    }
}
