//! Validator and deposit statistics, refreshed outside the readiness gate.

use super::task::RefreshTask;
use crate::{
    repository::{IndexRepository, RepositoryError},
    snapshot::SnapshotCell,
    types::StatsSnapshot,
};
use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use tracing::{debug, error};

pub struct StatsUpdater {
    repository: Arc<dyn IndexRepository>,
    interval: Duration,
    cell: Arc<SnapshotCell<StatsSnapshot>>,
}

impl StatsUpdater {
    #[must_use]
    pub fn new(
        repository: Arc<dyn IndexRepository>,
        interval: Duration,
        cell: Arc<SnapshotCell<StatsSnapshot>>,
    ) -> Self {
        Self { repository, interval, cell }
    }

    /// Collects validator counts at the newest indexed epoch plus deposit totals.
    ///
    /// # Errors
    /// Returns the first failed read.
    pub async fn build(&self) -> Result<StatsSnapshot, RepositoryError> {
        let epoch = self.repository.latest_epoch().await?;
        let validators = self.repository.validator_stats(epoch).await?;
        let deposits = self.repository.deposit_stats().await?;

        Ok(StatsSnapshot {
            epoch,
            total_validator_count: validators.total,
            active_validator_count: validators.active,
            pending_validator_count: validators.pending,
            exited_validator_count: validators.exited,
            total_deposit_count: deposits.count,
            total_deposited_gwei: deposits.total_amount_gwei,
        })
    }
}

#[async_trait]
impl RefreshTask for StatsUpdater {
    fn name(&self) -> &'static str {
        "stats"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn refresh(&mut self) -> bool {
        match self.build().await {
            Ok(stats) => {
                debug!(epoch = stats.epoch, "stats snapshot published");
                self.cell.store(stats);
                true
            }
            Err(e) => {
                error!(error = %e, "error updating stats");
                false
            }
        }
    }
}
