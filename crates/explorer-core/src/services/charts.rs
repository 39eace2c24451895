//! Participation charts, refreshed outside the readiness gate.

use super::{format::gwei_to_eth, task::RefreshTask};
use crate::{
    chain::SlotClock,
    repository::{EpochRow, IndexRepository, RepositoryError},
    snapshot::SnapshotCell,
    types::ChartsSnapshot,
};
use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use tracing::{debug, error};

pub struct ChartsUpdater {
    repository: Arc<dyn IndexRepository>,
    clock: SlotClock,
    interval: Duration,
    cell: Arc<SnapshotCell<ChartsSnapshot>>,
}

impl ChartsUpdater {
    #[must_use]
    pub fn new(
        repository: Arc<dyn IndexRepository>,
        clock: SlotClock,
        interval: Duration,
        cell: Arc<SnapshotCell<ChartsSnapshot>>,
    ) -> Self {
        Self { repository, clock, interval, cell }
    }

    /// # Errors
    /// Returns the repository error if the participation history cannot be read.
    pub async fn build(&self) -> Result<ChartsSnapshot, RepositoryError> {
        let history = self.repository.participation_history().await?;
        Ok(self.series(&history))
    }

    #[allow(clippy::cast_precision_loss)]
    fn series(&self, history: &[EpochRow]) -> ChartsSnapshot {
        let (participation_rate, voted_ether) = history
            .iter()
            .map(|row| {
                let x = self.clock.epoch_to_time(row.epoch).timestamp_millis() as f64;
                (
                    [x, row.global_participation_rate * 100.0],
                    [x, gwei_to_eth(row.voted_ether)],
                )
            })
            .unzip();

        ChartsSnapshot { participation_rate, voted_ether }
    }
}

#[async_trait]
impl RefreshTask for ChartsUpdater {
    fn name(&self) -> &'static str {
        "charts"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn refresh(&mut self) -> bool {
        match self.build().await {
            Ok(charts) => {
                debug!(points = charts.participation_rate.len(), "charts snapshot published");
                self.cell.store(charts);
                true
            }
            Err(e) => {
                error!(error = %e, "error retrieving chart data");
                false
            }
        }
    }
}
