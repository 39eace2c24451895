//! Dashboard index snapshot builder.
//!
//! Every cycle assembles a complete [`IndexSnapshot`] from a dozen reads and publishes it
//! as one value. Any failed read aborts the cycle before publication, so readers keep
//! seeing the previous snapshot until a later cycle fully succeeds.
//!
//! Before genesis the builder also reports deposit progress through the
//! [`GenesisTracker`], which it owns for its whole lifetime.

use super::{
    format::{
        format_balance, format_block_status, format_participation_rate, format_root,
        format_validator, format_yes_no, gwei_to_eth,
    },
    genesis::GenesisTracker,
    task::RefreshTask,
};
use crate::{
    chain::SlotClock,
    config::{AppConfig, ChainConfig},
    repository::{BlockRow, EpochHistoryRow, EpochRow, IndexRepository, RepositoryError},
    snapshot::{ReadinessSignal, SnapshotCell},
    types::{BlockSummary, ChartSeries, EpochSummary, IndexSnapshot},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{sync::Arc, time::Duration};
use tracing::{debug, error};

/// Rows in the recent epochs table.
pub const RECENT_EPOCHS: u32 = 15;

/// Rows in the recent blocks table.
pub const RECENT_BLOCKS: u32 = 15;

/// Before genesis only the first slots are shown.
pub const PRE_GENESIS_CUTOFF_SLOT: u64 = 20;

pub struct IndexSnapshotBuilder {
    repository: Arc<dyn IndexRepository>,
    clock: SlotClock,
    chain: ChainConfig,
    subtitle: String,
    cutoff_buffer: Duration,
    interval: Duration,
    cell: Arc<SnapshotCell<IndexSnapshot>>,
    genesis: GenesisTracker,
    readiness: Option<ReadinessSignal>,
}

impl IndexSnapshotBuilder {
    #[must_use]
    pub fn new(
        repository: Arc<dyn IndexRepository>,
        config: &AppConfig,
        cell: Arc<SnapshotCell<IndexSnapshot>>,
    ) -> Self {
        Self {
            repository,
            clock: SlotClock::from_config(&config.chain),
            chain: config.chain.clone(),
            subtitle: config.frontend.site_subtitle.clone(),
            cutoff_buffer: config.services.slot_cutoff_buffer(),
            interval: config.services.index_refresh_interval(),
            cell,
            genesis: GenesisTracker::new(),
            readiness: None,
        }
    }

    #[must_use]
    pub fn with_readiness(mut self, signal: ReadinessSignal) -> Self {
        self.readiness = Some(signal);
        self
    }

    #[must_use]
    pub fn genesis_tracker(&self) -> &GenesisTracker {
        &self.genesis
    }

    /// Builds one snapshot as of `now` without publishing it.
    ///
    /// # Errors
    ///
    /// Returns the first failed read; nothing from the cycle is kept apart from a genesis
    /// latch that was already taken.
    pub async fn build(&mut self, now: DateTime<Utc>) -> Result<IndexSnapshot, RepositoryError> {
        let repo = self.repository.clone();

        let current_epoch = repo.latest_epoch().await?;

        let (genesis, genesis_state, cutoff_slot) = if self.clock.is_pre_genesis(now) {
            let deposits = repo.valid_deposit_summary().await?;
            let state = self.genesis.evaluate(&deposits, &self.chain);
            (false, Some(state), PRE_GENESIS_CUTOFF_SLOT)
        } else {
            (true, None, self.clock.cutoff_slot(now, self.cutoff_buffer))
        };

        let epochs = repo
            .recent_epochs(RECENT_EPOCHS)
            .await?
            .iter()
            .map(|row| self.summarize_epoch(row))
            .collect::<Vec<_>>();

        let scheduled_count = repo.scheduled_block_count().await?;
        let blocks = repo
            .recent_blocks(cutoff_slot, RECENT_BLOCKS)
            .await?
            .iter()
            .map(|row| self.summarize_block(row))
            .collect::<Vec<_>>();
        let current_slot = blocks.first().map_or(0, |b| b.slot);

        let entering_validators = repo.entering_validator_count().await?;
        let exiting_validators = repo.exiting_validator_count().await?;
        let average_balance = format_balance(repo.average_balance(current_epoch).await?);

        let history = repo.epoch_history(current_epoch).await?;
        let (current_finalized_epoch, finality_delay) =
            match history.iter().rev().find(|h| h.finalized) {
                Some(finalized) => {
                    (finalized.epoch, current_epoch.saturating_sub(finalized.epoch))
                }
                None => (0, 0),
            };
        let (staked_ether, active_validators) = history.last().map_or_else(
            || (String::new(), 0),
            |newest| (format_balance(newest.eligible_ether), newest.validators_count),
        );
        let (staked_ether_chart_data, active_validators_chart_data) = self.history_series(&history);

        Ok(IndexSnapshot {
            current_epoch,
            current_slot,
            current_finalized_epoch,
            finality_delay,
            scheduled_count,
            epochs,
            blocks,
            entering_validators,
            exiting_validators,
            average_balance,
            staked_ether,
            active_validators,
            staked_ether_chart_data,
            active_validators_chart_data,
            subtitle: self.subtitle.clone(),
            genesis,
            genesis_state,
        })
    }

    fn summarize_epoch(&self, row: &EpochRow) -> EpochSummary {
        EpochSummary {
            epoch: row.epoch,
            ts: self.clock.epoch_to_time(row.epoch),
            finalized: row.finalized,
            finalized_formatted: format_yes_no(row.finalized),
            eligible_ether: row.eligible_ether,
            eligible_ether_formatted: format_balance(row.eligible_ether),
            voted_ether: row.voted_ether,
            voted_ether_formatted: format_balance(row.voted_ether),
            global_participation_rate: row.global_participation_rate,
            global_participation_rate_formatted: format_participation_rate(
                row.global_participation_rate,
            ),
        }
    }

    fn summarize_block(&self, row: &BlockRow) -> BlockSummary {
        BlockSummary {
            epoch: row.epoch,
            slot: row.slot,
            ts: self.clock.slot_to_time(row.slot),
            proposer: row.proposer,
            proposer_name: row.proposer_name.clone(),
            proposer_formatted: format_validator(row.proposer, &row.proposer_name),
            block_root_formatted: format_root(&row.block_root),
            status: row.status.clone(),
            status_formatted: format_block_status(&row.status),
            attestations_count: row.attestations_count,
            deposits_count: row.deposits_count,
            voluntary_exits_count: row.voluntary_exits_count,
            proposer_slashings_count: row.proposer_slashings_count,
            attester_slashings_count: row.attester_slashings_count,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn history_series(&self, history: &[EpochHistoryRow]) -> (ChartSeries, ChartSeries) {
        history
            .iter()
            .map(|h| {
                let x = self.clock.epoch_to_time(h.epoch).timestamp_millis() as f64;
                ([x, gwei_to_eth(h.eligible_ether)], [x, h.validators_count as f64])
            })
            .unzip()
    }
}

#[async_trait]
impl RefreshTask for IndexSnapshotBuilder {
    fn name(&self) -> &'static str {
        "index"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn refresh(&mut self) -> bool {
        match self.build(Utc::now()).await {
            Ok(snapshot) => {
                debug!(
                    current_epoch = snapshot.current_epoch,
                    current_slot = snapshot.current_slot,
                    blocks = snapshot.blocks.len(),
                    "index snapshot published"
                );
                self.cell.store(snapshot);
                if let Some(signal) = self.readiness.as_mut() {
                    signal.signal_once();
                }
                true
            }
            Err(e) => {
                error!(error = %e, "error retrieving index page data");
                false
            }
        }
    }
}
