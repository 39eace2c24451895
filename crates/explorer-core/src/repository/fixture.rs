//! In-memory [`IndexRepository`] for tests and demos.
//!
//! Holds a mutable [`FixtureData`] that queries are answered from, plus per-query fault
//! injection and call counters so tests can script transient failures and assert on
//! retry behaviour.

use super::{
    BlockRow, DepositStats, DepositSummary, EpochHistoryRow, EpochRow, IndexRepository, Query,
    RepositoryError, ValidatorStats,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

/// One row of the `epochs` table as the fixture stores it.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureEpoch {
    pub epoch: u64,
    pub finalized: bool,
    pub eligible_ether: u64,
    pub voted_ether: u64,
    pub global_participation_rate: f64,
    pub validators_count: u64,
}

impl FixtureEpoch {
    /// A finalized or unfinalized epoch with a plausible participation profile.
    #[must_use]
    pub fn new(epoch: u64, finalized: bool) -> Self {
        Self {
            epoch,
            finalized,
            eligible_ether: 32_000_000_000 * 1_000,
            voted_ether: 32_000_000_000 * 990,
            global_participation_rate: 0.99,
            validators_count: 1_000,
        }
    }
}

/// One valid eth1 deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureDeposit {
    pub amount_gwei: u64,
    pub block_ts: DateTime<Utc>,
    pub valid_signature: bool,
}

/// Table contents the fixture answers from.
#[derive(Debug, Clone, Default)]
pub struct FixtureData {
    pub epochs: Vec<FixtureEpoch>,
    pub blocks: Vec<BlockRow>,
    pub deposits: Vec<FixtureDeposit>,
    pub activation_queue: u64,
    pub exit_queue: u64,
    /// Average balance in gwei keyed by epoch.
    pub average_balances: HashMap<u64, u64>,
    pub validator_stats: ValidatorStats,
}

impl FixtureData {
    /// Appends a block in `status` with zeroed operation counts.
    pub fn push_block(&mut self, slot: u64, slots_per_epoch: u64, status: &str, proposer: u64) {
        self.blocks.push(BlockRow {
            epoch: slot / slots_per_epoch.max(1),
            slot,
            proposer,
            block_root: vec![u8::try_from(slot % 256).unwrap_or(0); 32],
            parent_root: vec![0; 32],
            attestations_count: 0,
            deposits_count: 0,
            voluntary_exits_count: 0,
            proposer_slashings_count: 0,
            attester_slashings_count: 0,
            status: status.to_string(),
            proposer_name: String::new(),
        });
    }

    /// Appends `count` valid 32 ETH deposits mined at `block_ts`.
    pub fn push_deposits(&mut self, count: u64, block_ts: DateTime<Utc>) {
        for _ in 0..count {
            self.deposits.push(FixtureDeposit {
                amount_gwei: 32_000_000_000,
                block_ts,
                valid_signature: true,
            });
        }
    }

    fn max_epoch(&self, finalized_only: bool) -> u64 {
        self.epochs
            .iter()
            .filter(|e| !finalized_only || e.finalized)
            .map(|e| e.epoch)
            .max()
            .unwrap_or(0)
    }

    fn valid_full_deposits(&self) -> impl Iterator<Item = &FixtureDeposit> {
        self.deposits.iter().filter(|d| d.valid_signature && d.amount_gwei >= 32_000_000_000)
    }
}

#[derive(Debug, Clone, Copy)]
enum Fault {
    Times(u32),
    Always,
}

/// Scripted in-memory repository.
#[derive(Debug, Default)]
pub struct FixtureRepository {
    data: RwLock<FixtureData>,
    faults: RwLock<HashMap<Query, Fault>>,
    calls: RwLock<HashMap<Query, u64>>,
}

impl FixtureRepository {
    #[must_use]
    pub fn new(data: FixtureData) -> Self {
        Self { data: RwLock::new(data), ..Self::default() }
    }

    /// Mutates the backing tables in place.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut FixtureData),
    {
        f(&mut self.data.write());
    }

    /// Makes the next `times` calls of `query` fail. Zero clears any fault on `query`.
    pub fn fail_times(&self, query: Query, times: u32) {
        let mut faults = self.faults.write();
        if times == 0 {
            faults.remove(&query);
        } else {
            faults.insert(query, Fault::Times(times));
        }
    }

    /// Makes every call of `query` fail until [`recover`](Self::recover).
    pub fn fail_always(&self, query: Query) {
        self.faults.write().insert(query, Fault::Always);
    }

    pub fn recover(&self, query: Query) {
        self.faults.write().remove(&query);
    }

    /// Number of times `query` has been invoked, failed calls included.
    #[must_use]
    pub fn calls(&self, query: Query) -> u64 {
        self.calls.read().get(&query).copied().unwrap_or(0)
    }

    fn enter(&self, query: Query) -> Result<(), RepositoryError> {
        *self.calls.write().entry(query).or_insert(0) += 1;

        let mut faults = self.faults.write();
        match faults.get(&query).copied() {
            None => Ok(()),
            Some(Fault::Always) => Err(Self::injected(query)),
            Some(Fault::Times(remaining)) => {
                if remaining <= 1 {
                    faults.remove(&query);
                } else {
                    faults.insert(query, Fault::Times(remaining - 1));
                }
                Err(Self::injected(query))
            }
        }
    }

    fn injected(query: Query) -> RepositoryError {
        RepositoryError::Unavailable(format!("injected failure for {}", query.as_str()))
    }

    fn epoch_row(epoch: &FixtureEpoch) -> EpochRow {
        EpochRow {
            epoch: epoch.epoch,
            finalized: epoch.finalized,
            eligible_ether: epoch.eligible_ether,
            global_participation_rate: epoch.global_participation_rate,
            voted_ether: epoch.voted_ether,
        }
    }

    fn sorted_epochs(&self) -> Vec<FixtureEpoch> {
        let mut epochs = self.data.read().epochs.clone();
        epochs.sort_by_key(|e| e.epoch);
        epochs
    }
}

#[async_trait]
impl IndexRepository for FixtureRepository {
    async fn latest_epoch(&self) -> Result<u64, RepositoryError> {
        self.enter(Query::LatestEpoch)?;
        Ok(self.data.read().max_epoch(false))
    }

    async fn latest_finalized_epoch(&self) -> Result<u64, RepositoryError> {
        self.enter(Query::LatestFinalizedEpoch)?;
        Ok(self.data.read().max_epoch(true))
    }

    async fn latest_slot_before(&self, cutoff_slot: u64) -> Result<u64, RepositoryError> {
        self.enter(Query::LatestSlot)?;
        Ok(self
            .data
            .read()
            .blocks
            .iter()
            .map(|b| b.slot)
            .filter(|slot| *slot < cutoff_slot)
            .max()
            .unwrap_or(0))
    }

    async fn latest_proposed_slot(&self) -> Result<u64, RepositoryError> {
        self.enter(Query::LatestProposedSlot)?;
        Ok(self
            .data
            .read()
            .blocks
            .iter()
            .filter(|b| b.status == "1")
            .map(|b| b.slot)
            .max()
            .unwrap_or(0))
    }

    async fn valid_deposit_summary(&self) -> Result<DepositSummary, RepositoryError> {
        self.enter(Query::ValidDepositSummary)?;
        let data = self.data.read();
        Ok(DepositSummary {
            total: data.valid_full_deposits().count() as u64,
            latest_block_ts: data.valid_full_deposits().map(|d| d.block_ts).max(),
        })
    }

    async fn recent_epochs(&self, limit: u32) -> Result<Vec<EpochRow>, RepositoryError> {
        self.enter(Query::RecentEpochs)?;
        Ok(self
            .sorted_epochs()
            .iter()
            .rev()
            .take(limit as usize)
            .map(Self::epoch_row)
            .collect())
    }

    async fn scheduled_block_count(&self) -> Result<u64, RepositoryError> {
        self.enter(Query::ScheduledBlockCount)?;
        let data = self.data.read();
        let Some(latest) = data.blocks.iter().map(|b| b.epoch).max() else {
            return Ok(0);
        };
        Ok(data.blocks.iter().filter(|b| b.epoch == latest && b.status == "0").count() as u64)
    }

    async fn recent_blocks(
        &self,
        cutoff_slot: u64,
        limit: u32,
    ) -> Result<Vec<BlockRow>, RepositoryError> {
        self.enter(Query::RecentBlocks)?;
        let mut blocks: Vec<BlockRow> =
            self.data.read().blocks.iter().filter(|b| b.slot < cutoff_slot).cloned().collect();
        blocks.sort_by(|a, b| b.slot.cmp(&a.slot));
        blocks.truncate(limit as usize);
        Ok(blocks)
    }

    async fn entering_validator_count(&self) -> Result<u64, RepositoryError> {
        self.enter(Query::EnteringValidatorCount)?;
        Ok(self.data.read().activation_queue)
    }

    async fn exiting_validator_count(&self) -> Result<u64, RepositoryError> {
        self.enter(Query::ExitingValidatorCount)?;
        Ok(self.data.read().exit_queue)
    }

    async fn average_balance(&self, epoch: u64) -> Result<u64, RepositoryError> {
        self.enter(Query::AverageBalance)?;
        Ok(self.data.read().average_balances.get(&epoch).copied().unwrap_or(0))
    }

    async fn epoch_history(
        &self,
        before_epoch: u64,
    ) -> Result<Vec<EpochHistoryRow>, RepositoryError> {
        self.enter(Query::EpochHistory)?;
        Ok(self
            .sorted_epochs()
            .iter()
            .filter(|e| e.epoch < before_epoch)
            .map(|e| EpochHistoryRow {
                epoch: e.epoch,
                eligible_ether: e.eligible_ether,
                validators_count: e.validators_count,
                finalized: e.finalized,
            })
            .collect())
    }

    async fn participation_history(&self) -> Result<Vec<EpochRow>, RepositoryError> {
        self.enter(Query::ParticipationHistory)?;
        Ok(self.sorted_epochs().iter().map(Self::epoch_row).collect())
    }

    async fn validator_stats(&self, _epoch: u64) -> Result<ValidatorStats, RepositoryError> {
        self.enter(Query::ValidatorStats)?;
        Ok(self.data.read().validator_stats)
    }

    async fn deposit_stats(&self) -> Result<DepositStats, RepositoryError> {
        self.enter(Query::DepositStats)?;
        let data = self.data.read();
        let valid = data.deposits.iter().filter(|d| d.valid_signature);
        let (count, total_amount_gwei) = valid.fold((0u64, 0u64), |(count, sum), d| {
            (count + 1, sum.saturating_add(d.amount_gwei))
        });
        Ok(DepositStats { count, total_amount_gwei })
    }
}
