use chrono::{DateTime, Utc};
use explorer_core::repository::{
    fixture::{FixtureData, FixtureEpoch, FixtureRepository},
    ValidatorStats,
};
use std::{ops::RangeInclusive, sync::Arc};

pub const SLOTS_PER_EPOCH: u64 = 32;

/// Builds indexer tables for a chain with a contiguous run of epochs.
#[derive(Debug, Clone)]
pub struct ChainFixtureBuilder {
    epochs: RangeInclusive<u64>,
    finalized_through: Option<u64>,
    blocks: u64,
    validators_per_epoch: u64,
    activation_queue: u64,
    exit_queue: u64,
    average_balance_gwei: u64,
    deposits: Vec<(u64, DateTime<Utc>)>,
}

impl Default for ChainFixtureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainFixtureBuilder {
    pub fn new() -> Self {
        Self {
            epochs: 0..=0,
            finalized_through: None,
            blocks: 0,
            validators_per_epoch: 1_000,
            activation_queue: 0,
            exit_queue: 0,
            average_balance_gwei: 32_000_000_000,
            deposits: Vec::new(),
        }
    }

    /// Indexed epochs, inclusive. The last one is the head.
    #[must_use]
    pub fn epochs(mut self, epochs: RangeInclusive<u64>) -> Self {
        self.epochs = epochs;
        self
    }

    /// Marks every epoch up to and including `epoch` as finalized.
    #[must_use]
    pub fn finalized_through(mut self, epoch: u64) -> Self {
        self.finalized_through = Some(epoch);
        self
    }

    /// Proposed blocks in the first slots of the head epoch.
    #[must_use]
    pub fn blocks(mut self, count: u64) -> Self {
        self.blocks = count;
        self
    }

    #[must_use]
    pub fn validator_queues(mut self, entering: u64, exiting: u64) -> Self {
        self.activation_queue = entering;
        self.exit_queue = exiting;
        self
    }

    #[must_use]
    pub fn deposits(mut self, count: u64, block_ts: DateTime<Utc>) -> Self {
        self.deposits.push((count, block_ts));
        self
    }

    pub fn head_epoch(&self) -> u64 {
        *self.epochs.end()
    }

    pub fn build(&self) -> FixtureData {
        let head = self.head_epoch();
        let mut data = FixtureData {
            epochs: self
                .epochs
                .clone()
                .map(|epoch| {
                    let finalized = self.finalized_through.is_some_and(|f| epoch <= f);
                    let mut row = FixtureEpoch::new(epoch, finalized);
                    row.validators_count = self.validators_per_epoch + epoch;
                    row
                })
                .collect(),
            activation_queue: self.activation_queue,
            exit_queue: self.exit_queue,
            validator_stats: ValidatorStats {
                total: self.validators_per_epoch + self.activation_queue,
                active: self.validators_per_epoch,
                pending: self.activation_queue,
                exited: 0,
            },
            ..FixtureData::default()
        };
        data.average_balances.insert(head, self.average_balance_gwei);

        let first_slot = head * SLOTS_PER_EPOCH;
        for slot in first_slot..first_slot + self.blocks {
            data.push_block(slot, SLOTS_PER_EPOCH, "1", slot % 64);
        }
        for (count, block_ts) in &self.deposits {
            data.push_deposits(*count, *block_ts);
        }

        data
    }

    pub fn build_repository(&self) -> Arc<FixtureRepository> {
        Arc::new(FixtureRepository::new(self.build()))
    }
}
