//! Read-only query interface over the indexer database.
//!
//! The refresh workers never talk to the database directly. They go through
//! [`IndexRepository`], which keeps them testable against the in-memory
//! [`FixtureRepository`](fixture::FixtureRepository) and leaves room for other backends.
//!
//! # Contract
//!
//! - Every method is a single read. Nothing here writes.
//! - Scalars that aggregate over possibly empty tables are null-coalesced to `0` by the
//!   implementation, so callers never see "no rows" as an error.
//! - A failed query returns [`RepositoryError`] and produces no partial output.
//!
//! # Tables
//!
//! | Table | Used for |
//! |-------|----------|
//! | `epochs` | head epoch, finality, participation, history charts |
//! | `blocks` (+ `validators` for names) | head slot, proposed slot, recent blocks |
//! | `eth1_deposits` | pre-genesis deposit progress, deposit stats |
//! | `validatorqueue_activation` / `validatorqueue_exit` | queue counts |
//! | `validator_balances` | average balance |

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixture;
pub mod postgres;

pub use postgres::PgRepository;

/// Errors returned by repository queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The database rejected or failed the query.
    #[error("Database error: {0}")]
    Database(String),

    /// A column held a value that does not fit the target type.
    #[error("Invalid value in column '{column}': {reason}")]
    Decode { column: &'static str, reason: String },

    /// The backend cannot serve queries right now.
    #[error("Repository unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Identifies a repository query in logs and fixture fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Query {
    LatestEpoch,
    LatestFinalizedEpoch,
    LatestSlot,
    LatestProposedSlot,
    ValidDepositSummary,
    RecentEpochs,
    ScheduledBlockCount,
    RecentBlocks,
    EnteringValidatorCount,
    ExitingValidatorCount,
    AverageBalance,
    EpochHistory,
    ParticipationHistory,
    ValidatorStats,
    DepositStats,
}

impl Query {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LatestEpoch => "latest_epoch",
            Self::LatestFinalizedEpoch => "latest_finalized_epoch",
            Self::LatestSlot => "latest_slot",
            Self::LatestProposedSlot => "latest_proposed_slot",
            Self::ValidDepositSummary => "valid_deposit_summary",
            Self::RecentEpochs => "recent_epochs",
            Self::ScheduledBlockCount => "scheduled_block_count",
            Self::RecentBlocks => "recent_blocks",
            Self::EnteringValidatorCount => "entering_validator_count",
            Self::ExitingValidatorCount => "exiting_validator_count",
            Self::AverageBalance => "average_balance",
            Self::EpochHistory => "epoch_history",
            Self::ParticipationHistory => "participation_history",
            Self::ValidatorStats => "validator_stats",
            Self::DepositStats => "deposit_stats",
        }
    }
}

/// Epoch-level participation row.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochRow {
    pub epoch: u64,
    pub finalized: bool,
    /// Gwei.
    pub eligible_ether: u64,
    /// Fraction in `[0, 1]`.
    pub global_participation_rate: f64,
    /// Gwei.
    pub voted_ether: u64,
}

/// Block row joined with the proposer's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRow {
    pub epoch: u64,
    pub slot: u64,
    pub proposer: u64,
    pub block_root: Vec<u8>,
    pub parent_root: Vec<u8>,
    pub attestations_count: u64,
    pub deposits_count: u64,
    pub voluntary_exits_count: u64,
    pub proposer_slashings_count: u64,
    pub attester_slashings_count: u64,
    /// `"0"` scheduled, `"1"` proposed, `"2"` missed, `"3"` orphaned.
    pub status: String,
    /// Empty when the proposer has no registered name.
    pub proposer_name: String,
}

/// Epoch history row used for finality and the staking charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochHistoryRow {
    pub epoch: u64,
    /// Gwei.
    pub eligible_ether: u64,
    pub validators_count: u64,
    pub finalized: bool,
}

/// Count of valid full deposits and the newest deposit block time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositSummary {
    pub total: u64,
    pub latest_block_ts: Option<DateTime<Utc>>,
}

/// Validator counts by lifecycle stage at one epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidatorStats {
    pub total: u64,
    pub active: u64,
    pub pending: u64,
    pub exited: u64,
}

/// Deposit contract totals over valid deposits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepositStats {
    pub count: u64,
    pub total_amount_gwei: u64,
}

/// Read-only query interface over the indexer database.
///
/// Implementations must be safe to share across all refresh workers.
#[async_trait]
pub trait IndexRepository: Send + Sync {
    /// Highest indexed epoch, `0` if none.
    async fn latest_epoch(&self) -> Result<u64, RepositoryError>;

    /// Highest finalized epoch, `0` if none.
    async fn latest_finalized_epoch(&self) -> Result<u64, RepositoryError>;

    /// Highest indexed slot strictly below `cutoff_slot`, `0` if none.
    async fn latest_slot_before(&self, cutoff_slot: u64) -> Result<u64, RepositoryError>;

    /// Highest slot with a proposed block, `0` if none.
    async fn latest_proposed_slot(&self) -> Result<u64, RepositoryError>;

    /// Valid deposits of at least 32 ETH with a valid signature.
    async fn valid_deposit_summary(&self) -> Result<DepositSummary, RepositoryError>;

    /// Most recent epochs, newest first.
    async fn recent_epochs(&self, limit: u32) -> Result<Vec<EpochRow>, RepositoryError>;

    /// Blocks still scheduled in the newest epoch that has blocks.
    async fn scheduled_block_count(&self) -> Result<u64, RepositoryError>;

    /// Most recent blocks strictly below `cutoff_slot`, newest first.
    async fn recent_blocks(
        &self,
        cutoff_slot: u64,
        limit: u32,
    ) -> Result<Vec<BlockRow>, RepositoryError>;

    async fn entering_validator_count(&self) -> Result<u64, RepositoryError>;

    async fn exiting_validator_count(&self) -> Result<u64, RepositoryError>;

    /// Average validator balance at `epoch` in gwei, `0` if there are no balances.
    async fn average_balance(&self, epoch: u64) -> Result<u64, RepositoryError>;

    /// Every epoch strictly below `before_epoch`, oldest first.
    async fn epoch_history(
        &self,
        before_epoch: u64,
    ) -> Result<Vec<EpochHistoryRow>, RepositoryError>;

    /// Every epoch's participation, oldest first.
    async fn participation_history(&self) -> Result<Vec<EpochRow>, RepositoryError>;

    async fn validator_stats(&self, epoch: u64) -> Result<ValidatorStats, RepositoryError>;

    async fn deposit_stats(&self) -> Result<DepositStats, RepositoryError>;
}
