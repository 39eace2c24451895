//! Snapshot payloads published to the request layer.
//!
//! Every type here is immutable once published: workers build a fresh value each cycle and
//! hand it to a [`SnapshotCell`](crate::snapshot::SnapshotCell). All of them serialize to
//! JSON for the API and template layers.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Chart data as `[x, y]` pairs; x is a unix timestamp in milliseconds.
pub type ChartSeries = Vec<[f64; 2]>;

/// Dashboard index snapshot: everything the landing page renders, built in one cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexSnapshot {
    pub current_epoch: u64,
    pub current_slot: u64,
    /// Finalized epoch found by scanning the epoch history.
    pub current_finalized_epoch: u64,
    /// `current_epoch - current_finalized_epoch` from the same history scan.
    pub finality_delay: u64,
    pub scheduled_count: u64,
    pub epochs: Vec<EpochSummary>,
    pub blocks: Vec<BlockSummary>,
    pub entering_validators: u64,
    pub exiting_validators: u64,
    pub average_balance: String,
    pub staked_ether: String,
    pub active_validators: u64,
    pub staked_ether_chart_data: ChartSeries,
    pub active_validators_chart_data: ChartSeries,
    pub subtitle: String,
    /// `false` while the chain has not started yet.
    pub genesis: bool,
    /// Deposit progress, present only before genesis.
    pub genesis_state: Option<GenesisState>,
}

/// One row of the recent epochs table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpochSummary {
    pub epoch: u64,
    pub ts: DateTime<Utc>,
    pub finalized: bool,
    pub finalized_formatted: String,
    pub eligible_ether: u64,
    pub eligible_ether_formatted: String,
    pub voted_ether: u64,
    pub voted_ether_formatted: String,
    pub global_participation_rate: f64,
    pub global_participation_rate_formatted: String,
}

/// One row of the recent blocks table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockSummary {
    pub epoch: u64,
    pub slot: u64,
    pub ts: DateTime<Utc>,
    pub proposer: u64,
    pub proposer_name: String,
    pub proposer_formatted: String,
    pub block_root_formatted: String,
    pub status: String,
    pub status_formatted: String,
    pub attestations_count: u64,
    pub deposits_count: u64,
    pub voluntary_exits_count: u64,
    pub proposer_slashings_count: u64,
    pub attester_slashings_count: u64,
}

/// Pre-genesis deposit progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenesisState {
    /// Valid deposits so far, in ETH.
    pub deposited_total: u64,
    /// Deposits required before genesis, in ETH.
    pub deposit_threshold: u64,
    /// Validators still missing. Negative once the threshold has been exceeded.
    pub validators_remaining: i64,
    /// Unix timestamp the network is expected to start at.
    pub network_start_ts: i64,
    /// Block time of the deposit batch that first crossed the threshold.
    pub eth1_block_deposit_reached: Option<DateTime<Utc>>,
    pub deposit_threshold_reached: bool,
}

/// Composite view over the chain head cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LatestState {
    pub current_epoch: u64,
    pub current_slot: u64,
    pub current_finalized_epoch: u64,
    pub last_proposed_slot: u64,
    pub finality_delay: u64,
    pub is_syncing: bool,
}

/// Validator and deposit counters refreshed by the stats updater.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub epoch: u64,
    pub total_validator_count: u64,
    pub active_validator_count: u64,
    pub pending_validator_count: u64,
    pub exited_validator_count: u64,
    pub total_deposit_count: u64,
    pub total_deposited_gwei: u64,
}

/// Participation charts refreshed by the charts updater.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartsSnapshot {
    /// Epoch time → global participation rate in percent.
    pub participation_rate: ChartSeries,
    /// Epoch time → voted ether in ETH.
    pub voted_ether: ChartSeries,
}
