//! Pre-genesis deposit progress.
//!
//! Before the beacon chain starts, the dashboard shows how many deposits are still missing
//! and when the network is expected to launch. Launch time depends on the eth1 block in
//! which the deposit threshold was first exceeded, so that timestamp is latched the first
//! time the threshold is seen exceeded and reused on every later cycle.
//!
//! The tracker lives inside the index builder task and is only ever mutated through
//! `&mut self`, so there is exactly one writer.

use crate::{config::ChainConfig, repository::DepositSummary, types::GenesisState};
use chrono::{DateTime, Utc};
use tracing::info;

/// ETH per full validator deposit.
pub const DEPOSIT_SIZE_ETH: u64 = 32;

#[derive(Debug, Default)]
pub struct GenesisTracker {
    latched_at: Option<DateTime<Utc>>,
}

impl GenesisTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Block time latched when the deposit threshold was first exceeded.
    #[must_use]
    pub fn latched_at(&self) -> Option<DateTime<Utc>> {
        self.latched_at
    }

    /// Computes deposit progress and latches the threshold timestamp on first crossing.
    ///
    /// A crossing observed without a deposit block time does not latch; the next cycle
    /// that carries one will.
    pub fn evaluate(&mut self, deposits: &DepositSummary, chain: &ChainConfig) -> GenesisState {
        let deposit_threshold =
            chain.min_genesis_active_validator_count.saturating_mul(DEPOSIT_SIZE_ETH);
        let deposited_total = deposits.total.saturating_mul(DEPOSIT_SIZE_ETH);
        let validators_remaining = (i128::from(deposit_threshold) - i128::from(deposited_total))
            / i128::from(DEPOSIT_SIZE_ETH);
        // |threshold - deposited| / 32 always fits in an i64.
        let validators_remaining = i64::try_from(validators_remaining).unwrap_or_default();

        if self.latched_at.is_none() && deposited_total > deposit_threshold {
            if let Some(block_ts) = deposits.latest_block_ts {
                info!(
                    deposited_total,
                    deposit_threshold,
                    eth1_block_ts = %block_ts,
                    "genesis deposit threshold reached"
                );
                self.latched_at = Some(block_ts);
            }
        }

        let min_genesis_ts = i64::try_from(chain.genesis_timestamp).unwrap_or(i64::MAX);
        let delay = i64::try_from(chain.genesis_delay).unwrap_or(i64::MAX);
        let network_start_ts = match self.latched_at {
            Some(latched) if latched.timestamp().saturating_add(delay) > min_genesis_ts => {
                latched.timestamp().saturating_add(delay)
            }
            _ => min_genesis_ts,
        };

        GenesisState {
            deposited_total,
            deposit_threshold,
            validators_remaining,
            network_start_ts,
            eth1_block_deposit_reached: self.latched_at,
            deposit_threshold_reached: self.latched_at.is_some(),
        }
    }
}
