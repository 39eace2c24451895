//! Pre-genesis deposit progress as produced by the index builder over several cycles.

use crate::mock_infrastructure::{test_config, ChainFixtureBuilder};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use explorer_core::{
    services::{IndexSnapshotBuilder, RefreshTask},
    snapshot::SnapshotCell,
};
use std::sync::Arc;

fn pre_genesis_config(genesis_delay: u64) -> explorer_core::config::AppConfig {
    let mut config = test_config();
    let genesis = Utc::now() + ChronoDuration::days(30);
    config.chain.genesis_timestamp = u64::try_from(genesis.timestamp()).unwrap();
    config.chain.genesis_delay = genesis_delay;
    config
}

fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

#[tokio::test]
async fn test_threshold_latch_survives_later_cycles() {
    let config = pre_genesis_config(0);
    let first_batch = ts(1_600_000_000);
    // 18_750 deposits = 600_000 ETH against a 524_288 ETH threshold.
    let repo = ChainFixtureBuilder::new().deposits(18_750, first_batch).build_repository();
    let cell = Arc::new(SnapshotCell::new("index"));
    let mut builder = IndexSnapshotBuilder::new(repo.clone(), &config, cell.clone());

    assert!(builder.refresh().await);
    let state = cell.load().unwrap().genesis_state.clone().unwrap();
    assert!(state.deposit_threshold_reached);
    assert_eq!(state.deposit_threshold, 524_288);
    assert_eq!(state.deposited_total, 600_000);
    assert_eq!(state.eth1_block_deposit_reached, Some(first_batch));

    // 3_125 more deposits take the total to 700_000 ETH, mined in a later block.
    repo.update(|data| data.push_deposits(3_125, ts(1_700_000_000)));
    for _ in 0..3 {
        assert!(builder.refresh().await);
    }

    let snapshot = cell.load().unwrap();
    assert!(!snapshot.genesis);
    let state = snapshot.genesis_state.clone().unwrap();
    assert_eq!(state.deposited_total, 700_000);
    assert_eq!(state.eth1_block_deposit_reached, Some(first_batch));
    assert_eq!(builder.genesis_tracker().latched_at(), Some(first_batch));
}

#[tokio::test]
async fn test_network_start_uses_later_of_latch_plus_delay_and_min_genesis() {
    let near_future = Utc::now() + ChronoDuration::days(30);
    let delay_seconds = 60 * 24 * 3_600;
    let config = pre_genesis_config(delay_seconds);
    let repo = ChainFixtureBuilder::new().deposits(20_000, near_future).build_repository();
    let cell = Arc::new(SnapshotCell::new("index"));
    let mut builder = IndexSnapshotBuilder::new(repo, &config, cell.clone());

    assert!(builder.refresh().await);
    let state = cell.load().unwrap().genesis_state.clone().unwrap();
    let expected = near_future.timestamp() + i64::try_from(delay_seconds).unwrap();
    assert_eq!(state.network_start_ts, expected);
    assert!(state.network_start_ts > i64::try_from(config.chain.genesis_timestamp).unwrap());
}

#[tokio::test]
async fn test_below_threshold_reports_remaining_validators() {
    let config = pre_genesis_config(0);
    let repo = ChainFixtureBuilder::new().deposits(16_000, ts(1_600_000_000)).build_repository();
    let cell = Arc::new(SnapshotCell::new("index"));
    let mut builder = IndexSnapshotBuilder::new(repo, &config, cell.clone());

    assert!(builder.refresh().await);
    let state = cell.load().unwrap().genesis_state.clone().unwrap();
    assert!(!state.deposit_threshold_reached);
    assert_eq!(state.validators_remaining, 384);
    assert_eq!(state.network_start_ts, i64::try_from(config.chain.genesis_timestamp).unwrap());
}

mod latch_properties {
    use chrono::DateTime;
    use explorer_core::{config::ChainConfig, repository::DepositSummary, services::GenesisTracker};
    use proptest::prelude::*;

    proptest! {
        /// Whatever sequence of deposit totals is observed, the latch holds the block time
        /// of the first observation above the threshold.
        #[test]
        fn latch_holds_first_crossing(totals in prop::collection::vec(0u64..40_000, 1..30)) {
            let chain = ChainConfig::default();
            let mut tracker = GenesisTracker::new();
            let mut expected = None;

            for (i, total) in totals.iter().enumerate() {
                let offset = i64::try_from(i).unwrap();
                let block_ts = DateTime::from_timestamp(1_600_000_000 + offset, 0);
                let deposits = DepositSummary { total: *total, latest_block_ts: block_ts };
                let state = tracker.evaluate(&deposits, &chain);
                if expected.is_none() && state.deposited_total > state.deposit_threshold {
                    expected = block_ts;
                }
                prop_assert_eq!(state.eth1_block_deposit_reached, expected);
                prop_assert_eq!(state.deposit_threshold_reached, expected.is_some());
            }
        }
    }
}
