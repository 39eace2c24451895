//! End-to-end snapshot contents and atomic publication.

use crate::mock_infrastructure::{start_runtime, test_config, ChainFixtureBuilder};
use explorer_core::{
    chain::SlotClock,
    repository::fixture::FixtureEpoch,
    services::{IndexSnapshotBuilder, RefreshTask},
    snapshot::SnapshotCell,
    types::IndexSnapshot,
};
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use tokio::time::{timeout, Duration};

#[tokio::test(start_paused = true)]
async fn test_end_to_end_fixture() {
    let repo = ChainFixtureBuilder::new()
        .epochs(8..=10)
        .finalized_through(8)
        .blocks(3)
        .validator_queues(5, 1)
        .build_repository();
    let config = test_config();
    let clock = SlotClock::from_config(&config.chain);

    let mut runtime = start_runtime(config, repo).await;
    let services = runtime.services().clone();

    assert_eq!(services.latest_epoch(), Ok(10));
    assert_eq!(services.latest_finalized_epoch(), Ok(8));
    assert_eq!(services.finalization_delay(), Ok(2));
    assert_eq!(services.latest_slot(), Ok(322));
    assert_eq!(services.latest_proposed_slot(), Ok(322));

    let snapshot = services.latest_index_snapshot().unwrap();
    assert!(snapshot.genesis);
    assert_eq!(snapshot.current_epoch, 10);
    assert_eq!(snapshot.current_slot, 322);
    assert_eq!(snapshot.current_finalized_epoch, 8);
    assert_eq!(snapshot.finality_delay, 2);
    assert_eq!(snapshot.blocks.len(), 3);
    assert_eq!(snapshot.epochs.len(), 3);
    assert_eq!(snapshot.entering_validators, 5);
    assert_eq!(snapshot.exiting_validators, 1);
    assert_eq!(snapshot.average_balance, "32.00 ETH");
    assert_eq!(snapshot.subtitle, "Integration Testnet");

    // History covers epochs 8 and 9 only; epoch 10 is the head.
    assert_eq!(snapshot.staked_ether_chart_data.len(), 2);
    assert_eq!(snapshot.active_validators_chart_data.len(), 2);
    #[allow(clippy::cast_precision_loss)]
    let epoch_9_ms = clock.epoch_to_time(9).timestamp_millis() as f64;
    assert_eq!(snapshot.active_validators_chart_data[1], [epoch_9_ms, 1_009.0]);
    assert_eq!(snapshot.active_validators, 1_009);

    let state = services.latest_chain_state().unwrap();
    assert_eq!(state.current_epoch, 10);
    assert_eq!(state.finality_delay, 2);
    assert_eq!(state.last_proposed_slot, 322);

    runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_recent_epochs_and_blocks_hold_fifteen_entries() {
    let repo = ChainFixtureBuilder::new()
        .epochs(0..=39)
        .finalized_through(37)
        .blocks(30)
        .build_repository();
    let mut runtime = start_runtime(test_config(), repo).await;

    let snapshot = runtime.services().latest_index_snapshot().unwrap();
    let epochs: Vec<u64> = snapshot.epochs.iter().map(|e| e.epoch).collect();
    assert_eq!(epochs, (25..=39).rev().collect::<Vec<_>>());

    // Head epoch 39 starts at slot 1248; thirty blocks run through slot 1277.
    let slots: Vec<u64> = snapshot.blocks.iter().map(|b| b.slot).collect();
    assert_eq!(slots, (1_263..=1_277).rev().collect::<Vec<_>>());
    assert_eq!(snapshot.finality_delay, 2);

    runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_and_head_delays_are_independent() {
    let repo = ChainFixtureBuilder::new().epochs(0..=6).finalized_through(4).build_repository();
    let mut runtime = start_runtime(test_config(), repo.clone()).await;

    // Finality advances in the table; the head pollers see it within a second, the index
    // snapshot only on its next ten-second cycle.
    repo.update(|data| {
        for epoch in &mut data.epochs {
            epoch.finalized = epoch.epoch <= 5;
        }
    });
    tokio::time::sleep(Duration::from_millis(1_500)).await;

    let services = runtime.services();
    assert_eq!(services.finalization_delay(), Ok(1));
    assert_eq!(services.latest_index_snapshot().unwrap().finality_delay, 2);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(services.latest_index_snapshot().unwrap().finality_delay, 1);

    runtime.shutdown().await;
}

/// A reader must only ever see a snapshot produced by one complete build: every field of
/// the snapshot below is derived from the same generation counter.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_publication_is_atomic_under_concurrent_readers() {
    const GENERATIONS: u64 = 200;

    let repo = ChainFixtureBuilder::new().epochs(1..=1).validator_queues(1, 1).build_repository();
    let config = test_config();
    let cell: Arc<SnapshotCell<IndexSnapshot>> = Arc::new(SnapshotCell::new("index"));
    let mut builder = IndexSnapshotBuilder::new(repo.clone(), &config, cell.clone());

    assert!(builder.refresh().await);

    let done = Arc::new(AtomicBool::new(false));
    let reads = Arc::new(AtomicU64::new(0));
    let mut readers = Vec::new();
    for _ in 0..4 {
        let cell = cell.clone();
        let done = done.clone();
        let reads = reads.clone();
        readers.push(tokio::spawn(async move {
            let mut last_seen = 0;
            while !done.load(Ordering::Acquire) {
                let snapshot = cell.load().expect("cell initialized before readers start");
                let generation = snapshot.current_epoch;
                assert_eq!(snapshot.entering_validators, generation);
                assert_eq!(snapshot.exiting_validators, generation);
                assert_eq!(snapshot.epochs.first().map(|e| e.epoch), Some(generation));
                assert!(generation >= last_seen, "published snapshots never go backwards here");
                last_seen = generation;
                reads.fetch_add(1, Ordering::Relaxed);
                tokio::task::yield_now().await;
            }
        }));
    }

    let writer = tokio::spawn(async move {
        for generation in 2..=GENERATIONS {
            repo.update(|data| {
                data.epochs.push(FixtureEpoch::new(generation, false));
                data.activation_queue = generation;
                data.exit_queue = generation;
            });
            assert!(builder.refresh().await);
        }
    });

    timeout(Duration::from_secs(30), writer).await.expect("writer finished").unwrap();
    done.store(true, Ordering::Release);
    for reader in readers {
        timeout(Duration::from_secs(5), reader).await.expect("reader finished").unwrap();
    }

    assert!(reads.load(Ordering::Relaxed) > 0);
    assert_eq!(cell.load().unwrap().current_epoch, GENERATIONS);
}
