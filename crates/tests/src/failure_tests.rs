//! Transient query failures after startup degrade to stale, never partial, data.

use crate::mock_infrastructure::{start_runtime, test_config, wait_until, ChainFixtureBuilder};
use explorer_core::repository::{fixture::FixtureEpoch, Query};
use std::sync::Arc;
use tokio::time::{sleep, Duration};

#[tokio::test(start_paused = true)]
async fn test_head_cells_keep_last_value_while_query_fails() {
    let repo = ChainFixtureBuilder::new().epochs(0..=10).finalized_through(8).build_repository();
    let mut runtime = start_runtime(test_config(), repo.clone()).await;
    let services = runtime.services().clone();

    repo.fail_always(Query::LatestEpoch);
    repo.update(|data| data.epochs.push(FixtureEpoch::new(11, false)));
    sleep(Duration::from_secs(5)).await;

    assert_eq!(services.latest_epoch(), Ok(10));
    assert_eq!(services.finalization_delay(), Ok(2));

    repo.recover(Query::LatestEpoch);
    assert!(wait_until(Duration::from_secs(5), || services.latest_epoch() == Ok(11)).await);
    assert_eq!(services.finalization_delay(), Ok(3));

    runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_index_snapshot_is_not_partially_updated() {
    let repo = ChainFixtureBuilder::new()
        .epochs(0..=10)
        .validator_queues(3, 3)
        .build_repository();
    let mut runtime = start_runtime(test_config(), repo.clone()).await;
    let services = runtime.services().clone();
    let before = services.latest_index_snapshot().unwrap();

    // Queue counts are read before the history; the history read fails, so the new
    // queue counts must not surface.
    repo.update(|data| {
        data.activation_queue = 42;
        data.exit_queue = 42;
    });
    repo.fail_always(Query::EpochHistory);
    sleep(Duration::from_secs(35)).await;

    let during = services.latest_index_snapshot().unwrap();
    assert!(Arc::ptr_eq(&before, &during));
    assert_eq!(during.entering_validators, 3);

    repo.recover(Query::EpochHistory);
    assert!(
        wait_until(Duration::from_secs(15), || {
            services.latest_index_snapshot().is_ok_and(|s| s.entering_validators == 42)
        })
        .await
    );

    runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_one_failing_poller_does_not_stall_the_others() {
    let repo = ChainFixtureBuilder::new().epochs(0..=4).blocks(1).build_repository();
    let mut runtime = start_runtime(test_config(), repo.clone()).await;
    let services = runtime.services().clone();

    repo.fail_always(Query::LatestProposedSlot);
    repo.update(|data| data.push_block(129, 32, "1", 7));

    assert!(wait_until(Duration::from_secs(5), || services.latest_slot() == Ok(129)).await);
    assert_eq!(services.latest_proposed_slot(), Ok(128));

    runtime.shutdown().await;
}
