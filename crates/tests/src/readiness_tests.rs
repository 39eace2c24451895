//! Initialization must not return until every gated worker has published once.
//!
//! These run on paused time: the pollers tick every second and the index builder every
//! ten seconds, and tokio auto-advances the clock whenever all tasks are idle.

use crate::mock_infrastructure::{start_runtime, test_config, ChainFixtureBuilder};
use explorer_core::{
    repository::{IndexRepository, Query},
    runtime::ExplorerRuntime,
};
use std::sync::Arc;
use tokio::time::{timeout, Duration, Instant};

#[tokio::test(start_paused = true)]
async fn test_start_blocks_until_failing_poller_succeeds() {
    const FAILURES: u32 = 5;

    let repo = ChainFixtureBuilder::new().epochs(0..=3).blocks(2).build_repository();
    repo.fail_times(Query::LatestSlot, FAILURES);

    let started_at = Instant::now();
    let mut runtime = start_runtime(test_config(), repo.clone()).await;

    // One immediate attempt, then one per second until the first success.
    assert!(repo.calls(Query::LatestSlot) > u64::from(FAILURES));
    assert!(started_at.elapsed() >= Duration::from_secs(u64::from(FAILURES)));
    assert_eq!(runtime.services().latest_slot(), Ok(97));

    runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_start_waits_for_index_builder() {
    let repo = ChainFixtureBuilder::new().epochs(0..=3).build_repository();
    repo.fail_times(Query::AverageBalance, 2);

    let started_at = Instant::now();
    let mut runtime = start_runtime(test_config(), repo.clone()).await;

    // Two failed index cycles at t=0 and t=10s, success at t=20s.
    assert!(started_at.elapsed() >= Duration::from_secs(20));
    assert!(repo.calls(Query::AverageBalance) >= 3);
    assert!(runtime.services().latest_index_snapshot().is_ok());

    runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_finalized_epoch_alone_does_not_release_start() {
    let repo = ChainFixtureBuilder::new().epochs(0..=3).finalized_through(2).build_repository();
    repo.fail_times(Query::LatestEpoch, 3);

    let mut runtime = start_runtime(test_config(), repo.clone()).await;

    assert!(repo.calls(Query::LatestEpoch) >= 4);
    assert_eq!(runtime.services().latest_epoch(), Ok(3));
    assert_eq!(runtime.services().latest_finalized_epoch(), Ok(2));

    runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_never_ready_when_a_source_always_fails() {
    let repo = ChainFixtureBuilder::new().epochs(0..=3).build_repository();
    repo.fail_always(Query::LatestProposedSlot);
    let repository: Arc<dyn IndexRepository> = repo.clone();

    let start = ExplorerRuntime::builder()
        .with_config(test_config())
        .with_repository(repository)
        .start();
    let result = timeout(Duration::from_secs(300), start).await;

    assert!(result.is_err(), "start must keep waiting while a gated worker never succeeds");
    assert!(repo.calls(Query::LatestProposedSlot) >= 100);
}
