//! Integration tests for the runtime builder and lifecycle.
//!
//! Tests use `tokio::time::timeout` so a broken shutdown path fails instead of hanging.

use crate::mock_infrastructure::{start_runtime, test_config, wait_until, ChainFixtureBuilder};
use explorer_core::{
    repository::{fixture::FixtureRepository, IndexRepository, Query},
    runtime::{ExplorerRuntime, RuntimeError, GATED_WORKERS},
};
use std::sync::Arc;
use tokio::time::{sleep, timeout, Duration};

#[tokio::test]
async fn test_builder_rejects_invalid_configuration() {
    let mut config = test_config();
    config.chain.seconds_per_slot = 0;
    let repository: Arc<dyn IndexRepository> = Arc::new(FixtureRepository::default());

    let result =
        ExplorerRuntime::builder().with_config(config).with_repository(repository).start().await;

    match result {
        Err(RuntimeError::ConfigValidation(message)) => {
            assert!(message.contains("Seconds per slot"));
        }
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("invalid configuration must be rejected"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_secondary_updaters_publish_after_readiness() {
    let repo = ChainFixtureBuilder::new()
        .epochs(0..=5)
        .finalized_through(3)
        .validator_queues(2, 0)
        .build_repository();
    let mut runtime = start_runtime(test_config(), repo.clone()).await;
    assert_eq!(runtime.worker_count(), GATED_WORKERS + 2);

    let services = runtime.services().clone();
    assert!(
        wait_until(Duration::from_secs(5), || {
            services.latest_stats().is_ok() && services.latest_charts().is_ok()
        })
        .await
    );

    let stats = services.latest_stats().unwrap();
    assert_eq!(stats.epoch, 5);
    assert_eq!(stats.pending_validator_count, 2);
    assert_eq!(services.latest_charts().unwrap().participation_rate.len(), 6);

    runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_secondary_updaters_can_be_disabled() {
    let repo = ChainFixtureBuilder::new().epochs(0..=2).build_repository();
    let repository: Arc<dyn IndexRepository> = repo.clone();
    let mut runtime = ExplorerRuntime::builder()
        .with_config(test_config())
        .with_repository(repository)
        .disable_secondary_updaters()
        .start()
        .await
        .unwrap();

    assert_eq!(runtime.worker_count(), GATED_WORKERS);
    sleep(Duration::from_secs(120)).await;
    assert!(runtime.services().latest_stats().is_err());
    assert_eq!(repo.calls(Query::DepositStats), 0);

    runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_secondary_failures_do_not_affect_gated_cells() {
    let repo = ChainFixtureBuilder::new().epochs(0..=2).build_repository();
    repo.fail_always(Query::ParticipationHistory);
    repo.fail_always(Query::ValidatorStats);

    let mut runtime = start_runtime(test_config(), repo.clone()).await;
    sleep(Duration::from_secs(90)).await;

    let services = runtime.services();
    assert!(services.latest_charts().is_err());
    assert!(services.latest_stats().is_err());
    assert_eq!(services.latest_epoch(), Ok(2));
    assert!(repo.calls(Query::ParticipationHistory) >= 2);

    runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_all_workers() {
    let repo = ChainFixtureBuilder::new().epochs(0..=2).build_repository();
    let mut runtime = start_runtime(test_config(), repo.clone()).await;

    timeout(Duration::from_secs(5), runtime.shutdown()).await.expect("shutdown completes");
    assert_eq!(runtime.worker_count(), 0);

    let calls = repo.calls(Query::LatestEpoch);
    sleep(Duration::from_secs(30)).await;
    assert_eq!(repo.calls(Query::LatestEpoch), calls, "no polling after shutdown");

    // Cells stay readable with their last values.
    assert_eq!(runtime.services().latest_epoch(), Ok(2));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_receivers_are_notified() {
    let repo = ChainFixtureBuilder::new().build_repository();
    let mut runtime = start_runtime(test_config(), repo).await;

    let mut receivers: Vec<_> = (0..3).map(|_| runtime.shutdown_receiver()).collect();
    runtime.shutdown().await;

    for rx in &mut receivers {
        let received = timeout(Duration::from_secs(1), rx.recv()).await;
        assert!(matches!(received, Ok(Ok(()))));
    }
}
