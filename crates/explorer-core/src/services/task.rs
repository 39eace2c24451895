//! Interval-driven refresh loop shared by every background worker.

use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::{
    sync::broadcast,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, info};

/// One periodic unit of work: a poller, the index builder, or a secondary updater.
///
/// `refresh` runs one cycle and reports whether it published. Failures are logged by the
/// implementation; the loop only records the outcome and waits for the next tick.
#[async_trait]
pub trait RefreshTask: Send + 'static {
    fn name(&self) -> &'static str;

    fn interval(&self) -> Duration;

    async fn refresh(&mut self) -> bool;
}

/// Spawns `task` on its own interval until a shutdown signal arrives.
///
/// The first cycle runs immediately. Ticks missed while a slow cycle is in flight are
/// skipped rather than replayed in a burst. A cycle still in flight when shutdown arrives
/// is dropped, which cancels its pending query.
#[must_use]
pub fn spawn_refresh_task<T: RefreshTask>(
    mut task: T,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let name = task.name();
        let period = task.interval();
        info!(task = name, interval_ms = period.as_millis(), "starting refresh task");

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let started = Instant::now();
                    tokio::select! {
                        published = task.refresh() => {
                            crate::metrics::record_refresh(name, published, started.elapsed());
                            debug!(task = name, published, "refresh cycle finished");
                        }
                        _ = shutdown_rx.recv() => {
                            info!(task = name, "refresh task shutting down mid-cycle");
                            break;
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!(task = name, "refresh task shutting down");
                    break;
                }
            }
        }
    })
}
