//! # Refresh Metrics
//!
//! Prometheus-style instrumentation for the background refresh workers, recorded through the
//! `metrics` facade. Nothing here allocates on the read path; only workers record.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `explorer_refresh_total` | counter | `task`, `outcome` (`success` / `failure`) |
//! | `explorer_refresh_duration_seconds` | histogram | `task` |
//! | `explorer_snapshot_published_timestamp` | gauge | `task` |
//! | `explorer_readiness_remaining` | gauge | |
//!
//! Without an installed recorder (tests, embedded use) every call is a no-op.

use metrics::{counter, gauge, histogram};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Records the outcome and duration of one refresh cycle.
pub fn record_refresh(task: &'static str, success: bool, elapsed: Duration) {
    let outcome = if success { "success" } else { "failure" };
    counter!("explorer_refresh_total", "task" => task, "outcome" => outcome).increment(1);
    histogram!("explorer_refresh_duration_seconds", "task" => task).record(elapsed.as_secs_f64());

    if success {
        #[allow(clippy::cast_precision_loss)]
        let now = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
            as f64;
        gauge!("explorer_snapshot_published_timestamp", "task" => task).set(now);
    }
}

/// Records how many critical workers still have to complete a first cycle.
pub fn record_readiness_remaining(remaining: usize) {
    #[allow(clippy::cast_precision_loss)]
    let remaining = remaining as f64;
    gauge!("explorer_readiness_remaining").set(remaining);
}
