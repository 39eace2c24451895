//! Metrics derived from already-published head values. Pure, never fail.

use crate::chain::SlotClock;
use chrono::{DateTime, Duration, Utc};

/// How far the head epoch may lag wall-clock time before the node counts as syncing.
pub const SYNC_LAG_THRESHOLD_SECONDS: i64 = 600;

/// Epochs between the head and the newest finalized epoch.
#[must_use]
pub fn finalization_delay(latest_epoch: u64, latest_finalized_epoch: u64) -> u64 {
    latest_epoch.saturating_sub(latest_finalized_epoch)
}

/// `true` when the head epoch started more than [`SYNC_LAG_THRESHOLD_SECONDS`] before `now`.
#[must_use]
pub fn is_syncing(now: DateTime<Utc>, clock: &SlotClock, latest_epoch: u64) -> bool {
    let horizon = now
        .checked_sub_signed(Duration::seconds(SYNC_LAG_THRESHOLD_SECONDS))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    horizon > clock.epoch_to_time(latest_epoch)
}
