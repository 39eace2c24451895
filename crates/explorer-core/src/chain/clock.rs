//! Slot and epoch to wall-clock conversion.

use crate::config::ChainConfig;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Converts between slot/epoch indices and wall-clock time.
///
/// `Copy` and free of interior state; every worker keeps its own copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotClock {
    genesis_timestamp: u64,
    seconds_per_slot: u64,
    slots_per_epoch: u64,
}

/// Converts unix seconds to a UTC timestamp, saturating at the representable range.
fn unix_seconds_to_time(seconds: u64) -> DateTime<Utc> {
    i64::try_from(seconds)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

impl SlotClock {
    /// Creates a clock. Zero slot durations or epoch lengths are treated as one.
    #[must_use]
    pub fn new(genesis_timestamp: u64, seconds_per_slot: u64, slots_per_epoch: u64) -> Self {
        Self {
            genesis_timestamp,
            seconds_per_slot: seconds_per_slot.max(1),
            slots_per_epoch: slots_per_epoch.max(1),
        }
    }

    #[must_use]
    pub fn from_config(chain: &ChainConfig) -> Self {
        Self::new(chain.genesis_timestamp, chain.seconds_per_slot, chain.slots_per_epoch)
    }

    #[must_use]
    pub fn genesis_time(&self) -> DateTime<Utc> {
        unix_seconds_to_time(self.genesis_timestamp)
    }

    /// Returns whether `now` is before the start of slot 0.
    #[must_use]
    pub fn is_pre_genesis(&self, now: DateTime<Utc>) -> bool {
        self.genesis_time() > now
    }

    /// Start time of `slot`.
    #[must_use]
    pub fn slot_to_time(&self, slot: u64) -> DateTime<Utc> {
        let offset = slot.saturating_mul(self.seconds_per_slot);
        unix_seconds_to_time(self.genesis_timestamp.saturating_add(offset))
    }

    /// Start time of the first slot of `epoch`.
    #[must_use]
    pub fn epoch_to_time(&self, epoch: u64) -> DateTime<Utc> {
        self.slot_to_time(epoch.saturating_mul(self.slots_per_epoch))
    }

    /// Slot in progress at `time`. Times before genesis map to slot 0.
    #[must_use]
    pub fn time_to_slot(&self, time: DateTime<Utc>) -> u64 {
        let Ok(timestamp) = u64::try_from(time.timestamp()) else {
            return 0;
        };
        timestamp.saturating_sub(self.genesis_timestamp) / self.seconds_per_slot
    }

    /// First slot that must not be listed yet: the slot in progress `buffer` after `now`.
    ///
    /// Blocks at or beyond this slot may still be mid-ingestion, so queries select strictly
    /// below it.
    #[must_use]
    pub fn cutoff_slot(&self, now: DateTime<Utc>, buffer: Duration) -> u64 {
        let buffer =
            chrono::Duration::from_std(buffer).unwrap_or_else(|_| chrono::Duration::zero());
        self.time_to_slot(now.checked_add_signed(buffer).unwrap_or(now))
    }

    #[must_use]
    pub fn slots_per_epoch(&self) -> u64 {
        self.slots_per_epoch
    }

    #[must_use]
    pub fn seconds_per_slot(&self) -> u64 {
        self.seconds_per_slot
    }
}
