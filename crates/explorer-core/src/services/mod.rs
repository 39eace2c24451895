//! Background refresh workers and the read handle they publish to.
//!
//! [`ExplorerServices`] owns every snapshot cell. Workers get `Arc` clones of the cells they
//! write; request handlers get a clone of the whole handle and read through its accessors.
//! Each cell has exactly one writer.
//!
//! | Cell | Writer | Gates readiness |
//! |------|--------|-----------------|
//! | latest epoch, latest finalized epoch | epoch poller | yes (latest epoch) |
//! | latest slot | slot poller | yes |
//! | latest proposed slot | proposed slot poller | yes |
//! | index snapshot | index builder | yes |
//! | charts | charts updater | no |
//! | stats | stats updater | no |

pub mod charts;
pub mod derived;
pub mod format;
pub mod genesis;
pub mod index;
pub mod poller;
pub mod stats;
pub mod task;

use crate::{
    chain::SlotClock,
    config::AppConfig,
    snapshot::{SnapshotCell, SnapshotError},
    types::{ChartsSnapshot, IndexSnapshot, LatestState, StatsSnapshot},
};
use chrono::Utc;
use std::sync::Arc;

pub use charts::ChartsUpdater;
pub use genesis::GenesisTracker;
pub use index::IndexSnapshotBuilder;
pub use poller::{ChainHeadPoller, HeadQuery, HeadTarget};
pub use stats::StatsUpdater;
pub use task::{spawn_refresh_task, RefreshTask};

/// Read handle over every published snapshot.
///
/// Cheap to clone. Accessors never block and never touch the database; they fail only with
/// [`SnapshotError::Uninitialized`] when the owning worker has not published yet, which
/// cannot happen for the gated cells once the runtime has started.
#[derive(Debug, Clone)]
pub struct ExplorerServices {
    pub(crate) latest_epoch: Arc<SnapshotCell<u64>>,
    pub(crate) latest_finalized_epoch: Arc<SnapshotCell<u64>>,
    pub(crate) latest_slot: Arc<SnapshotCell<u64>>,
    pub(crate) latest_proposed_slot: Arc<SnapshotCell<u64>>,
    pub(crate) index: Arc<SnapshotCell<IndexSnapshot>>,
    pub(crate) charts: Arc<SnapshotCell<ChartsSnapshot>>,
    pub(crate) stats: Arc<SnapshotCell<StatsSnapshot>>,
    clock: SlotClock,
    config: Arc<AppConfig>,
}

impl ExplorerServices {
    /// Creates a handle with every cell empty.
    #[must_use]
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            latest_epoch: Arc::new(SnapshotCell::new("latest_epoch")),
            latest_finalized_epoch: Arc::new(SnapshotCell::new("latest_finalized_epoch")),
            latest_slot: Arc::new(SnapshotCell::new("latest_slot")),
            latest_proposed_slot: Arc::new(SnapshotCell::new("latest_proposed_slot")),
            index: Arc::new(SnapshotCell::new("index")),
            charts: Arc::new(SnapshotCell::new("charts")),
            stats: Arc::new(SnapshotCell::new("stats")),
            clock: SlotClock::from_config(&config.chain),
            config,
        }
    }

    #[must_use]
    pub fn clock(&self) -> &SlotClock {
        &self.clock
    }

    #[must_use]
    pub fn config(&self) -> &Arc<AppConfig> {
        &self.config
    }

    /// # Errors
    /// [`SnapshotError::Uninitialized`] before the first successful poll.
    pub fn latest_epoch(&self) -> Result<u64, SnapshotError> {
        self.latest_epoch.get()
    }

    /// # Errors
    /// [`SnapshotError::Uninitialized`] before the first successful poll.
    pub fn latest_finalized_epoch(&self) -> Result<u64, SnapshotError> {
        self.latest_finalized_epoch.get()
    }

    /// # Errors
    /// [`SnapshotError::Uninitialized`] before the first successful poll.
    pub fn latest_slot(&self) -> Result<u64, SnapshotError> {
        self.latest_slot.get()
    }

    /// # Errors
    /// [`SnapshotError::Uninitialized`] before the first successful poll.
    pub fn latest_proposed_slot(&self) -> Result<u64, SnapshotError> {
        self.latest_proposed_slot.get()
    }

    /// Head epoch minus finalized epoch, read from the two head cells.
    ///
    /// The two cells are refreshed independently, so this can differ from the finality
    /// delay inside the index snapshot, which is computed from one history read.
    ///
    /// # Errors
    /// [`SnapshotError::Uninitialized`] if either cell is empty.
    pub fn finalization_delay(&self) -> Result<u64, SnapshotError> {
        Ok(derived::finalization_delay(self.latest_epoch()?, self.latest_finalized_epoch()?))
    }

    /// # Errors
    /// [`SnapshotError::Uninitialized`] before the first published index snapshot.
    pub fn latest_index_snapshot(&self) -> Result<Arc<IndexSnapshot>, SnapshotError> {
        self.index.load()
    }

    /// # Errors
    /// [`SnapshotError::Uninitialized`] until the stats updater has published.
    pub fn latest_stats(&self) -> Result<Arc<StatsSnapshot>, SnapshotError> {
        self.stats.load()
    }

    /// # Errors
    /// [`SnapshotError::Uninitialized`] until the charts updater has published.
    pub fn latest_charts(&self) -> Result<Arc<ChartsSnapshot>, SnapshotError> {
        self.charts.load()
    }

    /// Whether the indexed head lags wall-clock time by more than ten minutes.
    ///
    /// # Errors
    /// [`SnapshotError::Uninitialized`] before the first successful epoch poll.
    pub fn is_syncing(&self) -> Result<bool, SnapshotError> {
        Ok(derived::is_syncing(Utc::now(), &self.clock, self.latest_epoch()?))
    }

    /// Composite view over the head cells. Each field is read independently.
    ///
    /// # Errors
    /// [`SnapshotError::Uninitialized`] if any head cell is empty.
    pub fn latest_chain_state(&self) -> Result<LatestState, SnapshotError> {
        let current_epoch = self.latest_epoch()?;
        let current_finalized_epoch = self.latest_finalized_epoch()?;

        Ok(LatestState {
            current_epoch,
            current_slot: self.latest_slot()?,
            current_finalized_epoch,
            last_proposed_slot: self.latest_proposed_slot()?,
            finality_delay: derived::finalization_delay(current_epoch, current_finalized_epoch),
            is_syncing: derived::is_syncing(Utc::now(), &self.clock, current_epoch),
        })
    }
}
