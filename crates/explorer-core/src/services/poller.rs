//! Chain head pollers.
//!
//! Each poller owns one or more scalar cells and refreshes them from a single-value query
//! every second. Targets are independent: a failed query leaves its own cell untouched and
//! does not stop the remaining targets of the same cycle.

use super::task::RefreshTask;
use crate::{
    chain::SlotClock,
    repository::{IndexRepository, RepositoryError},
    snapshot::{ReadinessSignal, SnapshotCell},
};
use async_trait::async_trait;
use chrono::Utc;
use std::{sync::Arc, time::Duration};
use tracing::{error, trace};

/// The scalar a poller target reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadQuery {
    LatestEpoch,
    LatestFinalizedEpoch,
    /// Newest indexed slot below the clock cutoff.
    LatestSlot,
    LatestProposedSlot,
}

impl HeadQuery {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LatestEpoch => "latest_epoch",
            Self::LatestFinalizedEpoch => "latest_finalized_epoch",
            Self::LatestSlot => "latest_slot",
            Self::LatestProposedSlot => "latest_proposed_slot",
        }
    }
}

/// One query and the cell its result is published to.
pub struct HeadTarget {
    pub query: HeadQuery,
    pub cell: Arc<SnapshotCell<u64>>,
    /// Whether the first success of this target releases the poller's readiness signal.
    pub gates_readiness: bool,
}

impl HeadTarget {
    #[must_use]
    pub fn new(query: HeadQuery, cell: Arc<SnapshotCell<u64>>) -> Self {
        Self { query, cell, gates_readiness: true }
    }

    #[must_use]
    pub fn non_gating(query: HeadQuery, cell: Arc<SnapshotCell<u64>>) -> Self {
        Self { query, cell, gates_readiness: false }
    }
}

pub struct ChainHeadPoller {
    name: &'static str,
    repository: Arc<dyn IndexRepository>,
    clock: SlotClock,
    cutoff_buffer: Duration,
    interval: Duration,
    targets: Vec<HeadTarget>,
    readiness: Option<ReadinessSignal>,
}

impl ChainHeadPoller {
    #[must_use]
    pub fn new(
        name: &'static str,
        repository: Arc<dyn IndexRepository>,
        clock: SlotClock,
        interval: Duration,
    ) -> Self {
        Self {
            name,
            repository,
            clock,
            cutoff_buffer: Duration::from_secs(10),
            interval,
            targets: Vec::new(),
            readiness: None,
        }
    }

    #[must_use]
    pub fn with_target(mut self, target: HeadTarget) -> Self {
        self.targets.push(target);
        self
    }

    /// How far ahead of wall-clock time the slot cutoff is placed.
    #[must_use]
    pub fn with_cutoff_buffer(mut self, buffer: Duration) -> Self {
        self.cutoff_buffer = buffer;
        self
    }

    #[must_use]
    pub fn with_readiness(mut self, signal: ReadinessSignal) -> Self {
        self.readiness = Some(signal);
        self
    }

    async fn execute(&self, query: HeadQuery) -> Result<u64, RepositoryError> {
        match query {
            HeadQuery::LatestEpoch => self.repository.latest_epoch().await,
            HeadQuery::LatestFinalizedEpoch => self.repository.latest_finalized_epoch().await,
            HeadQuery::LatestSlot => {
                let cutoff = self.clock.cutoff_slot(Utc::now(), self.cutoff_buffer);
                self.repository.latest_slot_before(cutoff).await
            }
            HeadQuery::LatestProposedSlot => self.repository.latest_proposed_slot().await,
        }
    }
}

#[async_trait]
impl RefreshTask for ChainHeadPoller {
    fn name(&self) -> &'static str {
        self.name
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn refresh(&mut self) -> bool {
        let mut all_ok = true;
        let mut release = false;

        for target in &self.targets {
            match self.execute(target.query).await {
                Ok(value) => {
                    target.cell.store(value);
                    trace!(
                        poller = self.name,
                        query = target.query.as_str(),
                        value,
                        "head value stored"
                    );
                    release |= target.gates_readiness;
                }
                Err(e) => {
                    all_ok = false;
                    error!(
                        poller = self.name,
                        query = target.query.as_str(),
                        error = %e,
                        "error retrieving chain head value"
                    );
                }
            }
        }

        if release {
            if let Some(signal) = self.readiness.as_mut() {
                signal.signal_once();
            }
        }

        all_ok
    }
}
