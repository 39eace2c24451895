//! One-shot countdown gate for startup readiness.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// Countdown gate released once every critical worker has completed a first successful cycle.
///
/// Each participant holds its own [`ReadinessSignal`]. Only the first
/// [`signal_once`](ReadinessSignal::signal_once) call on a handle decrements the count, so a
/// worker may call it after every successful cycle without tracking "first run" itself.
///
/// If a participant never succeeds, [`wait`](Self::wait) never returns. Surfacing that is
/// left to whoever monitors process startup.
///
/// # Example
///
/// ```
/// use explorer_core::snapshot::ReadinessBarrier;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let barrier = ReadinessBarrier::new(2);
/// let mut epoch = barrier.signal("epoch");
/// let mut slot = barrier.signal("slot");
///
/// epoch.signal_once();
/// epoch.signal_once();
/// assert_eq!(barrier.remaining(), 1);
///
/// slot.signal_once();
/// barrier.wait().await;
/// assert!(barrier.is_ready());
/// # }
/// ```
#[derive(Debug)]
pub struct ReadinessBarrier {
    remaining: watch::Sender<usize>,
    participants: usize,
}

impl ReadinessBarrier {
    /// Creates a barrier that opens after `participants` distinct signals.
    #[must_use]
    pub fn new(participants: usize) -> Arc<Self> {
        let (remaining, _) = watch::channel(participants);
        Arc::new(Self { remaining, participants })
    }

    /// Issues a signal handle for one participant.
    #[must_use]
    pub fn signal(self: &Arc<Self>, participant: &'static str) -> ReadinessSignal {
        ReadinessSignal { barrier: Arc::clone(self), participant, fired: false }
    }

    /// Number of participants that have not signalled yet.
    #[must_use]
    pub fn remaining(&self) -> usize {
        *self.remaining.borrow()
    }

    #[must_use]
    pub fn participants(&self) -> usize {
        self.participants
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.remaining() == 0
    }

    /// Waits until every participant has signalled.
    pub async fn wait(&self) {
        let mut rx = self.remaining.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|remaining| *remaining == 0).await;
    }

    fn release_one(&self, participant: &'static str) {
        let mut left = 0;
        self.remaining.send_modify(|remaining| {
            *remaining = remaining.saturating_sub(1);
            left = *remaining;
        });
        crate::metrics::record_readiness_remaining(left);

        if left == 0 {
            info!(participant, "readiness barrier released");
        } else {
            debug!(participant, remaining = left, "participant ready");
        }
    }
}

/// A participant's handle on a [`ReadinessBarrier`].
///
/// Owned by exactly one worker. `signal_once` takes `&mut self`, which keeps the first-call
/// bookkeeping free of synchronization.
#[derive(Debug)]
pub struct ReadinessSignal {
    barrier: Arc<ReadinessBarrier>,
    participant: &'static str,
    fired: bool,
}

impl ReadinessSignal {
    /// Counts this participant as ready. Calls after the first are no-ops.
    pub fn signal_once(&mut self) {
        if self.fired {
            return;
        }
        self.fired = true;
        self.barrier.release_one(self.participant);
    }

    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.fired
    }

    #[must_use]
    pub fn participant(&self) -> &'static str {
        self.participant
    }
}
