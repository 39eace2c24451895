//! Single-value snapshot holder with atomic whole-value replacement.

use arc_swap::ArcSwapOption;
use std::{fmt, sync::Arc};
use thiserror::Error;
use tracing::trace;

/// Errors returned when reading a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// The snapshot was read before its owning worker published a first value.
    ///
    /// This cannot happen once the runtime has reported ready; seeing it means a reader
    /// was wired up before `ExplorerRuntimeBuilder::start` returned.
    #[error("snapshot '{snapshot}' read before its first publish")]
    Uninitialized { snapshot: &'static str },
}

/// Atomically swapped holder for one published value.
///
/// # Thread Safety
///
/// Backed by [`ArcSwapOption`]. `store` publishes a fully built value in one pointer swap,
/// so a concurrent `load` returns either the previous value or the new one, never a mix.
/// Reads take no lock and never wait on the writer.
///
/// The cell is designed for a single writer. Nothing prevents two writers from racing, but
/// the last store simply wins; the readiness bookkeeping in the services layer assumes one
/// owner per cell.
///
/// # Example
///
/// ```
/// use explorer_core::snapshot::{SnapshotCell, SnapshotError};
///
/// let cell = SnapshotCell::new("latest_epoch");
/// assert_eq!(cell.get(), Err(SnapshotError::Uninitialized { snapshot: "latest_epoch" }));
///
/// cell.store(42_u64);
/// assert_eq!(cell.get(), Ok(42));
/// ```
pub struct SnapshotCell<T> {
    name: &'static str,
    value: ArcSwapOption<T>,
}

impl<T> SnapshotCell<T> {
    /// Creates an empty cell. `name` identifies the cell in errors and logs.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self { name, value: ArcSwapOption::empty() }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Replaces the held value.
    pub fn store(&self, value: T) {
        self.store_arc(Arc::new(value));
    }

    /// Replaces the held value with an already shared one.
    pub fn store_arc(&self, value: Arc<T>) {
        self.value.store(Some(value));
        trace!(snapshot = self.name, "snapshot published");
    }

    /// Returns the most recently stored value.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Uninitialized`] if nothing has been stored yet.
    pub fn load(&self) -> Result<Arc<T>, SnapshotError> {
        self.value.load_full().ok_or(SnapshotError::Uninitialized { snapshot: self.name })
    }

    /// Returns whether at least one value has been published.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.value.load().is_some()
    }
}

impl<T: Copy> SnapshotCell<T> {
    /// Copies the held value out without cloning the `Arc`.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Uninitialized`] if nothing has been stored yet.
    pub fn get(&self) -> Result<T, SnapshotError> {
        let guard = self.value.load();
        let value: &Option<Arc<T>> = &guard;
        value
            .as_deref()
            .copied()
            .ok_or(SnapshotError::Uninitialized { snapshot: self.name })
    }
}

impl<T> fmt::Debug for SnapshotCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotCell")
            .field("name", &self.name)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    let _ = assert_send_sync::<SnapshotCell<u64>>;
};
