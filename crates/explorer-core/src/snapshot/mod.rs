//! Snapshot publication primitives.
//!
//! Every piece of state served to the request layer lives in a [`SnapshotCell`]. Each cell
//! has exactly one writer (the background worker that owns it) and any number of readers.
//! Writers replace the whole value; readers load an `Arc` to whichever complete value was
//! published last. Reads are wait-free and never observe a mixture of two publishes.
//!
//! Startup is gated by a [`ReadinessBarrier`]: the runtime does not report ready until every
//! critical worker has published at least once, so readers never see an empty cell in
//! steady state.
//!
//! ```text
//!  worker ──store(Arc<T>)──► ArcSwapOption<T> ◄──load()── reader
//!                                   │                     reader
//!                            None until first             reader
//!                            successful cycle
//! ```

pub mod barrier;
pub mod cell;

pub use barrier::{ReadinessBarrier, ReadinessSignal};
pub use cell::{SnapshotCell, SnapshotError};
