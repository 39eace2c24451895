//! Beacon chain time model.
//!
//! The indexer stores slots and epochs as plain indices; the dashboard renders wall-clock
//! times. [`SlotClock`] converts between the two from the configured genesis timestamp,
//! slot duration and epoch length:
//!
//! ```text
//!  genesis_timestamp
//!        │ seconds_per_slot
//!        ▼◄────►
//!        ├──────┼──────┼──────┼── ... ──┼──────┼──────┤
//!        slot 0  slot 1 slot 2           slot 32
//!        └──────────── epoch 0 ─────────┘└── epoch 1 ...
//! ```

pub mod clock;

pub use clock::SlotClock;
