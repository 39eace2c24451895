//! # Explorer Core
//!
//! Background snapshot-refresh engine behind the beacon chain explorer dashboard.
//!
//! The dashboard serves derived chain state to many concurrent request handlers. Those
//! handlers never talk to the database: they read immutable snapshots that background
//! workers refresh on fixed intervals and publish through lock-free cells.
//!
//! - **[`snapshot`]**: the publication primitives, [`SnapshotCell`](snapshot::SnapshotCell)
//!   (atomic whole-value replacement) and [`ReadinessBarrier`](snapshot::ReadinessBarrier)
//!   (startup gate).
//!
//! - **[`services`]**: the refresh workers (chain head pollers, index snapshot builder,
//!   charts and stats updaters), the genesis tracker, and [`ExplorerServices`], the handle
//!   the request layer reads from.
//!
//! - **[`repository`]**: the read-only query interface over the indexer database, with a
//!   Postgres implementation.
//!
//! - **[`chain`]**: slot and epoch time conversion.
//!
//! - **[`runtime`]**: initialization, the readiness wait, and graceful shutdown.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         ExplorerRuntime                          │
//! │                                                                  │
//! │  gated (readiness barrier, 4)            secondary (not gated)   │
//! │  ┌──────────────┐ ┌─────────────┐        ┌──────────────┐        │
//! │  │ epoch poller │ │ slot poller │        │ charts       │        │
//! │  └──────┬───────┘ └──────┬──────┘        │ updater      │        │
//! │  ┌──────┴─────────┐ ┌────┴──────────┐    └──────┬───────┘        │
//! │  │ proposed slot  │ │ index builder │    ┌──────┴───────┐        │
//! │  │ poller         │ │ (+ genesis)   │    │ stats updater│        │
//! │  └──────┬─────────┘ └────┬──────────┘    └──────┬───────┘        │
//! │         │ store          │ store                │ store          │
//! │  ┌──────▼────────────────▼──────────────────────▼────────────┐   │
//! │  │           ExplorerServices (SnapshotCell per slot)        │   │
//! │  └──────────────────────────┬────────────────────────────────┘   │
//! └─────────────────────────────┼────────────────────────────────────┘
//!                               │ load (wait-free)
//!                               ▼
//!                     request handlers (external)
//! ```

pub mod chain;
pub mod config;
pub mod metrics;
pub mod repository;
pub mod runtime;
pub mod services;
pub mod snapshot;
pub mod types;

pub use services::ExplorerServices;
