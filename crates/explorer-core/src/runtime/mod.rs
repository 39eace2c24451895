//! Explorer runtime initialization and lifecycle management.
//!
//! Initialization starts the three chain head pollers and the index builder together,
//! blocks until each of them has published once, and only then starts the charts and
//! stats updaters. The returned [`ExplorerRuntime`] therefore never hands out a read handle
//! whose gated cells are still empty.
//!
//! ```no_run
//! use explorer_core::{config::AppConfig, repository::PgRepository, runtime::ExplorerRuntime};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let repository = Arc::new(PgRepository::connect(&config.database).await?);
//!
//!     let runtime = ExplorerRuntime::builder()
//!         .with_config(config)
//!         .with_repository(repository)
//!         .start()
//!         .await?;
//!
//!     let services = runtime.services().clone();
//!     // ... hand `services` to request handlers ...
//!
//!     runtime.wait_for_shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod lifecycle;

pub use builder::{ExplorerRuntimeBuilder, RuntimeError, GATED_WORKERS};
pub use lifecycle::ExplorerRuntime;
