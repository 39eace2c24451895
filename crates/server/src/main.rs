use anyhow::{Context, Result};
use explorer_core::{config::AppConfig, repository::PgRepository, runtime::ExplorerRuntime};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::{
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
};
use tokio::signal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the logging system based on the configuration.
///
/// `RUST_LOG` takes precedence; otherwise `logging.level` applies to the explorer crates
/// and everything else logs at `warn`.
fn init_logging(config: &AppConfig) {
    let default_filter = format!(
        "warn,explorer_core={level},server={level}",
        level = config.logging.level
    );
    let filter = EnvFilter::try_from_env("RUST_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format.as_str() == "json" {
        let fmt_layer = tracing_subscriber::fmt::layer().json();
        registry.with(fmt_layer).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_file(true)
            .with_line_number(true)
            .with_target(false);
        registry.with(fmt_layer).init();
    }
}

/// Installs the Prometheus recorder and its scrape listener when metrics are enabled.
fn init_metrics(config: &AppConfig) -> Result<()> {
    if !config.metrics.enabled {
        debug!("Metrics export disabled");
        return Ok(());
    }

    let Some(port) = config.metrics.prometheus_port else {
        warn!("Metrics enabled but no prometheus_port configured, skipping exporter");
        return Ok(());
    };

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus exporter")?;
    info!(%addr, "Prometheus exporter listening");

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {e}"))?;

    init_logging(&config);
    info!("Starting beacon explorer services");
    debug!(
        genesis_timestamp = config.chain.genesis_timestamp,
        seconds_per_slot = config.chain.seconds_per_slot,
        slots_per_epoch = config.chain.slots_per_epoch,
        secondary_updaters = config.services.enable_secondary_updaters,
        "Configuration loaded"
    );

    init_metrics(&config)?;

    let repository = PgRepository::connect(&config.database)
        .await
        .context("Failed to connect to the indexer database")?;

    // Readiness waits on the database with no upper bound, so stay interruptible.
    let start = ExplorerRuntime::builder()
        .with_config(config)
        .with_repository(Arc::new(repository))
        .start();
    let mut runtime = tokio::select! {
        result = start => result?,
        () = shutdown_signal() => {
            warn!("Shutdown requested before explorer services became ready");
            return Ok(());
        }
    };

    match runtime.services().latest_chain_state() {
        Ok(state) => info!(
            state = %serde_json::to_string(&state).unwrap_or_default(),
            "Explorer services ready"
        ),
        Err(e) => error!(error = %e, "Explorer services ready but chain state unavailable"),
    }

    shutdown_signal().await;
    runtime.shutdown().await;
    info!("Server shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(
                error = %e,
                "Failed to install Ctrl+C handler"
            );
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                error!(
                    error = %e,
                    "Failed to install signal handler"
                );

                () = std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, stopping refresh workers");
}
