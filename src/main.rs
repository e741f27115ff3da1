//! Health Router
//!
//! Discovers the replicas of each configured logical service, probes them on a
//! fixed cadence and publishes the healthy set.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌───────────┐   candidates   ┌──────────────────┐  snapshot   ┌────────────────┐
//!   │ discovery │───────────────▶│ snapshot engine  │────────────▶│ snapshot store │
//!   └───────────┘                │ (probe fan-out)  │             └───────┬────────┘
//!                                └────────┬─────────┘                     │
//!                                         │ tick                ┌─────────┴─────────┐
//!                                         ▼                     ▼                   ▼
//!                                ┌──────────────────┐   ┌──────────────┐   ┌─────────────────┐
//!                                │ registry         │◀──│ (push)       │   │ round robin     │
//!                                │ reconciler       │   └──────────────┘   │ + query API     │
//!                                └──────────────────┘                      └─────────────────┘
//! ```

use std::path::PathBuf;
use clap::Parser;

use health_router::config::{load_config, RouterConfig};
use health_router::lifecycle::{self, Mode, Shutdown};
use health_router::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "health-router")]
#[command(about = "Health-checked backend discovery with round-robin selection and registry reconciliation", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long, env = "HEALTH_ROUTER_CONFIG")]
    config: Option<PathBuf>,

    /// Which consumers of the health snapshots to run.
    #[arg(short, long, value_enum, default_value = "all")]
    mode: Mode,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("health-router v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        services = config.services.len(),
        interval_secs = config.health_check.interval_secs,
        timeout_secs = config.health_check.timeout_secs,
        namespace = %config.discovery.namespace,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let running = lifecycle::start_from_config(&config, cli.mode, &shutdown).await?;

    lifecycle::wait_for_signal().await;
    shutdown.trigger();
    running.wait().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
