//! Startup orchestration.
//!
//! # Responsibilities
//! - Build discovery, probe and registry from the validated config
//! - Start the snapshot engine and, per mode, the query server and reconciler
//! - Bind the listener before any task starts, so a bind failure is still fatal
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Every task subscribes to shutdown before it is spawned

use std::net::SocketAddr;
use std::sync::Arc;
use clap::ValueEnum;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::RouterConfig;
use crate::discovery::{self, DiscoveryClient, DiscoveryError};
use crate::health::{HttpProbe, Probe, SnapshotEngine};
use crate::http::{AppState, QueryServer};
use crate::lifecycle::Shutdown;
use crate::load_balancer::RoundRobinSelector;
use crate::registry::{self, Reconciler, RegistryError, RoutingRegistry};
use crate::snapshot::SnapshotStore;

/// Which consumers of the snapshot store this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Snapshot engine + query interface.
    Serve,
    /// Snapshot engine + registry reconciler.
    Reconcile,
    /// Everything.
    All,
}

impl Mode {
    pub fn serves(self) -> bool {
        matches!(self, Mode::Serve | Mode::All)
    }

    pub fn reconciles(self) -> bool {
        matches!(self, Mode::Reconcile | Mode::All)
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("discovery setup failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("registry setup failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("mode {0:?} needs a routing registry")]
    MissingRegistry(Mode),
}

/// Handles to the started tasks.
pub struct Running {
    pub store: Arc<SnapshotStore>,
    pub query_addr: Option<SocketAddr>,
    handles: Vec<JoinHandle<()>>,
}

impl Running {
    /// Wait for every task to exit.
    pub async fn wait(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Task ended abnormally");
            }
        }
    }
}

/// Build collaborators from config and start.
pub async fn start_from_config(
    config: &RouterConfig,
    mode: Mode,
    shutdown: &Shutdown,
) -> Result<Running, StartupError> {
    let discovery = discovery::from_config(&config.discovery)?;
    let probe: Arc<dyn Probe> = Arc::new(HttpProbe::from_config(&config.health_check));
    let registry = if mode.reconciles() {
        Some(registry::from_config(config)?)
    } else {
        None
    };
    start(config, mode, discovery, probe, registry, shutdown).await
}

/// Start the engine and the consumers `mode` asks for.
pub async fn start(
    config: &RouterConfig,
    mode: Mode,
    discovery: Arc<dyn DiscoveryClient>,
    probe: Arc<dyn Probe>,
    registry: Option<Arc<dyn RoutingRegistry>>,
    shutdown: &Shutdown,
) -> Result<Running, StartupError> {
    let engine = SnapshotEngine::new(config, discovery, probe);
    let store = engine.store();
    let mut handles = Vec::new();

    let listener = if mode.serves() {
        let addr = &config.listener.bind_address;
        let listener = TcpListener::bind(addr).await.map_err(|source| StartupError::Bind {
            addr: addr.clone(),
            source,
        })?;
        Some(listener)
    } else {
        None
    };
    let query_addr = listener.as_ref().and_then(|l| l.local_addr().ok());

    if mode.reconciles() {
        let registry = registry.ok_or(StartupError::MissingRegistry(mode))?;
        let reconciler = Reconciler::new(store.clone(), registry, config.registry.mode);
        let ticks = engine.subscribe();
        let stop = shutdown.subscribe();
        handles.push(tokio::spawn(reconciler.run(ticks, stop)));
    }

    if let Some(listener) = listener {
        let state = AppState {
            selector: Arc::new(RoundRobinSelector::new(store.clone())),
            states: engine.states(),
            ticks: engine.subscribe(),
        };
        let server = QueryServer::new(&config.listener, state);
        let stop = shutdown.subscribe();
        handles.push(tokio::spawn(async move {
            if let Err(e) = server.run(listener, stop).await {
                tracing::error!(error = %e, "Query interface failed");
            }
        }));
    }

    let stop = shutdown.subscribe();
    handles.push(tokio::spawn(engine.run(stop)));

    tracing::info!(mode = ?mode, services = config.services.len(), "Health router started");
    Ok(Running {
        store,
        query_addr,
        handles,
    })
}
