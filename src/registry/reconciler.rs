//! Registry reconciler.
//!
//! # Responsibilities
//! - After every completed tick, push each service's snapshot into the registry
//! - Clear entries whose snapshot is empty
//! - Report write failures and leave the retry to the next tick

use std::sync::Arc;
use futures_util::future::join_all;
use tokio::sync::{broadcast, watch};
use crate::config::ReconcileMode;
use crate::observability::metrics;
use crate::registry::RoutingRegistry;
use crate::snapshot::SnapshotStore;

/// What happened to one service's registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Entry overwritten with this many addresses.
    Written(usize),
    /// Entry already matched the snapshot; no write issued.
    Unchanged,
    /// No snapshot yet; nothing to push.
    NotProbed,
    /// Write failed; retried next tick.
    Failed(String),
}

/// Pushes snapshots into a routing registry.
pub struct Reconciler {
    store: Arc<SnapshotStore>,
    registry: Arc<dyn RoutingRegistry>,
    mode: ReconcileMode,
}

impl Reconciler {
    pub fn new(store: Arc<SnapshotStore>, registry: Arc<dyn RoutingRegistry>, mode: ReconcileMode) -> Self {
        Self {
            store,
            registry,
            mode,
        }
    }

    /// Reconcile after each tick notification until shutdown.
    pub async fn run(self, mut ticks: watch::Receiver<u64>, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(mode = ?self.mode, "Registry reconciler starting");

        loop {
            tokio::select! {
                changed = ticks.changed() => {
                    if changed.is_err() {
                        tracing::info!("Snapshot engine stopped, reconciler exiting");
                        break;
                    }
                    let tick = *ticks.borrow_and_update();
                    tracing::debug!(tick, "Reconciling registry");
                    self.reconcile_once().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Reconciler received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Reconcile every configured service once. Services do not wait on each other's writes.
    pub async fn reconcile_once(&self) -> Vec<(String, ReconcileOutcome)> {
        let services = self.store.services();
        let outcomes = join_all(services.iter().map(|s| self.reconcile_service(s))).await;
        services.iter().cloned().zip(outcomes).collect()
    }

    async fn reconcile_service(&self, service: &str) -> ReconcileOutcome {
        let snapshot = match self.store.get(service) {
            Some(s) => s,
            None => return ReconcileOutcome::NotProbed,
        };

        if self.mode == ReconcileMode::SkipUnchanged {
            match self.registry.read_entry(service).await {
                Ok(current) if current == snapshot.addresses => {
                    tracing::debug!(service = %service, "Registry entry already up to date");
                    metrics::record_registry_write(service, "unchanged");
                    return ReconcileOutcome::Unchanged;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(service = %service, error = %e, "Registry read failed, writing anyway");
                }
            }
        }

        match self.registry.write_entry(service, &snapshot.addresses).await {
            Ok(()) => {
                if snapshot.is_empty() {
                    tracing::warn!(service = %service, "No healthy backends, registry entry cleared");
                } else {
                    tracing::info!(service = %service, addresses = ?snapshot.addresses, "Registry entry updated");
                }
                metrics::record_registry_write(service, "ok");
                ReconcileOutcome::Written(snapshot.len())
            }
            Err(e) => {
                tracing::error!(service = %service, error = %e, "Registry write failed, will retry next tick");
                metrics::record_registry_write(service, "error");
                ReconcileOutcome::Failed(e.to_string())
            }
        }
    }
}
