//! Health snapshot engine.
//!
//! # Responsibilities
//! - Periodically discover candidates for every configured service
//! - Drop candidates that are not in a ready phase before probing
//! - Probe the rest with bounded concurrency
//! - Publish one complete snapshot per service per tick, empty included

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use futures_util::future::join_all;
use futures_util::stream::{self, StreamExt};
use tokio::sync::{broadcast, watch};
use tokio::time::{self, MissedTickBehavior};
use crate::config::{RouterConfig, ServiceConfig};
use crate::discovery::{Candidate, DiscoveryClient};
use crate::health::probe::Probe;
use crate::health::state::{ServiceStates, TickState};
use crate::observability::metrics;
use crate::snapshot::{HealthSnapshot, SnapshotStore};

/// What one tick did for one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceOutcome {
    /// Snapshot published after probing.
    Published {
        healthy: usize,
        probed: usize,
        skipped: usize,
    },
    /// Discovery failed; an empty snapshot was published.
    DiscoveryFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceReport {
    pub service: String,
    pub outcome: ServiceOutcome,
}

/// Result of one tick across all services.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub tick: u64,
    pub services: Vec<ServiceReport>,
    pub elapsed: Duration,
}

/// Discover → probe → publish driver.
pub struct SnapshotEngine {
    services: Vec<ServiceConfig>,
    namespace: String,
    ready_phases: HashSet<String>,
    concurrency: usize,
    interval: Duration,
    discovery: Arc<dyn DiscoveryClient>,
    probe: Arc<dyn Probe>,
    store: Arc<SnapshotStore>,
    states: Arc<ServiceStates>,
    ticks: watch::Sender<u64>,
}

impl SnapshotEngine {
    pub fn new(
        config: &RouterConfig,
        discovery: Arc<dyn DiscoveryClient>,
        probe: Arc<dyn Probe>,
    ) -> Self {
        let names = config.services.iter().map(|s| s.name.as_str());
        let store = Arc::new(SnapshotStore::new(names.clone()));
        let states = Arc::new(ServiceStates::new(names));
        let (ticks, _) = watch::channel(0);

        Self {
            services: config.services.clone(),
            namespace: config.discovery.namespace.clone(),
            ready_phases: config.health_check.ready_phases.iter().cloned().collect(),
            concurrency: config.health_check.concurrency.max(1),
            interval: Duration::from_secs(config.health_check.interval_secs),
            discovery,
            probe,
            store,
            states,
            ticks,
        }
    }

    pub fn store(&self) -> Arc<SnapshotStore> {
        self.store.clone()
    }

    pub fn states(&self) -> Arc<ServiceStates> {
        self.states.clone()
    }

    /// Receiver that observes the number of the last completed tick.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.ticks.subscribe()
    }

    /// Run ticks until shutdown. Overrunning ticks are skipped, never overlapped.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval = ?self.interval,
            services = self.services.len(),
            concurrency = self.concurrency,
            "Snapshot engine starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Snapshot engine received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Refresh every service once. Services are refreshed independently of each other.
    pub async fn tick(&self) -> TickReport {
        let start = Instant::now();
        let tick = *self.ticks.borrow() + 1;

        let services = join_all(self.services.iter().map(|s| self.refresh_service(s, tick))).await;

        let elapsed = start.elapsed();
        metrics::record_tick(start);
        tracing::debug!(tick, elapsed = ?elapsed, "Tick complete");
        self.ticks.send_replace(tick);

        TickReport {
            tick,
            services,
            elapsed,
        }
    }

    async fn refresh_service(&self, service: &ServiceConfig, tick: u64) -> ServiceReport {
        let name = service.name.as_str();

        self.states.set(name, TickState::Discovering);
        let candidates = match self
            .discovery
            .list_candidates(&service.selector, &self.namespace)
            .await
        {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(service = %name, selector = %service.selector, error = %e, "Discovery failed");
                metrics::record_discovery_error(name);
                self.publish(name, HealthSnapshot::empty(tick));
                return ServiceReport {
                    service: name.to_string(),
                    outcome: ServiceOutcome::DiscoveryFailed(e.to_string()),
                };
            }
        };

        let total = candidates.len();
        let eligible = self.eligible(name, candidates);
        let skipped = total - eligible.len();

        self.states.set(name, TickState::Probing);
        let probe = &self.probe;
        let port = service.port;
        let results: Vec<(String, bool)> = stream::iter(eligible)
            .map(|candidate| async move {
                let outcome = probe.probe(&candidate.address, port).await;
                tracing::debug!(service = %name, address = %candidate.address, outcome = ?outcome, "Probed candidate");
                (candidate.address, outcome.is_healthy())
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let probed = results.len();
        let healthy: Vec<String> = results
            .into_iter()
            .inspect(|(_, ok)| metrics::record_probe(name, *ok))
            .filter_map(|(address, ok)| ok.then_some(address))
            .collect();

        if healthy.is_empty() && probed > 0 {
            tracing::warn!(service = %name, probed, "Every probed candidate is unhealthy");
        }
        tracing::info!(
            service = %name,
            healthy = healthy.len(),
            probed,
            skipped,
            "Healthy backends refreshed"
        );

        let count = healthy.len();
        self.publish(name, HealthSnapshot::new(healthy, tick));

        ServiceReport {
            service: name.to_string(),
            outcome: ServiceOutcome::Published {
                healthy: count,
                probed,
                skipped,
            },
        }
    }

    /// Ready-phase candidates with an address, first occurrence of each address only.
    fn eligible(&self, service: &str, candidates: Vec<Candidate>) -> Vec<Candidate> {
        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(|c| {
                if !self.ready_phases.contains(&c.phase) {
                    tracing::debug!(service = %service, address = %c.address, phase = %c.phase, "Skipping candidate not in a ready phase");
                    return false;
                }
                if c.address.is_empty() {
                    tracing::debug!(service = %service, phase = %c.phase, "Skipping candidate without an address");
                    return false;
                }
                seen.insert(c.address.clone())
            })
            .collect()
    }

    fn publish(&self, service: &str, snapshot: HealthSnapshot) {
        self.states.set(service, TickState::Publishing);
        metrics::record_snapshot(service, snapshot.len());
        self.store.publish(service, snapshot);
        self.states.set(service, TickState::Idle);
    }
}
