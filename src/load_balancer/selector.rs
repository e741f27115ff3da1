//! Per-service round-robin selection over the snapshot store.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use crate::load_balancer::round_robin::RoundRobin;
use crate::observability::metrics;
use crate::snapshot::SnapshotStore;

/// Why no address was returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectError {
    #[error("service `{0}` is not configured")]
    UnknownService(String),

    #[error("no healthy backend available for service `{0}`")]
    NoHealthyBackend(String),
}

/// Round-robin selector with one cursor per configured service.
#[derive(Debug)]
pub struct RoundRobinSelector {
    store: Arc<SnapshotStore>,
    cursors: HashMap<String, RoundRobin>,
}

impl RoundRobinSelector {
    pub fn new(store: Arc<SnapshotStore>) -> Self {
        let cursors = store
            .services()
            .iter()
            .map(|name| (name.clone(), RoundRobin::new()))
            .collect();
        Self { store, cursors }
    }

    /// Next healthy address for `service`.
    pub fn next(&self, service: &str) -> Result<String, SelectError> {
        let cursor = match self.cursors.get(service) {
            Some(c) => c,
            None => {
                metrics::record_selection(service, "unknown_service");
                return Err(SelectError::UnknownService(service.to_string()));
            }
        };

        let snapshot = self.store.get(service);
        let picked = snapshot
            .as_ref()
            .and_then(|snap| cursor.next(&snap.addresses))
            .cloned();

        match picked {
            Some(address) => {
                metrics::record_selection(service, "ok");
                Ok(address)
            }
            None => {
                tracing::debug!(service = %service, "No healthy backends in snapshot");
                metrics::record_selection(service, "no_healthy_backend");
                Err(SelectError::NoHealthyBackend(service.to_string()))
            }
        }
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::HealthSnapshot;

    fn addrs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn selector(services: &[&str]) -> RoundRobinSelector {
        RoundRobinSelector::new(Arc::new(SnapshotStore::new(services.iter().copied())))
    }

    #[test]
    fn test_rotation_over_snapshot() {
        let sel = selector(&["svc-a"]);
        sel.store().publish("svc-a", HealthSnapshot::new(addrs(&["10.0.0.1", "10.0.0.2"]), 1));

        assert_eq!(sel.next("svc-a").unwrap(), "10.0.0.1");
        assert_eq!(sel.next("svc-a").unwrap(), "10.0.0.2");
        assert_eq!(sel.next("svc-a").unwrap(), "10.0.0.1");
    }

    #[test]
    fn test_empty_snapshot_is_no_healthy_backend() {
        let sel = selector(&["svc-b"]);
        sel.store().publish("svc-b", HealthSnapshot::empty(1));

        assert_eq!(sel.next("svc-b"), Err(SelectError::NoHealthyBackend("svc-b".into())));
    }

    #[test]
    fn test_never_probed_is_no_healthy_backend() {
        let sel = selector(&["svc-b"]);
        assert_eq!(sel.next("svc-b"), Err(SelectError::NoHealthyBackend("svc-b".into())));
    }

    #[test]
    fn test_unknown_service() {
        let sel = selector(&["svc-a"]);
        assert_eq!(sel.next("svc-x"), Err(SelectError::UnknownService("svc-x".into())));
    }

    #[test]
    fn test_snapshot_shrink_between_calls() {
        let sel = selector(&["svc-a"]);
        sel.store().publish("svc-a", HealthSnapshot::new(addrs(&["a", "b", "c"]), 1));
        sel.next("svc-a").unwrap();
        sel.next("svc-a").unwrap();

        sel.store().publish("svc-a", HealthSnapshot::new(addrs(&["a"]), 2));
        assert_eq!(sel.next("svc-a").unwrap(), "a");
        assert_eq!(sel.next("svc-a").unwrap(), "a");
    }

    #[test]
    fn test_cursors_are_per_service() {
        let sel = selector(&["svc-a", "svc-b"]);
        sel.store().publish("svc-a", HealthSnapshot::new(addrs(&["a1", "a2"]), 1));
        sel.store().publish("svc-b", HealthSnapshot::new(addrs(&["b1", "b2"]), 1));

        assert_eq!(sel.next("svc-a").unwrap(), "a1");
        assert_eq!(sel.next("svc-b").unwrap(), "b1");
        assert_eq!(sel.next("svc-a").unwrap(), "a2");
    }
}
