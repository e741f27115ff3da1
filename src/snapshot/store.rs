//! In-memory snapshot store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use arc_swap::ArcSwapOption;
use serde::Serialize;

/// The result of one complete probing pass for a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthSnapshot {
    /// Healthy addresses in discovery order.
    pub addresses: Vec<String>,
    /// Tick that produced this snapshot.
    pub tick: u64,
    /// Wall-clock time the snapshot was built (ms since epoch).
    pub taken_at_ms: u64,
}

impl HealthSnapshot {
    pub fn new(addresses: Vec<String>, tick: u64) -> Self {
        let taken_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self {
            addresses,
            tick,
            taken_at_ms,
        }
    }

    /// An explicitly empty snapshot (no healthy backend this tick).
    pub fn empty(tick: u64) -> Self {
        Self::new(Vec::new(), tick)
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }
}

/// Latest snapshot per logical service.
#[derive(Debug)]
pub struct SnapshotStore {
    /// Service names in configuration order.
    order: Vec<String>,
    slots: HashMap<String, ArcSwapOption<HealthSnapshot>>,
}

impl SnapshotStore {
    /// Create a store with one empty slot per service.
    pub fn new<I, S>(services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut order = Vec::new();
        let mut slots = HashMap::new();
        for name in services {
            let name = name.into();
            if slots.insert(name.clone(), ArcSwapOption::empty()).is_none() {
                order.push(name);
            }
        }
        Self { order, slots }
    }

    /// Whether `service` is a configured service.
    pub fn contains(&self, service: &str) -> bool {
        self.slots.contains_key(service)
    }

    /// Configured service names, in configuration order.
    pub fn services(&self) -> &[String] {
        &self.order
    }

    /// Replace the snapshot for `service`. Returns false if the service is not configured.
    pub fn publish(&self, service: &str, snapshot: HealthSnapshot) -> bool {
        match self.slots.get(service) {
            Some(slot) => {
                slot.store(Some(Arc::new(snapshot)));
                true
            }
            None => {
                tracing::warn!(service = %service, "Dropping snapshot for unconfigured service");
                false
            }
        }
    }

    /// Latest snapshot for `service`; `None` if unconfigured or never probed.
    pub fn get(&self, service: &str) -> Option<Arc<HealthSnapshot>> {
        self.slots.get(service).and_then(|slot| slot.load_full())
    }

    /// Every configured service with its latest snapshot, in configuration order.
    pub fn all(&self) -> Vec<(String, Option<Arc<HealthSnapshot>>)> {
        self.order
            .iter()
            .map(|name| (name.clone(), self.get(name)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addrs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_absent_until_first_publish() {
        let store = SnapshotStore::new(["svc-a"]);
        assert!(store.contains("svc-a"));
        assert!(store.get("svc-a").is_none());
        assert!(!store.contains("svc-z"));
    }

    #[test]
    fn test_empty_snapshot_overwrites_previous() {
        let store = SnapshotStore::new(["svc-a"]);
        store.publish("svc-a", HealthSnapshot::new(addrs(&["10.0.0.1", "10.0.0.2"]), 1));
        store.publish("svc-a", HealthSnapshot::empty(2));

        let snap = store.get("svc-a").unwrap();
        assert!(snap.is_empty());
        assert_eq!(snap.tick, 2);
    }

    #[test]
    fn test_reader_keeps_its_snapshot_across_publish() {
        let store = SnapshotStore::new(["svc-a"]);
        store.publish("svc-a", HealthSnapshot::new(addrs(&["10.0.0.1"]), 1));
        let held = store.get("svc-a").unwrap();

        store.publish("svc-a", HealthSnapshot::new(addrs(&["10.0.0.2", "10.0.0.3"]), 2));

        assert_eq!(held.addresses, addrs(&["10.0.0.1"]));
        assert_eq!(store.get("svc-a").unwrap().addresses, addrs(&["10.0.0.2", "10.0.0.3"]));
    }

    #[test]
    fn test_unconfigured_publish_rejected() {
        let store = SnapshotStore::new(["svc-a", "svc-a", "svc-b"]);
        assert_eq!(store.services(), &addrs(&["svc-a", "svc-b"])[..]);
        assert!(!store.publish("svc-z", HealthSnapshot::empty(1)));
        assert!(store.get("svc-z").is_none());
    }

    #[test]
    fn test_all_in_config_order() {
        let store = SnapshotStore::new(["svc-b", "svc-a"]);
        store.publish("svc-a", HealthSnapshot::new(addrs(&["10.0.0.1"]), 1));

        let all = store.all();
        assert_eq!(all[0].0, "svc-b");
        assert!(all[0].1.is_none());
        assert_eq!(all[1].1.as_ref().unwrap().addresses, addrs(&["10.0.0.1"]));
    }
}
