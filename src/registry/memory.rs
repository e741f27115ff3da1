//! In-process registry.

use std::sync::atomic::{AtomicUsize, Ordering};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use crate::registry::{RegistryError, RoutingRegistry};

/// A `DashMap`-backed registry. Entries can be made to fail for failure testing.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    entries: DashMap<String, Vec<String>>,
    unavailable: DashSet<String>,
    writes: AtomicUsize,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current entry, if one was ever written.
    pub fn entry(&self, service: &str) -> Option<Vec<String>> {
        self.entries.get(service).map(|e| e.value().clone())
    }

    /// Make reads and writes for `service` fail until cleared.
    pub fn set_unavailable(&self, service: &str, unavailable: bool) {
        if unavailable {
            self.unavailable.insert(service.to_string());
        } else {
            self.unavailable.remove(service);
        }
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    fn check(&self, service: &str) -> Result<(), RegistryError> {
        if self.unavailable.contains(service) {
            Err(RegistryError::Unreachable(format!("{} marked unavailable", service)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RoutingRegistry for MemoryRegistry {
    async fn read_entry(&self, service: &str) -> Result<Vec<String>, RegistryError> {
        self.check(service)?;
        self.entry(service)
            .ok_or_else(|| RegistryError::NotFound(service.to_string()))
    }

    async fn write_entry(&self, service: &str, addresses: &[String]) -> Result<(), RegistryError> {
        self.check(service)?;
        self.entries.insert(service.to_string(), addresses.to_vec());
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
