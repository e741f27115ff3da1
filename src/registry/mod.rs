//! Routing registry reconciliation.
//!
//! # Data Flow
//! ```text
//! Engine tick completes (watch channel)
//!     → reconciler.rs: for each service, read latest snapshot
//!     → RoutingRegistry::write_entry(service, addresses)  (full replace)
//!         - kubernetes.rs (Endpoints object, merge patch of `subsets`)
//!         - memory.rs (in-process map)
//! ```
//!
//! # Design Decisions
//! - Last writer wins per tick; entries are never merged with previous contents
//! - An empty snapshot clears the entry
//! - A failed write is retried by the next tick, not in place

pub mod kubernetes;
pub mod memory;
pub mod reconciler;

use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use thiserror::Error;
use crate::config::{RegistryKind, RouterConfig};

pub use kubernetes::KubernetesEndpointsRegistry;
pub use memory::MemoryRegistry;
pub use reconciler::{ReconcileOutcome, Reconciler};

/// Registry read/write failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("registry unreachable: {0}")]
    Unreachable(String),

    #[error("registry entry `{0}` not found")]
    NotFound(String),

    #[error("conflicting concurrent update of `{0}`")]
    Conflict(String),

    #[error("registry rejected write: status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// The platform's routing table, one address list per service.
#[async_trait]
pub trait RoutingRegistry: Send + Sync {
    async fn read_entry(&self, service: &str) -> Result<Vec<String>, RegistryError>;

    /// Replace the entry's address list wholesale.
    async fn write_entry(&self, service: &str, addresses: &[String]) -> Result<(), RegistryError>;
}

/// Build the configured registry.
pub fn from_config(config: &RouterConfig) -> Result<Arc<dyn RoutingRegistry>, RegistryError> {
    Ok(match config.registry.kind {
        RegistryKind::Kubernetes => {
            let ports: HashMap<String, u16> = config
                .services
                .iter()
                .map(|s| (s.name.clone(), s.port))
                .collect();
            Arc::new(KubernetesEndpointsRegistry::new(&config.discovery, ports)?)
        }
        RegistryKind::Memory => Arc::new(MemoryRegistry::new()),
    })
}
