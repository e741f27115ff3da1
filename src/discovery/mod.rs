//! Candidate discovery.
//!
//! # Data Flow
//! ```text
//! Engine tick, per service
//!     → DiscoveryClient::list_candidates(selector, namespace)
//!         - kubernetes.rs (pods API, label selector)
//!         - static_list.rs (candidates from config)
//!     → Vec<Candidate> (address + lifecycle phase)
//! ```
//!
//! # Design Decisions
//! - Candidates are transient: recomputed every tick, never cached here
//! - Phase filtering happens in the engine, not in the client

pub mod kubernetes;
pub mod static_list;

use std::sync::Arc;
use async_trait::async_trait;
use thiserror::Error;
use crate::config::{DiscoveryConfig, DiscoveryKind};

pub use kubernetes::KubernetesDiscovery;
pub use static_list::StaticDiscovery;

/// One backend instance as reported by discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Network address (IP). May be empty for instances not yet scheduled.
    pub address: String,
    /// Lifecycle phase (e.g. "Pending", "Running", "Terminating").
    pub phase: String,
}

impl Candidate {
    pub fn new(address: impl Into<String>, phase: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            phase: phase.into(),
        }
    }
}

/// Discovery failure for one service.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("directory service unreachable: {0}")]
    Unreachable(String),

    #[error("directory service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid selector `{0}`")]
    InvalidSelector(String),

    #[error("malformed discovery response: {0}")]
    Decode(String),
}

/// Source of candidates for a logical service.
#[async_trait]
pub trait DiscoveryClient: Send + Sync {
    async fn list_candidates(
        &self,
        selector: &str,
        namespace: &str,
    ) -> Result<Vec<Candidate>, DiscoveryError>;
}

/// Build the configured discovery client.
pub fn from_config(config: &DiscoveryConfig) -> Result<Arc<dyn DiscoveryClient>, DiscoveryError> {
    Ok(match config.kind {
        DiscoveryKind::Kubernetes => Arc::new(KubernetesDiscovery::new(config)?),
        DiscoveryKind::Static => Arc::new(StaticDiscovery::from_config(config)),
    })
}
