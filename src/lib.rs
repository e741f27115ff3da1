//! Health-aware backend discovery and routing.
//!
//! Keeps a continuously refreshed view of which replicas of each logical
//! service are reachable, and serves it two ways: a round-robin query API
//! and a reconciled entry in the cluster's routing registry.

pub mod config;
pub mod discovery;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod registry;
pub mod snapshot;

pub use config::RouterConfig;
pub use health::SnapshotEngine;
pub use lifecycle::Shutdown;
pub use load_balancer::RoundRobinSelector;
pub use snapshot::SnapshotStore;
