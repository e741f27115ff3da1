//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the health router.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;
use serde::{Deserialize, Serialize};

/// Root configuration for the health router.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Query interface listener (bind address).
    pub listener: ListenerConfig,

    /// Logical services whose replicas are tracked. Fixed at startup.
    pub services: Vec<ServiceConfig>,

    /// Probing cadence and probe settings.
    pub health_check: HealthCheckConfig,

    /// Where candidates come from.
    pub discovery: DiscoveryConfig,

    /// Where reconciled routing entries go.
    pub registry: RegistryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        let services = [
            ("node-app-primary-service", "node-app-primary"),
            ("node-app-secondary-service", "node-app-secondary"),
            ("node-app-failover-service", "node-app-failover"),
        ]
        .into_iter()
        .map(|(name, label)| ServiceConfig {
            name: name.to_string(),
            selector: format!("app={}", label),
            port: default_port(),
        })
        .collect();

        Self {
            listener: ListenerConfig::default(),
            services,
            health_check: HealthCheckConfig::default(),
            discovery: DiscoveryConfig::default(),
            registry: RegistryConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout for query handlers in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// One logical service.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Service name, also the registry entry name.
    pub name: String,

    /// Discovery label selector (e.g., "app=node-app-primary").
    pub selector: String,

    /// Port probed on every candidate and published to the registry.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3000
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Tick interval in seconds.
    pub interval_secs: u64,

    /// Per-probe timeout in seconds.
    pub timeout_secs: u64,

    /// Path to probe for HTTP health checks.
    pub path: String,

    /// Maximum number of probes in flight per service.
    pub concurrency: usize,

    /// Lifecycle phases that are eligible for probing.
    pub ready_phases: Vec<String>,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3,
            timeout_secs: 2,
            path: "/health".to_string(),
            concurrency: 16,
            ready_phases: vec!["Running".to_string()],
        }
    }
}

/// Discovery backend selection.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryKind {
    #[default]
    Kubernetes,
    Static,
}

/// A statically configured candidate.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct StaticCandidate {
    pub address: String,
    #[serde(default = "default_phase")]
    pub phase: String,
}

fn default_phase() -> String {
    "Running".to_string()
}

/// Discovery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub kind: DiscoveryKind,

    /// Namespace candidates are listed in.
    pub namespace: String,

    /// Kubernetes API base URL.
    pub api_url: String,

    /// Service-account token file; read on each request when present.
    pub token_path: String,

    /// Discovery request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Static candidates keyed by selector (used when `kind = "static"`).
    pub candidates: HashMap<String, Vec<StaticCandidate>>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            kind: DiscoveryKind::Kubernetes,
            namespace: "default".to_string(),
            api_url: "https://kubernetes.default.svc".to_string(),
            token_path: "/var/run/secrets/kubernetes.io/serviceaccount/token".to_string(),
            request_timeout_secs: 5,
            candidates: HashMap::new(),
        }
    }
}

/// Registry backend selection.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RegistryKind {
    #[default]
    Kubernetes,
    Memory,
}

/// How the reconciler writes an entry.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileMode {
    /// Always overwrite the entry, every tick.
    #[default]
    Replace,
    /// Read the entry first and skip the write when it already matches.
    SkipUnchanged,
}

/// Registry reconciliation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub kind: RegistryKind,
    pub mode: ReconcileMode,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            kind: RegistryKind::Kubernetes,
            mode: ReconcileMode::Replace,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
