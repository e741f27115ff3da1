//! Reachability probes.
//!
//! # Responsibilities
//! - Issue one bounded-timeout GET against a candidate's health path
//! - Classify the result as Healthy or Unhealthy
//!
//! # Design Decisions
//! - No retries inside a probe; the next tick is the retry
//! - Transport error, non-2xx status and timeout are all just Unhealthy
//! - Probes share nothing mutable, so any number may run at once

use std::time::Duration;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time;
use crate::config::HealthCheckConfig;

/// Result of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Healthy,
    Unhealthy(String),
}

impl ProbeOutcome {
    pub fn is_healthy(&self) -> bool {
        matches!(self, ProbeOutcome::Healthy)
    }
}

/// A reachability check against one candidate.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, address: &str, port: u16) -> ProbeOutcome;
}

/// Build the probe URL, bracketing IPv6 literals.
pub fn probe_uri(address: &str, port: u16, path: &str) -> String {
    let host = if address.contains(':') && !address.starts_with('[') {
        format!("[{}]", address)
    } else {
        address.to_string()
    };
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    format!("http://{}:{}{}", host, port, path)
}

/// HTTP GET probe.
#[derive(Clone)]
pub struct HttpProbe {
    client: Client<HttpConnector, Body>,
    path: String,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(path: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(0)
            .build(HttpConnector::new());

        Self {
            client,
            path: path.into(),
            timeout,
        }
    }

    pub fn from_config(config: &HealthCheckConfig) -> Self {
        Self::new(config.path.clone(), Duration::from_secs(config.timeout_secs))
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, address: &str, port: u16) -> ProbeOutcome {
        let uri = probe_uri(address, port, &self.path);

        let request = match Request::builder()
            .method("GET")
            .uri(&uri)
            .header("user-agent", "health-router-probe")
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::warn!(address = %address, error = %e, "Failed to build health check request");
                return ProbeOutcome::Unhealthy(format!("invalid request: {}", e));
            }
        };

        match time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) => {
                let status = response.status();
                tracing::debug!(address = %address, status = %status, "Health check response");
                if status.is_success() {
                    ProbeOutcome::Healthy
                } else {
                    ProbeOutcome::Unhealthy(format!("status {}", status))
                }
            }
            Ok(Err(e)) => {
                tracing::debug!(address = %address, error = %e, "Health check failed: connection error");
                ProbeOutcome::Unhealthy(format!("connection error: {}", e))
            }
            Err(_) => {
                tracing::debug!(address = %address, timeout = ?self.timeout, "Health check failed: timeout");
                ProbeOutcome::Unhealthy("timeout".to_string())
            }
        }
    }
}
