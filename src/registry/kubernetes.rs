//! Kubernetes Endpoints registry.
//!
//! # Responsibilities
//! - Read a service's Endpoints object and flatten its addresses
//! - Replace the object's `subsets` with the given addresses (merge patch)
//!
//! # Design Decisions
//! - `subsets` is replaced as a whole array; JSON merge patch never merges lists
//! - An empty address list writes `subsets: []` so no stale address survives

use std::collections::HashMap;
use std::path::PathBuf;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;
use crate::config::DiscoveryConfig;
use crate::discovery::kubernetes::{api_client, read_token};
use crate::registry::{RegistryError, RoutingRegistry};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Endpoints {
    #[serde(default)]
    pub subsets: Vec<EndpointSubset>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EndpointSubset {
    #[serde(default)]
    pub addresses: Vec<EndpointAddress>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EndpointAddress {
    pub ip: String,
}

pub(crate) fn addresses_of(endpoints: Endpoints) -> Vec<String> {
    endpoints
        .subsets
        .into_iter()
        .flat_map(|s| s.addresses)
        .map(|a| a.ip)
        .collect()
}

/// The merge-patch body that replaces an entry's addresses.
pub fn subsets_patch(addresses: &[String], port: Option<u16>) -> Value {
    if addresses.is_empty() {
        return json!({ "subsets": [] });
    }

    let addresses: Vec<Value> = addresses.iter().map(|ip| json!({ "ip": ip })).collect();
    let mut subset = json!({ "addresses": addresses });
    if let Some(port) = port {
        subset["ports"] = json!([{ "port": port, "protocol": "TCP" }]);
    }
    json!({ "subsets": [subset] })
}

/// Endpoints API client.
pub struct KubernetesEndpointsRegistry {
    client: reqwest::Client,
    api_url: Url,
    namespace: String,
    token_path: PathBuf,
    ports: HashMap<String, u16>,
}

impl KubernetesEndpointsRegistry {
    pub fn new(config: &DiscoveryConfig, ports: HashMap<String, u16>) -> Result<Self, RegistryError> {
        let api_url = Url::parse(&config.api_url)
            .map_err(|e| RegistryError::Unreachable(format!("invalid api_url {}: {}", config.api_url, e)))?;
        let client = api_client(config).map_err(|e| RegistryError::Unreachable(e.to_string()))?;

        Ok(Self {
            client,
            api_url,
            namespace: config.namespace.clone(),
            token_path: PathBuf::from(&config.token_path),
            ports,
        })
    }

    pub(crate) fn endpoints_url(&self, service: &str) -> Result<Url, RegistryError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| RegistryError::Unreachable(format!("api_url {} cannot be a base", self.api_url)))?
            .pop_if_empty()
            .extend(["api", "v1", "namespaces", self.namespace.as_str(), "endpoints", service]);
        Ok(url)
    }

    async fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match read_token(&self.token_path).await {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

async fn status_error(service: &str, response: reqwest::Response) -> RegistryError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match status {
        reqwest::StatusCode::NOT_FOUND => RegistryError::NotFound(service.to_string()),
        reqwest::StatusCode::CONFLICT => RegistryError::Conflict(service.to_string()),
        _ => RegistryError::Rejected { status: status.as_u16(), body },
    }
}

#[async_trait]
impl RoutingRegistry for KubernetesEndpointsRegistry {
    async fn read_entry(&self, service: &str) -> Result<Vec<String>, RegistryError> {
        let url = self.endpoints_url(service)?;
        let response = self
            .authorized(self.client.get(url))
            .await
            .send()
            .await
            .map_err(|e| RegistryError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(status_error(service, response).await);
        }

        let endpoints: Endpoints = response
            .json()
            .await
            .map_err(|e| RegistryError::Unreachable(format!("malformed endpoints: {}", e)))?;
        Ok(addresses_of(endpoints))
    }

    async fn write_entry(&self, service: &str, addresses: &[String]) -> Result<(), RegistryError> {
        let url = self.endpoints_url(service)?;
        let patch = subsets_patch(addresses, self.ports.get(service).copied());

        let response = self
            .authorized(self.client.patch(url))
            .await
            .header(CONTENT_TYPE, "application/merge-patch+json")
            .body(patch.to_string())
            .send()
            .await
            .map_err(|e| RegistryError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(status_error(service, response).await);
        }
        Ok(())
    }
}
