//! Discovery through the Kubernetes pods API.
//!
//! # Responsibilities
//! - List pods matching a label selector in a namespace
//! - Map `status.podIP` and `status.phase` onto candidates
//! - Authenticate with the service-account token when one is mounted

use std::path::{Path, PathBuf};
use std::time::Duration;
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;
use crate::config::DiscoveryConfig;
use crate::discovery::{Candidate, DiscoveryClient, DiscoveryError};

const SERVICE_ACCOUNT_CA: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";
const TERMINATING: &str = "Terminating";

#[derive(Debug, Deserialize)]
pub(crate) struct PodList {
    #[serde(default)]
    pub items: Vec<Pod>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Pod {
    #[serde(default)]
    pub metadata: PodMetadata,
    #[serde(default)]
    pub status: PodStatus,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PodMetadata {
    #[serde(default)]
    pub name: String,
    /// Set once deletion starts; the phase stays `Running` while the pod drains.
    #[serde(default, rename = "deletionTimestamp")]
    pub deletion_timestamp: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PodStatus {
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default, rename = "podIP")]
    pub pod_ip: Option<String>,
}

/// Candidates in the order the API returned them.
pub(crate) fn candidates_from_pods(list: PodList) -> Vec<Candidate> {
    list.items
        .into_iter()
        .map(|pod| {
            let phase = if pod.metadata.deletion_timestamp.is_some() {
                TERMINATING.to_string()
            } else {
                pod.status.phase.unwrap_or_else(|| "Unknown".to_string())
            };
            let address = pod.status.pod_ip.unwrap_or_default();
            tracing::trace!(pod = %pod.metadata.name, address = %address, phase = %phase, "Discovered pod");
            Candidate { address, phase }
        })
        .collect()
}

/// Kubernetes pods API client.
pub struct KubernetesDiscovery {
    client: reqwest::Client,
    api_url: Url,
    token_path: PathBuf,
}

impl KubernetesDiscovery {
    pub fn new(config: &DiscoveryConfig) -> Result<Self, DiscoveryError> {
        let api_url = Url::parse(&config.api_url)
            .map_err(|e| DiscoveryError::Unreachable(format!("invalid api_url {}: {}", config.api_url, e)))?;

        let client = api_client(config).map_err(|e| DiscoveryError::Unreachable(e.to_string()))?;

        Ok(Self {
            client,
            api_url,
            token_path: PathBuf::from(&config.token_path),
        })
    }

    pub(crate) fn pods_url(&self, selector: &str, namespace: &str) -> Result<Url, DiscoveryError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| DiscoveryError::Unreachable(format!("api_url {} cannot be a base", self.api_url)))?
            .pop_if_empty()
            .extend(["api", "v1", "namespaces", namespace, "pods"]);
        url.query_pairs_mut().append_pair("labelSelector", selector);
        Ok(url)
    }
}

/// HTTP client for the API server, trusting the mounted cluster CA when present.
pub(crate) fn api_client(config: &DiscoveryConfig) -> reqwest::Result<reqwest::Client> {
    client_with_ca(config, Path::new(SERVICE_ACCOUNT_CA))
}

fn client_with_ca(config: &DiscoveryConfig, ca_path: &Path) -> reqwest::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs));
    if let Some(cert) = load_ca(ca_path) {
        builder = builder.add_root_certificate(cert);
    }
    builder.build()
}

fn load_ca(path: &Path) -> Option<reqwest::Certificate> {
    let pem = std::fs::read(path).ok()?;
    match reqwest::Certificate::from_pem(&pem) {
        Ok(cert) => Some(cert),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable cluster CA");
            None
        }
    }
}

/// Read the bearer token, if one is mounted.
pub(crate) async fn read_token(path: &Path) -> Option<String> {
    tokio::fs::read_to_string(path)
        .await
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl DiscoveryClient for KubernetesDiscovery {
    async fn list_candidates(
        &self,
        selector: &str,
        namespace: &str,
    ) -> Result<Vec<Candidate>, DiscoveryError> {
        if selector.trim().is_empty() {
            return Err(DiscoveryError::InvalidSelector(selector.to_string()));
        }

        let url = self.pods_url(selector, namespace)?;
        let mut request = self.client.get(url);
        if let Some(token) = read_token(&self.token_path).await {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DiscoveryError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::BAD_REQUEST {
                return Err(DiscoveryError::InvalidSelector(format!("{}: {}", selector, body)));
            }
            return Err(DiscoveryError::Status { status: status.as_u16(), body });
        }

        let list: PodList = response
            .json()
            .await
            .map_err(|e| DiscoveryError::Decode(e.to_string()))?;
        Ok(candidates_from_pods(list))
    }
}
