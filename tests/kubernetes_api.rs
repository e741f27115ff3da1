//! Discovery and registry against a mock Kubernetes API server.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use serde_json::{json, Value};

use health_router::config::DiscoveryConfig;
use health_router::discovery::{Candidate, DiscoveryClient, DiscoveryError, KubernetesDiscovery};
use health_router::registry::{KubernetesEndpointsRegistry, RegistryError, RoutingRegistry};

mod common;

type Requests = Arc<Mutex<Vec<String>>>;

async fn mock_api() -> (DiscoveryConfig, Requests) {
    let requests: Requests = Arc::new(Mutex::new(Vec::new()));
    let seen = requests.clone();
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();

    let local = common::start_programmable_backend(addr, move |request| {
        let seen = seen.clone();
        async move {
            seen.lock().unwrap().push(request.clone());
            let line = request.lines().next().unwrap_or_default().to_string();

            if line.starts_with("GET /api/v1/namespaces/default/pods?labelSelector=app%3Dnode-app-primary ") {
                let body = json!({
                    "items": [
                        { "metadata": { "name": "p1" }, "status": { "phase": "Running", "podIP": "10.0.0.1" } },
                        { "metadata": { "name": "p2" }, "status": { "phase": "Running", "podIP": "10.0.0.2" } },
                        { "metadata": { "name": "p3" }, "status": { "phase": "Pending" } }
                    ]
                });
                (200, body.to_string())
            } else if line.starts_with("GET /api/v1/namespaces/default/pods") {
                (400, "{\"message\":\"unable to parse requirement\"}".to_string())
            } else if line.starts_with("GET /api/v1/namespaces/default/endpoints/svc-a ") {
                let body = json!({ "subsets": [{ "addresses": [{ "ip": "10.0.0.7" }] }] });
                (200, body.to_string())
            } else if line.starts_with("PATCH /api/v1/namespaces/default/endpoints/svc-a ") {
                (200, "{}".to_string())
            } else if line.starts_with("PATCH /api/v1/namespaces/default/endpoints/busy ") {
                (409, "{\"message\":\"conflict\"}".to_string())
            } else {
                (404, "{\"message\":\"not found\"}".to_string())
            }
        }
    })
    .await;

    let config = DiscoveryConfig {
        api_url: format!("http://{}", local),
        token_path: "/nonexistent/token".into(),
        ..DiscoveryConfig::default()
    };
    (config, requests)
}

fn body_of(request: &str) -> Value {
    let (_, body) = request.split_once("\r\n\r\n").unwrap();
    serde_json::from_str(body).unwrap()
}

#[tokio::test]
async fn test_pods_listed_with_phase() {
    let (config, _requests) = mock_api().await;
    let discovery = KubernetesDiscovery::new(&config).unwrap();

    let candidates = discovery.list_candidates("app=node-app-primary", "default").await.unwrap();
    assert_eq!(
        candidates,
        vec![
            Candidate::new("10.0.0.1", "Running"),
            Candidate::new("10.0.0.2", "Running"),
            Candidate::new("", "Pending"),
        ]
    );
}

#[tokio::test]
async fn test_rejected_selector() {
    let (config, _requests) = mock_api().await;
    let discovery = KubernetesDiscovery::new(&config).unwrap();

    let err = discovery.list_candidates("app in (", "default").await.unwrap_err();
    assert!(matches!(err, DiscoveryError::InvalidSelector(_)));
}

#[tokio::test]
async fn test_unreachable_api() {
    let port = common::free_port().await;
    let config = DiscoveryConfig {
        api_url: format!("http://127.0.0.1:{}", port),
        token_path: "/nonexistent/token".into(),
        ..DiscoveryConfig::default()
    };
    let discovery = KubernetesDiscovery::new(&config).unwrap();

    let err = discovery.list_candidates("app=a", "default").await.unwrap_err();
    assert!(matches!(err, DiscoveryError::Unreachable(_)));
}

#[tokio::test]
async fn test_endpoints_patch_replaces_subsets() {
    let (config, requests) = mock_api().await;
    let mut ports = HashMap::new();
    ports.insert("svc-a".to_string(), 3000);
    let registry = KubernetesEndpointsRegistry::new(&config, ports).unwrap();

    assert_eq!(registry.read_entry("svc-a").await.unwrap(), vec!["10.0.0.7"]);

    registry
        .write_entry("svc-a", &["10.0.0.1".to_string(), "10.0.0.2".to_string()])
        .await
        .unwrap();
    registry.write_entry("svc-a", &[]).await.unwrap();

    let requests = requests.lock().unwrap().clone();
    let patches: Vec<&String> = requests.iter().filter(|r| r.starts_with("PATCH")).collect();
    assert_eq!(patches.len(), 2);
    assert!(patches[0].to_ascii_lowercase().contains("content-type: application/merge-patch+json"));
    assert_eq!(
        body_of(patches[0]),
        json!({
            "subsets": [{
                "addresses": [{ "ip": "10.0.0.1" }, { "ip": "10.0.0.2" }],
                "ports": [{ "port": 3000, "protocol": "TCP" }]
            }]
        })
    );
    assert_eq!(body_of(patches[1]), json!({ "subsets": [] }));
}

#[tokio::test]
async fn test_registry_errors_are_classified() {
    let (config, _requests) = mock_api().await;
    let registry = KubernetesEndpointsRegistry::new(&config, HashMap::new()).unwrap();

    assert_eq!(
        registry.write_entry("busy", &[]).await,
        Err(RegistryError::Conflict("busy".into()))
    );
    assert_eq!(
        registry.read_entry("missing").await,
        Err(RegistryError::NotFound("missing".into()))
    );
}
