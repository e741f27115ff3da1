//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the query handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener and stop on the shared shutdown signal

use std::sync::Arc;
use std::time::Duration;
use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ListenerConfig;
use crate::health::ServiceStates;
use crate::http::handlers::{
    get_status, healthy_backends, liveness, next_backend, next_healthy_pod,
};
use crate::load_balancer::RoundRobinSelector;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub selector: Arc<RoundRobinSelector>,
    pub states: Arc<ServiceStates>,
    pub ticks: watch::Receiver<u64>,
}

/// HTTP server for the query interface.
pub struct QueryServer {
    router: Router,
}

impl QueryServer {
    /// Create a new query server over the given state.
    pub fn new(config: &ListenerConfig, state: AppState) -> Self {
        let router = Self::build_router(config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(config: &ListenerConfig, state: AppState) -> Router {
        Router::new()
            .route("/healthy-backends", get(healthy_backends))
            .route("/next-backend", get(next_backend))
            .route("/health-pods", get(healthy_backends))
            .route("/next-healthy-pod", get(next_healthy_pod))
            .route("/status", get(get_status))
            .route("/healthz", get(liveness))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Serve until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Query interface listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Query interface stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use crate::snapshot::{HealthSnapshot, SnapshotStore};

    fn router(services: &[&str]) -> (Arc<SnapshotStore>, watch::Sender<u64>, Router) {
        let store = Arc::new(SnapshotStore::new(services.iter().copied()));
        let (tx, rx) = watch::channel(0);
        let state = AppState {
            selector: Arc::new(RoundRobinSelector::new(store.clone())),
            states: Arc::new(ServiceStates::new(services.iter().copied())),
            ticks: rx,
        };
        (store, tx, QueryServer::build_router(&ListenerConfig::default(), state))
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_healthy_backends_lists_every_service() {
        let (store, _tx, app) = router(&["svc-a", "svc-b"]);
        store.publish("svc-a", HealthSnapshot::new(vec!["10.0.0.1".into(), "10.0.0.2".into()], 1));

        let (status, body) = get_json(&app, "/healthy-backends").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "svc-a": ["10.0.0.1", "10.0.0.2"], "svc-b": [] }));

        let (_, alias) = get_json(&app, "/health-pods").await;
        assert_eq!(alias, body);
    }

    #[tokio::test]
    async fn test_next_backend_round_robin() {
        let (store, _tx, app) = router(&["svc-a"]);
        store.publish("svc-a", HealthSnapshot::new(vec!["10.0.0.1".into(), "10.0.0.2".into()], 1));

        let (_, first) = get_json(&app, "/next-backend?service=svc-a").await;
        let (_, second) = get_json(&app, "/next-backend?service=svc-a").await;
        let (_, third) = get_json(&app, "/next-healthy-pod?service=svc-a").await;

        assert_eq!(first, json!({ "service": "svc-a", "address": "10.0.0.1" }));
        assert_eq!(second["address"], "10.0.0.2");
        assert_eq!(third, json!({ "pod_ip": "10.0.0.1" }));
    }

    #[tokio::test]
    async fn test_next_backend_not_found() {
        let (store, _tx, app) = router(&["svc-b"]);
        store.publish("svc-b", HealthSnapshot::empty(1));

        let (status, body) = get_json(&app, "/next-backend?service=svc-b").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("no healthy backend"));

        let (status, _) = get_json(&app, "/next-backend?service=unknown").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_next_backend_requires_service() {
        let (_store, _tx, app) = router(&["svc-a"]);
        let (status, body) = get_json(&app, "/next-backend").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("service"));
    }

    #[tokio::test]
    async fn test_status() {
        let (store, tx, app) = router(&["svc-a"]);
        store.publish("svc-a", HealthSnapshot::new(vec!["10.0.0.1".into()], 4));
        tx.send_replace(4);

        let (status, body) = get_json(&app, "/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["last_tick"], 4);
        assert_eq!(body["services"][0]["name"], "svc-a");
        assert_eq!(body["services"][0]["state"], "idle");
        assert_eq!(body["services"][0]["healthy"], 1);
    }
}
