//! Query interface handlers.

use std::collections::BTreeMap;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use crate::health::TickState;
use crate::http::server::AppState;
use crate::load_balancer::SelectError;

/// Error body returned by the query interface.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Handler error with its HTTP status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn missing_service() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "missing `service` query parameter".to_string(),
        }
    }
}

impl From<SelectError> for ApiError {
    fn from(err: SelectError) -> Self {
        // both are "nothing to route to" from the caller's point of view
        Self {
            status: StatusCode::NOT_FOUND,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct ServiceQuery {
    pub service: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NextBackend {
    pub service: String,
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NextPod {
    pub pod_ip: String,
}

#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub name: String,
    pub state: Option<TickState>,
    pub healthy: Option<usize>,
    pub tick: Option<u64>,
    pub taken_at_ms: Option<u64>,
}

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub last_tick: u64,
    pub services: Vec<ServiceStatus>,
}

/// Every configured service with its healthy addresses (`[]` when none or not yet probed).
pub async fn healthy_backends(State(state): State<AppState>) -> Json<BTreeMap<String, Vec<String>>> {
    let listing = state
        .selector
        .store()
        .all()
        .into_iter()
        .map(|(name, snap)| (name, snap.map(|s| s.addresses.clone()).unwrap_or_default()))
        .collect();
    Json(listing)
}

fn pick(state: &AppState, query: ServiceQuery) -> Result<(String, String), ApiError> {
    let service = query
        .service
        .filter(|s| !s.is_empty())
        .ok_or_else(ApiError::missing_service)?;
    let address = state.selector.next(&service)?;
    tracing::debug!(service = %service, address = %address, "Selected backend");
    Ok((service, address))
}

/// Next address for a service in round-robin order.
pub async fn next_backend(
    State(state): State<AppState>,
    Query(query): Query<ServiceQuery>,
) -> Result<Json<NextBackend>, ApiError> {
    let (service, address) = pick(&state, query)?;
    Ok(Json(NextBackend { service, address }))
}

/// Same selection, in the `{"pod_ip": ...}` shape older clients expect.
pub async fn next_healthy_pod(
    State(state): State<AppState>,
    Query(query): Query<ServiceQuery>,
) -> Result<Json<NextPod>, ApiError> {
    let (_, address) = pick(&state, query)?;
    Ok(Json(NextPod { pod_ip: address }))
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let services = state
        .selector
        .store()
        .all()
        .into_iter()
        .map(|(name, snap)| ServiceStatus {
            state: state.states.get(&name),
            healthy: snap.as_ref().map(|s| s.len()),
            tick: snap.as_ref().map(|s| s.tick),
            taken_at_ms: snap.as_ref().map(|s| s.taken_at_ms),
            name,
        })
        .collect();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        last_tick: *state.ticks.borrow(),
        services,
    })
}

pub async fn liveness() -> &'static str {
    "OK"
}
