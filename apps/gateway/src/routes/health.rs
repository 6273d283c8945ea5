//! Health check HTTP route handlers
//!
//! Provides endpoints for checking the health of the gateway and the API
//! server behind it:
//! - `GET /health` - Simple liveness check (returns 200 OK)
//! - `GET /health/ready` - Readiness check (verifies the API server answers)
//! - `GET /health/live` - Kubernetes-style liveness probe

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use qlkube_kube_client::KubeClient;
use serde::Serialize;

/// Shared application state for health check handlers
#[derive(Debug, Clone)]
pub struct HealthState {
    /// Client used to reach the API server
    pub client: KubeClient,
}

impl HealthState {
    pub fn new(client: KubeClient) -> Self {
        Self { client }
    }
}

/// Readiness report
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubernetes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Create health check router
pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/", get(simple_health))
        .route("/live", get(liveness_probe))
        .route("/ready", get(readiness_probe))
        .with_state(state)
}

/// Simple health check - always returns OK if the server is running
async fn simple_health() -> &'static str {
    "OK"
}

/// Liveness probe for Kubernetes
///
/// Does not contact the API server; that is what readiness is for.
async fn liveness_probe() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness probe - checks the API server's `/version` endpoint
///
/// # Response
/// - 200 OK with the server's git version
/// - 503 Service Unavailable if the API server cannot be reached
async fn readiness_probe(State(state): State<HealthState>) -> impl IntoResponse {
    match state.client.version().await {
        Ok(version) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready",
                kubernetes: Some(version.git_version),
                error: None,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    status: "unavailable",
                    kubernetes: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simple_health() {
        let response = simple_health().await;
        assert_eq!(response, "OK");
    }

    #[tokio::test]
    async fn test_liveness_probe() {
        let response = liveness_probe().await;
        let json = response.into_response();
        assert_eq!(json.status(), StatusCode::OK);
    }
}
