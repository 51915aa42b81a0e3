//! Health check API endpoint.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::SharedState;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "status": "ok",
    "version": "0.1.0",
    "engine_running": true
}))]
pub struct HealthResponse {
    /// Service status.
    #[schema(example = "ok")]
    pub status: String,

    /// Service version from Cargo.toml.
    #[schema(example = "0.1.0")]
    pub version: String,

    /// Whether the engine is still accepting events.
    #[schema(example = true)]
    pub engine_running: bool,
}

/// Creates the health router.
pub fn router() -> Router<SharedState> {
    Router::new().route("/", get(health_check))
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    operation_id = "healthCheck",
    summary = "Check service health",
    description = "Returns service status and whether the engine is running.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<SharedState>) -> Json<HealthResponse> {
    let engine_running = state.read().await.engine.is_some();

    Json(HealthResponse {
        status: if engine_running { "ok" } else { "stopping" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine_running,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::create_router;
    use crate::api::test_support::send;
    use crate::state::test_state;
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_health_reports_running_engine() {
        let router = create_router(test_state());
        let (status, body) = send(&router, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["engine_running"], true);
    }

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok".to_string(),
            version: "0.1.0".to_string(),
            engine_running: false,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"engine_running\":false"));
    }
}
