//! HTTP API routes and handlers.
//!
//! This module contains all HTTP endpoint implementations organized by domain:
//! - `health` - Service health checks
//! - `status` - Timer snapshots and formatted labels
//! - `inputs` - Gate, period and reset-signal inputs
//! - `alarms` - Direct alarm acknowledgment
//! - `checkpoint` - On-demand persistence
//! - `error` - API error types
//! - `openapi` - OpenAPI specification generation

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::{AppState, ServerEngine, SharedState};

pub mod alarms;
pub mod checkpoint;
pub mod error;
pub mod health;
pub mod inputs;
pub mod openapi;
pub mod status;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use openapi::get_openapi_json;

/// Creates the combined API router with all endpoints.
///
/// # Route Structure
///
/// ```text
/// /health                              - Health check
/// /api
/// ├── /status                          - All timers
/// ├── /timers/{timer}                  - One timer
/// ├── /inputs/gates/{timer}            - Gate input
/// ├── /inputs/periods/{alarm}          - Period length input
/// ├── /inputs/reset/{alarm}            - Edge-triggered reset signal
/// ├── /alarms/{alarm}/acknowledge      - Direct acknowledgment
/// ├── /checkpoint                      - Persist counters now
/// └── /openapi.json                    - OpenAPI specification
/// ```
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .nest(
            "/api",
            Router::new()
                .route("/status", get(status::get_status))
                .route("/timers/{timer}", get(status::get_timer))
                .route("/checkpoint", post(checkpoint::checkpoint))
                .route("/openapi.json", get(openapi::get_openapi_spec))
                .nest("/inputs", inputs::router())
                .nest("/alarms", alarms::router()),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Borrow the engine, failing once shutdown has released it.
pub(crate) fn engine(state: &AppState) -> ApiResult<&ServerEngine> {
    state.engine.as_ref().ok_or_else(ApiError::engine_closed)
}

/// Mutably borrow the engine, failing once shutdown has released it.
pub(crate) fn engine_mut(state: &mut AppState) -> ApiResult<&mut ServerEngine> {
    state.engine.as_mut().ok_or_else(ApiError::engine_closed)
}
