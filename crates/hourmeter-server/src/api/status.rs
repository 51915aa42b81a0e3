//! Timer status endpoints.
//!
//! Exposes every output of the engine: accumulated seconds, the formatted
//! `H:MM:SS` labels, alarm levels and acknowledged period counts.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use hourmeter_core::{TimerId, TimerSnapshot};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::engine;
use crate::api::error::ApiResult;
use crate::state::SharedState;

/// Full status response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    /// Server version.
    #[schema(example = "0.1.0")]
    pub version: String,

    /// When the server started (UTC).
    pub started_at_utc: DateTime<Utc>,

    /// Server uptime in seconds.
    #[schema(example = 3600)]
    pub uptime_secs: u64,

    /// Milliseconds between engine ticks.
    #[schema(example = 1000)]
    pub tick_interval_ms: u64,

    /// Machine, spindle and running timers.
    pub timers: Vec<TimerSnapshot>,
}

/// Get every timer.
#[utoipa::path(
    get,
    path = "/api/status",
    tag = "timers",
    operation_id = "getStatus",
    summary = "Get all timers",
    description = "Returns inputs and outputs of the machine, spindle and running \
        timers, including formatted labels and alarm state.",
    responses(
        (status = 200, description = "Status retrieved", body = StatusResponse),
        (status = 503, description = "Engine shutting down", body = crate::api::ErrorResponse)
    )
)]
pub async fn get_status(State(state): State<SharedState>) -> ApiResult<Json<StatusResponse>> {
    let state_guard = state.read().await;
    let snapshot = engine(&state_guard)?.snapshot();

    Ok(Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        started_at_utc: state_guard.started_at,
        uptime_secs: state_guard.uptime_secs(),
        tick_interval_ms: state_guard.config.engine.tick_interval_ms,
        timers: snapshot.timers,
    }))
}

/// Get one timer.
#[utoipa::path(
    get,
    path = "/api/timers/{timer}",
    tag = "timers",
    operation_id = "getTimer",
    summary = "Get one timer",
    params(
        ("timer" = String, Path, description = "machine, spindle or running")
    ),
    responses(
        (status = 200, description = "Timer retrieved", body = TimerSnapshot),
        (status = 404, description = "Unknown timer", body = crate::api::ErrorResponse)
    )
)]
pub async fn get_timer(
    State(state): State<SharedState>,
    Path(timer): Path<String>,
) -> ApiResult<Json<TimerSnapshot>> {
    let timer: TimerId = timer.parse()?;
    let state_guard = state.read().await;
    Ok(Json(engine(&state_guard)?.timer_snapshot(timer)))
}
