//! On-demand persistence of the counters.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use hourmeter_core::Counters;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::engine;
use crate::api::error::ApiResult;
use crate::state::SharedState;

/// Response after writing the counters.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "counters": {
        "machine_time": 7265,
        "spindle_time": 3600,
        "running_time": 1800,
        "num_periodes_machine": 2,
        "num_periodes_spindle": 1
    },
    "saved_at_utc": "2026-10-16T08:30:00Z"
}))]
pub struct CheckpointResponse {
    /// Counters as written to the store.
    pub counters: Counters,

    /// When the write completed.
    pub saved_at_utc: DateTime<Utc>,
}

/// Write the counters to the state store now.
#[utoipa::path(
    post,
    path = "/api/checkpoint",
    tag = "timers",
    operation_id = "checkpoint",
    summary = "Persist counters now",
    description = "Writes the current counters to the state store without stopping \
        the engine. Counters are also written on shutdown.",
    responses(
        (status = 200, description = "Counters written", body = CheckpointResponse),
        (status = 500, description = "The store rejected the write", body = crate::api::ErrorResponse),
        (status = 503, description = "Engine shutting down", body = crate::api::ErrorResponse)
    )
)]
pub async fn checkpoint(State(state): State<SharedState>) -> ApiResult<Json<CheckpointResponse>> {
    let state_guard = state.read().await;
    let counters = engine(&state_guard)?.checkpoint()?;

    Ok(Json(CheckpointResponse {
        counters,
        saved_at_utc: Utc::now(),
    }))
}
