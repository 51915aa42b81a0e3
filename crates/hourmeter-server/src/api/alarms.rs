//! Alarm acknowledgment endpoint.

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use hourmeter_core::{AckOutcome, AlarmId, OutputChange, TimerSnapshot};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::engine_mut;
use crate::api::error::ApiResult;
use crate::state::SharedState;

/// Creates the alarms router.
pub fn router() -> Router<SharedState> {
    Router::new().route("/{alarm}/acknowledge", post(acknowledge))
}

/// Response after an acknowledgment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "outcome": { "outcome": "acknowledged", "elapsed_periods": 1 },
    "changes": [
        { "kind": "alarm", "alarm": "machine", "active": false },
        { "kind": "periods", "alarm": "machine", "elapsed_periods": 1 }
    ],
    "timer": {
        "timer": "machine",
        "gate": true,
        "elapsed_seconds": 61,
        "label": "0:01:01",
        "alarm": {
            "period_minutes": 1,
            "elapsed_periods": 1,
            "state": "accumulating",
            "active": false,
            "boundary_seconds": 120,
            "reset_signal": false
        }
    }
}))]
pub struct AcknowledgeResponse {
    /// What the acknowledgment did.
    pub outcome: AckOutcome,

    /// Outputs that changed, empty when nothing was acknowledged.
    pub changes: Vec<OutputChange>,

    /// Timer state afterwards.
    pub timer: TimerSnapshot,
}

/// Acknowledge an alarm.
///
/// Operator action equivalent to a rising edge on the reset signal, without
/// touching the signal's edge state.
#[utoipa::path(
    post,
    path = "/api/alarms/{alarm}/acknowledge",
    tag = "alarms",
    operation_id = "acknowledgeAlarm",
    summary = "Acknowledge a maintenance alarm",
    description = "Clears an active alarm and advances the period counter by one. \
        Acknowledging while no alarm is active changes nothing and reports not_alarmed.",
    params(
        ("alarm" = String, Path, description = "machine or spindle")
    ),
    responses(
        (status = 200, description = "Acknowledgment processed", body = AcknowledgeResponse),
        (status = 404, description = "Unknown alarm", body = crate::api::ErrorResponse)
    )
)]
pub async fn acknowledge(
    State(state): State<SharedState>,
    Path(alarm): Path<String>,
) -> ApiResult<Json<AcknowledgeResponse>> {
    let alarm: AlarmId = alarm.parse()?;
    let mut state_guard = state.write().await;
    let engine = engine_mut(&mut state_guard)?;

    let outcome = engine.acknowledge(alarm);

    Ok(Json(AcknowledgeResponse {
        outcome,
        changes: OutputChange::from_acknowledgment(alarm, outcome),
        timer: engine.timer_snapshot(alarm.into()),
    }))
}
