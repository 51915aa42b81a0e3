//! Input signal endpoints.
//!
//! The host control bus writes gate levels, period lengths and reset-signal
//! levels here. Reset signals are edge-triggered: only a `false -> true`
//! change acknowledges, so a bus that repeats the same level is harmless.

use axum::extract::{Path, State};
use axum::routing::put;
use axum::{Json, Router};
use hourmeter_core::{AckOutcome, AlarmId, OutputChange, TimerId, TimerSnapshot};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::api::engine_mut;
use crate::api::error::ApiResult;
use crate::state::SharedState;

/// Creates the inputs router.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/gates/{timer}", put(set_gate))
        .route("/periods/{alarm}", put(set_period))
        .route("/reset/{alarm}", put(set_reset_signal))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to set a gate input.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[schema(example = json!({ "on": true }))]
pub struct GateRequest {
    /// Whether the timer should accumulate.
    pub on: bool,
}

/// Request to set a period length input.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[schema(example = json!({ "minutes": 480 }))]
pub struct PeriodRequest {
    /// Maintenance period in minutes.
    #[schema(example = 480, minimum = 0)]
    pub minutes: u32,
}

/// Request to set the level of a reset signal.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[schema(example = json!({ "value": true }))]
pub struct ResetSignalRequest {
    /// Signal level.
    pub value: bool,
}

/// Response after a reset signal update.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResetSignalResponse {
    /// Whether the update was a rising edge.
    pub rising_edge: bool,

    /// Acknowledgment result, present on a rising edge.
    pub outcome: Option<AckOutcome>,

    /// Outputs that changed because of the acknowledgment.
    pub changes: Vec<OutputChange>,

    /// Timer state after the update.
    pub timer: TimerSnapshot,
}

// ============================================================================
// Handlers
// ============================================================================

/// Set a gate input.
#[utoipa::path(
    put,
    path = "/api/inputs/gates/{timer}",
    tag = "inputs",
    operation_id = "setGate",
    summary = "Set gate input",
    description = "Sets the machine_on, spindle_on or running input. The timer \
        accumulates one second per tick while its gate is on.",
    params(
        ("timer" = String, Path, description = "machine, spindle or running")
    ),
    request_body = GateRequest,
    responses(
        (status = 200, description = "Gate updated", body = TimerSnapshot),
        (status = 404, description = "Unknown timer", body = crate::api::ErrorResponse)
    )
)]
pub async fn set_gate(
    State(state): State<SharedState>,
    Path(timer): Path<String>,
    Json(request): Json<GateRequest>,
) -> ApiResult<Json<TimerSnapshot>> {
    let timer: TimerId = timer.parse()?;
    let mut state_guard = state.write().await;
    let engine = engine_mut(&mut state_guard)?;

    if engine.gate(timer) != request.on {
        info!(timer = %timer, on = request.on, "Gate changed");
    }
    engine.set_gate(timer, request.on);

    Ok(Json(engine.timer_snapshot(timer)))
}

/// Set a period length input.
#[utoipa::path(
    put,
    path = "/api/inputs/periods/{alarm}",
    tag = "inputs",
    operation_id = "setPeriod",
    summary = "Set maintenance period",
    description = "Sets periode_time_machine or periode_time_spindle in minutes. \
        The alarm is re-evaluated on the next tick.",
    params(
        ("alarm" = String, Path, description = "machine or spindle")
    ),
    request_body = PeriodRequest,
    responses(
        (status = 200, description = "Period updated", body = TimerSnapshot),
        (status = 404, description = "Unknown alarm", body = crate::api::ErrorResponse)
    )
)]
pub async fn set_period(
    State(state): State<SharedState>,
    Path(alarm): Path<String>,
    Json(request): Json<PeriodRequest>,
) -> ApiResult<Json<TimerSnapshot>> {
    let alarm: AlarmId = alarm.parse()?;
    let mut state_guard = state.write().await;
    let engine = engine_mut(&mut state_guard)?;

    engine.set_period_minutes(alarm, request.minutes);
    info!(alarm = %alarm, minutes = request.minutes, "Maintenance period set");

    Ok(Json(engine.timer_snapshot(alarm.into())))
}

/// Set the level of a reset signal.
#[utoipa::path(
    put,
    path = "/api/inputs/reset/{alarm}",
    tag = "inputs",
    operation_id = "setResetSignal",
    summary = "Set reset signal level",
    description = "Sets reset_alarm_machine or reset_alarm_spindle. A false to true \
        change acknowledges the alarm; repeated levels and falling edges do nothing.",
    params(
        ("alarm" = String, Path, description = "machine or spindle")
    ),
    request_body = ResetSignalRequest,
    responses(
        (status = 200, description = "Signal applied", body = ResetSignalResponse),
        (status = 404, description = "Unknown alarm", body = crate::api::ErrorResponse)
    )
)]
pub async fn set_reset_signal(
    State(state): State<SharedState>,
    Path(alarm): Path<String>,
    Json(request): Json<ResetSignalRequest>,
) -> ApiResult<Json<ResetSignalResponse>> {
    let alarm: AlarmId = alarm.parse()?;
    let mut state_guard = state.write().await;
    let engine = engine_mut(&mut state_guard)?;

    let outcome = engine.set_reset_signal(alarm, request.value);

    Ok(Json(ResetSignalResponse {
        rising_edge: outcome.is_some(),
        outcome,
        changes: outcome
            .map(|outcome| OutputChange::from_acknowledgment(alarm, outcome))
            .unwrap_or_default(),
        timer: engine.timer_snapshot(alarm.into()),
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::create_router;
    use crate::api::test_support::send;
    use crate::state::test_state;
    use crate::ticker::tick_once;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_gate_enables_accumulation() {
        let state = test_state();
        let router = create_router(state.clone());

        let (status, body) = send(
            &router,
            Method::PUT,
            "/api/inputs/gates/spindle",
            Some(json!({ "on": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["gate"], true);

        for _ in 0..3 {
            tick_once(&state).await.unwrap();
        }
        let (_, body) = send(&router, Method::GET, "/api/timers/spindle", None).await;
        assert_eq!(body["elapsed_seconds"], 3);
    }

    #[tokio::test]
    async fn test_period_input_moves_boundary() {
        let router = create_router(test_state());
        let (status, body) = send(
            &router,
            Method::PUT,
            "/api/inputs/periods/machine",
            Some(json!({ "minutes": 480 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["alarm"]["period_minutes"], 480);
        assert_eq!(body["alarm"]["boundary_seconds"], 480 * 60);
    }

    #[tokio::test]
    async fn test_running_has_no_period() {
        let router = create_router(test_state());
        let (status, _) = send(
            &router,
            Method::PUT,
            "/api/inputs/periods/running",
            Some(json!({ "minutes": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reset_signal_is_edge_triggered() {
        let state = test_state();
        state
            .write()
            .await
            .engine
            .as_mut()
            .unwrap()
            .set_gate(hourmeter_core::TimerId::Machine, true);
        for _ in 0..61 {
            tick_once(&state).await.unwrap();
        }
        let router = create_router(state);

        let (status, body) = send(
            &router,
            Method::PUT,
            "/api/inputs/reset/machine",
            Some(json!({ "value": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rising_edge"], true);
        assert_eq!(body["outcome"]["outcome"], "acknowledged");
        assert_eq!(body["outcome"]["elapsed_periods"], 1);
        assert_eq!(body["changes"][1]["kind"], "periods");
        assert_eq!(body["changes"][1]["elapsed_periods"], 1);
        assert_eq!(body["timer"]["alarm"]["active"], false);

        // The bus repeats the level; nothing happens.
        let (_, body) = send(
            &router,
            Method::PUT,
            "/api/inputs/reset/machine",
            Some(json!({ "value": true })),
        )
        .await;
        assert_eq!(body["rising_edge"], false);
        assert!(body["outcome"].is_null());
        assert_eq!(body["changes"], json!([]));
        assert_eq!(body["timer"]["alarm"]["elapsed_periods"], 1);
    }
}
