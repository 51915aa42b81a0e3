//! OpenAPI specification generation for the hourmeter API.

use axum::Json;
use hourmeter_core::{
    AckOutcome, AlarmId, AlarmSnapshot, AlarmState, Counters, OutputChange, TimerId, TimerSnapshot,
};
use utoipa::OpenApi;

use super::alarms::AcknowledgeResponse;
use super::checkpoint::CheckpointResponse;
use super::error::ErrorResponse;
use super::health::HealthResponse;
use super::inputs::{GateRequest, PeriodRequest, ResetSignalRequest, ResetSignalResponse};
use super::status::StatusResponse;

/// Serve the OpenAPI specification as JSON at `/api/openapi.json`.
pub async fn get_openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Returns the OpenAPI specification as a pretty JSON string.
///
/// # Errors
///
/// Returns an error if the document cannot be serialized.
pub fn get_openapi_json() -> serde_json::Result<String> {
    ApiDoc::openapi().to_pretty_json()
}

/// Main OpenAPI document structure for hourmeter.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "hourmeter API",
        version = "0.1.0",
        description = r#"
# hourmeter API

Tracks machine-on, spindle and program-running time and raises maintenance
alarms when a configured period is exceeded.

## Signals

- **Gates** (`machine_on`, `spindle_on`, `running`): a timer counts one second per tick while its gate is on.
- **Periods** (`periode_time_machine`, `periode_time_spindle`): maintenance interval in minutes.
- **Reset signals** (`reset_alarm_machine`, `reset_alarm_spindle`): a false to true edge acknowledges the alarm.

An alarm fires once elapsed seconds exceed `period * 60 * (elapsed_periods + 1)`.
Acknowledging clears it and bumps `elapsed_periods`; acknowledging with no
active alarm does nothing.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/", description = "Local hourmeter server")
    ),
    tags(
        (name = "system", description = "Health checks"),
        (name = "timers", description = "Accumulated time, labels and alarm outputs"),
        (name = "inputs", description = "Gate, period and reset-signal inputs"),
        (name = "alarms", description = "Maintenance alarm acknowledgment")
    ),
    paths(
        super::health::health_check,
        super::status::get_status,
        super::status::get_timer,
        super::inputs::set_gate,
        super::inputs::set_period,
        super::inputs::set_reset_signal,
        super::alarms::acknowledge,
        super::checkpoint::checkpoint,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            StatusResponse,
            TimerSnapshot,
            AlarmSnapshot,
            AlarmState,
            AckOutcome,
            OutputChange,
            Counters,
            TimerId,
            AlarmId,
            GateRequest,
            PeriodRequest,
            ResetSignalRequest,
            ResetSignalResponse,
            AcknowledgeResponse,
            CheckpointResponse,
        )
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_generation() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "hourmeter API");
        assert!(spec
            .paths
            .paths
            .contains_key("/api/alarms/{alarm}/acknowledge"));
        assert!(spec.paths.paths.contains_key("/api/checkpoint"));
    }

    #[test]
    fn test_openapi_json_serialization() {
        let json = get_openapi_json().unwrap();
        assert!(json.contains("\"openapi\":"));
        assert!(json.contains("\"hourmeter API\""));
    }
}
