//! Control loop handlers

use axum::{extract::State, Json};

use crate::control::TickOutcome;
use crate::error::AppError;
use crate::models::{ControlStatus, UpdateThresholdsRequest, VpdResponse};
use crate::state::AppState;

async fn control_status(state: &AppState) -> ControlStatus {
    let control = &state.control;
    ControlStatus::new(
        control.variable(),
        control.state().await,
        control.poll_interval().as_secs(),
        control.last_reading().await.as_ref(),
    )
}

/// GET /api/control
pub async fn get_control_status(State(state): State<AppState>) -> Json<ControlStatus> {
    Json(control_status(&state).await)
}

/// PUT /api/control/thresholds
pub async fn update_thresholds(
    State(state): State<AppState>,
    Json(req): Json<UpdateThresholdsRequest>,
) -> Result<Json<ControlStatus>, AppError> {
    state
        .control
        .configure(req.min_threshold, req.max_threshold)
        .await?;

    Ok(Json(control_status(&state).await))
}

/// POST /api/control/tick - Run one control decision now
pub async fn trigger_tick(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    match state.control.tick().await {
        TickOutcome::Skipped => Ok(Json(serde_json::json!({
            "outcome": "skipped",
        }))),
        TickOutcome::Held(reading) => Ok(Json(serde_json::json!({
            "outcome": "held",
            "reading": VpdResponse::from(&reading),
        }))),
        TickOutcome::Switched { reading, on } => Ok(Json(serde_json::json!({
            "outcome": "switched",
            "on": on,
            "reading": VpdResponse::from(&reading),
        }))),
        TickOutcome::Failed(e) => Err(e.into()),
    }
}
