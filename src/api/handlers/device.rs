//! Manual device control handlers

use axum::{extract::State, Json};

use crate::error::AppError;
use crate::models::CommandRequest;
use crate::state::AppState;
use crate::tuya::CommandResult;

use super::SuccessResponse;

/// POST /device/on
pub async fn turn_on(State(state): State<AppState>) -> Result<Json<SuccessResponse>, AppError> {
    let result = state.control.set_switch(true).await?;
    Ok(Json(SuccessResponse::with_data("Device switched on", result)))
}

/// POST /device/off
pub async fn turn_off(State(state): State<AppState>) -> Result<Json<SuccessResponse>, AppError> {
    let result = state.control.set_switch(false).await?;
    Ok(Json(SuccessResponse::with_data("Device switched off", result)))
}

/// POST /api/device/commands - Arbitrary `{code, value}` for the switch device
///
/// The control loop's own switch code goes through the loop so its state
/// follows the device.
pub async fn send_device_command(
    State(state): State<AppState>,
    Json(req): Json<CommandRequest>,
) -> Result<Json<CommandResult>, AppError> {
    if req.code.trim().is_empty() {
        return Err(AppError::BadRequest("code must not be empty".to_string()));
    }

    if req.code == state.control.switch_code() {
        let on = req.value.as_bool().ok_or_else(|| {
            AppError::BadRequest(format!("{} expects a boolean value", req.code))
        })?;
        return Ok(Json(state.control.set_switch(on).await?));
    }

    let result = state
        .client
        .send_command(&state.switch_id, &req.code, req.value)
        .await?;

    Ok(Json(result))
}
