//! Live VPD and history handlers

use axum::{extract::State, Json};

use crate::error::AppError;
use crate::models::{HistoryBucket, VpdResponse};
use crate::state::AppState;

/// GET /vpd - Live reading from the sensor
pub async fn get_vpd(State(state): State<AppState>) -> Result<Json<VpdResponse>, AppError> {
    let reading = state.client.get_status(&state.sensor_id).await?;
    Ok(Json(VpdResponse::from(&reading)))
}

/// GET /vpd/history - Per-minute averages
pub async fn get_vpd_history(
    State(state): State<AppState>,
) -> Result<Json<Vec<HistoryBucket>>, AppError> {
    let history = state.samples.history().await?;
    Ok(Json(history))
}
