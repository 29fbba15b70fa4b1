//! Error handling module

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Failures of the signed cloud API layer.
///
/// Raised to the immediate caller; the control loop is the only place that
/// swallows them (after logging).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TuyaError {
    #[error("Auth error: {0}")]
    Auth(String),

    #[error("Request error: {0}")]
    Request(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Command error: {0}")]
    Command(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid thresholds: min ({min}) must be below max ({max})")]
    InvalidThresholds { min: f64, max: f64 },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Upstream error: {0}")]
    Upstream(#[from] TuyaError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::ConfigError(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::Upstream(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
        };

        let body = Json(serde_json::json!({
            "error": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}
