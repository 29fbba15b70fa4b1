//! API module - HTTP handlers and routes

pub mod handlers;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/api/health", get(handlers::health_check))
        // Live reading and history
        .route("/vpd", get(handlers::get_vpd))
        .route("/vpd/history", get(handlers::get_vpd_history))
        // Manual switch
        .route("/device/on", post(handlers::turn_on))
        .route("/device/off", post(handlers::turn_off))
        .route("/api/device/commands", post(handlers::send_device_command))
        // Control loop
        .route("/api/control", get(handlers::get_control_status))
        .route("/api/control/thresholds", put(handlers::update_thresholds))
        .route("/api/control/tick", post(handlers::trigger_tick))
}
