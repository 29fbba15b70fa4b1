//! HTTP handlers module

mod control;
mod device;
mod vpd;

pub use self::control::*;
pub use self::device::*;
pub use self::vpd::*;

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

use crate::state::AppState;
use crate::tuya::CommandResult;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub sample_store: String,
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "tuya-vpd-monitor".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        sample_store: state.samples.name().to_string(),
    })
}

/// Generic success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<CommandResult>,
}

impl SuccessResponse {
    pub fn with_data(message: impl Into<String>, data: CommandResult) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
        Router,
    };
    use tower::ServiceExt;

    use crate::config::{ControlConfig, DevicesConfig};
    use crate::control::ControlLoop;
    use crate::db::MemorySampleStore;
    use crate::models::Sample;
    use crate::state::AppState;
    use crate::tuya::mock::{self, MockTransport};
    use crate::tuya::{AuthTokenProvider, Credentials, SignedApiClient};

    fn app(transport: Arc<MockTransport>) -> (Router, AppState) {
        let tokens = Arc::new(AuthTokenProvider::new(
            Credentials::new("test_client", "test_secret"),
            transport.clone(),
        ));
        let client = Arc::new(SignedApiClient::new(tokens, transport));
        let devices = DevicesConfig {
            sensor_id: "sensor".to_string(),
            switch_id: "switch".to_string(),
            switch_code: "switch_1".to_string(),
        };
        let control = ControlConfig {
            min_threshold: 24.0,
            max_threshold: 26.0,
            ..ControlConfig::default()
        };
        let control = Arc::new(ControlLoop::new(client.clone(), &devices, &control).unwrap());

        let state = AppState {
            client,
            control,
            samples: Arc::new(MemorySampleStore::new(100)),
            sensor_id: devices.sensor_id.clone(),
            switch_id: devices.switch_id.clone(),
            start_time: std::time::Instant::now(),
        };

        (crate::api::routes().with_state(state.clone()), state)
    }

    fn healthy_cloud() -> Arc<MockTransport> {
        Arc::new(MockTransport::new(mock::cloud(|| mock::status("sensor", 250, 600))))
    }

    async fn call(
        app: Router,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(healthy_cloud());
        let (status, body) = call(app, Method::GET, "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["sample_store"], "memory");
    }

    #[tokio::test]
    async fn test_live_vpd() {
        let (app, _) = app(healthy_cloud());
        let (status, body) = call(app, Method::GET, "/vpd", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["temperature"], 25.0);
        assert_eq!(body["humidity"], 60.0);
        assert_eq!(body["vpd"], 1.27);
    }

    #[tokio::test]
    async fn test_live_vpd_upstream_failure() {
        let (app, _) = app(Arc::new(MockTransport::new(|_| Err("down".to_string()))));
        let (status, body) = call(app, Method::GET, "/vpd", None).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["status"], 502);
    }

    #[tokio::test]
    async fn test_history() {
        let (app, state) = app(healthy_cloud());
        state
            .samples
            .insert(&Sample {
                temperature: 25.0,
                humidity: 60.0,
                vpd: 1.27,
                timestamp: chrono::Utc::now(),
            })
            .await
            .unwrap();

        let (status, body) = call(app, Method::GET, "/vpd/history", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["avgVPD"], 1.27);
        assert_eq!(body[0]["avgTemperature"], 25.0);
    }

    #[tokio::test]
    async fn test_turn_on_tracks_state() {
        let transport = healthy_cloud();
        let (app, state) = app(transport.clone());
        let (status, body) = call(app.clone(), Method::POST, "/device/on", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(state.control.state().await.is_device_on());

        let (_, body) = call(app, Method::GET, "/api/control", None).await;
        assert_eq!(body["switch"], "on");
        assert_eq!(transport.requests_to("/devices/switch/commands").len(), 1);
    }

    #[tokio::test]
    async fn test_custom_command() {
        let transport = healthy_cloud();
        let (app, _) = app(transport.clone());
        let (status, body) = call(
            app,
            Method::POST,
            "/api/device/commands",
            Some(serde_json::json!({ "code": "temp_set", "value": 24 })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let sent = transport.last_request().unwrap();
        assert_eq!(
            sent.body.unwrap(),
            br#"{"commands":[{"code":"temp_set","value":24}]}"#.to_vec()
        );
    }

    #[tokio::test]
    async fn test_switch_command_tracks_control_state() {
        let transport = Arc::new(MockTransport::new(mock::cloud(|| {
            mock::status("sensor", 270, 600)
        })));
        let (app, state) = app(transport.clone());
        let (status, _) = call(
            app.clone(),
            Method::POST,
            "/api/device/commands",
            Some(serde_json::json!({ "code": "switch_1", "value": true })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(state.control.state().await.is_device_on());

        // Already on, so a reading above max sends nothing more
        let (_, body) = call(app, Method::POST, "/api/control/tick", None).await;
        assert_eq!(body["outcome"], "held");
        assert_eq!(transport.requests_to("/commands").len(), 1);
    }

    #[tokio::test]
    async fn test_switch_command_requires_bool() {
        let transport = healthy_cloud();
        let (app, state) = app(transport.clone());
        let (status, _) = call(
            app,
            Method::POST,
            "/api/device/commands",
            Some(serde_json::json!({ "code": "switch_1", "value": 1 })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(transport.request_count(), 0);
        assert!(!state.control.state().await.is_device_on());
    }

    #[tokio::test]
    async fn test_empty_command_code_rejected() {
        let transport = healthy_cloud();
        let (app, _) = app(transport.clone());
        let (status, _) = call(
            app,
            Method::POST,
            "/api/device/commands",
            Some(serde_json::json!({ "code": " ", "value": true })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_update_thresholds() {
        let (app, state) = app(healthy_cloud());

        let (status, body) = call(
            app.clone(),
            Method::PUT,
            "/api/control/thresholds",
            Some(serde_json::json!({ "min_threshold": 22.0, "max_threshold": 23.5 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["max_threshold"], 23.5);

        let (status, _) = call(
            app,
            Method::PUT,
            "/api/control/thresholds",
            Some(serde_json::json!({ "min_threshold": 25.0, "max_threshold": 25.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let current = state.control.state().await;
        assert_eq!((current.min_threshold, current.max_threshold), (22.0, 23.5));
    }

    #[tokio::test]
    async fn test_trigger_tick() {
        let (app, _) = app(Arc::new(MockTransport::new(mock::cloud(|| {
            mock::status("sensor", 265, 600)
        }))));
        let (status, body) = call(app, Method::POST, "/api/control/tick", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "switched");
        assert_eq!(body["on"], true);
    }
}
