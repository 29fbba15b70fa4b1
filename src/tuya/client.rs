//! Signed device status and command calls

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::sign::{timestamp_millis, SignedRequest};
use super::token::AuthTokenProvider;
use super::transport::CloudTransport;
use super::{TuyaResponse, TOKEN_INVALID_CODE};
use crate::error::TuyaError;

pub const TEMPERATURE_CODE: &str = "va_temperature";
pub const HUMIDITY_CODE: &str = "va_humidity";

/// Sensor values are transmitted as the true value x10
const VALUE_SCALE: f64 = 10.0;

#[derive(Debug, Clone, Serialize)]
pub struct SensorReading {
    pub temperature: f64,
    pub humidity: f64,
    pub observed_at: DateTime<Utc>,
}

impl SensorReading {
    pub fn vpd(&self) -> f64 {
        crate::vpd::vapor_pressure_deficit(self.temperature, self.humidity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

#[derive(Debug, Serialize)]
struct DeviceCommand<'a> {
    code: &'a str,
    value: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct CommandBody<'a> {
    commands: Vec<DeviceCommand<'a>>,
}

#[derive(Debug, Deserialize)]
struct DeviceStatus {
    #[serde(default)]
    id: String,
    #[serde(default)]
    status: Vec<StatusEntry>,
}

#[derive(Debug, Deserialize)]
struct StatusEntry {
    code: String,
    value: serde_json::Value,
}

pub struct SignedApiClient {
    tokens: Arc<AuthTokenProvider>,
    transport: Arc<dyn CloudTransport>,
}

impl SignedApiClient {
    pub fn new(tokens: Arc<AuthTokenProvider>, transport: Arc<dyn CloudTransport>) -> Self {
        Self { tokens, transport }
    }

    pub fn status_path(device_id: &str) -> String {
        format!("/v1.0/iot-03/devices/status?device_ids={}", device_id)
    }

    pub fn command_path(device_id: &str) -> String {
        format!("/v1.0/iot-03/devices/{}/commands", device_id)
    }

    /// Current temperature/humidity of a sensor
    pub async fn get_status(&self, device_id: &str) -> Result<SensorReading, TuyaError> {
        let token = self.tokens.get_token().await?;
        let credentials = self.tokens.credentials();
        let path = Self::status_path(device_id);

        let request = SignedRequest::new(
            credentials,
            Some(&token.value),
            Method::GET,
            &path,
            b"",
            timestamp_millis(),
        )?
        .into_request(credentials, Some(&token.value), None);

        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| TuyaError::Request(format!("Status request failed: {}", e)))?;

        let envelope: TuyaResponse<Vec<DeviceStatus>> = serde_json::from_value(response)
            .map_err(|e| TuyaError::Parse(format!("Status parse failed: {}", e)))?;

        if !envelope.success {
            self.handle_rejection(envelope.code).await;
            return Err(TuyaError::Request(envelope.error_message()));
        }

        let devices = envelope.result.unwrap_or_default();
        parse_reading(device_id, &devices)
    }

    /// Send a single `{code, value}` command to a device
    pub async fn send_command(
        &self,
        device_id: &str,
        code: &str,
        value: serde_json::Value,
    ) -> Result<CommandResult, TuyaError> {
        let token = self.tokens.get_token().await?;
        let credentials = self.tokens.credentials();
        let path = Self::command_path(device_id);

        let body = serde_json::to_vec(&CommandBody {
            commands: vec![DeviceCommand { code, value }],
        })
        .map_err(|e| TuyaError::Command(format!("Command encode failed: {}", e)))?;

        // Hash and send the same buffer
        let request = SignedRequest::new(
            credentials,
            Some(&token.value),
            Method::POST,
            &path,
            &body,
            timestamp_millis(),
        )?
        .into_request(credentials, Some(&token.value), Some(body));

        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| TuyaError::Command(format!("Command request failed: {}", e)))?;

        let envelope: TuyaResponse<serde_json::Value> = serde_json::from_value(response)
            .map_err(|e| TuyaError::Command(format!("Command response parse failed: {}", e)))?;

        if !envelope.success {
            self.handle_rejection(envelope.code).await;
            return Err(TuyaError::Command(envelope.error_message()));
        }

        tracing::info!("[Tuya] Command sent to {}: {}", device_id, code);

        Ok(CommandResult {
            success: true,
            result: envelope.result,
            msg: envelope.msg,
        })
    }

    async fn handle_rejection(&self, code: Option<i64>) {
        if code == Some(TOKEN_INVALID_CODE) {
            self.tokens.invalidate().await;
        }
    }
}

fn parse_reading(device_id: &str, devices: &[DeviceStatus]) -> Result<SensorReading, TuyaError> {
    let device = devices
        .iter()
        .find(|d| d.id == device_id)
        .ok_or_else(|| TuyaError::Parse(format!("No status returned for {}", device_id)))?;

    let scaled = |code: &str| -> Result<f64, TuyaError> {
        let entry = device
            .status
            .iter()
            .find(|s| s.code == code)
            .ok_or_else(|| TuyaError::Parse(format!("Missing {} in status", code)))?;
        entry
            .value
            .as_f64()
            .map(|raw| raw / VALUE_SCALE)
            .ok_or_else(|| TuyaError::Parse(format!("Non-numeric {}: {}", code, entry.value)))
    };

    Ok(SensorReading {
        temperature: scaled(TEMPERATURE_CODE)?,
        humidity: scaled(HUMIDITY_CODE)?,
        observed_at: Utc::now(),
    })
}
