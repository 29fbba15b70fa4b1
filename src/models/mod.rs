//! Data models for the VPD monitor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::control::{ControlState, ControlVariable, SwitchState};
use crate::tuya::SensorReading;
use crate::vpd::round2;

// ============================================================================
// Samples
// ============================================================================

/// One persisted sensor sample
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sample {
    pub temperature: f64,
    pub humidity: f64,
    pub vpd: f64,
    pub timestamp: DateTime<Utc>,
}

impl From<&SensorReading> for Sample {
    fn from(reading: &SensorReading) -> Self {
        Self {
            temperature: reading.temperature,
            humidity: reading.humidity,
            vpd: reading.vpd(),
            timestamp: reading.observed_at,
        }
    }
}

/// Per-minute averages for the history chart
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistoryBucket {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "avgVPD")]
    pub avg_vpd: f64,
    #[serde(rename = "avgTemperature")]
    pub avg_temperature: f64,
    #[serde(rename = "avgHumidity")]
    pub avg_humidity: f64,
}

// ============================================================================
// API payloads
// ============================================================================

#[derive(Debug, Serialize)]
pub struct VpdResponse {
    pub temperature: f64,
    pub humidity: f64,
    pub vpd: f64,
    pub timestamp: DateTime<Utc>,
}

impl From<&SensorReading> for VpdResponse {
    fn from(reading: &SensorReading) -> Self {
        Self {
            temperature: reading.temperature,
            humidity: reading.humidity,
            vpd: round2(reading.vpd()),
            timestamp: reading.observed_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub code: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct UpdateThresholdsRequest {
    pub min_threshold: f64,
    pub max_threshold: f64,
}

#[derive(Debug, Serialize)]
pub struct ControlStatus {
    pub variable: ControlVariable,
    pub switch: SwitchState,
    pub min_threshold: f64,
    pub max_threshold: f64,
    pub poll_interval_secs: u64,
    pub last_reading: Option<VpdResponse>,
}

impl ControlStatus {
    pub fn new(
        variable: ControlVariable,
        state: ControlState,
        poll_interval_secs: u64,
        last_reading: Option<&SensorReading>,
    ) -> Self {
        Self {
            variable,
            switch: state.switch,
            min_threshold: state.min_threshold,
            max_threshold: state.max_threshold,
            poll_interval_secs,
            last_reading: last_reading.map(VpdResponse::from),
        }
    }
}
