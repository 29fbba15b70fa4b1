//! Hysteresis switch control
//!
//! - `value >= max` and switch not ON  → send ON
//! - `value <= min` and switch not OFF → send OFF
//! - otherwise hold (the band between thresholds never toggles)
//!
//! Ticks are single-flight: a tick that fires while another is still
//! running is skipped. Manual commands wait for the running tick instead.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio::time::{interval, MissedTickBehavior};

use crate::config::{ControlConfig, DevicesConfig};
use crate::error::{ConfigError, TuyaError};
use crate::tuya::{CommandResult, SensorReading, SignedApiClient};

/// Which derived value is compared against the thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlVariable {
    #[default]
    Temperature,
    Vpd,
}

impl ControlVariable {
    pub fn value_of(&self, reading: &SensorReading) -> f64 {
        match self {
            ControlVariable::Temperature => reading.temperature,
            ControlVariable::Vpd => reading.vpd(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchState {
    /// No command sent yet since startup
    Unknown,
    On,
    Off,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlState {
    pub switch: SwitchState,
    pub min_threshold: f64,
    pub max_threshold: f64,
}

impl ControlState {
    pub fn new(min_threshold: f64, max_threshold: f64) -> Result<Self, ConfigError> {
        validate_thresholds(min_threshold, max_threshold)?;
        Ok(Self {
            switch: SwitchState::Unknown,
            min_threshold,
            max_threshold,
        })
    }

    /// Replace both thresholds; an invalid pair leaves the state untouched
    pub fn set_thresholds(&mut self, min: f64, max: f64) -> Result<(), ConfigError> {
        validate_thresholds(min, max)?;
        self.min_threshold = min;
        self.max_threshold = max;
        Ok(())
    }

    pub fn is_device_on(&self) -> bool {
        self.switch == SwitchState::On
    }

    /// `Some(on)` when a command must be sent for `value`
    pub fn decide(&self, value: f64) -> Option<bool> {
        if value >= self.max_threshold && self.switch != SwitchState::On {
            Some(true)
        } else if value <= self.min_threshold && self.switch != SwitchState::Off {
            Some(false)
        } else {
            None
        }
    }
}

fn validate_thresholds(min: f64, max: f64) -> Result<(), ConfigError> {
    // Also rejects NaN
    if min < max {
        Ok(())
    } else {
        Err(ConfigError::InvalidThresholds { min, max })
    }
}

#[derive(Debug, Clone)]
pub enum TickOutcome {
    /// Another tick was still in flight
    Skipped,
    /// Reading inside the band or switch already in the implied state
    Held(SensorReading),
    Switched { reading: SensorReading, on: bool },
    Failed(TuyaError),
}

pub struct ControlLoop {
    client: Arc<SignedApiClient>,
    sensor_id: String,
    switch_id: String,
    switch_code: String,
    variable: ControlVariable,
    poll_interval: Duration,
    state: RwLock<ControlState>,
    in_flight: Mutex<()>,
    last_reading: RwLock<Option<SensorReading>>,
}

impl ControlLoop {
    pub fn new(
        client: Arc<SignedApiClient>,
        devices: &DevicesConfig,
        control: &ControlConfig,
    ) -> Result<Self, ConfigError> {
        let state = ControlState::new(control.min_threshold, control.max_threshold)?;

        Ok(Self {
            client,
            sensor_id: devices.sensor_id.clone(),
            switch_id: devices.switch_id.clone(),
            switch_code: devices.switch_code.clone(),
            variable: control.variable,
            poll_interval: Duration::from_secs(control.poll_interval_secs.max(1)),
            state: RwLock::new(state),
            in_flight: Mutex::new(()),
            last_reading: RwLock::new(None),
        })
    }

    pub fn variable(&self) -> ControlVariable {
        self.variable
    }

    pub fn switch_code(&self) -> &str {
        &self.switch_code
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub async fn state(&self) -> ControlState {
        self.state.read().await.clone()
    }

    pub async fn last_reading(&self) -> Option<SensorReading> {
        self.last_reading.read().await.clone()
    }

    pub async fn configure(&self, min: f64, max: f64) -> Result<(), ConfigError> {
        self.state.write().await.set_thresholds(min, max)?;
        tracing::info!("[Control] Thresholds updated: min={} max={}", min, max);
        Ok(())
    }

    /// Start the control loop (runs forever)
    pub async fn start(self: Arc<Self>) {
        {
            let state = self.state.read().await;
            tracing::info!(
                "[Control] Starting control loop (interval: {}s, {:?} in [{}, {}])",
                self.poll_interval.as_secs(),
                self.variable,
                state.min_threshold,
                state.max_threshold
            );
        }

        let mut interval_timer = interval(self.poll_interval);
        interval_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval_timer.tick().await;

            let this = self.clone();
            tokio::spawn(async move {
                this.tick().await;
            });
        }
    }

    /// Fetch one reading and act on it
    pub async fn tick(&self) -> TickOutcome {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::debug!("[Control] Previous tick still running, skipping");
            return TickOutcome::Skipped;
        };

        let reading = match self.client.get_status(&self.sensor_id).await {
            Ok(reading) => reading,
            Err(e) => {
                tracing::warn!("[Control] Sensor read failed, switch left unchanged: {}", e);
                return TickOutcome::Failed(e);
            }
        };

        *self.last_reading.write().await = Some(reading.clone());

        let value = self.variable.value_of(&reading);
        let decision = self.state.read().await.decide(value);

        let Some(on) = decision else {
            tracing::debug!("[Control] {:?} = {:.2}, holding", self.variable, value);
            return TickOutcome::Held(reading);
        };

        tracing::info!(
            "[Control] {:?} = {:.2}, switching {}",
            self.variable,
            value,
            if on { "ON" } else { "OFF" }
        );

        match self.actuate(on).await {
            Ok(_) => TickOutcome::Switched { reading, on },
            Err(e) => {
                tracing::error!("[Control] Switch command failed: {}", e);
                TickOutcome::Failed(e)
            }
        }
    }

    /// Manual switch, serialized with running ticks
    pub async fn set_switch(&self, on: bool) -> Result<CommandResult, TuyaError> {
        let _guard = self.in_flight.lock().await;
        self.actuate(on).await
    }

    async fn actuate(&self, on: bool) -> Result<CommandResult, TuyaError> {
        let result = self
            .client
            .send_command(&self.switch_id, &self.switch_code, serde_json::Value::Bool(on))
            .await?;

        self.state.write().await.switch = if on { SwitchState::On } else { SwitchState::Off };
        Ok(result)
    }
}
