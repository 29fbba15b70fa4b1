//! Configuration module

use serde::Deserialize;

use crate::control::ControlVariable;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub tuya: TuyaConfig,
    pub devices: DevicesConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub recorder: RecorderConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TuyaConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Seconds shaved off `expire_time` before a token is cached
    #[serde(default)]
    pub token_refresh_margin_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DevicesConfig {
    /// Temperature/humidity sensor
    pub sensor_id: String,
    /// On/off switch driven by the control loop
    pub switch_id: String,
    #[serde(default = "default_switch_code")]
    pub switch_code: String,
}

#[derive(Debug, Deserialize)]
pub struct ControlConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub variable: ControlVariable,
    #[serde(default = "default_min_threshold")]
    pub min_threshold: f64,
    #[serde(default = "default_max_threshold")]
    pub max_threshold: f64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            variable: ControlVariable::default(),
            min_threshold: default_min_threshold(),
            max_threshold: default_max_threshold(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecorderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_poll_interval")]
    pub interval_secs: u64,
    /// Samples kept when running without MongoDB (one day at 15s)
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_poll_interval(),
            memory_capacity: default_memory_capacity(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    pub mongodb_url: Option<String>,
    #[serde(default = "default_database")]
    pub database: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            mongodb_url: None,
            database: default_database(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> String {
    "public".to_string()
}

fn default_base_url() -> String {
    "https://openapi.tuyaus.com".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_switch_code() -> String {
    "switch_1".to_string()
}

fn default_true() -> bool {
    true
}

fn default_min_threshold() -> f64 {
    27.0
}

fn default_max_threshold() -> f64 {
    28.0
}

fn default_poll_interval() -> u64 {
    15
}

fn default_memory_capacity() -> usize {
    5760
}

fn default_database() -> String {
    "vpd_monitor".to_string()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::Environment::with_prefix("VPD_MONITOR").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;

        Ok(config)
    }
}
