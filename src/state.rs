//! Shared handler state

use std::sync::Arc;

use crate::control::ControlLoop;
use crate::db::SampleStore;
use crate::tuya::SignedApiClient;

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<SignedApiClient>,
    pub control: Arc<ControlLoop>,
    pub samples: Arc<dyn SampleStore>,
    pub sensor_id: String,
    pub switch_id: String,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
