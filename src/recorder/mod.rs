//! Periodic sample recorder

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};

use crate::db::SampleStore;
use crate::models::Sample;
use crate::tuya::SignedApiClient;

/// Sample recorder that runs in the background
pub struct SampleRecorder {
    client: Arc<SignedApiClient>,
    store: Arc<dyn SampleStore>,
    sensor_id: String,
    interval: Duration,
}

impl SampleRecorder {
    pub fn new(
        client: Arc<SignedApiClient>,
        store: Arc<dyn SampleStore>,
        sensor_id: String,
        interval: Duration,
    ) -> Self {
        Self {
            client,
            store,
            sensor_id,
            interval,
        }
    }

    /// Start the recording loop
    pub async fn start(self: Arc<Self>) {
        tracing::info!(
            "Starting sample recorder ({} store, interval: {}s)",
            self.store.name(),
            self.interval.as_secs()
        );

        let mut interval_timer = interval(self.interval);
        interval_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval_timer.tick().await;

            if let Err(e) = self.record_once().await {
                tracing::error!("Sample recording failed: {}", e);
            }
        }
    }

    /// Read the sensor once and persist the sample
    pub async fn record_once(&self) -> anyhow::Result<Sample> {
        let reading = self.client.get_status(&self.sensor_id).await?;
        let sample = Sample::from(&reading);

        self.store.insert(&sample).await?;

        tracing::debug!(
            "Sample saved: temperature={} humidity={} vpd={:.2}",
            sample.temperature,
            sample.humidity,
            sample.vpd
        );

        Ok(sample)
    }
}
