//! Sample storage - MongoDB, or an in-memory ring buffer when no URL is configured

pub mod memory;
pub mod mongo;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{HistoryBucket, Sample};

pub use self::memory::MemorySampleStore;
pub use self::mongo::MongoSampleStore;

#[async_trait]
pub trait SampleStore: Send + Sync {
    async fn insert(&self, sample: &Sample) -> Result<(), AppError>;

    /// Per-minute averages, oldest first
    async fn history(&self) -> Result<Vec<HistoryBucket>, AppError>;

    fn name(&self) -> &'static str;
}

/// Pick the configured backend
pub async fn connect(config: &Config) -> anyhow::Result<Arc<dyn SampleStore>> {
    match config.database.mongodb_url.as_deref() {
        Some(url) if !url.is_empty() => {
            let store = MongoSampleStore::connect(url, &config.database.database).await?;
            Ok(Arc::new(store))
        }
        _ => {
            tracing::warn!("MongoDB URL not configured, keeping samples in memory");
            Ok(Arc::new(MemorySampleStore::new(config.recorder.memory_capacity)))
        }
    }
}
