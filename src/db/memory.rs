//! In-memory sample store

use std::collections::{BTreeMap, VecDeque};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::SampleStore;
use crate::error::AppError;
use crate::models::{HistoryBucket, Sample};

/// Bounded ring buffer; the oldest sample is dropped when full
pub struct MemorySampleStore {
    samples: RwLock<VecDeque<Sample>>,
    capacity: usize,
}

impl MemorySampleStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub async fn len(&self) -> usize {
        self.samples.read().await.len()
    }
}

#[derive(Default)]
struct Accumulator {
    vpd: f64,
    temperature: f64,
    humidity: f64,
    count: u32,
}

/// Group samples by UTC minute and average each group
pub fn bucket_by_minute<'a>(samples: impl IntoIterator<Item = &'a Sample>) -> Vec<HistoryBucket> {
    let mut minutes: BTreeMap<i64, Accumulator> = BTreeMap::new();

    for sample in samples {
        let minute = sample.timestamp.timestamp().div_euclid(60);
        let acc = minutes.entry(minute).or_default();
        acc.vpd += sample.vpd;
        acc.temperature += sample.temperature;
        acc.humidity += sample.humidity;
        acc.count += 1;
    }

    minutes
        .into_iter()
        .filter_map(|(minute, acc)| {
            let n = f64::from(acc.count);
            DateTime::<Utc>::from_timestamp(minute * 60, 0).map(|timestamp| HistoryBucket {
                timestamp,
                avg_vpd: acc.vpd / n,
                avg_temperature: acc.temperature / n,
                avg_humidity: acc.humidity / n,
            })
        })
        .collect()
}

#[async_trait]
impl SampleStore for MemorySampleStore {
    async fn insert(&self, sample: &Sample) -> Result<(), AppError> {
        let mut samples = self.samples.write().await;
        if samples.len() >= self.capacity {
            samples.pop_front();
        }
        samples.push_back(sample.clone());
        Ok(())
    }

    async fn history(&self) -> Result<Vec<HistoryBucket>, AppError> {
        let samples = self.samples.read().await;
        Ok(bucket_by_minute(samples.iter()))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
