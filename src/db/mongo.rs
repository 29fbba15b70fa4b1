//! MongoDB sample store

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, DateTime as BsonDateTime, Document};
use mongodb::{Client, Collection, Database};

use super::SampleStore;
use crate::error::AppError;
use crate::models::{HistoryBucket, Sample};

const COLLECTION: &str = "vpd_samples";

#[derive(Clone)]
pub struct MongoSampleStore {
    db: Database,
}

impl MongoSampleStore {
    /// Connect to MongoDB database
    pub async fn connect(url: &str, database: &str) -> anyhow::Result<Self> {
        tracing::info!("Connecting to MongoDB...");

        let client = Client::with_uri_str(url).await?;
        let db = client.database(database);

        // Verify connection
        db.run_command(doc! { "ping": 1 }, None).await?;

        tracing::info!("MongoDB connected successfully");

        Ok(Self { db })
    }

    fn collection(&self) -> Collection<Document> {
        self.db.collection::<Document>(COLLECTION)
    }
}

fn bucket_from_document(doc: &Document) -> Option<HistoryBucket> {
    let millis = doc.get_datetime("_id").ok()?.timestamp_millis();
    Some(HistoryBucket {
        timestamp: Utc.timestamp_millis_opt(millis).single()?,
        avg_vpd: doc.get_f64("avgVPD").ok()?,
        avg_temperature: doc.get_f64("avgTemperature").ok()?,
        avg_humidity: doc.get_f64("avgHumidity").ok()?,
    })
}

#[async_trait]
impl SampleStore for MongoSampleStore {
    async fn insert(&self, sample: &Sample) -> Result<(), AppError> {
        let doc = doc! {
            "temperature": sample.temperature,
            "humidity": sample.humidity,
            "vpd": sample.vpd,
            "timestamp": BsonDateTime::from_millis(sample.timestamp.timestamp_millis()),
        };

        self.collection()
            .insert_one(doc, None)
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to save sample: {}", e)))?;

        Ok(())
    }

    async fn history(&self) -> Result<Vec<HistoryBucket>, AppError> {
        let pipeline = vec![
            doc! {
                "$group": {
                    "_id": { "$dateTrunc": { "date": "$timestamp", "unit": "minute" } },
                    "avgVPD": { "$avg": "$vpd" },
                    "avgTemperature": { "$avg": "$temperature" },
                    "avgHumidity": { "$avg": "$humidity" }
                }
            },
            doc! { "$sort": { "_id": 1 } },
        ];

        let mut cursor = self
            .collection()
            .aggregate(pipeline, None)
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to query history: {}", e)))?;

        let mut buckets = Vec::new();
        while let Some(doc) = cursor
            .try_next()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?
        {
            match bucket_from_document(&doc) {
                Some(bucket) => buckets.push(bucket),
                None => tracing::debug!("Skipping malformed history bucket: {}", doc),
            }
        }

        Ok(buckets)
    }

    fn name(&self) -> &'static str {
        "mongodb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_from_document() {
        let doc = doc! {
            "_id": BsonDateTime::from_millis(1_700_000_040_000),
            "avgVPD": 1.25,
            "avgTemperature": 25.5,
            "avgHumidity": 60.0,
        };

        let bucket = bucket_from_document(&doc).unwrap();
        assert_eq!(bucket.timestamp.timestamp(), 1_700_000_040);
        assert_eq!(bucket.avg_vpd, 1.25);
        assert_eq!(bucket.avg_humidity, 60.0);
    }

    #[test]
    fn test_bucket_from_document_missing_field() {
        let doc = doc! {
            "_id": BsonDateTime::from_millis(1_700_000_040_000),
            "avgVPD": 1.25,
        };
        assert!(bucket_from_document(&doc).is_none());
    }
}
