use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// One persisted progress reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingRecord {
    pub user_id: String,
    pub video_id: String,
    pub current_time: f64,
    pub duration: f64,
    pub watched_percentage: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Table of tracking records
#[async_trait::async_trait]
pub trait TrackingStore: Send + Sync {
    async fn insert(&self, record: TrackingRecord) -> Result<()>;

    /// Records for one viewer and video, oldest first
    async fn list(&self, user_id: &str, video_id: &str) -> Result<Vec<TrackingRecord>>;
}

/// Process-local store, keyed by (user, video)
#[derive(Default)]
pub struct InMemoryTrackingStore {
    records: RwLock<HashMap<(String, String), Vec<TrackingRecord>>>,
}

impl InMemoryTrackingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl TrackingStore for InMemoryTrackingStore {
    async fn insert(&self, record: TrackingRecord) -> Result<()> {
        let key = (record.user_id.clone(), record.video_id.clone());
        let mut records = self.records.write().await;
        records.entry(key).or_default().push(record);
        Ok(())
    }

    async fn list(&self, user_id: &str, video_id: &str) -> Result<Vec<TrackingRecord>> {
        let records = self.records.read().await;
        Ok(records
            .get(&(user_id.to_string(), video_id.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}
