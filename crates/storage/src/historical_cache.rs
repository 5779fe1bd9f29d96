//! Time-bounded cache of raw historical provider responses.
//!
//! Records are stored as `{"data": <provider JSON>, "timestamp": <epoch ms>}`
//! under `historical_<site name>`, and are reused for 24 hours.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use wind_common::WindResult;

use crate::kv::KeyValueStore;

/// 24 hours.
pub const DEFAULT_HISTORICAL_TTL_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    pub data: serde_json::Value,
    pub timestamp: i64,
}

#[derive(Clone)]
pub struct HistoricalCache {
    store: Arc<dyn KeyValueStore>,
    ttl_ms: i64,
}

impl HistoricalCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_ttl(store, DEFAULT_HISTORICAL_TTL_MS)
    }

    pub fn with_ttl(store: Arc<dyn KeyValueStore>, ttl_ms: i64) -> Self {
        Self { store, ttl_ms }
    }

    /// The cached payload for `key`, if present and younger than the TTL.
    ///
    /// An unreadable record is treated as a miss.
    pub async fn get(&self, key: &str, now_ms: i64) -> WindResult<Option<serde_json::Value>> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };

        let record: HistoricalRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(key = %key, error = %e, "Discarding unreadable historical cache entry");
                return Ok(None);
            }
        };

        let age_ms = now_ms - record.timestamp;
        if age_ms < self.ttl_ms {
            debug!(key = %key, age_ms = age_ms, "Historical cache hit");
            Ok(Some(record.data))
        } else {
            debug!(key = %key, age_ms = age_ms, "Historical cache entry expired");
            Ok(None)
        }
    }

    pub async fn put(&self, key: &str, data: &serde_json::Value, now_ms: i64) -> WindResult<()> {
        let record = HistoricalRecord {
            data: data.clone(),
            timestamp: now_ms,
        };
        let raw = serde_json::to_string(&record)?;
        self.store.put(key, &raw).await
    }
}
