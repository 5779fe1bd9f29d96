//! Storage for the wind map services.
//!
//! Provides:
//! - An in-memory observation cache with lazy, clock-driven expiry
//! - A durable key-value store (SQLite, or in-memory for tests)
//! - A time-bounded cache of raw historical provider responses

pub mod historical_cache;
pub mod kv;
pub mod observation_cache;

pub use historical_cache::{HistoricalCache, HistoricalRecord, DEFAULT_HISTORICAL_TTL_MS};
pub use kv::{KeyValueStore, MemoryStore, SqliteStore};
pub use observation_cache::{CacheEntry, CacheStats, ObservationCache};
