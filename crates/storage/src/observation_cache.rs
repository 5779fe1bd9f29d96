//! Per-site observation cache.
//!
//! Entries carry the time they were written and expire lazily: nothing is
//! ever evicted, readers ask whether an entry is still fresh. A failed fetch
//! never touches the cache, so the last good observation stays available.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use wind_common::{Clock, Observation, SiteId};

/// Default freshness threshold (5 minutes).
pub const DEFAULT_CACHE_DURATION: Duration = Duration::from_secs(300);

/// A cached observation and the time it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub observation: Observation,
    pub cached_at_ms: i64,
}

impl CacheEntry {
    fn is_fresh(&self, now_ms: i64, ttl_ms: i64) -> bool {
        now_ms - self.cached_at_ms < ttl_ms
    }
}

/// Lookup statistics, readable without borrowing the cache mutably.
#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub stale: AtomicU64,
}

impl CacheStats {
    /// Fresh hits as a percentage of all freshness lookups (0-100).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let total = hits + self.misses.load(Ordering::Relaxed) + self.stale.load(Ordering::Relaxed);
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}

/// Observation cache keyed by site id.
///
/// Owned by the refresh cycle, which is its only writer. Readers see
/// published snapshots rather than this structure.
pub struct ObservationCache {
    entries: HashMap<SiteId, CacheEntry>,
    ttl_ms: i64,
    clock: Arc<dyn Clock>,
    stats: CacheStats,
}

impl ObservationCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            ttl_ms: ttl.as_millis() as i64,
            clock,
            stats: CacheStats::default(),
        }
    }

    pub fn with_default_ttl(clock: Arc<dyn Clock>) -> Self {
        Self::new(DEFAULT_CACHE_DURATION, clock)
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms as u64)
    }

    /// Current time according to the injected clock.
    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Most recent observation for a site, regardless of age.
    pub fn get(&self, site: &SiteId) -> Option<&Observation> {
        self.entries.get(site).map(|e| &e.observation)
    }

    pub fn entry(&self, site: &SiteId) -> Option<&CacheEntry> {
        self.entries.get(site)
    }

    /// Store an observation, replacing any previous one for the site.
    pub fn put(&mut self, site: SiteId, observation: Observation) {
        let cached_at_ms = self.clock.now_ms();
        debug!(
            site = %site,
            speed = observation.wind_speed_kmh,
            dir = observation.wind_dir_deg,
            source = %observation.source,
            "Caching observation"
        );
        self.entries.insert(
            site,
            CacheEntry {
                observation,
                cached_at_ms,
            },
        );
    }

    /// Whether the site has an entry younger than the cache duration.
    pub fn is_fresh(&self, site: &SiteId, now_ms: i64) -> bool {
        self.entries
            .get(site)
            .map(|e| e.is_fresh(now_ms, self.ttl_ms))
            .unwrap_or(false)
    }

    /// The site's observation if it is still fresh.
    pub fn get_fresh(&self, site: &SiteId, now_ms: i64) -> Option<&Observation> {
        match self.entries.get(site) {
            Some(entry) if entry.is_fresh(now_ms, self.ttl_ms) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(&entry.observation)
            }
            Some(_) => {
                self.stats.stale.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Every fresh observation, cloned.
    pub fn fresh_observations(&self, now_ms: i64) -> HashMap<SiteId, Observation> {
        self.entries
            .iter()
            .filter(|(_, e)| e.is_fresh(now_ms, self.ttl_ms))
            .map(|(id, e)| (id.clone(), e.observation.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}
