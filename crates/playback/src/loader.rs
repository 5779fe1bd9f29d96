//! Loading per-site history into a timeline.

use std::time::Duration;

use metrics::counter;
use serde::{Deserialize, Serialize};
use sources::historical::check_payload;
use sources::HistoricalSource;
use storage::HistoricalCache;
use tracing::{debug, info, instrument, warn};
use wind_common::{Clock, DateWindow, FetchError, LocalOffset, Site};

use crate::series::parse_hourly;
use crate::timeline::HistoricalTimeline;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Trailing window to request, in days
    #[serde(default = "default_range_days")]
    pub range_days: u32,
    /// Period of one playback step
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Pause between uncached provider requests
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    /// Start playing as soon as the timeline is ready
    #[serde(default = "default_autoplay")]
    pub autoplay: bool,
    /// Offset used to pick the query dates
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
}

fn default_range_days() -> u32 {
    30
}

fn default_tick_ms() -> u64 {
    200
}

fn default_throttle_ms() -> u64 {
    1200
}

fn default_autoplay() -> bool {
    true
}

fn default_utc_offset_minutes() -> i32 {
    LocalOffset::nzst().minutes
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            range_days: default_range_days(),
            tick_ms: default_tick_ms(),
            throttle_ms: default_throttle_ms(),
            autoplay: default_autoplay(),
            utc_offset_minutes: default_utc_offset_minutes(),
        }
    }
}

impl PlaybackConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

/// Fetch (or reuse cached) history for every site and merge it.
///
/// Sites are processed in order, one request at a time, with a fixed pause
/// before every provider request after the first. Cached payloads younger
/// than the cache TTL are reused without a request. Per-site failures are
/// logged and skipped; a rate limit stops the whole load and is returned.
#[instrument(skip_all, fields(sites = sites.len(), days = config.range_days))]
pub async fn load_timeline(
    sites: &[Site],
    source: &dyn HistoricalSource,
    cache: &HistoricalCache,
    clock: &dyn Clock,
    config: &PlaybackConfig,
) -> Result<HistoricalTimeline, FetchError> {
    let offset = LocalOffset::from_minutes(config.utc_offset_minutes);
    let window = DateWindow::trailing(clock.now_ms(), config.range_days, offset);
    let mut series = Vec::with_capacity(sites.len());
    let mut requested = false;

    for site in sites {
        let key = site.historical_cache_key();

        let cached = match cache.get(&key, clock.now_ms()).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(site = %site.name, error = %e, "Historical cache read failed");
                None
            }
        };

        let payload = match cached {
            Some(payload) => {
                debug!(site = %site.name, "Using cached history");
                counter!("wind_historical_cache_hits_total").increment(1);
                if let Err(e) = check_payload(&payload) {
                    if e.is_rate_limited() {
                        warn!(site = %site.name, error = %e, "Cached history is a rejection");
                        return Err(e);
                    }
                }
                payload
            }
            None => {
                if requested {
                    tokio::time::sleep(config.throttle()).await;
                }
                requested = true;

                counter!("wind_historical_requests_total").increment(1);
                match source.fetch_hourly(site, &window).await {
                    Ok(payload) => {
                        if let Err(e) = cache.put(&key, &payload, clock.now_ms()).await {
                            warn!(site = %site.name, error = %e, "Historical cache write failed");
                        }
                        payload
                    }
                    Err(e) if e.is_rate_limited() => {
                        counter!("wind_rate_limited_total", "provider" => source.name())
                            .increment(1);
                        warn!(site = %site.name, error = %e, "History rate limited, stopping");
                        return Err(e);
                    }
                    Err(e) => {
                        warn!(site = %site.name, error = %e, "History fetch failed");
                        continue;
                    }
                }
            }
        };

        match parse_hourly(&payload) {
            Ok(points) => {
                debug!(site = %site.name, points = points.len(), "Loaded history");
                series.push((site.id.clone(), points));
            }
            Err(e) => warn!(site = %site.name, error = %e, "No usable hourly data"),
        }
    }

    let timeline = HistoricalTimeline::from_series(series);
    info!(
        steps = timeline.len(),
        sites = timeline.site_count(),
        "Historical timeline ready"
    );
    Ok(timeline)
}
