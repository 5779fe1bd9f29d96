//! Open-Meteo current conditions adapter.
//!
//! No API key is needed. Open-Meteo reports quota problems either with HTTP
//! 429 or with an error body whose `reason` mentions the limit, so both are
//! mapped to `FetchError::RateLimited`.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use wind_common::{
    parse_provider_local, Clock, FetchError, Observation, ObservationSource, Site, SystemClock,
};

use crate::provider::{read_response, WeatherProvider};

pub const NAME: &str = "open_meteo";
pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";

const CURRENT_FIELDS: &str = "wind_speed_10m,wind_direction_10m,temperature_2m";

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    utc_offset_seconds: Option<i64>,
    current: Option<CurrentBlock>,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    time: Option<String>,
    wind_speed_10m: Option<f64>,
    wind_direction_10m: Option<f64>,
    temperature_2m: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    reason: Option<String>,
}

/// Classify a non-data Open-Meteo response.
///
/// Returns `None` when the response looks like a normal payload.
pub fn classify_error(status: u16, body: &str) -> Option<FetchError> {
    let reason = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.reason);

    if status == 429 {
        let reason = reason.unwrap_or_else(|| "HTTP 429 Too Many Requests".to_string());
        return Some(FetchError::rate_limited(NAME, reason));
    }

    if let Some(reason) = reason {
        if reason.to_lowercase().contains("limit") {
            return Some(FetchError::rate_limited(NAME, reason));
        }
        if (200..300).contains(&status) {
            return Some(FetchError::malformed(NAME, reason));
        }
        return Some(FetchError::network(NAME, format!("HTTP {}: {}", status, reason)));
    }

    if !(200..300).contains(&status) {
        return Some(FetchError::network(NAME, format!("HTTP {}", status)));
    }

    None
}

/// Parse a `/v1/forecast?current=...` response requested in km/h.
pub fn parse_current(status: u16, body: &str, now_ms: i64) -> Result<Observation, FetchError> {
    if let Some(err) = classify_error(status, body) {
        return Err(err);
    }

    let parsed: ForecastResponse =
        serde_json::from_str(body).map_err(|e| FetchError::malformed(NAME, e))?;
    let current = parsed
        .current
        .ok_or_else(|| FetchError::malformed(NAME, "missing 'current' block"))?;

    let speed = current
        .wind_speed_10m
        .ok_or_else(|| FetchError::malformed(NAME, "null wind_speed_10m"))?;
    let dir = current
        .wind_direction_10m
        .ok_or_else(|| FetchError::malformed(NAME, "null wind_direction_10m"))?;

    let timestamp_ms = current
        .time
        .as_deref()
        .and_then(|t| parse_provider_local(t, parsed.utc_offset_seconds.unwrap_or(0)).ok())
        .map(|(ms, _)| ms)
        .unwrap_or(now_ms);

    Ok(Observation::new(
        speed,
        dir,
        current.temperature_2m,
        timestamp_ms,
        ObservationSource::OpenMeteo,
    ))
}

pub struct OpenMeteoProvider {
    client: Client,
    base_url: String,
    clock: Arc<dyn Clock>,
}

impl OpenMeteoProvider {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Clock used to stamp readings whose payload carries no time.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn source(&self) -> ObservationSource {
        ObservationSource::OpenMeteo
    }

    #[instrument(skip(self, site), fields(site = %site.id))]
    async fn fetch_current(&self, site: &Site) -> Result<Observation, FetchError> {
        let lat = site.lat.to_string();
        let lon = site.lon.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", lat.as_str()),
                ("longitude", lon.as_str()),
                ("current", CURRENT_FIELDS),
                ("wind_speed_unit", "kmh"),
                ("timezone", "auto"),
            ])
            .send()
            .await
            .map_err(|e| FetchError::network(NAME, e))?;

        let (status, body) = read_response(NAME, response).await?;
        debug!(status = status, bytes = body.len(), "Open-Meteo response");
        parse_current(status, &body, self.clock.now_ms())
    }
}
