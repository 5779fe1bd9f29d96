//! WeatherAPI.com current conditions adapter.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use wind_common::{Clock, FetchError, Observation, ObservationSource, Site, SystemClock};

use crate::provider::{read_response, WeatherProvider};

pub const NAME: &str = "weather_api";
pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1/current.json";

/// "API key has exceeded calls per month quota."
const QUOTA_EXCEEDED: i64 = 2007;

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    current: Option<CurrentBlock>,
    error: Option<ErrorBlock>,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    wind_kph: Option<f64>,
    wind_degree: Option<f64>,
    temp_c: Option<f64>,
    last_updated_epoch: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ErrorBlock {
    code: Option<i64>,
    message: Option<String>,
}

/// Parse a `current.json` response; wind speed is already in km/h.
pub fn parse_current(status: u16, body: &str, now_ms: i64) -> Result<Observation, FetchError> {
    let parsed: Option<CurrentResponse> = serde_json::from_str(body).ok();

    if let Some(error) = parsed.as_ref().and_then(|p| p.error.as_ref()) {
        let message = error.message.clone().unwrap_or_default();
        if status == 429 || error.code == Some(QUOTA_EXCEEDED) {
            return Err(FetchError::rate_limited(NAME, message));
        }
        return Err(FetchError::network(
            NAME,
            format!("HTTP {} code {:?}: {}", status, error.code, message),
        ));
    }
    if status == 429 {
        return Err(FetchError::rate_limited(NAME, "HTTP 429 Too Many Requests"));
    }
    if !(200..300).contains(&status) {
        return Err(FetchError::network(NAME, format!("HTTP {}", status)));
    }

    let current = parsed
        .and_then(|p| p.current)
        .ok_or_else(|| FetchError::malformed(NAME, "missing 'current' block"))?;
    let speed = current
        .wind_kph
        .ok_or_else(|| FetchError::malformed(NAME, "null wind_kph"))?;

    Ok(Observation::new(
        speed,
        current.wind_degree.unwrap_or(0.0),
        current.temp_c,
        current
            .last_updated_epoch
            .map(|s| s * 1000)
            .unwrap_or(now_ms),
        ObservationSource::WeatherApi,
    ))
}

pub struct WeatherApiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    clock: Arc<dyn Clock>,
}

impl WeatherApiProvider {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        client: Client,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn source(&self) -> ObservationSource {
        ObservationSource::WeatherApi
    }

    #[instrument(skip(self, site), fields(site = %site.id))]
    async fn fetch_current(&self, site: &Site) -> Result<Observation, FetchError> {
        let q = format!("{},{}", site.lat, site.lon);
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", q.as_str()),
                ("aqi", "no"),
            ])
            .send()
            .await
            .map_err(|e| FetchError::network(NAME, e))?;

        let (status, body) = read_response(NAME, response).await?;
        debug!(status = status, bytes = body.len(), "WeatherAPI response");
        parse_current(status, &body, self.clock.now_ms())
    }
}
