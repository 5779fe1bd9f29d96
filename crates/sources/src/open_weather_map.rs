//! OpenWeatherMap current weather adapter (`/data/2.5/weather`, metric units).

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use wind_common::{Clock, FetchError, Observation, ObservationSource, Site, SpeedUnit, SystemClock};

use crate::provider::{read_response, WeatherProvider};

pub const NAME: &str = "open_weather_map";
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    #[serde(default)]
    cod: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
    wind: Option<WindBlock>,
    main: Option<MainBlock>,
    /// Observation time, epoch seconds
    dt: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WindBlock {
    speed: Option<f64>,
    deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: Option<f64>,
}

/// `cod` is a number on success and sometimes a string on error.
fn cod_value(cod: &Option<serde_json::Value>) -> Option<i64> {
    match cod {
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        Some(serde_json::Value::String(s)) => s.parse().ok(),
        _ => None,
    }
}

/// Parse a metric-units response; wind speed arrives in m/s.
pub fn parse_current(status: u16, body: &str, now_ms: i64) -> Result<Observation, FetchError> {
    let parsed: Option<WeatherResponse> = serde_json::from_str(body).ok();
    let cod = parsed.as_ref().and_then(|p| cod_value(&p.cod));
    let message = parsed
        .as_ref()
        .and_then(|p| p.message.clone())
        .unwrap_or_default();

    if status == 429 || cod == Some(429) {
        return Err(FetchError::rate_limited(NAME, message));
    }
    if !(200..300).contains(&status) {
        return Err(FetchError::network(NAME, format!("HTTP {}: {}", status, message)));
    }
    if let Some(code) = cod.filter(|c| *c != 200) {
        return Err(FetchError::malformed(NAME, format!("cod {}: {}", code, message)));
    }

    let parsed = parsed.ok_or_else(|| FetchError::malformed(NAME, "body is not JSON"))?;
    let wind = parsed
        .wind
        .ok_or_else(|| FetchError::malformed(NAME, "missing 'wind' block"))?;
    let speed_ms = wind
        .speed
        .ok_or_else(|| FetchError::malformed(NAME, "null wind.speed"))?;

    Ok(Observation::new(
        SpeedUnit::MetersPerSecond.to_kmh(speed_ms),
        // calm readings omit the direction
        wind.deg.unwrap_or(0.0),
        parsed.main.and_then(|m| m.temp),
        parsed.dt.map(|s| s * 1000).unwrap_or(now_ms),
        ObservationSource::OpenWeatherMap,
    ))
}

pub struct OpenWeatherMapProvider {
    client: Client,
    base_url: String,
    api_key: String,
    clock: Arc<dyn Clock>,
}

impl OpenWeatherMapProvider {
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
impl WeatherProvider for OpenWeatherMapProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn source(&self) -> ObservationSource {
        ObservationSource::OpenWeatherMap
    }

    #[instrument(skip(self, site), fields(site = %site.id))]
    async fn fetch_current(&self, site: &Site) -> Result<Observation, FetchError> {
        let lat = site.lat.to_string();
        let lon = site.lon.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|e| FetchError::network(NAME, e))?;

        let (status, body) = read_response(NAME, response).await?;
        debug!(status = status, bytes = body.len(), "OpenWeatherMap response");
        parse_current(status, &body, self.clock.now_ms())
    }
}
