//! Hourly historical series for playback.
//!
//! The raw provider JSON is returned untouched so that it can be cached
//! verbatim and parsed later.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use wind_common::{DateWindow, FetchError, Site};

use crate::open_meteo::{self, classify_error};
use crate::provider::read_response;

const HOURLY_FIELDS: &str = "wind_speed_10m,wind_direction_10m,temperature_2m";

#[async_trait]
pub trait HistoricalSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fetch the hourly series for `site` over `window`.
    ///
    /// A rejected request (quota or rate limit) must surface as
    /// `FetchError::RateLimited` and never as a payload.
    async fn fetch_hourly(
        &self,
        site: &Site,
        window: &DateWindow,
    ) -> Result<serde_json::Value, FetchError>;
}

/// Check a historical payload for an embedded rejection.
///
/// Cached payloads written by older builds may carry an error body, so the
/// same check is applied on cache reads.
pub fn check_payload(payload: &serde_json::Value) -> Result<(), FetchError> {
    if let Some(reason) = payload.get("reason").and_then(|r| r.as_str()) {
        if reason.to_lowercase().contains("limit") {
            return Err(FetchError::rate_limited(open_meteo::NAME, reason));
        }
        return Err(FetchError::malformed(open_meteo::NAME, reason));
    }
    Ok(())
}

/// Open-Meteo hourly series (`hourly=...&start_date&end_date`).
pub struct OpenMeteoHistorical {
    client: Client,
    base_url: String,
}

impl OpenMeteoHistorical {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, open_meteo::DEFAULT_BASE_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

/// Turn a raw historical response into a payload or a classified failure.
pub fn parse_hourly_response(status: u16, body: &str) -> Result<serde_json::Value, FetchError> {
    if let Some(err) = classify_error(status, body) {
        return Err(err);
    }
    let payload: serde_json::Value =
        serde_json::from_str(body).map_err(|e| FetchError::malformed(open_meteo::NAME, e))?;
    check_payload(&payload)?;
    Ok(payload)
}

#[async_trait]
impl HistoricalSource for OpenMeteoHistorical {
    fn name(&self) -> &'static str {
        open_meteo::NAME
    }

    #[instrument(skip(self, site, window), fields(site = %site.name))]
    async fn fetch_hourly(
        &self,
        site: &Site,
        window: &DateWindow,
    ) -> Result<serde_json::Value, FetchError> {
        let lat = site.lat.to_string();
        let lon = site.lon.to_string();
        let start = window.start_param();
        let end = window.end_param();

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", lat.as_str()),
                ("longitude", lon.as_str()),
                ("hourly", HOURLY_FIELDS),
                ("start_date", start.as_str()),
                ("end_date", end.as_str()),
                ("wind_speed_unit", "kmh"),
                ("timezone", "auto"),
            ])
            .send()
            .await
            .map_err(|e| FetchError::network(open_meteo::NAME, e))?;

        let (status, body) = read_response(open_meteo::NAME, response).await?;
        debug!(status = status, bytes = body.len(), "Historical response");
        parse_hourly_response(status, &body)
    }
}
