//! The live provider capability.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use wind_common::{FetchError, Observation, ObservationSource, Site};

/// A live weather provider for current conditions at a coordinate.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Stable provider name used in logs and metric labels.
    fn name(&self) -> &'static str;

    /// Tag stamped onto observations from this provider.
    fn source(&self) -> ObservationSource;

    /// Fetch the current reading for a site.
    ///
    /// Must return `FetchError::RateLimited` when the provider signals a quota
    /// or rate limit, so the caller can abort the cycle.
    async fn fetch_current(&self, site: &Site) -> Result<Observation, FetchError>;
}

/// Build the shared HTTP client used by the provider adapters.
pub fn http_client(timeout: Duration) -> Result<Client, FetchError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("nz-wind-map/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| FetchError::network("http", e))
}

/// API keys shipped in sample configs look like `YOUR_..._HERE`.
pub fn is_placeholder_key(key: &str) -> bool {
    let key = key.trim();
    key.is_empty() || (key.starts_with("YOUR_") && key.ends_with("_HERE"))
}

/// Read an HTTP response into status code and body text.
pub(crate) async fn read_response(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<(u16, String), FetchError> {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| FetchError::network(provider, e))?;
    Ok((status, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_keys() {
        assert!(is_placeholder_key("YOUR_WEATHERAPI_KEY_HERE"));
        assert!(is_placeholder_key("YOUR_OPENWEATHERMAP_KEY_HERE"));
        assert!(is_placeholder_key("  "));
        assert!(!is_placeholder_key("3f9a0c1d2e"));
    }
}
