//! Ordered provider fallback.

use metrics::counter;
use tracing::{debug, instrument, warn};
use wind_common::{FetchError, Observation, Site};

use crate::provider::WeatherProvider;

/// Providers in priority order. The first usable reading wins; readings are
/// never averaged across providers.
pub struct ProviderChain {
    providers: Vec<Box<dyn WeatherProvider>>,
}

impl ProviderChain {
    pub fn new(providers: Vec<Box<dyn WeatherProvider>>) -> Self {
        Self { providers }
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Fetch the current reading for one site.
    ///
    /// A rate limit from any provider is returned immediately and the
    /// remaining providers are not consulted. When every provider fails for
    /// another reason the result is `FetchError::NoDataAvailable`.
    #[instrument(skip(self, site), fields(site = %site.id))]
    pub async fn fetch_current(&self, site: &Site) -> Result<Observation, FetchError> {
        for provider in &self.providers {
            let name = provider.name();
            counter!("wind_provider_requests_total", "provider" => name).increment(1);

            match provider.fetch_current(site).await {
                Ok(mut observation) => {
                    observation.source = provider.source();
                    debug!(
                        provider = name,
                        speed = observation.wind_speed_kmh,
                        dir = observation.wind_dir_deg,
                        "Live observation"
                    );
                    return Ok(observation);
                }
                Err(e) if e.is_rate_limited() => {
                    counter!("wind_rate_limited_total", "provider" => name).increment(1);
                    warn!(provider = name, error = %e, "Provider rate limit hit");
                    return Err(e);
                }
                Err(e) => {
                    counter!(
                        "wind_provider_failures_total",
                        "provider" => name,
                        "kind" => e.kind()
                    )
                    .increment(1);
                    warn!(provider = name, error = %e, "Provider failed, trying next");
                }
            }
        }

        Err(FetchError::NoDataAvailable(site.id.to_string()))
    }
}
