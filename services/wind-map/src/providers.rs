//! Builds the provider chain and historical source from configuration.

use std::sync::Arc;

use reqwest::Client;
use sources::{
    OpenMeteoHistorical, OpenMeteoProvider, OpenWeatherMapProvider, ProviderChain,
    WeatherApiProvider, WeatherProvider,
};
use tracing::info;
use wind_common::Clock;

use crate::config::{ProviderKind, WindMapConfig};

/// Chain of the enabled providers in configured priority order.
///
/// `clock` stamps readings whose payload carries no observation time.
pub fn build_chain(config: &WindMapConfig, client: &Client, clock: Arc<dyn Clock>) -> ProviderChain {
    let endpoints = &config.endpoints;
    let keys = &config.api_keys;

    let providers: Vec<Box<dyn WeatherProvider>> = config
        .enabled_providers()
        .into_iter()
        .map(|kind| -> Box<dyn WeatherProvider> {
            match kind {
                ProviderKind::OpenMeteo => Box::new(
                    OpenMeteoProvider::with_base_url(client.clone(), endpoints.open_meteo.clone())
                        .with_clock(clock.clone()),
                ),
                ProviderKind::OpenWeatherMap => Box::new(
                    OpenWeatherMapProvider::with_base_url(
                        client.clone(),
                        keys.open_weather_map.clone().unwrap_or_default(),
                        endpoints.open_weather_map.clone(),
                    )
                    .with_clock(clock.clone()),
                ),
                ProviderKind::WeatherApi => Box::new(
                    WeatherApiProvider::with_base_url(
                        client.clone(),
                        keys.weather_api.clone().unwrap_or_default(),
                        endpoints.weather_api.clone(),
                    )
                    .with_clock(clock.clone()),
                ),
            }
        })
        .collect();

    let chain = ProviderChain::new(providers);
    info!(providers = ?chain.names(), "Provider chain ready");
    chain
}

pub fn build_historical(config: &WindMapConfig, client: &Client) -> OpenMeteoHistorical {
    OpenMeteoHistorical::with_base_url(client.clone(), config.endpoints.historical.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wind_common::SystemClock;

    #[test]
    fn test_chain_follows_config_order() {
        let yaml = r#"
data_sources:
  weather_api: true
  open_meteo: true
  open_weather_map: true
api_keys:
  weather_api: "k1"
  open_weather_map: "k2"
"#;
        let config = WindMapConfig::from_yaml(yaml).unwrap();
        let client = sources::http_client(Duration::from_secs(1)).unwrap();
        let chain = build_chain(&config, &client, Arc::new(SystemClock));
        assert_eq!(chain.names(), vec!["weather_api", "open_meteo", "open_weather_map"]);
    }

    #[test]
    fn test_all_disabled_gives_empty_chain() {
        let yaml = r#"
data_sources:
  open_meteo: false
  noaa: true
"#;
        let config = WindMapConfig::from_yaml(yaml).unwrap();
        let client = sources::http_client(Duration::from_secs(1)).unwrap();
        assert!(build_chain(&config, &client, Arc::new(SystemClock)).is_empty());
    }
}
