//! Weather data sources for the wind map.
//!
//! Every live provider implements [`WeatherProvider`] and normalizes its
//! response to km/h, degrees true and Celsius. [`ProviderChain`] tries them
//! in priority order. [`SyntheticGenerator`] produces plausible readings when
//! no provider can answer, and [`HistoricalSource`] returns raw hourly series
//! for playback.

pub mod chain;
pub mod historical;
pub mod open_meteo;
pub mod open_weather_map;
pub mod provider;
pub mod synthetic;
pub mod weather_api;

pub use chain::ProviderChain;
pub use historical::{HistoricalSource, OpenMeteoHistorical};
pub use open_meteo::OpenMeteoProvider;
pub use open_weather_map::OpenWeatherMapProvider;
pub use provider::{http_client, is_placeholder_key, WeatherProvider};
pub use synthetic::{GeneratorConfig, SyntheticGenerator};
pub use weather_api::WeatherApiProvider;
