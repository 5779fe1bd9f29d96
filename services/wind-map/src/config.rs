//! Configuration loading for the wind map service.
//!
//! Loads a single YAML file (default `config/wind-map.yaml`). Every field is
//! optional; a missing file means the built-in Wellington defaults.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use playback::PlaybackConfig;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use sources::{is_placeholder_key, GeneratorConfig};
use tracing::{debug, info, warn};
use wind_common::{MapBounds, Site};

pub const OPEN_WEATHER_MAP_KEY_ENV: &str = "OPEN_WEATHER_MAP_API_KEY";
pub const WEATHER_API_KEY_ENV: &str = "WEATHER_API_KEY";

/// Root configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WindMapConfig {
    /// Period of the live refresh cycle
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,
    /// Freshness threshold of cached live observations
    #[serde(default = "default_cache_duration_ms")]
    pub cache_duration_ms: u64,
    /// Provider name to enabled flag, tried in document order
    #[serde(default)]
    pub data_sources: DataSources,
    #[serde(default)]
    pub api_keys: ApiKeys,
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Generate readings for sites no provider could answer
    #[serde(default = "default_true")]
    pub synthetic_fallback: bool,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default = "default_sites")]
    pub sites: Vec<Site>,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub playback: PlaybackSettings,
    #[serde(default)]
    pub storage: StorageConfig,
}

fn default_update_interval_ms() -> u64 {
    5 * 60 * 1000
}

fn default_cache_duration_ms() -> u64 {
    5 * 60 * 1000
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_sites() -> Vec<Site> {
    vec![
        Site::new("NZWN", "Wellington Airport", -41.3272, 174.8053),
        Site::new("NZPP", "Paraparaumu Airport", -40.9047, 174.9892),
        Site::new("NZNR", "Hawkes Bay Airport", -39.4658, 176.8700),
        Site::new("NZPM", "Palmerston North Airport", -40.3206, 175.6169),
        Site::new("NZWB", "Blenheim Airport", -41.5183, 173.8700),
        Site::new("NZCT", "Castlepoint", -40.9000, 176.2167),
        Site::new("NZKI", "Kapiti Island", -40.8667, 174.9167),
        Site::new("NZLV", "Levin", -40.6167, 175.2833),
    ]
}

impl Default for WindMapConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: default_update_interval_ms(),
            cache_duration_ms: default_cache_duration_ms(),
            data_sources: DataSources::default(),
            api_keys: ApiKeys::default(),
            endpoints: Endpoints::default(),
            request_timeout_secs: default_request_timeout_secs(),
            synthetic_fallback: true,
            generator: GeneratorConfig::default(),
            sites: default_sites(),
            map: MapConfig::default(),
            playback: PlaybackSettings::default(),
            storage: StorageConfig::default(),
        }
    }
}

/// Live providers this service knows how to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenMeteo,
    OpenWeatherMap,
    WeatherApi,
}

impl ProviderKind {
    /// Accepts snake_case and camelCase spellings.
    pub fn from_name(name: &str) -> Option<Self> {
        let folded: String = name
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match folded.as_str() {
            "openmeteo" => Some(ProviderKind::OpenMeteo),
            "openweathermap" => Some(ProviderKind::OpenWeatherMap),
            "weatherapi" => Some(ProviderKind::WeatherApi),
            _ => None,
        }
    }
}

/// Ordered `{provider: enabled}` map.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSources(pub Vec<(String, bool)>);

impl Default for DataSources {
    fn default() -> Self {
        Self(vec![
            ("open_meteo".to_string(), true),
            ("open_weather_map".to_string(), true),
            ("weather_api".to_string(), true),
        ])
    }
}

impl<'de> Deserialize<'de> for DataSources {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = DataSources;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of provider name to enabled flag")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::new();
                while let Some((name, enabled)) = map.next_entry::<String, bool>()? {
                    entries.push((name, enabled));
                }
                Ok(DataSources(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiKeys {
    #[serde(default)]
    pub open_weather_map: Option<String>,
    #[serde(default)]
    pub weather_api: Option<String>,
}

/// Base URLs, overridable for local mirrors.
#[derive(Debug, Clone, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_open_meteo_url")]
    pub open_meteo: String,
    #[serde(default = "default_open_weather_map_url")]
    pub open_weather_map: String,
    #[serde(default = "default_weather_api_url")]
    pub weather_api: String,
    #[serde(default = "default_historical_url")]
    pub historical: String,
}

fn default_open_meteo_url() -> String {
    sources::open_meteo::DEFAULT_BASE_URL.to_string()
}

fn default_open_weather_map_url() -> String {
    sources::open_weather_map::DEFAULT_BASE_URL.to_string()
}

fn default_weather_api_url() -> String {
    sources::weather_api::DEFAULT_BASE_URL.to_string()
}

fn default_historical_url() -> String {
    sources::open_meteo::DEFAULT_BASE_URL.to_string()
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            open_meteo: default_open_meteo_url(),
            open_weather_map: default_open_weather_map_url(),
            weather_api: default_weather_api_url(),
            historical: default_historical_url(),
        }
    }
}

/// Render surface used for the heatmap, arrows and markers.
#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    #[serde(default = "MapBounds::wellington")]
    pub bounds: MapBounds,
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
    /// Heatmap sample stride in pixels
    #[serde(default = "default_heatmap_stride")]
    pub heatmap_stride: usize,
    /// Distance between arrow glyphs in pixels
    #[serde(default = "default_arrow_spacing")]
    pub arrow_spacing: usize,
    /// Largest width or height a request may ask for
    #[serde(default = "default_max_dimension")]
    pub max_dimension: usize,
}

fn default_width() -> usize {
    800
}

fn default_height() -> usize {
    600
}

fn default_heatmap_stride() -> usize {
    2
}

fn default_arrow_spacing() -> usize {
    16
}

fn default_max_dimension() -> usize {
    2048
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            bounds: MapBounds::wellington(),
            width: default_width(),
            height: default_height(),
            heatmap_stride: default_heatmap_stride(),
            arrow_spacing: default_arrow_spacing(),
            max_dimension: default_max_dimension(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(flatten)]
    pub config: PlaybackConfig,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            config: PlaybackConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// SQLite file for the historical cache; `null` keeps it in memory
    #[serde(default = "default_db_path")]
    pub path: Option<PathBuf>,
}

fn default_db_path() -> Option<PathBuf> {
    Some(PathBuf::from("data/wind-map.db"))
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl WindMapConfig {
    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config = Self::from_yaml(&content)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?;
            info!(path = %path.display(), sites = config.sites.len(), "Loaded configuration");
            config
        } else {
            warn!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };

        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        if config.sites.is_empty() {
            anyhow::bail!("at least one site must be configured");
        }
        for (name, value) in [
            ("update_interval_ms", config.update_interval_ms),
            ("cache_duration_ms", config.cache_duration_ms),
            ("request_timeout_secs", config.request_timeout_secs),
            ("playback.tick_ms", config.playback.config.tick_ms),
        ] {
            if value == 0 {
                anyhow::bail!("{} must be greater than zero", name);
            }
        }
        Ok(config)
    }

    /// Environment keys take precedence over file keys.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(OPEN_WEATHER_MAP_KEY_ENV).filter(|k| !k.is_empty()) {
            debug!("Using OpenWeatherMap key from environment");
            self.api_keys.open_weather_map = Some(key);
        }
        if let Some(key) = lookup(WEATHER_API_KEY_ENV).filter(|k| !k.is_empty()) {
            debug!("Using WeatherAPI key from environment");
            self.api_keys.weather_api = Some(key);
        }
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    pub fn cache_duration(&self) -> Duration {
        Duration::from_millis(self.cache_duration_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Providers to query, in priority order.
    ///
    /// Disabled entries, unknown names and key-based providers without a
    /// usable key are left out. Repeated names keep their first position.
    pub fn enabled_providers(&self) -> Vec<ProviderKind> {
        let mut enabled = Vec::new();
        for (name, on) in &self.data_sources.0 {
            let Some(kind) = ProviderKind::from_name(name) else {
                warn!(provider = %name, "Unknown data source, ignoring");
                continue;
            };
            if !on || enabled.contains(&kind) {
                continue;
            }
            let key = match kind {
                ProviderKind::OpenMeteo => None,
                ProviderKind::OpenWeatherMap => Some(&self.api_keys.open_weather_map),
                ProviderKind::WeatherApi => Some(&self.api_keys.weather_api),
            };
            if let Some(key) = key {
                if key.as_deref().map_or(true, is_placeholder_key) {
                    info!(provider = %name, "No API key configured, provider disabled");
                    continue;
                }
            }
            enabled.push(kind);
        }
        enabled
    }

    pub fn bounds(&self) -> MapBounds {
        self.map.bounds
    }
}
