//! Wind observations and interpolated estimates.

use serde::{Deserialize, Serialize};

use crate::units::{compass_point, normalize_direction};

/// Where an observation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationSource {
    OpenMeteo,
    OpenWeatherMap,
    WeatherApi,
    /// Produced by the synthetic fallback generator.
    Generated,
}

impl ObservationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObservationSource::OpenMeteo => "open_meteo",
            ObservationSource::OpenWeatherMap => "open_weather_map",
            ObservationSource::WeatherApi => "weather_api",
            ObservationSource::Generated => "generated",
        }
    }

    /// Live data comes from a real provider; generated data is rendered differently.
    pub fn is_live(&self) -> bool {
        !matches!(self, ObservationSource::Generated)
    }
}

impl std::fmt::Display for ObservationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single site's wind/temperature reading in canonical units
/// (km/h, degrees true, Celsius).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Wind speed in km/h, never negative
    pub wind_speed_kmh: f64,
    /// Direction the wind blows FROM, in [0, 360)
    pub wind_dir_deg: f64,
    pub temperature_c: Option<f64>,
    /// Observation time, epoch milliseconds
    pub timestamp_ms: i64,
    pub source: ObservationSource,
}

impl Observation {
    /// Build an observation, normalizing direction into [0, 360) and
    /// clamping negative speeds to zero.
    pub fn new(
        wind_speed_kmh: f64,
        wind_dir_deg: f64,
        temperature_c: Option<f64>,
        timestamp_ms: i64,
        source: ObservationSource,
    ) -> Self {
        Self {
            wind_speed_kmh: wind_speed_kmh.max(0.0),
            wind_dir_deg: normalize_direction(wind_dir_deg),
            temperature_c,
            timestamp_ms,
            source,
        }
    }

    /// A site with zero wind is treated as offline by the interpolator.
    pub fn has_wind(&self) -> bool {
        self.wind_speed_kmh > 0.0
    }

    pub fn compass(&self) -> &'static str {
        compass_point(self.wind_dir_deg)
    }
}

/// Interpolated wind at an arbitrary coordinate. Computed, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindEstimate {
    pub dir_deg: f64,
    pub speed_kmh: f64,
}

impl WindEstimate {
    pub fn new(dir_deg: f64, speed_kmh: f64) -> Self {
        Self { dir_deg, speed_kmh }
    }

    /// Returned when no site has a usable observation.
    pub fn zero() -> Self {
        Self {
            dir_deg: 0.0,
            speed_kmh: 0.0,
        }
    }

    /// Direction the wind blows TOWARDS, used for arrow glyphs.
    pub fn heading_deg(&self) -> f64 {
        normalize_direction(self.dir_deg + 180.0)
    }

    pub fn compass(&self) -> &'static str {
        compass_point(self.dir_deg)
    }
}
