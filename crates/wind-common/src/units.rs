//! Unit conversion and direction helpers.

use serde::{Deserialize, Serialize};

/// Wind speed units reported by providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedUnit {
    Kmh,
    MetersPerSecond,
    Mph,
    Knots,
}

impl SpeedUnit {
    /// Multiplier converting this unit to km/h.
    pub fn kmh_factor(&self) -> f64 {
        match self {
            SpeedUnit::Kmh => 1.0,
            SpeedUnit::MetersPerSecond => 3.6,
            SpeedUnit::Mph => 1.60934,
            SpeedUnit::Knots => 1.852,
        }
    }

    pub fn to_kmh(&self, value: f64) -> f64 {
        value * self.kmh_factor()
    }
}

/// Normalize an angle in degrees into [0, 360).
pub fn normalize_direction(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if d >= 360.0 {
        0.0
    } else {
        d
    }
}

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// 16-point compass label for a direction in degrees.
pub fn compass_point(deg: f64) -> &'static str {
    let idx = (normalize_direction(deg) / 22.5 + 0.5).floor() as usize;
    COMPASS_POINTS[idx % 16]
}
