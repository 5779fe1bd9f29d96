//! Common test fixtures for the wind map tests.

use serde_json::{json, Value};
use wind_common::{Observation, ObservationSource, Site};

/// 2024-01-15T00:30:00Z (12:30 NZST).
pub const MID_JAN_2024_MS: i64 = 1_705_278_600_000;

/// Wellington region sensors.
pub fn wellington_sites() -> Vec<Site> {
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

/// A site whose name is its id.
pub fn site(id: &str, lat: f64, lon: f64) -> Site {
    Site::new(id, id, lat, lon)
}

/// A live observation with no temperature.
pub fn observation(speed_kmh: f64, dir_deg: f64) -> Observation {
    Observation::new(speed_kmh, dir_deg, None, 0, ObservationSource::OpenMeteo)
}

pub fn observation_from(source: ObservationSource, speed_kmh: f64, dir_deg: f64) -> Observation {
    Observation::new(speed_kmh, dir_deg, Some(15.0), 0, source)
}

/// An Open-Meteo hourly payload with `hours` consecutive records starting at
/// `2024-01-15T00:00` local time (+13h). Speeds count up from 10.
pub fn hourly_payload(hours: usize) -> Value {
    let times: Vec<String> = (0..hours)
        .map(|h| format!("2024-{:02}-{:02}T{:02}:00", 1, 15 + h / 24, h % 24))
        .collect();
    let speeds: Vec<f64> = (0..hours).map(|h| 10.0 + h as f64).collect();
    let dirs: Vec<f64> = (0..hours).map(|h| ((h * 15) % 360) as f64).collect();
    let temps: Vec<f64> = (0..hours).map(|_| 16.5).collect();

    json!({
        "utc_offset_seconds": 46800,
        "timezone": "Pacific/Auckland",
        "hourly": {
            "time": times,
            "wind_speed_10m": speeds,
            "wind_direction_10m": dirs,
            "temperature_2m": temps,
        }
    })
}

/// An Open-Meteo rejection body.
pub fn limit_exceeded_payload() -> Value {
    json!({"error": true, "reason": "Daily API request limit exceeded. Please try again tomorrow."})
}
