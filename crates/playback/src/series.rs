//! Parsing hourly provider payloads into per-site series.

use serde::Deserialize;
use wind_common::{parse_provider_local, Observation, ObservationSource, TimeLabel, WindError, WindResult};

/// One hour of one site's history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalPoint {
    pub label: TimeLabel,
    pub observation: Observation,
}

#[derive(Debug, Deserialize)]
struct HourlyPayload {
    #[serde(default)]
    utc_offset_seconds: i64,
    hourly: Option<HourlyBlock>,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    time: Vec<String>,
    #[serde(default)]
    wind_speed_10m: Vec<Option<f64>>,
    #[serde(default)]
    wind_direction_10m: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m: Option<Vec<Option<f64>>>,
}

/// Parse an Open-Meteo hourly payload.
///
/// Hours with a null speed or direction are dropped. Labels are taken from
/// the provider's local wall-clock time. The result is in ascending time
/// order as delivered by the provider.
pub fn parse_hourly(payload: &serde_json::Value) -> WindResult<Vec<HistoricalPoint>> {
    let parsed = HourlyPayload::deserialize(payload)
        .map_err(|e| WindError::ParseError(format!("Invalid hourly payload: {}", e)))?;
    let hourly = parsed
        .hourly
        .ok_or_else(|| WindError::ParseError("No hourly data".to_string()))?;

    let mut points = Vec::with_capacity(hourly.time.len());
    for (i, time) in hourly.time.iter().enumerate() {
        let speed = hourly.wind_speed_10m.get(i).copied().flatten();
        let dir = hourly.wind_direction_10m.get(i).copied().flatten();
        let (Some(speed), Some(dir)) = (speed, dir) else {
            continue;
        };
        let temperature = hourly
            .temperature_2m
            .as_ref()
            .and_then(|t| t.get(i).copied().flatten());

        let (timestamp_ms, label) = parse_provider_local(time, parsed.utc_offset_seconds)?;
        points.push(HistoricalPoint {
            label,
            observation: Observation::new(
                speed,
                dir,
                temperature,
                timestamp_ms,
                ObservationSource::OpenMeteo,
            ),
        });
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_drops_null_hours() {
        let payload = json!({
            "utc_offset_seconds": 46800,
            "hourly": {
                "time": ["2024-01-15T00:00", "2024-01-15T01:00", "2024-01-15T02:00", "2024-01-15T03:00"],
                "wind_speed_10m": [10.0, null, 12.0, 13.0],
                "wind_direction_10m": [180, 190, null, 200],
                "temperature_2m": [15.0, 15.5, 16.0, null]
            }
        });
        let points = parse_hourly(&payload).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].label.time, "00:00");
        assert_eq!(points[0].observation.temperature_c, Some(15.0));
        assert_eq!(points[1].label.time, "03:00");
        assert_eq!(points[1].label.date, "15/01/2024");
        assert!(points[1].observation.temperature_c.is_none());
        // local midnight at +13h is 11:00 UTC the previous day
        assert_eq!(points[0].observation.timestamp_ms, 1_705_230_000_000);
    }

    #[test]
    fn test_missing_temperature_array() {
        let payload = json!({
            "hourly": {
                "time": ["2024-01-15T00:00"],
                "wind_speed_10m": [4.0],
                "wind_direction_10m": [90]
            }
        });
        let points = parse_hourly(&payload).unwrap();
        assert_eq!(points.len(), 1);
        assert!(points[0].observation.temperature_c.is_none());
    }

    #[test]
    fn test_no_hourly_block() {
        assert!(parse_hourly(&json!({"latitude": -41.0})).is_err());
    }

    #[test]
    fn test_short_value_arrays() {
        let payload = json!({
            "hourly": {
                "time": ["2024-01-15T00:00", "2024-01-15T01:00"],
                "wind_speed_10m": [4.0],
                "wind_direction_10m": [90]
            }
        });
        assert_eq!(parse_hourly(&payload).unwrap().len(), 1);
    }
}
