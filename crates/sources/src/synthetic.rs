//! Synthetic wind readings for when no live provider answers.
//!
//! Readings follow a prevailing southerly, bent by position relative to a
//! reference point, by a diurnal cycle and by a seasonal cycle. Speed gets a
//! site-category bonus and a ±30% random factor.

use std::f64::consts::PI;
use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use wind_common::{normalize_direction, LocalOffset, Observation, ObservationSource, Site};

const BASE_DIRECTION: f64 = 180.0;
const BASE_SPEED: f64 = 20.0;
const MIN_SPEED: f64 = 5.0;
const MAX_SPEED: f64 = 45.0;
/// Random speed factor, both ends included.
const JITTER: RangeInclusive<f64> = 0.7..=1.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_ref_lat")]
    pub ref_lat: f64,
    #[serde(default = "default_ref_lon")]
    pub ref_lon: f64,
    /// Offset used to derive the local hour and month
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
    /// Fixed RNG seed; entropy-seeded when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_ref_lat() -> f64 {
    -41.0
}

fn default_ref_lon() -> f64 {
    174.5
}

fn default_utc_offset_minutes() -> i32 {
    LocalOffset::nzst().minutes
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            ref_lat: default_ref_lat(),
            ref_lon: default_ref_lon(),
            utc_offset_minutes: default_utc_offset_minutes(),
            seed: None,
        }
    }
}

pub struct SyntheticGenerator {
    config: GeneratorConfig,
    offset: LocalOffset,
    rng: StdRng,
}

impl SyntheticGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            offset: LocalOffset::from_minutes(config.utc_offset_minutes),
            config,
            rng,
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(GeneratorConfig {
            seed: Some(seed),
            ..GeneratorConfig::default()
        })
    }

    /// Direction in whole degrees for a local hour and 0-based month.
    pub fn direction(&self, site: &Site, hour: u32, month0: u32) -> f64 {
        let hour = hour as f64;
        let month = month0 as f64;

        let mut dir = BASE_DIRECTION;
        dir += (site.lat - self.config.ref_lat) * 30.0;
        dir += (site.lon - self.config.ref_lon) * 20.0;
        dir += ((hour - 6.0) * PI / 12.0).sin() * 15.0;
        dir += ((month - 6.0) * PI / 6.0).sin() * 20.0;

        normalize_direction(normalize_direction(dir).round())
    }

    /// Speed before the random factor and clamping.
    pub fn base_speed(&self, site: &Site, hour: u32, month0: u32) -> f64 {
        let hour = hour as f64;
        let month = month0 as f64;

        BASE_SPEED
            + site.category().speed_bonus()
            + ((hour - 12.0) * PI / 12.0).sin() * 8.0
            + ((month - 9.0) * PI / 6.0).sin() * 5.0
    }

    /// Produce a reading for `site` at `now_ms`. Never fails.
    pub fn generate(&mut self, site: &Site, now_ms: i64) -> Observation {
        let hour = self.offset.hour(now_ms);
        let month0 = self.offset.month0(now_ms);

        let factor: f64 = self.rng.gen_range(JITTER);
        let speed = (self.base_speed(site, hour, month0) * factor).clamp(MIN_SPEED, MAX_SPEED);
        let speed = (speed * 10.0).round() / 10.0;

        Observation::new(
            speed,
            self.direction(site, hour, month0),
            None,
            now_ms,
            ObservationSource::Generated,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-01-15T00:30:00Z, 12:30 NZST, January
    const NOON_JAN: i64 = 1_705_278_600_000;

    fn reference_site() -> Site {
        Site::new("REF", "Reference", -41.0, 174.5)
    }

    #[test]
    fn test_direction_at_reference_point() {
        let gen = SyntheticGenerator::seeded(1);
        // sin(0) diurnal and sin(0) seasonal terms vanish
        assert_eq!(gen.direction(&reference_site(), 6, 6), 180.0);
        // hour 12: +15, month 9: +20
        assert_eq!(gen.direction(&reference_site(), 12, 9), 215.0);
    }

    #[test]
    fn test_base_speed_by_category() {
        let gen = SyntheticGenerator::seeded(1);
        let airport = Site::new("NZWN", "Wellington Airport", -41.0, 174.5);
        let coastal = Site::new("NZCT", "Castlepoint", -41.0, 174.5);
        assert!((gen.base_speed(&reference_site(), 12, 9) - 20.0).abs() < 1e-9);
        assert!((gen.base_speed(&airport, 12, 9) - 25.0).abs() < 1e-9);
        assert!((gen.base_speed(&coastal, 12, 9) - 28.0).abs() < 1e-9);
    }

    #[test]
    fn test_seeded_generator_is_deterministic() {
        let site = Site::new("NZKI", "Kapiti Island", -40.8667, 174.9167);
        let mut a = SyntheticGenerator::seeded(42);
        let mut b = SyntheticGenerator::seeded(42);
        for i in 0..20 {
            let t = NOON_JAN + i * 3_600_000;
            assert_eq!(a.generate(&site, t), b.generate(&site, t));
        }
    }

    #[test]
    fn test_generated_ranges() {
        let site = Site::new("NZWN", "Wellington Airport", -41.3272, 174.8053);
        let mut gen = SyntheticGenerator::seeded(7);
        for i in 0..500 {
            let obs = gen.generate(&site, NOON_JAN + i * 1_800_000);
            assert!((5.0..=45.0).contains(&obs.wind_speed_kmh));
            assert!((0.0..360.0).contains(&obs.wind_dir_deg));
            assert_eq!(obs.wind_dir_deg, obs.wind_dir_deg.round());
            assert_eq!(obs.source, ObservationSource::Generated);
            let tenths = obs.wind_speed_kmh * 10.0;
            assert!((tenths - tenths.round()).abs() < 1e-6);
        }
    }

    #[test]
    fn test_speed_factor_within_jitter() {
        assert!(JITTER.contains(&0.7) && JITTER.contains(&1.3));

        let site = reference_site();
        let mut gen = SyntheticGenerator::seeded(11);
        let base = gen.base_speed(&site, 12, 0);
        assert!((base - 25.0).abs() < 1e-9);
        // Rounding to 0.1 km/h moves the ratio by at most 0.05 / 25
        let slack = 0.05 / base + 1e-9;
        for _ in 0..500 {
            let ratio = gen.generate(&site, NOON_JAN).wind_speed_kmh / base;
            assert!(ratio >= 0.7 - slack && ratio <= 1.3 + slack, "ratio {}", ratio);
        }
    }

    #[test]
    fn test_uses_local_time() {
        let gen = SyntheticGenerator::seeded(3);
        let utc_gen = SyntheticGenerator::new(GeneratorConfig {
            utc_offset_minutes: 0,
            seed: Some(3),
            ..GeneratorConfig::default()
        });
        let site = reference_site();
        let mut a = gen;
        let mut b = utc_gen;
        // Same instant, 12 hours apart in wall-clock terms.
        assert_ne!(
            a.generate(&site, NOON_JAN).wind_dir_deg,
            b.generate(&site, NOON_JAN).wind_dir_deg
        );
    }
}
