//! Inverse-distance weighted wind interpolation.
//!
//! Directions are averaged as unit vectors so that 350° and 10° meet at 0°
//! rather than 180°. Speed is the weighted arithmetic mean.

use std::collections::HashMap;

use wind_common::{equirectangular_distance, normalize_direction, Observation, Site, SiteId, WindEstimate};

/// Added to every distance so a query on top of a site stays finite.
pub const EPSILON: f64 = 0.0001;

#[derive(Debug, Clone, Copy)]
struct Sample {
    lat: f64,
    lon: f64,
    cos: f64,
    sin: f64,
    speed: f64,
}

/// Interpolator over one snapshot of observations.
///
/// Built once per snapshot; each estimate is O(number of sites).
#[derive(Debug, Clone, Default)]
pub struct IdwInterpolator {
    samples: Vec<Sample>,
}

impl IdwInterpolator {
    /// Build from sites and their observations. Sites without an
    /// observation, or with zero wind, take no part.
    pub fn new(sites: &[Site], observations: &HashMap<SiteId, Observation>) -> Self {
        let samples = sites
            .iter()
            .filter_map(|site| {
                let obs = observations.get(&site.id)?;
                obs.has_wind().then(|| Sample::new(site.lat, site.lon, obs))
            })
            .collect();
        Self { samples }
    }

    /// Build from `(lat, lon, observation)` triples.
    pub fn from_points<'a>(points: impl IntoIterator<Item = (f64, f64, &'a Observation)>) -> Self {
        let samples = points
            .into_iter()
            .filter(|(_, _, obs)| obs.has_wind())
            .map(|(lat, lon, obs)| Sample::new(lat, lon, obs))
            .collect();
        Self { samples }
    }

    /// Number of sites contributing to estimates.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Estimate the wind at a coordinate. Zero when no site contributes.
    pub fn estimate(&self, lat: f64, lon: f64) -> WindEstimate {
        if self.samples.is_empty() {
            return WindEstimate::zero();
        }

        let mut sum_w = 0.0;
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut sum_speed = 0.0;

        for s in &self.samples {
            let d = equirectangular_distance(lat, lon, s.lat, s.lon);
            let w = 1.0 / (d + EPSILON);
            sum_w += w;
            sum_x += s.cos * w;
            sum_y += s.sin * w;
            sum_speed += s.speed * w;
        }

        let dir = normalize_direction(sum_y.atan2(sum_x).to_degrees());
        WindEstimate::new(dir, sum_speed / sum_w)
    }
}

impl Sample {
    fn new(lat: f64, lon: f64, obs: &Observation) -> Self {
        let rad = obs.wind_dir_deg.to_radians();
        Self {
            lat,
            lon,
            cos: rad.cos(),
            sin: rad.sin(),
            speed: obs.wind_speed_kmh,
        }
    }
}
