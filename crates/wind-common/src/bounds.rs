//! Map bounds and planar distance.

use serde::{Deserialize, Serialize};

/// Geographic rectangle mapped onto the render surface.
///
/// North is the top edge of the canvas and west the left edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    pub north: f64,
    pub south: f64,
    pub west: f64,
    pub east: f64,
}

impl MapBounds {
    pub fn new(north: f64, south: f64, west: f64, east: f64) -> Self {
        Self {
            north,
            south,
            west,
            east,
        }
    }

    /// Default frame covering the lower North Island and Marlborough.
    pub fn wellington() -> Self {
        Self::new(-40.5, -41.6, 173.5, 177.0)
    }

    pub fn width_deg(&self) -> f64 {
        self.east - self.west
    }

    pub fn height_deg(&self) -> f64 {
        self.north - self.south
    }

    /// Convert a canvas pixel position to a coordinate, returning `(lat, lon)`.
    pub fn xy_to_lat_lon(&self, x: f64, y: f64, width: f64, height: f64) -> (f64, f64) {
        let lon = self.west + (x / width) * self.width_deg();
        let lat = self.north - (y / height) * self.height_deg();
        (lat, lon)
    }

    /// Convert a coordinate to a canvas pixel position, returning `(x, y)`.
    pub fn lat_lon_to_xy(&self, lat: f64, lon: f64, width: f64, height: f64) -> (f64, f64) {
        let x = (lon - self.west) / self.width_deg() * width;
        let y = (self.north - lat) / self.height_deg() * height;
        (x, y)
    }
}

/// Planar distance in degrees using the equirectangular approximation.
///
/// Longitude differences are scaled by the cosine of the mean latitude.
/// Not suitable for navigation, only for relative weighting.
pub fn equirectangular_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let avg_lat_rad = ((lat1 + lat2) / 2.0).to_radians();
    let dx = (lon2 - lon1) * avg_lat_rad.cos();
    let dy = lat2 - lat1;
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_round_trip_corners() {
        let bounds = MapBounds::wellington();
        let (lat, lon) = bounds.xy_to_lat_lon(0.0, 0.0, 800.0, 600.0);
        assert_eq!((lat, lon), (-40.5, 173.5));

        let (lat, lon) = bounds.xy_to_lat_lon(800.0, 600.0, 800.0, 600.0);
        assert!((lat - -41.6).abs() < 1e-9);
        assert!((lon - 177.0).abs() < 1e-9);

        let (x, y) = bounds.lat_lon_to_xy(-41.05, 175.25, 800.0, 600.0);
        assert!((x - 400.0).abs() < 1e-6);
        assert!((y - 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_distance_on_equator() {
        assert!((equirectangular_distance(0.0, 0.0, 0.0, 5.0) - 5.0).abs() < 1e-12);
        assert!((equirectangular_distance(0.0, 0.0, 3.0, 0.0) - 3.0).abs() < 1e-12);
        assert_eq!(equirectangular_distance(-41.0, 174.0, -41.0, 174.0), 0.0);
    }

    #[test]
    fn test_distance_shrinks_longitude_at_high_latitude() {
        let at_60 = equirectangular_distance(60.0, 0.0, 60.0, 10.0);
        assert!((at_60 - 5.0).abs() < 1e-9);
    }
}
