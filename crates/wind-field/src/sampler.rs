//! Sampling the interpolated field over a pixel canvas.
//!
//! Pixel (0, 0) is the north-west corner of the map bounds.

use serde::Serialize;
use tracing::debug;
use wind_common::MapBounds;

use crate::colormap::heatmap_color;
use crate::interpolator::IdwInterpolator;

/// Base arrow length in pixels.
pub const ARROW_BASE_LEN: f64 = 8.0;
/// Extra pixels of arrow length per km/h.
pub const ARROW_LEN_PER_KMH: f64 = 1.8;

/// Interpolated speeds on a regular pixel lattice.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedGrid {
    pub cols: usize,
    pub rows: usize,
    pub stride: usize,
    /// Row-major, `cols * rows` values in km/h
    pub values: Vec<f64>,
}

impl SpeedGrid {
    pub fn get(&self, col: usize, row: usize) -> Option<f64> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.values.get(row * self.cols + col).copied()
    }
}

/// Sample the field every `stride` pixels, starting at the top-left pixel.
pub fn sample_speed_grid(
    interp: &IdwInterpolator,
    bounds: &MapBounds,
    width: usize,
    height: usize,
    stride: usize,
) -> SpeedGrid {
    let stride = stride.max(1);
    let cols = width.div_ceil(stride);
    let rows = height.div_ceil(stride);
    let mut values = Vec::with_capacity(cols * rows);

    for row in 0..rows {
        for col in 0..cols {
            let (lat, lon) = bounds.xy_to_lat_lon(
                (col * stride) as f64,
                (row * stride) as f64,
                width as f64,
                height as f64,
            );
            values.push(interp.estimate(lat, lon).speed_kmh);
        }
    }

    SpeedGrid {
        cols,
        rows,
        stride,
        values,
    }
}

/// Render the speed heatmap as RGBA bytes.
///
/// Each sample colours a `stride` x `stride` block.
pub fn render_heatmap(
    interp: &IdwInterpolator,
    bounds: &MapBounds,
    width: usize,
    height: usize,
    stride: usize,
) -> Vec<u8> {
    let grid = sample_speed_grid(interp, bounds, width, height, stride);
    let mut pixels = vec![0u8; width * height * 4];

    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let color = heatmap_color(grid.values[row * grid.cols + col]);
            let y0 = row * grid.stride;
            let x0 = col * grid.stride;
            for y in y0..(y0 + grid.stride).min(height) {
                for x in x0..(x0 + grid.stride).min(width) {
                    let idx = (y * width + x) * 4;
                    pixels[idx] = color.r;
                    pixels[idx + 1] = color.g;
                    pixels[idx + 2] = color.b;
                    pixels[idx + 3] = color.a;
                }
            }
        }
    }

    debug!(
        width = width,
        height = height,
        samples = grid.values.len(),
        "Rendered heatmap"
    );
    pixels
}

/// One arrow glyph of the arrow field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Arrow {
    pub x: f64,
    pub y: f64,
    pub lat: f64,
    pub lon: f64,
    /// Direction the wind blows from
    pub dir_deg: f64,
    pub speed_kmh: f64,
    /// Direction the arrow points (downwind)
    pub heading_deg: f64,
    pub length_px: f64,
}

/// Arrows on a lattice offset by half a spacing from the edges.
pub fn arrow_field(
    interp: &IdwInterpolator,
    bounds: &MapBounds,
    width: usize,
    height: usize,
    spacing: usize,
) -> Vec<Arrow> {
    let spacing = spacing.max(1);
    let mut arrows = Vec::new();

    let mut y = spacing / 2;
    while y < height {
        let mut x = spacing / 2;
        while x < width {
            let (lat, lon) =
                bounds.xy_to_lat_lon(x as f64, y as f64, width as f64, height as f64);
            let est = interp.estimate(lat, lon);
            arrows.push(Arrow {
                x: x as f64,
                y: y as f64,
                lat,
                lon,
                dir_deg: est.dir_deg,
                speed_kmh: est.speed_kmh,
                heading_deg: est.heading_deg(),
                length_px: ARROW_BASE_LEN + est.speed_kmh * ARROW_LEN_PER_KMH,
            });
            x += spacing;
        }
        y += spacing;
    }

    arrows
}

#[cfg(test)]
mod tests {
    use super::*;
    use wind_common::{Observation, ObservationSource};

    fn uniform(speed: f64, dir: f64) -> (IdwInterpolator, MapBounds) {
        let obs = Observation::new(speed, dir, None, 0, ObservationSource::Generated);
        let bounds = MapBounds::wellington();
        let interp = IdwInterpolator::from_points([(-41.0, 175.0, &obs)]);
        (interp, bounds)
    }

    #[test]
    fn test_grid_dimensions() {
        let (interp, bounds) = uniform(10.0, 180.0);
        let grid = sample_speed_grid(&interp, &bounds, 11, 6, 2);
        assert_eq!((grid.cols, grid.rows), (6, 3));
        assert_eq!(grid.values.len(), 18);
        assert_eq!(grid.get(5, 2), Some(10.0));
        assert_eq!(grid.get(6, 0), None);
    }

    #[test]
    fn test_heatmap_fills_every_pixel() {
        let (interp, bounds) = uniform(0.5, 0.0);
        let pixels = render_heatmap(&interp, &bounds, 5, 3, 2);
        assert_eq!(pixels.len(), 5 * 3 * 4);
        assert!(pixels.chunks(4).all(|p| p[3] == 180));
    }

    #[test]
    fn test_arrow_lattice() {
        let (interp, bounds) = uniform(10.0, 180.0);
        let arrows = arrow_field(&interp, &bounds, 64, 32, 16);
        assert_eq!(arrows.len(), 4 * 2);
        assert_eq!((arrows[0].x, arrows[0].y), (8.0, 8.0));
        assert_eq!((arrows[7].x, arrows[7].y), (56.0, 24.0));

        let a = arrows[0];
        assert_eq!(a.heading_deg, 0.0);
        assert!((a.length_px - 26.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_field_draws_short_arrows() {
        let arrows = arrow_field(&IdwInterpolator::default(), &MapBounds::wellington(), 16, 16, 16);
        assert_eq!(arrows.len(), 1);
        assert_eq!(arrows[0].speed_kmh, 0.0);
        assert_eq!(arrows[0].length_px, ARROW_BASE_LEN);
    }
}
