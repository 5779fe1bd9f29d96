//! Speed colour ramp for the heatmap.

/// Colour value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Display exaggeration applied to speeds before colouring.
pub const SPEED_EXAGGERATION: f64 = 2.5;
/// Exaggerated speed mapped to the top of the ramp.
pub const RAMP_MAX: f64 = 50.0;
pub const HEATMAP_ALPHA: u8 = 180;

fn channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Map a wind speed (km/h) onto the purple, blue, green, yellow, orange ramp.
pub fn heatmap_color(speed_kmh: f64) -> Color {
    let t = (speed_kmh * SPEED_EXAGGERATION / RAMP_MAX).clamp(0.0, 1.0);

    let (r, g, b) = match t {
        t if t < 0.2 => (128.0 + t * 5.0 * 25.0, 0.0, 255.0),
        t if t < 0.4 => (253.0 - (t - 0.2) * 5.0 * 253.0, 0.0, 255.0),
        t if t < 0.6 => (0.0, (t - 0.4) * 5.0 * 255.0, 255.0 - (t - 0.4) * 5.0 * 255.0),
        t if t < 0.8 => ((t - 0.6) * 5.0 * 255.0, 255.0, 0.0),
        t => (255.0, 255.0 - (t - 0.8) * 5.0 * 100.0, 0.0),
    };

    Color::new(channel(r), channel(g), channel(b), HEATMAP_ALPHA)
}
