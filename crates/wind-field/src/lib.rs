//! Spatial wind field estimation and rendering.
//!
//! - [`IdwInterpolator`]: inverse-distance weighted wind vector at any point
//! - [`sampler`]: heatmap grids, arrow fields and site markers over map bounds
//! - [`colormap`]: speed to RGBA ramp
//! - [`png`]: PNG encoding of rendered rasters

pub mod colormap;
pub mod interpolator;
pub mod markers;
pub mod png;
pub mod sampler;

pub use colormap::{heatmap_color, Color};
pub use interpolator::{IdwInterpolator, EPSILON};
pub use markers::{site_markers, MarkerState, SiteMarker};
pub use png::encode_png;
pub use sampler::{arrow_field, render_heatmap, sample_speed_grid, Arrow, SpeedGrid};
