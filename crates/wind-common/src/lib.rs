//! Common types and utilities shared across the wind map crates.

pub mod bounds;
pub mod clock;
pub mod error;
pub mod observation;
pub mod site;
pub mod time;
pub mod units;

pub use bounds::{equirectangular_distance, MapBounds};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{FetchError, WindError, WindResult};
pub use observation::{Observation, ObservationSource, WindEstimate};
pub use site::{Site, SiteCategory, SiteId};
pub use time::{parse_provider_local, DateWindow, LocalOffset, TimeLabel};
pub use units::{compass_point, normalize_direction, SpeedUnit};
