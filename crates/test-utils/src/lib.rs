//! Test helpers shared by the wind map crates.
//!
//! - `assert_approx_eq!` and `assert_bearing_approx_eq!` for speeds and angles
//! - Wellington site fixtures, observations and hourly payloads
//! - [`ScriptedProvider`] and [`ScriptedHistorical`] replaying canned results
//!
//! Pulled in as a dev-dependency; it depends on `sources`, so tests that box
//! scripted providers belong in a crate's `tests/` directory.

pub mod fixtures;
pub mod providers;

pub use fixtures::*;
pub use providers::*;

/// Fails when two numbers differ by more than `epsilon`.
///
/// ```ignore
/// assert_approx_eq!(wind.speed_kmh, 15.0, 1e-9);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Approximate equality of two bearings, measured the short way round.
///
/// ```ignore
/// use test_utils::assert_bearing_approx_eq;
///
/// assert_bearing_approx_eq!(359.9, 0.0, 0.5); // passes
/// ```
#[macro_export]
macro_rules! assert_bearing_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let raw = (left - right).rem_euclid(360.0);
        let diff = raw.min(360.0 - raw);
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)` (bearing)\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}
