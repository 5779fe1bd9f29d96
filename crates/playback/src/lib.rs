//! Historical wind playback.
//!
//! Per-site hourly series are loaded (from the historical cache or the
//! provider), merged onto a shared timeline, and stepped through by the
//! [`HistoricalSequencer`].

pub mod loader;
pub mod sequencer;
pub mod series;
pub mod timeline;

pub use loader::{load_timeline, PlaybackConfig};
pub use sequencer::{Frame, HistoricalSequencer, PlaybackState, SequencerState};
pub use series::{parse_hourly, HistoricalPoint};
pub use timeline::HistoricalTimeline;
