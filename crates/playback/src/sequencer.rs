//! Playback state machine over a historical timeline.
//!
//! ```text
//! Idle -> Fetching -> Ready
//!                  \-> LimitExceeded (terminal)
//! ```
//!
//! While `Ready`, the cursor is either `Playing` (advanced by `tick`) or
//! `Paused`. Seeking is always allowed and always pauses.

use std::collections::HashMap;

use serde::Serialize;
use sources::HistoricalSource;
use storage::HistoricalCache;
use tracing::{debug, info, warn};
use wind_common::{Clock, FetchError, Observation, Site, SiteId, TimeLabel, WindError, WindResult};

use crate::loader::{load_timeline, PlaybackConfig};
use crate::timeline::HistoricalTimeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SequencerState {
    Idle,
    Fetching,
    Ready,
    LimitExceeded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Playing,
    Paused,
}

/// Everything needed to draw one playback step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub index: usize,
    pub len: usize,
    /// Slider position in [0, 1]
    pub fraction: f64,
    pub label: TimeLabel,
    pub playback: PlaybackState,
    pub observations: HashMap<SiteId, Observation>,
}

pub struct HistoricalSequencer {
    state: SequencerState,
    playback: PlaybackState,
    index: usize,
    timeline: HistoricalTimeline,
    autoplay: bool,
    limit_reason: Option<String>,
}

impl Default for HistoricalSequencer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl HistoricalSequencer {
    pub fn new(autoplay: bool) -> Self {
        Self {
            state: SequencerState::Idle,
            playback: PlaybackState::Paused,
            index: 0,
            timeline: HistoricalTimeline::default(),
            autoplay,
            limit_reason: None,
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn playback(&self) -> PlaybackState {
        self.playback
    }

    pub fn is_playing(&self) -> bool {
        self.playback == PlaybackState::Playing
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    pub fn timeline(&self) -> &HistoricalTimeline {
        &self.timeline
    }

    /// Provider message that put the sequencer into `LimitExceeded`.
    pub fn limit_reason(&self) -> Option<&str> {
        self.limit_reason.as_deref()
    }

    /// Enter `Fetching`. Refused while a fetch is running and once the
    /// provider limit has been hit.
    pub fn begin_fetch(&mut self) -> bool {
        match self.state {
            SequencerState::Idle | SequencerState::Ready => {
                self.state = SequencerState::Fetching;
                self.playback = PlaybackState::Paused;
                true
            }
            SequencerState::Fetching | SequencerState::LimitExceeded => false,
        }
    }

    /// Complete a fetch started with [`begin_fetch`](Self::begin_fetch).
    pub fn finish(&mut self, result: Result<HistoricalTimeline, FetchError>) {
        match result {
            Ok(timeline) => {
                self.timeline = timeline;
                self.index = 0;
                self.state = SequencerState::Ready;
                self.playback = PlaybackState::Paused;
                info!(steps = self.timeline.len(), "Playback ready");
                if self.autoplay {
                    self.play();
                }
            }
            Err(FetchError::RateLimited { provider, reason }) => {
                warn!(provider = %provider, reason = %reason, "Playback disabled by rate limit");
                self.state = SequencerState::LimitExceeded;
                self.playback = PlaybackState::Paused;
                self.limit_reason = Some(reason);
            }
            Err(e) => {
                warn!(error = %e, "Playback fetch failed");
                self.state = SequencerState::Idle;
            }
        }
    }

    /// Run a complete load: `begin_fetch`, [`load_timeline`], `finish`.
    pub async fn load(
        &mut self,
        sites: &[Site],
        source: &dyn HistoricalSource,
        cache: &HistoricalCache,
        clock: &dyn Clock,
        config: &PlaybackConfig,
    ) -> SequencerState {
        if !self.begin_fetch() {
            return self.state;
        }
        let result = load_timeline(sites, source, cache, clock, config).await;
        self.finish(result);
        self.state
    }

    /// Start playing from the current index. Returns whether playback started.
    pub fn play(&mut self) -> bool {
        if self.state != SequencerState::Ready || self.index + 1 >= self.timeline.len() {
            return false;
        }
        self.playback = PlaybackState::Playing;
        true
    }

    pub fn pause(&mut self) {
        self.playback = PlaybackState::Paused;
    }

    pub fn toggle(&mut self) -> PlaybackState {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
        self.playback
    }

    /// Advance one step while playing. Returns whether the index moved.
    ///
    /// Arriving at the final index pauses playback.
    pub fn tick(&mut self) -> bool {
        if !self.is_playing() || self.state != SequencerState::Ready {
            return false;
        }

        let last = self.timeline.len().saturating_sub(1);
        if self.index >= last {
            self.playback = PlaybackState::Paused;
            return false;
        }

        self.index += 1;
        if self.index == last {
            debug!("Playback reached the end");
            self.playback = PlaybackState::Paused;
        }
        true
    }

    /// Jump to `index`. Cancels playback.
    pub fn seek(&mut self, index: usize) -> WindResult<()> {
        self.playback = PlaybackState::Paused;
        if index >= self.timeline.len() {
            return Err(WindError::IndexOutOfRange {
                index,
                len: self.timeline.len(),
            });
        }
        self.index = index;
        Ok(())
    }

    /// Jump to a slider position in [0, 1]. Cancels playback.
    pub fn seek_fraction(&mut self, fraction: f64) -> WindResult<usize> {
        if !fraction.is_finite() {
            return Err(WindError::InvalidParameter {
                param: "fraction".to_string(),
                message: "must be a finite number".to_string(),
            });
        }
        let len = self.timeline.len();
        if len == 0 {
            self.playback = PlaybackState::Paused;
            return Err(WindError::IndexOutOfRange { index: 0, len });
        }
        let index = (fraction.clamp(0.0, 1.0) * (len - 1) as f64).round() as usize;
        self.seek(index)?;
        Ok(index)
    }

    /// Slider position of the current index.
    pub fn fraction(&self) -> f64 {
        let len = self.timeline.len();
        if len <= 1 {
            0.0
        } else {
            self.index as f64 / (len - 1) as f64
        }
    }

    /// Observations of every site at `index`.
    pub fn at(&self, index: usize) -> WindResult<HashMap<SiteId, Observation>> {
        self.timeline.at(index)
    }

    /// The current step, if a timeline is loaded.
    pub fn frame(&self) -> Option<Frame> {
        let label = self.timeline.label(self.index)?.clone();
        let observations = self.timeline.at(self.index).ok()?;
        Some(Frame {
            index: self.index,
            len: self.timeline.len(),
            fraction: self.fraction(),
            label,
            playback: self.playback,
            observations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::HistoricalPoint;
    use wind_common::ObservationSource;

    fn timeline(lengths: &[usize]) -> HistoricalTimeline {
        let series = lengths
            .iter()
            .enumerate()
            .map(|(s, &n)| {
                let points = (0..n)
                    .map(|i| HistoricalPoint {
                        label: TimeLabel {
                            date: "15/01/2024".to_string(),
                            time: format!("{:02}:00", i),
                        },
                        observation: Observation::new(
                            10.0,
                            90.0,
                            None,
                            i as i64,
                            ObservationSource::OpenMeteo,
                        ),
                    })
                    .collect();
                (SiteId::new(format!("S{}", s)), points)
            })
            .collect();
        HistoricalTimeline::from_series(series)
    }

    fn ready(lengths: &[usize], autoplay: bool) -> HistoricalSequencer {
        let mut seq = HistoricalSequencer::new(autoplay);
        assert!(seq.begin_fetch());
        seq.finish(Ok(timeline(lengths)));
        seq
    }

    #[test]
    fn test_state_transitions() {
        let mut seq = HistoricalSequencer::new(false);
        assert_eq!(seq.state(), SequencerState::Idle);
        assert!(seq.begin_fetch());
        assert_eq!(seq.state(), SequencerState::Fetching);
        assert!(!seq.begin_fetch());
        seq.finish(Ok(timeline(&[3])));
        assert_eq!(seq.state(), SequencerState::Ready);
        assert_eq!(seq.playback(), PlaybackState::Paused);
    }

    #[test]
    fn test_limit_exceeded_is_terminal() {
        let mut seq = HistoricalSequencer::new(true);
        seq.begin_fetch();
        seq.finish(Err(FetchError::rate_limited("open_meteo", "Daily API request limit exceeded")));
        assert_eq!(seq.state(), SequencerState::LimitExceeded);
        assert_eq!(seq.limit_reason(), Some("Daily API request limit exceeded"));
        assert!(!seq.begin_fetch());
        assert!(!seq.play());
        assert!(seq.frame().is_none());
    }

    #[test]
    fn test_autoplay_and_run_to_end() {
        let mut seq = ready(&[4], true);
        assert!(seq.is_playing());
        assert!(seq.tick());
        assert!(seq.tick());
        assert!(seq.tick());
        assert_eq!(seq.index(), 3);
        assert_eq!(seq.playback(), PlaybackState::Paused);
        assert!(!seq.tick());
        assert_eq!(seq.index(), 3);
        // nothing left to play
        assert!(!seq.play());
    }

    #[test]
    fn test_seek_cancels_playing() {
        let mut seq = ready(&[10], true);
        assert!(seq.is_playing());
        seq.seek(5).unwrap();
        assert_eq!(seq.index(), 5);
        assert!(!seq.is_playing());
        assert!(!seq.tick());

        assert!(seq.play());
        assert!(seq.tick());
        assert_eq!(seq.index(), 6);
    }

    #[test]
    fn test_toggle() {
        let mut idle = HistoricalSequencer::new(false);
        assert_eq!(idle.toggle(), PlaybackState::Paused);

        let mut seq = ready(&[3], false);
        assert_eq!(seq.toggle(), PlaybackState::Playing);
        assert_eq!(seq.toggle(), PlaybackState::Paused);
        seq.seek(2).unwrap();
        assert_eq!(seq.toggle(), PlaybackState::Paused);
    }

    #[test]
    fn test_seek_out_of_range() {
        let mut seq = ready(&[3], false);
        assert!(matches!(
            seq.seek(3),
            Err(WindError::IndexOutOfRange { index: 3, len: 3 })
        ));
        assert_eq!(seq.index(), 0);
    }

    #[test]
    fn test_seek_fraction() {
        let mut seq = ready(&[11], false);
        assert_eq!(seq.seek_fraction(0.5).unwrap(), 5);
        assert_eq!(seq.seek_fraction(0.96).unwrap(), 10);
        assert_eq!(seq.seek_fraction(2.0).unwrap(), 10);
        assert_eq!(seq.seek_fraction(-1.0).unwrap(), 0);
        assert!(seq.seek_fraction(f64::NAN).is_err());
        seq.seek(4).unwrap();
        assert!((seq.fraction() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_frame_omits_short_series() {
        let mut seq = ready(&[2, 5], false);
        seq.seek(4).unwrap();
        let frame = seq.frame().unwrap();
        assert_eq!(frame.len, 5);
        assert_eq!(frame.label.time, "04:00");
        assert_eq!(frame.observations.len(), 1);
        assert!(frame.observations.contains_key("S1"));
    }

    #[test]
    fn test_single_step_timeline_does_not_play() {
        let seq = ready(&[1], true);
        assert!(!seq.is_playing());
        assert_eq!(seq.fraction(), 0.0);
        assert!(seq.frame().is_some());
    }
}
