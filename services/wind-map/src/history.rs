//! Drives the historical sequencer: one load at startup, then a fixed tick.

use std::sync::Arc;
use std::time::Duration;

use playback::{load_timeline, HistoricalSequencer, PlaybackConfig, SequencerState};
use sources::HistoricalSource;
use storage::HistoricalCache;
use tokio::sync::{broadcast, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use wind_common::{Clock, Site};

pub type SharedSequencer = Arc<RwLock<HistoricalSequencer>>;

/// Everything a history load needs besides the sequencer.
pub struct HistoryLoader {
    pub sites: Vec<Site>,
    pub source: Box<dyn HistoricalSource>,
    pub cache: HistoricalCache,
    pub clock: Arc<dyn Clock>,
    pub config: PlaybackConfig,
}

impl HistoryLoader {
    /// Load the timeline into `sequencer`.
    ///
    /// The lock is only held to change state, never across requests, so
    /// readers see `Fetching` while the load runs.
    pub async fn load(&self, sequencer: &SharedSequencer) -> SequencerState {
        {
            let mut seq = sequencer.write().await;
            if !seq.begin_fetch() {
                warn!(state = ?seq.state(), "History load refused");
                return seq.state();
            }
        }

        let result = load_timeline(
            &self.sites,
            self.source.as_ref(),
            &self.cache,
            self.clock.as_ref(),
            &self.config,
        )
        .await;

        let mut seq = sequencer.write().await;
        seq.finish(result);
        info!(state = ?seq.state(), steps = seq.len(), "History load finished");
        seq.state()
    }
}

/// Advance the sequencer every `period` until shutdown.
pub async fn run_ticker(
    sequencer: SharedSequencer,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                info!("Shutting down playback ticker");
                break;
            }
            _ = ticker.tick() => {
                let mut seq = sequencer.write().await;
                if seq.is_playing() {
                    seq.tick();
                }
            }
        }
    }
}
