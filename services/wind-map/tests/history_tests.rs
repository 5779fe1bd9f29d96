//! Historical playback driver: loading and ticking.

use std::sync::Arc;
use std::time::Duration;

use playback::{HistoricalSequencer, PlaybackConfig, PlaybackState, SequencerState};
use storage::{HistoricalCache, MemoryStore};
use test_utils::{hourly_payload, site, ScriptedHistorical, MID_JAN_2024_MS};
use tokio::sync::{broadcast, RwLock};
use wind_common::{FetchError, ManualClock};
use wind_map::{run_ticker, HistoryLoader, SharedSequencer};

fn loader(source: ScriptedHistorical, autoplay: bool) -> HistoryLoader {
    HistoryLoader {
        sites: vec![site("Levin", -40.6, 175.3), site("Castlepoint", -40.9, 176.2)],
        source: Box::new(source),
        cache: HistoricalCache::new(Arc::new(MemoryStore::new())),
        clock: Arc::new(ManualClock::new(MID_JAN_2024_MS)),
        config: PlaybackConfig {
            autoplay,
            ..PlaybackConfig::default()
        },
    }
}

fn sequencer(autoplay: bool) -> SharedSequencer {
    Arc::new(RwLock::new(HistoricalSequencer::new(autoplay)))
}

#[tokio::test(start_paused = true)]
async fn test_autoplay_runs_to_the_end() {
    let source = ScriptedHistorical::new().always(Ok(hourly_payload(4)));
    let seq = sequencer(true);
    assert_eq!(loader(source, true).load(&seq).await, SequencerState::Ready);
    assert!(seq.read().await.is_playing());

    let (tx, rx) = broadcast::channel(1);
    let ticker = tokio::spawn(run_ticker(seq.clone(), Duration::from_millis(200), rx));

    tokio::time::sleep(Duration::from_millis(2000)).await;
    {
        let s = seq.read().await;
        assert_eq!(s.index(), 3);
        assert_eq!(s.playback(), PlaybackState::Paused);
    }

    tx.send(()).unwrap();
    ticker.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_paused_sequencer_does_not_move() {
    let source = ScriptedHistorical::new().always(Ok(hourly_payload(4)));
    let seq = sequencer(false);
    loader(source, false).load(&seq).await;

    let (tx, rx) = broadcast::channel(1);
    let ticker = tokio::spawn(run_ticker(seq.clone(), Duration::from_millis(200), rx));
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(seq.read().await.index(), 0);

    tx.send(()).unwrap();
    ticker.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_limit_exceeded_is_terminal() {
    let source = ScriptedHistorical::new().always(Err(FetchError::rate_limited(
        "open_meteo",
        "Daily API request limit exceeded",
    )));
    let seq = sequencer(true);
    let history = loader(source.clone(), true);

    assert_eq!(history.load(&seq).await, SequencerState::LimitExceeded);
    assert_eq!(source.call_count(), 1);
    assert!(seq.read().await.limit_reason().unwrap().contains("limit"));

    // A second load is refused without touching the provider
    assert_eq!(history.load(&seq).await, SequencerState::LimitExceeded);
    assert_eq!(source.call_count(), 1);
}
