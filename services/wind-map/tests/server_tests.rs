//! HTTP API tests driven through the router without a socket.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use playback::{HistoricalSequencer, PlaybackConfig, SequencerState};
use serde_json::Value;
use sources::{ProviderChain, SyntheticGenerator};
use storage::{HistoricalCache, MemoryStore, ObservationCache};
use test_utils::{
    hourly_payload, observation, wellington_sites, ScriptedHistorical, ScriptedProvider,
    MID_JAN_2024_MS,
};
use tokio::sync::RwLock;
use tower::ServiceExt;
use wind_common::{ManualClock, ObservationSource};
use wind_map::config::MapConfig;
use wind_map::{create_router, AppState, HistoryLoader, RefreshCycle, SharedSequencer};

struct TestApp {
    router: Router,
    refresh: RefreshCycle,
    sequencer: SharedSequencer,
}

fn test_app() -> TestApp {
    let clock = Arc::new(ManualClock::new(MID_JAN_2024_MS));
    let provider = ScriptedProvider::new("open_meteo", ObservationSource::OpenMeteo)
        .always(Ok(observation(20.0, 180.0)));
    let refresh = RefreshCycle::new(
        wellington_sites(),
        ProviderChain::new(vec![provider.boxed()]),
        ObservationCache::new(Duration::from_secs(300), clock),
        Some(SyntheticGenerator::seeded(1)),
    );
    let sequencer: SharedSequencer = Arc::new(RwLock::new(HistoricalSequencer::new(false)));

    let state = Arc::new(AppState {
        sites: wellington_sites(),
        map: MapConfig::default(),
        snapshots: refresh.subscribe(),
        sequencer: sequencer.clone(),
        prometheus: None,
    });

    TestApp {
        router: create_router(state),
        refresh,
        sequencer,
    }
}

async fn load_history(sequencer: &SharedSequencer, hours: usize) -> SequencerState {
    let loader = HistoryLoader {
        sites: wellington_sites(),
        source: Box::new(ScriptedHistorical::new().always(Ok(hourly_payload(hours)))),
        cache: HistoricalCache::new(Arc::new(MemoryStore::new())),
        clock: Arc::new(ManualClock::new(MID_JAN_2024_MS)),
        config: PlaybackConfig {
            throttle_ms: 0,
            autoplay: false,
            ..PlaybackConfig::default()
        },
    };
    loader.load(sequencer).await
}

async fn send(router: &Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>, Option<String>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec(), content_type)
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body, _) = send(router, "GET", uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body, _) = send(router, "POST", uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, body, _) = send(&app.router, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn test_status_before_and_after_cycle() {
    let mut app = test_app();

    let (status, json) = get_json(&app.router, "/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"]["state"], "loading");
    assert_eq!(json["sites"], 8);
    assert_eq!(json["playback"]["state"], "idle");

    app.refresh.run_cycle().await;

    let (_, json) = get_json(&app.router, "/status").await;
    assert_eq!(json["status"]["state"], "live");
    assert_eq!(json["status"]["live"], 8);
    assert_eq!(json["status"]["total"], 8);
    assert_eq!(json["cycle"], 1);
    assert_eq!(json["updated_at_ms"], MID_JAN_2024_MS);
}

#[tokio::test]
async fn test_estimate_at_site() {
    let mut app = test_app();
    app.refresh.run_cycle().await;

    let (status, json) = get_json(&app.router, "/estimate?lat=-41.3272&lon=174.8053").await;
    assert_eq!(status, StatusCode::OK);
    assert!((json["speed_kmh"].as_f64().unwrap() - 20.0).abs() < 1e-9);
    assert!((json["dir_deg"].as_f64().unwrap() - 180.0).abs() < 1e-6);
    assert_eq!(json["compass"], "S");
    assert_eq!(json["sites"], 8);
}

#[tokio::test]
async fn test_estimate_without_data_is_zero() {
    let app = test_app();
    let (status, json) = get_json(&app.router, "/estimate?lat=-41.0&lon=175.0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["speed_kmh"], 0.0);
    assert_eq!(json["dir_deg"], 0.0);
    assert_eq!(json["sites"], 0);
}

#[tokio::test]
async fn test_estimate_parameter_errors() {
    let app = test_app();

    let (status, json) = get_json(&app.router, "/estimate?lat=-41.0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("lon"));

    let (status, _) = get_json(&app.router, "/estimate?lat=-141.0&lon=175.0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_heatmap_png() {
    let mut app = test_app();
    app.refresh.run_cycle().await;

    let (status, body, content_type) =
        send(&app.router, "GET", "/heatmap.png?width=64&height=48").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));
    assert_eq!(&body[..8], b"\x89PNG\r\n\x1a\n");
}

#[tokio::test]
async fn test_heatmap_rejects_bad_size() {
    let app = test_app();
    let (status, _, _) = send(&app.router, "GET", "/heatmap.png?width=0&height=10").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _, _) = send(&app.router, "GET", "/heatmap.png?width=10&height=99999").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_field_arrows_and_markers() {
    let mut app = test_app();
    app.refresh.run_cycle().await;

    let (status, json) = get_json(&app.router, "/field?width=64&height=64&spacing=16").await;
    assert_eq!(status, StatusCode::OK);
    let arrows = json["arrows"].as_array().unwrap();
    assert_eq!(arrows.len(), 16);
    assert_eq!(arrows[0]["x"], 8.0);
    assert_eq!(arrows[0]["y"], 8.0);
    // Southerly everywhere, arrows point north
    assert!(arrows[0]["heading_deg"].as_f64().unwrap().abs() < 1e-6);
    assert_eq!(json["markers"].as_array().unwrap().len(), 8);

    let (status, _) = get_json(&app.router, "/field?spacing=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_observations_markers() {
    let mut app = test_app();
    app.refresh.run_cycle().await;

    let (status, json) = get_json(&app.router, "/observations").await;
    assert_eq!(status, StatusCode::OK);
    let markers = json["markers"].as_array().unwrap();
    assert_eq!(markers.len(), 8);
    assert_eq!(markers[0]["id"], "NZWN");
    assert_eq!(markers[0]["state"], "live");
    assert_eq!(markers[0]["label"], "Wellington Airport (20 km/h) (LIVE)");
    assert_eq!(json["observations"]["NZWN"]["source"], "open_meteo");
}

#[tokio::test]
async fn test_playback_controls() {
    let app = test_app();

    let (_, json) = get_json(&app.router, "/playback").await;
    assert_eq!(json["state"], "idle");
    assert!(json["frame"].is_null());

    assert_eq!(load_history(&app.sequencer, 6).await, SequencerState::Ready);

    let (_, json) = get_json(&app.router, "/playback").await;
    assert_eq!(json["state"], "ready");
    assert_eq!(json["frame"]["index"], 0);
    assert_eq!(json["frame"]["len"], 6);
    assert_eq!(json["frame"]["label"]["date"], "15/01/2024");
    assert_eq!(json["frame"]["label"]["time"], "00:00");
    assert_eq!(json["frame"]["playback"], "paused");

    let (status, json) = post_json(&app.router, "/playback/play").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["started"], true);
    assert_eq!(json["playback"], "playing");

    let (status, json) = post_json(&app.router, "/playback/seek?index=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["index"], 3);
    assert_eq!(json["frame"]["playback"], "paused");
    assert_eq!(json["frame"]["observations"]["NZWN"]["wind_speed_kmh"], 13.0);

    let (_, json) = post_json(&app.router, "/playback/seek?fraction=1.0").await;
    assert_eq!(json["index"], 5);
    assert_eq!(json["fraction"], 1.0);

    let (status, _) = post_json(&app.router, "/playback/seek?index=6").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = post_json(&app.router, "/playback/seek").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, json) = post_json(&app.router, "/playback/pause").await;
    assert_eq!(json["playback"], "paused");
}

#[tokio::test]
async fn test_playback_toggle() {
    let app = test_app();

    // Nothing loaded yet, toggling cannot start playback
    let (status, json) = post_json(&app.router, "/playback/toggle").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["playback"], "paused");

    load_history(&app.sequencer, 4).await;

    let (_, json) = post_json(&app.router, "/playback/toggle").await;
    assert_eq!(json["playback"], "playing");
    let (_, json) = post_json(&app.router, "/playback/toggle").await;
    assert_eq!(json["playback"], "paused");

    // At the last frame there is nothing left to play
    app.sequencer.write().await.seek(3).unwrap();
    let (_, json) = post_json(&app.router, "/playback/toggle").await;
    assert_eq!(json["playback"], "paused");
    assert_eq!(json["index"], 3);
}

#[tokio::test]
async fn test_playback_source_for_estimates() {
    let app = test_app();

    let (status, _) = get_json(&app.router, "/estimate?lat=-41.0&lon=175.0&source=playback").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    load_history(&app.sequencer, 4).await;
    app.sequencer.write().await.seek(2).unwrap();

    // Every site reports hour 2: 12 km/h from 30°
    let (status, json) = get_json(&app.router, "/estimate?lat=-41.0&lon=175.0&source=playback").await;
    assert_eq!(status, StatusCode::OK);
    assert!((json["speed_kmh"].as_f64().unwrap() - 12.0).abs() < 1e-9);
    assert!((json["dir_deg"].as_f64().unwrap() - 30.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_metrics_without_recorder() {
    let app = test_app();
    let (status, _, _) = send(&app.router, "GET", "/metrics").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
