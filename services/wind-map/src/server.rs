//! HTTP API for the latest snapshot, field rendering and playback control.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::error;
use wind_common::{Observation, Site, SiteId, WindError};
use wind_field::{arrow_field, encode_png, render_heatmap, site_markers, IdwInterpolator};

use crate::config::MapConfig;
use crate::history::SharedSequencer;
use crate::refresh::{Snapshot, SnapshotReceiver};

/// Shared state for all handlers.
pub struct AppState {
    pub sites: Vec<Site>,
    pub map: MapConfig,
    pub snapshots: SnapshotReceiver,
    pub sequencer: SharedSequencer,
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshots.borrow().clone()
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/observations", get(observations_handler))
        .route("/estimate", get(estimate_handler))
        .route("/field", get(field_handler))
        .route("/heatmap.png", get(heatmap_handler))
        .route("/playback", get(playback_handler))
        .route("/playback/play", post(play_handler))
        .route("/playback/pause", post(pause_handler))
        .route("/playback/toggle", post(toggle_handler))
        .route("/playback/seek", post(seek_handler))
        .route("/metrics", get(metrics_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}

/// Error response carrying a [`WindError`].
pub struct ApiError(WindError);

impl From<WindError> for ApiError {
    fn from(err: WindError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Which observations a field request is computed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    #[default]
    Live,
    Playback,
}

async fn field_observations(
    state: &AppState,
    source: FieldSource,
) -> ApiResult<(IdwInterpolator, HashMap<SiteId, Observation>)> {
    match source {
        FieldSource::Live => {
            let snapshot = state.snapshot();
            Ok((snapshot.interpolator.clone(), snapshot.observations.clone()))
        }
        FieldSource::Playback => {
            let seq = state.sequencer.read().await;
            let frame = seq.frame().ok_or(WindError::IndexOutOfRange {
                index: seq.index(),
                len: seq.len(),
            })?;
            let interp = IdwInterpolator::new(&state.sites, &frame.observations);
            Ok((interp, frame.observations))
        }
    }
}

fn require<T>(value: Option<T>, name: &str) -> ApiResult<T> {
    value.ok_or_else(|| WindError::MissingParameter(name.to_string()).into())
}

fn invalid(param: &str, message: impl Into<String>) -> ApiError {
    WindError::InvalidParameter {
        param: param.to_string(),
        message: message.into(),
    }
    .into()
}

fn check_dimension(param: &str, value: usize, max: usize) -> ApiResult<usize> {
    if value == 0 || value > max {
        return Err(invalid(param, format!("must be between 1 and {}", max)));
    }
    Ok(value)
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn status_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot();
    let seq = state.sequencer.read().await;
    Json(json!({
        "status": snapshot.status,
        "cycle": snapshot.cycle,
        "updated_at_ms": snapshot.updated_at_ms,
        "sites": state.sites.len(),
        "reporting": snapshot.observations.len(),
        "playback": {
            "state": seq.state(),
            "playback": seq.playback(),
            "index": seq.index(),
            "len": seq.len(),
            "limit_reason": seq.limit_reason(),
        },
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct SourceParams {
    #[serde(default)]
    pub source: FieldSource,
}

pub async fn observations_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<SourceParams>,
) -> ApiResult<impl IntoResponse> {
    let (_, observations) = field_observations(&state, params.source).await?;
    let markers = site_markers(
        &state.sites,
        &observations,
        &state.map.bounds,
        state.map.width,
        state.map.height,
    );
    Ok(Json(json!({
        "markers": markers,
        "observations": observations,
    })))
}

#[derive(Debug, Deserialize)]
pub struct EstimateParams {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(default)]
    pub source: FieldSource,
}

#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    pub lat: f64,
    pub lon: f64,
    pub dir_deg: f64,
    pub speed_kmh: f64,
    pub heading_deg: f64,
    pub compass: &'static str,
    /// Sites that contributed
    pub sites: usize,
}

pub async fn estimate_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<EstimateParams>,
) -> ApiResult<Json<EstimateResponse>> {
    let lat = require(params.lat, "lat")?;
    let lon = require(params.lon, "lon")?;
    if !(-90.0..=90.0).contains(&lat) {
        return Err(invalid("lat", "must be within [-90, 90]"));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(invalid("lon", "must be within [-180, 180]"));
    }

    let (interp, _) = field_observations(&state, params.source).await?;
    let estimate = interp.estimate(lat, lon);
    Ok(Json(EstimateResponse {
        lat,
        lon,
        dir_deg: estimate.dir_deg,
        speed_kmh: estimate.speed_kmh,
        heading_deg: estimate.heading_deg(),
        compass: estimate.compass(),
        sites: interp.len(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct FieldParams {
    pub width: Option<usize>,
    pub height: Option<usize>,
    pub spacing: Option<usize>,
    #[serde(default)]
    pub source: FieldSource,
}

pub async fn field_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<FieldParams>,
) -> ApiResult<impl IntoResponse> {
    let max = state.map.max_dimension;
    let width = check_dimension("width", params.width.unwrap_or(state.map.width), max)?;
    let height = check_dimension("height", params.height.unwrap_or(state.map.height), max)?;
    let spacing = params.spacing.unwrap_or(state.map.arrow_spacing);
    if spacing < 4 {
        return Err(invalid("spacing", "must be at least 4"));
    }

    let (interp, observations) = field_observations(&state, params.source).await?;
    let bounds = state.map.bounds;
    let arrows = arrow_field(&interp, &bounds, width, height, spacing);
    let markers = site_markers(&state.sites, &observations, &bounds, width, height);

    Ok(Json(json!({
        "width": width,
        "height": height,
        "bounds": bounds,
        "arrows": arrows,
        "markers": markers,
    })))
}

#[derive(Debug, Deserialize)]
pub struct HeatmapParams {
    pub width: Option<usize>,
    pub height: Option<usize>,
    #[serde(default)]
    pub source: FieldSource,
}

pub async fn heatmap_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<HeatmapParams>,
) -> ApiResult<Response> {
    let max = state.map.max_dimension;
    let width = check_dimension("width", params.width.unwrap_or(state.map.width), max)?;
    let height = check_dimension("height", params.height.unwrap_or(state.map.height), max)?;

    let (interp, _) = field_observations(&state, params.source).await?;
    let bounds = state.map.bounds;
    let stride = state.map.heatmap_stride;

    let png = tokio::task::spawn_blocking(move || {
        let pixels = render_heatmap(&interp, &bounds, width, height, stride);
        encode_png(&pixels, width, height)
    })
    .await
    .map_err(|e| WindError::InternalError(format!("render task failed: {}", e)))??;

    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

pub async fn playback_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let seq = state.sequencer.read().await;
    Json(json!({
        "state": seq.state(),
        "limit_reason": seq.limit_reason(),
        "frame": seq.frame(),
    }))
}

pub async fn play_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let mut seq = state.sequencer.write().await;
    let started = seq.play();
    Json(json!({
        "started": started,
        "playback": seq.playback(),
        "index": seq.index(),
    }))
}

pub async fn pause_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let mut seq = state.sequencer.write().await;
    seq.pause();
    Json(json!({
        "playback": seq.playback(),
        "index": seq.index(),
    }))
}

pub async fn toggle_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let mut seq = state.sequencer.write().await;
    let playback = seq.toggle();
    Json(json!({
        "playback": playback,
        "index": seq.index(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct SeekParams {
    pub index: Option<usize>,
    pub fraction: Option<f64>,
}

pub async fn seek_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<SeekParams>,
) -> ApiResult<impl IntoResponse> {
    let mut seq = state.sequencer.write().await;
    match (params.index, params.fraction) {
        (Some(index), None) => seq.seek(index)?,
        (None, Some(fraction)) => {
            seq.seek_fraction(fraction)?;
        }
        (Some(_), Some(_)) => return Err(invalid("index", "give either index or fraction")),
        (None, None) => return Err(WindError::MissingParameter("index".to_string()).into()),
    }
    Ok(Json(json!({
        "index": seq.index(),
        "fraction": seq.fraction(),
        "frame": seq.frame(),
    })))
}

pub async fn metrics_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    match &state.prometheus {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
    }
}
