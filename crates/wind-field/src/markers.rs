//! Site markers for the map overlay.

use std::collections::HashMap;

use serde::Serialize;
use wind_common::{MapBounds, Observation, Site, SiteId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerState {
    /// Reading from a live provider
    Live,
    /// Reading from the synthetic generator
    Generated,
    /// No usable reading
    Offline,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteMarker {
    pub id: SiteId,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub state: MarkerState,
    pub speed_kmh: Option<f64>,
    pub compass: Option<&'static str>,
    pub label: String,
}

fn marker_state(obs: Option<&Observation>) -> MarkerState {
    match obs {
        Some(o) if o.source.is_live() => MarkerState::Live,
        Some(o) if o.has_wind() => MarkerState::Generated,
        _ => MarkerState::Offline,
    }
}

/// Canvas position, state and label for every site.
pub fn site_markers(
    sites: &[Site],
    observations: &HashMap<SiteId, Observation>,
    bounds: &MapBounds,
    width: usize,
    height: usize,
) -> Vec<SiteMarker> {
    sites
        .iter()
        .map(|site| {
            let obs = observations.get(&site.id);
            let state = marker_state(obs);
            let (x, y) = bounds.lat_lon_to_xy(site.lat, site.lon, width as f64, height as f64);
            let label = match (state, obs) {
                (MarkerState::Offline, _) | (_, None) => format!("{} (Offline)", site.name),
                (MarkerState::Live, Some(o)) => {
                    format!("{} ({:.0} km/h) (LIVE)", site.name, o.wind_speed_kmh)
                }
                (MarkerState::Generated, Some(o)) => {
                    format!("{} ({:.0} km/h) (GEN)", site.name, o.wind_speed_kmh)
                }
            };

            SiteMarker {
                id: site.id.clone(),
                name: site.name.clone(),
                x,
                y,
                state,
                speed_kmh: obs.map(|o| o.wind_speed_kmh),
                compass: obs.map(|o| o.compass()),
                label,
            }
        })
        .collect()
}
