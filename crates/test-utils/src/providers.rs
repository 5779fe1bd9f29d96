//! Scripted providers that replay canned responses and record calls.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use sources::{HistoricalSource, WeatherProvider};
use wind_common::{DateWindow, FetchError, Observation, ObservationSource, Site};

type Scripted<T> = Result<T, FetchError>;

struct Script<T> {
    per_site: HashMap<String, VecDeque<Scripted<T>>>,
    fallback: Option<Scripted<T>>,
    calls: Vec<String>,
}

impl<T: Clone> Script<T> {
    fn next(&mut self, provider: &str, key: &str) -> Scripted<T> {
        self.calls.push(key.to_string());
        if let Some(queue) = self.per_site.get_mut(key) {
            if let Some(next) = queue.pop_front() {
                return next;
            }
        }
        self.fallback
            .clone()
            .unwrap_or_else(|| Err(FetchError::network(provider, "no scripted response")))
    }
}

/// A current-conditions provider driven by a script.
///
/// Clones share state, so a test can keep a handle after boxing one into a
/// `ProviderChain`.
#[derive(Clone)]
pub struct ScriptedProvider {
    name: &'static str,
    source: ObservationSource,
    script: Arc<Mutex<Script<Observation>>>,
}

impl ScriptedProvider {
    pub fn new(name: &'static str, source: ObservationSource) -> Self {
        Self {
            name,
            source,
            script: Arc::new(Mutex::new(Script {
                per_site: HashMap::new(),
                fallback: None,
                calls: Vec::new(),
            })),
        }
    }

    /// Answer every request without a site-specific script with `result`.
    pub fn always(self, result: Scripted<Observation>) -> Self {
        self.script.lock().unwrap().fallback = Some(result);
        self
    }

    /// Queue a response for one site id.
    pub fn on_site(self, site_id: &str, result: Scripted<Observation>) -> Self {
        self.script
            .lock()
            .unwrap()
            .per_site
            .entry(site_id.to_string())
            .or_default()
            .push_back(result);
        self
    }

    /// Site ids requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.script.lock().unwrap().calls.len()
    }

    pub fn boxed(&self) -> Box<dyn WeatherProvider> {
        Box::new(self.clone())
    }
}

#[async_trait]
impl WeatherProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn source(&self) -> ObservationSource {
        self.source
    }

    async fn fetch_current(&self, site: &Site) -> Result<Observation, FetchError> {
        self.script
            .lock()
            .unwrap()
            .next(self.name, site.id.as_str())
    }
}

/// A historical source driven by a script keyed by site name.
#[derive(Clone)]
pub struct ScriptedHistorical {
    script: Arc<Mutex<Script<Value>>>,
}

impl Default for ScriptedHistorical {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedHistorical {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                per_site: HashMap::new(),
                fallback: None,
                calls: Vec::new(),
            })),
        }
    }

    pub fn always(self, result: Scripted<Value>) -> Self {
        self.script.lock().unwrap().fallback = Some(result);
        self
    }

    pub fn on_site(self, site_name: &str, result: Scripted<Value>) -> Self {
        self.script
            .lock()
            .unwrap()
            .per_site
            .entry(site_name.to_string())
            .or_default()
            .push_back(result);
        self
    }

    /// Site names requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.script.lock().unwrap().calls.len()
    }
}

#[async_trait]
impl HistoricalSource for ScriptedHistorical {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch_hourly(&self, site: &Site, _window: &DateWindow) -> Result<Value, FetchError> {
        self.script.lock().unwrap().next("scripted", &site.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{observation, site};

    #[tokio::test]
    async fn test_scripted_provider_replays_in_order() {
        let provider = ScriptedProvider::new("alpha", ObservationSource::OpenMeteo)
            .on_site("A", Ok(observation(10.0, 90.0)))
            .on_site("A", Err(FetchError::network("alpha", "reset")))
            .always(Ok(observation(1.0, 0.0)));

        let a = site("A", 0.0, 0.0);
        assert_eq!(provider.fetch_current(&a).await.unwrap().wind_speed_kmh, 10.0);
        assert!(provider.fetch_current(&a).await.is_err());
        assert_eq!(provider.fetch_current(&a).await.unwrap().wind_speed_kmh, 1.0);
        assert_eq!(provider.call_count(), 3);
    }
}
