//! The live refresh cycle.
//!
//! One cycle visits every site in order: a fresh cached reading is reused,
//! otherwise the provider chain is asked. Sites left without a reading get a
//! generated one. A rate limit stops all further requests for the cycle;
//! the remaining sites still get cached or generated readings so every
//! cycle publishes a complete snapshot.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge};
use serde::Serialize;
use sources::{ProviderChain, SyntheticGenerator};
use storage::ObservationCache;
use tokio::sync::{broadcast, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};
use wind_common::{Observation, Site, SiteId};
use wind_field::IdwInterpolator;

/// Connection indicator shown next to the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// No cycle has completed yet
    Loading,
    /// At least one site has a live reading
    Live { live: usize, total: usize },
    /// Every reading is generated
    Generated,
    /// A provider reported a rate limit during the last cycle
    LimitExceeded,
    /// No site has any reading
    Error,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Loading => "loading",
            ConnectionStatus::Live { .. } => "live",
            ConnectionStatus::Generated => "generated",
            ConnectionStatus::LimitExceeded => "limit_exceeded",
            ConnectionStatus::Error => "error",
        }
    }
}

/// Immutable result of one cycle, shared with readers through a watch channel.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub cycle: u64,
    pub status: ConnectionStatus,
    pub updated_at_ms: Option<i64>,
    pub observations: HashMap<SiteId, Observation>,
    #[serde(skip)]
    pub interpolator: IdwInterpolator,
}

impl Snapshot {
    pub fn loading() -> Self {
        Self {
            cycle: 0,
            status: ConnectionStatus::Loading,
            updated_at_ms: None,
            observations: HashMap::new(),
            interpolator: IdwInterpolator::default(),
        }
    }
}

pub type SnapshotReceiver = watch::Receiver<Arc<Snapshot>>;

/// Per-cycle counts, one per site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Answered by a provider this cycle
    pub fetched: usize,
    /// Reused from a fresh cache entry
    pub cached: usize,
    pub generated: usize,
    pub offline: usize,
    pub rate_limited: bool,
}

impl CycleReport {
    pub fn live(&self) -> usize {
        self.fetched + self.cached
    }

    fn status(&self, total: usize) -> ConnectionStatus {
        if self.rate_limited {
            ConnectionStatus::LimitExceeded
        } else if self.live() > 0 {
            ConnectionStatus::Live {
                live: self.live(),
                total,
            }
        } else if self.generated > 0 {
            ConnectionStatus::Generated
        } else {
            ConnectionStatus::Error
        }
    }
}

/// Sole writer of the observation cache.
pub struct RefreshCycle {
    sites: Vec<Site>,
    chain: ProviderChain,
    cache: ObservationCache,
    generator: Option<SyntheticGenerator>,
    publisher: watch::Sender<Arc<Snapshot>>,
    cycles: u64,
}

impl RefreshCycle {
    /// `generator` of `None` leaves unanswered sites offline.
    pub fn new(
        sites: Vec<Site>,
        chain: ProviderChain,
        cache: ObservationCache,
        generator: Option<SyntheticGenerator>,
    ) -> Self {
        let (publisher, _) = watch::channel(Arc::new(Snapshot::loading()));
        Self {
            sites,
            chain,
            cache,
            generator,
            publisher,
            cycles: 0,
        }
    }

    pub fn subscribe(&self) -> SnapshotReceiver {
        self.publisher.subscribe()
    }

    pub fn cache(&self) -> &ObservationCache {
        &self.cache
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// Run one full cycle and publish its snapshot.
    #[instrument(skip(self), fields(cycle = self.cycles + 1, sites = self.sites.len()))]
    pub async fn run_cycle(&mut self) -> CycleReport {
        let now_ms = self.cache.now_ms();
        let mut report = CycleReport::default();
        let mut observations = HashMap::with_capacity(self.sites.len());

        for site in &self.sites {
            if let Some(obs) = self.cache.get_fresh(&site.id, now_ms) {
                debug!(site = %site.id, "Using cached observation");
                observations.insert(site.id.clone(), obs.clone());
                report.cached += 1;
                continue;
            }

            if !report.rate_limited {
                match self.chain.fetch_current(site).await {
                    Ok(obs) => {
                        self.cache.put(site.id.clone(), obs.clone());
                        observations.insert(site.id.clone(), obs);
                        report.fetched += 1;
                        continue;
                    }
                    Err(e) if e.is_rate_limited() => {
                        warn!(site = %site.id, error = %e, "Rate limit reached, skipping remaining fetches");
                        report.rate_limited = true;
                    }
                    Err(e) => {
                        debug!(site = %site.id, error = %e, "No live reading");
                    }
                }
            }

            match self.generator.as_mut() {
                Some(generator) => {
                    observations.insert(site.id.clone(), generator.generate(site, now_ms));
                    report.generated += 1;
                }
                None => {
                    warn!(site = %site.id, "No data available, site offline");
                    report.offline += 1;
                }
            }
        }

        self.cycles += 1;
        let status = report.status(self.sites.len());
        self.publish(status, now_ms, observations);

        counter!("wind_cycle_total", "status" => status.as_str()).increment(1);
        gauge!("wind_live_sites").set(report.live() as f64);
        gauge!("wind_generated_sites").set(report.generated as f64);
        gauge!("wind_cache_hit_rate").set(self.cache.stats().hit_rate());

        info!(
            fetched = report.fetched,
            cached = report.cached,
            generated = report.generated,
            offline = report.offline,
            status = status.as_str(),
            "Refresh cycle complete"
        );
        report
    }

    fn publish(
        &self,
        status: ConnectionStatus,
        now_ms: i64,
        observations: HashMap<SiteId, Observation>,
    ) {
        let interpolator = IdwInterpolator::new(&self.sites, &observations);
        let snapshot = Snapshot {
            cycle: self.cycles,
            status,
            updated_at_ms: Some(now_ms),
            observations,
            interpolator,
        };
        self.publisher.send_replace(Arc::new(snapshot));
    }

    /// Run a cycle every `period` until shutdown. The first cycle runs
    /// immediately.
    pub async fn run_forever(&mut self, period: Duration, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_secs = period.as_secs(),
            providers = ?self.chain.names(),
            "Starting refresh loop"
        );
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Shutting down refresh loop");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
            }
        }
    }
}
