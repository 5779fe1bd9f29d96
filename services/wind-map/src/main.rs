//! Wind map service binary.
//!
//! Runs the live refresh loop, the historical playback ticker and the HTTP
//! API until Ctrl-C.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use playback::HistoricalSequencer;
use sources::SyntheticGenerator;
use storage::{HistoricalCache, KeyValueStore, MemoryStore, ObservationCache, SqliteStore};
use tokio::sync::{broadcast, RwLock};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use wind_common::{Clock, SystemClock};
use wind_map::providers::{build_chain, build_historical};
use wind_map::{create_router, run_ticker, AppState, HistoryLoader, RefreshCycle, WindMapConfig};

#[derive(Parser, Debug)]
#[command(name = "wind-map")]
#[command(about = "Live and historical wind map for the Wellington region")]
struct Args {
    /// Path to the YAML configuration
    #[arg(short, long, env = "WIND_MAP_CONFIG", default_value = "config/wind-map.yaml")]
    config: PathBuf,

    /// Listen address for the HTTP API
    #[arg(short, long, env = "WIND_MAP_LISTEN", default_value = "0.0.0.0:8090")]
    listen: String,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Run one refresh cycle, print the snapshot and exit
    #[arg(long)]
    once: bool,

    /// Skip loading historical playback data
    #[arg(long)]
    no_history: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .json()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = WindMapConfig::load(&args.config)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let client = sources::http_client(config.request_timeout())?;

    let generator = config.synthetic_fallback.then(|| {
        SyntheticGenerator::new(config.generator.clone())
    });
    let mut refresh = RefreshCycle::new(
        config.sites.clone(),
        build_chain(&config, &client, clock.clone()),
        ObservationCache::new(config.cache_duration(), clock.clone()),
        generator,
    );

    if args.once {
        let report = refresh.run_cycle().await;
        let snapshot = refresh.subscribe().borrow().clone();
        println!("{}", serde_json::to_string_pretty(&*snapshot)?);
        info!(?report, "Single cycle complete");
        return Ok(());
    }

    let prometheus = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    info!("Prometheus metrics exporter initialized");

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let sequencer = Arc::new(RwLock::new(HistoricalSequencer::new(
        config.playback.config.autoplay,
    )));

    let state = Arc::new(AppState {
        sites: config.sites.clone(),
        map: config.map.clone(),
        snapshots: refresh.subscribe(),
        sequencer: sequencer.clone(),
        prometheus: Some(prometheus),
    });

    let refresh_task = {
        let period = config.update_interval();
        let shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move { refresh.run_forever(period, shutdown).await })
    };

    let ticker_task = tokio::spawn(run_ticker(
        sequencer.clone(),
        config.playback.config.tick_period(),
        shutdown_tx.subscribe(),
    ));

    if config.playback.enabled && !args.no_history {
        let store: Arc<dyn KeyValueStore> = match &config.storage.path {
            Some(path) => Arc::new(
                SqliteStore::open(path)
                    .await
                    .with_context(|| format!("Failed to open cache at {}", path.display()))?,
            ),
            None => Arc::new(MemoryStore::new()),
        };
        let loader = HistoryLoader {
            sites: config.sites.clone(),
            source: Box::new(build_historical(&config, &client)),
            cache: HistoricalCache::new(store),
            clock: clock.clone(),
            config: config.playback.config.clone(),
        };
        let sequencer = sequencer.clone();
        tokio::spawn(async move {
            loader.load(&sequencer).await;
        });
    } else {
        info!("Historical playback disabled");
    }

    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal"),
            Err(e) => warn!(error = %e, "Failed to listen for shutdown signal"),
        }
        let _ = signal_tx.send(());
    });

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", args.listen))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, sites = config.sites.len(), "Wind map API listening");

    let mut server_shutdown = shutdown_tx.subscribe();
    let app = create_router(state);
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = server_shutdown.recv().await;
        })
        .await
    {
        error!(error = %e, "Server error");
    }

    let _ = tokio::join!(refresh_task, ticker_task);
    info!("Wind map stopped");
    Ok(())
}
