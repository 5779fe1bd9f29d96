//! Wind map service.
//!
//! Polls live providers on an interval, publishes interpolated snapshots,
//! replays historical wind and serves both over HTTP.

pub mod config;
pub mod history;
pub mod providers;
pub mod refresh;
pub mod server;

pub use config::{ProviderKind, WindMapConfig};
pub use history::{run_ticker, HistoryLoader, SharedSequencer};
pub use providers::build_chain;
pub use refresh::{ConnectionStatus, CycleReport, RefreshCycle, Snapshot, SnapshotReceiver};
pub use server::{create_router, AppState};
