// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod feed;
pub mod metrics;
pub mod money;
pub mod queue;
pub mod record;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::RelayConfig;
pub use crate::queue::BoundedQueue;

use tokio::task::JoinHandle;

use crate::config::FeedConfig;
use crate::feed::{discord::DiscordFeed, FeedStatsHandle, JsonFileStore, Poller};

/// Build the Discord poller and its store from config.
/// Returns `None` when no token or no sources are configured.
pub fn build_feed_relay(cfg: &FeedConfig) -> Option<(Poller<DiscordFeed>, JsonFileStore)> {
    if !cfg.is_runnable() {
        return None;
    }
    let token = cfg.token.clone()?;
    let transport = DiscordFeed::new(token)
        .with_api_base(cfg.api_base.clone())
        .with_timeout(cfg.request_timeout_secs);
    let poller = Poller::new(transport, cfg.sources.clone())
        .with_page_limit(cfg.page_limit)
        .with_style(cfg.restyle.clone());
    Some((poller, JsonFileStore::new(cfg.data_file.clone())))
}

/// Start the background feed relay if the config allows it; logs why not otherwise.
pub fn spawn_feed_relay(cfg: &FeedConfig, stats: FeedStatsHandle) -> Option<JoinHandle<()>> {
    match build_feed_relay(cfg) {
        Some((poller, store)) => Some(feed::spawn_poller(poller, store, stats, cfg.schedule())),
        None => {
            if cfg.token.is_none() {
                tracing::warn!(target: "feed", "DISCORD_TOKEN not found, feed relay disabled");
            } else {
                tracing::warn!(target: "feed", "no feed sources configured, feed relay disabled");
            }
            None
        }
    }
}
