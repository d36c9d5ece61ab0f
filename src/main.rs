//! Server Relay: binary entrypoint
//! Boots the Axum HTTP server (queue API) and, when a token is configured,
//! the background feed relay.

use server_relay::{
    api::{self, AppState},
    feed::FeedStatsHandle,
    metrics::Metrics,
    telemetry, RelayConfig,
};
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    telemetry::init_tracing();

    let cfg = RelayConfig::load().map_err(shuttle_runtime::Error::Custom)?;
    tracing::info!(
        queue_capacity = cfg.queue.capacity,
        sources = cfg.feed.sources.len(),
        "relay config loaded"
    );

    let feed_stats = FeedStatsHandle::new();
    let state = AppState::new(&cfg.queue, feed_stats.clone());

    let metrics = if cfg.metrics_enabled {
        match Metrics::init(cfg.queue.capacity) {
            Ok(m) => Some(m),
            Err(e) => {
                tracing::warn!(error = ?e, "metrics disabled");
                None
            }
        }
    } else {
        None
    };

    // Runs for the life of the process; the handle is not needed.
    let _relay = server_relay::spawn_feed_relay(&cfg.feed, feed_stats);

    let router = api::create_router(state, metrics.as_ref());
    Ok(router.into())
}
