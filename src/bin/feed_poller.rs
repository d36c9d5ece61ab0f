//! Standalone feed relay: polls the configured channels and appends new embed
//! messages to the data file. No HTTP server.

use anyhow::Context;
use server_relay::{feed::FeedStatsHandle, telemetry, RelayConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let cfg = RelayConfig::load()?;
    let stats = FeedStatsHandle::new();
    let handle = server_relay::spawn_feed_relay(&cfg.feed, stats)
        .context("feed relay needs DISCORD_TOKEN and at least one [[feed.sources]] entry")?;

    tokio::select! {
        res = handle => res.context("feed relay task ended")?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Stopped."),
    }
    Ok(())
}
