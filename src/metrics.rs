use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_cycles_total", "Completed feed polling cycles.");
        describe_counter!(
            "feed_items_persisted_total",
            "Feed items written to the store."
        );
        describe_counter!(
            "feed_source_errors_total",
            "Source fetch/decode failures (soft, per source)."
        );
        describe_counter!("feed_store_errors_total", "Failed store flushes.");
        describe_gauge!("feed_last_cycle_ts", "Unix ts of the last finished cycle.");
        describe_counter!("relay_pushes_total", "Records pushed into the server queue.");
        describe_gauge!("relay_queue_size", "Current server queue length.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder. Call once per process.
    pub fn init(queue_capacity: usize) -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;

        ensure_described();
        gauge!("relay_queue_capacity").set(queue_capacity as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router<S: Clone + Send + Sync + 'static>(&self) -> Router<S> {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
