// src/feed/scheduler.rs
use std::time::Duration;

use metrics::{counter, gauge};
use tokio::task::JoinHandle;

use crate::feed::poller::{CycleReport, Poller};
use crate::feed::stats::FeedStatsHandle;
use crate::feed::store::ItemSink;
use crate::feed::types::FeedTransport;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollSchedule {
    /// Pause between healthy cycles (may be zero).
    pub interval: Duration,
    /// First delay after a cycle in which every source failed; doubles per repeat.
    pub backoff_base: Duration,
    pub max_backoff: Duration,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            interval: Duration::ZERO,
            backoff_base: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
        }
    }
}

/// Tracks consecutive failed cycles and picks the next delay.
#[derive(Debug)]
pub struct Backoff {
    schedule: PollSchedule,
    failures: u32,
}

impl Backoff {
    pub fn new(schedule: PollSchedule) -> Self {
        Self {
            schedule,
            failures: 0,
        }
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Delay before the next cycle given how the last one went.
    pub fn next_delay(&mut self, report: &CycleReport) -> Duration {
        let base = if report.all_failed() {
            self.failures = self.failures.saturating_add(1);
            let shift = (self.failures - 1).min(16);
            let d = self.schedule.backoff_base.saturating_mul(1u32 << shift);
            d.min(self.schedule.max_backoff).max(self.schedule.interval)
        } else {
            self.failures = 0;
            self.schedule.interval
        };
        match report.retry_after {
            Some(ra) => base.max(ra),
            None => base,
        }
    }
}

/// Poll every source once, persist the batch, update stats.
/// Never fails: source and store errors are logged and counted.
pub async fn run_cycle<T, S>(
    poller: &mut Poller<T>,
    sink: &S,
    stats: &FeedStatsHandle,
) -> CycleReport
where
    T: FeedTransport,
    S: ItemSink + ?Sized,
{
    crate::metrics::ensure_described();

    let report = poller.poll_cycle().await;

    let persisted = if report.batch.is_empty() {
        0
    } else {
        match sink.flush(report.batch.clone()).await {
            Ok(n) => n,
            Err(e) => {
                tracing::error!(target: "store", error = ?e, items = report.batch.len(), "flush failed");
                counter!("feed_store_errors_total").increment(1);
                0
            }
        }
    };

    let now = chrono::Utc::now();
    stats.record_cycle(&report, persisted, now.to_rfc3339());
    counter!("feed_cycles_total").increment(1);
    counter!("feed_items_persisted_total").increment(persisted as u64);
    gauge!("feed_last_cycle_ts").set(now.timestamp() as f64);

    if persisted > 0 {
        tracing::info!(target: "feed", new = persisted, "relayed new embed items");
        for s in report.sources.iter().filter(|s| s.kept > 0) {
            tracing::info!(target: "feed", source = %s.source_id, count = s.kept, "from source");
        }
    } else {
        tracing::debug!(target: "feed", failed = report.failed(), "cycle without new items");
    }

    report
}

/// Spawn the background relay loop. Runs until the runtime shuts down.
pub fn spawn_poller<T, S>(
    mut poller: Poller<T>,
    sink: S,
    stats: FeedStatsHandle,
    schedule: PollSchedule,
) -> JoinHandle<()>
where
    T: FeedTransport + 'static,
    S: ItemSink + 'static,
{
    stats.mark_starting();
    tokio::spawn(async move {
        tracing::info!(
            target: "feed",
            sources = poller.sources().len(),
            interval_ms = schedule.interval.as_millis() as u64,
            "feed relay started"
        );
        let mut backoff = Backoff::new(schedule);
        loop {
            let report = run_cycle(&mut poller, &sink, &stats).await;
            let delay = backoff.next_delay(&report);
            if backoff.failures() > 0 {
                tracing::warn!(
                    target: "feed",
                    failures = backoff.failures(),
                    delay_ms = delay.as_millis() as u64,
                    "all sources failed, backing off"
                );
            }
            if delay.is_zero() {
                // still hand control back so the API tasks are never starved
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(delay).await;
            }
        }
    })
}
