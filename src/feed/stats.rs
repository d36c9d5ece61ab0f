// src/feed/stats.rs
//! Running totals for the feed relay, fed only from cycle reports.

use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::feed::poller::CycleReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeedStatus {
    #[serde(rename = "Not Available")]
    Disabled,
    #[serde(rename = "Starting")]
    Starting,
    #[serde(rename = "Running")]
    Running,
    #[serde(rename = "Degraded")]
    Degraded,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeedStats {
    pub cycles: u64,
    /// Items returned by the feed, before filtering.
    pub servers_processed: u64,
    /// Items written to the store.
    pub servers_sent: u64,
    /// Items dropped by the embed filter or the page cap.
    pub servers_filtered: u64,
    /// Id of the newest item written so far.
    pub last_server: Option<String>,
    pub bot_connected: bool,
    pub bot_status: FeedStatus,
    pub last_cycle_at: Option<String>,
}

impl Default for FeedStats {
    fn default() -> Self {
        Self {
            cycles: 0,
            servers_processed: 0,
            servers_sent: 0,
            servers_filtered: 0,
            last_server: None,
            bot_connected: false,
            bot_status: FeedStatus::Disabled,
            last_cycle_at: None,
        }
    }
}

/// Shared handle: written by the poll loop, read by the API.
#[derive(Debug, Clone, Default)]
pub struct FeedStatsHandle {
    inner: Arc<RwLock<FeedStats>>,
}

impl FeedStatsHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_starting(&self) {
        if let Ok(mut s) = self.inner.write() {
            s.bot_status = FeedStatus::Starting;
        }
    }

    /// Fold one finished cycle in. `persisted` is how many batch items the store accepted.
    pub fn record_cycle(&self, report: &CycleReport, persisted: usize, at: String) {
        let Ok(mut s) = self.inner.write() else {
            return;
        };
        let fetched = report.fetched() as u64;
        let kept = report.batch.len() as u64;

        s.cycles += 1;
        s.servers_processed += fetched;
        s.servers_sent += persisted as u64;
        s.servers_filtered += fetched.saturating_sub(kept);
        if persisted > 0 {
            if let Some(id) = report.batch.first().and_then(|i| i.id()) {
                s.last_server = Some(id.to_string());
            }
        }
        s.bot_connected = !report.all_failed();
        s.bot_status = if report.failed() == 0 {
            FeedStatus::Running
        } else {
            FeedStatus::Degraded
        };
        s.last_cycle_at = Some(at);
    }

    pub fn snapshot(&self) -> FeedStats {
        self.inner.read().map(|s| s.clone()).unwrap_or_default()
    }
}
