// src/feed/poller.rs
//! One polling cycle over every configured source.
//!
//! For each source: fetch the page after the cursor, move the cursor to the
//! newest raw item (before filtering, so filtered-out messages are not fetched
//! again), keep only items with embeds, restyle them, and add them to the batch.
//! A failing source contributes nothing and leaves its cursor alone.

use std::collections::HashMap;
use std::time::Duration;

use metrics::counter;

use crate::feed::cursor::FeedCursor;
use crate::feed::types::{EmbedStyle, FeedItem, FeedSource, FeedTransport, PageRequest};

pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// What a single source produced in one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceOutcome {
    pub source_id: String,
    /// Items the feed returned (before filtering).
    pub fetched: usize,
    /// Items that made it into the batch.
    pub kept: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub batch: Vec<FeedItem>,
    pub sources: Vec<SourceOutcome>,
    /// Longest throttle delay any source asked for.
    pub retry_after: Option<Duration>,
}

impl CycleReport {
    pub fn fetched(&self) -> usize {
        self.sources.iter().map(|s| s.fetched).sum()
    }

    pub fn failed(&self) -> usize {
        self.sources.iter().filter(|s| s.error.is_some()).count()
    }

    /// True when there was at least one source and every one of them failed.
    pub fn all_failed(&self) -> bool {
        !self.sources.is_empty() && self.failed() == self.sources.len()
    }
}

pub struct Poller<T: FeedTransport> {
    transport: T,
    sources: Vec<FeedSource>,
    cursors: HashMap<String, FeedCursor>,
    page_limit: u32,
    style: EmbedStyle,
}

impl<T: FeedTransport> Poller<T> {
    pub fn new(transport: T, sources: Vec<FeedSource>) -> Self {
        let cursors = sources
            .iter()
            .map(|s| (s.source_id.clone(), FeedCursor::new(s.source_id.clone())))
            .collect();
        Self {
            transport,
            sources,
            cursors,
            page_limit: DEFAULT_PAGE_LIMIT,
            style: EmbedStyle::default(),
        }
    }

    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit.max(1);
        self
    }

    pub fn with_style(mut self, style: EmbedStyle) -> Self {
        self.style = style;
        self
    }

    pub fn cursor(&self, source_id: &str) -> Option<&FeedCursor> {
        self.cursors.get(source_id)
    }

    pub fn sources(&self) -> &[FeedSource] {
        &self.sources
    }

    pub async fn poll_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();

        for source in &self.sources {
            let cursor = self
                .cursors
                .entry(source.source_id.clone())
                .or_insert_with(|| FeedCursor::new(source.source_id.clone()));

            let page = PageRequest {
                limit: self.page_limit,
                after: cursor.last_seen_id.clone(),
            };

            let raw = match self.transport.fetch_page(source, &page).await {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!(
                        target: "feed",
                        error = %e,
                        source = %source.source_id,
                        transport = self.transport.name(),
                        "source fetch failed"
                    );
                    counter!("feed_source_errors_total").increment(1);
                    if let Some(ra) = e.retry_after() {
                        report.retry_after = Some(report.retry_after.map_or(ra, |cur| cur.max(ra)));
                    }
                    report.sources.push(SourceOutcome {
                        source_id: source.source_id.clone(),
                        fetched: 0,
                        kept: 0,
                        error: Some(e.to_string()),
                    });
                    continue;
                }
            };

            if let Some(first) = raw.first() {
                match first.id() {
                    Some(id) => {
                        if !cursor.advance(id) {
                            tracing::warn!(
                                target: "feed",
                                source = %source.source_id,
                                id,
                                "feed returned an id older than the cursor"
                            );
                        }
                    }
                    None => tracing::warn!(
                        target: "feed",
                        source = %source.source_id,
                        "newest item has no id; cursor unchanged"
                    ),
                }
            }

            let fetched = raw.len();
            let kept: Vec<FeedItem> = raw
                .into_iter()
                .filter(FeedItem::has_embeds)
                .take(self.page_limit as usize)
                .map(|mut it| {
                    it.restyle(&self.style);
                    it
                })
                .collect();

            report.sources.push(SourceOutcome {
                source_id: source.source_id.clone(),
                fetched,
                kept: kept.len(),
                error: None,
            });
            report.batch.extend(kept);
        }

        report
    }
}
