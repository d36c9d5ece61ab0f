// tests/feed_relay.rs
//
// Polling cycles against an in-memory feed that honors "after" pagination,
// persisted through the real JSON store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::json;

use server_relay::feed::{
    run_cycle, FeedError, FeedItem, FeedSource, FeedStatsHandle, FeedTransport,
    JsonFileStore, PageRequest, Poller,
};

/// Channel id -> messages, oldest first. Serves newest-first pages like Discord.
struct MemoryFeed {
    channels: Mutex<HashMap<String, Vec<u64>>>,
    broken: Vec<String>,
}

impl MemoryFeed {
    fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            broken: Vec::new(),
        }
    }

    fn post(&self, channel: &str, ids: impl IntoIterator<Item = u64>) {
        self.channels
            .lock()
            .unwrap()
            .entry(channel.to_string())
            .or_default()
            .extend(ids);
    }
}

fn message(id: u64) -> FeedItem {
    // odd ids carry an embed, even ids are plain chat
    if id % 2 == 1 {
        FeedItem(json!({ "id": id.to_string(), "embeds": [{ "title": "raw", "color": 1 }] }))
    } else {
        FeedItem(json!({ "id": id.to_string(), "content": "hello" }))
    }
}

#[async_trait::async_trait]
impl FeedTransport for MemoryFeed {
    async fn fetch_page(
        &self,
        source: &FeedSource,
        page: &PageRequest,
    ) -> Result<Vec<FeedItem>, FeedError> {
        if self.broken.contains(&source.channel_id) {
            return Err(FeedError::Status(503));
        }
        let after: u64 = page
            .after
            .as_deref()
            .map(|a| a.parse().unwrap())
            .unwrap_or(0);
        let chans = self.channels.lock().unwrap();
        let ids = chans.get(&source.channel_id).cloned().unwrap_or_default();
        Ok(ids
            .into_iter()
            .filter(|id| *id > after)
            .rev()
            .take(page.limit as usize)
            .map(message)
            .collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

fn src(id: &str, chan: &str) -> FeedSource {
    FeedSource {
        source_id: id.into(),
        channel_id: chan.into(),
    }
}

fn ids(items: &[FeedItem]) -> Vec<u64> {
    items
        .iter()
        .map(|i| i.id().unwrap().parse().unwrap())
        .collect()
}

/// Lets the test keep posting to a feed the poller already owns.
#[derive(Clone)]
struct SharedFeed(Arc<MemoryFeed>);

#[async_trait::async_trait]
impl FeedTransport for SharedFeed {
    async fn fetch_page(
        &self,
        source: &FeedSource,
        page: &PageRequest,
    ) -> Result<Vec<FeedItem>, FeedError> {
        self.0.fetch_page(source, page).await
    }

    fn name(&self) -> &'static str {
        "shared-memory"
    }
}

#[tokio::test]
async fn cursor_moves_from_10_to_15_without_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("data.json"));
    let stats = FeedStatsHandle::new();

    let feed = SharedFeed(Arc::new(MemoryFeed::new()));
    feed.0.post("c1", 1..=10);
    let mut poller = Poller::new(feed.clone(), vec![src("1m-10m", "c1")]);

    let r1 = run_cycle(&mut poller, &store, &stats).await;
    assert_eq!(ids(&r1.batch), vec![9, 7, 5, 3, 1]);
    assert_eq!(
        poller.cursor("1m-10m").unwrap().last_seen_id.as_deref(),
        Some("10")
    );

    // nothing new: no re-delivery
    let idle = run_cycle(&mut poller, &store, &stats).await;
    assert!(idle.batch.is_empty());
    assert_eq!(idle.fetched(), 0);

    feed.0.post("c1", 11..=15);
    let r2 = run_cycle(&mut poller, &store, &stats).await;
    assert_eq!(ids(&r2.batch), vec![15, 13, 11]);
    assert_eq!(r2.fetched(), 5);
    assert_eq!(
        poller.cursor("1m-10m").unwrap().last_seen_id.as_deref(),
        Some("15")
    );

    let persisted = store.load();
    let all = ids(&persisted);
    assert_eq!(all, vec![15, 13, 11, 9, 7, 5, 3, 1]);
    let mut dedup = all.clone();
    dedup.sort_unstable();
    dedup.dedup();
    assert_eq!(dedup.len(), all.len());
    assert!(persisted.iter().all(|i| {
        i.0["embeds"][0]["title"] == "NeonHub | Notifier" && i.0["embeds"][0]["color"] == 0xef00ff
    }));

    let s = stats.snapshot();
    assert_eq!(s.cycles, 3);
    assert_eq!(s.servers_processed, 15);
    assert_eq!(s.servers_sent, 8);
    assert_eq!(s.servers_filtered, 7);
    assert_eq!(s.last_server.as_deref(), Some("15"));
}

#[tokio::test]
async fn cursor_advances_past_filtered_only_pages() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("data.json"));
    let stats = FeedStatsHandle::new();

    let feed = SharedFeed(Arc::new(MemoryFeed::new()));
    feed.0.post("c", [2, 4, 6]);
    let mut poller = Poller::new(feed.clone(), vec![src("s", "c")]);

    let r = run_cycle(&mut poller, &store, &stats).await;
    assert!(r.batch.is_empty());
    assert_eq!(poller.cursor("s").unwrap().last_seen_id.as_deref(), Some("6"));
    // empty batch means no file was written
    assert!(!store.path().exists());
}

#[tokio::test]
async fn failing_source_does_not_block_others() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("data.json"));
    let stats = FeedStatsHandle::new();

    let mut feed = MemoryFeed::new();
    feed.post("good", [1, 3]);
    feed.post("bad", [5, 7]);
    feed.broken.push("bad".into());
    let mut poller = Poller::new(feed, vec![src("bad", "bad"), src("good", "good")]);

    let r = run_cycle(&mut poller, &store, &stats).await;
    assert_eq!(r.failed(), 1);
    assert!(!r.all_failed());
    assert_eq!(ids(&r.batch), vec![3, 1]);
    assert_eq!(poller.cursor("bad").unwrap().last_seen_id, None);
    assert_eq!(poller.cursor("good").unwrap().last_seen_id.as_deref(), Some("3"));
    assert_eq!(ids(&store.load()), vec![3, 1]);

    let s = stats.snapshot();
    assert_eq!(s.servers_sent, 2);
    assert!(s.bot_connected);
    assert_eq!(s.last_server.as_deref(), Some("3"));
}

#[tokio::test]
async fn batch_keeps_per_source_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("data.json"));
    let stats = FeedStatsHandle::new();

    let feed = MemoryFeed::new();
    feed.post("a", [1, 3, 5]);
    feed.post("b", [101, 103]);
    let mut poller = Poller::new(feed, vec![src("a", "a"), src("b", "b")]).with_page_limit(2);

    let r = run_cycle(&mut poller, &store, &stats).await;
    assert_eq!(ids(&r.batch), vec![5, 3, 103, 101]);
    assert_eq!(r.sources[0].kept, 2);
    assert_eq!(r.sources[1].kept, 2);
}
