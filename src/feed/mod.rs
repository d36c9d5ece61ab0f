// src/feed/mod.rs
//! Incremental relay of embed messages from feed channels into a JSON store.
pub mod cursor;
pub mod discord;
pub mod poller;
pub mod scheduler;
pub mod stats;
pub mod store;
pub mod types;

pub use cursor::FeedCursor;
pub use poller::{CycleReport, Poller, SourceOutcome};
pub use scheduler::{run_cycle, spawn_poller, Backoff, PollSchedule};
pub use stats::{FeedStats, FeedStatsHandle, FeedStatus};
pub use store::{ItemSink, JsonFileStore};
pub use types::{EmbedStyle, FeedError, FeedItem, FeedSource, FeedTransport, PageRequest};
