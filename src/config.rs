// src/config.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::feed::{
    discord::DEFAULT_API_BASE, poller::DEFAULT_PAGE_LIMIT, EmbedStyle, FeedSource, PollSchedule,
};

pub const DEFAULT_CONFIG_PATH: &str = "config/relay.toml";
pub const ENV_CONFIG_PATH: &str = "RELAY_CONFIG_PATH";

pub const DEFAULT_QUEUE_CAPACITY: usize = 200;
pub const DEFAULT_PING_LOG_CAPACITY: usize = 50;

fn default_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}
fn default_ping_log_capacity() -> usize {
    DEFAULT_PING_LOG_CAPACITY
}
fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}
fn default_page_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}
fn default_backoff_base_ms() -> u64 {
    500
}
fn default_max_backoff_ms() -> u64 {
    30_000
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_data_file() -> PathBuf {
    PathBuf::from("data.json")
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub metrics_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_ping_log_capacity")]
    pub ping_log_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_QUEUE_CAPACITY,
            ping_log_capacity: DEFAULT_PING_LOG_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    /// 0 = start the next cycle right away.
    #[serde(default)]
    pub interval_ms: u64,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    #[serde(default)]
    pub restyle: EmbedStyle,
    #[serde(default)]
    pub sources: Vec<FeedSource>,
    /// Only ever taken from DISCORD_TOKEN.
    #[serde(skip)]
    pub token: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            page_limit: DEFAULT_PAGE_LIMIT,
            interval_ms: 0,
            backoff_base_ms: default_backoff_base_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            data_file: default_data_file(),
            restyle: EmbedStyle::default(),
            sources: Vec::new(),
            token: None,
        }
    }
}

impl FeedConfig {
    pub fn schedule(&self) -> PollSchedule {
        PollSchedule {
            interval: Duration::from_millis(self.interval_ms),
            backoff_base: Duration::from_millis(self.backoff_base_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        }
    }

    /// The relay runs only with a token and at least one source.
    pub fn is_runnable(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.trim().is_empty()) && !self.sources.is_empty()
    }
}

impl RelayConfig {
    /// Load using env var + fallbacks:
    /// 1) $RELAY_CONFIG_PATH (must exist)
    /// 2) config/relay.toml
    /// 3) built-in defaults
    ///
    /// Env overrides are applied on top in every case.
    pub fn load() -> Result<Self> {
        let mut cfg = match env::var(ENV_CONFIG_PATH) {
            Ok(p) => Self::load_from_file(Path::new(&p))?,
            Err(_) => {
                let p = PathBuf::from(DEFAULT_CONFIG_PATH);
                if p.exists() {
                    Self::load_from_file(&p)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_env();
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading relay config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing relay config {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: RelayConfig = toml::from_str(s)?;
        cfg.sanitize();
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        if let Ok(t) = env::var("DISCORD_TOKEN") {
            if !t.trim().is_empty() {
                self.feed.token = Some(t.trim().to_string());
            }
        }
        if let Some(n) = env_parse::<usize>("RELAY_QUEUE_CAPACITY") {
            self.queue.capacity = n;
        }
        if let Some(ms) = env_parse::<u64>("FEED_POLL_INTERVAL_MS") {
            self.feed.interval_ms = ms;
        }
        if let Ok(p) = env::var("FEED_DATA_FILE") {
            if !p.trim().is_empty() {
                self.feed.data_file = PathBuf::from(p.trim());
            }
        }
        if let Ok(v) = env::var("METRICS_ENABLED") {
            self.metrics_enabled = v.trim() == "1" || v.trim().eq_ignore_ascii_case("true");
        }
    }

    fn sanitize(&mut self) {
        if self.queue.capacity == 0 {
            self.queue.capacity = DEFAULT_QUEUE_CAPACITY;
        }
        if self.queue.ping_log_capacity == 0 {
            self.queue.ping_log_capacity = DEFAULT_PING_LOG_CAPACITY;
        }
        // Discord caps a page at 100 messages
        self.feed.page_limit = self.feed.page_limit.clamp(1, 100);
        if self.feed.max_backoff_ms < self.feed.backoff_base_ms {
            std::mem::swap(&mut self.feed.max_backoff_ms, &mut self.feed.backoff_base_ms);
        }
        self.feed
            .sources
            .retain(|s| !s.source_id.trim().is_empty() && !s.channel_id.trim().is_empty());
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse::<T>().ok())
}
