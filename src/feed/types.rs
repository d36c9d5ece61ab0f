// src/feed/types.rs
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A raw message from a feed, kept as the JSON object the feed returned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct FeedItem(pub Value);

impl FeedItem {
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    /// True when the item carries at least one embed.
    pub fn has_embeds(&self) -> bool {
        matches!(self.0.get("embeds"), Some(Value::Array(a)) if !a.is_empty())
    }

    /// Overwrite the display fields of every embed.
    pub fn restyle(&mut self, style: &EmbedStyle) {
        if let Some(Value::Array(embeds)) = self.0.get_mut("embeds") {
            for e in embeds.iter_mut() {
                if let Value::Object(map) = e {
                    map.insert("title".into(), Value::String(style.title.clone()));
                    map.insert("color".into(), Value::from(style.color));
                }
            }
        }
    }
}

/// Title/color stamped onto relayed embeds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EmbedStyle {
    pub title: String,
    pub color: u32,
}

impl Default for EmbedStyle {
    fn default() -> Self {
        Self {
            title: "NeonHub | Notifier".to_string(),
            color: 0xef00ff,
        }
    }
}

/// A configured feed channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedSource {
    pub source_id: String, // e.g. "10m-100m"
    pub channel_id: String,
}

/// One page request: at most `limit` items, strictly after `after` when set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub after: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("feed returned HTTP {0}")]
    Status(u16),
    #[error("feed throttled, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },
    #[error("feed response could not be decoded: {0}")]
    Decode(String),
}

impl FeedError {
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

/// Paginated, newest-first read access to a feed.
#[async_trait::async_trait]
pub trait FeedTransport: Send + Sync {
    async fn fetch_page(
        &self,
        source: &FeedSource,
        page: &PageRequest,
    ) -> Result<Vec<FeedItem>, FeedError>;

    fn name(&self) -> &'static str;
}
