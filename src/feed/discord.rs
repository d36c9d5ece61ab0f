use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;

use crate::feed::types::{FeedError, FeedItem, FeedSource, FeedTransport, PageRequest};

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Longest throttle we will honor from a single 429 reply.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(300);

/// Reads channel messages over the Discord REST API.
#[derive(Clone)]
pub struct DiscordFeed {
    api_base: String,
    token: String,
    client: Client,
    timeout: Duration,
}

impl DiscordFeed {
    pub fn new(token: String) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token,
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs.max(1));
        self
    }

    fn messages_url(&self, channel_id: &str) -> String {
        format!("{}/channels/{}/messages", self.api_base, channel_id)
    }
}

#[derive(Deserialize)]
struct RateLimitBody {
    retry_after: f64,
}

/// Throttle delay from the `Retry-After` header, else from the JSON body.
fn parse_retry_after(header_val: Option<&str>, body: &str) -> Duration {
    let secs = header_val
        .and_then(|h| h.trim().parse::<f64>().ok())
        .or_else(|| {
            serde_json::from_str::<RateLimitBody>(body)
                .ok()
                .map(|b| b.retry_after)
        })
        .filter(|s| s.is_finite() && *s >= 0.0)
        .unwrap_or(1.0);
    Duration::try_from_secs_f64(secs)
        .unwrap_or(MAX_RETRY_AFTER)
        .min(MAX_RETRY_AFTER)
}

#[async_trait]
impl FeedTransport for DiscordFeed {
    async fn fetch_page(
        &self,
        source: &FeedSource,
        page: &PageRequest,
    ) -> Result<Vec<FeedItem>, FeedError> {
        let mut query: Vec<(&str, String)> = vec![("limit", page.limit.to_string())];
        if let Some(after) = &page.after {
            query.push(("after", after.clone()));
        }

        let rsp = self
            .client
            .get(self.messages_url(&source.channel_id))
            .timeout(self.timeout)
            .header(header::AUTHORIZATION, &self.token)
            .header(header::USER_AGENT, "Mozilla/5.0")
            .query(&query)
            .send()
            .await?;

        let status = rsp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let header_val = rsp
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            let body = rsp.text().await.unwrap_or_default();
            return Err(FeedError::RateLimited {
                retry_after: parse_retry_after(header_val.as_deref(), &body),
            });
        }
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let bytes = rsp.bytes().await?;
        serde_json::from_slice::<Vec<FeedItem>>(&bytes).map_err(|e| FeedError::Decode(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "discord"
    }
}
