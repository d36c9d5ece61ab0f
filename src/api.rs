use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics::{counter, gauge};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, services::ServeFile};

use crate::config::QueueConfig;
use crate::feed::{FeedStats, FeedStatsHandle};
use crate::metrics::Metrics;
use crate::money::{self, Categories};
use crate::queue::BoundedQueue;
use crate::record::{now_iso, PingEntry, PushRequest, ServerRecord};

pub const INDEX_PATH: &str = "static/index.html";

#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<BoundedQueue<ServerRecord>>,
    pub pings: Arc<BoundedQueue<PingEntry>>,
    pub feed_stats: FeedStatsHandle,
}

impl AppState {
    pub fn new(cfg: &QueueConfig, feed_stats: FeedStatsHandle) -> Self {
        Self {
            queue: Arc::new(BoundedQueue::with_capacity(cfg.capacity)),
            pings: Arc::new(BoundedQueue::with_capacity(cfg.ping_log_capacity)),
            feed_stats,
        }
    }
}

/// Build the router without a metrics endpoint.
pub fn router(state: AppState) -> Router {
    create_router(state, None)
}

pub fn create_router(state: AppState, metrics: Option<&Metrics>) -> Router {
    let mut app = Router::new()
        .route_service("/", ServeFile::new(INDEX_PATH))
        .route("/health", get(|| async { "ok" }))
        .route("/api/status", get(status))
        .route("/api/server/push", post(push_server))
        .route("/api/server/pull", get(pull_server))
        .route("/api/server/all", get(all_servers))
        .route("/api/server/categories", get(server_categories))
        .route("/api/ping", post(ping))
        .route("/api/logs", get(ping_logs))
        .route("/api/discord/stats", get(feed_stats));

    if let Some(m) = metrics {
        app = app.merge(m.router());
    }

    app.layer(CorsLayer::very_permissive()).with_state(state)
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No data provided")]
    NoData,
    #[error("Invalid server data: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::debug!(target: "api", error = %self, "rejected request");
        (StatusCode::BAD_REQUEST, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Serialize)]
struct StatusOut {
    status: &'static str,
    queue_size: usize,
    timestamp: String,
}

async fn status(State(state): State<AppState>) -> Json<StatusOut> {
    Json(StatusOut {
        status: "online",
        queue_size: state.queue.len(),
        timestamp: now_iso(),
    })
}

#[derive(Serialize)]
struct PushOut {
    success: bool,
    message: &'static str,
    queue_size: usize,
}

/// Parse a push body. Empty bodies and empty objects count as "no data";
/// any other JSON object is accepted as-is.
fn parse_push(body: &[u8]) -> Result<PushRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::NoData);
    }
    let value: Value =
        serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    match &value {
        Value::Object(m) if !m.is_empty() => {}
        Value::Object(_) | Value::Null => return Err(ApiError::NoData),
        _ => return Err(ApiError::BadRequest("expected a JSON object".into())),
    }
    serde_json::from_value(value).map_err(|e| ApiError::BadRequest(e.to_string()))
}

async fn push_server(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PushOut>, ApiError> {
    let req = parse_push(&body)?;
    let size = state.queue.push(req.into_record(now_iso()));

    counter!("relay_pushes_total").increment(1);
    gauge!("relay_queue_size").set(size as f64);
    tracing::debug!(target: "api", queue_size = size, "server pushed");

    Ok(Json(PushOut {
        success: true,
        message: "Server added to queue",
        queue_size: size,
    }))
}

#[derive(Serialize)]
struct PullOut {
    status: &'static str,
    data: Option<ServerRecord>,
    queue_size: usize,
}

async fn pull_server(State(state): State<AppState>) -> Json<PullOut> {
    let (data, left) = state.queue.pop_front_with_len();
    gauge!("relay_queue_size").set(left as f64);
    Json(PullOut {
        status: "success",
        data,
        queue_size: left,
    })
}

#[derive(Serialize)]
struct AllOut {
    status: &'static str,
    data: Vec<ServerRecord>,
    queue_size: usize,
}

async fn all_servers(State(state): State<AppState>) -> Json<AllOut> {
    let data = state.queue.snapshot();
    Json(AllOut {
        status: "success",
        queue_size: data.len(),
        data,
    })
}

#[derive(Serialize)]
struct CategoriesOut {
    success: bool,
    categories: Categories<ServerRecord>,
    timestamp: String,
}

async fn server_categories(State(state): State<AppState>) -> Json<CategoriesOut> {
    let categories = money::categorize(state.queue.snapshot(), |r| {
        money::money_text(r.money.as_ref())
    });
    Json(CategoriesOut {
        success: true,
        categories,
        timestamp: now_iso(),
    })
}

#[derive(Serialize)]
struct PingOut {
    success: bool,
    timestamp: String,
}

async fn ping(State(state): State<AppState>, body: Bytes) -> Json<PingOut> {
    // body is optional; anything unparseable pings as "unknown"
    let source = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|v| v.get("source").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or_else(|| "unknown".to_string());
    let entry = PingEntry {
        source,
        timestamp: now_iso(),
    };
    let timestamp = entry.timestamp.clone();
    state.pings.push(entry);
    Json(PingOut {
        success: true,
        timestamp,
    })
}

#[derive(Serialize)]
struct LogsOut {
    logs: Vec<PingEntry>,
    count: usize,
}

async fn ping_logs(State(state): State<AppState>) -> Json<LogsOut> {
    let logs = state.pings.snapshot();
    Json(LogsOut {
        count: logs.len(),
        logs,
    })
}

#[derive(Serialize)]
struct StatsBody {
    #[serde(flatten)]
    feed: FeedStats,
    /// Distinct non-null job ids currently queued.
    unique_servers: usize,
}

#[derive(Serialize)]
struct StatsOut {
    success: bool,
    stats: StatsBody,
}

async fn feed_stats(State(state): State<AppState>) -> Json<StatsOut> {
    let queued = state.queue.snapshot();
    let unique_servers = queued
        .iter()
        .filter_map(ServerRecord::job_key)
        .collect::<HashSet<_>>()
        .len();
    Json(StatsOut {
        success: true,
        stats: StatsBody {
            feed: state.feed_stats.snapshot(),
            unique_servers,
        },
    })
}
