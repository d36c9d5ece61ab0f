// src/record.rs
//! Records held in the in-memory queues.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::money;

/// A game server announced by a producer, as stored in the queue.
/// Producers are loosely typed, so every field keeps whatever JSON was sent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerRecord {
    pub name: Option<Value>,
    /// Free text ("12.5m") or a bare number; see `money::parse_money`.
    pub money: Option<Value>,
    pub players: Option<Value>, // "5/8" or 5, producer's choice
    pub job_id: Option<Value>,
    pub script: Option<Value>,
    pub join_link: Option<Value>,
    pub is_10m_plus: Value,
    /// Assigned on receipt (RFC 3339, UTC).
    pub timestamp: String,
}

/// Body of `POST /api/server/push`. Every field is optional; unknown ones are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct PushRequest {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub money: Option<Value>,
    #[serde(default)]
    pub players: Option<Value>,
    #[serde(default)]
    pub job_id: Option<Value>,
    #[serde(default)]
    pub script: Option<Value>,
    #[serde(default)]
    pub join_link: Option<Value>,
    #[serde(default = "not_flagged")]
    pub is_10m_plus: Value,
}

fn not_flagged() -> Value {
    Value::Bool(false)
}

impl PushRequest {
    pub fn into_record(self, received_at: String) -> ServerRecord {
        ServerRecord {
            name: self.name,
            money: self.money,
            players: self.players,
            job_id: self.job_id,
            script: self.script,
            join_link: self.join_link,
            is_10m_plus: self.is_10m_plus,
            timestamp: received_at,
        }
    }
}

impl ServerRecord {
    /// Identity used for de-duplicated counts. `None` when absent or null.
    pub fn job_key(&self) -> Option<String> {
        match &self.job_id {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }

    pub fn money_value(&self) -> f64 {
        money::parse_money(&money::money_text(self.money.as_ref()))
    }
}

/// One entry of the ping log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PingEntry {
    pub source: String,
    pub timestamp: String,
}

pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}
