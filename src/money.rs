//! # Money buckets
//!
//! Producers report a server's money as free text ("12.5m", "900k", "$250000")
//! or sometimes as a bare JSON number. This module turns that into a number and
//! groups queue records into three fixed ranges:
//!
//! - `1m-10m`   → `[1_000_000, 10_000_000)`
//! - `10m-100m` → `[10_000_000, 100_000_000)`
//! - `100m+`    → `[100_000_000, ∞)`
//!
//! A value sitting exactly on a boundary lands in the upper bucket. Anything
//! below one million (including unparseable input, which reads as zero) is left
//! out of every bucket.

use serde::Serialize;
use serde_json::Value;

/// Parse a human-written magnitude. Never fails: garbage yields `0.0`.
pub fn parse_money(text: &str) -> f64 {
    let s = text.replace('$', "").trim().to_lowercase();

    let value = if let Some(num) = s.strip_suffix('m') {
        parse_plain(num).map(|v| v * 1_000_000.0)
    } else if let Some(num) = s.strip_suffix('k') {
        parse_plain(num).map(|v| v * 1_000.0)
    } else {
        parse_plain(&s)
    };

    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn parse_plain(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

/// Render a record's money field to text before parsing.
/// Strings pass through, numbers use their JSON text, everything else reads as zero.
pub fn money_text(v: Option<&Value>) -> String {
    match v {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "0".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    OneToTenMillion,
    TenToHundredMillion,
    HundredMillionPlus,
}

impl Bucket {
    pub fn for_value(money: f64) -> Option<Self> {
        if (1_000_000.0..10_000_000.0).contains(&money) {
            Some(Self::OneToTenMillion)
        } else if (10_000_000.0..100_000_000.0).contains(&money) {
            Some(Self::TenToHundredMillion)
        } else if money >= 100_000_000.0 {
            Some(Self::HundredMillionPlus)
        } else {
            None
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::OneToTenMillion => "1m-10m",
            Self::TenToHundredMillion => "10m-100m",
            Self::HundredMillionPlus => "100m+",
        }
    }
}

/// Records grouped by money range; serialized with the bucket labels as keys.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Categories<T> {
    #[serde(rename = "1m-10m")]
    pub one_to_ten_m: Vec<T>,
    #[serde(rename = "10m-100m")]
    pub ten_to_hundred_m: Vec<T>,
    #[serde(rename = "100m+")]
    pub hundred_m_plus: Vec<T>,
}

impl<T> Default for Categories<T> {
    fn default() -> Self {
        Self {
            one_to_ten_m: Vec::new(),
            ten_to_hundred_m: Vec::new(),
            hundred_m_plus: Vec::new(),
        }
    }
}

/// Bucket `items` by the money text `money_of` extracts. Input order is kept
/// within each bucket.
pub fn categorize<T, F>(items: Vec<T>, money_of: F) -> Categories<T>
where
    F: Fn(&T) -> String,
{
    let mut out = Categories::default();
    for it in items {
        match Bucket::for_value(parse_money(&money_of(&it))) {
            Some(Bucket::OneToTenMillion) => out.one_to_ten_m.push(it),
            Some(Bucket::TenToHundredMillion) => out.ten_to_hundred_m.push(it),
            Some(Bucket::HundredMillionPlus) => out.hundred_m_plus.push(it),
            None => {}
        }
    }
    out
}
