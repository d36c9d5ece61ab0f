// src/feed/cursor.rs
//! Per-source watermark: the newest item id seen so far.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedCursor {
    pub source_id: String,
    pub last_seen_id: Option<String>,
}

impl FeedCursor {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            last_seen_id: None,
        }
    }

    /// Move the watermark to `id`. Returns false (and keeps the old value) when
    /// `id` is numerically older than the current one; ids that are not numeric
    /// are trusted as-is.
    pub fn advance(&mut self, id: &str) -> bool {
        if let Some(cur) = self.last_seen_id.as_deref() {
            if let (Ok(old), Ok(new)) = (cur.parse::<u128>(), id.parse::<u128>()) {
                if new < old {
                    return false;
                }
            }
        }
        self.last_seen_id = Some(id.to_string());
        true
    }
}
