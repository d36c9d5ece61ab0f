// src/feed/store.rs
//! Newest-first JSON document of every relayed item.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};

use crate::feed::types::FeedItem;

#[async_trait]
pub trait ItemSink: Send + Sync {
    /// Persist `items` ahead of everything stored before. Returns how many were written.
    async fn flush(&self, items: Vec<FeedItem>) -> Result<usize>;
}

/// Single JSON array on disk, rewritten in full on every flush.
/// Only one writer per file: the poll loop owns it.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current content. A missing or unparseable file reads as empty.
    pub fn load(&self) -> Vec<FeedItem> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(
                    target: "store",
                    error = %e,
                    path = %self.path.display(),
                    "store unreadable, starting over"
                );
                Vec::new()
            }
        }
    }

    fn write_atomic(&self, items: &[FeedItem]) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating store dir {}", dir.display()))?;
        }
        let body = serde_json::to_string_pretty(items).context("serializing store")?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, body).with_context(|| format!("writing {}", tmp.display()))?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e).with_context(|| format!("replacing {}", self.path.display()));
        }
        Ok(())
    }

    /// Blocking prepend of `items`. An empty batch touches nothing on disk.
    pub fn prepend(&self, items: &[FeedItem]) -> Result<usize> {
        if items.is_empty() {
            return Ok(0);
        }
        let existing = self.load();
        let mut all = Vec::with_capacity(items.len() + existing.len());
        all.extend_from_slice(items);
        all.extend(existing);
        self.write_atomic(&all)?;
        Ok(items.len())
    }
}

#[async_trait]
impl ItemSink for JsonFileStore {
    async fn flush(&self, items: Vec<FeedItem>) -> Result<usize> {
        if items.is_empty() {
            return Ok(0);
        }
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.prepend(&items))
            .await
            .context("store task failed")?
    }
}
