// src/publish/cache.rs
//! Ids already delivered, per feed URL, newest last.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::digest::write_file_atomic;

pub const HISTORY_PER_FEED: usize = 200;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostedCache {
    feeds: BTreeMap<String, Vec<String>>,
}

impl PostedCache {
    /// Missing, unreadable or malformed file → empty cache.
    pub fn load(path: &Path) -> Self {
        let Ok(bytes) = fs::read(path) else {
            return Self::default();
        };
        match serde_json::from_slice(&bytes) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(target: "publish", error = %e, path = %path.display(), "posted cache unreadable, starting empty");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serializing posted cache")?;
        write_file_atomic(path, json.as_bytes())
    }

    pub fn contains(&self, feed: &str, id: &str) -> bool {
        self.feeds
            .get(feed)
            .is_some_and(|ids| ids.iter().any(|x| x == id))
    }

    /// Append and evict the oldest beyond `HISTORY_PER_FEED`.
    pub fn record(&mut self, feed: &str, id: &str) {
        let ids = self.feeds.entry(feed.to_string()).or_default();
        ids.push(id.to_string());
        if ids.len() > HISTORY_PER_FEED {
            let excess = ids.len() - HISTORY_PER_FEED;
            ids.drain(0..excess);
        }
    }

    pub fn history(&self, feed: &str) -> &[String] {
        self.feeds.get(feed).map(Vec::as_slice).unwrap_or_default()
    }
}
