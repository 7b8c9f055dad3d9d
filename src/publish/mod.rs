// src/publish/mod.rs
//! Delivery of fresh feed entries to a chat sink, remembering what was sent.

pub mod cache;
pub mod telegram;

use anyhow::Result;
use std::collections::HashSet;
use std::time::Duration;

use crate::ingest::types::{FeedBatch, RawEntry};
use crate::normalize::{identity_text, sha256_hex};
use cache::PostedCache;

#[async_trait::async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct PublishOptions {
    pub max_per_run: usize,
    pub hashtags: String,
    /// Pause between two sends.
    pub pause: Duration,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            max_per_run: crate::config::publish::DEFAULT_MAX_PER_RUN,
            hashtags: crate::config::publish::DEFAULT_HASHTAGS.to_string(),
            pause: Duration::from_millis(700),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub feed_url: String,
    pub id: String,
    pub entry: RawEntry,
}

/// Full SHA-256 hex over the same id → link → title precedence the digest uses.
pub fn entry_id(entry: &RawEntry) -> String {
    sha256_hex(identity_text(entry))
}

/// Entries not yet posted, oldest first per feed (undated first), and only the
/// newest `max_per_run` of the combined queue.
pub fn select_fresh(batches: &[FeedBatch], cache: &PostedCache, max_per_run: usize) -> Vec<Delivery> {
    let mut queued: Vec<Delivery> = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for batch in batches {
        let mut fresh: Vec<Delivery> = batch
            .entries
            .iter()
            .filter_map(|e| {
                let id = entry_id(e);
                if cache.contains(&batch.url, &id) || !seen.insert((batch.url.clone(), id.clone())) {
                    return None;
                }
                Some(Delivery {
                    feed_url: batch.url.clone(),
                    id,
                    entry: e.clone(),
                })
            })
            .collect();
        fresh.sort_by_key(|d| d.entry.published_parsed.or(d.entry.updated_parsed));
        queued.extend(fresh);
    }

    let skip = queued.len().saturating_sub(max_per_run);
    queued.split_off(skip)
}

pub fn format_message(entry: &RawEntry, hashtags: &str) -> String {
    let title = entry.title.as_deref().unwrap_or_default().trim();
    let link = entry.link.as_deref().unwrap_or_default().trim();
    let when = entry
        .published
        .as_deref()
        .or(entry.updated.as_deref())
        .unwrap_or_default()
        .trim();

    let mut parts: Vec<String> = Vec::with_capacity(4);
    if !title.is_empty() {
        parts.push(format!("📰 {title}"));
    }
    if !link.is_empty() {
        parts.push(format!("🌍 {link}"));
    }
    if !when.is_empty() {
        parts.push(format!("🕒 {when}"));
    }
    if !hashtags.trim().is_empty() {
        parts.push(hashtags.trim().to_string());
    }
    parts.join("\n")
}

/// Send the selected entries in order. Only successful sends are recorded.
/// Returns the number delivered.
pub async fn publish_once(
    batches: &[FeedBatch],
    cache: &mut PostedCache,
    sink: &dyn MessageSink,
    opts: &PublishOptions,
) -> usize {
    let deliveries = select_fresh(batches, cache, opts.max_per_run);
    tracing::info!(target: "publish", queued = deliveries.len(), "publishing");

    let mut delivered = 0usize;
    for (i, d) in deliveries.iter().enumerate() {
        if i > 0 && !opts.pause.is_zero() {
            tokio::time::sleep(opts.pause).await;
        }
        let msg = format_message(&d.entry, &opts.hashtags);
        match sink.send(&msg).await {
            Ok(()) => {
                cache.record(&d.feed_url, &d.id);
                delivered += 1;
            }
            Err(e) => {
                tracing::warn!(target: "publish", error = ?e, feed = %d.feed_url, "send failed");
            }
        }
    }
    delivered
}
