// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

/// One entry as handed over by a feed transport. Nothing is guaranteed present;
/// `normalize::normalize_entry` resolves every optional field exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RawEntry {
    pub id: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    pub summary: Option<String>,
    /// Filled by the transport when `published` was strict RFC 2822 / RFC 3339.
    pub published_parsed: Option<DateTime<Utc>>,
    pub updated_parsed: Option<DateTime<Utc>>,
    pub published: Option<String>,
    pub updated: Option<String>,
    pub date: Option<String>,
}

/// Everything one feed produced in a single fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedBatch {
    pub url: String,
    /// Display title of the feed, e.g. "Reuters - Business News". May be empty.
    pub title: String,
    pub entries: Vec<RawEntry>,
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> Result<FeedBatch>;
    fn name(&self) -> &str;
}
