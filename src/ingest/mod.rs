// src/ingest/mod.rs
pub mod config;
pub mod providers;
pub mod types;

use crate::ingest::config::FeedsConfig;
use crate::ingest::providers::rss::{build_http_client, RssFeedSource};
use crate::ingest::types::{FeedBatch, FeedSource};
use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up once a recorder exists).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_events_total", "Total entries parsed from feeds.");
        describe_counter!(
            "ingest_provider_errors_total",
            "Feed fetch/parse errors."
        );
        describe_histogram!("ingest_parse_ms", "Feed parse time in milliseconds.");
        describe_counter!(
            "digest_noise_dropped_total",
            "Entries dropped as banners or hub pages."
        );
        describe_counter!(
            "digest_window_dropped_total",
            "Entries older than the lookback window."
        );
        describe_counter!("digest_dedup_total", "Entries collapsed by keep-latest dedup.");
        describe_counter!("digest_capped_total", "Entries cut by the global item cap.");
        describe_gauge!("digest_last_run_ts", "Unix ts when the digest last ran.");
    });
}

/// One HTTP source per configured URL, sharing a client.
pub fn sources_from_config(cfg: &FeedsConfig) -> Result<Vec<Box<dyn FeedSource>>> {
    let client = build_http_client()?;
    Ok(cfg
        .urls()
        .map(|(_, url)| Box::new(RssFeedSource::with_client(url, client.clone())) as Box<dyn FeedSource>)
        .collect())
}

/// Fetch every source in order. A failing source is logged, counted and
/// contributes nothing; it never aborts the run.
pub async fn collect_feeds(sources: &[Box<dyn FeedSource>]) -> Vec<FeedBatch> {
    ensure_metrics_described();

    let mut out = Vec::with_capacity(sources.len());
    for s in sources {
        match s.fetch().await {
            Ok(batch) => {
                tracing::debug!(
                    target: "ingest",
                    feed = s.name(),
                    entries = batch.entries.len(),
                    "feed fetched"
                );
                out.push(batch);
            }
            Err(e) => {
                tracing::warn!(target: "ingest", error = ?e, feed = s.name(), "feed error");
                counter!("ingest_provider_errors_total").increment(1);
            }
        }
    }
    out
}
