// src/pipeline.rs
//! One run of the core: feed batches in, `Digest` out.
//!
//! normalize → noise filter → classify → lookback window → sort → dedup →
//! cap → bucket/rank → assemble. Synchronous and deterministic for a given
//! input order and clock.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use metrics::{counter, gauge};

use crate::classify::enrich;
use crate::clock::RunClock;
use crate::config::digest::{clamp_lookback, DigestSettings};
use crate::dedup::dedup_keep_latest;
use crate::digest::{assemble, bucket_by_day, sort_and_cap, sort_newest_first, Digest, DigestItem};
use crate::ingest::types::FeedBatch;
use crate::noise::NoiseFilter;
use crate::normalize::normalize_entry;

#[derive(Debug, Clone)]
pub struct PipelineParams {
    pub lookback_days: i64,
    pub max_items: usize,
    pub timezone: Tz,
    pub noise: NoiseFilter,
}

impl PipelineParams {
    pub fn from_settings(s: &DigestSettings, noise: NoiseFilter) -> Self {
        Self {
            lookback_days: s.lookback_days,
            max_items: s.max_items,
            timezone: s.timezone,
            noise,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub collected: usize,
    pub noise_dropped: usize,
    pub window_dropped: usize,
    pub deduped: usize,
    pub capped: usize,
    pub written: usize,
    pub days: usize,
}

/// Oldest timestamp still inside the window.
pub fn cutoff(clock: &RunClock, lookback_days: i64) -> DateTime<Utc> {
    Duration::try_days(clamp_lookback(lookback_days))
        .and_then(|d| clock.now().checked_sub_signed(d))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub fn build_digest(
    batches: &[FeedBatch],
    params: &PipelineParams,
    clock: &RunClock,
) -> (Digest, RunStats) {
    let mut stats = RunStats::default();
    let cutoff = cutoff(clock, params.lookback_days);

    let mut items: Vec<DigestItem> = Vec::new();
    for batch in batches {
        for entry in &batch.entries {
            stats.collected += 1;
            let (item, ts) = normalize_entry(entry, &batch.title, params.timezone, clock);
            if !params.noise.keeps(&item) {
                stats.noise_dropped += 1;
                continue;
            }
            let classified = enrich(item, &batch.title);
            if ts < cutoff {
                stats.window_dropped += 1;
                continue;
            }
            items.push(classified);
        }
    }

    sort_newest_first(&mut items);
    let (items, deduped) = dedup_keep_latest(items);
    stats.deduped = deduped;
    let (items, capped) = sort_and_cap(items, params.max_items);
    stats.capped = capped;
    stats.written = items.len();

    let digest = assemble(bucket_by_day(items), params.timezone, clock);
    stats.days = digest.days.len();

    counter!("digest_noise_dropped_total").increment(stats.noise_dropped as u64);
    counter!("digest_window_dropped_total").increment(stats.window_dropped as u64);
    counter!("digest_dedup_total").increment(stats.deduped as u64);
    counter!("digest_capped_total").increment(stats.capped as u64);
    gauge!("digest_last_run_ts").set(clock.now().timestamp() as f64);

    tracing::info!(
        target: "digest",
        collected = stats.collected,
        noise = stats.noise_dropped,
        window = stats.window_dropped,
        dedup = stats.deduped,
        capped = stats.capped,
        kept = stats.written,
        days = stats.days,
        "digest built"
    );

    (digest, stats)
}
