// src/digest.rs
//! Bucketer, ranker and assembler: classified items → day buckets → `Digest`.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::classify::{Category, Impact};
use crate::clock::RunClock;
use crate::normalize::NormalizedItem;

pub const ATTENTION_POINTS_MAX: usize = 3;
pub const ATTENTION_POINT_CHARS: usize = 120;

/// A normalized item after classification. This is the only shape that
/// reaches dedup, bucketing and the JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestItem {
    pub id: String,
    /// Local `HH:MM`.
    pub time: String,
    pub category: Category,
    pub title: String,
    pub summary: String,
    pub source: String,
    pub url: String,
    pub tags: Vec<String>,
    pub impact_score: Impact,
    #[serde(skip)]
    pub timestamp: DateTime<Utc>,
    #[serde(skip)]
    pub local_date: NaiveDate,
    #[serde(skip)]
    pub local_time: NaiveTime,
}

impl DigestItem {
    pub fn new(item: NormalizedItem, category: Category, tags: Vec<String>, impact: Impact) -> Self {
        Self {
            time: item.local_time.format("%H:%M").to_string(),
            id: item.id,
            category,
            title: item.title,
            summary: item.summary,
            source: item.source,
            url: item.url,
            tags,
            impact_score: impact,
            timestamp: item.timestamp,
            local_date: item.local_date,
            local_time: item.local_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    /// ISO date in the target zone.
    pub date: String,
    pub attention_points: Vec<String>,
    pub items: Vec<DigestItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Digest {
    pub generated_at: String,
    pub timezone: String,
    pub days: Vec<DayBucket>,
}

impl Digest {
    pub fn total_items(&self) -> usize {
        self.days.iter().map(|d| d.items.len()).sum()
    }
}

/// Newest first, then keep at most `cap`. Returns how many were cut.
pub fn sort_and_cap(mut items: Vec<DigestItem>, cap: usize) -> (Vec<DigestItem>, usize) {
    sort_newest_first(&mut items);
    let cut = items.len().saturating_sub(cap);
    items.truncate(cap);
    (items, cut)
}

/// Stable, so equal timestamps keep input order.
pub fn sort_newest_first(items: &mut [DigestItem]) {
    items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

/// Group by local calendar date and rank each day. Days come out in
/// ascending date order; `assemble` flips them.
pub fn bucket_by_day(items: Vec<DigestItem>) -> Vec<DayBucket> {
    let mut by_day: BTreeMap<NaiveDate, Vec<DigestItem>> = BTreeMap::new();
    for it in items {
        by_day.entry(it.local_date).or_default().push(it);
    }
    by_day
        .into_iter()
        .map(|(date, mut items)| {
            rank_items(&mut items);
            DayBucket {
                date: date.format("%Y-%m-%d").to_string(),
                attention_points: attention_points(&items),
                items,
            }
        })
        .collect()
}

/// Impact descending, then local time of day descending.
pub fn rank_items(items: &mut [DigestItem]) {
    items.sort_by(|a, b| {
        b.impact_score
            .cmp(&a.impact_score)
            .then_with(|| b.local_time.cmp(&a.local_time))
    });
}

/// Up to three titles in ranked order; blank titles don't take a slot.
pub fn attention_points(ranked: &[DigestItem]) -> Vec<String> {
    ranked
        .iter()
        .map(|it| it.title.trim())
        .filter(|t| !t.is_empty())
        .take(ATTENTION_POINTS_MAX)
        .map(|t| t.chars().take(ATTENTION_POINT_CHARS).collect::<String>())
        .collect()
}

/// Days newest first, stamped with the run time in `tz` (minute precision).
/// No filtering happens here.
pub fn assemble(mut days: Vec<DayBucket>, tz: Tz, clock: &RunClock) -> Digest {
    days.sort_by(|a, b| b.date.cmp(&a.date));
    Digest {
        generated_at: clock
            .now()
            .with_timezone(&tz)
            .format("%Y-%m-%dT%H:%M%:z")
            .to_string(),
        timezone: tz.name().to_string(),
        days,
    }
}

/// Write pretty JSON to a sibling temp file, then rename over `path`.
pub fn write_atomic(digest: &Digest, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(digest).context("serializing digest")?;
    write_file_atomic(path, json.as_bytes())
}

pub(crate) fn write_file_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .with_context(|| format!("output path has no file name: {}", path.display()))?;
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));
    fs::write(&tmp, bytes).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("renaming {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}
