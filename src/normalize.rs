// src/normalize.rs
//! Entry normalizer: one `RawEntry` in, one fully-resolved `NormalizedItem` out.
//!
//! Nothing here can fail. Missing text becomes `""`, an unparseable date
//! falls through to the next candidate and finally to the run clock.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::clock::RunClock;
use crate::ingest::types::RawEntry;

pub const SUMMARY_MAX_CHARS: usize = 280;
pub const SOURCE_SEPARATOR: &str = " - ";
const ID_HEX_LEN: usize = 12;

/// Formats that carry their own offset.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%a, %d %b %Y %H:%M %z",
    "%d %b %Y %H:%M:%S %z",
    "%a %b %d %H:%M:%S %z %Y",
];

/// Offset-less formats; read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%a, %d %b %Y %H:%M:%S",
    "%a, %d %b %Y %H:%M",
    "%d %b %Y %H:%M:%S",
    "%B %d, %Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y"];

/// Output of the normalizer. Classification fields live on `digest::DigestItem`,
/// which is only built by `classify::enrich`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedItem {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// `timestamp` in the target zone; grouping and display only.
    pub local_date: NaiveDate,
    pub local_time: NaiveTime,
    pub title: String,
    pub summary: String,
    pub source: String,
    pub url: String,
}

pub fn normalize_entry(
    entry: &RawEntry,
    feed_title: &str,
    tz: Tz,
    clock: &RunClock,
) -> (NormalizedItem, DateTime<Utc>) {
    let timestamp = resolve_timestamp(entry, clock);
    let local = timestamp.with_timezone(&tz);

    let item = NormalizedItem {
        id: stable_id(entry),
        timestamp,
        local_date: local.date_naive(),
        local_time: local.time(),
        title: clean_title(entry.title.as_deref().unwrap_or_default()),
        summary: clean_summary(entry.summary.as_deref().unwrap_or_default()),
        source: source_name(feed_title),
        url: entry.link.clone().unwrap_or_default(),
    };
    (item, timestamp)
}

/// published struct → updated struct → free text (published, updated, date) → now.
pub fn resolve_timestamp(entry: &RawEntry, clock: &RunClock) -> DateTime<Utc> {
    if let Some(ts) = entry.published_parsed.or(entry.updated_parsed) {
        return ts;
    }
    [&entry.published, &entry.updated, &entry.date]
        .into_iter()
        .filter_map(|f| f.as_deref())
        .filter(|s| !s.trim().is_empty())
        .find_map(parse_datetime_lenient)
        .unwrap_or_else(|| clock.now())
}

/// Best-effort free-text date parse. No offset means UTC.
pub fn parse_datetime_lenient(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // "Z" / "UTC" / "GMT" suffixes on otherwise naive text
    let s = strip_utc_suffix(s);
    for f in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, f) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for f in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, f) {
            return Some(dt.and_utc());
        }
    }
    for f in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, f) {
            return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

fn strip_utc_suffix(s: &str) -> &str {
    for suffix in ["Z", " UTC", " GMT", " UT"] {
        if let Some(rest) = s.strip_suffix(suffix) {
            return rest.trim_end();
        }
    }
    s
}

/// The text identity is derived from: id, else link, else title, else "".
pub fn identity_text(entry: &RawEntry) -> &str {
    [&entry.id, &entry.link, &entry.title]
        .into_iter()
        .filter_map(|f| f.as_deref())
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

/// Short stable id: first 12 hex chars of SHA-256 over `identity_text`.
pub fn stable_id(entry: &RawEntry) -> String {
    let full = sha256_hex(identity_text(entry));
    full[..ID_HEX_LEN].to_string()
}

pub(crate) fn sha256_hex(text: &str) -> String {
    use sha2::{Digest, Sha256};
    use std::fmt::Write as _;
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest.iter() {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// "Reuters - Business News" → "Reuters".
pub fn source_name(feed_title: &str) -> String {
    feed_title
        .split(SOURCE_SEPARATOR)
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn clean_title(s: &str) -> String {
    html_escape::decode_html_entities(s).trim().to_string()
}

/// Decode entities, strip tags, collapse whitespace, cap at `SUMMARY_MAX_CHARS`.
pub fn clean_summary(s: &str) -> String {
    static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

    let decoded = html_escape::decode_html_entities(s);
    let stripped = RE_TAGS.replace_all(&decoded, " ");
    let collapsed = RE_WS.replace_all(&stripped, " ");
    let capped: String = collapsed.trim().chars().take(SUMMARY_MAX_CHARS).collect();
    capped.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn clock() -> RunClock {
        RunClock::fixed(Utc.with_ymd_and_hms(2024, 9, 10, 12, 0, 0).unwrap())
    }

    #[test]
    fn source_is_first_segment_of_feed_title() {
        assert_eq!(source_name("Reuters - Business News"), "Reuters");
        assert_eq!(source_name("CoinDesk"), "CoinDesk");
        assert_eq!(source_name(""), "");
        // hyphen without spaces is not a separator
        assert_eq!(source_name("Yahoo-Finance"), "Yahoo-Finance");
    }

    #[test]
    fn summary_is_stripped_and_capped() {
        let s = "<p>Hello&nbsp;<b>world</b></p>\n\n<br/>again";
        assert_eq!(clean_summary(s), "Hello world again");

        let long = format!("<div>{}</div>", "x".repeat(1_000));
        assert_eq!(clean_summary(&long).chars().count(), SUMMARY_MAX_CHARS);
    }

    #[test]
    fn identity_precedence() {
        let mut e = RawEntry {
            id: Some("guid-1".into()),
            link: Some("https://a.test/1".into()),
            title: Some("T".into()),
            ..Default::default()
        };
        assert_eq!(identity_text(&e), "guid-1");
        e.id = Some(String::new());
        assert_eq!(identity_text(&e), "https://a.test/1");
        e.link = None;
        assert_eq!(identity_text(&e), "T");
        e.title = None;
        assert_eq!(identity_text(&e), "");
        assert_eq!(stable_id(&e).len(), 12);
    }

    #[test]
    fn structured_dates_win_over_text() {
        let published = Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap();
        let updated = Utc.with_ymd_and_hms(2024, 9, 2, 8, 0, 0).unwrap();
        let e = RawEntry {
            published_parsed: Some(published),
            updated_parsed: Some(updated),
            published: Some("2020-01-01T00:00:00Z".into()),
            ..Default::default()
        };
        assert_eq!(resolve_timestamp(&e, &clock()), published);

        let e = RawEntry {
            updated_parsed: Some(updated),
            ..Default::default()
        };
        assert_eq!(resolve_timestamp(&e, &clock()), updated);
    }

    #[test]
    fn free_text_falls_through_candidates() {
        let e = RawEntry {
            published: Some("sometime last week".into()),
            updated: Some("   ".into()),
            date: Some("2024-09-05 10:15".into()),
            ..Default::default()
        };
        assert_eq!(
            resolve_timestamp(&e, &clock()),
            Utc.with_ymd_and_hms(2024, 9, 5, 10, 15, 0).unwrap()
        );
    }

    #[test]
    fn lenient_parser_handles_offsets_and_naive_text() {
        let want = Utc.with_ymd_and_hms(2024, 9, 5, 9, 15, 0).unwrap();
        assert_eq!(parse_datetime_lenient("2024-09-05T10:15:00+01:00"), Some(want));
        assert_eq!(parse_datetime_lenient("Thu, 05 Sep 2024 09:15:00 GMT"), Some(want));
        assert_eq!(parse_datetime_lenient("2024-09-05 10:15:00 +0100"), Some(want));
        // no offset → UTC
        assert_eq!(parse_datetime_lenient("2024-09-05T09:15:00"), Some(want));
        assert_eq!(parse_datetime_lenient("2024-09-05 09:15:00 UTC"), Some(want));
        assert_eq!(
            parse_datetime_lenient("2024-09-05"),
            Some(Utc.with_ymd_and_hms(2024, 9, 5, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_datetime_lenient("not a date"), None);
    }

    #[test]
    fn local_projection_uses_target_zone() {
        // 23:30 UTC in summer is 00:30 next day in Lisbon (WEST, +01:00)
        let e = RawEntry {
            title: Some("Late".into()),
            published_parsed: Some(Utc.with_ymd_and_hms(2024, 7, 1, 23, 30, 0).unwrap()),
            ..Default::default()
        };
        let (item, ts) = normalize_entry(&e, "Feed", chrono_tz::Europe::Lisbon, &clock());
        assert_eq!(ts, item.timestamp);
        assert_eq!(item.local_date, NaiveDate::from_ymd_opt(2024, 7, 2).unwrap());
        assert_eq!(item.local_time, NaiveTime::from_hms_opt(0, 30, 0).unwrap());
    }

    #[test]
    fn empty_entry_still_normalizes() {
        let (item, ts) =
            normalize_entry(&RawEntry::default(), "", chrono_tz::Europe::Lisbon, &clock());
        assert_eq!(ts, clock().now());
        assert_eq!(item.title, "");
        assert_eq!(item.summary, "");
        assert_eq!(item.source, "");
        assert_eq!(item.url, "");
        assert_eq!(item.id, stable_id(&RawEntry::default()));
    }
}
