// src/dedup.rs
//! Keep-latest dedup over (title prefix, source).
//!
//! Every candidate for a key is compared, whatever order they arrive in. Ties
//! on timestamp keep the earlier input, and output order is the order in which
//! each key was first seen, so the result only depends on the input order.

use std::collections::HashMap;

use crate::digest::DigestItem;

pub const DEDUP_TITLE_CHARS: usize = 120;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    title: String,
    source: String,
}

pub fn dedup_key(item: &DigestItem) -> DedupKey {
    let prefix: String = item.title.chars().take(DEDUP_TITLE_CHARS).collect();
    DedupKey {
        title: prefix.to_lowercase(),
        source: item.source.to_lowercase(),
    }
}

/// Returns the survivors and the number of items collapsed away.
pub fn dedup_keep_latest(items: Vec<DigestItem>) -> (Vec<DigestItem>, usize) {
    let total = items.len();
    let mut slot_of: HashMap<DedupKey, usize> = HashMap::with_capacity(total);
    let mut kept: Vec<DigestItem> = Vec::with_capacity(total);

    for it in items {
        match slot_of.get(&dedup_key(&it)) {
            Some(&slot) => {
                if it.timestamp > kept[slot].timestamp {
                    kept[slot] = it;
                }
            }
            None => {
                slot_of.insert(dedup_key(&it), kept.len());
                kept.push(it);
            }
        }
    }

    let removed = total - kept.len();
    (kept, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Category, Impact};
    use crate::normalize::NormalizedItem;
    use chrono::{TimeZone, Utc};

    fn item(id: &str, title: &str, source: &str, hour: u32) -> DigestItem {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap();
        let n = NormalizedItem {
            id: id.into(),
            timestamp: ts,
            local_date: ts.date_naive(),
            local_time: ts.time(),
            title: title.into(),
            summary: String::new(),
            source: source.into(),
            url: String::new(),
        };
        DigestItem::new(n, Category::Markets, vec![], Impact::Low)
    }

    #[test]
    fn latest_wins_in_either_order() {
        let early = item("early", "Same story", "Reuters", 8);
        let late = item("late", "SAME STORY", "reuters", 11);

        let (out, removed) = dedup_keep_latest(vec![early.clone(), late.clone()]);
        assert_eq!(removed, 1);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "late");

        let (out, _) = dedup_keep_latest(vec![late, early]);
        assert_eq!(out[0].id, "late");
    }

    #[test]
    fn later_candidate_seen_after_others_still_replaces() {
        let (out, removed) = dedup_keep_latest(vec![
            item("a", "X", "S", 9),
            item("other", "Y", "S", 10),
            item("b", "X", "S", 7),
            item("c", "X", "S", 12),
        ]);
        assert_eq!(removed, 2);
        let ids: Vec<_> = out.iter().map(|i| i.id.as_str()).collect();
        // slot order is first-seen order of the key
        assert_eq!(ids, vec!["c", "other"]);
    }

    #[test]
    fn ties_keep_first_seen() {
        let (out, _) = dedup_keep_latest(vec![item("first", "X", "S", 9), item("second", "X", "S", 9)]);
        assert_eq!(out[0].id, "first");
    }

    #[test]
    fn key_uses_title_prefix_and_source() {
        let base = "t".repeat(DEDUP_TITLE_CHARS);
        let a = item("a", &format!("{base} tail one"), "S", 9);
        let b = item("b", &format!("{base} tail two"), "S", 10);
        let c = item("c", &format!("{base} tail two"), "Other", 10);
        let (out, removed) = dedup_keep_latest(vec![a, b, c]);
        assert_eq!(removed, 1);
        let ids: Vec<_> = out.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }
}
