// src/classify.rs
//! Keyword classifier: category, asset tags and impact tier.
//!
//! All matching is case-insensitive plain substring matching. The category
//! table is an ordered list and the first category with any hit wins, no
//! matter where in the text the keyword appears.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::digest::DigestItem;
use crate::normalize::NormalizedItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Crypto,
    #[serde(rename = "US Macro")]
    UsMacro,
    Regulation,
    Earnings,
    Markets,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Crypto => "Crypto",
            Category::UsMacro => "US Macro",
            Category::Regulation => "Regulation",
            Category::Earnings => "Earnings",
            Category::Markets => "Markets",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Order is precedence. Keep it that way.
pub const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Crypto,
        &[
            "bitcoin", "btc", "ethereum", "eth", "crypto", "blockchain", "defi", "nft",
            "solana", "binance", "coinbase", "etf bitcoin", "etf ether",
        ],
    ),
    (
        Category::UsMacro,
        &[
            "fed", "fomc", "cpi", "ppi", "payrolls", "jobless", "inflation", "pce", "rates",
            "yields", "treasury", "usd", "unemployment", "housing starts", "ism",
        ],
    ),
    (
        Category::Regulation,
        &[
            "sec", "cftc", "doj", "ftc", "lawsuit", "settlement", "subpoena", "investigation",
            "regulation", "regulatório", "regulacao", "compliance",
        ],
    ),
    (
        Category::Earnings,
        &[
            "earnings", "results", "quarter", "guidance", "eps", "revenue", "outlook",
            "lucros", "trimestre", "balanço", "balanco",
        ],
    ),
    (
        Category::Markets,
        &[
            "stocks", "equities", "nasdaq", "dow", "s&p", "s&p 500", "sp500", "futures",
            "futuros", "options", "commodities", "oil", "gold", "silver", "treasuries", "web3",
        ],
    ),
];

const CRYPTO_OUTLETS: &[&str] = &["coindesk", "cointelegraph", "decrypt", "the block"];
const MARKET_OUTLETS: &[&str] = &["reuters", "wsj", "yahoo", "ft"];
pub const DEFAULT_CATEGORY: Category = Category::Markets;

/// (tag, title markers)
const TAG_MARKERS: &[(&str, &[&str])] = &[("BTC", &["bitcoin", "btc"]), ("ETH", &["ethereum", "eth"])];

const HIGH_IMPACT: &[&str] = &[
    "cpi", "pce", "fed", "fomc", "sec", "cftc", "ban", "etf", "collapse", "lawsuit",
    "bankruptcy", "halt", "shutdown", "tariff", "default", "treasury", "yields",
];
const MEDIUM_IMPACT: &[&str] = &[
    "btc", "bitcoin", "eth", "ethereum", "earnings", "guidance", "record", "drop", "surge",
    "plunge", "rally", "upgrade", "downgrade",
];

/// Serialised as the bare integer 1, 2 or 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Impact {
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Impact {
    pub fn score(self) -> u8 {
        self as u8
    }
}

impl Serialize for Impact {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(self.score())
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

pub fn guess_category(title: &str, summary: &str, source_name: &str) -> Category {
    let text = format!("{title} {summary} {source_name}").to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, kws)| contains_any(&text, kws))
        .map(|(cat, _)| *cat)
        .or_else(|| category_from_source(source_name))
        .unwrap_or(DEFAULT_CATEGORY)
}

/// Known outlets when no keyword hit.
pub fn category_from_source(source_name: &str) -> Option<Category> {
    let s = source_name.to_lowercase();
    if contains_any(&s, CRYPTO_OUTLETS) {
        Some(Category::Crypto)
    } else if contains_any(&s, MARKET_OUTLETS) {
        Some(Category::Markets)
    } else {
        None
    }
}

/// Title only. Tags are independent of each other.
pub fn detect_tags(title: &str) -> Vec<String> {
    let t = title.to_lowercase();
    TAG_MARKERS
        .iter()
        .filter(|(_, markers)| contains_any(&t, markers))
        .map(|(tag, _)| (*tag).to_string())
        .collect()
}

pub fn impact_tier(title: &str, summary: &str) -> Impact {
    let text = format!("{title} {summary}").to_lowercase();
    if contains_any(&text, HIGH_IMPACT) {
        Impact::High
    } else if contains_any(&text, MEDIUM_IMPACT) {
        Impact::Medium
    } else {
        Impact::Low
    }
}

/// Fill category, tags and impact. `feed_title` stands in for the source
/// name when the normalizer could not derive one.
pub fn enrich(item: NormalizedItem, feed_title: &str) -> DigestItem {
    let source_hint = if item.source.is_empty() {
        feed_title
    } else {
        item.source.as_str()
    };
    let category = guess_category(&item.title, &item.summary, source_hint);
    let tags = detect_tags(&item.title);
    let impact_score = impact_tier(&item.title, &item.summary);
    DigestItem::new(item, category, tags, impact_score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_category_in_table_wins() {
        // "earnings" appears first in the text, but Crypto precedes Earnings
        assert_eq!(
            guess_category("Earnings beat at miner; bitcoin flat", "", ""),
            Category::Crypto
        );
        assert_eq!(
            guess_category("Quarter results", "lawsuit pending", ""),
            Category::Regulation
        );
    }

    #[test]
    fn source_is_part_of_keyword_text() {
        assert_eq!(guess_category("Quiet day", "", "Crypto Daily"), Category::Crypto);
    }

    #[test]
    fn falls_back_to_source_then_default() {
        assert_eq!(guess_category("Hello", "", "The Block"), Category::Crypto);
        assert_eq!(category_from_source("Yahoo Finance"), Some(Category::Markets));
        assert_eq!(guess_category("Hello", "", "Local Gazette"), DEFAULT_CATEGORY);
        assert_eq!(category_from_source(""), None);
    }

    #[test]
    fn tags_from_title_only() {
        assert_eq!(detect_tags("BTC and Ethereum rally"), vec!["BTC", "ETH"]);
        assert!(detect_tags("Markets calm").is_empty());
        let item = NormalizedItem {
            id: "x".into(),
            timestamp: chrono::Utc::now(),
            local_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            local_time: chrono::NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
            title: "Markets calm".into(),
            summary: "bitcoin mentioned only here".into(),
            source: "Reuters".into(),
            url: String::new(),
        };
        assert!(enrich(item, "Reuters").tags.is_empty());
    }

    #[test]
    fn higher_tier_takes_precedence() {
        assert_eq!(impact_tier("Bitcoin ETF approved", ""), Impact::High);
        assert_eq!(impact_tier("Bitcoin surges past $70k", ""), Impact::Medium);
        assert_eq!(impact_tier("Quiet session", "nothing to see"), Impact::Low);
        assert_eq!(impact_tier("Stocks", "analyst upgrade"), Impact::Medium);
    }

    #[test]
    fn impact_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Impact::High).unwrap(), "3");
        assert_eq!(serde_json::to_string(&Category::UsMacro).unwrap(), "\"US Macro\"");
    }

    #[test]
    fn enrich_uses_feed_title_when_source_empty() {
        let item = NormalizedItem {
            id: "x".into(),
            timestamp: chrono::Utc::now(),
            local_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            local_time: chrono::NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
            title: "Weekly wrap".into(),
            summary: String::new(),
            source: String::new(),
            url: String::new(),
        };
        assert_eq!(enrich(item, "Cointelegraph").category, Category::Crypto);
    }
}
