// src/noise.rs
//! Drops entries that are not articles: feed banners repeated as items and
//! hub/listing pages of known sources. Pure predicate, items are never touched.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::normalize::NormalizedItem;

const DEFAULT_IGNORE_TITLES: &[&str] =
    &[r"^CoinDesk:\s*Bitcoin,\s*Ethereum,\s*Crypto News and Price Data$"];

const COINDESK_HUB_PATTERNS: &[&str] = &[
    r"/live/",
    r"/(category|tags|video|videos|authors|search)(/|$)",
];

static BUILTIN_TITLES: Lazy<Vec<Regex>> = Lazy::new(|| {
    DEFAULT_IGNORE_TITLES
        .iter()
        .map(|p| compile_title(p).unwrap())
        .collect()
});

static COINDESK_HUBS: Lazy<Vec<Regex>> = Lazy::new(|| {
    COINDESK_HUB_PATTERNS
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

/// Extra rules from the feeds config (`[noise]` table).
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct NoiseConfig {
    #[serde(default)]
    pub ignore_titles: Vec<String>,
    #[serde(default)]
    pub hosts: Vec<HostRuleConfig>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HostRuleConfig {
    pub host: String,
    #[serde(default)]
    pub path_patterns: Vec<String>,
}

#[derive(Debug, Clone)]
struct HostRule {
    /// Lower-case registrable host; subdomains match too.
    host: String,
    path_patterns: Vec<Regex>,
}

impl HostRule {
    fn applies_to(&self, host: &str) -> bool {
        host == self.host
            || host
                .strip_suffix(self.host.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    }
}

#[derive(Debug, Clone)]
pub struct NoiseFilter {
    title_patterns: Vec<Regex>,
    host_rules: Vec<HostRule>,
}

impl Default for NoiseFilter {
    fn default() -> Self {
        Self::builtin()
    }
}

impl NoiseFilter {
    /// A filter that keeps everything.
    pub fn empty() -> Self {
        Self {
            title_patterns: Vec::new(),
            host_rules: Vec::new(),
        }
    }

    /// CoinDesk banner title and CoinDesk hub pages.
    pub fn builtin() -> Self {
        Self {
            title_patterns: BUILTIN_TITLES.clone(),
            host_rules: vec![HostRule {
                host: "coindesk.com".to_string(),
                path_patterns: COINDESK_HUBS.clone(),
            }],
        }
    }

    /// Built-in rules extended with the configured ones.
    pub fn from_config(cfg: &NoiseConfig) -> Result<Self> {
        let mut f = Self::builtin();
        for pat in &cfg.ignore_titles {
            f = f.with_title_pattern(pat)?;
        }
        for rule in &cfg.hosts {
            let pats: Vec<&str> = rule.path_patterns.iter().map(String::as_str).collect();
            f = f.with_host_rule(&rule.host, &pats)?;
        }
        Ok(f)
    }

    /// Case-insensitive regex checked against the trimmed title.
    pub fn with_title_pattern(mut self, pattern: &str) -> Result<Self> {
        self.title_patterns.push(compile_title(pattern)?);
        Ok(self)
    }

    /// Rules are additive: a second rule for the same host adds patterns.
    pub fn with_host_rule(mut self, host: &str, path_patterns: &[&str]) -> Result<Self> {
        let host = host.trim().trim_start_matches("www.").to_ascii_lowercase();
        let compiled = path_patterns
            .iter()
            .map(|p| {
                Regex::new(&format!("(?i){p}"))
                    .with_context(|| format!("invalid path pattern for {host}: {p}"))
            })
            .collect::<Result<Vec<_>>>()?;
        match self.host_rules.iter_mut().find(|r| r.host == host) {
            Some(rule) => rule.path_patterns.extend(compiled),
            None => self.host_rules.push(HostRule {
                host,
                path_patterns: compiled,
            }),
        }
        Ok(self)
    }

    pub fn is_noise(&self, title: &str, url: &str) -> bool {
        let t = title.trim();
        if self.title_patterns.iter().any(|re| re.is_match(t)) {
            return true;
        }
        self.is_hub_url(url)
    }

    pub fn keeps(&self, item: &NormalizedItem) -> bool {
        !self.is_noise(&item.title, &item.url)
    }

    fn is_hub_url(&self, url: &str) -> bool {
        let Ok(parsed) = url::Url::parse(url.trim()) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        let path = parsed.path().to_ascii_lowercase();
        self.host_rules
            .iter()
            .filter(|r| r.applies_to(&host))
            .any(|r| r.path_patterns.iter().any(|re| re.is_match(&path)))
    }
}

fn compile_title(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("(?i){pattern}"))
        .with_context(|| format!("invalid title pattern: {pattern}"))
}
