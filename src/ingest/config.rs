// src/ingest/config.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::noise::NoiseConfig;

pub const ENV_PATH: &str = "NEWS_FEEDS_PATH";
const DEFAULT_TOML: &str = "config/feeds.toml";
const DEFAULT_JSON: &str = "config/feeds.json";

/// Named feed groups (group → feed URLs) plus optional noise rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedsConfig {
    pub groups: BTreeMap<String, Vec<String>>,
    pub noise: NoiseConfig,
}

impl FeedsConfig {
    /// (group, url) in group order, then file order within a group.
    pub fn urls(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.groups
            .iter()
            .flat_map(|(g, urls)| urls.iter().map(move |u| (g.as_str(), u.as_str())))
    }

    pub fn feed_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

/// Anything that is not a list of URLs is skipped.
#[derive(Deserialize)]
#[serde(untagged)]
enum GroupValue {
    List(Vec<String>),
    Other(IgnoredAny),
}

#[derive(Deserialize)]
struct FeedsFile {
    #[serde(default)]
    feeds: BTreeMap<String, GroupValue>,
    #[serde(default)]
    noise: NoiseConfig,
}

/// Load the feed list from an explicit path. TOML or JSON.
pub fn load_feeds_from(path: &Path) -> Result<FeedsConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading feeds config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_feeds(&content, ext.as_str())
        .with_context(|| format!("parsing feeds config {}", path.display()))
}

/// Resolve the feed list:
/// 1) `explicit` (CLI)
/// 2) $NEWS_FEEDS_PATH
/// 3) config/feeds.toml
/// 4) config/feeds.json
///
/// No file anywhere is an error; the run must not produce output without one.
pub fn load_feeds_default(explicit: Option<&Path>) -> Result<FeedsConfig> {
    if let Some(p) = explicit {
        return load_feeds_from(p);
    }
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_feeds_from(&pb);
        }
        bail!("{ENV_PATH} points to non-existent path {}", pb.display());
    }
    for candidate in [DEFAULT_TOML, DEFAULT_JSON] {
        let p = PathBuf::from(candidate);
        if p.exists() {
            return load_feeds_from(&p);
        }
    }
    Err(anyhow!(
        "no feeds config found (tried ${ENV_PATH}, {DEFAULT_TOML}, {DEFAULT_JSON})"
    ))
}

fn parse_feeds(s: &str, hint_ext: &str) -> Result<FeedsConfig> {
    let try_toml = hint_ext == "toml" || (hint_ext != "json" && !s.trim_start().starts_with('{'));
    if try_toml {
        return parse_toml(s);
    }
    parse_json(s)
}

fn parse_toml(s: &str) -> Result<FeedsConfig> {
    let f: FeedsFile = toml::from_str(s)?;
    Ok(into_config(f.feeds, f.noise))
}

fn parse_json(s: &str) -> Result<FeedsConfig> {
    let v: serde_json::Value = serde_json::from_str(s)?;
    if v.get("feeds").is_some() {
        let f: FeedsFile = serde_json::from_value(v)?;
        return Ok(into_config(f.feeds, f.noise));
    }
    // bare { "group": [urls] }
    let groups: BTreeMap<String, GroupValue> = serde_json::from_value(v)?;
    Ok(into_config(groups, NoiseConfig::default()))
}

fn into_config(raw: BTreeMap<String, GroupValue>, noise: NoiseConfig) -> FeedsConfig {
    let groups = raw
        .into_iter()
        .filter_map(|(name, v)| match v {
            GroupValue::List(urls) => Some((name, clean_list(urls))),
            GroupValue::Other(_) => {
                tracing::warn!(group = %name, "feeds group is not a list, skipping");
                None
            }
        })
        .filter(|(_, urls)| !urls.is_empty())
        .collect();
    FeedsConfig { groups, noise }
}

/// Trim, drop blanks and `#` comments, drop repeats (first one stays).
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if t.is_empty() || t.starts_with('#') || out.iter().any(|u| u == t) {
            continue;
        }
        out.push(t.to_string());
    }
    out
}
