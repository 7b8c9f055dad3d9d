// src/ingest/providers/rss.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

use crate::ingest::types::{FeedBatch, FeedSource, RawEntry};

const HTTP_TIMEOUT_SECS: u64 = 20;
const USER_AGENT: &str = concat!("news-digest/", env!("CARGO_PKG_VERSION"));

// --- RSS 2.0 ---

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    title: Option<String>,
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    guid: Option<String>,
    description: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(rename = "dc:date", alias = "date")]
    dc_date: Option<String>,
}

// --- Atom ---

#[derive(Debug, Deserialize)]
struct AtomFeed {
    title: Option<String>,
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    id: Option<String>,
    title: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
    summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

impl AtomEntry {
    /// `rel="alternate"` (or no rel) wins over self/enclosure links.
    fn article_link(&self) -> Option<String> {
        self.links
            .iter()
            .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
            .or_else(|| self.links.first())
            .and_then(|l| l.href.clone())
    }
}

/// Strict parse used to pre-fill `published_parsed` / `updated_parsed`.
/// Anything looser is left to the normalizer's free-text fallback.
fn parse_strict(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    OffsetDateTime::parse(ts, &Rfc2822)
        .or_else(|_| OffsetDateTime::parse(ts, &Rfc3339))
        .ok()
        .and_then(|dt| DateTime::<Utc>::from_timestamp(dt.unix_timestamp(), dt.nanosecond()))
        // obsolete zone names ("EST", "PDT") that `time` rejects
        .or_else(|| {
            DateTime::parse_from_rfc2822(ts)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn entry_from_rss(it: Item) -> RawEntry {
    let published = non_empty(it.pub_date);
    let date = non_empty(it.dc_date);
    RawEntry {
        id: non_empty(it.guid),
        title: it.title,
        link: non_empty(it.link),
        summary: it.description,
        published_parsed: published.as_deref().and_then(parse_strict),
        updated_parsed: None,
        published,
        updated: None,
        date,
    }
}

fn entry_from_atom(it: AtomEntry) -> RawEntry {
    let link = non_empty(it.article_link());
    let published = non_empty(it.published);
    let updated = non_empty(it.updated);
    RawEntry {
        id: non_empty(it.id),
        title: it.title,
        link,
        summary: it.summary,
        published_parsed: published.as_deref().and_then(parse_strict),
        updated_parsed: updated.as_deref().and_then(parse_strict),
        published,
        updated,
        date: None,
    }
}

/// Parse an RSS 2.0 or Atom document into a `FeedBatch`.
pub fn parse_feed(url: &str, xml: &str) -> Result<FeedBatch> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(xml);

    let batch = match from_str::<Rss>(&xml_clean) {
        Ok(rss) => FeedBatch {
            url: url.to_string(),
            title: rss.channel.title.unwrap_or_default().trim().to_string(),
            entries: rss.channel.item.into_iter().map(entry_from_rss).collect(),
        },
        Err(rss_err) if !xml_clean.contains("<feed") => {
            anyhow::bail!("parsing feed xml from {url}: not an rss or atom document ({rss_err})");
        }
        Err(rss_err) => {
            let atom: AtomFeed = from_str(&xml_clean)
                .map_err(|atom_err| anyhow!("rss: {rss_err}; atom: {atom_err}"))
                .with_context(|| format!("parsing feed xml from {url}"))?;
            FeedBatch {
                url: url.to_string(),
                title: atom.title.unwrap_or_default().trim().to_string(),
                entries: atom.entry.into_iter().map(entry_from_atom).collect(),
            }
        }
    };

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("ingest_parse_ms").record(ms);
    counter!("ingest_events_total").increment(batch.entries.len() as u64);

    Ok(batch)
}

pub struct RssFeedSource {
    url: String,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http(reqwest::Client),
}

/// Client used for feed fetches: 20s timeout, crate user agent.
pub fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
        .context("building http client")
}

impl RssFeedSource {
    /// Share one client across many feeds.
    pub fn with_client(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            mode: Mode::Http(client),
        }
    }

    pub fn from_fixture(url: impl Into<String>, content: &str) -> Self {
        Self {
            url: url.into(),
            mode: Mode::Fixture(content.to_string()),
        }
    }
}

#[async_trait]
impl FeedSource for RssFeedSource {
    async fn fetch(&self) -> Result<FeedBatch> {
        match &self.mode {
            Mode::Fixture(s) => parse_feed(&self.url, s),
            Mode::Http(client) => {
                let body = client
                    .get(&self.url)
                    .send()
                    .await
                    .with_context(|| format!("GET {}", self.url))?
                    .error_for_status()
                    .with_context(|| format!("non-2xx from {}", self.url))?
                    .text()
                    .await
                    .context("reading feed body")?;
                parse_feed(&self.url, &body)
            }
        }
    }

    fn name(&self) -> &str {
        &self.url
    }
}

/// HTML entities that are not valid XML break the parser; map the common ones.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}
