// tests/publish_flow.rs
use anyhow::Result;
use async_trait::async_trait;
use news_digest::ingest::providers::rss::parse_feed;
use news_digest::publish::cache::PostedCache;
use news_digest::publish::{entry_id, publish_once, MessageSink, PublishOptions};
use std::sync::Mutex;
use std::time::Duration;

const COINDESK_XML: &str = include_str!("fixtures/coindesk_rss.xml");
const FEED: &str = "https://feeds.test/coindesk.rss";

#[derive(Default)]
struct Capture(Mutex<Vec<String>>);

#[async_trait]
impl MessageSink for Capture {
    async fn send(&self, text: &str) -> Result<()> {
        self.0.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

fn opts(max: usize) -> PublishOptions {
    PublishOptions {
        max_per_run: max,
        hashtags: "#BTC #Crypto #News".into(),
        pause: Duration::ZERO,
    }
}

#[tokio::test]
async fn posts_newest_tail_then_remembers_it() {
    let batch = parse_feed(FEED, COINDESK_XML).unwrap();
    let batches = vec![batch];
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.json");

    let sink = Capture::default();
    let mut cache = PostedCache::load(&state);
    let sent = publish_once(&batches, &mut cache, &sink, &opts(2)).await;
    assert_eq!(sent, 2);
    cache.save(&state).unwrap();

    let msgs = sink.0.lock().unwrap().clone();
    // oldest first among the two newest dated entries
    assert!(msgs[0].starts_with("📰 Bitcoin surges past $70k\n🌍 https://www.coindesk.com/markets/2024/09/10/bitcoin-surges-past-70k/\n"));
    assert!(msgs[1].contains("bitcoin-surges-past-70k-update"));
    assert!(msgs.iter().all(|m| m.ends_with("\n#BTC #Crypto #News")));

    // second run from disk skips what was delivered
    let reloaded = PostedCache::load(&state);
    assert!(reloaded.contains(FEED, &entry_id(&batches[0].entries[1])));
    assert!(reloaded.contains(FEED, &entry_id(&batches[0].entries[2])));

    let sink2 = Capture::default();
    let mut cache2 = reloaded;
    let sent2 = publish_once(&batches, &mut cache2, &sink2, &opts(10)).await;
    assert_eq!(sent2, 3);
    let titles: Vec<_> = sink2
        .0
        .lock()
        .unwrap()
        .iter()
        .map(|m| m.lines().next().unwrap_or_default().to_string())
        .collect();
    // the undated dc:date entry sorts first, then by pubDate
    assert_eq!(
        titles,
        vec![
            "📰 Ether ETF flows, explained",
            "📰 Bitcoin tag page",
            "📰 CoinDesk: Bitcoin, Ethereum, Crypto News and Price Data",
        ]
    );

    let sink3 = Capture::default();
    assert_eq!(publish_once(&batches, &mut cache2, &sink3, &opts(10)).await, 0);
}
