//! Post fresh entries from a plain feed list to a Telegram chat.

use anyhow::Result;
use std::time::Duration;

use news_digest::config::publish::{load_feed_list, PublishConfig};
use news_digest::ingest::collect_feeds;
use news_digest::ingest::providers::rss::{build_http_client, RssFeedSource};
use news_digest::ingest::types::FeedSource;
use news_digest::logging::init_tracing;
use news_digest::publish::cache::PostedCache;
use news_digest::publish::telegram::TelegramNotifier;
use news_digest::publish::{publish_once, PublishOptions};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = PublishConfig::from_env()?;
    let urls = load_feed_list(&cfg.feeds_path)?;

    let client = build_http_client()?;
    let sources: Vec<Box<dyn FeedSource>> = urls
        .iter()
        .map(|u| Box::new(RssFeedSource::with_client(u, client.clone())) as Box<dyn FeedSource>)
        .collect();
    let batches = collect_feeds(&sources).await;

    let mut cache = PostedCache::load(&cfg.state_path);
    let sink = TelegramNotifier::new(cfg.bot_token.clone(), cfg.chat_id.clone());
    let opts = PublishOptions {
        max_per_run: cfg.max_per_run,
        hashtags: cfg.hashtags.clone(),
        pause: Duration::from_millis(700),
    };

    let sent = publish_once(&batches, &mut cache, &sink, &opts).await;
    if sent > 0 {
        cache.save(&cfg.state_path)?;
    }
    println!("Published {sent} items");
    Ok(())
}
