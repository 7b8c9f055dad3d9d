//! News digest run: fetch the configured feeds once, build the day-bucketed
//! digest and write it as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use news_digest::clock::RunClock;
use news_digest::config::digest::{DigestOverrides, DigestSettings};
use news_digest::digest::write_atomic;
use news_digest::ingest::config::load_feeds_default;
use news_digest::ingest::{collect_feeds, sources_from_config};
use news_digest::logging::init_tracing;
use news_digest::noise::NoiseFilter;
use news_digest::pipeline::{build_digest, cutoff, PipelineParams};

#[derive(Debug, Parser)]
#[command(name = "news-digest", version, about = "Build a day-bucketed news digest from RSS/Atom feeds")]
struct Args {
    /// Lookback window in days (values below 1 count as 1).
    #[arg(long, allow_negative_numbers = true)]
    days: Option<i64>,

    /// Feed list (TOML or JSON).
    #[arg(long)]
    feeds: Option<PathBuf>,

    /// Output file.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Maximum number of items across all days.
    #[arg(long)]
    max_items: Option<usize>,

    /// IANA timezone used for day boundaries and times.
    #[arg(long)]
    timezone: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();
    init_tracing();

    let args = Args::parse();

    let feeds = load_feeds_default(args.feeds.as_deref())?;
    let noise = NoiseFilter::from_config(&feeds.noise).context("building noise filter")?;
    let settings = DigestSettings::resolve(DigestOverrides {
        lookback_days: args.days,
        max_items: args.max_items,
        timezone: args.timezone,
        output: args.output,
    })?;

    let clock = RunClock::system();
    let since = cutoff(&clock, settings.lookback_days).with_timezone(&settings.timezone);
    println!(
        "[fetch] using lookback_days={} (cutoff={})",
        settings.lookback_days,
        since.to_rfc3339()
    );
    tracing::info!(feeds = feeds.feed_count(), "starting digest run");

    let sources = sources_from_config(&feeds)?;
    let batches = collect_feeds(&sources).await;

    let params = PipelineParams::from_settings(&settings, noise);
    let (digest, stats) = build_digest(&batches, &params, &clock);

    write_atomic(&digest, &settings.output)?;
    println!(
        "[fetch] Wrote {} with {} items across {} day(s).",
        settings.output.display(),
        stats.written,
        stats.days
    );
    Ok(())
}
