// src/config/publish.rs
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::{env, fs};

pub const DEFAULT_MAX_PER_RUN: usize = 6;
pub const DEFAULT_HASHTAGS: &str = "#BTC #Crypto #News";
pub const DEFAULT_FEEDS_PATH: &str = "feeds.txt";
pub const DEFAULT_STATE_PATH: &str = "state.json";

#[derive(Debug, Clone)]
pub struct PublishConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub max_per_run: usize,
    pub hashtags: String,
    pub feeds_path: PathBuf,
    pub state_path: PathBuf,
}

impl PublishConfig {
    /// TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID are required; the rest default.
    pub fn from_env() -> Result<Self> {
        let bot_token = env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN not set")?;
        let chat_id = env::var("TELEGRAM_CHAT_ID").context("TELEGRAM_CHAT_ID not set")?;

        let max_per_run = env::var("MAX_PER_RUN")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_MAX_PER_RUN);
        let hashtags = env::var("HASHTAGS").unwrap_or_else(|_| DEFAULT_HASHTAGS.to_string());
        let feeds_path = env::var("PUBLISH_FEEDS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_FEEDS_PATH));
        let state_path = env::var("PUBLISH_STATE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATE_PATH));

        Ok(Self {
            bot_token,
            chat_id,
            max_per_run,
            hashtags,
            feeds_path,
            state_path,
        })
    }
}

/// One URL per line; blank lines and `#` comments are skipped.
pub fn load_feed_list(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading feed list from {}", path.display()))?;
    Ok(parse_feed_list(&content))
}

fn parse_feed_list(s: &str) -> Vec<String> {
    s.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}
