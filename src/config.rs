use crate::feed::FeedMeta;
use crate::models::Source;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Settings for one run. Defaults match the published feed; every field can
/// be overridden through `BOAT_SCOUT_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub store_path: PathBuf,
    pub feed_path: PathBuf,
    /// Trailing span of `first_seen` published in the feed
    pub feed_window: chrono::Duration,
    pub feed: FeedMeta,
    /// Sites to scrape, in order
    pub sites: Vec<Source>,
    pub max_results: usize,
    pub request_delay: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
    /// Scrape all sites at once instead of one after the other
    pub concurrent: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("boat_data.json"),
            feed_path: PathBuf::from("sailing_boats.xml"),
            feed_window: chrono::Duration::days(7),
            feed: FeedMeta::default(),
            sites: Source::ALL.to_vec(),
            max_results: 20,
            request_delay: Duration::from_secs(1),
            request_timeout: Duration::from_secs(15),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            concurrent: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = var("BOAT_SCOUT_STORE") {
            config.store_path = PathBuf::from(path);
        }
        if let Some(path) = var("BOAT_SCOUT_FEED") {
            config.feed_path = PathBuf::from(path);
        }
        if let Some(days) = parsed::<i64>("BOAT_SCOUT_WINDOW_DAYS")? {
            anyhow::ensure!(days >= 0, "BOAT_SCOUT_WINDOW_DAYS must not be negative");
            config.feed_window = chrono::Duration::days(days);
        }
        if let Some(link) = var("BOAT_SCOUT_FEED_LINK") {
            config.feed.link = link;
        }
        if let Some(sites) = var("BOAT_SCOUT_SITES") {
            config.sites = sites
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(Source::from_str)
                .collect::<Result<_>>()
                .context("Invalid BOAT_SCOUT_SITES")?;
        }
        if let Some(max) = parsed("BOAT_SCOUT_MAX_RESULTS")? {
            config.max_results = max;
        }
        if let Some(ms) = parsed("BOAT_SCOUT_DELAY_MS")? {
            config.request_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = parsed::<u64>("BOAT_SCOUT_TIMEOUT_SECS")? {
            anyhow::ensure!(secs > 0, "BOAT_SCOUT_TIMEOUT_SECS must be positive");
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(concurrent) = parsed("BOAT_SCOUT_CONCURRENT")? {
            config.concurrent = concurrent;
        }

        Ok(config)
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var(key)
        .map(|v| v.trim().parse::<T>().with_context(|| format!("Invalid {key}: {v:?}")))
        .transpose()
}
