use crate::error::ScrapeError;
use crate::feed::FeedGenerator;
use crate::models::{Listing, RawListing, Source};
use crate::normalize::normalize;
use crate::scrapers::ScraperTrait;
use crate::store::{merge, write_atomic, ListingStore, Store};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

const NEW_LISTING_PREVIEW: usize = 15;

/// Outcome of running one site scraper
#[derive(Debug)]
pub enum RunResult {
    Success { listings: Vec<RawListing> },
    Failure { reason: String },
}

#[derive(Debug)]
pub struct SiteReport {
    pub source: Source,
    pub result: RunResult,
}

impl SiteReport {
    fn from_scrape(source: Source, scraped: Result<Vec<RawListing>, ScrapeError>) -> Self {
        let result = match scraped {
            Ok(listings) => {
                info!("✅ {}: scraped {} listings", source, listings.len());
                RunResult::Success { listings }
            }
            Err(e) => {
                error!("❌ {}: Failed - {}", source, e);
                RunResult::Failure {
                    reason: e.to_string(),
                }
            }
        };
        Self { source, result }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.result, RunResult::Success { .. })
    }
}

/// Everything a run produced, for logging and exit status
#[derive(Debug)]
pub struct RunReport {
    pub sites: Vec<SiteReport>,
    pub new_listings: Vec<Listing>,
    pub total_listings: usize,
    pub feed_items: usize,
}

impl RunReport {
    pub fn sites_attempted(&self) -> usize {
        self.sites.len()
    }

    pub fn sites_succeeded(&self) -> usize {
        self.sites.iter().filter(|s| s.succeeded()).count()
    }

    pub fn sites_failed(&self) -> usize {
        self.sites_attempted() - self.sites_succeeded()
    }

    /// Every attempted site failed
    pub fn is_degraded(&self) -> bool {
        self.sites_attempted() > 0 && self.sites_succeeded() == 0
    }

    pub fn errors(&self) -> Vec<String> {
        self.sites
            .iter()
            .filter_map(|s| match &s.result {
                RunResult::Failure { reason } => Some(format!("{}: {}", s.source, reason)),
                RunResult::Success { .. } => None,
            })
            .collect()
    }

    pub fn log_summary(&self) {
        info!("{}", "=".repeat(60));
        info!("SCRAPING STATISTICS");
        info!("{}", "=".repeat(60));
        info!("Sites scraped successfully: {}/{}", self.sites_succeeded(), self.sites_attempted());
        info!("Sites failed: {}/{}", self.sites_failed(), self.sites_attempted());
        info!("New boats found: {}", self.new_listings.len());
        info!("Total boats in database: {}", self.total_listings);
        info!("Boats in feed: {}", self.feed_items);

        let errors = self.errors();
        if !errors.is_empty() {
            warn!("Errors encountered:");
            for e in &errors {
                warn!("  - {}", e);
            }
        }

        if self.new_listings.is_empty() {
            info!("📋 No new boats found in this run");
        } else {
            info!("📋 New boats found ({}):", self.new_listings.len());
            for (i, listing) in self.new_listings.iter().take(NEW_LISTING_PREVIEW).enumerate() {
                info!(
                    "  {}. {} ({}) - {}",
                    i + 1,
                    listing.title,
                    listing.source,
                    listing.display_price()
                );
            }
            if self.new_listings.len() > NEW_LISTING_PREVIEW {
                info!("  ... and {} more", self.new_listings.len() - NEW_LISTING_PREVIEW);
            }
        }
    }
}

/// One scrape → merge → save → publish pass
pub struct Pipeline {
    scrapers: Vec<Arc<dyn ScraperTrait>>,
    store: ListingStore,
    feed: FeedGenerator,
    feed_path: PathBuf,
    concurrent: bool,
}

impl Pipeline {
    pub fn new(
        scrapers: Vec<Arc<dyn ScraperTrait>>,
        store: ListingStore,
        feed: FeedGenerator,
        feed_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            scrapers,
            store,
            feed,
            feed_path: feed_path.into(),
            concurrent: false,
        }
    }

    pub fn concurrent(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    /// Run every scraper, fold the results into the store and republish the
    /// feed. Site failures are reported, not returned; only failing to save
    /// the store or write the feed is an error.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunReport> {
        let sites = if self.concurrent {
            self.scrape_concurrently().await
        } else {
            self.scrape_sequentially().await
        };

        let incoming: Vec<_> = sites
            .iter()
            .filter_map(|site| match &site.result {
                RunResult::Success { listings } => Some(listings),
                RunResult::Failure { .. } => None,
            })
            .flatten()
            .cloned()
            .map(normalize)
            .collect();

        let store = self.load_store().await;
        info!("Previous database size: {} boats", store.len());

        let (store, new_listings) = merge(store, incoming, now);
        self.store
            .save(&store)
            .await
            .with_context(|| format!("Failed to save store to {}", self.store.path().display()))?;

        let feed_items = self.feed.select(&store, now).len();
        let xml = self.feed.render(&store, now).context("Failed to render feed")?;
        write_atomic(&self.feed_path, xml.as_bytes())
            .await
            .with_context(|| format!("Failed to write feed to {}", self.feed_path.display()))?;
        info!("✅ RSS feed generated: {}", self.feed_path.display());

        Ok(RunReport {
            sites,
            new_listings,
            total_listings: store.len(),
            feed_items,
        })
    }

    async fn scrape_sequentially(&self) -> Vec<SiteReport> {
        let mut reports = Vec::with_capacity(self.scrapers.len());
        for scraper in &self.scrapers {
            let scraped = scraper.scrape().await;
            reports.push(SiteReport::from_scrape(scraper.source(), scraped));
        }
        reports
    }

    async fn scrape_concurrently(&self) -> Vec<SiteReport> {
        let handles: Vec<_> = self
            .scrapers
            .iter()
            .map(|scraper| {
                let scraper = Arc::clone(scraper);
                (scraper.source(), tokio::spawn(async move { scraper.scrape().await }))
            })
            .collect();

        let mut reports = Vec::with_capacity(handles.len());
        for (source, handle) in handles {
            let report = match handle.await {
                Ok(scraped) => SiteReport::from_scrape(source, scraped),
                Err(e) => {
                    error!("❌ {}: scraper task aborted - {}", source, e);
                    SiteReport {
                        source,
                        result: RunResult::Failure {
                            reason: format!("scraper task aborted: {e}"),
                        },
                    }
                }
            };
            reports.push(report);
        }
        reports
    }

    /// An unreadable store is logged and replaced by an empty one so the run
    /// can still publish.
    async fn load_store(&self) -> Store {
        match self.store.load().await {
            Ok(store) => store,
            Err(e) => {
                warn!("⚠️  {}; starting from an empty store", e);
                Store::new()
            }
        }
    }
}
