use crate::error::ScrapeError;
use crate::models::{RawListing, Source};
use async_trait::async_trait;
use url::Url;

/// Common trait for all marketplace scrapers
#[async_trait]
pub trait ScraperTrait: Send + Sync {
    /// Fetch the search page and return its listing cards in page order
    async fn scrape(&self) -> Result<Vec<RawListing>, ScrapeError>;

    /// Site this scraper reads from
    fn source(&self) -> Source;
}

/// Site-specific extraction of listing cards from a downloaded search page
pub trait PageParser: Send + Sync {
    fn source(&self) -> Source;

    /// Parse every card on the page. Cards without a usable link are skipped;
    /// a page without any recognizable card container is a parse error.
    fn parse_page(&self, html: &str, base: &Url) -> Result<Vec<RawListing>, ScrapeError>;
}
