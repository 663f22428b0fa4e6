pub mod blocket;
pub mod dba;
pub mod finn;
pub mod html;
pub mod kleinanzeigen;
pub mod marktplaats;
pub mod site;
pub mod traits;
pub mod types;

pub use blocket::BlocketParser;
pub use dba::DbaParser;
pub use finn::FinnParser;
pub use kleinanzeigen::KleinanzeigenParser;
pub use marktplaats::MarktplaatsParser;
pub use site::SiteScraper;
pub use traits::{PageParser, ScraperTrait};
pub use types::SiteConfig;

use crate::config::Config;
use crate::models::Source;
use anyhow::Result;
use std::sync::Arc;

/// HTTP scraper for one site
pub fn scraper_for(source: Source, config: &Config) -> Result<Arc<dyn ScraperTrait>> {
    let site = SiteConfig::for_source(source, config);
    let scraper: Arc<dyn ScraperTrait> = match source {
        Source::Dba => Arc::new(SiteScraper::new(DbaParser, site)?),
        Source::Blocket => Arc::new(SiteScraper::new(BlocketParser, site)?),
        Source::Finn => Arc::new(SiteScraper::new(FinnParser, site)?),
        Source::Kleinanzeigen => Arc::new(SiteScraper::new(KleinanzeigenParser, site)?),
        Source::Marktplaats => Arc::new(SiteScraper::new(MarktplaatsParser, site)?),
    };
    Ok(scraper)
}

/// Scrapers for every configured site, in configuration order
pub fn build_scrapers(config: &Config) -> Result<Vec<Arc<dyn ScraperTrait>>> {
    config
        .sites
        .iter()
        .map(|source| scraper_for(*source, config))
        .collect()
}
