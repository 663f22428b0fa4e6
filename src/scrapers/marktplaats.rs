use crate::error::ScrapeError;
use crate::models::{RawListing, Source};
use crate::scrapers::html::{link_of, select_text, selector};
use crate::scrapers::traits::PageParser;
use regex::Regex;
use scraper::Html;
use std::sync::OnceLock;
use url::Url;

/// marktplaats.nl renders results as `li.mp-Listing`
pub struct MarktplaatsParser;

impl MarktplaatsParser {
    /// Ad URLs look like `/v/watersport-en-boten/zeilboten/m2101234567-etap-28i`
    fn native_id(url: &str) -> Option<String> {
        static ID: OnceLock<Regex> = OnceLock::new();
        let re = ID.get_or_init(|| Regex::new(r"/(m\d{6,})(?:-|$|\?)").expect("valid marktplaats id regex"));
        re.captures(url).map(|caps| caps[1].to_string())
    }
}

impl PageParser for MarktplaatsParser {
    fn source(&self) -> Source {
        Source::Marktplaats
    }

    fn parse_page(&self, html: &str, base: &Url) -> Result<Vec<RawListing>, ScrapeError> {
        let site = self.source();
        let document = Html::parse_document(html);
        let listing_selector = selector(site, "li.mp-Listing")?;
        let link_selector = selector(site, "a[href]")?;
        let title_selector = selector(site, "h3")?;
        let price_selector = selector(site, "span.mp-text-price-label")?;
        let location_selector = selector(site, ".mp-Listing-location")?;

        let cards: Vec<_> = document.select(&listing_selector).collect();
        if cards.is_empty() {
            return Err(ScrapeError::parse(site, "no li.mp-Listing cards"));
        }

        let listings = cards
            .into_iter()
            .filter_map(|card| {
                let (_, url) = link_of(card, &link_selector, base)?;
                Some(RawListing {
                    source: site,
                    native_id: Self::native_id(&url),
                    title: select_text(card, &title_selector),
                    price: select_text(card, &price_selector),
                    location: select_text(card, &location_selector),
                    url,
                })
            })
            .collect();

        Ok(listings)
    }
}
