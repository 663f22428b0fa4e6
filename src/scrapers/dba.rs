use crate::error::ScrapeError;
use crate::models::{RawListing, Source};
use crate::scrapers::html::{link_of, select_text, selector, text_of};
use crate::scrapers::traits::PageParser;
use regex::Regex;
use scraper::Html;
use std::sync::OnceLock;
use url::Url;

/// dba.dk renders search results as a table, one `tr.dbaListing` per ad
pub struct DbaParser;

impl DbaParser {
    fn native_id(url: &str) -> Option<String> {
        static ID: OnceLock<Regex> = OnceLock::new();
        let re = ID.get_or_init(|| Regex::new(r"/id-(\d+)").expect("valid dba id regex"));
        re.captures(url).map(|caps| caps[1].to_string())
    }
}

impl PageParser for DbaParser {
    fn source(&self) -> Source {
        Source::Dba
    }

    fn parse_page(&self, html: &str, base: &Url) -> Result<Vec<RawListing>, ScrapeError> {
        let site = self.source();
        let document = Html::parse_document(html);
        let row_selector = selector(site, "tr.dbaListing")?;
        let link_selector = selector(site, "a.listingLink")?;
        let price_selector = selector(site, "td.price")?;
        let city_selector = selector(site, "td.city")?;

        let rows: Vec<_> = document.select(&row_selector).collect();
        if rows.is_empty() {
            return Err(ScrapeError::parse(site, "no tr.dbaListing rows"));
        }

        let listings = rows
            .into_iter()
            .filter_map(|row| {
                let (link, url) = link_of(row, &link_selector, base)?;
                Some(RawListing {
                    source: site,
                    native_id: Self::native_id(&url),
                    title: text_of(link),
                    price: select_text(row, &price_selector),
                    location: select_text(row, &city_selector),
                    url,
                })
            })
            .collect();

        Ok(listings)
    }
}
