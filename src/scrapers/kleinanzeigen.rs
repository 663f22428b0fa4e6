use crate::error::ScrapeError;
use crate::models::{RawListing, Source};
use crate::scrapers::html::{link_of, select_text, selector, text_of};
use crate::scrapers::traits::PageParser;
use scraper::Html;
use url::Url;

/// kleinanzeigen.de lists ads as `article.aditem` carrying a `data-adid`
pub struct KleinanzeigenParser;

impl PageParser for KleinanzeigenParser {
    fn source(&self) -> Source {
        Source::Kleinanzeigen
    }

    fn parse_page(&self, html: &str, base: &Url) -> Result<Vec<RawListing>, ScrapeError> {
        let site = self.source();
        let document = Html::parse_document(html);
        let item_selector = selector(site, "article.aditem")?;
        let link_selector = selector(site, "a.ellipsis")?;
        let price_selector = selector(site, "p.aditem-main--middle--price-shipping--price")?;
        let location_selector = selector(site, "div.aditem-main--top--left")?;

        let items: Vec<_> = document.select(&item_selector).collect();
        if items.is_empty() {
            return Err(ScrapeError::parse(site, "no article.aditem cards"));
        }

        let listings = items
            .into_iter()
            .filter_map(|item| {
                let (link, url) = link_of(item, &link_selector, base)?;
                let native_id = item
                    .value()
                    .attr("data-adid")
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string);
                Some(RawListing {
                    source: site,
                    native_id,
                    title: text_of(link),
                    price: select_text(item, &price_selector),
                    location: select_text(item, &location_selector),
                    url,
                })
            })
            .collect();

        Ok(listings)
    }
}
