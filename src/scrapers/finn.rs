use crate::error::ScrapeError;
use crate::models::{RawListing, Source};
use crate::scrapers::html::{link_of, select_text, selector, text_containing};
use crate::scrapers::traits::PageParser;
use regex::Regex;
use scraper::Html;
use std::sync::OnceLock;
use url::Url;

/// finn.no marks every search hit as `article.ads__unit`
pub struct FinnParser;

impl FinnParser {
    fn native_id(url: &str) -> Option<String> {
        static ID: OnceLock<Regex> = OnceLock::new();
        let re = ID.get_or_init(|| {
            Regex::new(r"(?:finnkode=|/item/)(\d+)").expect("valid finn id regex")
        });
        re.captures(url).map(|caps| caps[1].to_string())
    }
}

impl PageParser for FinnParser {
    fn source(&self) -> Source {
        Source::Finn
    }

    fn parse_page(&self, html: &str, base: &Url) -> Result<Vec<RawListing>, ScrapeError> {
        let site = self.source();
        let document = Html::parse_document(html);
        let article_selector = selector(site, "article.ads__unit")?;
        let link_selector = selector(site, "a[href]")?;
        let title_selector = selector(site, "h2, h3")?;
        let details_selector = selector(site, ".ads__unit__content__details")?;

        let articles: Vec<_> = document.select(&article_selector).collect();
        if articles.is_empty() {
            return Err(ScrapeError::parse(site, "no article.ads__unit cards"));
        }

        let listings = articles
            .into_iter()
            .filter_map(|article| {
                let (_, url) = link_of(article, &link_selector, base)?;
                Some(RawListing {
                    source: site,
                    native_id: Self::native_id(&url),
                    title: select_text(article, &title_selector),
                    price: text_containing(article, "kr"),
                    location: select_text(article, &details_selector),
                    url,
                })
            })
            .collect();

        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <article class="ads__unit">
            <div class="ads__unit__content">
              <h2><a href="/bap/forsale/ad.html?finnkode=334455667">Albin Ballad 30</a></h2>
              <div class="ads__unit__content__details"><div>Tønsberg</div></div>
              <div class="ads__unit__content__keys"><div>129&nbsp;000&nbsp;kr</div></div>
            </div>
          </article>
          <article class="ads__unit">
            <a href="https://www.finn.no/item/998877">Ikke nevnt</a>
          </article>
          <article class="ads__unit"><h2>Uten lenke</h2></article>
        </body></html>
    "#;

    fn parse(html: &str) -> Result<Vec<RawListing>, ScrapeError> {
        FinnParser.parse_page(html, &Url::parse(Source::Finn.search_url()).unwrap())
    }

    #[test]
    fn extracts_ads() {
        let listings = parse(PAGE).unwrap();
        assert_eq!(listings.len(), 2);

        let ballad = &listings[0];
        assert_eq!(ballad.title.as_deref(), Some("Albin Ballad 30"));
        assert_eq!(ballad.price.as_deref(), Some("129 000 kr"));
        assert_eq!(ballad.location.as_deref(), Some("Tønsberg"));
        assert_eq!(ballad.native_id.as_deref(), Some("334455667"));
        assert_eq!(ballad.url, "https://www.finn.no/bap/forsale/ad.html?finnkode=334455667");
    }

    #[test]
    fn item_urls_carry_the_id_in_the_path() {
        let listings = parse(PAGE).unwrap();
        assert_eq!(listings[1].native_id.as_deref(), Some("998877"));
        assert_eq!(listings[1].title, None);
    }

    #[test]
    fn unknown_card_markup_is_a_parse_error() {
        let err = parse("<html><body><article class='sf-search-ad'></article></body></html>");
        assert!(err.is_err());
    }
}
