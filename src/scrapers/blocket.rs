use crate::error::ScrapeError;
use crate::models::{RawListing, Source};
use crate::scrapers::html::{link_of, select_text, selector, text_containing};
use crate::scrapers::traits::PageParser;
use scraper::Html;
use url::Url;

/// blocket.se wraps each search hit in an `<article>`
pub struct BlocketParser;

impl BlocketParser {
    /// Ad ids are the last numeric path segment, e.g. `/annons/.../12345678`
    fn native_id(url: &str) -> Option<String> {
        let url = Url::parse(url).ok()?;
        let last = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
        (last.len() >= 5 && last.chars().all(|c| c.is_ascii_digit())).then(|| last.to_string())
    }
}

impl PageParser for BlocketParser {
    fn source(&self) -> Source {
        Source::Blocket
    }

    fn parse_page(&self, html: &str, base: &Url) -> Result<Vec<RawListing>, ScrapeError> {
        let site = self.source();
        let document = Html::parse_document(html);
        let article_selector = selector(site, "article")?;
        let link_selector = selector(site, "a[href]")?;
        let title_selector = selector(site, "h2, h3")?;
        let location_selector = selector(site, "[class*='location']")?;

        let articles: Vec<_> = document.select(&article_selector).collect();
        if articles.is_empty() {
            return Err(ScrapeError::parse(site, "no <article> cards"));
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
                    location: select_text(article, &location_selector),
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
          <article>
            <a href="/annons/stockholm/maxi_84_segelbat/1103456789"><h2>Maxi 84 segelbåt</h2></a>
            <p>Skrov i glasfiber, nya segel</p>
            <div class="styled__TopInfoWrapper"><span class="styled__location">Stockholm</span></div>
            <div>54 900 kr</div>
          </article>
          <article>
            <h3>Annons utan länk</h3>
          </article>
          <article>
            <a href="/annons/goteborg/segelbat/abc">Okänd</a>
            <h3>Segelbåt</h3>
            <div>Pris saknas</div>
          </article>
        </body></html>
    "#;

    fn parse(html: &str) -> Result<Vec<RawListing>, ScrapeError> {
        BlocketParser.parse_page(html, &Url::parse(Source::Blocket.search_url()).unwrap())
    }

    #[test]
    fn extracts_articles() {
        let listings = parse(PAGE).unwrap();
        assert_eq!(listings.len(), 2);

        let maxi = &listings[0];
        assert_eq!(maxi.title.as_deref(), Some("Maxi 84 segelbåt"));
        assert_eq!(maxi.price.as_deref(), Some("54 900 kr"));
        assert_eq!(maxi.location.as_deref(), Some("Stockholm"));
        assert_eq!(maxi.native_id.as_deref(), Some("1103456789"));
        assert_eq!(maxi.url, "https://www.blocket.se/annons/stockholm/maxi_84_segelbat/1103456789");
    }

    #[test]
    fn card_without_id_or_price_is_kept() {
        let listings = parse(PAGE).unwrap();
        let second = &listings[1];
        assert_eq!(second.native_id, None);
        assert_eq!(second.price, None);
        assert_eq!(second.title.as_deref(), Some("Segelbåt"));
    }

    #[test]
    fn page_without_articles_is_a_parse_error() {
        assert!(parse("<html><body><p>Captcha</p></body></html>").is_err());
    }
}
