use crate::error::ScrapeError;
use crate::models::{RawListing, Source};
use crate::scrapers::traits::{PageParser, ScraperTrait};
use crate::scrapers::types::SiteConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

/// Fetches one search page over HTTP and hands it to a site parser
pub struct SiteScraper<P> {
    client: Client,
    base: Url,
    config: SiteConfig,
    parser: P,
}

impl<P: PageParser> SiteScraper<P> {
    pub fn new(parser: P, config: SiteConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("Invalid header name {name:?}"))?;
            let value = HeaderValue::from_str(value)
                .with_context(|| format!("Invalid value for header {}", name.as_str()))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        let base = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid base URL for {}", parser.source()))?;

        Ok(Self {
            client,
            base,
            config,
            parser,
        })
    }

    async fn fetch_page(&self) -> Result<String, ScrapeError> {
        let url = self.base.as_str();

        if !self.config.request_delay.is_zero() {
            tokio::time::sleep(self.config.request_delay).await;
        }

        debug!("Fetching URL: {}", url);
        let response = self
            .client
            .get(self.base.clone())
            .send()
            .await
            .map_err(|source| ScrapeError::Fetch {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} returned status: {}", self.parser.source(), status);
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await.map_err(|source| ScrapeError::Fetch {
            url: url.to_string(),
            source,
        })?;
        debug!("Downloaded {} bytes of HTML", html.len());
        Ok(html)
    }
}

#[async_trait]
impl<P: PageParser> ScraperTrait for SiteScraper<P> {
    async fn scrape(&self) -> Result<Vec<RawListing>, ScrapeError> {
        let source = self.parser.source();
        info!("Scraping {}...", source);

        let html = self.fetch_page().await?;
        let mut listings = self.parser.parse_page(&html, &self.base)?;

        if listings.len() > self.config.max_results {
            debug!(
                "Keeping first {} of {} listings from {}",
                self.config.max_results,
                listings.len(),
                source
            );
            listings.truncate(self.config.max_results);
        }

        Ok(listings)
    }

    fn source(&self) -> Source {
        self.parser.source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::scrapers::DbaParser;
    use std::time::{Duration, Instant};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct NullParser;

    impl PageParser for NullParser {
        fn source(&self) -> Source {
            Source::Finn
        }

        fn parse_page(&self, _html: &str, _base: &Url) -> Result<Vec<RawListing>, ScrapeError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn builds_client_from_site_config() {
        let config = SiteConfig::for_source(Source::Finn, &Config::default());
        let scraper = SiteScraper::new(NullParser, config).unwrap();
        assert_eq!(scraper.source(), Source::Finn);
        assert_eq!(scraper.base.host_str(), Some("www.finn.no"));
    }

    #[test]
    fn rejects_bad_header_values() {
        let mut config = SiteConfig::for_source(Source::Finn, &Config::default());
        config.headers.push(("X-Bad".into(), "line\nbreak".into()));
        assert!(SiteScraper::new(NullParser, config).is_err());
    }

    fn dba_config(base_url: String) -> SiteConfig {
        SiteConfig {
            base_url,
            max_results: 20,
            request_delay: Duration::ZERO,
            timeout: Duration::from_secs(2),
            ..SiteConfig::for_source(Source::Dba, &Config::default())
        }
    }

    fn dba_page(rows: usize) -> String {
        let rows: String = (1..=rows)
            .map(|i| {
                format!(
                    r#"<tr class="dbaListing"><td><a class="listingLink" href="/sejlbaade/boat-{i}/id-{i}/">Boat {i}</a></td><td class="price">{i}.000 kr.</td></tr>"#
                )
            })
            .collect();
        format!("<html><body><table>{rows}</table></body></html>")
    }

    #[tokio::test]
    async fn keeps_first_results_in_page_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sejlbaade/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(dba_page(25)))
            .mount(&server)
            .await;

        let scraper =
            SiteScraper::new(DbaParser, dba_config(format!("{}/sejlbaade/", server.uri()))).unwrap();
        let listings = scraper.scrape().await.unwrap();

        assert_eq!(listings.len(), 20);
        let ids: Vec<_> = listings.iter().filter_map(|l| l.native_id.clone()).collect();
        let expected: Vec<_> = (1..=20).map(|i| i.to_string()).collect();
        assert_eq!(ids, expected);
        assert_eq!(listings[0].url, format!("{}/sejlbaade/boat-1/id-1/", server.uri()));
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let scraper =
            SiteScraper::new(DbaParser, dba_config(format!("{}/sejlbaade/", server.uri()))).unwrap();
        let err = scraper.scrape().await.unwrap_err();

        assert!(matches!(err, ScrapeError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_fetch_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let mut config = dba_config(format!("http://127.0.0.1:{port}/sejlbaade/"));
        config.timeout = Duration::from_millis(500);

        let scraper = SiteScraper::new(DbaParser, config).unwrap();
        let err = scraper.scrape().await.unwrap_err();

        assert!(matches!(err, ScrapeError::Fetch { .. }));
    }

    #[tokio::test]
    async fn waits_before_requesting() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(dba_page(1)))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = dba_config(format!("{}/sejlbaade/", server.uri()));
        config.request_delay = Duration::from_millis(200);
        let scraper = SiteScraper::new(DbaParser, config).unwrap();

        let started = Instant::now();
        let listings = scraper.scrape().await.unwrap();

        assert_eq!(listings.len(), 1);
        assert!(started.elapsed() >= Duration::from_millis(200));
    }
}
