//! Small helpers shared by the page parsers.

use crate::error::ScrapeError;
use crate::models::Source;
use scraper::{ElementRef, Selector};
use url::Url;

pub fn selector(site: Source, css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::parse(site, format!("bad selector {css:?}: {e:?}")))
}

/// Visible text of an element with whitespace collapsed, `None` when blank
pub fn text_of(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<Vec<_>>().join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

/// Text of the first descendant matching `selector`
pub fn select_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element.select(selector).find_map(text_of)
}

/// First text node that contains a digit and `needle` (case-insensitive)
pub fn text_containing(element: ElementRef<'_>, needle: &str) -> Option<String> {
    let needle = needle.to_lowercase();
    element
        .text()
        .map(str::trim)
        .find(|t| t.chars().any(|c| c.is_ascii_digit()) && t.to_lowercase().contains(&needle))
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// `href` of the first matching link, resolved against the page URL
pub fn link_of<'a>(
    element: ElementRef<'a>,
    selector: &Selector,
    base: &Url,
) -> Option<(ElementRef<'a>, String)> {
    element.select(selector).find_map(|a| {
        let href = a.value().attr("href")?.trim();
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            return None;
        }
        let url = base.join(href).ok()?;
        matches!(url.scheme(), "http" | "https").then(|| (a, url.to_string()))
    })
}
