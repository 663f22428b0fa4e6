use crate::models::{NormalizedListing, Price, RawListing, Source};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

const UNKNOWN_TITLE: &str = "Unknown boat";

/// Turn a raw card into the canonical listing shape.
pub fn normalize(raw: RawListing) -> NormalizedListing {
    let identity_key = identity_key(&raw);
    let title = raw
        .title
        .as_deref()
        .map(collapse_whitespace)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());
    let price_text = raw
        .price
        .as_deref()
        .map(collapse_whitespace)
        .filter(|p| !p.is_empty());
    let price = price_text
        .as_deref()
        .and_then(|text| parse_price(text, raw.source));
    let location = raw
        .location
        .as_deref()
        .map(collapse_whitespace)
        .filter(|l| !l.is_empty());

    NormalizedListing {
        identity_key,
        title,
        price,
        price_text,
        location,
        source: raw.source,
        url: raw.url,
    }
}

/// `site:native_id` when the site exposes an id, otherwise a SHA-256 over
/// site, lower-cased title and url.
pub fn identity_key(raw: &RawListing) -> String {
    if let Some(id) = raw.native_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        return format!("{}:{}", raw.source, id);
    }

    let title = raw
        .title
        .as_deref()
        .map(|t| collapse_whitespace(t).to_lowercase())
        .unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(raw.source.domain().as_bytes());
    hasher.update([0u8]);
    hasher.update(title.as_bytes());
    hasher.update([0u8]);
    hasher.update(raw.url.trim().as_bytes());
    format!("{}:{}", raw.source, hex::encode(hasher.finalize()))
}

/// Parse a price as printed on a listing card. Returns `None` when the text
/// holds no number ("VB", "Bieden", "Price not listed").
pub fn parse_price(text: &str, source: Source) -> Option<Price> {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    let re = NUMBER.get_or_init(|| {
        Regex::new(r"\d(?:[\d.,'\s\u{00A0}\u{202F}]*\d)?").expect("valid price regex")
    });

    let digits = re.find(text)?.as_str();
    let compact: String = digits
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();

    let amount = parse_amount(&compact)?;
    Some(Price {
        amount,
        currency: detect_currency(text, source).to_string(),
    })
}

fn parse_amount(compact: &str) -> Option<f64> {
    let last_dot = compact.rfind('.');
    let last_comma = compact.rfind(',');

    let canonical = match (last_dot, last_comma) {
        (None, None) => compact.to_string(),
        (Some(d), Some(c)) => {
            let (decimal, thousands) = if d > c { ('.', ',') } else { (',', '.') };
            compact
                .replace(thousands, "")
                .replace(decimal, ".")
        }
        (Some(pos), None) => resolve_single_separator(compact, '.', pos),
        (None, Some(pos)) => resolve_single_separator(compact, ',', pos),
    };

    canonical.parse::<f64>().ok()
}

/// A lone separator kind is a thousands separator when it repeats or when it
/// is followed by exactly three digits; otherwise it marks decimals.
fn resolve_single_separator(compact: &str, sep: char, last: usize) -> String {
    let occurrences = compact.matches(sep).count();
    let trailing = compact.len() - last - 1;
    if occurrences > 1 || trailing == 3 {
        compact.replace(sep, "")
    } else {
        compact.replace(sep, ".")
    }
}

fn detect_currency(text: &str, source: Source) -> &'static str {
    let upper = text.to_uppercase();
    if text.contains('€') || upper.contains("EUR") {
        "EUR"
    } else if text.contains('£') || upper.contains("GBP") {
        "GBP"
    } else if text.contains('$') || upper.contains("USD") {
        "USD"
    } else if upper.contains("CHF") {
        "CHF"
    } else {
        source.local_currency()
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
