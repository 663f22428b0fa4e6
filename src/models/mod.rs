use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Marketplace a listing was scraped from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Source {
    #[serde(rename = "dba.dk")]
    Dba,
    #[serde(rename = "blocket.se")]
    Blocket,
    #[serde(rename = "finn.no")]
    Finn,
    #[serde(rename = "kleinanzeigen.de")]
    Kleinanzeigen,
    #[serde(rename = "marktplaats.nl")]
    Marktplaats,
}

impl Source {
    pub const ALL: [Source; 5] = [
        Source::Dba,
        Source::Blocket,
        Source::Finn,
        Source::Kleinanzeigen,
        Source::Marktplaats,
    ];

    pub fn domain(&self) -> &'static str {
        match self {
            Source::Dba => "dba.dk",
            Source::Blocket => "blocket.se",
            Source::Finn => "finn.no",
            Source::Kleinanzeigen => "kleinanzeigen.de",
            Source::Marktplaats => "marktplaats.nl",
        }
    }

    /// Search page for sailing boats on this site
    pub fn search_url(&self) -> &'static str {
        match self {
            Source::Dba => "https://www.dba.dk/sejlbaade/",
            Source::Blocket => "https://www.blocket.se/annonser/hela_sverige/fordon/batar/segelbaatar",
            Source::Finn => "https://www.finn.no/bap/forsale/search.html?product_category=2.93.3231",
            Source::Kleinanzeigen => {
                "https://www.kleinanzeigen.de/s-segelboote/anzeige:angebote/preis::10000/c211l0"
            }
            Source::Marktplaats => "https://www.marktplaats.nl/l/watersport-en-boten/zeilboten/",
        }
    }

    /// Currency assumed when the price text carries no explicit symbol
    pub fn local_currency(&self) -> &'static str {
        match self {
            Source::Dba => "DKK",
            Source::Blocket => "SEK",
            Source::Finn => "NOK",
            Source::Kleinanzeigen | Source::Marktplaats => "EUR",
        }
    }

    /// Shown when a card carries no location of its own
    pub fn country(&self) -> &'static str {
        match self {
            Source::Dba => "Denmark",
            Source::Blocket => "Sweden",
            Source::Finn => "Norway",
            Source::Kleinanzeigen => "Germany",
            Source::Marktplaats => "Netherlands",
        }
    }

    pub fn accept_language(&self) -> &'static str {
        match self {
            Source::Dba => "da-DK,da;q=0.9,en;q=0.8",
            Source::Blocket => "sv-SE,sv;q=0.9,en;q=0.8",
            Source::Finn => "nb-NO,nb;q=0.9,en;q=0.8",
            Source::Kleinanzeigen => "de-DE,de;q=0.9,en;q=0.8",
            Source::Marktplaats => "nl-NL,nl;q=0.9,en;q=0.8",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.domain())
    }
}

impl FromStr for Source {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Source::ALL
            .into_iter()
            .find(|source| {
                let domain = source.domain();
                wanted == domain || domain.split('.').next() == Some(wanted.as_str())
            })
            .ok_or_else(|| anyhow::anyhow!("unknown site: {}", s))
    }
}

/// Numeric price with its ISO-4217 currency code
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Price {
    pub amount: f64,
    pub currency: String,
}

/// A listing card as extracted from a search page, before normalization
#[derive(Debug, Clone, PartialEq)]
pub struct RawListing {
    pub source: Source,
    pub native_id: Option<String>,
    pub title: Option<String>,
    pub price: Option<String>,
    pub location: Option<String>,
    pub url: String,
}

/// Canonical listing shape without observation timestamps
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedListing {
    pub identity_key: String,
    pub title: String,
    pub price: Option<Price>,
    pub price_text: Option<String>,
    pub location: Option<String>,
    pub source: Source,
    pub url: String,
}

impl NormalizedListing {
    pub fn observed_at(self, now: DateTime<Utc>) -> Listing {
        Listing {
            identity_key: self.identity_key,
            title: self.title,
            price: self.price,
            price_text: self.price_text,
            location: self.location,
            source: self.source,
            url: self.url,
            first_seen: now,
            last_seen: now,
        }
    }
}

/// Larger amounts come from digit runs glued together on the page
const MAX_DISPLAY_AMOUNT: f64 = 1e12;

/// A boat listing as tracked in the store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub identity_key: String,
    pub title: String,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub price_text: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub source: Source,
    pub url: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Listing {
    /// Price as shown to feed readers, e.g. `95,000 EUR`
    pub fn display_price(&self) -> String {
        let plausible = self
            .price
            .as_ref()
            .filter(|p| p.amount.is_finite() && p.amount.abs() < MAX_DISPLAY_AMOUNT);
        match (plausible, &self.price_text) {
            (Some(price), _) => format!("{} {}", group_thousands(price.amount), price.currency),
            (None, Some(text)) => text.clone(),
            (None, None) => "Price not listed".to_string(),
        }
    }

    pub fn display_location(&self) -> &str {
        self.location.as_deref().unwrap_or_else(|| self.source.country())
    }
}

fn group_thousands(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if amount < 0.0 {
        grouped.insert(0, '-');
    }
    if fraction != 0 {
        grouped.push_str(&format!(".{:02}", fraction));
    }
    grouped
}
