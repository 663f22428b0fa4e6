//! RSS 2.0 rendering of recently discovered listings.

use crate::models::Listing;
use crate::store::Store;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::cmp::Reverse;
use std::io::Cursor;

const GENERATOR: &str = concat!("boat-scout/", env!("CARGO_PKG_VERSION"));

/// Channel-level metadata of the published feed
#[derive(Debug, Clone)]
pub struct FeedMeta {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: String,
}

impl Default for FeedMeta {
    fn default() -> Self {
        Self {
            title: "Sailing Boats for Sale - Multi-site Feed".to_string(),
            link: "https://example.com".to_string(),
            description: "New sailing boats from dba.dk, blocket.se, finn.no, kleinanzeigen.de, and marktplaats.nl".to_string(),
            language: "en".to_string(),
        }
    }
}

pub struct FeedGenerator {
    meta: FeedMeta,
    window: Duration,
}

impl FeedGenerator {
    pub fn new(meta: FeedMeta, window: Duration) -> Self {
        Self { meta, window }
    }

    /// Listings first seen within `[now - window, now]`, newest first.
    pub fn select<'a>(&self, store: &'a Store, now: DateTime<Utc>) -> Vec<&'a Listing> {
        let cutoff = now - self.window;
        let mut recent: Vec<&Listing> = store
            .listings()
            .filter(|l| l.first_seen >= cutoff && l.first_seen <= now)
            .collect();
        recent.sort_by_key(|l| Reverse(l.first_seen));
        recent
    }

    pub fn render(&self, store: &Store, now: DateTime<Utc>) -> Result<String> {
        let items = self.select(store, now);
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(
            BytesStart::new("rss").with_attributes([("version", "2.0")]),
        ))?;
        writer.write_event(Event::Start(BytesStart::new("channel")))?;

        text_element(&mut writer, "title", &self.meta.title)?;
        text_element(&mut writer, "link", &self.meta.link)?;
        text_element(&mut writer, "description", &self.meta.description)?;
        text_element(&mut writer, "language", &self.meta.language)?;
        text_element(&mut writer, "lastBuildDate", &now.to_rfc2822())?;
        text_element(&mut writer, "generator", GENERATOR)?;

        for listing in items {
            write_item(&mut writer, listing)?;
        }

        writer.write_event(Event::End(BytesEnd::new("channel")))?;
        writer.write_event(Event::End(BytesEnd::new("rss")))?;

        let bytes = writer.into_inner().into_inner();
        Ok(String::from_utf8(bytes)?)
    }
}

fn write_item(writer: &mut Writer<Cursor<Vec<u8>>>, listing: &Listing) -> Result<()> {
    let price = listing.display_price();

    writer.write_event(Event::Start(BytesStart::new("item")))?;
    text_element(writer, "title", &format!("{} - {}", listing.title, price))?;
    text_element(writer, "link", &listing.url)?;
    text_element(writer, "description", &describe(listing, &price))?;

    writer.write_event(Event::Start(
        BytesStart::new("guid").with_attributes([("isPermaLink", "false")]),
    ))?;
    writer.write_event(Event::Text(BytesText::new(&listing.identity_key)))?;
    writer.write_event(Event::End(BytesEnd::new("guid")))?;

    text_element(writer, "pubDate", &listing.first_seen.to_rfc2822())?;
    writer.write_event(Event::End(BytesEnd::new("item")))?;
    Ok(())
}

fn describe(listing: &Listing, price: &str) -> String {
    format!(
        "<strong>Price:</strong> {}<br><strong>Location:</strong> {}<br><strong>Source:</strong> {}<br><strong>Found:</strong> {}<br><a href=\"{}\">View Listing</a>",
        escape(price),
        escape(listing.display_location()),
        listing.source,
        listing.first_seen.format("%Y-%m-%d %H:%M UTC"),
        escape(&listing.url),
    )
}

fn text_element<W: std::io::Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
