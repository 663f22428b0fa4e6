//! Scrapes sailing-boat listings from five Nordic and European marketplaces,
//! keeps a JSON store of every listing seen and republishes the newly found
//! ones as an RSS feed.

pub mod config;
pub mod error;
pub mod feed;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod scrapers;
pub mod store;

pub use config::Config;
pub use error::{PersistenceError, ScrapeError};
pub use pipeline::{Pipeline, RunReport, RunResult};
