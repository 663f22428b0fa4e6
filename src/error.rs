use crate::models::Source;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a single site adapter. The pipeline turns these into a
/// failed outcome for that site and keeps going.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Network, TLS or timeout failure
    #[error("request to {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The site answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The page did not look like a search result page
    #[error("unrecognized page structure on {site}: {reason}")]
    Parse { site: Source, reason: String },
}

impl ScrapeError {
    pub fn parse(site: Source, reason: impl Into<String>) -> Self {
        ScrapeError::Parse {
            site,
            reason: reason.into(),
        }
    }
}

/// Errors reading or writing the listing store and feed files
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode store: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
