use crate::error::PersistenceError;
use crate::models::{Listing, NormalizedListing};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Every listing ever seen, keyed by identity key in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Store {
    listings: IndexMap<String, Listing>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Listing> {
        self.listings.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.listings.contains_key(key)
    }

    pub fn listings(&self) -> impl Iterator<Item = &Listing> {
        self.listings.values()
    }
}

impl FromIterator<Listing> for Store {
    fn from_iter<I: IntoIterator<Item = Listing>>(iter: I) -> Self {
        Self {
            listings: iter
                .into_iter()
                .map(|listing| (listing.identity_key.clone(), listing))
                .collect(),
        }
    }
}

/// Fold a fresh scrape into the store.
///
/// Unknown keys are inserted with `first_seen = last_seen = now` and returned
/// in encounter order. Known keys only get `last_seen` refreshed: the first
/// observation of every other field is kept, even if this scrape has better
/// data. Listings missing from `incoming` are left untouched.
pub fn merge<I>(mut store: Store, incoming: I, now: DateTime<Utc>) -> (Store, Vec<Listing>)
where
    I: IntoIterator<Item = NormalizedListing>,
{
    let mut added = Vec::new();

    for listing in incoming {
        match store.listings.get_mut(&listing.identity_key) {
            Some(known) => {
                known.last_seen = now;
            }
            None => {
                let listing = listing.observed_at(now);
                debug!("New listing {} ({})", listing.identity_key, listing.title);
                added.push(listing.clone());
                store.listings.insert(listing.identity_key.clone(), listing);
            }
        }
    }

    (store, added)
}

/// JSON snapshot of the store on disk
#[derive(Debug, Clone)]
pub struct ListingStore {
    path: PathBuf,
}

impl ListingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot. A missing file is a first run and yields an empty
    /// store.
    pub async fn load(&self) -> Result<Store, PersistenceError> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No store at {}, starting empty", self.path.display());
                return Ok(Store::new());
            }
            Err(source) => {
                return Err(PersistenceError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let store: Store =
            serde_json::from_str(&json).map_err(|source| PersistenceError::Decode {
                path: self.path.clone(),
                source,
            })?;

        debug!("Loaded {} listings from {}", store.len(), self.path.display());
        Ok(store)
    }

    /// Write the whole snapshot, replacing the previous one only once the new
    /// file is fully on disk.
    pub async fn save(&self, store: &Store) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(store)?;
        write_atomic(&self.path, json.as_bytes()).await?;
        debug!("Saved {} listings to {}", store.len(), self.path.display());
        Ok(())
    }
}

/// Write to a sibling temp file, fsync, then rename over `path`.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), PersistenceError> {
    let write_err = |source| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    let mut file = tokio::fs::File::create(&tmp).await.map_err(write_err)?;
    file.write_all(contents).await.map_err(write_err)?;
    file.sync_all().await.map_err(write_err)?;
    drop(file);

    tokio::fs::rename(&tmp, path).await.map_err(write_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Price, Source};
    use chrono::Duration;

    fn boat(key: &str, price: Option<f64>) -> NormalizedListing {
        NormalizedListing {
            identity_key: key.to_string(),
            title: format!("Boat {key}"),
            price: price.map(|amount| Price {
                amount,
                currency: "EUR".into(),
            }),
            price_text: None,
            location: None,
            source: Source::Marktplaats,
            url: format!("https://www.marktplaats.nl/v/{key}"),
        }
    }

    #[test]
    fn merge_into_empty_store_adds_everything_in_order() {
        let now = Utc::now();
        let (store, added) = merge(Store::new(), vec![boat("b", None), boat("a", None)], now);

        assert_eq!(store.len(), 2);
        let keys: Vec<_> = added.iter().map(|l| l.identity_key.as_str()).collect();
        assert_eq!(keys, ["b", "a"]);
        assert!(added.iter().all(|l| l.first_seen == now && l.last_seen == now));
    }

    #[test]
    fn merge_is_idempotent() {
        let now = Utc::now();
        let batch = vec![boat("a", Some(1.0)), boat("b", None)];
        let (store, first) = merge(Store::new(), batch.clone(), now);
        let (again, second) = merge(store.clone(), batch, now);

        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
        assert!(again.contains("a") && again.contains("b"));
        assert_eq!(store, again);
    }

    #[test]
    fn known_listing_only_refreshes_last_seen() {
        let t0 = Utc::now() - Duration::days(3);
        let t1 = Utc::now();
        let (store, _) = merge(Store::new(), vec![boat("a", None)], t0);

        let mut rescraped = boat("a", Some(42_000.0));
        rescraped.title = "Renamed".into();
        let (store, added) = merge(store, vec![rescraped], t1);

        assert!(added.is_empty());
        let stored = store.get("a").unwrap();
        assert_eq!(stored.first_seen, t0);
        assert_eq!(stored.last_seen, t1);
        assert_eq!(stored.price, None);
        assert_eq!(stored.title, "Boat a");
    }

    #[test]
    fn absent_listing_is_kept_and_not_reflagged_on_return() {
        let t0 = Utc::now() - Duration::days(2);
        let t1 = t0 + Duration::days(1);
        let t2 = t1 + Duration::days(1);

        let (store, _) = merge(Store::new(), vec![boat("a", None), boat("b", None)], t0);
        let (store, added) = merge(store, vec![boat("b", None)], t1);
        assert!(added.is_empty());
        assert_eq!(store.get("a").unwrap().last_seen, t0);

        let (store, added) = merge(store, vec![boat("a", None)], t2);
        assert!(added.is_empty());
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("a").unwrap().last_seen, t2);
    }

    #[test]
    fn duplicate_within_batch_is_new_once() {
        let (store, added) = merge(Store::new(), vec![boat("a", None), boat("a", None)], Utc::now());
        assert_eq!(store.len(), 1);
        assert_eq!(added.len(), 1);
    }

    #[tokio::test]
    async fn missing_snapshot_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ListingStore::new(dir.path().join("boats.json"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_then_load_preserves_order_and_fields() {
        let dir = tempfile::tempdir().unwrap();
        let file = ListingStore::new(dir.path().join("data").join("boats.json"));
        let (store, _) = merge(
            Store::new(),
            vec![boat("z", Some(10_500.0)), boat("a", None), boat("m", None)],
            Utc::now(),
        );

        file.save(&store).await.unwrap();
        let loaded = file.load().await.unwrap();

        assert_eq!(loaded, store);
        let keys: Vec<_> = loaded.listings().map(|l| l.identity_key.as_str()).collect();
        assert_eq!(keys, ["z", "a", "m"]);
        assert!(!dir.path().join("data").join("boats.json.tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boats.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let err = ListingStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, PersistenceError::Decode { .. }));
    }

    #[tokio::test]
    async fn snapshot_without_optional_fields_still_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boats.json");
        let json = r#"{
            "dba.dk:1001": {
                "identity_key": "dba.dk:1001",
                "title": "Folkbåd",
                "source": "dba.dk",
                "url": "https://www.dba.dk/folkbaad/id-1001/",
                "first_seen": "2026-10-01T08:00:00Z",
                "last_seen": "2026-10-02T08:00:00+00:00"
            }
        }"#;
        tokio::fs::write(&path, json).await.unwrap();

        let store = ListingStore::new(&path).load().await.unwrap();
        let listing = store.get("dba.dk:1001").unwrap();
        assert_eq!(listing.price, None);
        assert_eq!(listing.location, None);
        assert_eq!(listing.source, Source::Dba);
    }

    #[tokio::test]
    async fn failed_save_leaves_previous_snapshot_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boats.json");
        let file = ListingStore::new(&path);
        let (store, _) = merge(Store::new(), vec![boat("a", None)], Utc::now());
        file.save(&store).await.unwrap();

        // A directory squatting on the temp name makes the write fail.
        std::fs::create_dir(dir.path().join("boats.json.tmp")).unwrap();
        let (bigger, _) = merge(store.clone(), vec![boat("b", None)], Utc::now());
        assert!(file.save(&bigger).await.is_err());

        assert_eq!(file.load().await.unwrap(), store);
    }
}
