//! Persistence of scraped batches.
//!
//! The scraper hands each run's records to a [`ProductStore`] under a
//! collection key. Saving is best-effort: failures are logged and reported as
//! a smaller saved count, never raised.

mod jsonl;
mod sqlite;

pub use jsonl::JsonlStore;
pub use sqlite::SqliteStore;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::{ConfigError, StoreError};
use crate::models::ProductRecord;

/// A document-style store of product records grouped into collections.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Append `records` to `collection`. Returns how many were written.
    async fn save(&self, records: &[ProductRecord], collection: &str) -> usize;

    /// All records of `collection` in insertion order.
    async fn load(&self, collection: &str) -> Result<Vec<ProductRecord>, StoreError>;

    /// Names of collections that hold at least one record.
    async fn collections(&self) -> Result<Vec<String>, StoreError>;

    /// Release the underlying connection. Later calls fail with `Closed`.
    async fn close(&self);
}

/// Backend named by a store URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Sqlite(PathBuf),
    Jsonl(PathBuf),
}

impl StoreLocation {
    /// Parse `sqlite://<file>` or `jsonl://<dir>`. `~` is expanded.
    pub fn parse(url: &str) -> Result<Self, ConfigError> {
        let url = url.trim();
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| ConfigError::InvalidStoreUrl(url.to_string()))?;
        if rest.is_empty() {
            return Err(ConfigError::InvalidStoreUrl(url.to_string()));
        }
        let path = PathBuf::from(shellexpand::tilde(rest).as_ref());

        match scheme.to_lowercase().as_str() {
            "sqlite" => Ok(StoreLocation::Sqlite(path)),
            "jsonl" => Ok(StoreLocation::Jsonl(path)),
            _ => Err(ConfigError::InvalidStoreUrl(url.to_string())),
        }
    }
}

/// Open the store a URL points at.
pub fn open_store(url: &str) -> Result<Box<dyn ProductStore>, StoreError> {
    match StoreLocation::parse(url)? {
        StoreLocation::Sqlite(path) => Ok(Box::new(SqliteStore::open(&path)?)),
        StoreLocation::Jsonl(dir) => Ok(Box::new(JsonlStore::open(&dir)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_schemes() {
        assert_eq!(
            StoreLocation::parse("sqlite://data/products.db").unwrap(),
            StoreLocation::Sqlite(PathBuf::from("data/products.db"))
        );
        assert_eq!(
            StoreLocation::parse("jsonl:///var/lib/kelapa").unwrap(),
            StoreLocation::Jsonl(PathBuf::from("/var/lib/kelapa"))
        );
    }

    #[test]
    fn rejects_unknown_or_empty() {
        for url in ["mongodb://localhost:27017", "sqlite://", "products.db"] {
            assert!(
                matches!(StoreLocation::parse(url), Err(ConfigError::InvalidStoreUrl(_))),
                "{} should be rejected",
                url
            );
        }
    }
}
