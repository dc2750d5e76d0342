//! Error types for scraping, configuration and storage.

use std::path::PathBuf;
use std::time::Duration;

/// Result type for scraping operations.
pub type ScrapeResult<T> = Result<T, ScrapeError>;

/// Errors raised while driving a browser page.
///
/// Most of these are recovered locally (fallback cascades, skip-and-continue).
/// Only the variants for which [`ScrapeError::is_run_fatal`] returns true end a run.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("No element matches selector: {0}")]
    ElementNotFound(String),

    #[error("Element is no longer attached to the page")]
    StaleElement,

    #[error("Timed out after {}s waiting for {what}", .after.as_secs_f32())]
    Timeout { what: String, after: Duration },

    #[error("Navigation failed for {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScrapeError {
    /// Whether this error should terminate the whole run.
    ///
    /// Missing elements, stale handles and timeouts are page- or card-level
    /// conditions. Navigation crashes and a dead browser are not.
    pub fn is_run_fatal(&self) -> bool {
        matches!(
            self,
            ScrapeError::Navigation { .. } | ScrapeError::Browser(_) | ScrapeError::Script(_)
        )
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, ScrapeError::StaleElement)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ScrapeError::Timeout { .. })
    }
}

/// Errors surfaced before any run starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No product store configured. Set store_url in the config file or KELAPA_STORE_URL")]
    MissingStoreUrl,

    #[error("Unsupported store URL '{0}' (expected sqlite://<file> or jsonl://<dir>)")]
    InvalidStoreUrl(String),

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Unknown site '{0}' (available: tokopedia, shopee)")]
    UnknownSite(String),

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("Cannot create debug directory {path}: {source}")]
    DebugDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Errors from the product store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store connection is poisoned")]
    Poisoned,

    #[error("Store is closed")]
    Closed,

    #[error("Store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_classification() {
        assert!(ScrapeError::Browser("crashed".into()).is_run_fatal());
        assert!(ScrapeError::Navigation {
            url: "https://example.com".into(),
            message: "net::ERR_ABORTED".into()
        }
        .is_run_fatal());

        assert!(!ScrapeError::StaleElement.is_run_fatal());
        assert!(!ScrapeError::ElementNotFound("span".into()).is_run_fatal());
        assert!(!ScrapeError::Timeout {
            what: "page load".into(),
            after: Duration::from_secs(30)
        }
        .is_run_fatal());
    }

    #[test]
    fn timeout_message_includes_duration() {
        let err = ScrapeError::Timeout {
            what: "initial content".into(),
            after: Duration::from_secs(20),
        };
        assert_eq!(err.to_string(), "Timed out after 20s waiting for initial content");
    }
}
